use actix_web::{FromRequest, HttpRequest, dev::Payload, http::header, web};
use futures::future::{Ready, ready};
use log::debug;
use uuid::Uuid;

use crate::AppState;
use crate::error::AppError;

pub const ACCESS_TOKEN_COOKIE: &str = "access_token";

/// Caller with a verified token. Extraction failure is a login redirect, so
/// `Option<AuthenticatedUser>` gives pages that work for anonymous visitors.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub username: String,
}

impl FromRequest for AuthenticatedUser {
    type Error = AppError;
    type Future = Ready<Result<AuthenticatedUser, AppError>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let Some(state) = req.app_data::<web::Data<AppState>>() else {
            return ready(Err(AppError::Internal("application state missing".into())));
        };

        let login_required = || AppError::LoginRequired {
            login_url: state.config.login_url.clone(),
            next: req
                .uri()
                .path_and_query()
                .map(|pq| pq.as_str().to_string())
                .unwrap_or_else(|| req.path().to_string()),
        };

        let Some(token) = token_from_request(req) else {
            return ready(Err(login_required()));
        };

        match state.auth.verify(&token) {
            Ok(identity) => ready(Ok(AuthenticatedUser {
                user_id: identity.user_id,
                username: identity.username,
            })),
            Err(e) => {
                debug!("rejected token on {}: {}", req.path(), e);
                ready(Err(login_required()))
            }
        }
    }
}

/// Bearer header first, then the session cookie.
fn token_from_request(req: &HttpRequest) -> Option<String> {
    if let Some(value) = req.headers().get(header::AUTHORIZATION) {
        let value = value.to_str().ok()?;
        let token = value.strip_prefix("Bearer ")?.trim();
        return (!token.is_empty()).then(|| token.to_string());
    }
    req.cookie(ACCESS_TOKEN_COOKIE)
        .map(|c| c.value().trim().to_string())
        .filter(|t| !t.is_empty())
}
