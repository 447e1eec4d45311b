//! Service-wide error type.
//!
//! Every handler returns `Result<HttpResponse, AppError>`; the conversion to a
//! response lives here so handlers only decide *which* failure happened.

use actix_web::http::{StatusCode, header};
use actix_web::{HttpResponse, ResponseError};
use log::error;
use thiserror::Error;

use crate::dtos::view_dtos::{NotFoundContext, Rendered, TEMPLATE_NOT_FOUND};
use crate::services::media_services::ImageError;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("not found: {0}")]
    NotFound(String),

    /// Anonymous request to a page that needs a user. Rendered as a redirect.
    #[error("login required for {next}")]
    LoginRequired { login_url: String, next: String },

    #[error("validation error: {0}")]
    Validation(String),

    #[error("database error: {0}")]
    Database(#[from] tokio_postgres::Error),

    #[error("pool error: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn not_found(what: impl Into<String>) -> Self {
        AppError::NotFound(what.into())
    }

    /// Location header for a login redirect: `<login_url>?next=<path>`.
    pub fn login_location(login_url: &str, next: &str) -> String {
        let sep = if login_url.contains('?') { '&' } else { '?' };
        format!("{}{}next={}", login_url, sep, urlencoding::encode(next))
    }
}

impl From<ImageError> for AppError {
    fn from(err: ImageError) -> Self {
        match err {
            ImageError::Io(e) => AppError::Io(e),
            other => AppError::Validation(other.to_string()),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::LoginRequired { .. } => StatusCode::FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Database(_)
            | AppError::Pool(_)
            | AppError::Io(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            AppError::NotFound(what) => HttpResponse::NotFound().json(Rendered {
                template: TEMPLATE_NOT_FOUND,
                context: NotFoundContext {
                    message: format!("{} not found", what),
                },
            }),
            AppError::LoginRequired { login_url, next } => HttpResponse::Found()
                .insert_header((header::LOCATION, Self::login_location(login_url, next)))
                .finish(),
            AppError::Validation(msg) => HttpResponse::BadRequest().json(serde_json::json!({
                "status": "error",
                "message": msg,
            })),
            other => {
                error!("request failed: {}", other);
                HttpResponse::InternalServerError().json(serde_json::json!({
                    "status": "error",
                    "message": "Internal server error",
                }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_location_encodes_next() {
        assert_eq!(
            AppError::login_location("/auth/login/", "/posts/1/edit/"),
            "/auth/login/?next=%2Fposts%2F1%2Fedit%2F"
        );
        assert_eq!(
            AppError::login_location("/login?src=app", "/follow/"),
            "/login?src=app&next=%2Ffollow%2F"
        );
    }

    #[test]
    fn status_codes_follow_error_kind() {
        assert_eq!(AppError::not_found("post").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::LoginRequired {
                login_url: "/auth/login/".into(),
                next: "/create/".into()
            }
            .status_code(),
            StatusCode::FOUND
        );
        assert_eq!(
            AppError::Internal("boom".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn login_required_response_carries_location() {
        let resp = AppError::LoginRequired {
            login_url: "/auth/login/".into(),
            next: "/create/".into(),
        }
        .error_response();
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(
            resp.headers().get(header::LOCATION).unwrap(),
            "/auth/login/?next=%2Fcreate%2F"
        );
    }
}
