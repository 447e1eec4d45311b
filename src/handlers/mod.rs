pub mod auth_handlers;
pub mod media_handlers;
pub mod post_handlers;
pub mod profile_handlers;

use actix_web::http::header;
use actix_web::{HttpRequest, HttpResponse};
use serde::Serialize;

use crate::AppState;
use crate::dtos::view_dtos::Rendered;
use crate::error::{AppError, Result};
use crate::middleware::auth_extractor::AuthenticatedUser;
use crate::models::User;

pub fn render<T: Serialize>(template: &'static str, context: T) -> HttpResponse {
    HttpResponse::Ok().json(Rendered { template, context })
}

pub fn redirect(location: impl AsRef<str>) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, location.as_ref()))
        .finish()
}

/// Signed-in requests need a `users` row for the caller; create it from the
/// token claims.
pub async fn ensure_user(state: &AppState, user: &AuthenticatedUser) -> Result<User> {
    state.store.upsert_user(user.user_id, &user.username).await
}

/// Fallback for every unmatched path.
pub async fn not_found(req: HttpRequest) -> Result<HttpResponse> {
    Err(AppError::not_found(format!("page {}", req.path())))
}
