use actix_web::{HttpResponse, get, web};
use serde::Deserialize;

use super::render;
use crate::dtos::view_dtos::{LoginContext, TEMPLATE_LOGIN};

#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    pub next: Option<String>,
}

/// GET /auth/login/
/// Credentials are handled by the identity provider; this page only tells
/// it where to send the user back. Only local paths survive as `next`.
#[get("/auth/login/")]
pub async fn login_page(query: web::Query<LoginQuery>) -> HttpResponse {
    let next = query
        .into_inner()
        .next
        .filter(|n| n.starts_with('/') && !n.starts_with("//"));
    render(TEMPLATE_LOGIN, LoginContext { next })
}
