pub mod config;
pub mod dtos;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod pagination;
pub mod repositories;
pub mod services;
pub mod urls;

use std::sync::Arc;

use actix_web::web;

use crate::config::AppConfig;
use crate::error::AppError;
use crate::handlers::{auth_handlers, media_handlers, post_handlers, profile_handlers};
use crate::repositories::Store;
use crate::services::auth_services::AuthService;
use crate::services::feed_services::IndexCache;

/// Form bodies carry base64 images.
const FORM_LIMIT: usize = 10 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub auth: AuthService,
    pub index_cache: IndexCache,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: AppConfig) -> Self {
        Self {
            store,
            auth: AuthService::new(&config.jwt_secret),
            index_cache: IndexCache::new(config.index_cache_ttl),
            config,
        }
    }
}

/// Registers every route. The app still needs
/// `.default_service(web::to(handlers::not_found))` for the 404 page.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::PathConfig::default()
            .error_handler(|err, _req| AppError::not_found(err.to_string()).into()),
    )
    .app_data(web::FormConfig::default().limit(FORM_LIMIT))
    .service(post_handlers::index)
    .service(post_handlers::group_posts)
    .service(post_handlers::post_detail)
    .service(post_handlers::post_detail_comment)
    .service(post_handlers::add_comment)
    .service(post_handlers::post_create_form)
    .service(post_handlers::post_create)
    .service(post_handlers::post_edit_form)
    .service(post_handlers::post_edit)
    .service(profile_handlers::follow_index)
    .service(profile_handlers::profile)
    .service(profile_handlers::profile_follow)
    .service(profile_handlers::profile_unfollow)
    .service(auth_handlers::login_page)
    .service(media_handlers::serve_post_image);
}
