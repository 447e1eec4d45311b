pub mod auth_services;
pub mod feed_services;
pub mod group_services;
pub mod media_services;
pub mod post_services;
