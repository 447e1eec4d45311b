use std::path::Path;

use actix_web::{HttpResponse, get, web};
use log::debug;

use crate::AppState;
use crate::error::{AppError, Result};
use crate::services::media_services::post_image_path;

/// GET /media/posts/{filename}
#[get("/media/posts/{filename}")]
pub async fn serve_post_image(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let filename = path.into_inner();
    let file_path = post_image_path(&state.config.media_root, &filename)
        .ok_or_else(|| AppError::not_found(format!("image {}", filename)))?;

    match tokio::fs::read(&file_path).await {
        Ok(data) => Ok(HttpResponse::Ok()
            .content_type(content_type_for(&file_path))
            .body(data)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("missing media file {}", file_path.display());
            Err(AppError::not_found(format!("image {}", filename)))
        }
        Err(e) => Err(e.into()),
    }
}

fn content_type_for(path: &Path) -> mime::Mime {
    match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .as_deref()
    {
        Some("jpg") | Some("jpeg") => mime::IMAGE_JPEG,
        Some("png") => mime::IMAGE_PNG,
        Some("gif") => mime::IMAGE_GIF,
        Some("webp") => "image/webp".parse().unwrap_or(mime::APPLICATION_OCTET_STREAM),
        _ => mime::APPLICATION_OCTET_STREAM,
    }
}
