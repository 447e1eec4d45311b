use actix_web::{HttpResponse, get, web};
use log::info;

use super::{ensure_user, redirect, render};
use crate::AppState;
use crate::dtos::view_dtos::{FollowContext, ProfileContext, TEMPLATE_FOLLOW, TEMPLATE_PROFILE};
use crate::error::{AppError, Result};
use crate::middleware::auth_extractor::AuthenticatedUser;
use crate::models::{PostFilter, User, UserRef};
use crate::pagination::PageQuery;
use crate::services::feed_services::paginate_posts;
use crate::urls;

async fn load_author(state: &AppState, username: &str) -> Result<User> {
    state
        .store
        .get_user_by_username(username)
        .await?
        .ok_or_else(|| AppError::not_found(format!("user {}", username)))
}

/// GET /profile/{username}/
/// Public; `following` is only ever true for a signed-in reader. A signed-in
/// reader gets a `users` row here, so their own profile exists before they
/// write anything.
#[get("/profile/{username}/")]
pub async fn profile(
    user: Option<AuthenticatedUser>,
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    if let Some(reader) = &user {
        ensure_user(&state, reader).await?;
    }
    let author = load_author(&state, &path.into_inner()).await?;
    let page_obj = paginate_posts(
        state.store.as_ref(),
        PostFilter::Author(author.id),
        query.page.as_deref(),
    )
    .await?;

    let following = match &user {
        Some(reader) if reader.user_id != author.id => {
            state.store.follow_exists(reader.user_id, author.id).await?
        }
        _ => false,
    };

    Ok(render(
        TEMPLATE_PROFILE,
        ProfileContext {
            author: UserRef::from(&author),
            posts_count: page_obj.count,
            following,
            page_obj,
        },
    ))
}

/// GET /follow/
/// Posts by every author the caller follows.
#[get("/follow/")]
pub async fn follow_index(
    user: AuthenticatedUser,
    state: web::Data<AppState>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    ensure_user(&state, &user).await?;
    let page_obj = paginate_posts(
        state.store.as_ref(),
        PostFilter::FollowedBy(user.user_id),
        query.page.as_deref(),
    )
    .await?;
    Ok(render(TEMPLATE_FOLLOW, FollowContext { page_obj }))
}

/// GET /profile/{username}/follow/
/// No-op when already following or when following oneself.
#[get("/profile/{username}/follow/")]
pub async fn profile_follow(
    user: AuthenticatedUser,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let author = load_author(&state, &path.into_inner()).await?;

    if author.id == user.user_id {
        return Ok(redirect(urls::FOLLOW_INDEX));
    }
    if state.store.follow_exists(user.user_id, author.id).await? {
        return Ok(redirect(urls::FOLLOW_INDEX));
    }

    ensure_user(&state, &user).await?;
    state.store.create_follow(user.user_id, author.id).await?;
    info!("user {} now follows {}", user.username, author.username);

    Ok(redirect(urls::FOLLOW_INDEX))
}

/// GET /profile/{username}/unfollow/
#[get("/profile/{username}/unfollow/")]
pub async fn profile_unfollow(
    user: AuthenticatedUser,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let author = load_author(&state, &path.into_inner()).await?;
    let removed = state.store.delete_follows(user.user_id, author.id).await?;
    if removed > 0 {
        info!("user {} unfollowed {}", user.username, author.username);
    }
    Ok(redirect(urls::FOLLOW_INDEX))
}
