use actix_web::{HttpResponse, get, post, web};
use log::{debug, info};

use super::{ensure_user, redirect, render};
use crate::AppState;
use crate::dtos::comment_dtos::{CommentFormDTO, CommentFormValues};
use crate::dtos::post_dtos::{FormErrors, PostFormDTO, PostFormValues};
use crate::dtos::view_dtos::{
    GroupContext, IndexContext, PostDetailContext, PostFormContext, TEMPLATE_CREATE_POST,
    TEMPLATE_GROUP_LIST, TEMPLATE_INDEX, TEMPLATE_POST_DETAIL,
};
use crate::error::{AppError, Result};
use crate::middleware::auth_extractor::AuthenticatedUser;
use crate::models::{NewComment, NewPost, PostChanges, PostFilter, PostView};
use crate::pagination::PageQuery;
use crate::services::feed_services::paginate_posts;
use crate::services::media_services::{discard_post_image, save_post_image};
use crate::services::post_services::{FormOutcome, clean_post_form};
use crate::urls;

async fn load_post(state: &AppState, post_id: i64) -> Result<PostView> {
    state
        .store
        .get_post(post_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("post {}", post_id)))
}

async fn render_post_form(
    state: &AppState,
    form: PostFormValues,
    errors: FormErrors,
    post_id: Option<i64>,
) -> Result<HttpResponse> {
    let groups = state.store.list_groups().await?;
    Ok(render(
        TEMPLATE_CREATE_POST,
        PostFormContext {
            form,
            errors,
            groups,
            is_edit: post_id.is_some(),
            post_id,
        },
    ))
}

/// GET /
#[get("/")]
pub async fn index(
    state: web::Data<AppState>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    let page_obj = state
        .index_cache
        .index_page(state.store.as_ref(), query.page.as_deref())
        .await?;
    Ok(render(TEMPLATE_INDEX, IndexContext { page_obj }))
}

/// GET /group/{slug}/
#[get("/group/{slug}/")]
pub async fn group_posts(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    let slug = path.into_inner();
    let group = state
        .store
        .get_group_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::not_found(format!("group {}", slug)))?;

    let page_obj = paginate_posts(
        state.store.as_ref(),
        PostFilter::Group(group.id),
        query.page.as_deref(),
    )
    .await?;
    Ok(render(TEMPLATE_GROUP_LIST, GroupContext { group, page_obj }))
}

/// GET /posts/{post_id}/
#[get("/posts/{post_id}/")]
pub async fn post_detail(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let post = load_post(&state, path.into_inner()).await?;
    let comments = state.store.list_comments(post.id).await?;
    let posts_count = state
        .store
        .count_posts(PostFilter::Author(post.author.id))
        .await?;

    Ok(render(
        TEMPLATE_POST_DETAIL,
        PostDetailContext {
            post,
            posts_count,
            comments,
            form: CommentFormValues::default(),
        },
    ))
}

/// POST /posts/{post_id}/
/// Comment submitted from the detail page itself.
#[post("/posts/{post_id}/")]
pub async fn post_detail_comment(
    user: AuthenticatedUser,
    state: web::Data<AppState>,
    path: web::Path<i64>,
    form: web::Form<CommentFormDTO>,
) -> Result<HttpResponse> {
    submit_comment(&state, &user, path.into_inner(), &form).await
}

/// POST /posts/{post_id}/comment/
#[post("/posts/{post_id}/comment/")]
pub async fn add_comment(
    user: AuthenticatedUser,
    state: web::Data<AppState>,
    path: web::Path<i64>,
    form: web::Form<CommentFormDTO>,
) -> Result<HttpResponse> {
    submit_comment(&state, &user, path.into_inner(), &form).await
}

/// Stores a valid comment and always redirects back to the post; a blank
/// comment is dropped without re-rendering.
async fn submit_comment(
    state: &AppState,
    user: &AuthenticatedUser,
    post_id: i64,
    form: &CommentFormDTO,
) -> Result<HttpResponse> {
    let post = load_post(state, post_id).await?;

    match form.cleaned_text() {
        Some(text) => {
            ensure_user(state, user).await?;
            let comment = state
                .store
                .create_comment(NewComment {
                    post_id: post.id,
                    author_id: user.user_id,
                    text: text.to_string(),
                })
                .await?;
            info!("user {} commented on post {} (comment {})", user.username, post.id, comment.id);
        }
        None => debug!("dropped blank comment from {} on post {}", user.username, post.id),
    }

    Ok(redirect(urls::post_detail(post.id)))
}

/// GET /create/
#[get("/create/")]
pub async fn post_create_form(
    user: AuthenticatedUser,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    ensure_user(&state, &user).await?;
    render_post_form(&state, PostFormValues::default(), FormErrors::new(), None).await
}

/// POST /create/
#[post("/create/")]
pub async fn post_create(
    user: AuthenticatedUser,
    state: web::Data<AppState>,
    form: web::Form<PostFormDTO>,
) -> Result<HttpResponse> {
    let form = form.into_inner();
    let cleaned = match clean_post_form(state.store.as_ref(), &form).await? {
        FormOutcome::Valid(cleaned) => cleaned,
        FormOutcome::Invalid(errors) => {
            return render_post_form(&state, form.values(), errors, None).await;
        }
    };

    let author = ensure_user(&state, &user).await?;
    let image = match &cleaned.image {
        Some(image) => Some(save_post_image(&state.config.media_root, image).await?),
        None => None,
    };
    let created = state
        .store
        .create_post(NewPost {
            text: cleaned.text,
            author_id: author.id,
            group_id: cleaned.group_id,
            image: image.clone(),
        })
        .await;
    let post = match created {
        Ok(post) => post,
        Err(e) => {
            if let Some(stored) = &image {
                discard_post_image(&state.config.media_root, stored).await;
            }
            return Err(e);
        }
    };
    info!("user {} created post {}", author.username, post.id);

    Ok(redirect(urls::profile(&author.username)))
}

/// GET /posts/{post_id}/edit/
#[get("/posts/{post_id}/edit/")]
pub async fn post_edit_form(
    user: AuthenticatedUser,
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let post = load_post(&state, path.into_inner()).await?;
    if post.author.id != user.user_id {
        return Ok(redirect(urls::post_detail(post.id)));
    }
    let values = PostFormValues::from_post(&post);
    render_post_form(&state, values, FormErrors::new(), Some(post.id)).await
}

/// POST /posts/{post_id}/edit/
/// Only the author may change a post; anyone else is sent back to it.
#[post("/posts/{post_id}/edit/")]
pub async fn post_edit(
    user: AuthenticatedUser,
    state: web::Data<AppState>,
    path: web::Path<i64>,
    form: web::Form<PostFormDTO>,
) -> Result<HttpResponse> {
    let post = load_post(&state, path.into_inner()).await?;
    if post.author.id != user.user_id {
        info!("user {} tried to edit post {} of {}", user.username, post.id, post.author.username);
        return Ok(redirect(urls::post_detail(post.id)));
    }

    let form = form.into_inner();
    let cleaned = match clean_post_form(state.store.as_ref(), &form).await? {
        FormOutcome::Valid(cleaned) => cleaned,
        FormOutcome::Invalid(errors) => {
            let mut values = form.values();
            values.image = post.image.clone();
            return render_post_form(&state, values, errors, Some(post.id)).await;
        }
    };

    let new_image = match &cleaned.image {
        Some(image) => Some(save_post_image(&state.config.media_root, image).await?),
        None => None,
    };
    let updated = state
        .store
        .update_post(
            post.id,
            PostChanges {
                text: cleaned.text,
                group_id: cleaned.group_id,
                image: new_image.clone().or_else(|| post.image.clone()),
            },
        )
        .await
        .and_then(|row| row.ok_or_else(|| AppError::not_found(format!("post {}", post.id))));
    if let Err(e) = updated {
        if let Some(stored) = &new_image {
            discard_post_image(&state.config.media_root, stored).await;
        }
        return Err(e);
    }
    info!("user {} edited post {}", user.username, post.id);

    Ok(redirect(urls::post_detail(post.id)))
}
