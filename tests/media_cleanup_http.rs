mod common;

use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{App, test, web};
use async_trait::async_trait;
use base64::Engine as _;
use uuid::Uuid;

use common::{SECRET, get, post_form};
use yatube::AppState;
use yatube::config::AppConfig;
use yatube::error::{AppError, Result};
use yatube::models::{
    Comment, Group, NewComment, NewGroup, NewPost, Post, PostChanges, PostFilter, PostView, User,
};
use yatube::repositories::{MemoryStore, Store};

const SMALL_GIF: &[u8] = b"\x47\x49\x46\x38\x39\x61\x02\x00\x01\x00\x80\x00\x00\x00\x00\x00\
\xFF\xFF\xFF\x21\xF9\x04\x00\x00\x00\x00\x00\x2C\x00\x00\x00\x00\x02\x00\x01\x00\x00\x02\x02\x0C\x0A\x00\x3B";

/// Memory store whose post writes fail after the form has been accepted.
struct BrokenPostWrites {
    inner: MemoryStore,
}

#[async_trait]
impl Store for BrokenPostWrites {
    async fn upsert_user(&self, id: Uuid, username: &str) -> Result<User> {
        self.inner.upsert_user(id, username).await
    }
    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.inner.get_user_by_username(username).await
    }
    async fn create_group(&self, group: NewGroup) -> Result<Group> {
        self.inner.create_group(group).await
    }
    async fn get_group(&self, id: i64) -> Result<Option<Group>> {
        self.inner.get_group(id).await
    }
    async fn get_group_by_slug(&self, slug: &str) -> Result<Option<Group>> {
        self.inner.get_group_by_slug(slug).await
    }
    async fn list_groups(&self) -> Result<Vec<Group>> {
        self.inner.list_groups().await
    }
    async fn delete_group(&self, id: i64) -> Result<bool> {
        self.inner.delete_group(id).await
    }
    async fn create_post(&self, _post: NewPost) -> Result<Post> {
        Err(AppError::Internal("posts table unavailable".into()))
    }
    async fn get_post(&self, id: i64) -> Result<Option<PostView>> {
        self.inner.get_post(id).await
    }
    async fn update_post(&self, _id: i64, _changes: PostChanges) -> Result<Option<Post>> {
        Err(AppError::Internal("posts table unavailable".into()))
    }
    async fn delete_post(&self, id: i64) -> Result<bool> {
        self.inner.delete_post(id).await
    }
    async fn count_posts(&self, filter: PostFilter) -> Result<usize> {
        self.inner.count_posts(filter).await
    }
    async fn list_posts(
        &self,
        filter: PostFilter,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<PostView>> {
        self.inner.list_posts(filter, limit, offset).await
    }
    async fn create_comment(&self, comment: NewComment) -> Result<Comment> {
        self.inner.create_comment(comment).await
    }
    async fn list_comments(&self, post_id: i64) -> Result<Vec<Comment>> {
        self.inner.list_comments(post_id).await
    }
    async fn follow_exists(&self, user_id: Uuid, author_id: Uuid) -> Result<bool> {
        self.inner.follow_exists(user_id, author_id).await
    }
    async fn create_follow(&self, user_id: Uuid, author_id: Uuid) -> Result<()> {
        self.inner.create_follow(user_id, author_id).await
    }
    async fn delete_follows(&self, user_id: Uuid, author_id: Uuid) -> Result<u64> {
        self.inner.delete_follows(user_id, author_id).await
    }
    async fn count_follows(&self) -> Result<usize> {
        self.inner.count_follows().await
    }
}

fn stored_images(media: &std::path::Path) -> usize {
    std::fs::read_dir(media.join("posts"))
        .map(|entries| entries.count())
        .unwrap_or(0)
}

#[actix_web::test]
async fn failed_post_writes_leave_no_image_behind() {
    let media = tempfile::tempdir().unwrap();
    let inner = MemoryStore::new();
    let author = inner.upsert_user(Uuid::new_v4(), "auth").await.unwrap();
    let post = inner
        .create_post(NewPost {
            text: "Test text".into(),
            author_id: author.id,
            group_id: None,
            image: None,
        })
        .await
        .unwrap();

    let state = web::Data::new(AppState::new(
        Arc::new(BrokenPostWrites { inner }),
        AppConfig::for_memory(SECRET, media.path()),
    ));
    let token = state
        .auth
        .issue_token(author.id, "auth", chrono::Duration::hours(1))
        .unwrap();
    let app = test::init_service(
        App::new()
            .app_data(state.clone())
            .configure(yatube::configure)
            .default_service(web::to(yatube::handlers::not_found)),
    )
    .await;

    let data = base64::engine::general_purpose::STANDARD.encode(SMALL_GIF);
    let form = [
        ("text", "With image"),
        ("image_data", data.as_str()),
        ("image_content_type", "image/gif"),
    ];

    let resp = test::call_service(&app, post_form("/create/", Some(&token), &form).to_request()).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(stored_images(media.path()), 0);

    let edit = format!("/posts/{}/edit/", post.id);
    let resp = test::call_service(&app, post_form(&edit, Some(&token), &form).to_request()).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(stored_images(media.path()), 0);

    let resp = test::call_service(&app, get(&format!("/posts/{}/", post.id), None).to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
}
