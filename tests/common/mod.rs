#![allow(dead_code, unused_macros)]

use std::sync::Arc;

use actix_web::http::header;
use actix_web::test::TestRequest;
use actix_web::web;
use chrono::Duration;
use tempfile::TempDir;
use uuid::Uuid;

use yatube::AppState;
use yatube::config::AppConfig;
use yatube::models::{Group, NewGroup, NewPost, Post, User};
use yatube::repositories::{MemoryStore, Store};

pub const SECRET: &str = "test-secret";

/// Builds the full app around a test context's state.
macro_rules! test_app {
    ($ctx:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data($ctx.state.clone())
                .configure(yatube::configure)
                .default_service(actix_web::web::to(yatube::handlers::not_found)),
        )
        .await
    };
}

pub struct TestContext {
    pub state: web::Data<AppState>,
    pub store: Arc<MemoryStore>,
    pub media: TempDir,
}

impl TestContext {
    pub fn new() -> Self {
        let media = tempfile::tempdir().expect("temp media root");
        let store = Arc::new(MemoryStore::new());
        let config = AppConfig::for_memory(SECRET, media.path());
        let state = web::Data::new(AppState::new(store.clone(), config));
        Self { state, store, media }
    }

    /// Registered user plus a bearer token for it.
    pub async fn user(&self, username: &str) -> (User, String) {
        let user = self
            .store
            .upsert_user(Uuid::new_v4(), username)
            .await
            .expect("create user");
        let token = self.token_for(user.id, username);
        (user, token)
    }

    /// Token for an identity the store has not seen yet.
    pub fn token_for(&self, id: Uuid, username: &str) -> String {
        self.state
            .auth
            .issue_token(id, username, Duration::hours(1))
            .expect("issue token")
    }

    pub async fn group(&self, title: &str, slug: &str) -> Group {
        self.store
            .create_group(NewGroup {
                title: title.into(),
                slug: slug.into(),
                description: "Test description".into(),
            })
            .await
            .expect("create group")
    }

    pub async fn post(&self, author: &User, group: Option<&Group>, text: &str) -> Post {
        self.store
            .create_post(NewPost {
                text: text.into(),
                author_id: author.id,
                group_id: group.map(|g| g.id),
                image: None,
            })
            .await
            .expect("create post")
    }
}

pub fn get(uri: &str, token: Option<&str>) -> TestRequest {
    with_token(TestRequest::get().uri(uri), token)
}

pub fn post_form(uri: &str, token: Option<&str>, form: &[(&str, &str)]) -> TestRequest {
    with_token(TestRequest::post().uri(uri).set_form(form), token)
}

fn with_token(req: TestRequest, token: Option<&str>) -> TestRequest {
    match token {
        Some(t) => req.insert_header((header::AUTHORIZATION, format!("Bearer {}", t))),
        None => req,
    }
}

pub fn location(resp: &actix_web::dev::ServiceResponse) -> String {
    resp.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// Ids of the posts in a rendered feed page, in order.
pub fn page_ids(body: &serde_json::Value) -> Vec<i64> {
    body["context"]["page_obj"]["object_list"]
        .as_array()
        .map(|posts| posts.iter().filter_map(|p| p["id"].as_i64()).collect())
        .unwrap_or_default()
}
