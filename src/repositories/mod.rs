//! Persistence seam.
//!
//! Handlers only see `dyn Store`. `PgStore` is the production backend,
//! `MemoryStore` backs local runs and the HTTP test-suite.

pub mod memory_store;
pub mod pg_store;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{
    Comment, Group, NewComment, NewGroup, NewPost, Post, PostChanges, PostFilter, PostView, User,
};

pub use memory_store::MemoryStore;
pub use pg_store::PgStore;

#[async_trait]
pub trait Store: Send + Sync {
    /// Insert the user or refresh its username. Ids come from verified tokens.
    async fn upsert_user(&self, id: Uuid, username: &str) -> Result<User>;
    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>>;

    async fn create_group(&self, group: NewGroup) -> Result<Group>;
    async fn get_group(&self, id: i64) -> Result<Option<Group>>;
    async fn get_group_by_slug(&self, slug: &str) -> Result<Option<Group>>;
    async fn list_groups(&self) -> Result<Vec<Group>>;
    /// Posts of the group survive with `group = None`.
    async fn delete_group(&self, id: i64) -> Result<bool>;

    async fn create_post(&self, post: NewPost) -> Result<Post>;
    async fn get_post(&self, id: i64) -> Result<Option<PostView>>;
    /// `None` when the post does not exist.
    async fn update_post(&self, id: i64, changes: PostChanges) -> Result<Option<Post>>;
    /// Comments of the post go with it.
    async fn delete_post(&self, id: i64) -> Result<bool>;
    async fn count_posts(&self, filter: PostFilter) -> Result<usize>;
    /// Newest first, ties broken by id.
    async fn list_posts(
        &self,
        filter: PostFilter,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<PostView>>;

    async fn create_comment(&self, comment: NewComment) -> Result<Comment>;
    /// Oldest first.
    async fn list_comments(&self, post_id: i64) -> Result<Vec<Comment>>;

    async fn follow_exists(&self, user_id: Uuid, author_id: Uuid) -> Result<bool>;
    async fn create_follow(&self, user_id: Uuid, author_id: Uuid) -> Result<()>;
    /// Number of rows removed.
    async fn delete_follows(&self, user_id: Uuid, author_id: Uuid) -> Result<u64>;
    async fn count_follows(&self) -> Result<usize>;
}
