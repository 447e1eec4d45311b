use async_trait::async_trait;
use deadpool_postgres::Pool;
use log::info;
use tokio_postgres::Row;
use tokio_postgres::types::ToSql;
use uuid::Uuid;

use super::Store;
use crate::error::{AppError, Result};
use crate::models::{
    Comment, Group, GroupRef, NewComment, NewGroup, NewPost, Post, PostChanges, PostFilter,
    PostView, User, UserRef,
};

const SCHEMA: &str = include_str!("../../migrations/0001_init.sql");

const POST_VIEW_SELECT: &str = "SELECT p.id, p.text, p.pub_date, p.image, \
    u.id AS author_id, u.username, \
    g.id AS group_id, g.title AS group_title, g.slug AS group_slug \
    FROM posts p \
    JOIN users u ON u.id = p.author_id \
    LEFT JOIN groups g ON g.id = p.group_id";

const POST_COLUMNS: &str = "id, text, pub_date, author_id, group_id, image";

/// Postgres-backed store on a deadpool connection pool.
#[derive(Clone)]
pub struct PgStore {
    pool: Pool,
}

impl PgStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Applies the schema. Every statement is `IF NOT EXISTS`, so this runs
    /// on each start.
    pub async fn migrate(&self) -> Result<()> {
        let client = self.pool.get().await?;
        client.batch_execute(SCHEMA).await?;
        info!("database schema is up to date");
        Ok(())
    }
}

fn user_from_row(row: &Row) -> User {
    User {
        id: row.get("id"),
        username: row.get("username"),
        created_at: row.get("created_at"),
    }
}

fn group_from_row(row: &Row) -> Group {
    Group {
        id: row.get("id"),
        title: row.get("title"),
        slug: row.get("slug"),
        description: row.get("description"),
    }
}

fn post_from_row(row: &Row) -> Post {
    Post {
        id: row.get("id"),
        text: row.get("text"),
        pub_date: row.get("pub_date"),
        author_id: row.get("author_id"),
        group_id: row.get("group_id"),
        image: row.get("image"),
    }
}

fn post_view_from_row(row: &Row) -> PostView {
    let group_id: Option<i64> = row.get("group_id");
    PostView {
        id: row.get("id"),
        text: row.get("text"),
        pub_date: row.get("pub_date"),
        author: UserRef {
            id: row.get("author_id"),
            username: row.get("username"),
        },
        group: group_id.map(|id| GroupRef {
            id,
            title: row.get("group_title"),
            slug: row.get("group_slug"),
        }),
        image: row.get("image"),
    }
}

fn comment_from_row(row: &Row) -> Comment {
    Comment {
        id: row.get("id"),
        post_id: row.get("post_id"),
        author: UserRef {
            id: row.get("author_id"),
            username: row.get("username"),
        },
        text: row.get("text"),
        created: row.get("created"),
    }
}

fn filter_clause(filter: &PostFilter) -> (&'static str, Vec<&(dyn ToSql + Sync)>) {
    match filter {
        PostFilter::All => ("", Vec::new()),
        PostFilter::Group(id) => ("WHERE p.group_id = $1", vec![id as &(dyn ToSql + Sync)]),
        PostFilter::Author(id) => ("WHERE p.author_id = $1", vec![id as &(dyn ToSql + Sync)]),
        PostFilter::FollowedBy(id) => (
            "WHERE p.author_id IN (SELECT f.author_id FROM follows f WHERE f.user_id = $1)",
            vec![id as &(dyn ToSql + Sync)],
        ),
    }
}

#[async_trait]
impl Store for PgStore {
    async fn upsert_user(&self, id: Uuid, username: &str) -> Result<User> {
        let client = self.pool.get().await?;
        let stmt = client
            .prepare_cached(
                "INSERT INTO users (id, username) VALUES ($1, $2) \
                 ON CONFLICT (id) DO UPDATE SET username = EXCLUDED.username \
                 RETURNING id, username, created_at",
            )
            .await?;
        let row = client.query_one(&stmt, &[&id, &username]).await?;
        Ok(user_from_row(&row))
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let client = self.pool.get().await?;
        let stmt = client
            .prepare_cached("SELECT id, username, created_at FROM users WHERE username = $1")
            .await?;
        let row = client.query_opt(&stmt, &[&username]).await?;
        Ok(row.as_ref().map(user_from_row))
    }

    async fn create_group(&self, group: NewGroup) -> Result<Group> {
        group.validate().map_err(AppError::Validation)?;
        let client = self.pool.get().await?;
        let stmt = client
            .prepare_cached(
                "INSERT INTO groups (title, slug, description) VALUES ($1, $2, $3) \
                 RETURNING id, title, slug, description",
            )
            .await?;
        let row = client
            .query_one(&stmt, &[&group.title, &group.slug, &group.description])
            .await?;
        Ok(group_from_row(&row))
    }

    async fn get_group(&self, id: i64) -> Result<Option<Group>> {
        let client = self.pool.get().await?;
        let stmt = client
            .prepare_cached("SELECT id, title, slug, description FROM groups WHERE id = $1")
            .await?;
        let row = client.query_opt(&stmt, &[&id]).await?;
        Ok(row.as_ref().map(group_from_row))
    }

    async fn get_group_by_slug(&self, slug: &str) -> Result<Option<Group>> {
        let client = self.pool.get().await?;
        let stmt = client
            .prepare_cached("SELECT id, title, slug, description FROM groups WHERE slug = $1")
            .await?;
        let row = client.query_opt(&stmt, &[&slug]).await?;
        Ok(row.as_ref().map(group_from_row))
    }

    async fn list_groups(&self) -> Result<Vec<Group>> {
        let client = self.pool.get().await?;
        let stmt = client
            .prepare_cached("SELECT id, title, slug, description FROM groups ORDER BY title, id")
            .await?;
        let rows = client.query(&stmt, &[]).await?;
        Ok(rows.iter().map(group_from_row).collect())
    }

    async fn delete_group(&self, id: i64) -> Result<bool> {
        let client = self.pool.get().await?;
        let stmt = client.prepare_cached("DELETE FROM groups WHERE id = $1").await?;
        Ok(client.execute(&stmt, &[&id]).await? > 0)
    }

    async fn create_post(&self, post: NewPost) -> Result<Post> {
        let client = self.pool.get().await?;
        let sql = format!(
            "INSERT INTO posts (text, author_id, group_id, image) VALUES ($1, $2, $3, $4) \
             RETURNING {}",
            POST_COLUMNS
        );
        let stmt = client.prepare_cached(&sql).await?;
        let row = client
            .query_one(
                &stmt,
                &[&post.text, &post.author_id, &post.group_id, &post.image],
            )
            .await?;
        Ok(post_from_row(&row))
    }

    async fn get_post(&self, id: i64) -> Result<Option<PostView>> {
        let client = self.pool.get().await?;
        let sql = format!("{} WHERE p.id = $1", POST_VIEW_SELECT);
        let stmt = client.prepare_cached(&sql).await?;
        let row = client.query_opt(&stmt, &[&id]).await?;
        Ok(row.as_ref().map(post_view_from_row))
    }

    async fn update_post(&self, id: i64, changes: PostChanges) -> Result<Option<Post>> {
        let client = self.pool.get().await?;
        let sql = format!(
            "UPDATE posts SET text = $2, group_id = $3, image = $4 WHERE id = $1 RETURNING {}",
            POST_COLUMNS
        );
        let stmt = client.prepare_cached(&sql).await?;
        let row = client
            .query_opt(
                &stmt,
                &[&id, &changes.text, &changes.group_id, &changes.image],
            )
            .await?;
        Ok(row.as_ref().map(post_from_row))
    }

    async fn delete_post(&self, id: i64) -> Result<bool> {
        let client = self.pool.get().await?;
        let stmt = client.prepare_cached("DELETE FROM posts WHERE id = $1").await?;
        Ok(client.execute(&stmt, &[&id]).await? > 0)
    }

    async fn count_posts(&self, filter: PostFilter) -> Result<usize> {
        let client = self.pool.get().await?;
        let (clause, params) = filter_clause(&filter);
        let sql = format!("SELECT COUNT(*) FROM posts p {}", clause);
        let row = client.query_one(sql.as_str(), &params).await?;
        let count: i64 = row.get(0);
        Ok(count as usize)
    }

    async fn list_posts(
        &self,
        filter: PostFilter,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<PostView>> {
        let client = self.pool.get().await?;
        let limit = limit as i64;
        let offset = offset as i64;
        let (clause, mut params) = filter_clause(&filter);
        let sql = format!(
            "{} {} ORDER BY p.pub_date DESC, p.id DESC LIMIT ${} OFFSET ${}",
            POST_VIEW_SELECT,
            clause,
            params.len() + 1,
            params.len() + 2
        );
        params.push(&limit);
        params.push(&offset);
        let rows = client.query(sql.as_str(), &params).await?;
        Ok(rows.iter().map(post_view_from_row).collect())
    }

    async fn create_comment(&self, comment: NewComment) -> Result<Comment> {
        let client = self.pool.get().await?;
        let stmt = client
            .prepare_cached(
                "WITH c AS ( \
                     INSERT INTO comments (post_id, author_id, text) VALUES ($1, $2, $3) \
                     RETURNING id, post_id, author_id, text, created \
                 ) \
                 SELECT c.id, c.post_id, c.author_id, u.username, c.text, c.created \
                 FROM c JOIN users u ON u.id = c.author_id",
            )
            .await?;
        let row = client
            .query_one(&stmt, &[&comment.post_id, &comment.author_id, &comment.text])
            .await?;
        Ok(comment_from_row(&row))
    }

    async fn list_comments(&self, post_id: i64) -> Result<Vec<Comment>> {
        let client = self.pool.get().await?;
        let stmt = client
            .prepare_cached(
                "SELECT c.id, c.post_id, c.author_id, u.username, c.text, c.created \
                 FROM comments c JOIN users u ON u.id = c.author_id \
                 WHERE c.post_id = $1 ORDER BY c.created, c.id",
            )
            .await?;
        let rows = client.query(&stmt, &[&post_id]).await?;
        Ok(rows.iter().map(comment_from_row).collect())
    }

    async fn follow_exists(&self, user_id: Uuid, author_id: Uuid) -> Result<bool> {
        let client = self.pool.get().await?;
        let stmt = client
            .prepare_cached(
                "SELECT EXISTS (SELECT 1 FROM follows WHERE user_id = $1 AND author_id = $2)",
            )
            .await?;
        let row = client.query_one(&stmt, &[&user_id, &author_id]).await?;
        Ok(row.get(0))
    }

    async fn create_follow(&self, user_id: Uuid, author_id: Uuid) -> Result<()> {
        let client = self.pool.get().await?;
        let stmt = client
            .prepare_cached(
                "INSERT INTO follows (user_id, author_id) VALUES ($1, $2) \
                 ON CONFLICT (user_id, author_id) DO NOTHING",
            )
            .await?;
        client.execute(&stmt, &[&user_id, &author_id]).await?;
        Ok(())
    }

    async fn delete_follows(&self, user_id: Uuid, author_id: Uuid) -> Result<u64> {
        let client = self.pool.get().await?;
        let stmt = client
            .prepare_cached("DELETE FROM follows WHERE user_id = $1 AND author_id = $2")
            .await?;
        Ok(client.execute(&stmt, &[&user_id, &author_id]).await?)
    }

    async fn count_follows(&self) -> Result<usize> {
        let client = self.pool.get().await?;
        let row = client.query_one("SELECT COUNT(*) FROM follows", &[]).await?;
        let count: i64 = row.get(0);
        Ok(count as usize)
    }
}
