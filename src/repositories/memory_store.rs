use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::Store;
use crate::error::{AppError, Result};
use crate::models::{
    Comment, Follow, Group, GroupRef, NewComment, NewGroup, NewPost, Post, PostChanges,
    PostFilter, PostView, User, UserRef,
};

#[derive(Default)]
struct Tables {
    users: BTreeMap<Uuid, User>,
    groups: BTreeMap<i64, Group>,
    posts: BTreeMap<i64, Post>,
    comments: BTreeMap<i64, Comment>,
    follows: Vec<Follow>,
    next_group_id: i64,
    next_post_id: i64,
    next_comment_id: i64,
    next_follow_id: i64,
}

impl Tables {
    fn next_id(counter: &mut i64) -> i64 {
        *counter += 1;
        *counter
    }

    fn matches(&self, post: &Post, filter: PostFilter) -> bool {
        match filter {
            PostFilter::All => true,
            PostFilter::Group(id) => post.group_id == Some(id),
            PostFilter::Author(id) => post.author_id == id,
            PostFilter::FollowedBy(user_id) => self
                .follows
                .iter()
                .any(|f| f.user_id == user_id && f.author_id == post.author_id),
        }
    }

    fn view(&self, post: &Post) -> Result<PostView> {
        let author = self
            .users
            .get(&post.author_id)
            .ok_or_else(|| AppError::Internal(format!("post {} has no author row", post.id)))?;
        Ok(PostView {
            id: post.id,
            text: post.text.clone(),
            pub_date: post.pub_date,
            author: UserRef::from(author),
            group: post
                .group_id
                .and_then(|id| self.groups.get(&id))
                .map(GroupRef::from),
            image: post.image.clone(),
        })
    }

    fn user_ref(&self, id: Uuid) -> Result<UserRef> {
        self.users
            .get(&id)
            .map(UserRef::from)
            .ok_or_else(|| AppError::Internal(format!("unknown user {}", id)))
    }
}

/// In-process store with the same semantics as the Postgres schema,
/// foreign-key actions included.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn upsert_user(&self, id: Uuid, username: &str) -> Result<User> {
        let mut t = self.tables.write().await;
        if t.users.values().any(|u| u.username == username && u.id != id) {
            return Err(AppError::Internal(format!(
                "username {} already belongs to another user",
                username
            )));
        }
        let user = t.users.entry(id).or_insert_with(|| User {
            id,
            username: username.to_string(),
            created_at: Utc::now(),
        });
        user.username = username.to_string();
        Ok(user.clone())
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let t = self.tables.read().await;
        Ok(t.users.values().find(|u| u.username == username).cloned())
    }

    async fn create_group(&self, group: NewGroup) -> Result<Group> {
        group.validate().map_err(AppError::Validation)?;
        let mut t = self.tables.write().await;
        if t.groups.values().any(|g| g.slug == group.slug) {
            return Err(AppError::Internal(format!("slug {} already taken", group.slug)));
        }
        let id = Tables::next_id(&mut t.next_group_id);
        let group = Group {
            id,
            title: group.title,
            slug: group.slug,
            description: group.description,
        };
        t.groups.insert(id, group.clone());
        Ok(group)
    }

    async fn get_group(&self, id: i64) -> Result<Option<Group>> {
        Ok(self.tables.read().await.groups.get(&id).cloned())
    }

    async fn get_group_by_slug(&self, slug: &str) -> Result<Option<Group>> {
        let t = self.tables.read().await;
        Ok(t.groups.values().find(|g| g.slug == slug).cloned())
    }

    async fn list_groups(&self) -> Result<Vec<Group>> {
        let t = self.tables.read().await;
        let mut groups: Vec<Group> = t.groups.values().cloned().collect();
        groups.sort_by(|a, b| a.title.cmp(&b.title).then(a.id.cmp(&b.id)));
        Ok(groups)
    }

    async fn delete_group(&self, id: i64) -> Result<bool> {
        let mut t = self.tables.write().await;
        if t.groups.remove(&id).is_none() {
            return Ok(false);
        }
        for post in t.posts.values_mut().filter(|p| p.group_id == Some(id)) {
            post.group_id = None;
        }
        Ok(true)
    }

    async fn create_post(&self, post: NewPost) -> Result<Post> {
        let mut t = self.tables.write().await;
        if !t.users.contains_key(&post.author_id) {
            return Err(AppError::Internal(format!("unknown author {}", post.author_id)));
        }
        if let Some(group_id) = post.group_id {
            if !t.groups.contains_key(&group_id) {
                return Err(AppError::Internal(format!("unknown group {}", group_id)));
            }
        }
        let id = Tables::next_id(&mut t.next_post_id);
        let post = Post {
            id,
            text: post.text,
            pub_date: Utc::now(),
            author_id: post.author_id,
            group_id: post.group_id,
            image: post.image,
        };
        t.posts.insert(id, post.clone());
        Ok(post)
    }

    async fn get_post(&self, id: i64) -> Result<Option<PostView>> {
        let t = self.tables.read().await;
        t.posts.get(&id).map(|p| t.view(p)).transpose()
    }

    async fn update_post(&self, id: i64, changes: PostChanges) -> Result<Option<Post>> {
        let mut t = self.tables.write().await;
        if let Some(group_id) = changes.group_id {
            if !t.groups.contains_key(&group_id) {
                return Err(AppError::Internal(format!("unknown group {}", group_id)));
            }
        }
        Ok(t.posts.get_mut(&id).map(|post| {
            post.text = changes.text;
            post.group_id = changes.group_id;
            post.image = changes.image;
            post.clone()
        }))
    }

    async fn delete_post(&self, id: i64) -> Result<bool> {
        let mut t = self.tables.write().await;
        if t.posts.remove(&id).is_none() {
            return Ok(false);
        }
        t.comments.retain(|_, c| c.post_id != id);
        Ok(true)
    }

    async fn count_posts(&self, filter: PostFilter) -> Result<usize> {
        let t = self.tables.read().await;
        Ok(t.posts.values().filter(|p| t.matches(p, filter)).count())
    }

    async fn list_posts(
        &self,
        filter: PostFilter,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<PostView>> {
        let t = self.tables.read().await;
        let mut posts: Vec<&Post> = t.posts.values().filter(|p| t.matches(p, filter)).collect();
        posts.sort_by(|a, b| b.pub_date.cmp(&a.pub_date).then(b.id.cmp(&a.id)));
        posts
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(|p| t.view(p))
            .collect()
    }

    async fn create_comment(&self, comment: NewComment) -> Result<Comment> {
        let mut t = self.tables.write().await;
        if !t.posts.contains_key(&comment.post_id) {
            return Err(AppError::Internal(format!("unknown post {}", comment.post_id)));
        }
        let author = t.user_ref(comment.author_id)?;
        let id = Tables::next_id(&mut t.next_comment_id);
        let comment = Comment {
            id,
            post_id: comment.post_id,
            author,
            text: comment.text,
            created: Utc::now(),
        };
        t.comments.insert(id, comment.clone());
        Ok(comment)
    }

    async fn list_comments(&self, post_id: i64) -> Result<Vec<Comment>> {
        let t = self.tables.read().await;
        // Ids grow monotonically, so key order is creation order.
        Ok(t.comments
            .values()
            .filter(|c| c.post_id == post_id)
            .cloned()
            .collect())
    }

    async fn follow_exists(&self, user_id: Uuid, author_id: Uuid) -> Result<bool> {
        let t = self.tables.read().await;
        Ok(t.follows
            .iter()
            .any(|f| f.user_id == user_id && f.author_id == author_id))
    }

    async fn create_follow(&self, user_id: Uuid, author_id: Uuid) -> Result<()> {
        let mut t = self.tables.write().await;
        t.user_ref(user_id)?;
        t.user_ref(author_id)?;
        if t.follows
            .iter()
            .any(|f| f.user_id == user_id && f.author_id == author_id)
        {
            return Ok(());
        }
        let id = Tables::next_id(&mut t.next_follow_id);
        t.follows.push(Follow {
            id,
            user_id,
            author_id,
        });
        Ok(())
    }

    async fn delete_follows(&self, user_id: Uuid, author_id: Uuid) -> Result<u64> {
        let mut t = self.tables.write().await;
        let before = t.follows.len();
        t.follows
            .retain(|f| !(f.user_id == user_id && f.author_id == author_id));
        Ok((before - t.follows.len()) as u64)
    }

    async fn count_follows(&self) -> Result<usize> {
        Ok(self.tables.read().await.follows.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seeded() -> (MemoryStore, User, Group) {
        let store = MemoryStore::new();
        let user = store.upsert_user(Uuid::new_v4(), "auth").await.unwrap();
        let group = store
            .create_group(NewGroup {
                title: "Test group".into(),
                slug: "test-slug".into(),
                description: "Test description".into(),
            })
            .await
            .unwrap();
        (store, user, group)
    }

    fn new_post(author: &User, group: Option<&Group>, text: &str) -> NewPost {
        NewPost {
            text: text.into(),
            author_id: author.id,
            group_id: group.map(|g| g.id),
            image: None,
        }
    }

    #[tokio::test]
    async fn list_is_newest_first_and_sliced() {
        let (store, user, _) = seeded().await;
        for i in 0..15 {
            store
                .create_post(new_post(&user, None, &i.to_string()))
                .await
                .unwrap();
        }
        assert_eq!(store.count_posts(PostFilter::All).await.unwrap(), 15);

        let first = store.list_posts(PostFilter::All, 10, 0).await.unwrap();
        assert_eq!(first.len(), 10);
        assert_eq!(first[0].text, "14");

        let second = store.list_posts(PostFilter::All, 10, 10).await.unwrap();
        assert_eq!(second.len(), 5);
        assert_eq!(second[4].text, "0");
    }

    #[tokio::test]
    async fn deleting_group_keeps_its_posts() {
        let (store, user, group) = seeded().await;
        let post = store
            .create_post(new_post(&user, Some(&group), "grouped"))
            .await
            .unwrap();

        assert!(store.delete_group(group.id).await.unwrap());
        let view = store.get_post(post.id).await.unwrap().unwrap();
        assert!(view.group.is_none());
        assert_eq!(store.count_posts(PostFilter::Group(group.id)).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn deleting_post_drops_its_comments() {
        let (store, user, _) = seeded().await;
        let post = store.create_post(new_post(&user, None, "p")).await.unwrap();
        store
            .create_comment(NewComment {
                post_id: post.id,
                author_id: user.id,
                text: "first".into(),
            })
            .await
            .unwrap();

        assert!(store.delete_post(post.id).await.unwrap());
        assert!(store.list_comments(post.id).await.unwrap().is_empty());
        assert!(store.get_post(post.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn follow_rows_are_unique_per_pair() {
        let (store, user, _) = seeded().await;
        let author = store.upsert_user(Uuid::new_v4(), "author").await.unwrap();

        store.create_follow(user.id, author.id).await.unwrap();
        store.create_follow(user.id, author.id).await.unwrap();
        assert_eq!(store.count_follows().await.unwrap(), 1);

        let post = store.create_post(new_post(&author, None, "hi")).await.unwrap();
        let feed = store
            .list_posts(PostFilter::FollowedBy(user.id), 10, 0)
            .await
            .unwrap();
        assert_eq!(feed[0].id, post.id);

        assert_eq!(store.delete_follows(user.id, author.id).await.unwrap(), 1);
        assert_eq!(store.delete_follows(user.id, author.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn upsert_refreshes_username_but_rejects_duplicates() {
        let store = MemoryStore::new();
        let id = Uuid::new_v4();
        store.upsert_user(id, "old").await.unwrap();
        let renamed = store.upsert_user(id, "new").await.unwrap();
        assert_eq!(renamed.username, "new");
        assert!(store.get_user_by_username("old").await.unwrap().is_none());

        assert!(store.upsert_user(Uuid::new_v4(), "new").await.is_err());
    }

    #[tokio::test]
    async fn group_slug_is_validated_and_unique() {
        let (store, _, group) = seeded().await;
        let dup = store
            .create_group(NewGroup {
                title: "Other".into(),
                slug: group.slug.clone(),
                description: String::new(),
            })
            .await;
        assert!(dup.is_err());

        let bad = store
            .create_group(NewGroup {
                title: "Other".into(),
                slug: "has space".into(),
                description: String::new(),
            })
            .await;
        assert!(matches!(bad, Err(AppError::Validation(_))));
        assert_eq!(store.list_groups().await.unwrap().len(), 1);
    }
}
