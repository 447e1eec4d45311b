use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::group::GroupRef;
use super::user::UserRef;

/// Row of `posts`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Post {
    pub id: i64,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub author_id: Uuid,
    pub group_id: Option<i64>,
    pub image: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub text: String,
    pub author_id: Uuid,
    pub group_id: Option<i64>,
    pub image: Option<String>,
}

/// Fields an author may change. Author and pub_date never move.
#[derive(Debug, Clone)]
pub struct PostChanges {
    pub text: String,
    pub group_id: Option<i64>,
    pub image: Option<String>,
}

/// Post joined with its author and group, the shape every feed renders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostView {
    pub id: i64,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub author: UserRef,
    pub group: Option<GroupRef>,
    pub image: Option<String>,
}

/// Which slice of the posts table a feed shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PostFilter {
    All,
    Group(i64),
    Author(Uuid),
    FollowedBy(Uuid),
}
