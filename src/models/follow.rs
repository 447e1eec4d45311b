use serde::Serialize;
use uuid::Uuid;

/// Directed edge: `user_id` reads `author_id`'s posts in the follow feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Follow {
    pub id: i64,
    pub user_id: Uuid,
    pub author_id: Uuid,
}
