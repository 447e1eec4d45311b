use serde::{Deserialize, Serialize};

pub const GROUP_TITLE_MAX_LEN: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub description: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewGroup {
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub description: String,
}

/// Group as embedded in a post listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRef {
    pub id: i64,
    pub title: String,
    pub slug: String,
}

impl From<&Group> for GroupRef {
    fn from(group: &Group) -> Self {
        Self {
            id: group.id,
            title: group.title.clone(),
            slug: group.slug.clone(),
        }
    }
}

impl NewGroup {
    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("Group title cannot be empty".to_string());
        }
        if self.title.chars().count() > GROUP_TITLE_MAX_LEN {
            return Err(format!(
                "Group title must be at most {} characters",
                GROUP_TITLE_MAX_LEN
            ));
        }
        if !is_valid_slug(&self.slug) {
            return Err("Slug may only contain letters, numbers, underscores or hyphens".to_string());
        }
        Ok(())
    }
}

pub fn is_valid_slug(slug: &str) -> bool {
    static SLUG: std::sync::OnceLock<regex::Regex> = std::sync::OnceLock::new();
    SLUG.get_or_init(|| regex::Regex::new(r"^[-a-zA-Z0-9_]+$").expect("slug pattern"))
        .is_match(slug)
}
