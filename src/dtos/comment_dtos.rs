use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Deserialize)]
pub struct CommentFormDTO {
    #[serde(default)]
    pub text: String,
}

impl CommentFormDTO {
    /// The trimmed comment, or `None` when there is nothing to store.
    pub fn cleaned_text(&self) -> Option<&str> {
        let text = self.text.trim();
        (!text.is_empty()).then_some(text)
    }
}

/// Empty comment form shown under a post.
#[derive(Debug, Default, Serialize)]
pub struct CommentFormValues {
    pub text: String,
}
