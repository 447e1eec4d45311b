use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::PostView;
use crate::services::media_services::{ImageUpload, is_allowed_type};

pub const REQUIRED: &str = "This field is required.";
pub const INVALID_CHOICE: &str =
    "Select a valid choice. That choice is not one of the available choices.";

/// Field name to messages, in the order fields appear on the form.
pub type FormErrors = BTreeMap<&'static str, Vec<String>>;

pub fn add_error(errors: &mut FormErrors, field: &'static str, message: impl Into<String>) {
    errors.entry(field).or_default().push(message.into());
}

/// Create/edit form as submitted (`application/x-www-form-urlencoded`).
/// `group` is a group id or empty; the image travels as base64.
#[derive(Debug, Default, Deserialize)]
pub struct PostFormDTO {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub group: String,
    #[serde(default)]
    pub image_data: String,
    #[serde(default)]
    pub image_content_type: String,
}

/// What the form fields show when rendered.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PostFormValues {
    pub text: String,
    pub group: Option<i64>,
    pub image: Option<String>,
}

impl PostFormValues {
    pub fn from_post(post: &PostView) -> Self {
        Self {
            text: post.text.clone(),
            group: post.group.as_ref().map(|g| g.id),
            image: post.image.clone(),
        }
    }
}

/// Group selection after parsing: empty means "no group".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupChoice {
    None,
    Id(i64),
    Invalid,
}

impl PostFormDTO {
    /// Leading/trailing whitespace is not part of the post.
    pub fn text(&self) -> &str {
        self.text.trim()
    }

    pub fn group_choice(&self) -> GroupChoice {
        let raw = self.group.trim();
        if raw.is_empty() {
            return GroupChoice::None;
        }
        match raw.parse::<i64>() {
            Ok(id) if id > 0 => GroupChoice::Id(id),
            _ => GroupChoice::Invalid,
        }
    }

    pub fn image(&self) -> Option<ImageUpload<'_>> {
        if self.image_data.trim().is_empty() {
            return None;
        }
        Some(ImageUpload {
            data: &self.image_data,
            content_type: &self.image_content_type,
        })
    }

    /// Checks that need no store access. Group existence is checked by the
    /// caller against the store.
    pub fn validate(&self) -> FormErrors {
        let mut errors = FormErrors::new();
        if self.text().is_empty() {
            add_error(&mut errors, "text", REQUIRED);
        }
        if self.group_choice() == GroupChoice::Invalid {
            add_error(&mut errors, "group", INVALID_CHOICE);
        }
        if let Some(image) = self.image() {
            if !is_allowed_type(image.content_type) {
                add_error(
                    &mut errors,
                    "image",
                    "Upload a valid image. Only JPEG, PNG, GIF, and WEBP are allowed.",
                );
            }
        }
        errors
    }

    /// Values to echo back into a re-rendered form.
    pub fn values(&self) -> PostFormValues {
        PostFormValues {
            text: self.text.clone(),
            group: match self.group_choice() {
                GroupChoice::Id(id) => Some(id),
                _ => None,
            },
            image: None,
        }
    }
}
