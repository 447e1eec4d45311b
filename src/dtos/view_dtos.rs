//! Context documents handed to the template renderer.

use serde::Serialize;

use super::comment_dtos::CommentFormValues;
use super::post_dtos::{FormErrors, PostFormValues};
use crate::models::{Comment, Group, PostView, UserRef};
use crate::pagination::Page;

pub const TEMPLATE_INDEX: &str = "posts/index.html";
pub const TEMPLATE_GROUP_LIST: &str = "posts/group_list.html";
pub const TEMPLATE_PROFILE: &str = "posts/profile.html";
pub const TEMPLATE_POST_DETAIL: &str = "posts/post_detail.html";
pub const TEMPLATE_CREATE_POST: &str = "posts/create_post.html";
pub const TEMPLATE_FOLLOW: &str = "posts/follow.html";
pub const TEMPLATE_LOGIN: &str = "users/login.html";
pub const TEMPLATE_NOT_FOUND: &str = "core/404.html";

/// A page: which template to render and with what.
#[derive(Debug, Serialize)]
pub struct Rendered<T: Serialize> {
    pub template: &'static str,
    pub context: T,
}

#[derive(Debug, Serialize)]
pub struct IndexContext {
    pub page_obj: Page<PostView>,
}

#[derive(Debug, Serialize)]
pub struct GroupContext {
    pub group: Group,
    pub page_obj: Page<PostView>,
}

#[derive(Debug, Serialize)]
pub struct ProfileContext {
    pub author: UserRef,
    pub posts_count: usize,
    pub following: bool,
    pub page_obj: Page<PostView>,
}

#[derive(Debug, Serialize)]
pub struct PostDetailContext {
    pub post: PostView,
    /// Number of posts by the same author.
    pub posts_count: usize,
    pub comments: Vec<Comment>,
    pub form: CommentFormValues,
}

#[derive(Debug, Serialize)]
pub struct PostFormContext {
    pub form: PostFormValues,
    pub errors: FormErrors,
    pub groups: Vec<Group>,
    pub is_edit: bool,
    pub post_id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct FollowContext {
    pub page_obj: Page<PostView>,
}

#[derive(Debug, Serialize)]
pub struct LoginContext {
    pub next: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct NotFoundContext {
    pub message: String,
}
