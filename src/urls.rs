//! Paths the handlers redirect to.

pub const FOLLOW_INDEX: &str = "/follow/";

pub fn post_detail(post_id: i64) -> String {
    format!("/posts/{}/", post_id)
}

pub fn profile(username: &str) -> String {
    format!("/profile/{}/", urlencoding::encode(username))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_paths() {
        assert_eq!(post_detail(7), "/posts/7/");
        assert_eq!(profile("auth"), "/profile/auth/");
        assert_eq!(profile("a b"), "/profile/a%20b/");
    }
}
