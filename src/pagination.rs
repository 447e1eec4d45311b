//! Page slicing for the post feeds.
//!
//! The store is asked for a count first, the requested page number is
//! resolved against it, and only then is one LIMIT/OFFSET slice fetched.

use serde::{Deserialize, Serialize};

/// Posts per feed page.
pub const NUM_OF_POSTS: usize = 10;

/// `?page=` as it arrives. Kept as a string so junk degrades to page 1
/// instead of failing extraction; a repeated key keeps its last value.
#[derive(Debug, Default, Deserialize)]
#[serde(from = "Vec<(String, String)>")]
pub struct PageQuery {
    pub page: Option<String>,
}

impl From<Vec<(String, String)>> for PageQuery {
    fn from(pairs: Vec<(String, String)>) -> Self {
        Self {
            page: pairs
                .into_iter()
                .filter(|(key, _)| key == "page")
                .map(|(_, value)| value)
                .last(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    count: usize,
    per_page: usize,
}

impl Paginator {
    pub fn new(count: usize, per_page: usize) -> Self {
        Self {
            count,
            per_page: per_page.max(1),
        }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn per_page(&self) -> usize {
        self.per_page
    }

    /// An empty collection still has one (empty) page.
    pub fn num_pages(&self) -> usize {
        if self.count == 0 {
            1
        } else {
            self.count.div_ceil(self.per_page)
        }
    }

    /// Missing or non-numeric input is page 1; numbers are clamped into
    /// `1..=num_pages`, however many digits they have.
    pub fn resolve(&self, raw: Option<&str>) -> usize {
        let last = self.num_pages();
        let Some(raw) = raw.map(str::trim) else {
            return 1;
        };
        match raw.parse::<i64>() {
            Ok(n) if n < 1 => 1,
            Ok(n) => usize::try_from(n).map_or(last, |n| n.min(last)),
            Err(_) if is_unsigned_integer(raw) => last,
            Err(_) => 1,
        }
    }

    pub fn offset(&self, number: usize) -> usize {
        (number.max(1) - 1) * self.per_page
    }

    pub fn page<T>(&self, number: usize, object_list: Vec<T>) -> Page<T> {
        let num_pages = self.num_pages();
        let number = number.clamp(1, num_pages);
        Page {
            object_list,
            number,
            num_pages,
            count: self.count,
            has_next: number < num_pages,
            has_previous: number > 1,
            next_page_number: (number < num_pages).then(|| number + 1),
            previous_page_number: (number > 1).then(|| number - 1),
        }
    }
}

/// Digits with an optional `+`, i.e. a positive number too large for `i64`
/// once parsing has failed.
fn is_unsigned_integer(raw: &str) -> bool {
    let digits = raw.strip_prefix('+').unwrap_or(raw);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub object_list: Vec<T>,
    pub number: usize,
    pub num_pages: usize,
    pub count: usize,
    pub has_next: bool,
    pub has_previous: bool,
    pub next_page_number: Option<usize>,
    pub previous_page_number: Option<usize>,
}

impl<T> Page<T> {
    pub fn len(&self) -> usize {
        self.object_list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.object_list.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fifteen_items_make_two_pages() {
        let p = Paginator::new(15, NUM_OF_POSTS);
        assert_eq!(p.num_pages(), 2);
        assert_eq!(p.offset(1), 0);
        assert_eq!(p.offset(2), 10);

        let second = p.page(2, vec![0u8; 5]);
        assert_eq!(second.len(), 5);
        assert!(second.has_previous);
        assert!(!second.has_next);
        assert_eq!(second.previous_page_number, Some(1));
    }

    #[test]
    fn empty_collection_has_single_page() {
        let p = Paginator::new(0, NUM_OF_POSTS);
        assert_eq!(p.num_pages(), 1);
        assert_eq!(p.resolve(Some("3")), 1);
        let page: Page<u8> = p.page(1, Vec::new());
        assert!(page.is_empty());
        assert!(!page.has_next);
        assert!(!page.has_previous);
    }

    #[test]
    fn resolve_defaults_and_clamps() {
        let p = Paginator::new(25, 10);
        assert_eq!(p.resolve(None), 1);
        assert_eq!(p.resolve(Some("")), 1);
        assert_eq!(p.resolve(Some("abc")), 1);
        assert_eq!(p.resolve(Some("0")), 1);
        assert_eq!(p.resolve(Some("-4")), 1);
        assert_eq!(p.resolve(Some("2")), 2);
        assert_eq!(p.resolve(Some(" 3 ")), 3);
        assert_eq!(p.resolve(Some("99")), 3);
        assert_eq!(p.resolve(Some("99999999999999999999")), 3);
        assert_eq!(p.resolve(Some("+99999999999999999999")), 3);
        assert_eq!(p.resolve(Some("-99999999999999999999")), 1);
        assert_eq!(p.resolve(Some("9999999999999999999x")), 1);
    }

    #[test]
    fn page_query_keeps_last_page_value() {
        let q = actix_web::web::Query::<PageQuery>::from_query("page=1&page=2").unwrap();
        assert_eq!(q.page.as_deref(), Some("2"));

        let q = actix_web::web::Query::<PageQuery>::from_query("sort=new&page=%203").unwrap();
        assert_eq!(q.page.as_deref(), Some(" 3"));

        let q = actix_web::web::Query::<PageQuery>::from_query("").unwrap();
        assert_eq!(q.page, None);
    }

    #[test]
    fn zero_page_size_is_treated_as_one() {
        let p = Paginator::new(3, 0);
        assert_eq!(p.per_page(), 1);
        assert_eq!(p.num_pages(), 3);
    }
}
