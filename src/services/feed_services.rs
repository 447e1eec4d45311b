//! Feed pagination and the index page cache.
use std::time::Duration;

use moka::future::Cache;

use crate::error::Result;
use crate::models::{PostFilter, PostView};
use crate::pagination::{NUM_OF_POSTS, Page, Paginator};
use crate::repositories::Store;

const INDEX_CACHE_CAPACITY: u64 = 1_000;

/// Counts the feed, resolves the requested page and fetches that slice only.
pub async fn paginate_posts(
    store: &dyn Store,
    filter: PostFilter,
    raw_page: Option<&str>,
) -> Result<Page<PostView>> {
    let paginator = Paginator::new(store.count_posts(filter).await?, NUM_OF_POSTS);
    let number = paginator.resolve(raw_page);
    let posts = store
        .list_posts(filter, paginator.per_page(), paginator.offset(number))
        .await?;
    Ok(paginator.page(number, posts))
}

/// Index pages keyed by page number. A zero TTL turns the cache off.
#[derive(Clone)]
pub struct IndexCache {
    pages: Option<Cache<usize, Page<PostView>>>,
}

impl IndexCache {
    pub fn new(ttl: Duration) -> Self {
        let pages = (!ttl.is_zero()).then(|| {
            Cache::builder()
                .max_capacity(INDEX_CACHE_CAPACITY)
                .time_to_live(ttl)
                .build()
        });
        Self { pages }
    }

    pub fn disabled() -> Self {
        Self { pages: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.pages.is_some()
    }

    /// Index page `raw_page`, served from cache while the entry lives.
    pub async fn index_page(
        &self,
        store: &dyn Store,
        raw_page: Option<&str>,
    ) -> Result<Page<PostView>> {
        let Some(pages) = &self.pages else {
            return paginate_posts(store, PostFilter::All, raw_page).await;
        };

        let paginator = Paginator::new(store.count_posts(PostFilter::All).await?, NUM_OF_POSTS);
        let number = paginator.resolve(raw_page);
        if let Some(page) = pages.get(&number).await {
            return Ok(page);
        }

        let posts = store
            .list_posts(PostFilter::All, paginator.per_page(), paginator.offset(number))
            .await?;
        let page = paginator.page(number, posts);
        pages.insert(number, page.clone()).await;
        Ok(page)
    }
}
