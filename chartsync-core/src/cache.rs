//! Per-run page cache.
//!
//! Several chart sections live on the same physical page, so the fetch layer
//! memoizes response bodies by URL for the duration of one run. There is no
//! eviction: the cache is constructed at run start and dropped at run end.

use std::collections::HashMap;
use std::future::Future;

use tracing::debug;

#[derive(Debug, Default)]
pub struct PageCache {
    pages: HashMap<String, String>,
}

impl PageCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached body for `url`, fetching and storing it on a miss.
    ///
    /// A failed fetch leaves the slot empty, so a later section on the same
    /// page gets another chance.
    pub async fn get_or_fetch<F, Fut, E>(&mut self, url: &str, fetch: F) -> std::result::Result<&str, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<String, E>>,
    {
        if !self.pages.contains_key(url) {
            let body = fetch().await?;
            self.pages.insert(url.to_string(), body);
        } else {
            debug!(%url, "using cached page");
        }
        Ok(self
            .pages
            .get(url)
            .expect("slot was just checked or filled")
            .as_str())
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.pages.len()
    }
}
