use crate::data::{ArticleStore, ArticleStoreError, Favorites, GetOpts, ItemId};
use tracing::info;

/// Passes reads through to the wrapped store but only logs deletions
pub struct DryRun<S> {
    inner: S,
}

impl<S: ArticleStore> DryRun<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

impl<S: ArticleStore> ArticleStore for DryRun<S> {
    async fn fetch(&self, opts: &GetOpts) -> Result<Favorites, ArticleStoreError> {
        self.inner.fetch(opts).await
    }

    async fn delete(&self, item_ids: &[ItemId]) -> Result<(), ArticleStoreError> {
        info!(count = item_ids.len(), ?item_ids, "dry run, not deleting");
        Ok(())
    }
}
