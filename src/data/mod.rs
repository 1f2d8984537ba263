mod article;
mod article_store;
mod cache;
mod link_probe;

pub use article::{Article, Favorites, ItemId};
pub use article_store::{ArticleStore, ArticleStoreError, Favorite, GetOpts};
pub use cache::{ByteStore, Cache, CacheError, SetOption, StoreError};
pub use link_probe::{DeadReason, LinkProbe, LinkStatus};
