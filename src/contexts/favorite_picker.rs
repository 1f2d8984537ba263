use crate::data::{Article, ArticleStore, ArticleStoreError, Cache, Favorites, GetOpts, SetOption};
use rand::Rng;
use sha2::{Digest, Sha256};
use std::fmt;
use std::time::Duration;
use tracing::{debug, warn};

/// Errors that can occur while picking a favorite
#[derive(Debug)]
pub enum PickError {
    Fetch(ArticleStoreError),
    Encode(serde_json::Error),
    Decode(serde_json::Error),
    NoFavorites,
}

impl fmt::Display for PickError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PickError::Fetch(e) => write!(f, "Failed to get favorite articles: {}", e),
            PickError::Encode(e) => write!(f, "Failed to encode favorites for the cache: {}", e),
            PickError::Decode(e) => write!(f, "Failed to decode cached favorites: {}", e),
            PickError::NoFavorites => write!(f, "No favorite articles to pick from"),
        }
    }
}

impl std::error::Error for PickError {}

impl From<ArticleStoreError> for PickError {
    fn from(e: ArticleStoreError) -> Self {
        PickError::Fetch(e)
    }
}

/// Favorite Picker context: draws a random favorite, serving the favorites
/// list from a cache for `ttl` after each fetch.
pub struct FavoritePicker<S, C> {
    store: S,
    cache: C,
    cache_key: Vec<u8>,
    ttl: Duration,
}

impl<S: ArticleStore, C: Cache> FavoritePicker<S, C> {
    /// Creates a new FavoritePicker
    ///
    /// # Arguments
    /// * `store` - Source of the favorites list
    /// * `cache` - Cache holding the serialized list
    /// * `scope` - Owner of the list (e.g. an access token), hashed into the cache key
    /// * `ttl` - How long a fetched list is served from the cache
    pub fn new(store: S, cache: C, scope: &str, ttl: Duration) -> Self {
        Self {
            store,
            cache,
            cache_key: favorites_cache_key(scope).into_bytes(),
            ttl,
        }
    }

    /// Returns the favorites list, from the cache when possible
    pub async fn favorites(&self) -> Result<Favorites, PickError> {
        if let Some(cached) = self.cache.get(&self.cache_key) {
            debug!("load articles from cache");
            return serde_json::from_slice(&cached).map_err(PickError::Decode);
        }

        let favorites = self.store.fetch(&GetOpts::favorited()).await?;
        debug!(articles = favorites.len(), "fetched favorites");

        let encoded = serde_json::to_vec(&favorites).map_err(PickError::Encode)?;
        if let Err(e) = self
            .cache
            .set(&self.cache_key, &encoded, &[SetOption::Ttl(self.ttl)])
        {
            warn!(error = %e, "failed to cache favorites");
        }

        Ok(favorites)
    }

    /// Picks one favorite uniformly at random using `rng`
    pub async fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Article, PickError> {
        let favorites = self.favorites().await?;
        if favorites.is_empty() {
            return Err(PickError::NoFavorites);
        }

        // Map order is unspecified; sort so a seeded rng always draws the same article.
        let mut articles: Vec<Article> = favorites.into_values().collect();
        articles.sort_by(|a, b| a.item_id.cmp(&b.item_id));

        let index = rng.gen_range(0..articles.len());
        Ok(articles.swap_remove(index))
    }
}

/// Cache key of the favorites list owned by `scope`
fn favorites_cache_key(scope: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(scope.as_bytes());
    format!("{}/favorites", hex::encode(hasher.finalize()))
}
