use crate::data::{Favorites, ItemId};
use std::fmt;
use std::future::Future;

/// Favorite-state filter for [`GetOpts`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Favorite {
    Favorited,
    UnFavorited,
}

/// Filter applied when fetching articles
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GetOpts {
    /// Only return items whose title or url contain the search string
    pub search: Option<String>,
    /// Only return items from a particular domain
    pub domain: Option<String>,
    pub favorite: Option<Favorite>,
}

impl GetOpts {
    pub fn favorited() -> Self {
        Self {
            favorite: Some(Favorite::Favorited),
            ..Self::default()
        }
    }

    pub fn search(term: impl Into<String>) -> Self {
        Self {
            search: Some(term.into()),
            ..Self::default()
        }
    }
}

/// Errors reported by an article store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArticleStoreError {
    /// The request never produced a response
    Transport(String),
    /// The service answered with a non-success status
    Status {
        status: u16,
        message: String,
        code: String,
    },
    /// The response body could not be decoded
    Decode(String),
    /// The service accepted the request but refused an action in it
    ActionRejected(String),
}

impl fmt::Display for ArticleStoreError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ArticleStoreError::Transport(details) => {
                write!(f, "Request to article store failed: {}", details)
            }
            ArticleStoreError::Status { status, message, code } => {
                write!(f, "Error with status: {}, error={}, code={}", status, message, code)
            }
            ArticleStoreError::Decode(details) => {
                write!(f, "Failed to decode article store response: {}", details)
            }
            ArticleStoreError::ActionRejected(details) => {
                write!(f, "Article store rejected action: {}", details)
            }
        }
    }
}

impl std::error::Error for ArticleStoreError {}

/// Remote store of saved articles
pub trait ArticleStore: Send + Sync {
    /// Retrieve every article matching `opts`, keyed by item id
    fn fetch(
        &self,
        opts: &GetOpts,
    ) -> impl Future<Output = Result<Favorites, ArticleStoreError>> + Send;

    /// Request permanent removal of `item_ids`.
    ///
    /// Success does not confirm that any particular id existed.
    fn delete(
        &self,
        item_ids: &[ItemId],
    ) -> impl Future<Output = Result<(), ArticleStoreError>> + Send;
}

impl<S: ArticleStore> ArticleStore for &S {
    fn fetch(
        &self,
        opts: &GetOpts,
    ) -> impl Future<Output = Result<Favorites, ArticleStoreError>> + Send {
        (**self).fetch(opts)
    }

    fn delete(
        &self,
        item_ids: &[ItemId],
    ) -> impl Future<Output = Result<(), ArticleStoreError>> + Send {
        (**self).delete(item_ids)
    }
}
