use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

const READ_URL_PREFIX: &str = "https://app.getpocket.com/read/";

/// Identifier of a saved article, stable across fetches
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// A saved article as reported by the article store.
///
/// Only the fields this crate reads are kept; everything else in the
/// remote record is ignored on decode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub item_id: ItemId,
    #[serde(default)]
    pub resolved_url: String,
    #[serde(default)]
    pub resolved_title: String,
    #[serde(default)]
    pub given_url: String,
}

impl Article {
    pub fn new(item_id: impl Into<String>, resolved_url: impl Into<String>) -> Self {
        Self {
            item_id: ItemId::new(item_id),
            resolved_url: resolved_url.into(),
            resolved_title: String::new(),
            given_url: String::new(),
        }
    }

    /// Reader view of this article on the web app
    pub fn read_url(&self) -> String {
        format!("{}{}", READ_URL_PREFIX, self.item_id)
    }
}

/// Snapshot of saved articles keyed by item id
pub type Favorites = HashMap<ItemId, Article>;
