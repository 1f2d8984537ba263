use crate::data::{ByteStore, StoreError};
use moka::sync::Cache;
use std::time::Duration;

/// Life window used by the binary for cached API responses
pub const DEFAULT_LIFE_WINDOW: Duration = Duration::from_secs(60 * 60);

/// Largest single entry accepted by default
pub const DEFAULT_MAX_ENTRY_SIZE: usize = 16 * 1024 * 1024;

/// In-memory [`ByteStore`] backed by a moka cache.
///
/// Every entry is dropped once `life_window` has passed since it was written.
/// That horizon is independent of, and usually much longer than, any TTL the
/// expiring cache layers on top.
#[derive(Clone)]
pub struct MemoryStore {
    entries: Cache<Vec<u8>, Vec<u8>>,
    max_entry_size: usize,
}

impl MemoryStore {
    pub fn new(life_window: Duration) -> Self {
        Self::with_max_entry_size(life_window, DEFAULT_MAX_ENTRY_SIZE)
    }

    pub fn with_max_entry_size(life_window: Duration, max_entry_size: usize) -> Self {
        Self {
            entries: Cache::builder().time_to_live(life_window).build(),
            max_entry_size,
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(DEFAULT_LIFE_WINDOW)
    }
}

impl ByteStore for MemoryStore {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.entries.get(key)
    }

    fn set(&self, key: &[u8], value: Vec<u8>) -> Result<(), StoreError> {
        let size = key.len() + value.len();
        if size > self.max_entry_size {
            return Err(StoreError::EntryTooLarge {
                size,
                limit: self.max_entry_size,
            });
        }

        self.entries.insert(key.to_vec(), value);
        Ok(())
    }
}
