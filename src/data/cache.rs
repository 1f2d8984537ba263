use std::fmt;
use std::time::Duration;

/// Options accepted by [`Cache::set`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum SetOption {
    /// Stop returning the entry once this much time has passed since the write.
    Ttl(Duration),
}

/// Errors raised by the underlying byte store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    EntryTooLarge { size: usize, limit: usize },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            StoreError::EntryTooLarge { size, limit } => {
                write!(f, "Entry of {} bytes exceeds the store limit of {} bytes", size, limit)
            }
        }
    }
}

impl std::error::Error for StoreError {}

/// Errors raised by [`Cache::set`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    Store(StoreError),
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CacheError::Store(e) => write!(f, "Cache write failed: {}", e),
        }
    }
}

impl std::error::Error for CacheError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CacheError::Store(e) => Some(e),
        }
    }
}

impl From<StoreError> for CacheError {
    fn from(e: StoreError) -> Self {
        CacheError::Store(e)
    }
}

/// Opaque key/value byte store with its own coarse-grained eviction.
///
/// Implementations must be internally thread-safe; callers add no locking.
pub trait ByteStore: Send + Sync {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>>;

    /// Writes `value` under `key`, replacing any previous entry.
    fn set(&self, key: &[u8], value: Vec<u8>) -> Result<(), StoreError>;
}

/// Cache trait for storing and retrieving byte values by key.
///
/// Values are opaque; callers serialize and deserialize them.
pub trait Cache {
    /// Retrieves a cached value for the given key.
    ///
    /// # Returns
    /// * `Some(Vec<u8>)` - The cached value if present and not expired
    /// * `None` - If the key doesn't exist or its TTL has passed
    fn get(&self, key: &[u8]) -> Option<Vec<u8>>;

    /// Stores a value for the given key, overwriting any previous value.
    ///
    /// # Arguments
    /// * `key` - The cache key to store under
    /// * `value` - The value to cache
    /// * `opts` - Per-entry options such as [`SetOption::Ttl`]
    fn set(&self, key: &[u8], value: &[u8], opts: &[SetOption]) -> Result<(), CacheError>;

    /// Reports whether `get` would currently return a value.
    fn has(&self, key: &[u8]) -> bool {
        self.get(key).is_some()
    }
}
