use crate::data::{ByteStore, Cache, CacheError, SetOption};
use chrono::{DateTime, TimeDelta, Utc};
use tracing::debug;

const TAG_PLAIN: u8 = 0;
const TAG_EXPIRING: u8 = 1;

/// Source of the current instant, injectable for tests
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// ExpiringCache is an implementation of the Cache trait that layers an optional
/// per-entry expiry on top of an opaque [`ByteStore`].
///
/// Each entry is stored as a single envelope: a one byte tag, then (for expiring
/// entries) the absolute expiry as big-endian milliseconds since the epoch, then
/// the payload. Value and expiry are written together, so a value can never be
/// observed without the expiry it was written with.
///
/// The store must only be written through this cache. The tag is not
/// self-describing, so bytes from another writer that happen to start with a
/// valid tag are read as an envelope. Values too short to be an envelope, or
/// carrying an unknown tag, are returned as-is and never expire.
///
/// The store keeps its own coarse eviction horizon. An entry past its expiry is
/// reported as a miss even while the store still holds the bytes.
#[derive(Debug, Clone)]
pub struct ExpiringCache<S, C = SystemClock> {
    store: S,
    clock: C,
}

impl<S: ByteStore> ExpiringCache<S> {
    pub fn new(store: S) -> Self {
        Self::with_clock(store, SystemClock)
    }
}

impl<S: ByteStore, C: Clock> ExpiringCache<S, C> {
    pub fn with_clock(store: S, clock: C) -> Self {
        Self { store, clock }
    }
}

impl<S: ByteStore, C: Clock> Cache for ExpiringCache<S, C> {
    /// Returns the payload unless the entry is missing or its expiry has been reached.
    ///
    /// Entries written without a TTL, or whose envelope carries no readable expiry,
    /// are returned as non-expiring.
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        let Some(raw) = self.store.get(key) else {
            debug!(key = %String::from_utf8_lossy(key), "cache miss");
            return None;
        };

        let envelope = Envelope::decode(&raw);
        if let Some(expires_at) = envelope.expires_at {
            if expires_at <= self.clock.now() {
                debug!(key = %String::from_utf8_lossy(key), %expires_at, "cache entry expired");
                return None;
            }
        }

        debug!(key = %String::from_utf8_lossy(key), "cache hit");
        Some(envelope.payload.to_vec())
    }

    /// Writes `value` unconditionally. A TTL is turned into an absolute instant here,
    /// at write time.
    fn set(&self, key: &[u8], value: &[u8], opts: &[SetOption]) -> Result<(), CacheError> {
        let mut expires_at = None;
        for opt in opts {
            match opt {
                SetOption::Ttl(ttl) => {
                    // A TTL too large for chrono is treated as no expiry.
                    expires_at = TimeDelta::from_std(*ttl)
                        .ok()
                        .and_then(|ttl| self.clock.now().checked_add_signed(ttl));
                }
            }
        }

        self.store.set(key, Envelope::encode(value, expires_at))?;
        Ok(())
    }
}

struct Envelope<'a> {
    expires_at: Option<DateTime<Utc>>,
    payload: &'a [u8],
}

impl<'a> Envelope<'a> {
    fn encode(payload: &[u8], expires_at: Option<DateTime<Utc>>) -> Vec<u8> {
        match expires_at {
            Some(expires_at) => {
                let mut buf = Vec::with_capacity(1 + 8 + payload.len());
                buf.push(TAG_EXPIRING);
                buf.extend_from_slice(&expires_at.timestamp_millis().to_be_bytes());
                buf.extend_from_slice(payload);
                buf
            }
            None => {
                let mut buf = Vec::with_capacity(1 + payload.len());
                buf.push(TAG_PLAIN);
                buf.extend_from_slice(payload);
                buf
            }
        }
    }

    fn decode(raw: &'a [u8]) -> Self {
        match raw.split_first() {
            Some((&TAG_PLAIN, payload)) => Self {
                expires_at: None,
                payload,
            },
            Some((&TAG_EXPIRING, rest)) => match rest.split_first_chunk::<8>() {
                Some((millis, payload)) => Self {
                    expires_at: DateTime::from_timestamp_millis(i64::from_be_bytes(*millis)),
                    payload,
                },
                None => Self {
                    expires_at: None,
                    payload: raw,
                },
            },
            // Unknown tag or empty: hand the bytes back untouched.
            _ => Self {
                expires_at: None,
                payload: raw,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::MemoryStore;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    #[derive(Clone)]
    struct ManualClock(Arc<Mutex<DateTime<Utc>>>);

    impl ManualClock {
        fn new() -> Self {
            Self(Arc::new(Mutex::new(Utc::now())))
        }

        fn advance(&self, by: Duration) {
            let mut now = self.0.lock().unwrap();
            *now += TimeDelta::from_std(by).unwrap();
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            *self.0.lock().unwrap()
        }
    }

    fn cache_with_clock() -> (ExpiringCache<MemoryStore, ManualClock>, ManualClock) {
        let clock = ManualClock::new();
        let store = MemoryStore::new(Duration::from_secs(3600));
        (ExpiringCache::with_clock(store, clock.clone()), clock)
    }

    #[test]
    fn test_cache_get_set() {
        let (cache, _) = cache_with_clock();

        // Test cache miss
        assert_eq!(cache.get(b"nonexistent"), None);

        // Test cache set and get
        cache.set(b"test_key", b"test_value", &[]).unwrap();
        assert_eq!(cache.get(b"test_key"), Some(b"test_value".to_vec()));

        // Test overwrite
        cache.set(b"test_key", b"new_value", &[]).unwrap();
        assert_eq!(cache.get(b"test_key"), Some(b"new_value".to_vec()));
    }

    #[test]
    fn test_ttl_entry_expires() {
        let (cache, clock) = cache_with_clock();

        cache
            .set(b"k", b"v", &[SetOption::Ttl(Duration::from_millis(100))])
            .unwrap();
        assert_eq!(cache.get(b"k"), Some(b"v".to_vec()));

        clock.advance(Duration::from_millis(99));
        assert_eq!(cache.get(b"k"), Some(b"v".to_vec()));

        clock.advance(Duration::from_secs(2));
        assert_eq!(cache.get(b"k"), None);
    }

    #[test]
    fn test_entry_without_ttl_does_not_expire() {
        let (cache, clock) = cache_with_clock();

        cache.set(b"k", b"v", &[]).unwrap();
        clock.advance(Duration::from_secs(60 * 60 * 24 * 365));
        assert_eq!(cache.get(b"k"), Some(b"v".to_vec()));
    }

    #[test]
    fn test_expiry_fixed_at_write_time() {
        let (cache, clock) = cache_with_clock();

        cache
            .set(b"k", b"v", &[SetOption::Ttl(Duration::from_secs(10))])
            .unwrap();
        clock.advance(Duration::from_secs(6));
        // A read does not extend the window.
        assert!(cache.get(b"k").is_some());
        clock.advance(Duration::from_secs(6));
        assert!(cache.get(b"k").is_none());
    }

    #[test]
    fn test_overwrite_without_ttl_clears_expiry() {
        let (cache, clock) = cache_with_clock();

        cache
            .set(b"k", b"old", &[SetOption::Ttl(Duration::from_secs(1))])
            .unwrap();
        cache.set(b"k", b"new", &[]).unwrap();
        clock.advance(Duration::from_secs(5));
        assert_eq!(cache.get(b"k"), Some(b"new".to_vec()));
    }

    #[test]
    fn test_zero_ttl_is_immediately_expired() {
        let (cache, _) = cache_with_clock();

        cache.set(b"k", b"v", &[SetOption::Ttl(Duration::ZERO)]).unwrap();
        assert_eq!(cache.get(b"k"), None);
    }

    #[test]
    fn test_has_matches_get() {
        let (cache, clock) = cache_with_clock();

        assert!(!cache.has(b"k"));
        cache
            .set(b"k", b"v", &[SetOption::Ttl(Duration::from_secs(1))])
            .unwrap();
        assert!(cache.has(b"k"));
        clock.advance(Duration::from_secs(2));
        assert!(!cache.has(b"k"));
        assert_eq!(cache.has(b"k"), cache.get(b"k").is_some());
    }

    #[test]
    fn test_empty_value_round_trips() {
        let (cache, _) = cache_with_clock();

        cache
            .set(b"empty", b"", &[SetOption::Ttl(Duration::from_secs(1))])
            .unwrap();
        assert_eq!(cache.get(b"empty"), Some(Vec::new()));
    }

    #[test]
    fn test_malformed_envelope_returned_as_is() {
        let store = MemoryStore::new(Duration::from_secs(3600));
        store.set(b"unknown_tag", b"\x07hello".to_vec()).unwrap();
        store.set(b"truncated", vec![TAG_EXPIRING, 1, 2]).unwrap();
        store.set(b"empty", Vec::new()).unwrap();

        let cache = ExpiringCache::new(store);
        assert_eq!(cache.get(b"unknown_tag"), Some(b"\x07hello".to_vec()));
        assert_eq!(cache.get(b"truncated"), Some(vec![TAG_EXPIRING, 1, 2]));
        assert_eq!(cache.get(b"empty"), Some(Vec::new()));
    }

    #[test]
    fn test_payload_starting_with_tag_bytes_round_trips() {
        let (cache, clock) = cache_with_clock();
        let payload = [TAG_EXPIRING, 0, 0, 0, 0, 0, 0, 0, 0, 42];

        cache.set(b"plain", &payload, &[]).unwrap();
        cache
            .set(b"ttl", &[TAG_PLAIN, 7], &[SetOption::Ttl(Duration::from_secs(10))])
            .unwrap();
        clock.advance(Duration::from_secs(5));

        assert_eq!(cache.get(b"plain"), Some(payload.to_vec()));
        assert_eq!(cache.get(b"ttl"), Some(vec![TAG_PLAIN, 7]));
    }

    #[test]
    fn test_oversized_value_is_rejected() {
        let store = MemoryStore::with_max_entry_size(Duration::from_secs(3600), 16);
        let cache = ExpiringCache::new(store);

        let result = cache.set(b"big", &[0u8; 64], &[]);
        assert!(matches!(
            result,
            Err(CacheError::Store(crate::data::StoreError::EntryTooLarge { .. }))
        ));
        assert!(!cache.has(b"big"));
    }

    #[test]
    fn test_concurrent_access() {
        let cache = Arc::new(ExpiringCache::new(MemoryStore::new(Duration::from_secs(3600))));

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    for i in 0..100 {
                        let key = format!("{}/{}", t, i);
                        cache.set(key.as_bytes(), key.as_bytes(), &[]).unwrap();
                        assert_eq!(cache.get(key.as_bytes()), Some(key.into_bytes()));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
    }

    #[test]
    fn test_wall_clock_expiry() {
        let cache = ExpiringCache::new(MemoryStore::new(Duration::from_secs(3600)));

        cache
            .set(b"k", b"v", &[SetOption::Ttl(Duration::from_millis(100))])
            .unwrap();
        assert_eq!(cache.get(b"k"), Some(b"v".to_vec()));

        std::thread::sleep(Duration::from_millis(300));
        assert_eq!(cache.get(b"k"), None);
    }
}
