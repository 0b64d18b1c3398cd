/// In-process TTL response cache
///
/// A process-wide key/value store used to absorb repeated reads on public
/// GET endpoints. Entries are keyed by `METHOD:uri`, carry an absolute
/// expiry, and are bounded at [`MAX_ENTRIES`] by evicting the globally
/// oldest-inserted entry. A background sweep purges expired entries on a
/// fixed interval.
///
/// The cache is an optimization, never a correctness dependency: a miss
/// (or a wiped cache) only means the response is recomputed from the
/// database. It is constructed once at startup and handed to handlers by
/// reference, so tests can run against a fresh instance.
///
/// # Example
///
/// ```
/// use atelier_shared::cache::{CachedResponse, ResponseCache};
/// use std::time::Duration;
///
/// let cache = ResponseCache::new();
/// let value = CachedResponse::json(br#"{"items":[]}"#.to_vec());
/// cache.set("GET:/v1/services", value, Duration::from_secs(300));
/// assert!(cache.get("GET:/v1/services").is_some());
/// ```
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Maximum number of cached responses held at once.
pub const MAX_ENTRIES: usize = 1000;

/// Interval between background sweeps of expired entries.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// A cached HTTP response body with its content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedResponse {
    /// Value for the Content-Type header when replaying the response
    pub content_type: String,

    /// Raw response body bytes
    pub body: Vec<u8>,
}

impl CachedResponse {
    /// Convenience constructor for JSON bodies.
    pub fn json(body: Vec<u8>) -> Self {
        Self {
            content_type: "application/json".to_string(),
            body,
        }
    }

    /// Constructor for arbitrary content types (sitemap XML, robots.txt).
    pub fn new(content_type: impl Into<String>, body: Vec<u8>) -> Self {
        Self {
            content_type: content_type.into(),
            body,
        }
    }
}

#[derive(Debug, Clone)]
struct Entry {
    value: CachedResponse,
    expires_at: Instant,
    created_at: Instant,
}

/// Process-local TTL cache for public GET responses.
///
/// The map is the only shared mutable state in the process besides the
/// rate limiter; every access is a single locked read or write of one key,
/// so a plain mutex is sufficient under concurrent request handling.
#[derive(Debug)]
pub struct ResponseCache {
    entries: Mutex<HashMap<String, Entry>>,
    max_entries: usize,
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseCache {
    /// Creates a cache bounded at [`MAX_ENTRIES`].
    pub fn new() -> Self {
        Self::with_capacity(MAX_ENTRIES)
    }

    /// Creates a cache with an explicit entry budget (used by tests).
    pub fn with_capacity(max_entries: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            max_entries,
        }
    }

    /// Returns the cached value if present and unexpired.
    ///
    /// Expired entries are deleted lazily on lookup and reported as a miss.
    pub fn get(&self, key: &str) -> Option<CachedResponse> {
        let mut entries = self.entries.lock().expect("cache mutex poisoned");
        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Stores a value with an absolute expiry of `now + ttl`.
    ///
    /// When the store is full and `key` is new, the globally
    /// oldest-inserted entry is evicted to make room.
    pub fn set(&self, key: impl Into<String>, value: CachedResponse, ttl: Duration) {
        let key = key.into();
        let now = Instant::now();
        let mut entries = self.entries.lock().expect("cache mutex poisoned");

        if entries.len() >= self.max_entries && !entries.contains_key(&key) {
            if let Some(oldest) = entries
                .iter()
                .min_by_key(|(_, e)| e.created_at)
                .map(|(k, _)| k.clone())
            {
                entries.remove(&oldest);
            }
        }

        entries.insert(
            key,
            Entry {
                value,
                expires_at: now + ttl,
                created_at: now,
            },
        );
    }

    /// Removes entries.
    ///
    /// With no pattern the whole cache is wiped; with a pattern, every key
    /// containing it as a substring is removed. Mutating endpoints use the
    /// pattern form to invalidate the affected list/detail responses.
    pub fn clear(&self, pattern: Option<&str>) {
        let mut entries = self.entries.lock().expect("cache mutex poisoned");
        match pattern {
            None => entries.clear(),
            Some(pattern) => entries.retain(|key, _| !key.contains(pattern)),
        }
    }

    /// Purges expired entries and, if the store is still oversized, evicts
    /// oldest-inserted entries until within budget.
    pub fn sweep(&self) {
        let now = Instant::now();
        let mut entries = self.entries.lock().expect("cache mutex poisoned");
        entries.retain(|_, e| e.expires_at > now);

        while entries.len() > self.max_entries {
            let oldest = entries
                .iter()
                .min_by_key(|(_, e)| e.created_at)
                .map(|(k, _)| k.clone());
            match oldest {
                Some(key) => {
                    entries.remove(&key);
                }
                None => break,
            }
        }
    }

    /// Current number of entries (expired-but-unswept included).
    pub fn len(&self) -> usize {
        self.entries.lock().expect("cache mutex poisoned").len()
    }

    /// True when the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Spawns the periodic sweep task for a shared cache instance.
///
/// The task runs for the lifetime of the process; the returned handle is
/// only used by tests that want to abort it.
pub fn spawn_sweeper(cache: Arc<ResponseCache>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SWEEP_INTERVAL);
        // The first tick fires immediately; skip it so startup stays quiet.
        interval.tick().await;
        loop {
            interval.tick().await;
            cache.sweep();
            tracing::debug!(entries = cache.len(), "response cache sweep complete");
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(s: &str) -> CachedResponse {
        CachedResponse::json(s.as_bytes().to_vec())
    }

    #[test]
    fn test_get_miss_on_absent_key() {
        let cache = ResponseCache::new();
        assert!(cache.get("GET:/v1/services").is_none());
    }

    #[test]
    fn test_set_then_get_returns_identical_value() {
        let cache = ResponseCache::new();
        cache.set("GET:/v1/services", body("a"), Duration::from_secs(60));
        assert_eq!(cache.get("GET:/v1/services"), Some(body("a")));
    }

    #[test]
    fn test_expired_entry_is_a_miss_and_lazily_deleted() {
        let cache = ResponseCache::new();
        cache.set("GET:/v1/services", body("a"), Duration::ZERO);
        assert!(cache.get("GET:/v1/services").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_full_cache_evicts_oldest_inserted() {
        let cache = ResponseCache::with_capacity(2);
        cache.set("k1", body("1"), Duration::from_secs(60));
        std::thread::sleep(Duration::from_millis(2));
        cache.set("k2", body("2"), Duration::from_secs(60));
        std::thread::sleep(Duration::from_millis(2));
        cache.set("k3", body("3"), Duration::from_secs(60));

        assert!(cache.get("k1").is_none());
        assert!(cache.get("k2").is_some());
        assert!(cache.get("k3").is_some());
    }

    #[test]
    fn test_overwriting_existing_key_does_not_evict() {
        let cache = ResponseCache::with_capacity(2);
        cache.set("k1", body("1"), Duration::from_secs(60));
        cache.set("k2", body("2"), Duration::from_secs(60));
        cache.set("k1", body("1b"), Duration::from_secs(60));

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("k1"), Some(body("1b")));
    }

    #[test]
    fn test_clear_without_pattern_wipes_everything() {
        let cache = ResponseCache::new();
        cache.set("GET:/v1/services", body("a"), Duration::from_secs(60));
        cache.set("GET:/v1/blog", body("b"), Duration::from_secs(60));
        cache.clear(None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_clear_with_pattern_deletes_matching_substring_keys() {
        let cache = ResponseCache::new();
        cache.set("GET:/v1/services?page=1", body("a"), Duration::from_secs(60));
        cache.set("GET:/v1/services/abc", body("b"), Duration::from_secs(60));
        cache.set("GET:/v1/blog", body("c"), Duration::from_secs(60));

        cache.clear(Some("GET:/v1/services"));

        assert!(cache.get("GET:/v1/services?page=1").is_none());
        assert!(cache.get("GET:/v1/services/abc").is_none());
        assert!(cache.get("GET:/v1/blog").is_some());
    }

    #[test]
    fn test_sweep_purges_expired_and_enforces_budget() {
        let cache = ResponseCache::with_capacity(2);
        cache.set("expired", body("x"), Duration::ZERO);
        cache.sweep();
        assert!(cache.is_empty());
    }
}
