//! In-memory cache for rendered pages: TTL freshness plus a byte-budget
//! LRU. One mutex covers the recency map and the size counter; every
//! operation is short and never performs I/O under the lock.

use std::fmt;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use bytes::Bytes;
use lru::LruCache;

/// Outcome of a cache lookup, surfaced to clients in `X-Cooked-Cache`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Hit,
    Miss,
    Revalidated,
    Expired,
    Stale,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Hit => "hit",
            Status::Miss => "miss",
            Status::Revalidated => "revalidated",
            Status::Expired => "expired",
            Status::Stale => "stale",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A cached rendered page. `html` is the complete response body; cloning
/// an entry is cheap because `Bytes` is reference-counted.
#[derive(Debug, Clone)]
pub struct Entry {
    pub html: Bytes,
    pub etag: Option<String>,
    pub last_modified: Option<String>,
    pub size: u64,
    pub content_type: String,
    pub expires_at: Instant,
}

type Clock = Box<dyn Fn() -> Instant + Send + Sync>;

/// Thread-safe TTL + LRU cache keyed by full upstream URL (query included,
/// so presigned URLs cache as distinct documents).
pub struct Cache {
    inner: Mutex<Inner>,
    ttl: Duration,
    max_size: u64,
    now: Clock,
}

struct Inner {
    map: LruCache<String, Entry>,
    cur_size: u64,
}

impl Cache {
    pub fn new(ttl: Duration, max_size: u64) -> Self {
        Self::with_clock(ttl, max_size, Box::new(Instant::now))
    }

    /// Constructor with an injectable clock so TTL tests are deterministic.
    pub fn with_clock(ttl: Duration, max_size: u64, now: Clock) -> Self {
        Self {
            inner: Mutex::new(Inner {
                map: LruCache::unbounded(),
                cur_size: 0,
            }),
            ttl,
            max_size,
            now,
        }
    }

    /// Looks up an entry. Expired entries are returned alongside the
    /// `Expired` status so the revalidation machine can reuse their
    /// validators; fresh entries are promoted to most-recently-used.
    pub fn get(&self, key: &str) -> (Option<Entry>, Status) {
        let now = (self.now)();
        let mut inner = self.inner.lock().unwrap();

        let (entry, expired) = match inner.map.peek(key) {
            None => return (None, Status::Miss),
            Some(e) => (e.clone(), now > e.expires_at),
        };

        if expired {
            return (Some(entry), Status::Expired);
        }

        inner.map.promote(key);
        (Some(entry), Status::Hit)
    }

    /// Stores an entry, stamping its expiry at now+TTL, then evicts from
    /// the LRU end until the byte budget holds.
    pub fn put(&self, key: &str, mut entry: Entry) {
        entry.expires_at = (self.now)() + self.ttl;
        let size = entry.size;

        let mut inner = self.inner.lock().unwrap();
        if let Some(old) = inner.map.put(key.to_string(), entry) {
            inner.cur_size -= old.size;
        }
        inner.cur_size += size;

        while inner.cur_size > self.max_size {
            match inner.map.pop_lru() {
                Some((_, victim)) => inner.cur_size -= victim.size,
                None => break,
            }
        }
    }

    /// Resets the TTL of an existing entry after a 304 revalidation and
    /// promotes it, without touching the byte accounting.
    pub fn refresh_ttl(&self, key: &str) {
        let expires_at = (self.now)() + self.ttl;
        let mut inner = self.inner.lock().unwrap();
        if let Some(entry) = inner.map.get_mut(key) {
            entry.expires_at = expires_at;
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn size(&self) -> u64 {
        self.inner.lock().unwrap().cur_size
    }
}
