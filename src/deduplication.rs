use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;
use tracing::{debug, info};

/// Characters of message text that go into a fingerprint.
pub const FINGERPRINT_PREFIX_CHARS: usize = 100;

pub const DEFAULT_MAX_FINGERPRINTS: usize = 1000;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    source: String,
    message_id: i64,
    prefix: String,
}

impl Fingerprint {
    pub fn new(source: &str, message_id: i64, text: &str) -> Self {
        Self {
            source: source.to_string(),
            message_id,
            prefix: text.chars().take(FINGERPRINT_PREFIX_CHARS).collect(),
        }
    }
}

/// Insertion-ordered fingerprint set. Once over `max_size` it keeps only the
/// newest half; lookups do not refresh an entry.
#[derive(Debug)]
pub struct DedupCache {
    seen: HashSet<Fingerprint>,
    order: VecDeque<Fingerprint>,
    max_size: usize,
}

impl DedupCache {
    pub fn new(max_size: usize) -> Self {
        Self {
            seen: HashSet::with_capacity(max_size + 1),
            order: VecDeque::with_capacity(max_size + 1),
            max_size: max_size.max(2),
        }
    }

    /// Records the fingerprint; returns false when it was already present.
    pub fn insert(&mut self, fingerprint: Fingerprint) -> bool {
        if self.seen.contains(&fingerprint) {
            return false;
        }
        self.seen.insert(fingerprint.clone());
        self.order.push_back(fingerprint);

        if self.order.len() > self.max_size {
            let keep = self.max_size / 2;
            let evict = self.order.len() - keep;
            for old in self.order.drain(..evict) {
                self.seen.remove(&old);
            }
            debug!("[Dedup] evicted {} fingerprints, kept {}", evict, keep);
        }
        true
    }

    pub fn contains(&self, fingerprint: &Fingerprint) -> bool {
        self.seen.contains(fingerprint)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl Default for DedupCache {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FINGERPRINTS)
    }
}

/// Upper-cased tickers that never produce a signal. Fixed after startup.
#[derive(Debug, Clone, Default)]
pub struct Blacklist {
    enabled: bool,
    tickers: HashSet<String>,
}

impl Blacklist {
    pub fn new<I, S>(enabled: bool, tickers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            enabled,
            tickers: tickers.into_iter().map(|t| t.as_ref().trim().to_uppercase()).collect(),
        }
    }

    pub fn contains(&self, ticker: &str) -> bool {
        self.enabled && self.tickers.contains(&ticker.to_uppercase())
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn len(&self) -> usize {
        self.tickers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickers.is_empty()
    }

    pub fn sorted(&self) -> Vec<&str> {
        let mut tickers: Vec<&str> = self.tickers.iter().map(String::as_str).collect();
        tickers.sort_unstable();
        tickers
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Accept,
    Duplicate,
    Blacklisted,
}

/// Dedup cache and blacklist behind one gate. The cache sits under a mutex
/// so check-then-insert is atomic for concurrent callers.
#[derive(Debug)]
pub struct SignalFilter {
    cache: Mutex<DedupCache>,
    blacklist: Blacklist,
}

impl SignalFilter {
    pub fn new(max_fingerprints: usize, blacklist: Blacklist) -> Self {
        Self {
            cache: Mutex::new(DedupCache::new(max_fingerprints)),
            blacklist,
        }
    }

    /// Records the fingerprint if new. Returns `Decision::Duplicate` when it
    /// had been seen before, `Decision::Accept` otherwise.
    pub fn record(&self, fingerprint: Fingerprint) -> Decision {
        let mut cache = self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if cache.insert(fingerprint) {
            Decision::Accept
        } else {
            Decision::Duplicate
        }
    }

    pub fn check_ticker(&self, ticker: &str) -> Decision {
        if self.blacklist.contains(ticker) {
            info!("[Filter] ticker {} is blacklisted, ignoring", ticker);
            Decision::Blacklisted
        } else {
            Decision::Accept
        }
    }

    /// Full gate for one extracted message. The fingerprint is recorded even
    /// when the ticker is then rejected.
    pub fn admit(&self, source: &str, message_id: i64, text_prefix: &str, ticker: &str) -> Decision {
        match self.record(Fingerprint::new(source, message_id, text_prefix)) {
            Decision::Accept => self.check_ticker(ticker),
            other => other,
        }
    }

    pub fn cached_fingerprints(&self) -> usize {
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).len()
    }

    pub fn blacklist(&self) -> &Blacklist {
        &self.blacklist
    }
}
