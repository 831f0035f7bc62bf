use std::collections::{BTreeMap, HashMap};

use parking_lot::Mutex;
use tracing::trace;

use crate::{ImageCommandEntry, ImageError, ImageReference};

/// Capacity used when none is configured.
pub const DEFAULT_CACHE_CAPACITY: usize = 100;

/// Bounded least-recently-used cache of resolved image commands.
///
/// Shared by every compilation in the process (wrap it in an `Arc`), so repeated steps
/// referencing the same image cost a single registry round trip.
///
/// Rules:
/// - `get` and `add` both count as a use;
/// - inserting past capacity evicts the least recently used reference;
/// - entries are never replaced: adding a known reference only refreshes its recency.
#[derive(Debug)]
pub struct ImageCommandCache {
    capacity: usize,
    inner: Mutex<Lru>,
}

#[derive(Debug, Default)]
struct Lru {
    /// Monotonic use counter.
    clock: u64,
    entries: HashMap<ImageReference, (ImageCommandEntry, u64)>,
    /// Last use → reference; the first key is the eviction candidate.
    recency: BTreeMap<u64, ImageReference>,
}

impl Lru {
    fn touch(&mut self, reference: &ImageReference) -> Option<&ImageCommandEntry> {
        self.clock += 1;
        let now = self.clock;
        let (entry, last_used) = self.entries.get_mut(reference)?;
        let previous = *last_used;
        self.recency.remove(&previous);
        self.recency.insert(now, reference.clone());
        *last_used = now;
        Some(entry)
    }
}

impl ImageCommandCache {
    /// Create an empty cache holding at most `capacity` references.
    ///
    /// # Examples
    /// ```
    /// use stepci_image::{ImageCommand, ImageCommandCache, ImageCommandEntry, Platform};
    ///
    /// let cache = ImageCommandCache::new(1).unwrap();
    /// let entry = ImageCommandEntry::single(&Platform::default(), ImageCommand::from_config(vec![], vec!["sh".into()]));
    /// cache.add("alpine".parse().unwrap(), entry.clone());
    /// cache.add("busybox".parse().unwrap(), entry);
    ///
    /// assert_eq!(cache.len(), 1);
    /// assert!(cache.get(&"docker.io/library/alpine:latest".parse().unwrap()).is_none());
    /// assert!(ImageCommandCache::new(0).is_err());
    /// ```
    pub fn new(capacity: usize) -> Result<Self, ImageError> {
        if capacity == 0 {
            return Err(ImageError::ZeroCapacity);
        }
        Ok(Self {
            capacity,
            inner: Mutex::new(Lru::default()),
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Look up a reference, marking it as most recently used on hit.
    pub fn get(&self, reference: &ImageReference) -> Option<ImageCommandEntry> {
        self.inner.lock().touch(reference).cloned()
    }

    /// Insert a resolved entry, evicting the least recently used reference when full.
    pub fn add(&self, reference: ImageReference, entry: ImageCommandEntry) {
        let mut lru = self.inner.lock();
        if lru.touch(&reference).is_some() {
            return;
        }

        let now = lru.clock;
        lru.recency.insert(now, reference.clone());
        lru.entries.insert(reference, (entry, now));

        while lru.entries.len() > self.capacity {
            let Some((_, evicted)) = lru.recency.pop_first() else {
                break;
            };
            trace!(image = %evicted, "evicting image command");
            lru.entries.remove(&evicted);
        }
    }
}

impl Default for ImageCommandCache {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CACHE_CAPACITY,
            inner: Mutex::new(Lru::default()),
        }
    }
}
