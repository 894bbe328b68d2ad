use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use parking_lot::Mutex;
use tracing::trace;
use xxhash_rust::xxh3::Xxh3;

use crate::layout::JustifiedLayout;
use crate::models::{ImageRegistry, LayoutRow};

/// Maximum number of cached layouts to keep in memory.
///
/// Enough to hold one full auto-tune sweep (`2 * range + 1` target heights)
/// for the current width plus a few recent widths.
const MAX_CACHE_ENTRIES: usize = 16;

/// Key for the layout cache.
///
/// Justified rows depend on the exact container width, so widths are not
/// bucketed.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
struct CacheKey {
    container_width: u32,
    target_height: u32,
    list_hash: u64,
}

/// Memoises packer output per (width, target height, image sequence).
///
/// The list hash covers id and natural dimensions of every image in sequence
/// order, so a settled dimension change invalidates earlier entries.
pub struct LayoutCache {
    cache: Mutex<LruCache<CacheKey, Arc<Vec<LayoutRow>>>>,
}

impl LayoutCache {
    pub fn new() -> Self {
        Self::with_capacity(MAX_CACHE_ENTRIES)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Computes a fast hash of the image sequence.
    pub fn compute_list_hash(registry: &ImageRegistry) -> u64 {
        let mut hasher = Xxh3::new();
        for (_, record) in registry.iter() {
            let dims = record.natural();
            hasher.update(record.id.as_str().as_bytes());
            hasher.update(&[0]);
            hasher.update(&dims.width.to_le_bytes());
            hasher.update(&dims.height.to_le_bytes());
        }
        hasher.digest()
    }

    /// Returns cached rows, or packs and stores them on a miss.
    pub fn get_or_compute(
        &self,
        registry: &ImageRegistry,
        container_width: u32,
        target_height: u32,
    ) -> Arc<Vec<LayoutRow>> {
        let key = CacheKey {
            container_width,
            target_height,
            list_hash: Self::compute_list_hash(registry),
        };

        if let Some(rows) = self.cache.lock().get(&key) {
            trace!(container_width, target_height, "Layout cache hit");
            return Arc::clone(rows);
        }

        let layout = JustifiedLayout::new(target_height);
        let rows = Arc::new(layout.compute(registry.iter().map(|(_, r)| r), container_width));
        self.cache.lock().put(key, Arc::clone(&rows));
        rows
    }

    /// Clears the entire cache.
    pub fn clear(&self) {
        self.cache.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.cache.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.lock().is_empty()
    }
}

impl Default for LayoutCache {
    fn default() -> Self {
        Self::new()
    }
}
