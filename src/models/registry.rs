//! Ordered image collection with doubly linked traversal.
//!
//! Records live in an arena (`Vec`) in insertion order; each record keeps the
//! arena index of its neighbours instead of a reference, so traversal in either
//! direction is O(1) per step. The sequence is fixed at construction: nothing
//! is ever removed or reordered. A changed image set means building a new
//! registry.

use std::collections::HashMap;

use tracing::{debug, trace, warn};

use crate::error::{GalleryError, Result};
use crate::models::{Dimensions, ImageEntry, ImageId, ImageRecord, SettleOutcome};

#[derive(Debug, Clone, Default)]
pub struct ImageRegistry {
    records: Vec<ImageRecord>,
    index: HashMap<ImageId, usize>,
    first: Option<usize>,
    last: Option<usize>,
    fallback_edge: u32,
    loaded_count: usize,
    failed_count: usize,
}

impl ImageRegistry {
    /// Builds the map and the linked sequence in the given order.
    ///
    /// Entries already flagged as loaded count as settled immediately.
    pub fn build<I>(entries: I, fallback_edge: u32) -> Result<Self>
    where
        I: IntoIterator<Item = ImageEntry>,
    {
        let mut registry = Self {
            fallback_edge,
            ..Self::default()
        };

        for entry in entries {
            if registry.index.contains_key(&entry.id) {
                return Err(GalleryError::DuplicateImage(entry.id.to_string()));
            }
            let idx = registry.records.len();
            let mut record = ImageRecord::from_entry(entry, fallback_edge);
            record.prev = registry.last;
            if let Some(prev) = registry.last {
                registry.records[prev].next = Some(idx);
            }
            if record.loaded {
                registry.loaded_count += 1;
            }
            registry.first.get_or_insert(idx);
            registry.last = Some(idx);
            registry.index.insert(record.id.clone(), idx);
            registry.records.push(record);
        }

        debug!(
            images = registry.records.len(),
            settled = registry.loaded_count,
            "Built image registry"
        );
        Ok(registry)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn first(&self) -> Option<usize> {
        self.first
    }

    pub fn last(&self) -> Option<usize> {
        self.last
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn get(&self, idx: usize) -> Option<&ImageRecord> {
        self.records.get(idx)
    }

    pub fn get_mut(&mut self, idx: usize) -> Option<&mut ImageRecord> {
        self.records.get_mut(idx)
    }

    pub fn by_id(&self, id: &str) -> Option<&ImageRecord> {
        self.index_of(id).and_then(|idx| self.records.get(idx))
    }

    pub fn prev_of(&self, idx: usize) -> Option<usize> {
        self.records.get(idx).and_then(|r| r.prev)
    }

    pub fn next_of(&self, idx: usize) -> Option<usize> {
        self.records.get(idx).and_then(|r| r.next)
    }

    /// Walks the `next` links from the head.
    pub fn iter(&self) -> Chain<'_> {
        Chain {
            registry: self,
            cursor: self.first,
            forward: true,
        }
    }

    /// Walks the `prev` links from the tail.
    pub fn iter_rev(&self) -> Chain<'_> {
        Chain {
            registry: self,
            cursor: self.last,
            forward: false,
        }
    }

    /// Walks the `prev` links starting just before `idx`.
    pub fn predecessors(&self, idx: usize) -> Chain<'_> {
        Chain {
            registry: self,
            cursor: self.prev_of(idx),
            forward: false,
        }
    }

    pub(crate) fn records_mut(&mut self) -> impl Iterator<Item = &mut ImageRecord> {
        self.records.iter_mut()
    }

    /// Records the natural size of one image once it is known.
    ///
    /// A failed load is settled with the fallback square and counted as failed.
    /// Returns `Ok(false)` when the image had already settled; the call is ignored.
    pub fn record_settled(&mut self, id: &str, outcome: SettleOutcome) -> Result<bool> {
        let idx = self
            .index_of(id)
            .ok_or_else(|| GalleryError::UnknownImage(id.to_string()))?;
        let fallback = self.fallback_edge;
        let record = &mut self.records[idx];
        if record.loaded {
            trace!(%id, "Image already settled, ignoring");
            return Ok(false);
        }

        match outcome {
            SettleOutcome::Loaded(dims) => {
                record.set_dimensions(dims, fallback);
                trace!(%id, width = dims.width, height = dims.height, "Image settled");
            }
            SettleOutcome::Failed => {
                record.set_dimensions(Dimensions::default(), fallback);
                record.failed = true;
                self.failed_count += 1;
                warn!(%id, "Image failed to load, using fallback square");
            }
        }
        record.loaded = true;
        self.loaded_count += 1;
        Ok(true)
    }

    /// True iff every record has settled (loaded or fallback-applied).
    pub fn is_fully_settled(&self) -> bool {
        self.loaded_count == self.records.len()
    }

    /// Images settled with real dimensions.
    pub fn loaded_count(&self) -> usize {
        self.loaded_count - self.failed_count
    }

    pub fn failed_count(&self) -> usize {
        self.failed_count
    }

    pub fn pending_count(&self) -> usize {
        self.records.len() - self.loaded_count
    }

    /// Ids of records still waiting for their natural size, in sequence order.
    pub fn pending(&self) -> Vec<(ImageId, String)> {
        self.iter()
            .filter(|(_, r)| !r.loaded)
            .map(|(_, r)| (r.id.clone(), r.source_path.clone()))
            .collect()
    }
}

/// Iterator over the linked sequence, yielding `(arena index, record)`.
pub struct Chain<'a> {
    registry: &'a ImageRegistry,
    cursor: Option<usize>,
    forward: bool,
}

impl<'a> Iterator for Chain<'a> {
    type Item = (usize, &'a ImageRecord);

    fn next(&mut self) -> Option<Self::Item> {
        let idx = self.cursor?;
        let record = self.registry.records.get(idx)?;
        self.cursor = if self.forward { record.next } else { record.prev };
        Some((idx, record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(ids: &[&str]) -> Vec<ImageEntry> {
        ids.iter()
            .map(|id| ImageEntry::pending(*id, format!("{id}.jpg")))
            .collect()
    }

    #[test]
    fn test_links_follow_insertion_order() {
        let registry = ImageRegistry::build(entries(&["a", "b", "c", "d"]), 90).unwrap();
        let forward: Vec<&str> = registry.iter().map(|(_, r)| r.id.as_str()).collect();
        let backward: Vec<&str> = registry.iter_rev().map(|(_, r)| r.id.as_str()).collect();
        assert_eq!(forward, ["a", "b", "c", "d"]);
        assert_eq!(backward, ["d", "c", "b", "a"]);
    }

    #[test]
    fn test_neighbour_links_are_consistent() {
        let registry = ImageRegistry::build(entries(&["a", "b", "c", "d"]), 90).unwrap();
        assert_eq!(registry.prev_of(registry.first().unwrap()), None);
        assert_eq!(registry.next_of(registry.last().unwrap()), None);
        for (idx, record) in registry.iter() {
            if let Some(next) = record.next_index() {
                assert_eq!(registry.prev_of(next), Some(idx));
            }
            if let Some(prev) = record.prev_index() {
                assert_eq!(registry.next_of(prev), Some(idx));
            }
        }
    }

    #[test]
    fn test_empty_registry() {
        let registry = ImageRegistry::build(Vec::new(), 90).unwrap();
        assert!(registry.is_empty());
        assert_eq!(registry.first(), None);
        assert_eq!(registry.last(), None);
        assert!(registry.is_fully_settled());
        assert_eq!(registry.iter().count(), 0);
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let err = ImageRegistry::build(entries(&["a", "b", "a"]), 90).unwrap_err();
        assert!(matches!(err, GalleryError::DuplicateImage(id) if id == "a"));
    }

    #[test]
    fn test_settling_tracks_counts() {
        let mut list = entries(&["a", "b", "c"]);
        list[0] = ImageEntry::loaded("a", "a.jpg", 300, 200);
        let mut registry = ImageRegistry::build(list, 90).unwrap();
        assert!(!registry.is_fully_settled());
        assert_eq!(registry.pending_count(), 2);

        assert!(registry
            .record_settled("b", SettleOutcome::Loaded(Dimensions::new(100, 200)))
            .unwrap());
        assert!(registry.record_settled("c", SettleOutcome::Failed).unwrap());

        assert!(registry.is_fully_settled());
        assert_eq!(registry.loaded_count(), 2);
        assert_eq!(registry.failed_count(), 1);

        let failed = registry.by_id("c").unwrap();
        assert!(failed.loaded && failed.failed);
        assert_eq!(failed.natural(), Dimensions::square(90));
        assert!((registry.by_id("b").unwrap().aspect_ratio() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_second_settle_is_ignored() {
        let mut registry = ImageRegistry::build(entries(&["a"]), 90).unwrap();
        let dims = SettleOutcome::Loaded(Dimensions::new(10, 20));
        assert!(registry.record_settled("a", dims).unwrap());
        assert!(!registry.record_settled("a", SettleOutcome::Failed).unwrap());
        assert_eq!(registry.failed_count(), 0);
        assert_eq!(registry.by_id("a").unwrap().natural(), Dimensions::new(10, 20));
    }

    #[test]
    fn test_settle_unknown_id() {
        let mut registry = ImageRegistry::build(entries(&["a"]), 90).unwrap();
        let err = registry
            .record_settled("zzz", SettleOutcome::Failed)
            .unwrap_err();
        assert!(matches!(err, GalleryError::UnknownImage(_)));
    }

    #[test]
    fn test_predecessors_walk_backwards() {
        let registry = ImageRegistry::build(entries(&["a", "b", "c"]), 90).unwrap();
        let c = registry.index_of("c").unwrap();
        let ids: Vec<&str> = registry.predecessors(c).map(|(_, r)| r.id.as_str()).collect();
        assert_eq!(ids, ["b", "a"]);
    }
}
