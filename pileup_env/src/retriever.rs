//! Hit retrieval abstraction.

use crate::error::EnvError;
use crate::types::{EventPart, HitKind};

/// One backing store of simulated hits (one source sample).
///
/// # Implementations
///
/// - **Production**: `SledHitStore` - persistent, JSON-encoded entries
/// - **Simulation**: `SimHitStore` - seeded in-memory entries
pub trait HitStore {
    /// Detector-specific hit record
    type Hit;

    /// Where the store was opened from (for logging).
    fn location(&self) -> &str;

    /// Number of entries (events) in the store.
    fn entries(&self) -> usize;

    /// Returns true if the store carries hit collections of this kind.
    fn has_kind(&self, kind: &HitKind) -> bool;

    /// Appends the hits of `entry` to `hits`.
    ///
    /// # Returns
    /// * `Ok(())` - Hits appended (possibly none)
    /// * `Err(EnvError::BranchMissing)` - No collection of this kind
    /// * `Err(EnvError::EntryMissing)` - No such entry
    fn read_entry(
        &self,
        kind: &HitKind,
        entry: u32,
        hits: &mut Vec<Self::Hit>,
    ) -> Result<(), EnvError>;
}

/// Resolves an event part to its hit collection.
///
/// Queried once per event part; implementations must not serve hits of one
/// part for another.
pub trait HitRetriever {
    type Hit;

    /// Appends the hits of `part` to `hits`.
    ///
    /// Errors for which [`EnvError::is_miss`] holds are non-fatal for callers.
    fn get_hits(
        &self,
        part: EventPart,
        kind: &HitKind,
        hits: &mut Vec<Self::Hit>,
    ) -> Result<(), EnvError>;

    /// Number of configured sources.
    fn source_count(&self) -> usize;
}

/// Ordered list of hit stores; `source_id` indexes it in insertion order.
#[derive(Debug)]
pub struct SourceChain<S> {
    sources: Vec<S>,
}

impl<S> Default for SourceChain<S> {
    fn default() -> Self {
        Self { sources: Vec::new() }
    }
}

impl<S: HitStore> SourceChain<S> {
    /// Creates an empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a source and returns its source id.
    pub fn add(&mut self, store: S) -> u32 {
        self.sources.push(store);
        (self.sources.len() - 1) as u32
    }

    /// Returns the store for `source_id`.
    pub fn get(&self, source_id: u32) -> Option<&S> {
        self.sources.get(source_id as usize)
    }

    /// Iterates the stores in source-id order.
    pub fn iter(&self) -> impl Iterator<Item = &S> {
        self.sources.iter()
    }
}

impl<S: HitStore> HitRetriever for SourceChain<S> {
    type Hit = S::Hit;

    fn get_hits(
        &self,
        part: EventPart,
        kind: &HitKind,
        hits: &mut Vec<Self::Hit>,
    ) -> Result<(), EnvError> {
        let store = self
            .get(part.source_id)
            .ok_or(EnvError::SourceMissing(part.source_id))?;
        store.read_entry(kind, part.entry_id, hits)
    }

    fn source_count(&self) -> usize {
        self.sources.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MapStore {
        name: String,
        kind: HitKind,
        entries: HashMap<u32, Vec<u8>>,
    }

    impl HitStore for MapStore {
        type Hit = u8;

        fn location(&self) -> &str {
            &self.name
        }

        fn entries(&self) -> usize {
            self.entries.len()
        }

        fn has_kind(&self, kind: &HitKind) -> bool {
            *kind == self.kind
        }

        fn read_entry(&self, kind: &HitKind, entry: u32, hits: &mut Vec<u8>) -> Result<(), EnvError> {
            if !self.has_kind(kind) {
                return Err(EnvError::branch_missing(kind, &self.name));
            }
            let found = self
                .entries
                .get(&entry)
                .ok_or_else(|| EnvError::entry_missing(entry, &self.name))?;
            hits.extend_from_slice(found);
            Ok(())
        }
    }

    fn store(name: &str, entries: &[(u32, &[u8])]) -> MapStore {
        MapStore {
            name: name.to_string(),
            kind: HitKind::new("TOFHit"),
            entries: entries.iter().map(|(k, v)| (*k, v.to_vec())).collect(),
        }
    }

    #[test]
    fn test_source_ids_follow_insertion_order() {
        let mut chain = SourceChain::new();
        assert_eq!(chain.add(store("bkg", &[(5, &[1, 2])])), 0);
        assert_eq!(chain.add(store("sig", &[(5, &[9])])), 1);

        let kind = HitKind::new("TOFHit");
        let mut hits = Vec::new();
        chain.get_hits(EventPart::new(1, 5), &kind, &mut hits).unwrap();
        assert_eq!(hits, vec![9]);
        assert_eq!(chain.source_count(), 2);
    }

    #[test]
    fn test_unknown_source_is_miss() {
        let mut chain = SourceChain::new();
        chain.add(store("bkg", &[(0, &[1])]));

        let mut hits = Vec::new();
        let err = chain
            .get_hits(EventPart::new(1, 0), &HitKind::new("TOFHit"), &mut hits)
            .unwrap_err();
        assert!(matches!(err, EnvError::SourceMissing(1)));
        assert!(err.is_miss());
        assert!(hits.is_empty());
    }

    #[test]
    fn test_missing_kind_and_entry_are_misses() {
        let mut chain = SourceChain::new();
        chain.add(store("bkg", &[(0, &[1])]));
        let mut hits = Vec::new();

        let err = chain
            .get_hits(EventPart::new(0, 0), &HitKind::new("TRDHit"), &mut hits)
            .unwrap_err();
        assert!(err.is_miss());

        let err = chain
            .get_hits(EventPart::new(0, 4), &HitKind::new("TOFHit"), &mut hits)
            .unwrap_err();
        assert!(matches!(err, EnvError::EntryMissing { entry: 4, .. }));
    }
}
