//! Seeded synthetic hit sources.
//!
//! The generator plays the role of the particle-transport stage: it fills
//! every entry of a source with time-of-flight hits drawn from a seeded RNG,
//! so the same seed always yields the same sample.

use crate::error::SimError;
use pileup_env::{EnvError, HitKind, HitStore, SledHitStore};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal, Poisson};
use serde::{Deserialize, Serialize};

/// Number of readout channels of the simulated detector.
pub const NUM_CHANNELS: u32 = 157_248;

/// A simulated time-of-flight hit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TofHit {
    /// Readout channel hit
    pub channel: u32,

    /// Time of flight relative to the collision (ns)
    pub time_ns: f64,

    /// Deposited energy (MeV)
    pub energy_mev: f64,

    /// Track number inside the event
    pub track_id: i32,
}

/// Parameters of a synthetic hit sample.
#[derive(Debug, Clone)]
pub struct SampleConfig {
    /// Number of entries (events)
    pub entries: u32,

    /// Mean number of hits per entry
    pub mean_hits: f64,

    /// Mean time of flight (ns)
    pub mean_tof_ns: f64,

    /// Spread of the time of flight (ns)
    pub tof_sigma_ns: f64,
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            entries: 50,
            mean_hits: 8.0,
            mean_tof_ns: 12.0,
            tof_sigma_ns: 2.0,
        }
    }
}

/// In-memory hit source holding one collection kind.
#[derive(Debug, Clone)]
pub struct SimHitStore {
    location: String,
    kind: Option<HitKind>,
    entries: Vec<Vec<TofHit>>,
}

impl SimHitStore {
    /// Creates a store from explicit entries.
    pub fn from_entries(location: &str, kind: HitKind, entries: Vec<Vec<TofHit>>) -> Self {
        Self {
            location: location.to_string(),
            kind: Some(kind),
            entries,
        }
    }

    /// Generates a sample deterministically from `seed`.
    pub fn generate(
        location: &str,
        kind: HitKind,
        seed: u64,
        config: &SampleConfig,
    ) -> Result<Self, SimError> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let multiplicity = if config.mean_hits > 0.0 {
            Some(Poisson::new(config.mean_hits).map_err(SimError::distribution)?)
        } else {
            None
        };
        let tof = Normal::new(config.mean_tof_ns, config.tof_sigma_ns).map_err(SimError::distribution)?;

        let entries = (0..config.entries)
            .map(|_| {
                let n = multiplicity
                    .as_ref()
                    .map(|p| p.sample(&mut rng) as usize)
                    .unwrap_or(0);
                (0..n)
                    .map(|i| TofHit {
                        channel: rng.gen_range(0..NUM_CHANNELS),
                        time_ns: tof.sample(&mut rng).max(0.0),
                        energy_mev: rng.gen_range(0.1..3.0),
                        track_id: i as i32,
                    })
                    .collect()
            })
            .collect();

        Ok(Self::from_entries(location, kind, entries))
    }

    /// Drops the hit collection, modelling a source file without the branch.
    pub fn without_kind(mut self) -> Self {
        self.kind = None;
        self
    }

    /// Hits of one entry.
    pub fn entry(&self, entry: u32) -> Option<&[TofHit]> {
        self.entries.get(entry as usize).map(Vec::as_slice)
    }

    /// Copies every entry into a persistent store.
    pub fn write_to(&self, store: &SledHitStore<TofHit>) -> Result<(), EnvError> {
        let Some(kind) = &self.kind else {
            return Ok(());
        };
        for (entry, hits) in self.entries.iter().enumerate() {
            store.write_entry(kind, entry as u32, hits)?;
        }
        store.flush()
    }
}

impl HitStore for SimHitStore {
    type Hit = TofHit;

    fn location(&self) -> &str {
        &self.location
    }

    fn entries(&self) -> usize {
        self.entries.len()
    }

    fn has_kind(&self, kind: &HitKind) -> bool {
        self.kind.as_ref() == Some(kind)
    }

    fn read_entry(&self, kind: &HitKind, entry: u32, hits: &mut Vec<TofHit>) -> Result<(), EnvError> {
        if !self.has_kind(kind) {
            return Err(EnvError::branch_missing(kind, &self.location));
        }
        let found = self
            .entry(entry)
            .ok_or_else(|| EnvError::entry_missing(entry, &self.location))?;
        hits.extend_from_slice(found);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn kind() -> HitKind {
        HitKind::new("TOFHit")
    }

    #[test]
    fn test_generation_is_deterministic() {
        let config = SampleConfig::default();
        let a = SimHitStore::generate("a", kind(), 42, &config).unwrap();
        let b = SimHitStore::generate("b", kind(), 42, &config).unwrap();
        let c = SimHitStore::generate("c", kind(), 43, &config).unwrap();

        assert_eq!(a.entries, b.entries);
        assert_ne!(a.entries, c.entries);
        assert_eq!(a.entries(), 50);
    }

    #[test]
    fn test_generated_hits_are_physical() {
        let store = SimHitStore::generate("a", kind(), 7, &SampleConfig::default()).unwrap();
        for hits in &store.entries {
            for hit in hits {
                assert!(hit.channel < NUM_CHANNELS);
                assert!(hit.time_ns >= 0.0);
                assert!(hit.energy_mev >= 0.1 && hit.energy_mev < 3.0);
            }
        }
    }

    #[test]
    fn test_zero_multiplicity() {
        let config = SampleConfig {
            mean_hits: 0.0,
            ..Default::default()
        };
        let store = SimHitStore::generate("a", kind(), 1, &config).unwrap();
        assert!(store.entries.iter().all(Vec::is_empty));
    }

    #[test]
    fn test_without_kind_misses() {
        let store = SimHitStore::generate("sig", kind(), 1, &SampleConfig::default())
            .unwrap()
            .without_kind();
        let mut hits = Vec::new();
        let err = store.read_entry(&kind(), 0, &mut hits).unwrap_err();
        assert!(err.is_miss());
    }

    #[test]
    fn test_write_to_sled_round_trip() {
        let sim = SimHitStore::generate("bkg", kind(), 9, &SampleConfig {
            entries: 3,
            ..Default::default()
        })
        .unwrap();
        let sled = SledHitStore::<TofHit>::temporary().unwrap();
        sim.write_to(&sled).unwrap();

        assert_eq!(sled.entries(), 3);
        let mut hits = Vec::new();
        sled.read_entry(&kind(), 2, &mut hits).unwrap();
        let expected = sim.entry(2).unwrap();
        assert_eq!(hits.len(), expected.len());
        for (got, want) in hits.iter().zip(expected) {
            assert_eq!(got.channel, want.channel);
            assert_eq!(got.track_id, want.track_id);
            assert_relative_eq!(got.time_ns, want.time_ns, max_relative = 1e-12);
            assert_relative_eq!(got.energy_mev, want.energy_mev, max_relative = 1e-12);
        }
    }
}
