//! Seeded run-context generator.
//!
//! Draws collision times with exponential spacing snapped to the bunch
//! crossing grid, a Poisson number of background events per collision and a
//! signal event overlaid on every n-th collision.

use crate::error::SimError;
use pileup_env::{EventPart, RunContext};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Exp, Poisson};

/// Bunch crossing period (ns).
pub const BC_NS: f64 = 25.0;

/// Source id of the background sample.
pub const BACKGROUND_SOURCE: u32 = 0;

/// Source id of the signal sample.
pub const SIGNAL_SOURCE: u32 = 1;

/// Parameters of the generated timeframe.
#[derive(Debug, Clone)]
pub struct CollisionConfig {
    /// Number of collisions
    pub collisions: usize,

    /// Mean collision rate (Hz)
    pub interaction_rate_hz: f64,

    /// Mean number of extra background events per collision
    pub mu: f64,

    /// Entries available in the background source
    pub background_entries: u32,

    /// Entries available in the signal source (0 = no signal overlay)
    pub signal_entries: u32,

    /// Overlay signal on every n-th collision
    pub signal_every: usize,
}

impl Default for CollisionConfig {
    fn default() -> Self {
        Self {
            collisions: 20,
            interaction_rate_hz: 50_000.0,
            mu: 0.5,
            background_entries: 50,
            signal_entries: 10,
            signal_every: 3,
        }
    }
}

/// Builds run contexts deterministically from a seed.
pub struct CollisionGenerator {
    rng: ChaCha8Rng,
    config: CollisionConfig,
}

impl CollisionGenerator {
    pub fn new(seed: u64, config: CollisionConfig) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            config,
        }
    }

    /// Generates one run context.
    ///
    /// Background entries are consumed sequentially and wrap around; every
    /// collision has at least one background event.
    pub fn generate(&mut self) -> Result<RunContext, SimError> {
        let cfg = &self.config;
        if cfg.background_entries == 0 {
            return Err(SimError::distribution("background sample has no entries"));
        }
        let spacing = Exp::new(cfg.interaction_rate_hz * 1e-9).map_err(SimError::distribution)?;
        let pileup = if cfg.mu > 0.0 {
            Some(Poisson::new(cfg.mu).map_err(SimError::distribution)?)
        } else {
            None
        };

        let mut context = RunContext::empty();
        let mut time_ns = 0.0;
        let mut next_background = 0u32;
        let mut next_signal = 0u32;

        for coll_id in 0..cfg.collisions {
            // snap to the next bunch crossing strictly after the previous one
            let dt: f64 = spacing.sample(&mut self.rng);
            time_ns += ((dt / BC_NS).floor() + 1.0) * BC_NS;

            let extra = pileup
                .as_ref()
                .map(|p| p.sample(&mut self.rng) as usize)
                .unwrap_or(0);
            let mut parts = Vec::with_capacity(extra + 2);
            for _ in 0..=extra {
                parts.push(EventPart::new(BACKGROUND_SOURCE, next_background));
                next_background = (next_background + 1) % cfg.background_entries;
            }

            if cfg.signal_entries > 0 && cfg.signal_every > 0 && coll_id % cfg.signal_every == 0 {
                parts.push(EventPart::new(SIGNAL_SOURCE, next_signal));
                next_signal = (next_signal + 1) % cfg.signal_entries;
            }

            context.push(time_ns, parts);
        }

        Ok(context)
    }
}
