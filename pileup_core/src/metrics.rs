//! Merge Pass Metrics
//! ==================
//!
//! Counters collected while a merge pass walks the run context. They are
//! logged at the end of the pass and handed back to the caller.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Counters for one merge pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MergeMetrics {
    /// Collisions walked
    pub collisions: usize,
    /// Event parts processed (including misses)
    pub parts: usize,
    /// Event parts whose hits could not be retrieved
    pub retrieval_misses: usize,
    /// Event parts whose digitization failed and were dropped
    pub digitizer_failures: usize,
    /// Hits handed to the digitizer
    pub hits: usize,
    /// Digits accumulated
    pub digits: usize,
    /// Truth label elements accumulated
    pub labels: usize,
    /// Wall time of the pass
    pub elapsed: Duration,
}

impl MergeMetrics {
    /// Fraction of event parts that contributed retrieved hits, in [0, 1].
    pub fn retrieval_efficiency(&self) -> f64 {
        if self.parts == 0 {
            return 1.0;
        }
        (self.parts - self.retrieval_misses) as f64 / self.parts as f64
    }

    /// Mean digits produced per hit.
    pub fn digits_per_hit(&self) -> f64 {
        if self.hits == 0 {
            0.0
        } else {
            self.digits as f64 / self.hits as f64
        }
    }
}

impl std::fmt::Display for MergeMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} collisions, {} parts ({} misses), {} hits -> {} digits / {} labels in {:.3}s",
            self.collisions,
            self.parts,
            self.retrieval_misses,
            self.hits,
            self.digits,
            self.labels,
            self.elapsed.as_secs_f64()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_retrieval_efficiency() {
        let metrics = MergeMetrics {
            parts: 4,
            retrieval_misses: 1,
            ..Default::default()
        };
        assert_relative_eq!(metrics.retrieval_efficiency(), 0.75);
        assert_relative_eq!(MergeMetrics::default().retrieval_efficiency(), 1.0);
    }

    #[test]
    fn test_digits_per_hit() {
        let metrics = MergeMetrics {
            hits: 8,
            digits: 6,
            ..Default::default()
        };
        assert_relative_eq!(metrics.digits_per_hit(), 0.75);
        assert_relative_eq!(MergeMetrics::default().digits_per_hit(), 0.0);
    }
}
