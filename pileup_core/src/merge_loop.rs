//! The timeframe merge loop.
//!
//! Walks collisions in order, and for each collision its event parts in
//! order, digitizing every part's hits under the collision time and part
//! context. Outputs are appended to the accumulator in exactly that order:
//!
//! ```text
//! for (record, parts) in context:
//!     engine.set_event_time(record.time_ns)
//!     for part in parts:
//!         engine.set_event_context(part.source_id, part.entry_id)
//!         clear buffers → get_hits → process → append
//! ```

use crate::accumulator::DigitAccumulator;
use crate::metrics::MergeMetrics;
use pileup_env::{DigitizerEngine, EventPart, HitKind, HitRetriever, LabelContainer, RunContext};
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Per-part working buffers, reused across event parts.
#[derive(Debug)]
pub struct WorkBuffers<H, D, L> {
    pub hits: Vec<H>,
    pub digits: Vec<D>,
    pub labels: LabelContainer<L>,
}

impl<H, D, L> Default for WorkBuffers<H, D, L> {
    fn default() -> Self {
        Self {
            hits: Vec::new(),
            digits: Vec::new(),
            labels: LabelContainer::new(),
        }
    }
}

impl<H, D, L> WorkBuffers<H, D, L> {
    /// Empties every buffer so nothing carries over to the next part.
    pub fn clear(&mut self) {
        self.hits.clear();
        self.digits.clear();
        self.labels.clear();
    }
}

/// Buffers matching the associated types of engine `E`.
pub type EngineBuffers<E> = WorkBuffers<
    <E as DigitizerEngine>::Hit,
    <E as DigitizerEngine>::Digit,
    <E as DigitizerEngine>::Label,
>;

/// Drives retrieval and digitization over one run context.
pub struct MergeLoop<'a, R, E>
where
    E: DigitizerEngine,
{
    retriever: &'a R,
    digitizer: &'a mut E,
    kind: &'a HitKind,
    buffers: &'a mut EngineBuffers<E>,
}

impl<'a, R, E> MergeLoop<'a, R, E>
where
    E: DigitizerEngine,
    E::Label: Clone,
    R: HitRetriever<Hit = E::Hit>,
{
    pub fn new(
        retriever: &'a R,
        digitizer: &'a mut E,
        kind: &'a HitKind,
        buffers: &'a mut EngineBuffers<E>,
    ) -> Self {
        Self {
            retriever,
            digitizer,
            kind,
            buffers,
        }
    }

    /// Merges every event part of `context` into `accumulator`.
    ///
    /// Retrieval misses and digitizer failures are logged and counted; they
    /// never stop the pass.
    pub fn run(
        mut self,
        context: &RunContext,
        accumulator: &mut DigitAccumulator<E::Digit, E::Label>,
    ) -> MergeMetrics {
        let start = Instant::now();
        let mut metrics = MergeMetrics::default();

        for (coll_id, (record, parts)) in context.collisions().enumerate() {
            self.digitizer.set_event_time(record.time_ns);
            metrics.collisions += 1;

            // background/signal merging happens here: every part of one
            // collision shares its time
            for &part in parts {
                self.merge_part(coll_id, part, accumulator, &mut metrics);
            }
        }

        metrics.labels = accumulator.labels().n_elements();
        metrics.elapsed = start.elapsed();
        metrics
    }

    fn merge_part(
        &mut self,
        coll_id: usize,
        part: EventPart,
        accumulator: &mut DigitAccumulator<E::Digit, E::Label>,
        metrics: &mut MergeMetrics,
    ) {
        metrics.parts += 1;
        self.digitizer
            .set_event_context(part.source_id, part.entry_id);

        self.buffers.clear();
        if let Err(err) = self
            .retriever
            .get_hits(part, self.kind, &mut self.buffers.hits)
        {
            if err.is_miss() {
                error!("No {} hits for {}: {}", self.kind, part, err);
            } else {
                error!("Hit retrieval for {} failed: {}", part, err);
            }
            metrics.retrieval_misses += 1;
            // a partially filled buffer must not reach the digitizer
            self.buffers.hits.clear();
        }

        info!(
            "For collision {} eventID {} (source {}) found {} hits",
            coll_id,
            part.entry_id,
            part.source_id,
            self.buffers.hits.len()
        );
        metrics.hits += self.buffers.hits.len();

        let WorkBuffers {
            hits,
            digits,
            labels,
        } = &mut *self.buffers;
        if let Err(err) = self.digitizer.process(hits, digits, labels) {
            warn!("Digitization of {} failed, dropping its output: {}", part, err);
            metrics.digitizer_failures += 1;
            return;
        }

        debug_assert!(
            labels.is_empty() || labels.indexed_size() == digits.len(),
            "labels cover {} of {} digits",
            labels.indexed_size(),
            digits.len()
        );
        debug!("Have {} digits", digits.len());
        metrics.digits += digits.len();
        accumulator.append(digits, labels);
    }
}
