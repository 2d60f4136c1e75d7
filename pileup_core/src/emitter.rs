//! Hands the accumulated timeframe to the output boundary.

use crate::accumulator::DigitAccumulator;
use crate::error::{CoreError, Result};
use crate::processor::{DIGITS_DESCRIPTION, LABELS_DESCRIPTION};
use pileup_env::{OutputSink, Output};
use serde::Serialize;
use tracing::info;

/// Emits the digit and label products of a timeframe.
#[derive(Debug, Clone)]
pub struct OutputEmitter {
    digits: Output,
    labels: Output,
}

impl OutputEmitter {
    /// Creates an emitter tagging products with `origin`, sub-spec 0 and
    /// timeframe lifetime.
    pub fn new(origin: &str) -> Self {
        Self {
            digits: Output::timeframe(origin, DIGITS_DESCRIPTION, 0),
            labels: Output::timeframe(origin, LABELS_DESCRIPTION, 0),
        }
    }

    pub fn digits_output(&self) -> &Output {
        &self.digits
    }

    pub fn labels_output(&self) -> &Output {
        &self.labels
    }

    /// Snapshots digits, then labels.
    ///
    /// The two snapshots are not atomic: if the label snapshot fails, the
    /// digit product has already been handed to the sink.
    pub fn emit<S, D, L>(&self, sink: &mut S, accumulator: &DigitAccumulator<D, L>) -> Result<()>
    where
        S: OutputSink,
        D: Serialize,
        L: Serialize + Clone,
    {
        sink.snapshot(&self.digits, accumulator.digits())
            .map_err(|source| CoreError::Emit {
                output: self.digits.to_string(),
                source,
            })?;
        sink.snapshot(&self.labels, accumulator.labels())
            .map_err(|source| CoreError::Emit {
                output: self.labels.to_string(),
                source,
            })?;

        info!(
            "Emitted {} digits to {} and {} labels to {}",
            accumulator.len(),
            self.digits.header,
            accumulator.labels().n_elements(),
            self.labels.header
        );
        Ok(())
    }
}
