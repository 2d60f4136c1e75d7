//! Timeframe-wide digit and label buffers.

use pileup_env::LabelContainer;

/// Ordered digits and labels of one whole timeframe.
///
/// Content only ever grows at the back: each event part's output is appended
/// after everything accumulated before it.
#[derive(Debug, Clone)]
pub struct DigitAccumulator<D, L> {
    digits: Vec<D>,
    labels: LabelContainer<L>,
}

impl<D, L> Default for DigitAccumulator<D, L> {
    fn default() -> Self {
        Self {
            digits: Vec::new(),
            labels: LabelContainer::new(),
        }
    }
}

impl<D, L: Clone> DigitAccumulator<D, L> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves `digits` to the back of the digit sequence and merges `labels`
    /// at the back of the label container.
    ///
    /// `digits` is left empty.
    pub fn append(&mut self, digits: &mut Vec<D>, labels: &LabelContainer<L>) {
        self.digits.append(digits);
        self.labels.merge_at_back(labels);
    }

    pub fn digits(&self) -> &[D] {
        &self.digits
    }

    pub fn labels(&self) -> &LabelContainer<L> {
        &self.labels
    }

    /// Number of accumulated digits.
    pub fn len(&self) -> usize {
        self.digits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.digits.is_empty() && self.labels.is_empty()
    }
}
