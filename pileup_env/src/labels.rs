//! Truth label container.
//!
//! Labels are stored flat, with one header per digit pointing at the first
//! label of that digit. A digit owns the labels between its header and the
//! next one.
//!
//! ```text
//! headers:  [0]   [2]   [2]   [3]
//!            │     │     │     │
//! labels:   L0 L1  │     │    L3 ...
//!                  └─────┴─ L2
//! ```

use crate::error::EnvError;
use serde::{Deserialize, Serialize};

/// Append-only, order-preserving container of truth labels indexed by digit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelContainer<L> {
    /// Start offset into `labels` for every digit index
    headers: Vec<usize>,

    /// All labels, grouped by digit
    labels: Vec<L>,
}

impl<L> Default for LabelContainer<L> {
    fn default() -> Self {
        Self {
            headers: Vec::new(),
            labels: Vec::new(),
        }
    }
}

impl<L> LabelContainer<L> {
    /// Creates an empty container.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a label for digit `data_index`.
    ///
    /// Indices must be non-decreasing. Skipped indices get an empty label range.
    pub fn add_element(&mut self, data_index: usize, label: L) -> Result<(), EnvError> {
        let indexed = self.headers.len();
        if indexed > 0 && data_index + 1 < indexed {
            return Err(EnvError::LabelOrder {
                index: data_index,
                last: indexed - 1,
            });
        }
        while self.headers.len() <= data_index {
            self.headers.push(self.labels.len());
        }
        self.labels.push(label);
        Ok(())
    }

    /// Returns the labels of digit `data_index` (empty if unknown).
    pub fn labels(&self, data_index: usize) -> &[L] {
        let Some(&start) = self.headers.get(data_index) else {
            return &[];
        };
        let end = self
            .headers
            .get(data_index + 1)
            .copied()
            .unwrap_or(self.labels.len());
        &self.labels[start..end]
    }

    /// Appends all entries of `other` after our own, re-basing its digit
    /// indices so they follow ours.
    pub fn merge_at_back(&mut self, other: &LabelContainer<L>)
    where
        L: Clone,
    {
        let offset = self.labels.len();
        self.headers
            .extend(other.headers.iter().map(|start| start + offset));
        self.labels.extend_from_slice(&other.labels);
    }

    /// Number of digit indices that have a header.
    pub fn indexed_size(&self) -> usize {
        self.headers.len()
    }

    /// Total number of labels.
    pub fn n_elements(&self) -> usize {
        self.labels.len()
    }

    /// True when nothing has been added.
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    /// All labels in insertion order.
    pub fn elements(&self) -> &[L] {
        &self.labels
    }

    /// Removes all headers and labels.
    pub fn clear(&mut self) {
        self.headers.clear();
        self.labels.clear();
    }
}
