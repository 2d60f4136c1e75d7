//! JSON exporter for merged timeframes.
//!
//! Writes the digits and labels of a scenario run, together with the pass
//! metrics, so a timeframe can be inspected or diffed across seeds.

use crate::digitizer::TofDigit;
use crate::runner::ScenarioResult;
use pileup_core::MergeMetrics;
use pileup_env::{LabelContainer, TruthLabel};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;

/// Complete timeframe export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeframeExport {
    /// Scenario name (or "file" for a run over on-disk sources)
    pub scenario: String,

    /// Seed used
    pub seed: u64,

    /// Final results
    pub passed: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<MergeMetrics>,

    pub digits: Vec<TofDigit>,

    pub labels: LabelContainer<TruthLabel>,
}

impl TimeframeExport {
    /// Creates an empty export container.
    pub fn new(scenario: &str, seed: u64) -> Self {
        Self {
            scenario: scenario.to_string(),
            seed,
            passed: false,
            metrics: None,
            digits: Vec::new(),
            labels: LabelContainer::new(),
        }
    }

    /// Builds an export from a finished scenario run.
    pub fn from_result(result: &ScenarioResult) -> Self {
        Self {
            scenario: result.scenario.name().to_string(),
            seed: result.seed,
            passed: result.passed,
            metrics: result.metrics.clone(),
            digits: result.digits.clone(),
            labels: result.labels.clone(),
        }
    }

    /// Writes to a JSON file.
    pub fn write_to_file(&self, path: &str) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }
}
