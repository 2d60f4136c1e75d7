//! Toy time-of-flight digitizer.
//!
//! Hits of one event part are grouped by channel; each channel yields one
//! digit carrying the earliest hit time and the summed deposit, and one truth
//! label per contributing hit.

use crate::collisions::BC_NS;
use crate::hits::TofHit;
use pileup_env::{DigitizerEngine, EnvError, LabelContainer, TruthLabel};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// TDC bin width (ns).
pub const TDC_BIN_NS: f64 = 0.024_4;

/// Time-over-threshold units per MeV.
pub const TOT_PER_MEV: f64 = 100.0;

/// A digitized time-of-flight signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TofDigit {
    pub channel: u32,

    /// Bunch crossing of the signal (absolute in continuous mode)
    pub bc: u64,

    /// Time inside the bunch crossing, in TDC bins
    pub tdc: u32,

    /// Time over threshold
    pub tot: u32,
}

/// Parameters of the toy response.
#[derive(Debug, Clone)]
pub struct TofDigitizerConfig {
    /// Hits below this deposit are not seen (MeV)
    pub threshold_mev: f64,
}

impl Default for TofDigitizerConfig {
    fn default() -> Self {
        Self { threshold_mev: 0.0 }
    }
}

/// Deterministic toy digitizer for [`TofHit`]s.
#[derive(Debug, Default)]
pub struct TofDigitizer {
    config: TofDigitizerConfig,
    initialized: bool,
    continuous: bool,
    event_time_ns: f64,
    source_id: u32,
    entry_id: u32,
    processed: usize,
}

impl TofDigitizer {
    pub fn new(config: TofDigitizerConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn is_continuous(&self) -> bool {
        self.continuous
    }

    /// Number of event parts digitized so far.
    pub fn processed(&self) -> usize {
        self.processed
    }

    /// Fails for signals before the start of the timeframe, which have no
    /// bunch crossing.
    fn digitize_channel(&self, channel: u32, hits: &[&TofHit]) -> Result<TofDigit, EnvError> {
        let first = hits
            .iter()
            .map(|h| h.time_ns)
            .fold(f64::INFINITY, f64::min);
        let deposit: f64 = hits.iter().map(|h| h.energy_mev).sum();

        let time = if self.continuous {
            self.event_time_ns + first
        } else {
            first
        };
        if !time.is_finite() || time < 0.0 {
            return Err(EnvError::Engine(format!(
                "signal time {} ns on channel {} is before the timeframe start",
                time, channel
            )));
        }
        let bc = (time / BC_NS).floor();
        let tdc = ((time - bc * BC_NS) / TDC_BIN_NS) as u32;

        Ok(TofDigit {
            channel,
            bc: bc as u64,
            tdc,
            tot: (deposit * TOT_PER_MEV).round() as u32,
        })
    }
}

impl DigitizerEngine for TofDigitizer {
    type Hit = TofHit;
    type Digit = TofDigit;
    type Label = TruthLabel;

    fn init(&mut self) -> Result<(), EnvError> {
        if self.config.threshold_mev.is_nan() || self.config.threshold_mev < 0.0 {
            return Err(EnvError::Engine(format!(
                "invalid threshold {} MeV",
                self.config.threshold_mev
            )));
        }
        self.initialized = true;
        Ok(())
    }

    fn set_continuous(&mut self, continuous: bool) {
        self.continuous = continuous;
    }

    fn set_event_time(&mut self, time_ns: f64) {
        self.event_time_ns = time_ns;
    }

    fn set_event_context(&mut self, source_id: u32, entry_id: u32) {
        self.source_id = source_id;
        self.entry_id = entry_id;
    }

    fn process(
        &mut self,
        hits: &[TofHit],
        digits: &mut Vec<TofDigit>,
        labels: &mut LabelContainer<TruthLabel>,
    ) -> Result<(), EnvError> {
        let mut by_channel: BTreeMap<u32, Vec<&TofHit>> = BTreeMap::new();
        for hit in hits.iter().filter(|h| h.energy_mev >= self.config.threshold_mev) {
            by_channel.entry(hit.channel).or_default().push(hit);
        }

        for (channel, group) in &by_channel {
            let index = digits.len();
            digits.push(self.digitize_channel(*channel, group)?);
            for hit in group {
                labels.add_element(index, TruthLabel::new(hit.track_id, self.entry_id, self.source_id))?;
            }
        }

        self.processed += 1;
        Ok(())
    }
}
