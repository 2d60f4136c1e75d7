//! Stage configuration.

use crate::error::{CoreError, Result};
use pileup_env::HitKind;
use serde::{Deserialize, Serialize};

/// Default background hit file.
pub const DEFAULT_SIM_FILE: &str = "o2sim.db";

/// Configuration supplied when a digitizer stage is constructed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageConfig {
    /// Readout channel served by this instance (input sub-specification)
    pub channel: u32,

    /// Detector origin used to tag outputs (default: "TOF")
    pub origin: String,

    /// Hit collection read from every source (default: "TOFHit")
    pub hit_kind: HitKind,

    /// Background hit source location (required)
    pub sim_file: String,

    /// Signal hit source location (empty = no signal source)
    pub sim_file_signal: String,

    /// Continuous readout mode for the digitizer (default: true)
    pub continuous: bool,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            channel: 0,
            origin: "TOF".to_string(),
            hit_kind: HitKind::new("TOFHit"),
            sim_file: DEFAULT_SIM_FILE.to_string(),
            sim_file_signal: String::new(),
            continuous: true,
        }
    }
}

impl StageConfig {
    /// Sets the readout channel.
    pub fn with_channel(mut self, channel: u32) -> Self {
        self.channel = channel;
        self
    }

    /// Sets the detector origin and hit collection name.
    pub fn with_detector(mut self, origin: impl Into<String>, hit_kind: impl Into<String>) -> Self {
        self.origin = origin.into();
        self.hit_kind = HitKind::new(hit_kind);
        self
    }

    /// Sets the background hit source.
    pub fn with_sim_file(mut self, location: impl Into<String>) -> Self {
        self.sim_file = location.into();
        self
    }

    /// Sets the signal hit source (empty disables it).
    pub fn with_signal_file(mut self, location: impl Into<String>) -> Self {
        self.sim_file_signal = location.into();
        self
    }

    /// Selects continuous or triggered readout.
    pub fn with_continuous(mut self, continuous: bool) -> Self {
        self.continuous = continuous;
        self
    }

    /// Returns the signal source location if one is configured.
    pub fn signal_file(&self) -> Option<&str> {
        if self.sim_file_signal.is_empty() {
            None
        } else {
            Some(&self.sim_file_signal)
        }
    }

    /// Hit source locations in source-id order (background first).
    pub fn source_locations(&self) -> Vec<&str> {
        let mut locations = vec![self.sim_file.as_str()];
        locations.extend(self.signal_file());
        locations
    }

    /// Checks the configuration before the stage is built.
    pub fn validate(&self) -> Result<()> {
        if self.sim_file.is_empty() {
            return Err(CoreError::config("background hit source (simFile) is required"));
        }
        if self.origin.is_empty()
            || self.origin.len() > 4
            || !self.origin.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        {
            return Err(CoreError::config(format!(
                "origin '{}' must be 1-4 uppercase ASCII characters",
                self.origin
            )));
        }
        if self.hit_kind.as_str().is_empty() {
            return Err(CoreError::config("hit kind must not be empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_config_default() {
        let config = StageConfig::default();
        assert_eq!(config.origin, "TOF");
        assert_eq!(config.hit_kind.as_str(), "TOFHit");
        assert_eq!(config.sim_file, DEFAULT_SIM_FILE);
        assert!(config.signal_file().is_none());
        assert!(config.continuous);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_source_locations_order() {
        let config = StageConfig::default()
            .with_sim_file("bkg.db")
            .with_signal_file("sig.db");
        assert_eq!(config.source_locations(), vec!["bkg.db", "sig.db"]);

        let config = config.with_signal_file("");
        assert_eq!(config.source_locations(), vec!["bkg.db"]);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = StageConfig::default().with_sim_file("");
        assert!(matches!(config.validate(), Err(CoreError::Config(_))));

        let config = StageConfig::default().with_detector("tof", "TOFHit");
        assert!(config.validate().is_err());

        let config = StageConfig::default().with_detector("EMCAL", "EMCHit");
        assert!(config.validate().is_err());

        let config = StageConfig::default().with_detector("TRD", "");
        assert!(config.validate().is_err());
    }
}
