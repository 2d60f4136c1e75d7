//! Opening the configured hit sources.

use crate::config::StageConfig;
use crate::error::{CoreError, Result};
use pileup_env::{EnvError, HitStore, SourceChain};
use tracing::{info, warn};

/// Opens the background source and, if configured, the signal source.
///
/// Sources are added in that order, so background is source 0 and signal is
/// source 1. A store that lacks the configured hit kind is still added: parts
/// addressing it will be retrieval misses.
pub fn open_sources<S, F>(config: &StageConfig, mut open: F) -> Result<SourceChain<S>>
where
    S: HitStore,
    F: FnMut(&str) -> std::result::Result<S, EnvError>,
{
    let mut chain = SourceChain::new();

    for location in config.source_locations() {
        let store = open(location).map_err(|source| CoreError::SourceOpen {
            location: location.to_string(),
            source,
        })?;
        if !store.has_kind(&config.hit_kind) {
            warn!("Source {} has no {} collection", location, config.hit_kind);
        }
        let source_id = chain.add(store);
        info!("Added hit source {} = {}", source_id, location);
    }

    Ok(chain)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pileup_env::HitKind;

    #[derive(Debug)]
    struct NamedStore(String);

    impl HitStore for NamedStore {
        type Hit = ();

        fn location(&self) -> &str {
            &self.0
        }

        fn entries(&self) -> usize {
            0
        }

        fn has_kind(&self, _kind: &HitKind) -> bool {
            false
        }

        fn read_entry(&self, kind: &HitKind, _entry: u32, _hits: &mut Vec<()>) -> std::result::Result<(), EnvError> {
            Err(EnvError::branch_missing(kind, &self.0))
        }
    }

    #[test]
    fn test_background_only() {
        let config = StageConfig::default().with_sim_file("bkg.db");
        let chain = open_sources(&config, |loc| Ok(NamedStore(loc.to_string()))).unwrap();

        let names: Vec<&str> = chain.iter().map(|s| s.location()).collect();
        assert_eq!(names, vec!["bkg.db"]);
    }

    #[test]
    fn test_background_then_signal() {
        let config = StageConfig::default()
            .with_sim_file("bkg.db")
            .with_signal_file("sig.db");
        let chain = open_sources(&config, |loc| Ok(NamedStore(loc.to_string()))).unwrap();

        assert_eq!(chain.get(0).unwrap().location(), "bkg.db");
        assert_eq!(chain.get(1).unwrap().location(), "sig.db");
    }

    #[test]
    fn test_open_failure_names_location() {
        let config = StageConfig::default().with_signal_file("sig.db");
        let err = open_sources(&config, |loc| {
            if loc == "sig.db" {
                Err(EnvError::Storage("locked".into()))
            } else {
                Ok(NamedStore(loc.to_string()))
            }
        })
        .unwrap_err();

        assert!(matches!(err, CoreError::SourceOpen { ref location, .. } if location == "sig.db"));
    }
}
