//! Pileup Deterministic Simulation Harness
//!
//! Runs the timeframe digitization stage against seeded hit sources and
//! checks its products. All randomness derives from a single 64-bit seed,
//! so every failure is reproducible from the seed alone.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                     ScenarioRunner                       │
//! │                                                          │
//! │  CollisionGenerator ──▶ RunContext                       │
//! │  SimHitStore (bkg, sig) ──▶ SourceChain                  │
//! │                               │                          │
//! │                     ┌─────────▼─────────┐                │
//! │                     │  DigitizerStage   │◀── Probe<Tof>  │
//! │                     └─────────┬─────────┘                │
//! │                               ▼                          │
//! │                        RecordingSink ──▶ checks          │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use pileup_sim::{ScenarioId, ScenarioRunner};
//!
//! let result = ScenarioRunner::new(42).run(ScenarioId::Pileup);
//! assert!(result.passed);
//! ```

pub mod collisions;
pub mod digitizer;
pub mod error;
pub mod exporter;
pub mod hits;
pub mod recorder;
pub mod runner;
pub mod scenarios;

pub use collisions::{CollisionConfig, CollisionGenerator};
pub use digitizer::{TofDigit, TofDigitizer, TofDigitizerConfig};
pub use error::SimError;
pub use exporter::TimeframeExport;
pub use hits::{SampleConfig, SimHitStore, TofHit};
pub use recorder::{Emission, Probe, ProcessCall, RecordingSink};
pub use runner::{reference_digitization, ScenarioResult, ScenarioRunner};
pub use scenarios::ScenarioId;
