//! Pileup Core - Timeframe Digitization Merge Engine
//!
//! This library turns simulated hits into one timeframe of digits and truth
//! labels, merging background and signal events per collision:
//! 1. **Ordering**: collisions in run-context order, event parts in given order
//! 2. **Tolerance**: missing hit data is logged and counted, never fatal
//! 3. **Exactly once**: a stage merges and emits a single time, then goes inert

pub mod accumulator;
pub mod config;
pub mod emitter;
pub mod error;
pub mod lifecycle;
pub mod merge_loop;
pub mod metrics;
pub mod processor;
pub mod sources;
pub mod stage;

// Re-export key types for convenience
pub use accumulator::DigitAccumulator;
pub use config::StageConfig;
pub use emitter::OutputEmitter;
pub use error::CoreError;
pub use lifecycle::{GateOutcome, GateState, LifecycleGate, PassVerdict};
pub use merge_loop::{MergeLoop, WorkBuffers};
pub use metrics::MergeMetrics;
pub use processor::ProcessorSpec;
pub use sources::open_sources;
pub use stage::{DigitizerStage, ProcessOutcome};
