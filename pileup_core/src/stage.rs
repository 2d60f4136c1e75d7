//! Digitizer Stage - the pipeline-facing unit of the merge engine.
//!
//! A stage owns everything a merge pass needs and exposes two phases:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      DigitizerStage                          │
//! │                                                              │
//! │  init(config, retriever, digitizer)                          │
//! │    • validate config  • digitizer.init()  • set_continuous   │
//! │                                                              │
//! │  process(context, outputs, control)        (called per input)│
//! │    ┌──────────────┐                                          │
//! │    │LifecycleGate │── Idle ──▶ MergeLoop ──▶ OutputEmitter   │
//! │    └──────────────┘                  │            │          │
//! │          │                    DigitAccumulator  ready_to_quit│
//! │          └── Finished ──▶ no-op                              │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use pileup_core::{open_sources, DigitizerStage, StageConfig};
//!
//! let config = StageConfig::default().with_signal_file("sig.db");
//! let sources = open_sources(&config, SledHitStore::open)?;
//! let mut stage = DigitizerStage::init(config, sources, TofDigitizer::default())?;
//!
//! // called by the scheduler whenever a run context arrives
//! stage.process(&context, &mut outputs, &mut control)?;
//! ```

use crate::accumulator::DigitAccumulator;
use crate::config::StageConfig;
use crate::emitter::OutputEmitter;
use crate::error::{CoreError, Result};
use crate::lifecycle::{GateOutcome, GateState, LifecycleGate, PassVerdict};
use crate::merge_loop::{EngineBuffers, MergeLoop};
use crate::metrics::MergeMetrics;
use crate::processor::ProcessorSpec;
use pileup_env::{ControlService, DigitizerEngine, HitRetriever, OutputSink, RunContext};
use serde::Serialize;
use tracing::{debug, info};

/// Result of one call to [`DigitizerStage::process`].
pub type ProcessOutcome = GateOutcome<MergeMetrics>;

/// A digitizer stage serving one readout channel.
///
/// Generic over the hit retriever and the digitization engine, so the same
/// stage runs against persistent stores or seeded simulation stores.
pub struct DigitizerStage<R, E>
where
    E: DigitizerEngine,
{
    config: StageConfig,
    retriever: R,
    digitizer: E,
    buffers: EngineBuffers<E>,
    accumulator: DigitAccumulator<E::Digit, E::Label>,
    emitter: OutputEmitter,
    gate: LifecycleGate,
}

impl<R, E> DigitizerStage<R, E>
where
    E: DigitizerEngine,
    E::Digit: Serialize,
    E::Label: Clone + Serialize,
    R: HitRetriever<Hit = E::Hit>,
{
    /// Validates `config` and configures the digitizer for the pass.
    pub fn init(config: StageConfig, retriever: R, mut digitizer: E) -> Result<Self> {
        config.validate()?;
        if retriever.source_count() == 0 {
            return Err(CoreError::config("no hit source configured"));
        }

        digitizer.init().map_err(CoreError::DigitizerInit)?;
        digitizer.set_continuous(config.continuous);

        let emitter = OutputEmitter::new(&config.origin);
        info!(
            "{}Digitizer ready on channel {} with {} hit source(s)",
            config.origin,
            config.channel,
            retriever.source_count()
        );

        Ok(Self {
            config,
            retriever,
            digitizer,
            buffers: EngineBuffers::<E>::default(),
            accumulator: DigitAccumulator::new(),
            emitter,
            gate: LifecycleGate::new(),
        })
    }

    /// Handles one incoming run context.
    ///
    /// The first non-empty context is merged, emitted and followed by a
    /// ready-to-quit signal. Empty contexts leave the stage waiting. Once the
    /// pass has run every call returns [`GateOutcome::Inert`].
    pub fn process<O, C>(
        &mut self,
        context: &RunContext,
        outputs: &mut O,
        control: &mut C,
    ) -> Result<ProcessOutcome>
    where
        O: OutputSink,
        C: ControlService,
    {
        let Self {
            config,
            retriever,
            digitizer,
            buffers,
            accumulator,
            emitter,
            gate,
        } = self;

        gate.attempt_run(|| -> Result<PassVerdict<MergeMetrics>> {
            debug!("Got {} collision times", context.len());
            if context.is_empty() {
                return Ok(PassVerdict::Deferred);
            }

            info!("Calling {} digitization", config.origin);
            let metrics = MergeLoop::new(&*retriever, digitizer, &config.hit_kind, buffers)
                .run(context, &mut *accumulator);
            info!("Have {} {} labels", metrics.labels, config.origin);

            emitter.emit(outputs, &*accumulator)?;
            info!("Digitization took {:.3}s ({})", metrics.elapsed.as_secs_f64(), metrics);

            // only called once; tell the pipeline this stage may exit
            control.ready_to_quit(false);
            Ok(PassVerdict::Done(metrics))
        })
    }

    /// Current lifecycle state.
    pub fn state(&self) -> GateState {
        self.gate.state()
    }

    /// Digits and labels accumulated so far.
    pub fn accumulator(&self) -> &DigitAccumulator<E::Digit, E::Label> {
        &self.accumulator
    }

    pub fn config(&self) -> &StageConfig {
        &self.config
    }

    /// Pipeline description of this stage.
    pub fn spec(&self) -> ProcessorSpec {
        ProcessorSpec::describe(&self.config)
    }

    pub fn digitizer(&self) -> &E {
        &self.digitizer
    }

    pub fn retriever(&self) -> &R {
        &self.retriever
    }
}
