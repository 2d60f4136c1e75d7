//! Scenario runner - drives a digitizer stage through each merge scenario.
//!
//! Every scenario builds seeded hit sources and run contexts, hands the
//! contexts to a [`DigitizerStage`] through a [`RecordingSink`] and then
//! checks what came out:
//!
//! - digits equal the per-part digitizations concatenated in context order
//! - labels equal the per-part label containers merged at the back
//! - exactly one digit product, one label product and one ready-to-quit

use crate::collisions::{CollisionConfig, CollisionGenerator, SIGNAL_SOURCE};
use crate::digitizer::{TofDigit, TofDigitizer};
use crate::error::SimError;
use crate::hits::{SampleConfig, SimHitStore, TofHit};
use crate::recorder::{Probe, RecordingSink};
use crate::scenarios::ScenarioId;

use pileup_core::processor::{DIGITS_DESCRIPTION, LABELS_DESCRIPTION};
use pileup_core::{open_sources, CoreError, DigitizerStage, GateOutcome, MergeMetrics, StageConfig};
use pileup_env::{
    DataHeader, DigitizerEngine, EnvError, EventPart, HitKind, HitRetriever, LabelContainer,
    RunContext, SourceChain, TruthLabel,
};
use tracing::{debug, info, warn};

/// Location of the generated background source.
pub const BACKGROUND_LOCATION: &str = "sim://background";

/// Location of the generated signal source.
pub const SIGNAL_LOCATION: &str = "sim://signal";

/// Stage under test: seeded stores and a probed toy digitizer.
pub type SimStage = DigitizerStage<SourceChain<SimHitStore>, Probe<TofDigitizer>>;

/// Results from running a scenario.
#[derive(Debug, Clone)]
pub struct ScenarioResult {
    /// Scenario that was run
    pub scenario: ScenarioId,

    /// Seed used
    pub seed: u64,

    /// Whether scenario passed all assertions
    pub passed: bool,

    /// Failure message if any
    pub failure_reason: Option<String>,

    /// Metrics of the merge pass, if it ran
    pub metrics: Option<MergeMetrics>,

    /// Data products received by the sink
    pub emissions: usize,

    /// Emitted digits
    pub digits: Vec<TofDigit>,

    /// Emitted truth labels
    pub labels: LabelContainer<TruthLabel>,
}

impl ScenarioResult {
    fn failed(scenario: ScenarioId, seed: u64, reason: String) -> Self {
        Self {
            scenario,
            seed,
            passed: false,
            failure_reason: Some(reason),
            metrics: None,
            emissions: 0,
            digits: Vec::new(),
            labels: LabelContainer::new(),
        }
    }
}

/// Digitizes `context` part by part with a fresh digitizer and concatenates
/// the results.
///
/// Retrieval misses contribute an empty hit set, so the output is what a
/// correct merge pass over the same sources must produce.
pub fn reference_digitization<R>(
    retriever: &R,
    kind: &HitKind,
    context: &RunContext,
    continuous: bool,
) -> Result<(Vec<TofDigit>, LabelContainer<TruthLabel>), EnvError>
where
    R: HitRetriever<Hit = TofHit>,
{
    let mut digitizer = TofDigitizer::default();
    digitizer.init()?;
    digitizer.set_continuous(continuous);

    let mut digits = Vec::new();
    let mut labels = LabelContainer::new();
    let mut hits = Vec::new();
    for (record, parts) in context.collisions() {
        digitizer.set_event_time(record.time_ns);
        for &part in parts {
            digitizer.set_event_context(part.source_id, part.entry_id);
            hits.clear();
            if retriever.get_hits(part, kind, &mut hits).is_err() {
                hits.clear();
            }

            let mut part_digits = Vec::new();
            let mut part_labels = LabelContainer::new();
            digitizer.process(&hits, &mut part_digits, &mut part_labels)?;
            digits.append(&mut part_digits);
            labels.merge_at_back(&part_labels);
        }
    }

    Ok((digits, labels))
}

/// Runs merge scenarios.
pub struct ScenarioRunner {
    /// Configuration seed
    seed: u64,

    /// Collisions per generated timeframe
    collisions: usize,

    /// Mean extra background events per collision
    mu: f64,

    /// Readout channel of the stage
    channel: u32,
}

impl ScenarioRunner {
    /// Creates a new scenario runner.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            collisions: 20,
            mu: 0.5,
            channel: 0,
        }
    }

    /// Sets the number of generated collisions.
    pub fn with_collisions(mut self, collisions: usize) -> Self {
        self.collisions = collisions;
        self
    }

    /// Sets the pileup mean.
    pub fn with_mu(mut self, mu: f64) -> Self {
        self.mu = mu;
        self
    }

    /// Sets the readout channel.
    pub fn with_channel(mut self, channel: u32) -> Self {
        self.channel = channel;
        self
    }

    /// Runs a scenario and returns the result.
    pub fn run(&self, scenario: ScenarioId) -> ScenarioResult {
        info!("Starting scenario: {} (seed={})", scenario.name(), self.seed);
        debug!("  {}", scenario.description());

        let outcome = match scenario {
            ScenarioId::TwoCollisions => self.run_two_collisions(),
            ScenarioId::Pileup => self.run_pileup(),
            ScenarioId::MissingSignal => self.run_missing_signal(),
            ScenarioId::EmptyContext => self.run_empty_context(),
            ScenarioId::RepeatedDelivery => self.run_repeated_delivery(),
        };

        outcome.unwrap_or_else(|err| {
            warn!("Scenario {} aborted: {}", scenario.name(), err);
            ScenarioResult::failed(scenario, self.seed, err.to_string())
        })
    }

    /// Stage configuration for the generated sources.
    pub fn stage_config(&self) -> StageConfig {
        StageConfig::default()
            .with_channel(self.channel)
            .with_sim_file(BACKGROUND_LOCATION)
            .with_signal_file(SIGNAL_LOCATION)
    }

    fn signal_seed(&self) -> u64 {
        self.seed.wrapping_mul(0x9e3779b97f4a7c15)
    }

    fn sample(&self, location: &str, entries: u32) -> Result<SimHitStore, SimError> {
        let seed = if location == SIGNAL_LOCATION {
            self.signal_seed()
        } else {
            self.seed
        };
        let config = SampleConfig {
            entries,
            ..Default::default()
        };
        SimHitStore::generate(location, HitKind::new("TOFHit"), seed, &config)
    }

    /// Builds a stage over seeded sources. Without `signal_has_hits` the
    /// signal source carries no hit collection.
    fn build_stage(&self, signal_has_hits: bool) -> Result<SimStage, SimError> {
        let config = self.stage_config();
        let sources = open_sources(&config, |location| {
            let entries = if location == SIGNAL_LOCATION { 10 } else { 50 };
            let store = self
                .sample(location, entries)
                .map_err(|err| EnvError::Storage(err.to_string()))?;
            if location == SIGNAL_LOCATION && !signal_has_hits {
                Ok(store.without_kind())
            } else {
                Ok(store)
            }
        })?;
        let stage = DigitizerStage::init(config, sources, Probe::new(TofDigitizer::default()))?;
        Ok(stage)
    }

    fn generated_context(&self) -> Result<RunContext, SimError> {
        let config = CollisionConfig {
            collisions: self.collisions,
            mu: self.mu,
            ..Default::default()
        };
        CollisionGenerator::new(self.seed.wrapping_add(1), config).generate()
    }

    /// Hands `context` to the stage the way the pipeline does: only if the
    /// stage's input accepts the message header.
    fn deliver(
        &self,
        stage: &mut SimStage,
        context: &RunContext,
        sink: &mut RecordingSink,
        control: &mut RecordingSink,
    ) -> Result<GateOutcome<MergeMetrics>, SimError> {
        let header = DataHeader::new("SIM", "COLLISIONCONTEXT", self.channel);
        if stage.spec().accepts(&header).is_none() {
            return Err(CoreError::config(format!("no input accepts {}", header)).into());
        }
        Ok(stage.process(context, sink, control)?)
    }

    /// Checks the products of a completed pass against a reference
    /// digitization of `context`.
    fn verify(
        &self,
        scenario: ScenarioId,
        stage: &SimStage,
        context: &RunContext,
        sink: &RecordingSink,
        control: &RecordingSink,
        metrics: Option<MergeMetrics>,
    ) -> Result<ScenarioResult, SimError> {
        let mut failures = Vec::new();

        let digits: Vec<TofDigit> = sink.decode(DIGITS_DESCRIPTION)?.unwrap_or_default();
        let labels: LabelContainer<TruthLabel> = sink.decode(LABELS_DESCRIPTION)?.unwrap_or_default();

        if sink.emissions().len() != 2 {
            failures.push(format!("expected 2 data products, got {}", sink.emissions().len()));
        }
        if control.quit_signals() != 1 {
            failures.push(format!("expected 1 ready-to-quit, got {}", control.quit_signals()));
        }

        let config = stage.config();
        let (ref_digits, ref_labels) =
            reference_digitization(stage.retriever(), &config.hit_kind, context, config.continuous)?;
        if digits != ref_digits {
            failures.push(format!(
                "digits differ from per-part concatenation ({} vs {})",
                digits.len(),
                ref_digits.len()
            ));
        }
        if labels != ref_labels {
            failures.push(format!(
                "labels differ from per-part merge ({} vs {} elements)",
                labels.n_elements(),
                ref_labels.n_elements()
            ));
        }
        if labels.indexed_size() != digits.len() {
            failures.push(format!(
                "{} labelled digits for {} digits",
                labels.indexed_size(),
                digits.len()
            ));
        }

        let expected_calls: Vec<(u32, u32, f64)> = context
            .collisions()
            .flat_map(|(record, parts)| parts.iter().map(move |p| (p.source_id, p.entry_id, record.time_ns)))
            .collect();
        let calls: Vec<(u32, u32, f64)> = stage
            .digitizer()
            .calls()
            .iter()
            .map(|c| (c.source_id, c.entry_id, c.time_ns))
            .collect();
        if calls != expected_calls {
            failures.push(format!(
                "digitizer saw {} parts out of order (expected {})",
                calls.len(),
                expected_calls.len()
            ));
        }

        let passed = failures.is_empty();
        if passed {
            info!("✓ {}: {} digits, {} labels", scenario.name(), digits.len(), labels.n_elements());
        }

        Ok(ScenarioResult {
            scenario,
            seed: self.seed,
            passed,
            failure_reason: if passed { None } else { Some(failures.join("; ")) },
            metrics,
            emissions: sink.emissions().len(),
            digits,
            labels,
        })
    }

    fn run_two_collisions(&self) -> Result<ScenarioResult, SimError> {
        let mut stage = self.build_stage(true)?;
        let mut context = RunContext::empty();
        context.push(100.0, vec![EventPart::new(0, 5)]);
        context.push(250.0, vec![EventPart::new(0, 6), EventPart::new(SIGNAL_SOURCE, 2)]);

        let mut sink = RecordingSink::new();
        let mut control = RecordingSink::new();
        let metrics = self.deliver(&mut stage, &context, &mut sink, &mut control)?.ran();

        let mut result = self.verify(ScenarioId::TwoCollisions, &stage, &context, &sink, &control, metrics)?;
        let second = self.deliver(&mut stage, &context, &mut sink, &mut control)?;
        if !second.is_inert() || sink.emissions().len() != 2 {
            fail(&mut result, "second invocation was not inert");
        }
        Ok(result)
    }

    fn run_pileup(&self) -> Result<ScenarioResult, SimError> {
        let mut stage = self.build_stage(true)?;
        let context = self.generated_context()?;
        debug!("  {} collisions, {} event parts", context.len(), context.part_count());

        let mut sink = RecordingSink::new();
        let mut control = RecordingSink::new();
        let metrics = self.deliver(&mut stage, &context, &mut sink, &mut control)?.ran();

        let mut result = self.verify(ScenarioId::Pileup, &stage, &context, &sink, &control, metrics)?;
        let misses = result.metrics.as_ref().map_or(0, |m| m.retrieval_misses);
        if misses != 0 {
            fail(&mut result, &format!("{} unexpected retrieval misses", misses));
        }
        Ok(result)
    }

    fn run_missing_signal(&self) -> Result<ScenarioResult, SimError> {
        let mut stage = self.build_stage(false)?;
        let context = self.generated_context()?;
        let signal_parts = (0..context.len())
            .flat_map(|i| context.parts(i))
            .filter(|p| p.source_id == SIGNAL_SOURCE)
            .count();

        let mut sink = RecordingSink::new();
        let mut control = RecordingSink::new();
        let metrics = self.deliver(&mut stage, &context, &mut sink, &mut control)?.ran();

        let mut result = self.verify(ScenarioId::MissingSignal, &stage, &context, &sink, &control, metrics)?;
        let misses = result.metrics.as_ref().map(|m| m.retrieval_misses);
        if misses != Some(signal_parts) {
            fail(
                &mut result,
                &format!("expected {} signal misses, got {:?}", signal_parts, misses),
            );
        }
        Ok(result)
    }

    fn run_empty_context(&self) -> Result<ScenarioResult, SimError> {
        let mut stage = self.build_stage(true)?;
        let mut sink = RecordingSink::new();
        let mut control = RecordingSink::new();

        let first = self.deliver(&mut stage, &RunContext::empty(), &mut sink, &mut control)?;
        let idle_after_empty = first == GateOutcome::Deferred
            && sink.emissions().is_empty()
            && control.quit_signals() == 0
            && stage.accumulator().is_empty();

        let context = self.generated_context()?;
        let metrics = self.deliver(&mut stage, &context, &mut sink, &mut control)?.ran();

        let mut result = self.verify(ScenarioId::EmptyContext, &stage, &context, &sink, &control, metrics)?;
        if !idle_after_empty {
            fail(&mut result, "empty context was not a no-op");
        }
        Ok(result)
    }

    fn run_repeated_delivery(&self) -> Result<ScenarioResult, SimError> {
        let mut stage = self.build_stage(true)?;
        let context = self.generated_context()?;
        let mut sink = RecordingSink::new();
        let mut control = RecordingSink::new();

        let metrics = self.deliver(&mut stage, &context, &mut sink, &mut control)?.ran();
        let mut inert = 0;
        for _ in 0..2 {
            if self.deliver(&mut stage, &context, &mut sink, &mut control)?.is_inert() {
                inert += 1;
            }
        }

        let mut result = self.verify(ScenarioId::RepeatedDelivery, &stage, &context, &sink, &control, metrics)?;
        if inert != 2 {
            fail(&mut result, &format!("{} of 2 repeated deliveries were inert", inert));
        }
        Ok(result)
    }
}

fn fail(result: &mut ScenarioResult, reason: &str) {
    result.passed = false;
    result.failure_reason = Some(match result.failure_reason.take() {
        Some(previous) => format!("{}; {}", previous, reason),
        None => reason.to_string(),
    });
}
