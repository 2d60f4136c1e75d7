//! End-to-end timeframe runs through the recording boundary.

use pileup_core::processor::{DIGITS_DESCRIPTION, LABELS_DESCRIPTION};
use pileup_core::{open_sources, DigitizerStage, GateOutcome, GateState, StageConfig};
use pileup_env::{
    EventPart, HitKind, HitStore, LabelContainer, Lifetime, Output, RunContext, SledHitStore,
    TruthLabel,
};
use pileup_sim::{Probe, RecordingSink, SampleConfig, SimHitStore, TofDigit, TofDigitizer, TofHit};

fn hit(channel: u32, time_ns: f64, track_id: i32) -> TofHit {
    TofHit {
        channel,
        time_ns,
        energy_mev: 1.0,
        track_id,
    }
}

/// Background entries 5 and 6, signal entry 2; one hit each on distinct
/// channels.
fn sources() -> pileup_env::SourceChain<SimHitStore> {
    let mut background = vec![Vec::new(); 7];
    background[5] = vec![hit(50, 3.0, 0)];
    background[6] = vec![hit(60, 4.0, 1)];
    let mut signal = vec![Vec::new(); 3];
    signal[2] = vec![hit(12, 5.0, 7), hit(12, 6.0, 8)];

    let mut chain = pileup_env::SourceChain::new();
    chain.add(SimHitStore::from_entries("bkg", HitKind::new("TOFHit"), background));
    chain.add(SimHitStore::from_entries("sig", HitKind::new("TOFHit"), signal));
    chain
}

fn two_collisions() -> RunContext {
    let mut context = RunContext::empty();
    context.push(100.0, vec![EventPart::new(0, 5)]);
    context.push(250.0, vec![EventPart::new(0, 6), EventPart::new(1, 2)]);
    context
}

#[test]
fn two_collisions_emit_once_in_order() {
    let config = StageConfig::default().with_signal_file("sig");
    let mut stage = DigitizerStage::init(config, sources(), Probe::new(TofDigitizer::default())).unwrap();
    let mut sink = RecordingSink::new();
    let mut control = RecordingSink::new();

    let outcome = stage.process(&two_collisions(), &mut sink, &mut control).unwrap();
    assert!(matches!(outcome, GateOutcome::Ran(_)));

    let calls: Vec<(u32, u32, f64)> = stage
        .digitizer()
        .calls()
        .iter()
        .map(|c| (c.source_id, c.entry_id, c.time_ns))
        .collect();
    assert_eq!(calls, vec![(0, 5, 100.0), (0, 6, 250.0), (1, 2, 250.0)]);
    let engine = stage.digitizer().inner();
    assert!(engine.is_initialized());
    assert!(engine.is_continuous());
    assert_eq!(engine.processed(), 3);

    let outputs: Vec<&Output> = sink.emissions().iter().map(|e| &e.output).collect();
    assert_eq!(outputs.len(), 2);
    assert_eq!(outputs[0].to_string(), "TOF/DIGITS/0 (Timeframe)");
    assert_eq!(outputs[1].header.description, "DIGITSMCTR");
    assert_eq!(outputs[1].lifetime, Lifetime::Timeframe);
    assert_eq!(control.quit_signals(), 1);

    let digits: Vec<TofDigit> = sink.decode(DIGITS_DESCRIPTION).unwrap().unwrap();
    let channels: Vec<u32> = digits.iter().map(|d| d.channel).collect();
    assert_eq!(channels, vec![50, 60, 12]);
    // 100 + 3 ns and 250 + 4 ns, 250 + 5 ns
    let bcs: Vec<u64> = digits.iter().map(|d| d.bc).collect();
    assert_eq!(bcs, vec![4, 10, 10]);
    assert_eq!(digits[2].tot, 200);

    let labels: LabelContainer<TruthLabel> = sink.decode(LABELS_DESCRIPTION).unwrap().unwrap();
    assert_eq!(labels.labels(0), &[TruthLabel::new(0, 5, 0)]);
    assert_eq!(labels.labels(1), &[TruthLabel::new(1, 6, 0)]);
    assert_eq!(
        labels.labels(2),
        &[TruthLabel::new(7, 2, 1), TruthLabel::new(8, 2, 1)]
    );

    let again = stage.process(&two_collisions(), &mut sink, &mut control).unwrap();
    assert!(again.is_inert());
    assert_eq!(sink.emissions().len(), 2);
    assert_eq!(control.quit_signals(), 1);
}

#[test]
fn closed_sink_finishes_without_quit() {
    let config = StageConfig::default().with_signal_file("sig");
    let mut stage = DigitizerStage::init(config, sources(), TofDigitizer::default()).unwrap();
    let mut sink = RecordingSink::new();
    sink.close();
    let mut control = RecordingSink::new();

    assert!(stage.process(&two_collisions(), &mut sink, &mut control).is_err());
    assert_eq!(stage.state(), GateState::Finished);
    assert_eq!(control.quit_signals(), 0);
}

#[test]
fn sled_sources_match_generated_samples() {
    let sample = SimHitStore::generate("bkg", HitKind::new("TOFHit"), 5, &SampleConfig {
        entries: 8,
        ..Default::default()
    })
    .unwrap();
    let dir = std::env::temp_dir().join(format!("pileup-sim-test-{}", std::process::id()));
    let location = dir.to_string_lossy().to_string();

    let config = StageConfig::default().with_sim_file(location.clone());
    let chain = open_sources(&config, |loc| {
        let store = SledHitStore::<TofHit>::open(loc)?;
        sample.write_to(&store)?;
        Ok(store)
    })
    .unwrap();
    assert_eq!(chain.get(0).map(|s| s.entries()), Some(8));

    let mut context = RunContext::empty();
    context.push(25.0, vec![EventPart::new(0, 1), EventPart::new(0, 3)]);

    let mut stage = DigitizerStage::init(config, chain, TofDigitizer::default()).unwrap();
    let mut sink = RecordingSink::new();
    let mut control = RecordingSink::new();
    let metrics = stage.process(&context, &mut sink, &mut control).unwrap().ran().unwrap();

    let expected_hits = sample.entry(1).map_or(0, |h| h.len()) + sample.entry(3).map_or(0, |h| h.len());
    assert_eq!(metrics.hits, expected_hits);
    assert_eq!(metrics.retrieval_misses, 0);

    drop(stage);
    let _ = std::fs::remove_dir_all(&dir);
}
