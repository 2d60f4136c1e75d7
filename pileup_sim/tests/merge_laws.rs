//! Property tests for the merge pass.
//!
//! Random run contexts are merged by a fresh stage over fixed seeded
//! sources. Entry ids range past the end of each source and source ids past
//! the configured sources, so contexts mix hits and retrieval misses.
//!
//! # Coverage
//!
//! - **Order**: digits equal the per-part digitizations concatenated in
//!   collision order, then part order
//! - **Labels**: labels equal the per-part containers merged at the back
//! - **Exactly once**: any number of deliveries yields one digit product,
//!   one label product and one ready-to-quit

use pileup_core::processor::{DIGITS_DESCRIPTION, LABELS_DESCRIPTION};
use pileup_core::{DigitizerStage, GateState, StageConfig};
use pileup_env::{EventPart, HitKind, LabelContainer, RunContext, SourceChain, TruthLabel};
use pileup_sim::{
    reference_digitization, Probe, RecordingSink, SampleConfig, SimHitStore, TofDigit, TofDigitizer,
};
use proptest::prelude::*;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const BACKGROUND_ENTRIES: u32 = 12;
const SIGNAL_ENTRIES: u32 = 4;

fn kind() -> HitKind {
    HitKind::new("TOFHit")
}

fn sources() -> SourceChain<SimHitStore> {
    let sample = |entries| SampleConfig {
        entries,
        mean_hits: 4.0,
        ..Default::default()
    };
    let mut chain = SourceChain::new();
    chain.add(SimHitStore::generate("bkg", kind(), 11, &sample(BACKGROUND_ENTRIES)).unwrap());
    chain.add(SimHitStore::generate("sig", kind(), 12, &sample(SIGNAL_ENTRIES)).unwrap());
    chain
}

fn stage(continuous: bool) -> DigitizerStage<SourceChain<SimHitStore>, Probe<TofDigitizer>> {
    let config = StageConfig::default()
        .with_signal_file("sig")
        .with_continuous(continuous);
    DigitizerStage::init(config, sources(), Probe::new(TofDigitizer::default())).unwrap()
}

fn emitted(sink: &RecordingSink) -> (Vec<TofDigit>, LabelContainer<TruthLabel>) {
    let digits = sink.decode(DIGITS_DESCRIPTION).unwrap().unwrap();
    let labels = sink.decode(LABELS_DESCRIPTION).unwrap().unwrap();
    (digits, labels)
}

// ---------------------------------------------------------------------------
// Proptest strategies
// ---------------------------------------------------------------------------

/// An event part; one id in eight points at a missing source.
fn arb_part() -> impl Strategy<Value = EventPart> {
    (0u32..8, 0..BACKGROUND_ENTRIES + 3).prop_map(|(selector, entry)| match selector {
        0..=4 => EventPart::new(0, entry),
        5 | 6 => EventPart::new(1, entry % (SIGNAL_ENTRIES + 1)),
        _ => EventPart::new(2, entry),
    })
}

/// A non-empty run context with strictly increasing bunch-crossing times.
fn arb_context() -> impl Strategy<Value = RunContext> {
    prop::collection::vec((1u32..40, prop::collection::vec(arb_part(), 0..4)), 1..8).prop_map(
        |collisions| {
            let mut context = RunContext::empty();
            let mut bc = 0u32;
            for (gap, parts) in collisions {
                bc += gap;
                context.push(f64::from(bc) * 25.0, parts);
            }
            context
        },
    )
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn digits_follow_context_order(context in arb_context(), continuous in any::<bool>()) {
        let mut stage = stage(continuous);
        let mut sink = RecordingSink::new();
        let mut control = RecordingSink::new();
        stage.process(&context, &mut sink, &mut control).unwrap();

        let (digits, labels) = emitted(&sink);
        let (ref_digits, ref_labels) =
            reference_digitization(&sources(), &kind(), &context, continuous).unwrap();
        prop_assert_eq!(digits, ref_digits);
        prop_assert_eq!(labels, ref_labels);

        let seen: Vec<(u32, u32, f64)> = stage
            .digitizer()
            .calls()
            .iter()
            .map(|c| (c.source_id, c.entry_id, c.time_ns))
            .collect();
        let expected: Vec<(u32, u32, f64)> = context
            .collisions()
            .flat_map(|(r, parts)| parts.iter().map(move |p| (p.source_id, p.entry_id, r.time_ns)))
            .collect();
        prop_assert_eq!(seen, expected);
    }

    #[test]
    fn every_part_is_counted(context in arb_context()) {
        let mut stage = stage(true);
        let mut sink = RecordingSink::new();
        let mut control = RecordingSink::new();
        let metrics = stage.process(&context, &mut sink, &mut control).unwrap().ran().unwrap();

        let misses = context
            .collisions()
            .flat_map(|(_, parts)| parts.iter())
            .filter(|p| match p.source_id {
                0 => p.entry_id >= BACKGROUND_ENTRIES,
                1 => p.entry_id >= SIGNAL_ENTRIES,
                _ => true,
            })
            .count();
        prop_assert_eq!(metrics.collisions, context.len());
        prop_assert_eq!(metrics.parts, context.part_count());
        prop_assert_eq!(metrics.retrieval_misses, misses);
        prop_assert_eq!(metrics.digits, stage.accumulator().len());
        prop_assert_eq!(metrics.labels, stage.accumulator().labels().n_elements());
    }

    #[test]
    fn later_deliveries_are_inert(context in arb_context(), repeats in 1usize..4) {
        let mut stage = stage(true);
        let mut sink = RecordingSink::new();
        let mut control = RecordingSink::new();
        stage.process(&context, &mut sink, &mut control).unwrap();
        let (digits, labels) = emitted(&sink);
        let calls = stage.digitizer().calls().len();

        for _ in 0..repeats {
            let outcome = stage.process(&context, &mut sink, &mut control).unwrap();
            prop_assert!(outcome.is_inert());
        }

        prop_assert_eq!(sink.emissions().len(), 2);
        prop_assert_eq!(control.quit_signals(), 1);
        prop_assert_eq!(stage.state(), GateState::Finished);
        prop_assert_eq!(stage.digitizer().calls().len(), calls);
        prop_assert_eq!(emitted(&sink), (digits, labels));
    }
}
