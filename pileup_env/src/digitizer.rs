//! Digitization engine abstraction.

use crate::error::EnvError;
use crate::labels::LabelContainer;

/// A stateful detector digitizer.
///
/// The engine holds the current time and event context; `process` turns one
/// hit set into digits and their truth labels under that context.
///
/// # Call sequence
///
/// ```text
/// init() → set_continuous(..)            once, before the pass
/// set_event_time(t)                      per collision
///   set_event_context(src, entry)        per event part
///   process(hits, digits, labels)        per event part
/// ```
///
/// # Determinism
///
/// Identical `(hits, time, source, entry)` inputs must produce identical
/// digits and labels.
pub trait DigitizerEngine {
    /// Detector-specific hit record consumed by the engine
    type Hit;

    /// Detector-specific digit produced by the engine
    type Digit;

    /// Truth label attached to digits
    type Label;

    /// One-time setup before the first event.
    fn init(&mut self) -> Result<(), EnvError>;

    /// Selects continuous (true) or triggered (false) readout.
    fn set_continuous(&mut self, continuous: bool);

    /// Sets the time of the current collision in nanoseconds.
    fn set_event_time(&mut self, time_ns: f64);

    /// Sets the source sample and entry of the current event part.
    fn set_event_context(&mut self, source_id: u32, entry_id: u32);

    /// Digitizes `hits`, appending to `digits` and `labels`.
    ///
    /// Label digit indices are relative to the start of `digits`, which the
    /// caller hands over empty. Either no labels are added or the last digit
    /// is labelled: label containers are merged at the back, so a trailing
    /// unlabelled digit would shift the labels of every later part.
    fn process(
        &mut self,
        hits: &[Self::Hit],
        digits: &mut Vec<Self::Digit>,
        labels: &mut LabelContainer<Self::Label>,
    ) -> Result<(), EnvError>;
}
