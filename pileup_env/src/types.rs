//! Common types exchanged across the digitization stage boundary.

use crate::error::EnvError;
use serde::{Deserialize, Serialize};

/// Identifies one simulated event inside one source sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventPart {
    /// Index into the configured hit sources (background = 0, signal = 1)
    pub source_id: u32,

    /// Entry (event) number inside that source
    pub entry_id: u32,
}

impl EventPart {
    /// Creates a new event part.
    pub fn new(source_id: u32, entry_id: u32) -> Self {
        Self { source_id, entry_id }
    }
}

impl std::fmt::Display for EventPart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "src{}/entry{}", self.source_id, self.entry_id)
    }
}

/// One readout window (interaction record) with its collision time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InteractionRecord {
    /// Collision time in nanoseconds since the start of the timeframe
    pub time_ns: f64,
}

impl InteractionRecord {
    pub fn new(time_ns: f64) -> Self {
        Self { time_ns }
    }
}

/// Ordered description of the collisions of one timeframe and the event parts
/// contributing to each of them.
///
/// `parts[i]` belongs to `records[i]`; both sequences are kept in the order
/// they were given.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "RawRunContext")]
pub struct RunContext {
    records: Vec<InteractionRecord>,
    parts: Vec<Vec<EventPart>>,
}

#[derive(Deserialize)]
struct RawRunContext {
    records: Vec<InteractionRecord>,
    parts: Vec<Vec<EventPart>>,
}

impl TryFrom<RawRunContext> for RunContext {
    type Error = EnvError;

    fn try_from(raw: RawRunContext) -> Result<Self, Self::Error> {
        RunContext::new(raw.records, raw.parts)
    }
}

impl RunContext {
    /// Creates a run context, checking that every record has a part list.
    pub fn new(
        records: Vec<InteractionRecord>,
        parts: Vec<Vec<EventPart>>,
    ) -> Result<Self, EnvError> {
        if records.len() != parts.len() {
            return Err(EnvError::MalformedContext(format!(
                "{} interaction records but {} event part lists",
                records.len(),
                parts.len()
            )));
        }
        Ok(Self { records, parts })
    }

    /// Creates a context without collisions.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Appends one collision with its event parts.
    pub fn push(&mut self, time_ns: f64, parts: Vec<EventPart>) {
        self.records.push(InteractionRecord::new(time_ns));
        self.parts.push(parts);
    }

    /// Returns the interaction records in order.
    pub fn records(&self) -> &[InteractionRecord] {
        &self.records
    }

    /// Returns the event parts of collision `index`.
    pub fn parts(&self, index: usize) -> &[EventPart] {
        self.parts.get(index).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Iterates collisions in order as `(record, parts)` pairs.
    pub fn collisions(&self) -> impl Iterator<Item = (&InteractionRecord, &[EventPart])> {
        self.records
            .iter()
            .zip(self.parts.iter().map(Vec::as_slice))
    }

    /// Number of collisions.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when there are no collisions.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Total number of event parts over all collisions.
    pub fn part_count(&self) -> usize {
        self.parts.iter().map(Vec::len).sum()
    }
}

/// Name of a hit collection inside a hit source (e.g. `TOFHit`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HitKind(pub String);

impl HitKind {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for HitKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// How long a data product stays valid downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Lifetime {
    /// Valid for the current timeframe only
    Timeframe,
    /// Valid until the end of the run
    Condition,
}

/// Routing header of a message travelling between pipeline stages.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DataHeader {
    /// Detector or subsystem that produced the data (e.g. `TOF`, `SIM`)
    pub origin: String,

    /// Data description (e.g. `DIGITS`)
    pub description: String,

    /// Sub-specification, used to address one channel of a stage
    pub sub_spec: u32,
}

impl DataHeader {
    pub fn new(origin: impl Into<String>, description: impl Into<String>, sub_spec: u32) -> Self {
        Self {
            origin: origin.into(),
            description: description.into(),
            sub_spec,
        }
    }
}

impl std::fmt::Display for DataHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.origin, self.description, self.sub_spec)
    }
}

/// Tag attached to an emitted data product.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Output {
    pub header: DataHeader,
    pub lifetime: Lifetime,
}

impl Output {
    /// Creates a timeframe-scoped output tag.
    pub fn timeframe(origin: impl Into<String>, description: impl Into<String>, sub_spec: u32) -> Self {
        Self {
            header: DataHeader::new(origin, description, sub_spec),
            lifetime: Lifetime::Timeframe,
        }
    }
}

impl std::fmt::Display for Output {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({:?})", self.header, self.lifetime)
    }
}

/// Monte-Carlo truth label linking a digit to the simulated particle that
/// produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TruthLabel {
    /// Track number inside the simulated event
    pub track_id: i32,

    /// Entry (event) number inside the source
    pub event_id: u32,

    /// Source sample the event came from
    pub source_id: u32,

    /// Set when the digit is noise rather than a real contribution
    pub fake: bool,
}

impl TruthLabel {
    pub fn new(track_id: i32, event_id: u32, source_id: u32) -> Self {
        Self {
            track_id,
            event_id,
            source_id,
            fake: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_run_context_rejects_mismatched_parts() {
        let records = vec![InteractionRecord::new(100.0), InteractionRecord::new(250.0)];
        let parts = vec![vec![EventPart::new(0, 5)]];

        let err = RunContext::new(records, parts).unwrap_err();
        assert!(matches!(err, EnvError::MalformedContext(_)));
    }

    #[test]
    fn test_run_context_preserves_order() {
        let mut ctx = RunContext::empty();
        ctx.push(250.0, vec![EventPart::new(0, 6), EventPart::new(1, 2)]);
        ctx.push(100.0, vec![EventPart::new(0, 5)]);

        let times: Vec<f64> = ctx.records().iter().map(|r| r.time_ns).collect();
        assert_eq!(times, vec![250.0, 100.0]);
        assert_eq!(ctx.parts(0), &[EventPart::new(0, 6), EventPart::new(1, 2)]);
        assert_eq!(ctx.part_count(), 3);
        assert!(ctx.parts(7).is_empty());
    }

    #[test]
    fn test_run_context_json_validation() {
        let good = r#"{"records":[{"time_ns":100.5}],"parts":[[{"source_id":0,"entry_id":5}]]}"#;
        let ctx: RunContext = serde_json::from_str(good).unwrap();
        assert_eq!(ctx.len(), 1);
        assert_relative_eq!(ctx.records()[0].time_ns, 100.5);

        let bad = r#"{"records":[{"time_ns":100.0}],"parts":[]}"#;
        assert!(serde_json::from_str::<RunContext>(bad).is_err());
    }

    #[test]
    fn test_output_display() {
        let out = Output::timeframe("TOF", "DIGITS", 0);
        assert_eq!(out.to_string(), "TOF/DIGITS/0 (Timeframe)");

        let calib = Output {
            lifetime: Lifetime::Condition,
            ..Output::timeframe("TOF", "CALIB", 1)
        };
        assert_eq!(calib.to_string(), "TOF/CALIB/1 (Condition)");
        assert_ne!(calib.lifetime, out.lifetime);
    }
}
