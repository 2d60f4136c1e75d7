//! Recording doubles for the stage boundary.
//!
//! `RecordingSink` stands in for the pipeline's output channel and control
//! service; `Probe` wraps a digitizer and logs the context of every call.

use pileup_env::{ControlService, DigitizerEngine, EnvError, LabelContainer, Output, OutputSink};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// One data product handed to the sink.
#[derive(Debug, Clone, PartialEq)]
pub struct Emission {
    pub output: Output,
    pub payload: serde_json::Value,
}

/// Output sink and control service that remembers everything it receives.
#[derive(Debug, Default)]
pub struct RecordingSink {
    emissions: Vec<Emission>,
    quit_signals: usize,
    closed: bool,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every following snapshot fail.
    pub fn close(&mut self) {
        self.closed = true;
    }

    pub fn emissions(&self) -> &[Emission] {
        &self.emissions
    }

    /// Number of ready-to-quit notifications received.
    pub fn quit_signals(&self) -> usize {
        self.quit_signals
    }

    /// Decodes the last product emitted with `description`.
    pub fn decode<T: DeserializeOwned>(&self, description: &str) -> Result<Option<T>, EnvError> {
        self.emissions
            .iter()
            .rev()
            .find(|e| e.output.header.description == description)
            .map(|e| serde_json::from_value(e.payload.clone()))
            .transpose()
            .map_err(EnvError::from)
    }
}

impl OutputSink for RecordingSink {
    fn snapshot<T>(&mut self, output: &Output, payload: &T) -> Result<(), EnvError>
    where
        T: Serialize + ?Sized,
    {
        if self.closed {
            return Err(EnvError::output(format!("{} is closed", output.header)));
        }
        self.emissions.push(Emission {
            output: output.clone(),
            payload: serde_json::to_value(payload)?,
        });
        Ok(())
    }
}

impl ControlService for RecordingSink {
    fn ready_to_quit(&mut self, _all: bool) {
        self.quit_signals += 1;
    }
}

/// Context under which the wrapped digitizer was invoked.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessCall {
    pub source_id: u32,
    pub entry_id: u32,
    pub time_ns: f64,
    pub hits: usize,
}

/// Digitizer wrapper recording the context of every `process` call.
#[derive(Debug, Default)]
pub struct Probe<E> {
    inner: E,
    time_ns: f64,
    context: (u32, u32),
    calls: Vec<ProcessCall>,
}

impl<E> Probe<E> {
    pub fn new(inner: E) -> Self {
        Self {
            inner,
            time_ns: 0.0,
            context: (0, 0),
            calls: Vec::new(),
        }
    }

    /// Calls in invocation order.
    pub fn calls(&self) -> &[ProcessCall] {
        &self.calls
    }

    pub fn inner(&self) -> &E {
        &self.inner
    }
}

impl<E: DigitizerEngine> DigitizerEngine for Probe<E> {
    type Hit = E::Hit;
    type Digit = E::Digit;
    type Label = E::Label;

    fn init(&mut self) -> Result<(), EnvError> {
        self.inner.init()
    }

    fn set_continuous(&mut self, continuous: bool) {
        self.inner.set_continuous(continuous);
    }

    fn set_event_time(&mut self, time_ns: f64) {
        self.time_ns = time_ns;
        self.inner.set_event_time(time_ns);
    }

    fn set_event_context(&mut self, source_id: u32, entry_id: u32) {
        self.context = (source_id, entry_id);
        self.inner.set_event_context(source_id, entry_id);
    }

    fn process(
        &mut self,
        hits: &[Self::Hit],
        digits: &mut Vec<Self::Digit>,
        labels: &mut LabelContainer<Self::Label>,
    ) -> Result<(), EnvError> {
        self.calls.push(ProcessCall {
            source_id: self.context.0,
            entry_id: self.context.1,
            time_ns: self.time_ns,
            hits: hits.len(),
        });
        self.inner.process(hits, digits, labels)
    }
}
