//! Description of the stage as seen by the surrounding pipeline.

use crate::config::{StageConfig, DEFAULT_SIM_FILE};
use pileup_env::{DataHeader, Lifetime, Output};
use serde::{Deserialize, Serialize};

/// Binding name of the run-context input.
pub const CONTEXT_BINDING: &str = "collisioncontext";

/// Output description for merged digits.
pub const DIGITS_DESCRIPTION: &str = "DIGITS";

/// Output description for merged truth labels.
pub const LABELS_DESCRIPTION: &str = "DIGITSMCTR";

/// One input of a processor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputSpec {
    pub binding: String,
    pub header: DataHeader,
    pub lifetime: Lifetime,
}

impl InputSpec {
    /// Returns true if a message carrying `header` is routed to this input.
    pub fn matches(&self, header: &DataHeader) -> bool {
        self.header == *header
    }
}

/// One command-line option understood by a processor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionSpec {
    pub name: String,
    pub default: String,
    pub help: String,
}

/// Name, inputs, outputs and options of a digitizer stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessorSpec {
    pub name: String,
    pub inputs: Vec<InputSpec>,
    pub outputs: Vec<Output>,
    pub options: Vec<OptionSpec>,
}

impl ProcessorSpec {
    /// Describes the digitizer stage for `config`.
    ///
    /// The run context is read from `SIM/COLLISIONCONTEXT` addressed to the
    /// configured channel; digits and labels go out with sub-spec 0.
    pub fn describe(config: &StageConfig) -> Self {
        Self {
            name: format!("{}Digitizer", config.origin),
            inputs: vec![InputSpec {
                binding: CONTEXT_BINDING.to_string(),
                header: DataHeader::new("SIM", "COLLISIONCONTEXT", config.channel),
                lifetime: Lifetime::Timeframe,
            }],
            outputs: vec![
                Output::timeframe(config.origin.clone(), DIGITS_DESCRIPTION, 0),
                Output::timeframe(config.origin.clone(), LABELS_DESCRIPTION, 0),
            ],
            options: vec![
                OptionSpec {
                    name: "simFile".to_string(),
                    default: DEFAULT_SIM_FILE.to_string(),
                    help: "Sim (background) input filename".to_string(),
                },
                OptionSpec {
                    name: "simFileS".to_string(),
                    default: String::new(),
                    help: "Sim (signal) input filename".to_string(),
                },
            ],
        }
    }

    /// Returns the binding of the input accepting `header`, if any.
    pub fn accepts(&self, header: &DataHeader) -> Option<&str> {
        self.inputs
            .iter()
            .find(|input| input.matches(header))
            .map(|input| input.binding.as_str())
    }

    /// Looks up an option by name.
    pub fn option(&self, name: &str) -> Option<&OptionSpec> {
        self.options.iter().find(|o| o.name == name)
    }
}
