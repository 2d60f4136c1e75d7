//! Deterministic merge scenarios.

/// Scenario identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioId {
    /// Two collisions, the second one overlaying background and signal
    TwoCollisions,

    /// Seeded timeframe with Poisson pileup and periodic signal overlay
    Pileup,

    /// Signal source without the hit collection; every signal part misses
    MissingSignal,

    /// Empty run context followed by a real one
    EmptyContext,

    /// The same run context delivered several times
    RepeatedDelivery,
}

impl ScenarioId {
    /// Returns a list of all scenarios.
    pub fn all() -> Vec<ScenarioId> {
        vec![
            ScenarioId::TwoCollisions,
            ScenarioId::Pileup,
            ScenarioId::MissingSignal,
            ScenarioId::EmptyContext,
            ScenarioId::RepeatedDelivery,
        ]
    }

    /// Returns the scenario name.
    pub fn name(&self) -> &'static str {
        match self {
            ScenarioId::TwoCollisions => "two_collisions",
            ScenarioId::Pileup => "pileup",
            ScenarioId::MissingSignal => "missing_signal",
            ScenarioId::EmptyContext => "empty_context",
            ScenarioId::RepeatedDelivery => "repeated_delivery",
        }
    }

    /// Returns a description of the scenario.
    pub fn description(&self) -> &'static str {
        match self {
            ScenarioId::TwoCollisions => "(0,5)@100ns then (0,6)+(1,2)@250ns, one emission",
            ScenarioId::Pileup => "seeded pileup timeframe, order and label laws hold",
            ScenarioId::MissingSignal => "signal source lacks hits, misses counted, pass completes",
            ScenarioId::EmptyContext => "empty context is a no-op, the next context is merged",
            ScenarioId::RepeatedDelivery => "context delivered three times, emitted once",
        }
    }
}

impl std::fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for ScenarioId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "two_collisions" | "twocollisions" => Ok(ScenarioId::TwoCollisions),
            "pileup" => Ok(ScenarioId::Pileup),
            "missing_signal" | "missingsignal" => Ok(ScenarioId::MissingSignal),
            "empty_context" | "emptycontext" => Ok(ScenarioId::EmptyContext),
            "repeated_delivery" | "repeateddelivery" => Ok(ScenarioId::RepeatedDelivery),
            _ => Err(format!("Unknown scenario: {}", s)),
        }
    }
}
