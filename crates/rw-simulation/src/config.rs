use serde::{Deserialize, Serialize};

/// Default local-time cost of a single action.
pub const DEFAULT_ACTION_COST: u64 = 100;

/// Configuration for a simulation run.
///
/// Every field has a default, so a partial JSON document is a valid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// RNG seed for deterministic simulation.
    pub seed: u64,
    /// Local-time cost of one action. Never zero.
    pub action_cost: u64,
    /// Maximum event log size (oldest events dropped when exceeded). 0 = unlimited.
    pub max_events: usize,
    /// Propagate script errors out of the tick instead of logging them and
    /// clearing the failing script.
    pub strict_scripts: bool,
    /// Chebyshev radius around the player that counts as an encounter.
    pub encounter_radius: u32,
    /// Node expansion cap for searches made by built-in behaviors.
    pub max_path_expansions: Option<usize>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            action_cost: DEFAULT_ACTION_COST,
            max_events: 0,
            strict_scripts: false,
            encounter_radius: 1,
            max_path_expansions: None,
        }
    }
}

impl SimConfig {
    /// Set the RNG seed for deterministic simulation.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the cost of one action (clamped to at least 1).
    pub fn with_action_cost(mut self, cost: u64) -> Self {
        self.action_cost = cost.max(1);
        self
    }

    /// Set the maximum event log size (0 = unlimited).
    pub fn with_max_events(mut self, max: usize) -> Self {
        self.max_events = max;
        self
    }

    /// Make script errors abort the tick.
    pub fn with_strict_scripts(mut self, strict: bool) -> Self {
        self.strict_scripts = strict;
        self
    }

    /// Set the Chebyshev radius for encounters.
    pub fn with_encounter_radius(mut self, radius: u32) -> Self {
        self.encounter_radius = radius;
        self
    }

    /// Cap node expansions for behavior path searches.
    pub fn with_max_path_expansions(mut self, limit: Option<usize>) -> Self {
        self.max_path_expansions = limit;
        self
    }

    /// Parse a config from JSON, filling missing fields with defaults.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        let mut config: Self = serde_json::from_str(json)?;
        config.action_cost = config.action_cost.max(1);
        Ok(config)
    }
}
