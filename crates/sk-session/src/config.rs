use serde::{Deserialize, Serialize};

use sk_mechanics::RuleConfig;
use sk_monster::{AiConfig, ScalingConfig};

/// Configuration for a combat session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// RNG seed for reproducibility.
    pub seed: u64,
    /// Maximum events to retain in the log (0 = unlimited).
    pub max_events: usize,
    /// Attack, defend, flee, and range rules.
    pub rules: RuleConfig,
    /// Monster scaling weights and bounds.
    pub scaling: ScalingConfig,
    /// Monster AI tuning.
    pub ai: AiConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            max_events: 0,
            rules: RuleConfig::default(),
            scaling: ScalingConfig::default(),
            ai: AiConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Set the RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the maximum number of events to retain.
    pub fn with_max_events(mut self, max: usize) -> Self {
        self.max_events = max;
        self
    }

    /// Replace the rule configuration.
    pub fn with_rules(mut self, rules: RuleConfig) -> Self {
        self.rules = rules;
        self
    }

    /// Replace the scaling configuration.
    pub fn with_scaling(mut self, scaling: ScalingConfig) -> Self {
        self.scaling = scaling;
        self
    }

    /// Replace the AI configuration.
    pub fn with_ai(mut self, ai: AiConfig) -> Self {
        self.ai = ai;
        self
    }
}
