//! Tunable combat rules.

use serde::{Deserialize, Serialize};

/// Rule constants for attack resolution and turn actions.
///
/// Defaults follow the simplified model: no critical rule, +2 AC while
/// defending, DC 10 to flee, 60 ft ranged reach on 5 ft squares.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleConfig {
    /// Natural 20 always hits (and doubles damage dice), natural 1 always misses.
    pub critical_hits: bool,
    /// Effective AC bonus granted by the `Defending` status.
    pub defend_ac_bonus: i32,
    /// d20 target to successfully flee.
    pub flee_dc: u32,
    /// Radius, in squares, of ranged attack coverage.
    pub ranged_radius_squares: u32,
    /// Feet per grid square.
    pub feet_per_square: u32,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            critical_hits: false,
            defend_ac_bonus: 2,
            flee_dc: 10,
            ranged_radius_squares: 12,
            feet_per_square: 5,
        }
    }
}

impl RuleConfig {
    /// Enable or disable the natural 20 / natural 1 rule.
    pub fn with_critical_hits(mut self, enabled: bool) -> Self {
        self.critical_hits = enabled;
        self
    }

    /// Set the flee DC.
    pub fn with_flee_dc(mut self, dc: u32) -> Self {
        self.flee_dc = dc;
        self
    }

    /// Set the ranged radius in squares.
    pub fn with_ranged_radius(mut self, squares: u32) -> Self {
        self.ranged_radius_squares = squares;
        self
    }

    /// Set the defend AC bonus.
    pub fn with_defend_bonus(mut self, bonus: i32) -> Self {
        self.defend_ac_bonus = bonus;
        self
    }
}
