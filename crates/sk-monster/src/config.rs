//! Tunable constants for scaling and monster AI.

use serde::{Deserialize, Serialize};

/// Weights and bounds for party power, base challenge, and scaling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScalingConfig {
    /// Fraction of party power a monster should match.
    pub target_challenge_multiplier: f64,
    /// Lowest scaling factor.
    pub min_factor: f64,
    /// Highest scaling factor.
    pub max_factor: f64,
    /// Lowest AC after scaling.
    pub min_ac: i32,
    /// Highest AC after scaling.
    pub max_ac: i32,
    /// Party size that counts as "normal" (size multiplier 1.0).
    pub party_size_divisor: f64,
    /// Lower clamp on the party size multiplier.
    pub min_size_multiplier: f64,
    /// Upper clamp on the party size multiplier.
    pub max_size_multiplier: f64,
    /// Party power per character level.
    pub level_weight: f64,
    /// Party power per max HP.
    pub hit_point_weight: f64,
    /// Party power per point of AC.
    pub armor_class_weight: f64,
    /// Party power per point of attack bonus.
    pub attack_bonus_weight: f64,
    /// Challenge per monster HP.
    pub challenge_hit_point_weight: f64,
    /// Challenge per point of monster AC.
    pub challenge_armor_class_weight: f64,
    /// Challenge per point of average damage per round.
    pub challenge_damage_weight: f64,
    /// Challenge per point of monster attack bonus.
    pub challenge_attack_bonus_weight: f64,
    /// AC change per unit of `factor - 1`.
    pub armor_class_step: f64,
    /// Saving throw change per unit of `factor - 1`.
    pub saving_throw_step: f64,
}

impl Default for ScalingConfig {
    fn default() -> Self {
        Self {
            target_challenge_multiplier: 0.8,
            min_factor: 0.5,
            max_factor: 2.0,
            min_ac: 8,
            max_ac: 22,
            party_size_divisor: 4.0,
            min_size_multiplier: 0.7,
            max_size_multiplier: 1.5,
            level_weight: 2.0,
            hit_point_weight: 0.2,
            armor_class_weight: 0.5,
            attack_bonus_weight: 1.5,
            challenge_hit_point_weight: 0.3,
            challenge_armor_class_weight: 1.2,
            challenge_damage_weight: 2.0,
            challenge_attack_bonus_weight: 1.5,
            armor_class_step: 2.0,
            saving_throw_step: 3.0,
        }
    }
}

impl ScalingConfig {
    /// Set the target challenge multiplier.
    pub fn with_target_multiplier(mut self, multiplier: f64) -> Self {
        self.target_challenge_multiplier = multiplier;
        self
    }

    /// Set the factor bounds.
    pub fn with_factor_bounds(mut self, min: f64, max: f64) -> Self {
        self.min_factor = min;
        self.max_factor = max;
        self
    }
}

/// Base priorities and probabilities for monster decisions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    /// Flee chance at the flee threshold before any adjustment.
    pub base_flee_chance: f64,
    /// Extra flee chance per unit of missing health fraction.
    pub flee_hp_slope: f64,
    /// Upper bound on flee chance.
    pub max_flee_chance: f64,
    /// Base priority of attacking.
    pub attack_priority: f64,
    /// Base priority of moving.
    pub move_priority: f64,
    /// Base priority of a special ability.
    pub special_priority: f64,
    /// Base priority of defending.
    pub defend_priority: f64,
    /// Minimum chance to pick randomly among the top three actions.
    pub randomness_floor: f64,
    /// Health fraction at or below which an enemy counts as near death.
    pub near_death_threshold: f64,
    /// Uses of a tactic before its success rate affects priorities.
    pub learning_min_uses: u32,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            base_flee_chance: 0.10,
            flee_hp_slope: 0.5,
            max_flee_chance: 0.8,
            attack_priority: 10.0,
            move_priority: 5.0,
            special_priority: 6.0,
            defend_priority: 3.0,
            randomness_floor: 0.1,
            near_death_threshold: 0.25,
            learning_min_uses: 3,
        }
    }
}

impl AiConfig {
    /// Set the base flee chance.
    pub fn with_base_flee_chance(mut self, chance: f64) -> Self {
        self.base_flee_chance = chance;
        self
    }

    /// Set the randomness floor (0 disables randomness for smart monsters).
    pub fn with_randomness_floor(mut self, floor: f64) -> Self {
        self.randomness_floor = floor;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scaling_defaults() {
        let cfg = ScalingConfig::default();
        assert!((cfg.target_challenge_multiplier - 0.8).abs() < f64::EPSILON);
        assert!((cfg.min_factor - 0.5).abs() < f64::EPSILON);
        assert!((cfg.max_factor - 2.0).abs() < f64::EPSILON);
        assert_eq!((cfg.min_ac, cfg.max_ac), (8, 22));
    }

    #[test]
    fn ai_defaults() {
        let cfg = AiConfig::default();
        assert!((cfg.base_flee_chance - 0.10).abs() < f64::EPSILON);
        assert!((cfg.max_flee_chance - 0.8).abs() < f64::EPSILON);
        assert!((cfg.randomness_floor - 0.1).abs() < f64::EPSILON);
    }

    #[test]
    fn partial_override() {
        let cfg: AiConfig = serde_json::from_str(r#"{"attack_priority": 20.0}"#).unwrap();
        assert!((cfg.attack_priority - 20.0).abs() < f64::EPSILON);
        assert_eq!(cfg.learning_min_uses, 3);

        let cfg = ScalingConfig::default()
            .with_target_multiplier(1.0)
            .with_factor_bounds(0.25, 3.0);
        assert!((cfg.max_factor - 3.0).abs() < f64::EPSILON);
    }
}
