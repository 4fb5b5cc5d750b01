//! Dynamic difficulty: matching monster statblocks to party strength.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use sk_core::{Ability, CombatantId, Position};
use sk_mechanics::Combatant;

use crate::config::ScalingConfig;
use crate::statblock::MonsterStatblock;

/// Guards floors against products like `10 * 1.2 = 11.999...`.
const FLOOR_EPSILON: f64 = 1e-9;

fn floor(value: f64) -> f64 {
    (value + FLOOR_EPSILON).floor()
}

/// Diagnostics retained on every scaled monster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalingRecord {
    /// The clamped factor that was applied.
    pub factor: f64,
    /// Party power the factor was derived from (after any memory bias).
    pub party_power: f64,
    /// Base challenge of the unscaled statblock.
    pub base_challenge: f64,
    /// HP before scaling.
    pub original_hit_points: u32,
    /// AC before scaling.
    pub original_armor_class: i32,
    /// Saving throws before scaling.
    pub original_saving_throws: BTreeMap<Ability, i32>,
    /// When scaling happened.
    pub scaled_at: DateTime<Utc>,
}

/// A statblock after scaling, with its record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaledMonster {
    /// The adjusted statblock. Attacks carry `scaled_damage`.
    pub statblock: MonsterStatblock,
    /// How it was adjusted.
    pub record: ScalingRecord,
}

impl ScaledMonster {
    /// Build an enemy combatant from the scaled statblock.
    pub fn spawn(&self, id: impl Into<CombatantId>, position: Position) -> Combatant {
        self.statblock.spawn(id, position)
    }
}

/// Computes party power and base challenge and applies scaling.
#[derive(Debug, Clone, Default)]
pub struct ScalingEngine {
    config: ScalingConfig,
}

impl ScalingEngine {
    /// Create an engine with the given weights.
    pub fn new(config: ScalingConfig) -> Self {
        Self { config }
    }

    /// The weights in use.
    pub fn config(&self) -> &ScalingConfig {
        &self.config
    }

    /// Party strength: per member `level*2 + maxHP*0.2 + AC*0.5 +
    /// attack*1.5`, times a party size multiplier of `count/4` clamped to
    /// `[0.7, 1.5]`.
    pub fn party_power<'a>(&self, members: impl IntoIterator<Item = &'a Combatant>) -> f64 {
        let cfg = &self.config;
        let (sum, count) = members.into_iter().fold((0.0, 0usize), |(sum, count), m| {
            let score = m.level as f64 * cfg.level_weight
                + m.max_hit_points as f64 * cfg.hit_point_weight
                + m.armor_class as f64 * cfg.armor_class_weight
                + m.best_attack_bonus() as f64 * cfg.attack_bonus_weight;
            (sum + score, count + 1)
        });
        let size = (count as f64 / cfg.party_size_divisor)
            .clamp(cfg.min_size_multiplier, cfg.max_size_multiplier);
        sum * size
    }

    /// Monster strength: `hp*0.3 + ac*1.2 + avgDamagePerRound*2 +
    /// attack*1.5`.
    pub fn base_challenge(&self, monster: &MonsterStatblock) -> f64 {
        let cfg = &self.config;
        monster.hit_points as f64 * cfg.challenge_hit_point_weight
            + monster.armor_class as f64 * cfg.challenge_armor_class_weight
            + monster.average_damage_per_round() * cfg.challenge_damage_weight
            + monster.attack_bonus() as f64 * cfg.challenge_attack_bonus_weight
    }

    /// Clamped factor for a base challenge against a party power.
    ///
    /// A monster with no challenge at all gets the maximum factor.
    pub fn factor_for(&self, base_challenge: f64, party_power: f64) -> f64 {
        let cfg = &self.config;
        if base_challenge <= 0.0 {
            return cfg.max_factor;
        }
        let target = party_power * cfg.target_challenge_multiplier;
        (target / base_challenge).clamp(cfg.min_factor, cfg.max_factor)
    }

    /// Scale a statblock to a party power score.
    pub fn scale(&self, monster: &MonsterStatblock, party_power: f64) -> ScaledMonster {
        let cfg = &self.config;
        let base = self.base_challenge(monster);
        let factor = self.factor_for(base, party_power);
        let delta = factor - 1.0;

        let mut scaled = monster.clone();
        scaled.hit_points = (floor(monster.hit_points as f64 * factor) as u32).max(1);
        let ac_adjustment = floor(delta * cfg.armor_class_step) as i32;
        scaled.armor_class = (monster.armor_class + ac_adjustment).clamp(cfg.min_ac, cfg.max_ac);
        let save_adjustment = floor(delta * cfg.saving_throw_step) as i32;
        for bonus in scaled.saving_throws.values_mut() {
            *bonus += save_adjustment;
        }
        for attack in &mut scaled.attacks {
            let average = attack.damage.average().max(0.0);
            attack.scaled_damage = Some(floor(average * factor) as u32);
        }

        debug!(
            monster = %monster.id,
            party_power,
            base_challenge = base,
            factor,
            hit_points = scaled.hit_points,
            armor_class = scaled.armor_class,
            "monster scaled"
        );

        ScaledMonster {
            statblock: scaled,
            record: ScalingRecord {
                factor,
                party_power,
                base_challenge: base,
                original_hit_points: monster.hit_points,
                original_armor_class: monster.armor_class,
                original_saving_throws: monster.saving_throws.clone(),
                scaled_at: Utc::now(),
            },
        }
    }

    /// Scale a statblock against a party, with a multiplier on party power
    /// (the combat memory difficulty bias; 1.0 for none).
    pub fn scale_for_party<'a>(
        &self,
        monster: &MonsterStatblock,
        party: impl IntoIterator<Item = &'a Combatant>,
        bias: f64,
    ) -> ScaledMonster {
        let power = self.party_power(party) * bias;
        self.scale(monster, power)
    }
}
