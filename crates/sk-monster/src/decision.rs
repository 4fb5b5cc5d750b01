//! Per-turn action choice for monsters.
//!
//! A turn decision runs in three steps: a flee check, priority scoring of
//! the four action kinds, then an intelligence-weighted pick and a target.

use std::fmt;

use rand::Rng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use sk_core::CombatantId;
use sk_mechanics::Combatant;
use sk_mechanics::combatant::SPELLCASTER_TAG;

use crate::battlefield::BattlefieldAnalysis;
use crate::config::AiConfig;
use crate::profile::{MonsterAiProfile, SelfPreservation, TacticalLevel};

/// The four things a monster can do with its turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AiActionKind {
    /// Attack an enemy, moving first if needed.
    Attack,
    /// Move toward (or away from) an enemy.
    Move,
    /// Use a special ability on an enemy.
    Special,
    /// Take the defend action.
    Defend,
}

impl AiActionKind {
    /// All kinds in scoring order.
    pub fn all() -> [AiActionKind; 4] {
        [Self::Attack, Self::Move, Self::Special, Self::Defend]
    }

    /// Key used for tactic learning.
    pub fn tactic_key(self) -> &'static str {
        match self {
            Self::Attack => "attack",
            Self::Move => "move",
            Self::Special => "special",
            Self::Defend => "defend",
        }
    }
}

impl fmt::Display for AiActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tactic_key())
    }
}

/// An action kind with its computed priority.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoredAction {
    /// Which action.
    pub kind: AiActionKind,
    /// Higher is more attractive. Zero means unavailable.
    pub priority: f64,
}

/// What a monster decided to do this turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AiDecision {
    /// Attempt to flee the fight.
    Flee,
    /// Take an action, optionally aimed at a target.
    Act {
        /// The chosen action.
        action: AiActionKind,
        /// The target enemy, if the action has one.
        target: Option<CombatantId>,
    },
}

/// Chooses monster actions.
#[derive(Debug, Clone, Default)]
pub struct DecisionEngine {
    config: AiConfig,
}

impl DecisionEngine {
    /// Create an engine with the given tuning.
    pub fn new(config: AiConfig) -> Self {
        Self { config }
    }

    /// The tuning in use.
    pub fn config(&self) -> &AiConfig {
        &self.config
    }

    /// Chance to flee at a given health fraction, before the threshold check.
    ///
    /// `base + (1 - health) * slope`, scaled by self-preservation, shifted by
    /// tactical level, clamped to `[0, max]`.
    pub fn flee_probability(&self, profile: &MonsterAiProfile, health_fraction: f64) -> f64 {
        let cfg = &self.config;
        if profile.self_preservation == SelfPreservation::Reckless {
            return 0.0;
        }
        let mut chance = cfg.base_flee_chance + (1.0 - health_fraction) * cfg.flee_hp_slope;
        chance *= profile.self_preservation.flee_multiplier();
        chance += match profile.tactical_level {
            TacticalLevel::Genius => 0.1,
            TacticalLevel::High => 0.05,
            TacticalLevel::Instinctive => -0.05,
            TacticalLevel::Basic | TacticalLevel::Moderate => 0.0,
        };
        chance.clamp(0.0, cfg.max_flee_chance)
    }

    /// Roll the flee check for a monster.
    pub fn wants_to_flee(
        &self,
        profile: &MonsterAiProfile,
        actor: &Combatant,
        rng: &mut StdRng,
    ) -> bool {
        let health = actor.health_fraction();
        if health > profile.flee_threshold
            || profile.self_preservation == SelfPreservation::Reckless
        {
            return false;
        }
        let chance = self.flee_probability(profile, health);
        let flees = rng.random_bool(chance);
        debug!(monster = %actor.id, health, chance, flees, "flee check");
        flees
    }

    /// Score every action kind, highest first.
    ///
    /// `target_in_reach` says whether any enemy can be attacked this turn.
    pub fn score_actions(
        &self,
        profile: &MonsterAiProfile,
        actor: &Combatant,
        analysis: &BattlefieldAnalysis,
        target_in_reach: bool,
    ) -> Vec<ScoredAction> {
        let cfg = &self.config;
        let mut attack = cfg.attack_priority * (0.5 + profile.aggression);
        let mut movement = cfg.move_priority;
        let mut special = if profile.has_specials() {
            cfg.special_priority
        } else {
            0.0
        };
        let mut defend = cfg.defend_priority;

        if !target_in_reach {
            movement += cfg.attack_priority * 0.8;
            attack *= 0.5;
            special = 0.0;
        }

        match profile.tactical_level {
            TacticalLevel::Genius => {
                if analysis.has_near_death_enemy() {
                    attack += 5.0;
                }
                if analysis.outnumbered() {
                    defend += 4.0;
                }
                if analysis.ally_health < 0.5 {
                    defend += 2.0;
                }
                special *= 1.3;
            }
            TacticalLevel::High => {
                if analysis.has_near_death_enemy() {
                    attack += 3.0;
                }
                if analysis.outnumbered() {
                    defend += 2.0;
                }
            }
            TacticalLevel::Moderate => {
                if actor.health_fraction() < 0.5 {
                    defend += 2.0;
                }
            }
            TacticalLevel::Basic => {}
            TacticalLevel::Instinctive => {
                attack += 2.0;
                defend *= 0.5;
            }
        }

        let mut scored: Vec<ScoredAction> = AiActionKind::all()
            .into_iter()
            .map(|kind| {
                let base = match kind {
                    AiActionKind::Attack => attack,
                    AiActionKind::Move => movement,
                    AiActionKind::Special => special,
                    AiActionKind::Defend => defend,
                };
                ScoredAction {
                    kind,
                    priority: base
                        * profile.learning_multiplier(kind.tactic_key(), cfg.learning_min_uses),
                }
            })
            .collect();
        scored.sort_by(|a, b| b.priority.total_cmp(&a.priority));

        debug!(
            monster = %actor.id,
            level = %profile.tactical_level,
            ?scored,
            "actions scored"
        );
        scored
    }

    /// Chance of picking among the top three instead of the best:
    /// `max(floor, (15 - INT) / 20)`.
    pub fn randomness(&self, profile: &MonsterAiProfile) -> f64 {
        let inverse = (15 - profile.intelligence) as f64 / 20.0;
        inverse.max(self.config.randomness_floor).clamp(0.0, 1.0)
    }

    /// Pick an action from a sorted score list.
    pub fn pick_action(
        &self,
        profile: &MonsterAiProfile,
        scored: &[ScoredAction],
        rng: &mut StdRng,
    ) -> AiActionKind {
        let available: Vec<&ScoredAction> = scored.iter().filter(|s| s.priority > 0.0).collect();
        let Some(best) = available.first() else {
            return AiActionKind::Defend;
        };
        if rng.random_bool(self.randomness(profile)) {
            let top = available.len().min(3);
            return available[rng.random_range(0..top)].kind;
        }
        best.kind
    }

    /// Choose a target among candidate enemies.
    ///
    /// Smart monsters prefer near-death enemies, then spellcasters, then the
    /// lowest HP. Others pick at random.
    pub fn select_target(
        &self,
        profile: &MonsterAiProfile,
        candidates: &[&Combatant],
        rng: &mut StdRng,
    ) -> Option<CombatantId> {
        if candidates.is_empty() {
            return None;
        }
        if !profile.tactical_level.is_smart() {
            let pick = candidates[rng.random_range(0..candidates.len())];
            return Some(pick.id.clone());
        }

        let threshold = self.config.near_death_threshold;
        let pool = || candidates.iter().copied();
        weakest(pool().filter(|c| c.health_fraction() <= threshold))
            .or_else(|| weakest(pool().filter(|c| c.has_tag(SPELLCASTER_TAG))))
            .or_else(|| weakest(pool()))
    }

    /// Decide a monster's turn.
    ///
    /// `combatants` is everyone in the fight; `in_reach` lists enemies the
    /// actor could attack this turn.
    pub fn choose_action(
        &self,
        profile: &MonsterAiProfile,
        actor: &Combatant,
        combatants: &[&Combatant],
        in_reach: &[CombatantId],
        rng: &mut StdRng,
    ) -> AiDecision {
        if self.wants_to_flee(profile, actor, rng) {
            return AiDecision::Flee;
        }

        let enemies: Vec<&Combatant> = combatants
            .iter()
            .copied()
            .filter(|c| c.is_living() && c.is_hostile_to(actor))
            .collect();
        if enemies.is_empty() {
            return AiDecision::Act {
                action: AiActionKind::Defend,
                target: None,
            };
        }

        let reachable: Vec<&Combatant> = enemies
            .iter()
            .copied()
            .filter(|e| in_reach.contains(&e.id))
            .collect();

        let analysis = BattlefieldAnalysis::analyze(
            actor,
            combatants.iter().copied(),
            self.config.near_death_threshold,
        );
        let scored = self.score_actions(profile, actor, &analysis, !reachable.is_empty());
        let action = self.pick_action(profile, &scored, rng);

        let target = match action {
            AiActionKind::Defend => None,
            AiActionKind::Attack | AiActionKind::Special if !reachable.is_empty() => {
                self.select_target(profile, &reachable, rng)
            }
            _ => self.select_target(profile, &enemies, rng),
        };

        debug!(monster = %actor.id, %action, target = ?target, "decision");
        AiDecision::Act { action, target }
    }
}

fn weakest<'a>(pool: impl Iterator<Item = &'a Combatant>) -> Option<CombatantId> {
    pool.min_by(|a, b| {
        a.hit_points
            .cmp(&b.hit_points)
            .then_with(|| a.id.cmp(&b.id))
    })
    .map(|c| c.id.clone())
}
