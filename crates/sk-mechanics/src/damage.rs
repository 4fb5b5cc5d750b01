//! Attack resolution and HP mutation.

use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use sk_core::{CombatantId, DurationRule, Side, StatusKind};

use crate::combatant::{Attack, Combatant};
use crate::dice::roll_d20;
use crate::error::MechResult;
use crate::rules::RuleConfig;

/// The result of one attack roll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackOutcome {
    /// Who attacked.
    pub attacker: CombatantId,
    /// Who was attacked.
    pub target: CombatantId,
    /// Name of the attack used.
    pub attack: String,
    /// The natural d20.
    pub natural: u32,
    /// d20 + attack bonus.
    pub total: i32,
    /// Effective AC the roll was compared against.
    pub target_ac: i32,
    /// Whether the attack hit.
    pub hit: bool,
    /// Natural 20 under the critical rule.
    pub critical: bool,
    /// Damage rolled (0 on a miss).
    pub damage: u32,
}

/// What applying damage did to a target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageReport {
    /// The damaged combatant.
    pub target: CombatantId,
    /// Damage applied.
    pub amount: u32,
    /// HP left afterwards.
    pub remaining: u32,
    /// Status pushed if this damage took the target from above 0 to 0.
    pub downed: Option<StatusKind>,
}

/// Resolves attacks against armor class and applies damage.
#[derive(Debug, Clone, Default)]
pub struct DamageResolver {
    rules: RuleConfig,
}

impl DamageResolver {
    /// Create a resolver with the given rules.
    pub fn new(rules: RuleConfig) -> Self {
        Self { rules }
    }

    /// The rules in effect.
    pub fn rules(&self) -> &RuleConfig {
        &self.rules
    }

    /// Returns true if a natural roll plus bonus hits the given AC.
    ///
    /// A hit is `natural + bonus >= ac`. With `critical_hits` enabled a
    /// natural 20 always hits and a natural 1 always misses.
    pub fn attack_hits(&self, natural: u32, bonus: i32, armor_class: i32) -> bool {
        if self.rules.critical_hits {
            if natural >= 20 {
                return true;
            }
            if natural <= 1 {
                return false;
            }
        }
        natural as i32 + bonus >= armor_class
    }

    /// Roll damage for an attack that hit.
    ///
    /// Scaled attacks deal their flat scaled damage. Others roll the formula
    /// and add the STR (melee) or DEX (ranged) modifier, minimum 0. A
    /// critical doubles the dice, or the flat amount for scaled attacks.
    pub fn roll_damage(
        &self,
        attacker: &Combatant,
        attack: &Attack,
        critical: bool,
        rng: &mut StdRng,
    ) -> u32 {
        if let Some(flat) = attack.scaled_damage {
            return if critical { flat * 2 } else { flat };
        }
        let roll = if critical {
            attack.damage.roll_critical(rng)
        } else {
            attack.damage.roll(rng)
        };
        let modifier = attacker.modifier(attack.damage_ability());
        (roll.total as i64 + modifier as i64).max(0) as u32
    }

    /// Roll an attack without touching anyone's HP.
    pub fn roll_attack(
        &self,
        attacker: &Combatant,
        target: &Combatant,
        attack_index: usize,
        cover_bonus: i32,
        rng: &mut StdRng,
    ) -> MechResult<AttackOutcome> {
        let attack = attacker.attack(attack_index)?;
        let target_ac = target.effective_ac(&self.rules, attack.is_ranged(), cover_bonus);
        let natural = roll_d20(rng);
        let total = natural as i32 + attack.to_hit;
        let hit = self.attack_hits(natural, attack.to_hit, target_ac);
        let critical = hit && self.rules.critical_hits && natural >= 20;
        let damage = if hit {
            self.roll_damage(attacker, attack, critical, rng)
        } else {
            0
        };

        debug!(
            attacker = %attacker.id,
            target = %target.id,
            attack = %attack.name,
            natural,
            total,
            target_ac,
            hit,
            damage,
            "attack rolled"
        );

        Ok(AttackOutcome {
            attacker: attacker.id.clone(),
            target: target.id.clone(),
            attack: attack.name.clone(),
            natural,
            total,
            target_ac,
            hit,
            critical,
            damage,
        })
    }

    /// Roll an attack and, on a hit, apply its damage to the target.
    pub fn resolve_attack(
        &self,
        attacker: &Combatant,
        target: &mut Combatant,
        attack_index: usize,
        cover_bonus: i32,
        rng: &mut StdRng,
    ) -> MechResult<(AttackOutcome, Option<DamageReport>)> {
        let outcome = self.roll_attack(attacker, target, attack_index, cover_bonus, rng)?;
        let report = outcome
            .hit
            .then(|| Self::apply_damage(target, outcome.damage));
        Ok((outcome, report))
    }

    /// Subtract damage from HP, clamping at 0.
    ///
    /// Only the transition from above 0 to exactly 0 pushes a status:
    /// players fall `Unconscious`, enemies become `Dead`.
    pub fn apply_damage(target: &mut Combatant, amount: u32) -> DamageReport {
        let before = target.hit_points;
        target.hit_points = before.saturating_sub(amount);

        let downed = if before > 0 && target.hit_points == 0 {
            let status = match target.side {
                Side::Player => StatusKind::Unconscious,
                Side::Enemy => StatusKind::Dead,
            };
            target.add_status(status.clone(), DurationRule::Permanent);
            Some(status)
        } else {
            None
        };

        DamageReport {
            target: target.id.clone(),
            amount,
            remaining: target.hit_points,
            downed,
        }
    }
}
