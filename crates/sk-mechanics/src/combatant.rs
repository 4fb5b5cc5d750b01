//! Combatants and their attacks.
//!
//! A combatant is owned by its session for the lifetime of the fight and
//! only changes through the action economy, damage resolution, and the
//! session's move path.

use serde::{Deserialize, Serialize};

use sk_core::{
    Ability, AbilityScores, CombatantId, DurationRule, Position, Side, StatusEffect, StatusKind,
};

use crate::dice::DamageFormula;
use crate::economy::{ActionEconomy, Resource};
use crate::error::{MechError, MechResult};
use crate::rules::RuleConfig;

/// Tag marking a combatant as a spellcaster (preferred target for smart AI).
pub const SPELLCASTER_TAG: &str = "spellcaster";

/// Whether an attack is made in melee or at range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttackKind {
    /// Reaches the eight adjacent cells.
    Melee,
    /// Reaches any visible cell within the ranged radius.
    Ranged,
}

/// A single attack option.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attack {
    /// Display name ("Scimitar", "Shortbow").
    pub name: String,
    /// Bonus added to the d20 attack roll.
    pub to_hit: i32,
    /// Damage dealt on a hit.
    pub damage: DamageFormula,
    /// Melee or ranged.
    pub kind: AttackKind,
    /// Flat damage recorded by monster scaling; replaces the formula roll.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scaled_damage: Option<u32>,
}

impl Attack {
    /// A melee attack.
    pub fn melee(name: impl Into<String>, to_hit: i32, damage: DamageFormula) -> Self {
        Self {
            name: name.into(),
            to_hit,
            damage,
            kind: AttackKind::Melee,
            scaled_damage: None,
        }
    }

    /// A ranged attack.
    pub fn ranged(name: impl Into<String>, to_hit: i32, damage: DamageFormula) -> Self {
        Self {
            kind: AttackKind::Ranged,
            ..Self::melee(name, to_hit, damage)
        }
    }

    /// The ability whose modifier adds to damage.
    pub fn damage_ability(&self) -> Ability {
        match self.kind {
            AttackKind::Melee => Ability::Strength,
            AttackKind::Ranged => Ability::Dexterity,
        }
    }

    /// Returns true for ranged attacks.
    pub fn is_ranged(&self) -> bool {
        self.kind == AttackKind::Ranged
    }
}

/// A participant in a combat session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Combatant {
    /// Session-unique id.
    pub id: CombatantId,
    /// Display name.
    pub name: String,
    /// Which side the combatant fights for.
    pub side: Side,
    /// Current grid cell.
    pub position: Position,
    /// Current hit points (never below zero).
    pub hit_points: u32,
    /// Maximum hit points.
    pub max_hit_points: u32,
    /// Armor class.
    pub armor_class: i32,
    /// The six ability scores.
    pub abilities: AbilityScores,
    /// Walking speed in feet.
    pub speed: u32,
    /// Resources left this turn.
    pub economy: ActionEconomy,
    /// Active status effects, oldest first.
    pub status_effects: Vec<StatusEffect>,
    /// Last rolled initiative total.
    pub initiative: i32,
    /// AI profile driving this combatant (enemies only).
    pub ai_profile_id: Option<String>,
    /// Character level (players); used for party power.
    pub level: u32,
    /// Attack options, in preference order.
    pub attacks: Vec<Attack>,
    /// Free-form tags (e.g. `spellcaster`).
    pub tags: Vec<String>,
    /// Experience awarded for defeating this combatant.
    pub xp: u32,
    /// Statblock type used as the combat memory key (enemies only).
    pub monster_type: Option<String>,
}

impl Combatant {
    /// Create a combatant with 1 HP, AC 10, speed 30 and average abilities.
    pub fn new(id: impl Into<CombatantId>, name: impl Into<String>, side: Side) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            side,
            position: Position::default(),
            hit_points: 1,
            max_hit_points: 1,
            armor_class: 10,
            abilities: AbilityScores::default(),
            speed: 30,
            economy: ActionEconomy::exhausted(),
            status_effects: Vec::new(),
            initiative: 0,
            ai_profile_id: None,
            level: 1,
            attacks: Vec::new(),
            tags: Vec::new(),
            xp: 0,
            monster_type: None,
        }
    }

    /// Set current and maximum HP.
    pub fn with_hit_points(mut self, hp: u32) -> Self {
        self.hit_points = hp;
        self.max_hit_points = hp;
        self
    }

    /// Set armor class.
    pub fn with_armor_class(mut self, ac: i32) -> Self {
        self.armor_class = ac;
        self
    }

    /// Set ability scores.
    pub fn with_abilities(mut self, abilities: AbilityScores) -> Self {
        self.abilities = abilities;
        self
    }

    /// Set speed in feet.
    pub fn with_speed(mut self, speed: u32) -> Self {
        self.speed = speed;
        self
    }

    /// Set the starting position.
    pub fn at(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    /// Add an attack option.
    pub fn with_attack(mut self, attack: Attack) -> Self {
        self.attacks.push(attack);
        self
    }

    /// Add a tag.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Set the character level.
    pub fn with_level(mut self, level: u32) -> Self {
        self.level = level;
        self
    }

    /// Set the XP award.
    pub fn with_xp(mut self, xp: u32) -> Self {
        self.xp = xp;
        self
    }

    /// Returns true while the combatant can still act: HP above zero and
    /// not dead or fled.
    pub fn is_living(&self) -> bool {
        self.hit_points > 0
            && !self.has_status(&StatusKind::Dead)
            && !self.has_status(&StatusKind::Fled)
    }

    /// Returns true if the combatant left the fight by fleeing.
    pub fn has_fled(&self) -> bool {
        self.has_status(&StatusKind::Fled)
    }

    /// Returns true if the side is player-controlled.
    pub fn is_player_controlled(&self) -> bool {
        self.side == Side::Player
    }

    /// Returns true if `other` fights for the opposing side.
    pub fn is_hostile_to(&self, other: &Combatant) -> bool {
        self.side != other.side
    }

    /// Current HP as a fraction of max HP (0.0 when max is zero).
    pub fn health_fraction(&self) -> f64 {
        if self.max_hit_points == 0 {
            return 0.0;
        }
        self.hit_points as f64 / self.max_hit_points as f64
    }

    /// The modifier for an ability.
    pub fn modifier(&self, ability: Ability) -> i32 {
        self.abilities.modifier(ability)
    }

    /// Returns true if the combatant has a status effect of this kind.
    pub fn has_status(&self, kind: &StatusKind) -> bool {
        self.status_effects.iter().any(|s| &s.kind == kind)
    }

    /// Attach a status effect, replacing any existing one of the same kind.
    pub fn add_status(&mut self, kind: StatusKind, duration: DurationRule) {
        self.status_effects.retain(|s| s.kind != kind);
        self.status_effects.push(StatusEffect::new(kind, duration));
    }

    /// Remove a status effect. Returns true if it was present.
    pub fn remove_status(&mut self, kind: &StatusKind) -> bool {
        let before = self.status_effects.len();
        self.status_effects.retain(|s| &s.kind != kind);
        self.status_effects.len() < before
    }

    /// Turn-start bookkeeping: restore the action economy and expire
    /// status effects. Returns the effects that expired.
    pub fn reset_for_turn(&mut self) -> Vec<StatusKind> {
        self.economy.reset_for_turn(self.speed);
        let mut expired = Vec::new();
        self.status_effects.retain_mut(|effect| {
            if effect.tick_turn_start() {
                expired.push(effect.kind.clone());
                false
            } else {
                true
            }
        });
        expired
    }

    /// Spend a resource from this turn's economy.
    pub fn spend(&mut self, resource: Resource) -> MechResult<()> {
        self.economy.spend(resource)
    }

    /// Armor class against an incoming attack, including `Defending` and,
    /// for ranged attacks only, the cover bonus of the cell.
    pub fn effective_ac(&self, rules: &RuleConfig, ranged: bool, cover_bonus: i32) -> i32 {
        let mut ac = self.armor_class;
        if self.has_status(&StatusKind::Defending) {
            ac += rules.defend_ac_bonus;
        }
        if ranged {
            ac += cover_bonus;
        }
        ac
    }

    /// Look up an attack by index.
    pub fn attack(&self, index: usize) -> MechResult<&Attack> {
        self.attacks.get(index).ok_or_else(|| MechError::UnknownAttack {
            combatant: self.id.to_string(),
            index,
        })
    }

    /// The highest to-hit bonus among the combatant's attacks (0 if none).
    pub fn best_attack_bonus(&self) -> i32 {
        self.attacks.iter().map(|a| a.to_hit).max().unwrap_or(0)
    }

    /// Returns true if any attack is ranged.
    pub fn is_ranged_capable(&self) -> bool {
        self.attacks.iter().any(Attack::is_ranged)
    }

    /// Index of the first attack of the given kind.
    pub fn attack_index_of(&self, kind: AttackKind) -> Option<usize> {
        self.attacks.iter().position(|a| a.kind == kind)
    }

    /// Returns true if the combatant carries a tag (case-insensitive).
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fighter() -> Combatant {
        Combatant::new("kael", "Kael", Side::Player)
            .with_hit_points(20)
            .with_armor_class(16)
            .with_speed(30)
            .with_attack(Attack::melee(
                "Longsword",
                5,
                DamageFormula::parse("1d8+3").unwrap(),
            ))
    }

    #[test]
    fn living_and_health() {
        let mut c = fighter();
        assert!(c.is_living());
        assert!((c.health_fraction() - 1.0).abs() < f64::EPSILON);
        c.hit_points = 5;
        assert!((c.health_fraction() - 0.25).abs() < f64::EPSILON);
        c.hit_points = 0;
        assert!(!c.is_living());
    }

    #[test]
    fn fled_is_not_living() {
        let mut c = fighter();
        c.add_status(StatusKind::Fled, DurationRule::Permanent);
        assert!(!c.is_living());
        assert!(c.has_fled());
    }

    #[test]
    fn reset_for_turn_expires_defending() {
        let mut c = fighter();
        c.add_status(StatusKind::Defending, DurationRule::UntilTurnStart);
        c.add_status(
            StatusKind::Custom("Blessed".to_string()),
            DurationRule::Rounds(2),
        );
        let expired = c.reset_for_turn();
        assert_eq!(expired, vec![StatusKind::Defending]);
        assert!(c.economy.action);
        assert_eq!(c.economy.movement, 30);
        assert!(c.has_status(&StatusKind::Custom("Blessed".to_string())));
    }

    #[test]
    fn add_status_replaces_same_kind() {
        let mut c = fighter();
        c.add_status(StatusKind::Defending, DurationRule::UntilTurnStart);
        c.add_status(StatusKind::Defending, DurationRule::Rounds(3));
        assert_eq!(c.status_effects.len(), 1);
        assert_eq!(c.status_effects[0].duration, DurationRule::Rounds(3));
        assert!(c.remove_status(&StatusKind::Defending));
        assert!(!c.remove_status(&StatusKind::Defending));
    }

    #[test]
    fn effective_ac_includes_defend_and_ranged_cover() {
        let rules = RuleConfig::default();
        let mut c = fighter();
        assert_eq!(c.effective_ac(&rules, false, 2), 16);
        assert_eq!(c.effective_ac(&rules, true, 2), 18);
        c.add_status(StatusKind::Defending, DurationRule::UntilTurnStart);
        assert_eq!(c.effective_ac(&rules, false, 0), 18);
        assert_eq!(c.effective_ac(&rules, true, 5), 23);
    }

    #[test]
    fn attack_lookup() {
        let c = fighter();
        assert_eq!(c.attack(0).unwrap().name, "Longsword");
        assert!(matches!(
            c.attack(3),
            Err(MechError::UnknownAttack { index: 3, .. })
        ));
        assert_eq!(c.best_attack_bonus(), 5);
        assert!(!c.is_ranged_capable());
        assert_eq!(c.attack_index_of(AttackKind::Melee), Some(0));
        assert_eq!(c.attack_index_of(AttackKind::Ranged), None);
    }

    #[test]
    fn damage_ability_by_kind() {
        let f = DamageFormula::flat(1);
        assert_eq!(Attack::melee("a", 0, f).damage_ability(), Ability::Strength);
        assert_eq!(Attack::ranged("b", 0, f).damage_ability(), Ability::Dexterity);
    }

    #[test]
    fn tags_are_case_insensitive() {
        let c = fighter().with_tag("Spellcaster");
        assert!(c.has_tag(SPELLCASTER_TAG));
    }
}
