//! Monster statblocks as supplied by the bestiary provider.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use sk_core::{Ability, AbilityScores, CombatantId, Position, Side};
use sk_mechanics::{Attack, Combatant};

use crate::error::{MonsterError, MonsterResult};

/// The moral axis of a monster's alignment. Only good versus evil affects
/// behavior, so law and chaos are dropped when parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Alignment {
    /// Any good alignment.
    Good,
    /// Neutral or unaligned.
    #[default]
    Neutral,
    /// Any evil alignment.
    Evil,
}

impl Alignment {
    /// Parse a free-form alignment such as `"chaotic evil"` or `"LG"`.
    pub fn parse(input: &str) -> Self {
        let lower = input.trim().to_lowercase();
        let short = lower.len() == 2;
        if lower.contains("evil") || (short && lower.ends_with('e')) {
            Self::Evil
        } else if lower.contains("good") || (short && lower.ends_with('g')) {
            Self::Good
        } else {
            Self::Neutral
        }
    }

    /// Adjustment applied to self-preservation (evil -1, good +1).
    pub fn preservation_adjustment(self) -> i32 {
        match self {
            Self::Good => 1,
            Self::Neutral => 0,
            Self::Evil => -1,
        }
    }
}

impl fmt::Display for Alignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Good => write!(f, "good"),
            Self::Neutral => write!(f, "neutral"),
            Self::Evil => write!(f, "evil"),
        }
    }
}

impl From<String> for Alignment {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<Alignment> for String {
    fn from(alignment: Alignment) -> Self {
        alignment.to_string()
    }
}

fn default_speed() -> u32 {
    30
}

/// Base stats for a kind of monster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonsterStatblock {
    /// Stable type id (`goblin`); also the combat memory key.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Hit points.
    pub hit_points: u32,
    /// Armor class.
    pub armor_class: i32,
    /// Walking speed in feet.
    #[serde(default = "default_speed")]
    pub speed: u32,
    /// Ability scores.
    #[serde(default)]
    pub abilities: AbilityScores,
    /// Attack options.
    #[serde(default)]
    pub attacks: Vec<Attack>,
    /// Alignment (only good/evil matters).
    #[serde(default)]
    pub alignment: Alignment,
    /// Creature type (`humanoid`, `undead`, `beast`...).
    #[serde(default)]
    pub creature_type: String,
    /// Free-form tags (`spellcaster`, `cowardly`, `berserker`...).
    #[serde(default)]
    pub tags: Vec<String>,
    /// Names of special abilities usable as the `special` AI action.
    #[serde(default)]
    pub specials: Vec<String>,
    /// Saving throw bonuses by ability.
    #[serde(default)]
    pub saving_throws: BTreeMap<Ability, i32>,
    /// Challenge rating.
    #[serde(default)]
    pub challenge_rating: f64,
    /// Experience awarded when defeated.
    #[serde(default)]
    pub xp: u32,
}

impl MonsterStatblock {
    /// A statblock with the given id, name, HP and AC and nothing else.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        hit_points: u32,
        armor_class: i32,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            hit_points,
            armor_class,
            speed: default_speed(),
            abilities: AbilityScores::default(),
            attacks: Vec::new(),
            alignment: Alignment::Neutral,
            creature_type: String::new(),
            tags: Vec::new(),
            specials: Vec::new(),
            saving_throws: BTreeMap::new(),
            challenge_rating: 0.0,
            xp: 0,
        }
    }

    /// Add an attack.
    pub fn with_attack(mut self, attack: Attack) -> Self {
        self.attacks.push(attack);
        self
    }

    /// Set the ability scores.
    pub fn with_abilities(mut self, abilities: AbilityScores) -> Self {
        self.abilities = abilities;
        self
    }

    /// Set the alignment.
    pub fn with_alignment(mut self, alignment: Alignment) -> Self {
        self.alignment = alignment;
        self
    }

    /// Add a special ability.
    pub fn with_special(mut self, name: impl Into<String>) -> Self {
        self.specials.push(name.into());
        self
    }

    /// Set the XP award.
    pub fn with_xp(mut self, xp: u32) -> Self {
        self.xp = xp;
        self
    }

    /// Reject statblocks the engine cannot run.
    pub fn validate(&self) -> MonsterResult<()> {
        let invalid = |reason: &str| MonsterError::InvalidStatblock {
            id: self.id.clone(),
            reason: reason.to_string(),
        };
        if self.id.trim().is_empty() {
            return Err(invalid("empty id"));
        }
        if self.hit_points == 0 {
            return Err(invalid("hit points must be positive"));
        }
        Ok(())
    }

    /// Highest attack bonus (0 with no attacks).
    pub fn attack_bonus(&self) -> i32 {
        self.attacks.iter().map(|a| a.to_hit).max().unwrap_or(0)
    }

    /// Sum of the average damage of every attack.
    pub fn average_damage_per_round(&self) -> f64 {
        self.attacks.iter().map(|a| a.damage.average()).sum()
    }

    /// Fraction of attacks that are ranged (0 with no attacks).
    pub fn ranged_ratio(&self) -> f64 {
        if self.attacks.is_empty() {
            return 0.0;
        }
        let ranged = self.attacks.iter().filter(|a| a.is_ranged()).count();
        ranged as f64 / self.attacks.len() as f64
    }

    /// Returns true if the monster carries a tag (case-insensitive).
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }

    /// Build an enemy combatant from this statblock. Its AI profile is
    /// keyed by the combatant id.
    pub fn spawn(&self, id: impl Into<CombatantId>, position: Position) -> Combatant {
        let id = id.into();
        let profile_id = id.to_string();
        let mut combatant = Combatant::new(id, self.name.clone(), Side::Enemy)
            .with_hit_points(self.hit_points)
            .with_armor_class(self.armor_class)
            .with_abilities(self.abilities)
            .with_speed(self.speed)
            .with_xp(self.xp)
            .at(position);
        combatant.attacks = self.attacks.clone();
        combatant.tags = self.tags.clone();
        combatant.monster_type = Some(self.id.clone());
        combatant.ai_profile_id = Some(profile_id);
        combatant
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sk_mechanics::DamageFormula;

    fn goblin() -> MonsterStatblock {
        MonsterStatblock::new("goblin", "Goblin", 7, 15)
            .with_attack(Attack::melee(
                "Scimitar",
                4,
                DamageFormula::parse("1d6+2").unwrap(),
            ))
            .with_attack(Attack::ranged(
                "Shortbow",
                4,
                DamageFormula::parse("1d6+2").unwrap(),
            ))
            .with_alignment(Alignment::Evil)
            .with_xp(50)
    }

    #[test]
    fn alignment_parsing() {
        assert_eq!(Alignment::parse("chaotic evil"), Alignment::Evil);
        assert_eq!(Alignment::parse("Lawful Good"), Alignment::Good);
        assert_eq!(Alignment::parse("LE"), Alignment::Evil);
        assert_eq!(Alignment::parse("ng"), Alignment::Good);
        assert_eq!(Alignment::parse("unaligned"), Alignment::Neutral);
        assert_eq!(Alignment::parse("true neutral"), Alignment::Neutral);
    }

    #[test]
    fn derived_numbers() {
        let g = goblin();
        assert_eq!(g.attack_bonus(), 4);
        // two attacks of 1d6+2 -> 5.5 each
        assert!((g.average_damage_per_round() - 11.0).abs() < f64::EPSILON);
        assert!((g.ranged_ratio() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn validation() {
        assert!(goblin().validate().is_ok());
        assert!(MonsterStatblock::new("ghost", "Ghost", 0, 11).validate().is_err());
        assert!(MonsterStatblock::new(" ", "Nobody", 5, 11).validate().is_err());
    }

    #[test]
    fn spawn_builds_enemy() {
        let c = goblin().spawn("goblin-1", Position::new(3, 4));
        assert_eq!(c.side, Side::Enemy);
        assert_eq!(c.hit_points, 7);
        assert_eq!(c.max_hit_points, 7);
        assert_eq!(c.position, Position::new(3, 4));
        assert_eq!(c.monster_type.as_deref(), Some("goblin"));
        assert_eq!(c.xp, 50);
        assert_eq!(c.ai_profile_id.as_deref(), Some("goblin-1"));
        assert_eq!(c.attacks.len(), 2);
    }

    #[test]
    fn from_json() {
        let json = r#"{
            "id": "orc",
            "name": "Orc",
            "hit_points": 15,
            "armor_class": 13,
            "abilities": {"strength": 16, "intelligence": 7},
            "attacks": [{"name": "Greataxe", "to_hit": 5, "damage": "1d12+3", "kind": "melee"}],
            "alignment": "chaotic evil",
            "saving_throws": {"constitution": 3},
            "xp": 100
        }"#;
        let orc: MonsterStatblock = serde_json::from_str(json).unwrap();
        assert_eq!(orc.alignment, Alignment::Evil);
        assert_eq!(orc.speed, 30);
        assert_eq!(orc.abilities.dexterity, 10);
        assert_eq!(orc.saving_throws.get(&Ability::Constitution), Some(&3));
        assert_eq!(orc.attacks[0].damage.to_string(), "1d12+3");
    }
}
