//! Behavioral profiles derived from statblocks.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use sk_core::Ability;
use sk_mechanics::Combatant;

use crate::statblock::{Alignment, MonsterStatblock};

/// How cleverly a monster fights, from its Intelligence score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TacticalLevel {
    /// INT below 8.
    Instinctive,
    /// INT 8-11.
    Basic,
    /// INT 12-13.
    Moderate,
    /// INT 14-15.
    High,
    /// INT 16 and up.
    Genius,
}

impl TacticalLevel {
    /// Tier for an Intelligence score.
    pub fn from_intelligence(score: i32) -> Self {
        match score {
            16.. => Self::Genius,
            14..=15 => Self::High,
            12..=13 => Self::Moderate,
            8..=11 => Self::Basic,
            _ => Self::Instinctive,
        }
    }

    /// Returns true for the tiers that pick targets deliberately.
    pub fn is_smart(self) -> bool {
        self >= Self::High
    }
}

impl fmt::Display for TacticalLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Instinctive => write!(f, "instinctive"),
            Self::Basic => write!(f, "basic"),
            Self::Moderate => write!(f, "moderate"),
            Self::High => write!(f, "high"),
            Self::Genius => write!(f, "genius"),
        }
    }
}

/// How much a monster values its own life.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelfPreservation {
    /// Never flees.
    Reckless,
    /// Rarely flees.
    Low,
    /// Flees when it makes sense.
    Moderate,
    /// Flees readily.
    High,
}

impl SelfPreservation {
    /// Bucket `wisdom modifier + alignment adjustment`.
    pub fn from_score(score: i32) -> Self {
        match score {
            ..=-2 => Self::Reckless,
            -1..=0 => Self::Low,
            1..=2 => Self::Moderate,
            _ => Self::High,
        }
    }

    /// Multiplier on flee chance for this tier.
    pub fn flee_multiplier(self) -> f64 {
        match self {
            Self::Reckless => 0.0,
            Self::Low => 0.5,
            Self::Moderate => 1.0,
            Self::High => 1.5,
        }
    }
}

impl fmt::Display for SelfPreservation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reckless => write!(f, "reckless"),
            Self::Low => write!(f, "low"),
            Self::Moderate => write!(f, "moderate"),
            Self::High => write!(f, "high"),
        }
    }
}

/// Whether a monster prefers to fight up close or at range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreferredRange {
    /// Mostly melee attacks.
    Melee,
    /// Mostly ranged attacks.
    Ranged,
    /// A mix of both.
    Mixed,
}

impl PreferredRange {
    /// Classify by the fraction of ranged attacks.
    pub fn from_ranged_ratio(ratio: f64) -> Self {
        if ratio >= 0.66 {
            Self::Ranged
        } else if ratio <= 0.34 {
            Self::Melee
        } else {
            Self::Mixed
        }
    }
}

impl fmt::Display for PreferredRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Melee => write!(f, "melee"),
            Self::Ranged => write!(f, "ranged"),
            Self::Mixed => write!(f, "mixed"),
        }
    }
}

/// Use count and success count for one tactic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TacticStats {
    /// Times the tactic was chosen.
    pub uses: u32,
    /// Times it worked.
    pub successes: u32,
}

impl TacticStats {
    /// Success rate, or `None` before any use.
    pub fn success_rate(&self) -> Option<f64> {
        (self.uses > 0).then(|| self.successes as f64 / self.uses as f64)
    }

    /// Add another set of stats to this one.
    pub fn merge(&mut self, other: TacticStats) {
        self.uses += other.uses;
        self.successes += other.successes;
    }
}

/// The behavioral profile driving one monster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonsterAiProfile {
    /// Profile id (the combatant id).
    pub monster_id: String,
    /// Statblock type, the combat memory key.
    pub monster_type: String,
    /// Cleverness tier.
    pub tactical_level: TacticalLevel,
    /// Willingness to flee.
    pub self_preservation: SelfPreservation,
    /// 0.1 (timid) to 1.0 (relentless).
    pub aggression: f64,
    /// Melee, ranged, or mixed.
    pub preferred_range: PreferredRange,
    /// Health fraction at or below which fleeing is considered.
    pub flee_threshold: f64,
    /// Raw Intelligence score, for decision randomness.
    pub intelligence: i32,
    /// Special abilities usable as the `special` action.
    pub specials: Vec<String>,
    /// Tactic outcomes, keyed by tactic name.
    pub learning: BTreeMap<String, TacticStats>,
}

impl MonsterAiProfile {
    /// Derive a profile from a (possibly scaled) statblock.
    pub fn from_statblock(monster_id: impl Into<String>, statblock: &MonsterStatblock) -> Self {
        let wis_mod = statblock.abilities.modifier(Ability::Wisdom);
        let intelligence = statblock.abilities.score(Ability::Intelligence);
        let alignment = statblock.alignment;

        Self {
            monster_id: monster_id.into(),
            monster_type: statblock.id.clone(),
            tactical_level: TacticalLevel::from_intelligence(intelligence),
            self_preservation: SelfPreservation::from_score(
                wis_mod + alignment.preservation_adjustment(),
            ),
            aggression: aggression_for(statblock),
            preferred_range: PreferredRange::from_ranged_ratio(statblock.ranged_ratio()),
            flee_threshold: flee_threshold_for(wis_mod, alignment),
            intelligence,
            specials: statblock.specials.clone(),
            learning: BTreeMap::new(),
        }
    }

    /// Derive a neutral profile for a combatant that has no statblock
    /// (e.g. a prebuilt reinforcement).
    pub fn from_combatant(combatant: &Combatant) -> Self {
        let intelligence = combatant.abilities.score(Ability::Intelligence);
        let wis_mod = combatant.modifier(Ability::Wisdom);
        let ranged_ratio = if combatant.attacks.is_empty() {
            0.0
        } else {
            let ranged = combatant.attacks.iter().filter(|a| a.is_ranged()).count();
            ranged as f64 / combatant.attacks.len() as f64
        };
        Self {
            monster_id: combatant.id.to_string(),
            monster_type: combatant
                .monster_type
                .clone()
                .unwrap_or_else(|| combatant.id.to_string()),
            tactical_level: TacticalLevel::from_intelligence(intelligence),
            self_preservation: SelfPreservation::from_score(wis_mod),
            aggression: 0.5,
            preferred_range: PreferredRange::from_ranged_ratio(ranged_ratio),
            flee_threshold: flee_threshold_for(wis_mod, Alignment::Neutral),
            intelligence,
            specials: Vec::new(),
            learning: BTreeMap::new(),
        }
    }

    /// Returns true if the monster has a special ability to use.
    pub fn has_specials(&self) -> bool {
        !self.specials.is_empty()
    }

    /// Seed the learning state, e.g. from combat memory.
    pub fn with_learning(mut self, learning: BTreeMap<String, TacticStats>) -> Self {
        self.learning = learning;
        self
    }

    /// Record one use of a tactic.
    pub fn record_outcome(&mut self, tactic: &str, success: bool) {
        let stats = self.learning.entry(tactic.to_string()).or_default();
        stats.uses += 1;
        if success {
            stats.successes += 1;
        }
    }

    /// Priority multiplier from past outcomes: `0.5 + success rate` once a
    /// tactic has `min_uses` uses, otherwise 1.0.
    pub fn learning_multiplier(&self, tactic: &str, min_uses: u32) -> f64 {
        match self.learning.get(tactic) {
            Some(stats) if stats.uses >= min_uses.max(1) => {
                0.5 + stats.success_rate().unwrap_or(0.5)
            }
            _ => 1.0,
        }
    }
}

fn aggression_for(statblock: &MonsterStatblock) -> f64 {
    let mut aggression: f64 = 0.5;
    aggression += match statblock.alignment {
        Alignment::Evil => 0.2,
        Alignment::Good => -0.1,
        Alignment::Neutral => 0.0,
    };
    aggression += match statblock.creature_type.to_lowercase().as_str() {
        "undead" | "fiend" => 0.2,
        "beast" | "monstrosity" | "construct" => 0.1,
        "fey" | "celestial" => -0.1,
        _ => 0.0,
    };
    if statblock.has_tag("berserker") {
        aggression += 0.3;
    }
    if statblock.has_tag("cowardly") {
        aggression -= 0.2;
    }
    aggression.clamp(0.1, 1.0)
}

fn flee_threshold_for(wis_mod: i32, alignment: Alignment) -> f64 {
    let threshold = 0.25 + 0.05 * wis_mod as f64 + 0.05 * alignment.preservation_adjustment() as f64;
    threshold.clamp(0.1, 0.5)
}
