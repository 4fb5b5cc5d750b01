//! How a session ended.

use std::fmt;

use serde::{Deserialize, Serialize};

use sk_core::CombatantId;
use sk_monster::EncounterOutcome;

/// Final outcome from the players' point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombatOutcome {
    /// No enemy is left standing.
    Victory,
    /// No player is left standing.
    Defeat,
    /// Ended early by `force_end` or an invariant violation.
    Interrupted,
}

impl CombatOutcome {
    /// The same outcome as the monsters saw it.
    pub fn for_monsters(self) -> EncounterOutcome {
        match self {
            Self::Victory => EncounterOutcome::MonsterDefeat,
            Self::Defeat => EncounterOutcome::MonsterVictory,
            Self::Interrupted => EncounterOutcome::Interrupted,
        }
    }
}

impl fmt::Display for CombatOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Victory => write!(f, "victory"),
            Self::Defeat => write!(f, "defeat"),
            Self::Interrupted => write!(f, "interrupted"),
        }
    }
}

/// Results computed when a session completes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatResult {
    /// How it ended.
    pub outcome: CombatOutcome,
    /// Why it ended (`side_eliminated`, `invariant_violation`, or the
    /// `force_end` reason).
    pub reason: String,
    /// Players still living.
    pub surviving_players: Vec<CombatantId>,
    /// Enemies that are dead or fled.
    pub defeated_enemies: Vec<CombatantId>,
    /// XP of the defeated enemies.
    pub total_xp: u32,
    /// Rounds fought.
    pub rounds: u32,
}
