//! Monster layer for Skirmish.
//!
//! Turns base statblocks into combatants matched to the party
//! ([`ScalingEngine`]), derives a behavioral [`MonsterAiProfile`] from each
//! statblock, and picks an action every enemy turn ([`DecisionEngine`]).
//! [`CombatMemory`] carries encounter history between sessions.

/// Battlefield analysis for one monster.
pub mod battlefield;
/// Scaling and AI tunables.
pub mod config;
/// Per-turn monster decisions.
pub mod decision;
/// Error types for the monster layer.
pub mod error;
/// Encounter history across sessions.
pub mod memory;
/// Behavioral profiles derived from statblocks.
pub mod profile;
/// Difficulty scaling against party strength.
pub mod scaling;
/// Monster statblocks.
pub mod statblock;

pub use battlefield::BattlefieldAnalysis;
pub use config::{AiConfig, ScalingConfig};
pub use decision::{AiActionKind, AiDecision, DecisionEngine, ScoredAction};
pub use error::{MonsterError, MonsterResult};
pub use memory::{
    CombatMemory, EncounterOutcome, EncounterRecord, MemorySnapshot, MonsterHistory, RecentOutcome,
};
pub use profile::{MonsterAiProfile, PreferredRange, SelfPreservation, TacticStats, TacticalLevel};
pub use scaling::{ScaledMonster, ScalingEngine, ScalingRecord};
pub use statblock::{Alignment, MonsterStatblock};
