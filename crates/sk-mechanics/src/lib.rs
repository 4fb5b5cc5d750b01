//! Combat mechanics for Skirmish.
//!
//! Provides dice and damage formulas, the [`Combatant`] record with its
//! per-turn [`ActionEconomy`], the [`InitiativeScheduler`] and the
//! [`TurnOrder`] it produces, and the [`DamageResolver`] that turns attack
//! rolls into HP changes.

/// Combatants and their attacks.
pub mod combatant;
/// Attack resolution and HP changes.
pub mod damage;
/// Dice and damage formulas.
pub mod dice;
/// Per-turn action economy.
pub mod economy;
/// Error types for the mechanics engine.
pub mod error;
/// Initiative rolls and turn order.
pub mod initiative;
/// Tunable combat rules.
pub mod rules;

pub use combatant::{Attack, AttackKind, Combatant};
pub use damage::{AttackOutcome, DamageReport, DamageResolver};
pub use dice::{DamageFormula, DiceRoll, Die};
pub use economy::{ActionEconomy, Resource};
pub use error::{MechError, MechResult};
pub use initiative::{InitiativeEntry, InitiativeScheduler, TurnOrder};
pub use rules::RuleConfig;
