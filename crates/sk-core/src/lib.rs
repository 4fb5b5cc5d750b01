//! Core types for Skirmish: identifiers, grid positions, sides, ability
//! scores, and status effects.
//!
//! This crate carries no combat rules. Higher layers (mechanics, grid,
//! monster AI, session) build on these shared value types.

/// Ability scores and modifiers.
pub mod abilities;
/// Error types used throughout the crate.
pub mod error;
/// Combatant and session identifiers.
pub mod id;
/// Integer grid coordinates and the Chebyshev metric.
pub mod position;
/// Which side of a fight a combatant is on.
pub mod side;
/// Status effects and their duration rules.
pub mod status;

/// Re-export ability types.
pub use abilities::{Ability, AbilityScores};
/// Re-export error types.
pub use error::{CoreError, CoreResult};
/// Re-export identifier types.
pub use id::{CombatantId, SessionId};
/// Re-export the grid position type.
pub use position::Position;
/// Re-export the side type.
pub use side::Side;
/// Re-export status effect types.
pub use status::{DurationRule, StatusEffect, StatusKind};
