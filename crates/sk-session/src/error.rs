//! Error types for the session layer.
//!
//! Rejected actions surface as [`ValidationError`] and leave the session
//! untouched. Lookups of unknown ids are `*NotFound`. An
//! [`SessionError::InvariantViolation`] means the session has already been
//! completed with `reason = "invariant_violation"`.

use thiserror::Error;

use sk_core::{CombatantId, Position, SessionId, Side};
use sk_grid::GridError;
use sk_mechanics::{MechError, Resource};
use sk_monster::MonsterError;

use crate::session::SessionStatus;

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

/// Why an attempted operation was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The actor is not the current-turn combatant.
    #[error("it is not {actor}'s turn")]
    NotYourTurn {
        /// Who tried to act.
        actor: CombatantId,
    },

    /// The session is pending or completed.
    #[error("session is {status}, not active")]
    SessionNotActive {
        /// The session's current status.
        status: SessionStatus,
    },

    /// `start` was called twice.
    #[error("session has already started")]
    AlreadyStarted,

    /// One side has nobody to fight.
    #[error("no {0} combatants to start with")]
    EmptyRoster(Side),

    /// The resource was already spent this turn.
    #[error("not enough {0} left")]
    InsufficientResource(Resource),

    /// The destination is not reachable with the remaining movement.
    #[error("cannot move from {from} to {to}")]
    IllegalMove {
        /// Where the actor stands.
        from: Position,
        /// Where it tried to go.
        to: Position,
    },

    /// The target is outside the attack's range.
    #[error("{target} is out of range")]
    OutOfRange {
        /// The intended target.
        target: CombatantId,
    },

    /// The target cannot be attacked at all.
    #[error("cannot target {target}: {reason}")]
    InvalidTarget {
        /// The intended target.
        target: CombatantId,
        /// Why not.
        reason: String,
    },

    /// A combatant cannot stand where it was placed.
    #[error("cannot place {id} at {position}: {reason}")]
    InvalidPlacement {
        /// The combatant being placed.
        id: CombatantId,
        /// The requested cell.
        position: Position,
        /// Why not.
        reason: String,
    },

    /// The id is already used in this session.
    #[error("combatant {0} is already in the fight")]
    DuplicateCombatant(CombatantId),

    /// The attack index does not exist on the actor.
    #[error("{combatant} has no attack #{index}")]
    UnknownAttack {
        /// The actor.
        combatant: CombatantId,
        /// The requested index.
        index: usize,
    },
}

/// Errors that can occur in a combat session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// A rejected action.
    #[error("invalid action: {0}")]
    Validation(#[from] ValidationError),

    /// No combatant with this id in the session.
    #[error("unknown combatant: {0}")]
    CombatantNotFound(CombatantId),

    /// No session with this id in the registry.
    #[error("unknown session: {0}")]
    SessionNotFound(SessionId),

    /// Turn state referenced something that does not exist. The session
    /// has been completed.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    /// Mechanics error that is not a validation failure.
    #[error("{0}")]
    Mech(MechError),

    /// Grid error.
    #[error("{0}")]
    Grid(#[from] GridError),

    /// Monster data error.
    #[error("{0}")]
    Monster(#[from] MonsterError),
}

impl From<MechError> for SessionError {
    fn from(err: MechError) -> Self {
        match err {
            MechError::InsufficientResource(resource) => {
                ValidationError::InsufficientResource(resource).into()
            }
            MechError::UnknownAttack { combatant, index } => ValidationError::UnknownAttack {
                combatant: CombatantId::from(combatant),
                index,
            }
            .into(),
            other => SessionError::Mech(other),
        }
    }
}

impl SessionError {
    /// Returns true for rejected actions that left the session untouched.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

/// A failure reported by an optional collaborator (narration, persistence).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("collaborator failed: {0}")]
pub struct CollaboratorError(pub String);
