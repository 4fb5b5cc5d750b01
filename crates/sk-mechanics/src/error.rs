//! Error types for the mechanics engine.

use crate::economy::Resource;

/// Errors that can occur during mechanics operations.
#[derive(Debug, thiserror::Error)]
pub enum MechError {
    /// A damage formula string could not be parsed.
    #[error("invalid damage formula: \"{0}\"")]
    InvalidFormula(String),

    /// The combatant has already spent this resource this turn.
    #[error("insufficient resource: {0}")]
    InsufficientResource(Resource),

    /// An attack index does not exist on the combatant.
    #[error("combatant '{combatant}' has no attack #{index}")]
    UnknownAttack {
        /// The combatant that was asked.
        combatant: String,
        /// The requested attack index.
        index: usize,
    },
}

/// Convenience result type for mechanics operations.
pub type MechResult<T> = Result<T, MechError>;
