//! Error types for the monster layer.

/// Errors raised while loading or scaling monsters.
#[derive(Debug, thiserror::Error)]
pub enum MonsterError {
    /// A statblock failed validation.
    #[error("invalid statblock '{id}': {reason}")]
    InvalidStatblock {
        /// The statblock id.
        id: String,
        /// What is wrong with it.
        reason: String,
    },
}

/// Convenience result type for monster operations.
pub type MonsterResult<T> = Result<T, MonsterError>;
