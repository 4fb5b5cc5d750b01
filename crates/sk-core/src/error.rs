/// Alias for `Result<T, CoreError>`.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors raised while parsing or validating core value types.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// An ability name could not be recognised.
    #[error("unknown ability: {0}")]
    UnknownAbility(String),

    /// A side name could not be recognised.
    #[error("unknown side: \"{0}\" (expected player or enemy)")]
    UnknownSide(String),

    /// A generic validation error with a descriptive message.
    #[error("validation error: {0}")]
    Validation(String),
}
