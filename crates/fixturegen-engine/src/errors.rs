use thiserror::Error;

/// Errors emitted by the generation engine.
///
/// Every variant carries the offending field path where one exists;
/// errors are collected with full path context and raised to the
/// instance-build boundary, never swallowed mid-traversal.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// No registered provider maps the field's constraint shape and
    /// fallback is disallowed.
    #[error("no provider for '{path}': {hint}")]
    Mapping { path: String, hint: String },
    /// A provider could not honor declared bounds after bounded
    /// resampling.
    #[error("constraint violation at '{path}': {message}")]
    ConstraintViolation { path: String, message: String },
    /// A cycle/limit decision required null substitution on a
    /// non-optional field.
    #[error("unsatisfiable recursion at '{path}': null substitution on non-optional field")]
    UnsatisfiableRecursion { path: String },
    /// Validator-aware retries exhausted without convergence.
    #[error("validator retries exhausted after {attempts} attempts; failing fields: {}", failing.join(", "))]
    ValidatorExhausted { attempts: u32, failing: Vec<String> },
    /// Provider options or override configuration are malformed.
    #[error("invalid options for '{provider}': {message}")]
    InvalidOptions { provider: String, message: String },
    /// The run configuration is inconsistent.
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    /// The model graph itself is invalid.
    #[error(transparent)]
    Schema(#[from] fixturegen_core::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl GenerationError {
    /// Field path the error is attached to, when known.
    pub fn path(&self) -> Option<&str> {
        match self {
            GenerationError::Mapping { path, .. }
            | GenerationError::ConstraintViolation { path, .. }
            | GenerationError::UnsatisfiableRecursion { path } => Some(path),
            _ => None,
        }
    }
}
