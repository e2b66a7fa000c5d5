/// Convenience result type used across storyreel.
pub type ReelResult<T> = Result<T, ReelError>;

/// Top-level error taxonomy used by the compilers and the media pipeline.
#[derive(thiserror::Error, Debug)]
pub enum ReelError {
    /// Malformed, empty or otherwise invalid script data.
    #[error("validation error: {0}")]
    Validation(String),

    /// A compiler was handed options it cannot honor.
    #[error("compilation error: {0}")]
    Compilation(String),

    /// An external stage failed for one unit of work.
    #[error("stage failure [{unit}]: {cause}")]
    Stage {
        /// Identifier of the unit the stage ran for.
        unit: String,
        /// Human readable cause, suitable for operator triage.
        cause: String,
    },

    /// Missing or unusable configuration, e.g. credentials for a narration backend.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ReelError {
    /// Build a [`ReelError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`ReelError::Compilation`] value.
    pub fn compilation(msg: impl Into<String>) -> Self {
        Self::Compilation(msg.into())
    }

    /// Build a [`ReelError::Stage`] value.
    pub fn stage(unit: impl Into<String>, cause: impl Into<String>) -> Self {
        Self::Stage {
            unit: unit.into(),
            cause: cause.into(),
        }
    }

    /// Build a [`ReelError::Configuration`] value.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Build a [`ReelError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// The message a [`crate::StageResult`] records for this error.
    ///
    /// Stage failures report their bare cause since the unit id is stored alongside.
    pub fn cause(&self) -> String {
        match self {
            Self::Stage { cause, .. } => cause.clone(),
            other => format!("{other:#}"),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
