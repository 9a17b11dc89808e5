use thiserror::Error;

#[derive(Error, Debug)]
pub enum SkirmishError {
    #[error("Invalid name: {0:?}")]
    InvalidName(String),

    #[error("Attribute '{name}' type mismatch: expected {expected}, got {actual}")]
    AttributeTypeMismatch {
        name: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("Invalid update policy for attribute '{name}': {reason}")]
    InvalidUpdatePolicy { name: String, reason: String },

    #[error("Invalid update interval for attribute '{name}': {reason}")]
    InvalidUpdateInterval { name: String, reason: String },

    #[error("Unknown attribute '{attribute}' on '{owner}'")]
    UnknownAttribute { owner: String, attribute: String },

    #[error("Invalid attack strategy: {0:?}")]
    InvalidAttackStrategy(String),

    #[error("{what} size {actual} out of range (minimum {min})")]
    RosterSize {
        what: &'static str,
        actual: usize,
        min: usize,
    },

    #[error("{0} not implemented")]
    NotImplemented(&'static str),

    #[error("Scenario error: {0}")]
    Scenario(String),

    #[error("Unknown unit type: {0:?}")]
    UnknownUnitType(String),

    #[error("Unknown unit template: {0:?}")]
    UnknownUnit(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SkirmishError {
    /// True for errors caused by bad input handed to a constructor or setter.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::InvalidName(_)
                | Self::AttributeTypeMismatch { .. }
                | Self::InvalidUpdatePolicy { .. }
                | Self::InvalidUpdateInterval { .. }
                | Self::UnknownAttribute { .. }
                | Self::InvalidAttackStrategy(_)
                | Self::RosterSize { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, SkirmishError>;

/// Reject empty or whitespace-only names.
pub fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(SkirmishError::InvalidName(name.to_string()));
    }
    Ok(())
}
