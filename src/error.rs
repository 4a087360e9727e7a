use thiserror::Error;

pub type Result<T> = std::result::Result<T, CalcError>;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CalcError {
    /// Malformed or out-of-range input. Always fixable by the caller.
    #[error("invalid {field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    /// A computation failed on input that passed validation.
    #[error("internal error: {0}")]
    Internal(String),
}

impl CalcError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        CalcError::Validation {
            field,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            CalcError::Validation { .. } => "validation",
            CalcError::Internal(_) => "internal",
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, CalcError::Validation { .. })
    }
}
