//! Error types shared across the Tensile crates
//!
//! Errors carry structured fields to aid debugging in production:
//! the offending value, the field path where known, and a message.

use thiserror::Error;

/// Main error type for shared Tensile operations
#[derive(Debug, Error)]
pub enum Error {
    /// A resource quantity string could not be parsed or summed
    #[error("invalid quantity '{value}': {message}")]
    Quantity {
        /// The quantity string that failed to parse
        value: String,
        /// Description of what's invalid
        message: String,
    },

    /// Validation error for CRD specs
    #[error("validation error: {message}")]
    Validation {
        /// Description of what's invalid
        message: String,
        /// The invalid field path (e.g., "spec.mlPolicy.numNodes")
        field: Option<String>,
    },
}

impl Error {
    /// Create a quantity error for the given value
    pub fn quantity(value: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Quantity {
            value: value.into(),
            message: msg.into(),
        }
    }

    /// Create a validation error without field context
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
            field: None,
        }
    }

    /// Create a validation error with a field path
    pub fn validation_for_field(field: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
            field: Some(field.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantity_error_display() {
        let err = Error::quantity("10Xi", "unknown suffix");
        assert_eq!(err.to_string(), "invalid quantity '10Xi': unknown suffix");
    }

    #[test]
    fn validation_error_carries_field() {
        let err = Error::validation_for_field("spec.mlPolicy.numNodes", "must be positive");
        match err {
            Error::Validation { field, .. } => {
                assert_eq!(field.as_deref(), Some("spec.mlPolicy.numNodes"));
            }
            _ => panic!("expected validation error"),
        }
    }
}
