//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Command group '{0}' is registered twice")]
    DuplicateGroup(String),

    #[error("Command '{0}' is registered twice")]
    DuplicateCommand(String),

    #[error("Invalid name '{0}': names must be non-empty and must not contain '-' separators")]
    InvalidName(String),

    #[error("Registry entry '{id}' is invalid: {reason}")]
    InvalidRegistryEntry { id: String, reason: String },

    #[error("Operation cancelled")]
    Cancelled,
}

impl DomainError {
    /// Check if this error represents a cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, DomainError::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancelled_error_display() {
        let error = DomainError::Cancelled;
        assert_eq!(error.to_string(), "Operation cancelled");
    }

    #[test]
    fn test_is_cancelled_check() {
        assert!(DomainError::Cancelled.is_cancelled());
        assert!(!DomainError::DuplicateGroup("storage".into()).is_cancelled());
        assert!(!DomainError::InvalidName("".into()).is_cancelled());
    }

    #[test]
    fn test_invalid_registry_entry_names_the_entry() {
        let error = DomainError::InvalidRegistryEntry {
            id: "docs".into(),
            reason: "neither command nor url is set".into(),
        };
        assert_eq!(
            error.to_string(),
            "Registry entry 'docs' is invalid: neither command nor url is set"
        );
    }
}
