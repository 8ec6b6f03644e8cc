//! Unified error types for the domain layer
//!
//! Provides a common error type for rule configuration and value parsing,
//! so adapters never have to fall back to String or anyhow.

use thiserror::Error;

/// Unified error type for domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Validation failed (e.g., invalid rule configuration)
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Parse error (for value objects and persisted records)
    #[error("Parse error: {0}")]
    Parse(String),
}

impl DomainError {
    /// Creates a validation error for rule configuration problems.
    ///
    /// # Example
    /// ```ignore
    /// if rule.valid_bases.is_empty() {
    ///     return Err(DomainError::validation("prestige rule has no base classes"));
    /// }
    /// ```
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Creates a parse error for string-to-type conversion failures.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error() {
        let err = DomainError::validation("prestige rule has no base classes");
        assert!(matches!(err, DomainError::Validation(_)));
        assert_eq!(
            err.to_string(),
            "Validation failed: prestige rule has no base classes"
        );
    }

    #[test]
    fn test_parse_error() {
        let err = DomainError::parse("bad grant key");
        assert_eq!(err.to_string(), "Parse error: bad grant key");
    }
}
