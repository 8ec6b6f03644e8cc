//! Error types for port operations.

/// Engine port errors with context for debugging.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    /// Object not found - includes object type and ID for actionable error messages.
    #[error("{entity_type} not found: {id}")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// Engine call failed - includes operation name for tracing.
    #[error("Engine error in {operation}: {message}")]
    Engine {
        operation: &'static str,
        message: String,
    },

    /// Serialization/deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl PortError {
    /// Create a NotFound error with object type and ID context.
    pub fn not_found(entity_type: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity_type,
            id: id.to_string(),
        }
    }

    /// Create an Engine error with operation context.
    pub fn engine(operation: &'static str, message: impl ToString) -> Self {
        Self::Engine {
            operation,
            message: message.to_string(),
        }
    }

    /// Create a Serialization error.
    pub fn serialization(message: impl ToString) -> Self {
        Self::Serialization(message.to_string())
    }

    /// Check if this is a NotFound error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_carries_context() {
        let err = PortError::not_found("Item", "abc");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Item not found: abc");
    }

    #[test]
    fn engine_error_names_operation() {
        let err = PortError::engine("equip", "slot occupied");
        assert!(!err.is_not_found());
        assert_eq!(err.to_string(), "Engine error in equip: slot occupied");
    }
}
