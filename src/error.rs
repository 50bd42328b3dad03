// Error taxonomy for the customer base
// Client-input failures (format, structure) are distinct from storage failures

use thiserror::Error;

/// A single structural rule broken by an assembled customer record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

#[derive(Debug, Error)]
pub enum CustomerError {
    /// A bulk-file data line is shorter than the fixed column layout allows.
    /// Aborts the whole batch - no partial results.
    #[error("invalid file format: line too short")]
    LineTooShort {
        /// 1-indexed line number in the uploaded file
        line: usize,
    },

    /// The assembled record violates the persistence schema. Carries every
    /// offending field, not just the first.
    #[error("structural validation failed: {}", format_violations(.0))]
    Structural(Vec<FieldViolation>),

    /// Lookup miss - an expected, non-exceptional outcome.
    #[error("customer not found")]
    NotFound,

    /// Storage-level failure.
    #[error("internal storage error: {0}")]
    Internal(#[from] rusqlite::Error),
}

impl CustomerError {
    /// True for failures caused by the caller's input (HTTP 400 class).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            CustomerError::LineTooShort { .. } | CustomerError::Structural(_)
        )
    }
}

fn format_violations(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_too_short_message() {
        let err = CustomerError::LineTooShort { line: 2 };
        assert_eq!(err.to_string(), "invalid file format: line too short");
        assert!(err.is_client_error());
    }

    #[test]
    fn test_structural_lists_every_field() {
        let err = CustomerError::Structural(vec![
            FieldViolation {
                field: "cpf".to_string(),
                message: "must be at most 20 characters".to_string(),
            },
            FieldViolation {
                field: "ticket_medio".to_string(),
                message: "must not be negative".to_string(),
            },
        ]);

        let msg = err.to_string();
        assert!(msg.contains("cpf"));
        assert!(msg.contains("ticket_medio"));
        assert!(err.is_client_error());
    }

    #[test]
    fn test_not_found_is_not_client_error() {
        assert!(!CustomerError::NotFound.is_client_error());
    }
}
