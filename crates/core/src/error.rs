use crate::validation::result::ValidationErrors;

/// Domain-level errors surfaced to the HTTP layer.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// A schema configuration defect detected while running a rule.
///
/// These are programmer errors (a typo in a schema literal, a rule missing its
/// limit) and are never reported as per-field validation messages.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuleError {
    #[error("Unknown validation rule: {name}")]
    UnknownRule { name: String },

    #[error("Rule '{rule}' expects at least {expected} parameter(s), got {actual}")]
    MissingParameter {
        rule: String,
        expected: usize,
        actual: usize,
    },

    #[error("Rule '{rule}' has a non-numeric parameter: {value:?}")]
    InvalidParameter { rule: String, value: String },
}
