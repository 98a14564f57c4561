//! Validation result types.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::registry::RuleOutcome;

/// Outcome of validating one payload against a schema.
///
/// Holds at most one message per field: the first rule that failed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: IndexMap<String, String>,
}

impl ValidationResult {
    pub fn from_errors(errors: IndexMap<String, String>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }

    /// The message recorded for `field`, if it failed.
    pub fn error(&self, field: &str) -> Option<&str> {
        self.errors.get(field).map(String::as_str)
    }

    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.valid {
            Ok(())
        } else {
            Err(ValidationErrors(self.errors))
        }
    }
}

/// Field to message map carried by a failed validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors(pub IndexMap<String, String>);

impl ValidationErrors {
    pub fn fields(&self) -> &IndexMap<String, String> {
        &self.0
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (field, message)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {message}")?;
        }
        Ok(())
    }
}

/// Result of evaluating a single rule outside a schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleCheck {
    pub valid: bool,
    pub message: Option<String>,
}

impl From<RuleOutcome> for RuleCheck {
    fn from(outcome: RuleOutcome) -> Self {
        match outcome {
            RuleOutcome::Pass => Self {
                valid: true,
                message: None,
            },
            RuleOutcome::Fail(message) => Self {
                valid: false,
                message: Some(message),
            },
        }
    }
}
