//! Rule-based payload validation engine.
//!
//! Schemas map field names to rule pipelines such as `"required|string|max:255"`.
//! Each field is evaluated in declaration order and stops at its first failing
//! rule, so a field carries at most one error message.

pub mod coerce;
pub mod compiled;
pub mod evaluator;
pub mod registry;
pub mod result;
pub mod rule;
pub mod rules;

pub use compiled::CompiledSchema;
pub use evaluator::{evaluate_field, evaluate_schema, evaluate_schema_with, evaluate_single_rule};
pub use registry::{RuleContext, RuleEntry, RuleFn, RuleOutcome, RuleRegistry};
pub use result::{RuleCheck, ValidationErrors, ValidationResult};
pub use rule::{format_pipeline, FieldSchema, RuleSpec, ValidationSchema};
