//! Schemas parsed and resolved once, for handlers that validate on every request.

use indexmap::IndexMap;
use serde_json::{Map, Value};

use super::evaluator::skips_field;
use super::registry::{RuleContext, RuleEntry, RuleOutcome, RuleRegistry};
use super::result::ValidationResult;
use super::rule::{RuleSpec, ValidationSchema};
use super::rules::{NULLABLE, SOMETIMES};
use crate::error::RuleError;

#[derive(Clone)]
struct CompiledRule {
    spec: RuleSpec,
    entry: RuleEntry,
}

#[derive(Clone)]
struct CompiledField {
    name: String,
    rules: Vec<CompiledRule>,
    nullable: bool,
    sometimes: bool,
}

/// A [`ValidationSchema`] with every rule name resolved and arity checked.
///
/// Unlike [`evaluate_schema`](super::evaluate_schema), compilation rejects an
/// unknown rule even when no payload would ever reach it.
#[derive(Clone)]
pub struct CompiledSchema {
    fields: Vec<CompiledField>,
}

impl ValidationSchema {
    pub fn compile(&self, registry: &RuleRegistry) -> Result<CompiledSchema, RuleError> {
        let fields = self
            .iter()
            .map(|(name, field_schema)| {
                let rules = field_schema
                    .parse()
                    .into_iter()
                    .map(|spec| {
                        let entry = registry.resolve(&spec.name)?;
                        entry.ensure_arity(&spec.name, spec.params.len())?;
                        Ok(CompiledRule { spec, entry })
                    })
                    .collect::<Result<Vec<_>, RuleError>>()?;
                let has = |marker: &str| rules.iter().any(|rule| rule.spec.name == marker);
                Ok(CompiledField {
                    name: name.clone(),
                    nullable: has(NULLABLE),
                    sometimes: has(SOMETIMES),
                    rules,
                })
            })
            .collect::<Result<Vec<_>, RuleError>>()?;

        Ok(CompiledSchema { fields })
    }
}

impl CompiledSchema {
    /// Validate a payload.
    ///
    /// Still fallible: a non-numeric size limit is only detected when the
    /// rule runs.
    pub fn validate(&self, data: &Map<String, Value>) -> Result<ValidationResult, RuleError> {
        let mut errors = IndexMap::new();

        for field in &self.fields {
            if skips_field(data.get(&field.name), field.nullable, field.sometimes) {
                continue;
            }
            for rule in &field.rules {
                let ctx = RuleContext::for_field(&field.name, &rule.spec.params, data);
                if let RuleOutcome::Fail(message) = (rule.entry.check)(&ctx)? {
                    tracing::debug!(field = %field.name, message = %message, "Field failed validation");
                    errors.insert(field.name.clone(), message);
                    break;
                }
            }
        }

        Ok(ValidationResult::from_errors(errors))
    }

    /// Field names in evaluation order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|field| field.name.as_str())
    }
}

impl std::fmt::Debug for CompiledSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // List form: a pipe-joined pipeline is ambiguous once a param holds `|`.
        f.debug_map()
            .entries(self.fields.iter().map(|field| {
                let rules: Vec<_> = field.rules.iter().map(|rule| rule.spec.to_string()).collect();
                (&field.name, rules)
            }))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::evaluate_schema;
    use assert_matches::assert_matches;
    use serde_json::json;

    fn reception_schema() -> ValidationSchema {
        ValidationSchema::new()
            .field("vessel", "required|string|max:40")
            .field("imo", "required|regex:^\\d{7}$")
            .field("berth", "required|integer|between:1,12")
            .field("eta", "nullable|date")
            .field("inspector_email", "required_if:inspection,true|email")
    }

    #[test]
    fn unknown_rule_rejected_at_compile_time() {
        let schema = ValidationSchema::new().field("vessel", "required|no_such_rule");
        let err = schema.compile(RuleRegistry::global()).unwrap_err();
        assert_matches!(err, RuleError::UnknownRule { ref name } if name == "no_such_rule");
    }

    #[test]
    fn arity_checked_at_compile_time() {
        let schema = ValidationSchema::new().field("berth", "between:1");
        let err = schema.compile(RuleRegistry::global()).unwrap_err();
        assert_matches!(err, RuleError::MissingParameter { expected: 2, actual: 1, .. });
    }

    #[test]
    fn matches_lazy_evaluation() {
        let schema = reception_schema();
        let compiled = schema.compile(RuleRegistry::global()).unwrap();

        let payloads = [
            json!({"vessel": "Aurora", "imo": "9321483", "berth": 4, "eta": null}),
            json!({"vessel": "", "imo": "93x", "berth": 14, "eta": "ayer"}),
            json!({"imo": "9321483", "berth": "4", "inspection": true}),
            json!({"vessel": "Aurora", "imo": "9321483", "berth": 1, "inspection": true,
                   "inspector_email": "jefe@puerto"}),
        ];
        for payload in payloads {
            let data = payload.as_object().unwrap();
            assert_eq!(
                compiled.validate(data).unwrap(),
                evaluate_schema(&schema, data).unwrap(),
                "diverged on {payload}"
            );
        }
    }

    #[test]
    fn debug_lists_rules_without_joining_pipes() {
        let schema = ValidationSchema::new()
            .field("berth", "required|integer")
            .field("shift", vec!["required", "regex:^(dia|noche)$"]);
        let compiled = schema.compile(RuleRegistry::global()).unwrap();
        assert_eq!(
            format!("{compiled:?}"),
            r#"{"berth": ["required", "integer"], "shift": ["required", "regex:^(dia|noche)$"]}"#
        );
    }

    #[test]
    fn keeps_declaration_order() {
        let compiled = reception_schema().compile(RuleRegistry::global()).unwrap();
        let names: Vec<_> = compiled.field_names().collect();
        assert_eq!(names, vec!["vessel", "imo", "berth", "eta", "inspector_email"]);
    }
}
