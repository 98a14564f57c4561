//! Schema evaluator — pure logic, no I/O.

use indexmap::IndexMap;
use serde_json::{Map, Value};

use super::registry::{RuleContext, RuleOutcome, RuleRegistry};
use super::result::{RuleCheck, ValidationResult};
use super::rule::{RuleSpec, ValidationSchema};
use super::rules::{NULLABLE, SOMETIMES};
use crate::error::RuleError;

/// Evaluate one rule by name against a bare value, using the built-in registry.
///
/// No field context is available, so `present` always fails and `confirmed`
/// looks up `undefined_confirmation`.
pub fn evaluate_single_rule(
    name: &str,
    value: Option<&Value>,
    params: &[String],
    data: &Map<String, Value>,
) -> Result<RuleCheck, RuleError> {
    let ctx = RuleContext {
        field: None,
        value,
        params,
        data,
    };
    RuleRegistry::global().invoke(name, &ctx).map(RuleCheck::from)
}

/// Evaluate every field of `schema` against `data` with the built-in registry.
///
/// Only schema defects (unknown rule, missing or non-numeric limit) are
/// returned as `Err`; bad input always lands in [`ValidationResult::errors`].
pub fn evaluate_schema(
    schema: &ValidationSchema,
    data: &Map<String, Value>,
) -> Result<ValidationResult, RuleError> {
    evaluate_schema_with(RuleRegistry::global(), schema, data)
}

pub fn evaluate_schema_with(
    registry: &RuleRegistry,
    schema: &ValidationSchema,
    data: &Map<String, Value>,
) -> Result<ValidationResult, RuleError> {
    let mut errors = IndexMap::new();

    for (field, field_schema) in schema.iter() {
        let rules = field_schema.parse();
        if let Some(message) = evaluate_field(registry, field, &rules, data)? {
            tracing::debug!(field = %field, message = %message, "Field failed validation");
            errors.insert(field.clone(), message);
        }
    }

    Ok(ValidationResult::from_errors(errors))
}

/// Run one field's pipeline and return the first failure message.
///
/// Rule names are resolved only when reached, so an unknown rule after a
/// failing one is never reported.
pub fn evaluate_field(
    registry: &RuleRegistry,
    field: &str,
    rules: &[RuleSpec],
    data: &Map<String, Value>,
) -> Result<Option<String>, RuleError> {
    let has = |name: &str| rules.iter().any(|rule| rule.name == name);
    if skips_field(data.get(field), has(NULLABLE), has(SOMETIMES)) {
        return Ok(None);
    }

    for rule in rules {
        let ctx = RuleContext::for_field(field, &rule.params, data);
        if let RuleOutcome::Fail(message) = registry.invoke(&rule.name, &ctx)? {
            return Ok(Some(message));
        }
    }
    Ok(None)
}

/// `sometimes` skips a missing field; `nullable` skips a missing or null one.
pub(crate) fn skips_field(value: Option<&Value>, nullable: bool, sometimes: bool) -> bool {
    match value {
        None => sometimes || nullable,
        Some(Value::Null) => nullable,
        Some(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    fn data(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    fn signup_schema() -> ValidationSchema {
        ValidationSchema::new()
            .field("email", "required|email")
            .field("age", "nullable|integer|min:18")
    }

    #[test]
    fn reports_first_failure_per_field() {
        let result = evaluate_schema(&signup_schema(), &data(json!({"email": "bad", "age": 15})))
            .unwrap();
        assert!(!result.valid);
        assert_eq!(result.errors.len(), 2);
        assert_eq!(result.error("email"), Some("formato de email inválido"));
        assert_eq!(result.error("age"), Some("debe ser ≥ 18"));
    }

    #[test]
    fn nullable_skips_null_value() {
        let result =
            evaluate_schema(&signup_schema(), &data(json!({"email": "a@b.com", "age": null})))
                .unwrap();
        assert!(result.valid);
        assert!(result.errors.is_empty());
    }

    #[test]
    fn nullable_skips_missing_value() {
        let result = evaluate_schema(&signup_schema(), &data(json!({"email": "a@b.com"}))).unwrap();
        assert!(result.valid);
    }

    #[test]
    fn nullable_position_does_not_matter() {
        let schema = ValidationSchema::new().field("eta", "date|nullable");
        let result = evaluate_schema(&schema, &data(json!({"eta": null}))).unwrap();
        assert!(result.valid);
    }

    #[test]
    fn short_circuits_on_first_failing_rule() {
        let schema = ValidationSchema::new().field("berth", "required|integer|min:1");
        let result = evaluate_schema(&schema, &Map::new()).unwrap();
        assert_eq!(result.error("berth"), Some("requerido"));

        let result = evaluate_schema(&schema, &data(json!({"berth": "x"}))).unwrap();
        assert_eq!(result.error("berth"), Some("debe ser un entero"));
    }

    #[test]
    fn short_circuit_hides_later_unknown_rules() {
        let schema = ValidationSchema::new().field("vessel", "required|no_such_rule");
        let result = evaluate_schema(&schema, &Map::new()).unwrap();
        assert_eq!(result.error("vessel"), Some("requerido"));
    }

    #[test]
    fn nullable_skip_hides_unknown_rules() {
        let schema = ValidationSchema::new().field("x", "nullable|no_such_rule");
        let result = evaluate_schema(&schema, &data(json!({"x": null}))).unwrap();
        assert!(result.valid);

        let err = evaluate_schema(&schema, &data(json!({"x": 1}))).unwrap_err();
        assert_matches!(err, RuleError::UnknownRule { ref name } if name == "no_such_rule");
    }

    #[test]
    fn unknown_rule_propagates_when_reached() {
        let schema = ValidationSchema::new().field("vessel", "required|no_such_rule");
        let err = evaluate_schema(&schema, &data(json!({"vessel": "Aurora"}))).unwrap_err();
        assert_matches!(err, RuleError::UnknownRule { ref name } if name == "no_such_rule");
    }

    #[test]
    fn same_rule_names_other_field() {
        let schema = ValidationSchema::new()
            .field("password", "required")
            .field("password_confirmation", "same:password");
        let result = evaluate_schema(
            &schema,
            &data(json!({"password": "x", "password_confirmation": "y"})),
        )
        .unwrap();
        assert_eq!(
            result.error("password_confirmation"),
            Some("debe coincidir con password")
        );
        assert_eq!(result.error("password"), None);
    }

    #[test]
    fn confirmed_uses_current_field_context() {
        let schema = ValidationSchema::new().field("password", "required|confirmed");
        let ok = evaluate_schema(
            &schema,
            &data(json!({"password": "x", "password_confirmation": "x"})),
        )
        .unwrap();
        assert!(ok.valid);

        let bad = evaluate_schema(&schema, &data(json!({"password": "x"}))).unwrap();
        assert_eq!(bad.error("password"), Some("no coincide con la confirmación"));
    }

    #[test]
    fn required_if_depends_on_other_field() {
        let schema = ValidationSchema::new().field("b", "required_if:a,yes");
        let result = evaluate_schema(&schema, &data(json!({"a": "yes"}))).unwrap();
        assert_eq!(result.error("b"), Some("requerido cuando a es yes"));

        let result = evaluate_schema(&schema, &data(json!({"a": "no"}))).unwrap();
        assert!(result.valid);
    }

    #[test]
    fn sometimes_skips_missing_field_only() {
        let schema = ValidationSchema::new().field("notes", "sometimes|string|max:5");
        assert!(evaluate_schema(&schema, &Map::new()).unwrap().valid);

        let result = evaluate_schema(&schema, &data(json!({"notes": "demasiado"}))).unwrap();
        assert_eq!(result.error("notes"), Some("máximo 5"));

        let result = evaluate_schema(&schema, &data(json!({"notes": null}))).unwrap();
        assert_eq!(result.error("notes"), Some("debe ser texto"));
    }

    #[test]
    fn present_sees_null_keys() {
        let schema = ValidationSchema::new().field("remarks", "present");
        assert!(evaluate_schema(&schema, &data(json!({"remarks": null}))).unwrap().valid);
        assert_eq!(
            evaluate_schema(&schema, &Map::new()).unwrap().error("remarks"),
            Some("debe estar presente")
        );
    }

    #[test]
    fn errors_follow_schema_order() {
        let schema = ValidationSchema::new()
            .field("vessel", "required")
            .field("berth", "required")
            .field("arrival", "required");
        let result = evaluate_schema(&schema, &Map::new()).unwrap();
        let fields: Vec<_> = result.errors.keys().map(String::as_str).collect();
        assert_eq!(fields, vec!["vessel", "berth", "arrival"]);
    }

    #[test]
    fn fields_not_in_schema_are_ignored() {
        let schema = ValidationSchema::new().field("vessel", "required|string");
        let result =
            evaluate_schema(&schema, &data(json!({"vessel": "Aurora", "extra": 1}))).unwrap();
        assert!(result.valid);
    }

    #[test]
    fn single_rule_evaluation() {
        let check =
            evaluate_single_rule("min", Some(&json!("ab")), &["3".to_string()], &Map::new())
                .unwrap();
        assert!(!check.valid);
        assert_eq!(check.message.as_deref(), Some("mínimo 3"));

        let check = evaluate_single_rule("email", Some(&json!("a@b.co")), &[], &Map::new()).unwrap();
        assert_eq!(check, RuleCheck { valid: true, message: None });

        let err = evaluate_single_rule("nope", None, &[], &Map::new()).unwrap_err();
        assert_matches!(err, RuleError::UnknownRule { .. });
    }

    #[test]
    fn single_rule_present_fails_without_field_context() {
        let payload = data(json!({"remarks": null}));
        let check = evaluate_single_rule("present", Some(&Value::Null), &[], &payload).unwrap();
        assert_eq!(
            check,
            RuleCheck { valid: false, message: Some("debe estar presente".to_string()) }
        );
    }

    #[test]
    fn custom_registry_is_honoured() {
        fn even(ctx: &RuleContext<'_>) -> Result<RuleOutcome, RuleError> {
            let n = ctx.value.and_then(Value::as_i64).unwrap_or(1);
            Ok(RuleOutcome::check(n % 2 == 0, || "debe ser par".into()))
        }
        let mut registry = RuleRegistry::builtin();
        registry.register("even", 0, even);

        let schema = ValidationSchema::new().field("crates", "required|integer|even");
        let result = evaluate_schema_with(&registry, &schema, &data(json!({"crates": 3}))).unwrap();
        assert_eq!(result.error("crates"), Some("debe ser par"));
    }
}
