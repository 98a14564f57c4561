//! Handlers for the `/validation` resource.
//!
//! Lets the admin UI list the available rules and dry-run a schema against a
//! sample payload before the schema is wired into a form.

use axum::extract::State;
use axum::Json;
use dockyard_core::validation::{
    evaluate_schema_with, RuleCheck, RuleContext, ValidationResult, ValidationSchema,
};
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;
use crate::validate::as_object;

/// GET /api/v1/validation/rules
///
/// List every registered rule name.
pub async fn list_rules(State(state): State<AppState>) -> Json<DataResponse<Vec<&'static str>>> {
    Json(DataResponse {
        data: state.rules.names(),
    })
}

/// Request body for the dry-run endpoint.
#[derive(Debug, Deserialize)]
pub struct ValidateRequest {
    pub schema: ValidationSchema,
    #[serde(default = "empty_object")]
    pub data: Value,
}

/// POST /api/v1/validation/validate
///
/// Evaluate a client-supplied schema against `data`. Always 200 with the
/// result; an unknown rule in the submitted schema is the client's mistake
/// here, so it maps to 400 rather than 500.
pub async fn validate(
    State(state): State<AppState>,
    Json(input): Json<ValidateRequest>,
) -> AppResult<Json<DataResponse<ValidationResult>>> {
    let data = as_object(&input.data)?;
    let result = evaluate_schema_with(state.rules, &input.schema, data)
        .map_err(|err| AppError::BadRequest(err.to_string()))?;

    tracing::debug!(
        fields = input.schema.len(),
        failed = result.errors.len(),
        "Dry-run validation complete"
    );
    Ok(Json(DataResponse { data: result }))
}

/// Request body for the single-rule endpoint.
#[derive(Debug, Deserialize)]
pub struct CheckRuleRequest {
    pub rule: String,
    /// Missing means "take it from `data[field]`"; `null` is a real value.
    #[serde(default, deserialize_with = "present_value")]
    pub value: Option<Value>,
    #[serde(default)]
    pub params: Vec<String>,
    #[serde(default)]
    pub data: Map<String, Value>,
    pub field: Option<String>,
}

/// POST /api/v1/validation/check
///
/// Run one rule against one value.
pub async fn check_rule(
    State(state): State<AppState>,
    Json(input): Json<CheckRuleRequest>,
) -> AppResult<Json<DataResponse<RuleCheck>>> {
    let field = input.field.as_deref();
    let value = input
        .value
        .as_ref()
        .or_else(|| field.and_then(|f| input.data.get(f)));
    let ctx = RuleContext {
        field,
        value,
        params: &input.params,
        data: &input.data,
    };

    let outcome = state
        .rules
        .invoke(&input.rule, &ctx)
        .map_err(|err| AppError::BadRequest(err.to_string()))?;
    Ok(Json(DataResponse {
        data: RuleCheck::from(outcome),
    }))
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}

fn present_value<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}
