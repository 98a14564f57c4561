//! Payload validation for handlers.
//!
//! Handlers declare a schema next to their route and call
//! [`validate_payload`] before touching the body. Invalid input becomes a 422
//! carrying the field -> message map; a broken schema becomes a 500.

use dockyard_core::error::CoreError;
use dockyard_core::validation::{evaluate_schema_with, CompiledSchema, RuleRegistry, ValidationSchema};
use serde_json::{Map, Value};

use crate::error::{AppError, AppResult};

/// Validate a decoded JSON body and hand back its fields.
pub fn validate_payload<'a>(
    schema: &ValidationSchema,
    body: &'a Value,
) -> AppResult<&'a Map<String, Value>> {
    validate_payload_with(RuleRegistry::global(), schema, body)
}

pub fn validate_payload_with<'a>(
    registry: &RuleRegistry,
    schema: &ValidationSchema,
    body: &'a Value,
) -> AppResult<&'a Map<String, Value>> {
    let data = as_object(body)?;
    evaluate_schema_with(registry, schema, data)?
        .into_result()
        .map_err(CoreError::Validation)?;
    Ok(data)
}

/// Same as [`validate_payload`] for a schema compiled at startup.
pub fn validate_compiled<'a>(
    schema: &CompiledSchema,
    body: &'a Value,
) -> AppResult<&'a Map<String, Value>> {
    let data = as_object(body)?;
    schema
        .validate(data)?
        .into_result()
        .map_err(CoreError::Validation)?;
    Ok(data)
}

pub(crate) fn as_object(body: &Value) -> AppResult<&Map<String, Value>> {
    body.as_object()
        .ok_or_else(|| AppError::BadRequest("Request body must be a JSON object".into()))
}
