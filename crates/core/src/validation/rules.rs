//! Built-in rule implementations.
//!
//! Messages are Spanish because they are shown verbatim in the dock
//! operations UI next to the offending input.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;
use serde_json::Value;
use validator::ValidateUrl;

use super::coerce::{is_present, length, loosely_equal, parse_float, stringify};
use super::registry::{RuleContext, RuleOutcome};
use crate::error::RuleError;

pub const REQUIRED: &str = "required";
pub const STRING: &str = "string";
pub const JSON: &str = "json";
pub const INTEGER: &str = "integer";
pub const NUMERIC: &str = "numeric";
pub const BOOLEAN: &str = "boolean";
pub const ARRAY: &str = "array";
pub const OBJECT: &str = "object";
pub const EMAIL: &str = "email";
pub const URL: &str = "url";
pub const UUID: &str = "uuid";
pub const DATE: &str = "date";
pub const REGEX: &str = "regex";
pub const IN: &str = "in";
pub const NOT_IN: &str = "not_in";
pub const MIN: &str = "min";
pub const MAX: &str = "max";
pub const BETWEEN: &str = "between";
pub const CONFIRMED: &str = "confirmed";
pub const SAME: &str = "same";
pub const REQUIRED_IF: &str = "required_if";
pub const REQUIRED_UNLESS: &str = "required_unless";
pub const NULLABLE: &str = "nullable";
pub const SOMETIMES: &str = "sometimes";
pub const PRESENT: &str = "present";

/// Suffix looked up by `confirmed`: `password` is compared to `password_confirmation`.
pub const CONFIRMATION_SUFFIX: &str = "_confirmation";

/// Message for size rules applied to values that have neither a length nor a number.
pub const NOT_APPLICABLE: &str = "no aplicable para este tipo";

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid regex"));

static UUID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[0-9a-f]{8}-[0-9a-f]{4}-[1-5][0-9a-f]{3}-[89ab][0-9a-f]{3}-[0-9a-f]{12}$")
        .expect("valid regex")
});

/// Largest absolute timestamp (ms) a date may carry: 100 million days.
const MAX_TIMESTAMP_MS: f64 = 8.64e15;

const NAIVE_DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

type Outcome = Result<RuleOutcome, RuleError>;

fn verdict(passed: bool, message: &str) -> Outcome {
    Ok(RuleOutcome::check(passed, || message.to_string()))
}

pub fn required(ctx: &RuleContext<'_>) -> Outcome {
    verdict(is_present(ctx.value), "requerido")
}

pub fn string(ctx: &RuleContext<'_>) -> Outcome {
    verdict(matches!(ctx.value, Some(Value::String(_))), "debe ser texto")
}

/// Any non-null object, arrays included.
pub fn json(ctx: &RuleContext<'_>) -> Outcome {
    verdict(
        matches!(ctx.value, Some(Value::Object(_) | Value::Array(_))),
        "debe ser un objeto JSON válido",
    )
}

pub fn integer(ctx: &RuleContext<'_>) -> Outcome {
    let passed = match ctx.value {
        Some(Value::Number(n)) => {
            n.is_i64()
                || n.is_u64()
                || n.as_f64().is_some_and(|f| f.is_finite() && f.fract() == 0.0)
        }
        _ => false,
    };
    verdict(passed, "debe ser un entero")
}

pub fn numeric(ctx: &RuleContext<'_>) -> Outcome {
    verdict(parse_float(ctx.value).is_some(), "debe ser numérico")
}

pub fn boolean(ctx: &RuleContext<'_>) -> Outcome {
    verdict(matches!(ctx.value, Some(Value::Bool(_))), "debe ser booleano")
}

pub fn array(ctx: &RuleContext<'_>) -> Outcome {
    verdict(matches!(ctx.value, Some(Value::Array(_))), "debe ser un arreglo")
}

pub fn object(ctx: &RuleContext<'_>) -> Outcome {
    verdict(matches!(ctx.value, Some(Value::Object(_))), "debe ser un objeto")
}

pub fn email(ctx: &RuleContext<'_>) -> Outcome {
    verdict(
        EMAIL_RE.is_match(&stringify(ctx.value)),
        "formato de email inválido",
    )
}

pub fn url(ctx: &RuleContext<'_>) -> Outcome {
    verdict(stringify(ctx.value).validate_url(), "URL inválida")
}

pub fn uuid(ctx: &RuleContext<'_>) -> Outcome {
    verdict(UUID_RE.is_match(&stringify(ctx.value)), "UUID inválido")
}

pub fn date(ctx: &RuleContext<'_>) -> Outcome {
    let passed = match ctx.value {
        Some(Value::Number(n)) => n
            .as_f64()
            .is_some_and(|ms| ms.is_finite() && ms.abs() <= MAX_TIMESTAMP_MS),
        Some(Value::String(s)) => is_date_string(s.trim()),
        _ => false,
    };
    verdict(passed, "fecha inválida")
}

fn is_date_string(s: &str) -> bool {
    DateTime::parse_from_rfc3339(s).is_ok()
        || DateTime::parse_from_rfc2822(s).is_ok()
        || NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
        || NAIVE_DATETIME_FORMATS
            .iter()
            .any(|format| NaiveDateTime::parse_from_str(s, format).is_ok())
}

/// Params are rejoined with `,` so patterns may use `{1,3}` quantifiers.
///
/// Look-around and backreferences are supported. A pattern that does not
/// compile fails the field instead of erroring.
pub fn matches_pattern(ctx: &RuleContext<'_>) -> Outcome {
    let pattern = ctx.params.join(",");
    match fancy_regex::Regex::new(&pattern) {
        Ok(re) => {
            let matched = re.is_match(&stringify(ctx.value)).unwrap_or_else(|err| {
                tracing::debug!(pattern = %pattern, error = %err, "Regex rule gave up matching");
                false
            });
            Ok(RuleOutcome::check(matched, || {
                format!("no coincide con {pattern}")
            }))
        }
        Err(err) => {
            tracing::debug!(pattern = %pattern, error = %err, "Invalid regex rule pattern");
            verdict(false, "patrón de regex inválido")
        }
    }
}

pub fn one_of(ctx: &RuleContext<'_>) -> Outcome {
    let value = stringify(ctx.value);
    Ok(RuleOutcome::check(
        ctx.params.iter().any(|allowed| *allowed == value),
        || format!("debe ser uno de [{}]", ctx.params.join(", ")),
    ))
}

pub fn not_one_of(ctx: &RuleContext<'_>) -> Outcome {
    let value = stringify(ctx.value);
    Ok(RuleOutcome::check(
        !ctx.params.iter().any(|forbidden| *forbidden == value),
        || format!("no puede ser ninguno de [{}]", ctx.params.join(", ")),
    ))
}

/// How a size rule measures the value under test.
enum Size {
    Length(f64),
    Number(f64),
    NotApplicable,
}

fn measure(value: Option<&Value>) -> Size {
    if let Some(len) = length(value) {
        return Size::Length(len as f64);
    }
    match parse_float(value) {
        Some(n) => Size::Number(n),
        None => Size::NotApplicable,
    }
}

pub fn min(ctx: &RuleContext<'_>) -> Outcome {
    let limit = ctx.numeric_param(MIN, 0)?;
    let raw = ctx.param(0);
    Ok(match measure(ctx.value) {
        Size::Length(len) => RuleOutcome::check(len >= limit, || format!("mínimo {raw}")),
        Size::Number(n) => RuleOutcome::check(n >= limit, || format!("debe ser ≥ {raw}")),
        Size::NotApplicable => RuleOutcome::Fail(NOT_APPLICABLE.to_string()),
    })
}

pub fn max(ctx: &RuleContext<'_>) -> Outcome {
    let limit = ctx.numeric_param(MAX, 0)?;
    let raw = ctx.param(0);
    Ok(match measure(ctx.value) {
        Size::Length(len) => RuleOutcome::check(len <= limit, || format!("máximo {raw}")),
        Size::Number(n) => RuleOutcome::check(n <= limit, || format!("debe ser ≤ {raw}")),
        Size::NotApplicable => RuleOutcome::Fail(NOT_APPLICABLE.to_string()),
    })
}

pub fn between(ctx: &RuleContext<'_>) -> Outcome {
    let low = ctx.numeric_param(BETWEEN, 0)?;
    let high = ctx.numeric_param(BETWEEN, 1)?;
    let within = |x: f64| x >= low && x <= high;
    let message = || format!("entre {} y {}", ctx.param(0), ctx.param(1));
    Ok(match measure(ctx.value) {
        Size::Length(x) | Size::Number(x) => RuleOutcome::check(within(x), message),
        Size::NotApplicable => RuleOutcome::Fail(NOT_APPLICABLE.to_string()),
    })
}

/// Without a field context the lookup key is `undefined_confirmation`.
pub fn confirmed(ctx: &RuleContext<'_>) -> Outcome {
    let key = format!("{}{CONFIRMATION_SUFFIX}", ctx.field.unwrap_or("undefined"));
    verdict(
        loosely_equal(ctx.value, ctx.other(&key)),
        "no coincide con la confirmación",
    )
}

pub fn same(ctx: &RuleContext<'_>) -> Outcome {
    let other = ctx.param(0);
    Ok(RuleOutcome::check(loosely_equal(ctx.value, ctx.other(other)), || {
        format!("debe coincidir con {other}")
    }))
}

pub fn required_if(ctx: &RuleContext<'_>) -> Outcome {
    let (field, expected) = (ctx.param(0), ctx.param(1));
    let applies = stringify(ctx.other(field)) == expected;
    Ok(RuleOutcome::check(!applies || is_present(ctx.value), || {
        format!("requerido cuando {field} es {expected}")
    }))
}

pub fn required_unless(ctx: &RuleContext<'_>) -> Outcome {
    let (field, expected) = (ctx.param(0), ctx.param(1));
    let applies = stringify(ctx.other(field)) != expected;
    Ok(RuleOutcome::check(!applies || is_present(ctx.value), || {
        format!("requerido a menos que {field} sea {expected}")
    }))
}

/// `nullable` and `sometimes` only steer the evaluator.
pub fn marker(_ctx: &RuleContext<'_>) -> Outcome {
    Ok(RuleOutcome::Pass)
}

pub fn present(ctx: &RuleContext<'_>) -> Outcome {
    verdict(
        ctx.field.is_some_and(|field| ctx.data.contains_key(field)),
        "debe estar presente",
    )
}
