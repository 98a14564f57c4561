//! Rule registry: static mapping from rule name to its check function.

use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

use serde_json::{Map, Value};

use super::rules;
use crate::error::RuleError;

/// Signature every rule implements.
pub type RuleFn = fn(&RuleContext<'_>) -> Result<RuleOutcome, RuleError>;

static GLOBAL: LazyLock<RuleRegistry> = LazyLock::new(RuleRegistry::builtin);

/// Everything a rule may look at.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    /// Name of the field under evaluation, when known.
    pub field: Option<&'a str>,
    /// The field's value. `None` means the key is missing from the payload.
    pub value: Option<&'a Value>,
    pub params: &'a [String],
    /// The whole payload, for cross-field rules.
    pub data: &'a Map<String, Value>,
}

impl<'a> RuleContext<'a> {
    /// Context for `field` within `data`.
    pub fn for_field(field: &'a str, params: &'a [String], data: &'a Map<String, Value>) -> Self {
        Self {
            field: Some(field),
            value: data.get(field),
            params,
            data,
        }
    }

    pub fn param(&self, index: usize) -> &'a str {
        self.params.get(index).map(String::as_str).unwrap_or_default()
    }

    /// Parse a numeric limit parameter. A non-numeric limit is a schema defect.
    pub fn numeric_param(&self, rule: &str, index: usize) -> Result<f64, RuleError> {
        let raw = self.param(index);
        raw.trim()
            .parse::<f64>()
            .ok()
            .filter(|limit| !limit.is_nan())
            .ok_or_else(|| RuleError::InvalidParameter {
                rule: rule.to_string(),
                value: raw.to_string(),
            })
    }

    /// The value stored under another key of the payload.
    pub fn other(&self, field: &str) -> Option<&'a Value> {
        self.data.get(field)
    }
}

/// Result of running one rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleOutcome {
    Pass,
    Fail(String),
}

impl RuleOutcome {
    pub fn check(passed: bool, message: impl FnOnce() -> String) -> Self {
        if passed {
            RuleOutcome::Pass
        } else {
            RuleOutcome::Fail(message())
        }
    }

    pub fn is_pass(&self) -> bool {
        matches!(self, RuleOutcome::Pass)
    }
}

/// A registered rule and the number of parameters it cannot run without.
#[derive(Clone, Copy)]
pub struct RuleEntry {
    pub check: RuleFn,
    pub min_params: usize,
}

impl RuleEntry {
    pub fn ensure_arity(&self, rule: &str, actual: usize) -> Result<(), RuleError> {
        if actual < self.min_params {
            return Err(RuleError::MissingParameter {
                rule: rule.to_string(),
                expected: self.min_params,
                actual,
            });
        }
        Ok(())
    }

    pub fn run(&self, rule: &str, ctx: &RuleContext<'_>) -> Result<RuleOutcome, RuleError> {
        self.ensure_arity(rule, ctx.params.len())?;
        (self.check)(ctx)
    }
}

/// Name-keyed rule table. Read-only once built.
#[derive(Clone, Default)]
pub struct RuleRegistry {
    rules: HashMap<&'static str, RuleEntry>,
}

impl RuleRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every built-in rule.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry
            .register(rules::REQUIRED, 0, rules::required)
            .register(rules::STRING, 0, rules::string)
            .register(rules::JSON, 0, rules::json)
            .register(rules::INTEGER, 0, rules::integer)
            .register(rules::NUMERIC, 0, rules::numeric)
            .register(rules::BOOLEAN, 0, rules::boolean)
            .register(rules::ARRAY, 0, rules::array)
            .register(rules::OBJECT, 0, rules::object)
            .register(rules::EMAIL, 0, rules::email)
            .register(rules::URL, 0, rules::url)
            .register(rules::UUID, 0, rules::uuid)
            .register(rules::DATE, 0, rules::date)
            .register(rules::REGEX, 1, rules::matches_pattern)
            .register(rules::IN, 0, rules::one_of)
            .register(rules::NOT_IN, 0, rules::not_one_of)
            .register(rules::MIN, 1, rules::min)
            .register(rules::MAX, 1, rules::max)
            .register(rules::BETWEEN, 2, rules::between)
            .register(rules::CONFIRMED, 0, rules::confirmed)
            .register(rules::SAME, 1, rules::same)
            .register(rules::REQUIRED_IF, 2, rules::required_if)
            .register(rules::REQUIRED_UNLESS, 2, rules::required_unless)
            .register(rules::NULLABLE, 0, rules::marker)
            .register(rules::SOMETIMES, 0, rules::marker)
            .register(rules::PRESENT, 0, rules::present);
        registry
    }

    /// The process-wide built-in registry.
    pub fn global() -> &'static RuleRegistry {
        &GLOBAL
    }

    /// Add or replace a rule.
    pub fn register(&mut self, name: &'static str, min_params: usize, check: RuleFn) -> &mut Self {
        self.rules.insert(name, RuleEntry { check, min_params });
        self
    }

    pub fn get(&self, name: &str) -> Option<RuleEntry> {
        self.rules.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.rules.contains_key(name)
    }

    /// Registered rule names, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.rules.keys().copied().collect();
        names.sort_unstable();
        names
    }

    pub fn resolve(&self, name: &str) -> Result<RuleEntry, RuleError> {
        self.get(name).ok_or_else(|| {
            tracing::warn!(rule = %name, "Unknown validation rule referenced");
            RuleError::UnknownRule {
                name: name.to_string(),
            }
        })
    }

    /// Run the rule called `name`.
    pub fn invoke(&self, name: &str, ctx: &RuleContext<'_>) -> Result<RuleOutcome, RuleError> {
        tracing::trace!(rule = %name, field = ?ctx.field, "Running validation rule");
        self.resolve(name)?.run(name, ctx)
    }
}

impl fmt::Debug for RuleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleRegistry")
            .field("rules", &self.names())
            .finish()
    }
}
