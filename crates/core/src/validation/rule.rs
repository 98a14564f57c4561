//! Rule pipeline parsing and schema types.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Separates rules inside a pipeline string.
pub const RULE_SEPARATOR: char = '|';
/// Separates a rule name from its parameter list.
pub const PARAM_MARKER: char = ':';
/// Separates individual parameters.
pub const PARAM_SEPARATOR: char = ',';

/// One named rule plus its string parameters, e.g. `between:1,10`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RuleSpec {
    pub name: String,
    #[serde(default)]
    pub params: Vec<String>,
}

impl RuleSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
        }
    }

    pub fn with_params<I, S>(name: impl Into<String>, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            params: params.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse a single rule token.
    ///
    /// The name ends at the first `:`; everything after it is split on `,`.
    /// A token without `:` has no parameters. Names are not checked here:
    /// unknown rules are reported when they are invoked.
    pub fn parse(token: &str) -> Self {
        match token.split_once(PARAM_MARKER) {
            Some((name, raw)) => Self {
                name: name.to_string(),
                params: raw.split(PARAM_SEPARATOR).map(str::to_string).collect(),
            },
            None => Self::new(token),
        }
    }
}

impl FromStr for RuleSpec {
    type Err = Infallible;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(token))
    }
}

impl fmt::Display for RuleSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if !self.params.is_empty() {
            write!(f, "{PARAM_MARKER}{}", self.params.join(","))?;
        }
        Ok(())
    }
}

/// Serialize a parsed rule list back into its pipe-delimited form.
///
/// Re-parsing the result only yields the same rules when no parameter
/// contains `|`; keep such pipelines in [`FieldSchema::Rules`] form.
pub fn format_pipeline(rules: &[RuleSpec]) -> String {
    rules
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("|")
}

/// A field's rule pipeline, either `"required|email"` or `["required", "email"]`.
///
/// The list form lets a rule parameter contain `|` (regex alternations).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldSchema {
    Pipeline(String),
    Rules(Vec<String>),
}

impl FieldSchema {
    /// Parse into an ordered rule list. Empty segments are skipped.
    pub fn parse(&self) -> Vec<RuleSpec> {
        match self {
            FieldSchema::Pipeline(pipeline) => pipeline
                .split(RULE_SEPARATOR)
                .filter(|token| !token.is_empty())
                .map(RuleSpec::parse)
                .collect(),
            FieldSchema::Rules(tokens) => tokens
                .iter()
                .filter(|token| !token.is_empty())
                .map(|token| RuleSpec::parse(token))
                .collect(),
        }
    }
}

impl From<&str> for FieldSchema {
    fn from(pipeline: &str) -> Self {
        FieldSchema::Pipeline(pipeline.to_string())
    }
}

impl From<String> for FieldSchema {
    fn from(pipeline: String) -> Self {
        FieldSchema::Pipeline(pipeline)
    }
}

impl From<Vec<String>> for FieldSchema {
    fn from(tokens: Vec<String>) -> Self {
        FieldSchema::Rules(tokens)
    }
}

impl From<Vec<&str>> for FieldSchema {
    fn from(tokens: Vec<&str>) -> Self {
        FieldSchema::Rules(tokens.into_iter().map(str::to_string).collect())
    }
}

/// Field name to rule pipeline. Fields are evaluated in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationSchema {
    fields: IndexMap<String, FieldSchema>,
}

impl ValidationSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style field declaration.
    ///
    /// ```
    /// use dockyard_core::validation::ValidationSchema;
    ///
    /// let schema = ValidationSchema::new()
    ///     .field("email", "required|email")
    ///     .field("age", "nullable|integer|min:18");
    /// assert_eq!(schema.len(), 2);
    /// ```
    pub fn field(mut self, name: impl Into<String>, schema: impl Into<FieldSchema>) -> Self {
        self.insert(name, schema);
        self
    }

    /// Declare or replace a field. A replaced field keeps its original position.
    pub fn insert(&mut self, name: impl Into<String>, schema: impl Into<FieldSchema>) {
        self.fields.insert(name.into(), schema.into());
    }

    pub fn get(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldSchema)> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for ValidationSchema
where
    K: Into<String>,
    V: Into<FieldSchema>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(name, schema)| (name.into(), schema.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_name_and_params() {
        let spec = RuleSpec::parse("between:1,10");
        assert_eq!(spec.name, "between");
        assert_eq!(spec.params, vec!["1", "10"]);
    }

    #[test]
    fn token_without_colon_has_no_params() {
        assert!(RuleSpec::parse("required").params.is_empty());
    }

    #[test]
    fn only_first_colon_splits_name() {
        let spec = RuleSpec::parse("regex:^\\d{2}:\\d{2}$");
        assert_eq!(spec.name, "regex");
        assert_eq!(spec.params, vec!["^\\d{2}:\\d{2}$"]);
    }

    #[test]
    fn trailing_colon_yields_one_empty_param() {
        assert_eq!(RuleSpec::parse("min:").params, vec![String::new()]);
    }

    #[test]
    fn pipeline_keeps_declared_order() {
        let rules = FieldSchema::from("required|string|max:255").parse();
        let names: Vec<_> = rules.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["required", "string", "max"]);
        assert_eq!(rules[2].params, vec!["255"]);
    }

    #[test]
    fn empty_segments_are_skipped() {
        let rules = FieldSchema::from("required||string|").parse();
        assert_eq!(rules.len(), 2);
    }

    #[test]
    fn list_form_allows_pipes_in_params() {
        let rules = FieldSchema::from(vec!["required", "regex:^(dock|berth)$"]).parse();
        assert_eq!(rules[1].params, vec!["^(dock|berth)$"]);
    }

    #[test]
    fn pipeline_parsing_is_idempotent() {
        let first = FieldSchema::from("required|min:3|max:10").parse();
        let reparsed = FieldSchema::from(format_pipeline(&first)).parse();
        assert_eq!(first, reparsed);
        assert_eq!(format_pipeline(&first), "required|min:3|max:10");
    }

    #[test]
    fn schema_deserializes_in_declaration_order() {
        let schema: ValidationSchema = serde_json::from_str(
            r#"{"vessel": "required", "berth": ["required", "integer"], "arrival": "date"}"#,
        )
        .unwrap();
        let names: Vec<_> = schema.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, vec!["vessel", "berth", "arrival"]);
        assert_eq!(
            schema.get("berth"),
            Some(&FieldSchema::Rules(vec!["required".into(), "integer".into()]))
        );
    }
}
