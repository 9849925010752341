//! Filter compilation: caller JSON → validated, typed predicate.
//!
//! Recognized keys and how each one matches:
//!
//! | key            | column                   | match                        |
//! |----------------|--------------------------|------------------------------|
//! | `id`           | vulnerability id         | exact UUID                   |
//! | `title`        | vulnerability title      | case-insensitive substring   |
//! | `domain`       | domain name              | case-insensitive substring   |
//! | `cpe`          | vulnerability cpe        | case-insensitive substring   |
//! | `severity`     | vulnerability severity   | case-insensitive exact       |
//! | `state`        | vulnerability state      | case-insensitive exact       |
//! | `substate`     | vulnerability substate   | case-insensitive exact       |
//! | `organization` | domain's organization id | exact UUID                   |
//! | `isKev`        | known-exploited flag     | exact boolean                |
//!
//! "Case-insensitive" folds ASCII letters only (`A`-`Z` to `a`-`z`). Other
//! characters, `É` included, must match exactly. Both stores apply the same
//! folding regardless of database locale.
//!
//! Unknown keys are ignored so older clients keep working when fields are
//! retired. `null` and empty strings count as "not filtered". A recognized key
//! carrying the wrong JSON type is rejected.

use serde_json::Value;
use uuid::Uuid;

use super::error::QueryError;
use crate::models::VulnerabilityRecord;

/// Compiled filter. Every field is `None` when not filtered on; all present
/// fields must match (logical AND).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VulnerabilityFilter {
    pub id: Option<Uuid>,
    pub title: Option<String>,
    pub domain: Option<String>,
    pub cpe: Option<String>,
    pub severity: Option<String>,
    pub state: Option<String>,
    pub substate: Option<String>,
    pub organization: Option<Uuid>,
    pub is_kev: Option<bool>,
}

impl VulnerabilityFilter {
    /// Compile the `filters` member of a search request.
    ///
    /// `None` and `{}` both compile to the match-all filter.
    pub fn compile(raw: Option<&Value>) -> Result<Self, QueryError> {
        let fields = match raw {
            None | Some(Value::Null) => return Ok(Self::default()),
            Some(Value::Object(fields)) => fields,
            Some(other) => {
                return Err(QueryError::InvalidFilter(format!(
                    "filters must be an object, got {}",
                    json_type(other)
                )))
            }
        };

        let mut filter = Self::default();

        for (key, value) in fields {
            match key.as_str() {
                "id" => filter.id = uuid_field(key, value)?,
                "title" => filter.title = text_field(key, value)?,
                "domain" => filter.domain = text_field(key, value)?,
                "cpe" => filter.cpe = text_field(key, value)?,
                "severity" => filter.severity = text_field(key, value)?,
                "state" => filter.state = text_field(key, value)?,
                "substate" => filter.substate = text_field(key, value)?,
                "organization" => filter.organization = uuid_field(key, value)?,
                "isKev" => filter.is_kev = bool_field(key, value)?,
                unknown => {
                    tracing::debug!(field = %unknown, "Ignoring unrecognized filter field");
                }
            }
        }

        Ok(filter)
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Evaluate the predicate against an in-memory record. Must agree with the
    /// SQL rendering in `services::database`, which folds with `translate`.
    pub fn matches(&self, record: &VulnerabilityRecord) -> bool {
        let vuln = &record.vulnerability;

        self.id.map_or(true, |id| vuln.id == id)
            && contains_ci(self.title.as_deref(), Some(&vuln.title))
            && contains_ci(self.domain.as_deref(), Some(&record.domain.name))
            && contains_ci(self.cpe.as_deref(), vuln.cpe.as_deref())
            && equals_ci(self.severity.as_deref(), vuln.severity.as_deref())
            && equals_ci(self.state.as_deref(), Some(&vuln.state))
            && equals_ci(self.substate.as_deref(), Some(&vuln.substate))
            && self
                .organization
                .map_or(true, |org| record.organization_id() == Some(org))
            && self.is_kev.map_or(true, |flag| vuln.is_kev == Some(flag))
    }
}

/// ASCII-only case folding shared by both stores.
pub fn fold_case(text: &str) -> String {
    text.to_ascii_lowercase()
}

/// Fold, escape `\`, `%` and `_`, and wrap in `%…%` for a literal substring
/// `LIKE` against a folded column.
pub fn like_substring(needle: &str) -> String {
    format!("%{}%", like_exact(needle))
}

/// Fold and escape so `LIKE` against a folded column is a literal equality test.
pub fn like_exact(text: &str) -> String {
    escape_like(&fold_case(text))
}

/// Escape LIKE metacharacters.
pub fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn contains_ci(needle: Option<&str>, haystack: Option<&str>) -> bool {
    match needle {
        None => true,
        Some(needle) => haystack
            .is_some_and(|value| fold_case(value).contains(&fold_case(needle))),
    }
}

fn equals_ci(expected: Option<&str>, actual: Option<&str>) -> bool {
    match expected {
        None => true,
        Some(expected) => {
            actual.is_some_and(|value| value.eq_ignore_ascii_case(expected))
        }
    }
}

fn text_field(key: &str, value: &Value) -> Result<Option<String>, QueryError> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) if s.is_empty() => Ok(None),
        Value::String(s) => Ok(Some(s.clone())),
        other => Err(QueryError::InvalidFilter(format!(
            "{} must be a string, got {}",
            key,
            json_type(other)
        ))),
    }
}

fn uuid_field(key: &str, value: &Value) -> Result<Option<Uuid>, QueryError> {
    match text_field(key, value)? {
        None => Ok(None),
        Some(s) => Uuid::parse_str(&s)
            .map(Some)
            .map_err(|_| QueryError::InvalidFilter(format!("{} must be a UUID", key))),
    }
}

fn bool_field(key: &str, value: &Value) -> Result<Option<bool>, QueryError> {
    match value {
        Value::Null => Ok(None),
        Value::Bool(flag) => Ok(Some(*flag)),
        other => Err(QueryError::InvalidFilter(format!(
            "{} must be a boolean, got {}",
            key,
            json_type(other)
        ))),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
