//! Declarative input/output schemas for engine payloads
//!
//! Each engine declares an immutable field list; the validation layer checks
//! a raw payload against it before the engine ever runs. Unknown fields are
//! rejected, required fields must be present, and per-field constraints
//! (numeric ranges, enumerations) are enforced here rather than inside the
//! engines.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::EngineError;

// ---------------------------------------------------------------------------
// Field kinds and constraints
// ---------------------------------------------------------------------------

/// JSON type expected for a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    String,
    Integer,
    Float,
    Boolean,
    /// "YYYY-MM-DD" string.
    Date,
    /// "HH:MM" or "HH:MM:SS" string.
    Time,
    Object,
    Array,
}

impl FieldKind {
    fn matches(&self, value: &Value) -> bool {
        match self {
            FieldKind::String => value.is_string(),
            FieldKind::Integer => value.is_i64() || value.is_u64(),
            FieldKind::Float => value.is_number(),
            FieldKind::Boolean => value.is_boolean(),
            FieldKind::Date => value
                .as_str()
                .map(|s| chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok())
                .unwrap_or(false),
            FieldKind::Time => value
                .as_str()
                .map(|s| {
                    chrono::NaiveTime::parse_from_str(s, "%H:%M").is_ok()
                        || chrono::NaiveTime::parse_from_str(s, "%H:%M:%S").is_ok()
                })
                .unwrap_or(false),
            FieldKind::Object => value.is_object(),
            FieldKind::Array => value.is_array(),
        }
    }

    fn label(&self) -> &'static str {
        match self {
            FieldKind::String => "string",
            FieldKind::Integer => "integer",
            FieldKind::Float => "number",
            FieldKind::Boolean => "boolean",
            FieldKind::Date => "date (YYYY-MM-DD)",
            FieldKind::Time => "time (HH:MM)",
            FieldKind::Object => "object",
            FieldKind::Array => "array",
        }
    }
}

/// One declared field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    pub kind: FieldKind,
    pub required: bool,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub one_of: Vec<String>,
}

impl FieldSpec {
    pub fn required(name: &str, kind: FieldKind, description: &str) -> Self {
        Self {
            name: name.to_string(),
            kind,
            required: true,
            description: description.to_string(),
            min: None,
            max: None,
            one_of: Vec::new(),
        }
    }

    pub fn optional(name: &str, kind: FieldKind, description: &str) -> Self {
        Self {
            required: false,
            ..Self::required(name, kind, description)
        }
    }

    pub fn range(mut self, min: f64, max: f64) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self
    }

    pub fn one_of(mut self, values: &[&str]) -> Self {
        self.one_of = values.iter().map(|s| s.to_string()).collect();
        self
    }

    fn check(&self, value: &Value) -> Result<(), EngineError> {
        if value.is_null() {
            if self.required {
                return Err(EngineError::invalid_input(&self.name, "must not be null"));
            }
            return Ok(());
        }
        if !self.kind.matches(value) {
            return Err(EngineError::invalid_input(
                &self.name,
                format!("expected {}", self.kind.label()),
            ));
        }
        if let Some(n) = value.as_f64() {
            if let Some(min) = self.min {
                if n < min {
                    return Err(EngineError::invalid_input(
                        &self.name,
                        format!("{} is below minimum {}", n, min),
                    ));
                }
            }
            if let Some(max) = self.max {
                if n > max {
                    return Err(EngineError::invalid_input(
                        &self.name,
                        format!("{} is above maximum {}", n, max),
                    ));
                }
            }
        }
        if !self.one_of.is_empty() {
            if let Some(s) = value.as_str() {
                if !self.one_of.iter().any(|v| v == s) {
                    return Err(EngineError::invalid_input(
                        &self.name,
                        format!("'{}' is not one of [{}]", s, self.one_of.join(", ")),
                    ));
                }
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Input schema
// ---------------------------------------------------------------------------

/// The immutable field list an engine declares for its payload.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct InputSchema {
    pub fields: Vec<FieldSpec>,
}

impl InputSchema {
    pub fn new(fields: Vec<FieldSpec>) -> Self {
        Self { fields }
    }

    /// Validate a raw payload object against this schema.
    ///
    /// Checks, in order: unknown fields, missing required fields, per-field
    /// type and constraint violations. The first offence is returned.
    pub fn validate(&self, payload: &Map<String, Value>) -> Result<(), EngineError> {
        for key in payload.keys() {
            if !self.fields.iter().any(|f| &f.name == key) {
                return Err(EngineError::invalid_input(
                    key.clone(),
                    "unknown field for this engine",
                ));
            }
        }
        for field in &self.fields {
            match payload.get(&field.name) {
                None => {
                    if field.required {
                        return Err(EngineError::invalid_input(
                            &field.name,
                            "required field is missing",
                        ));
                    }
                }
                Some(value) => field.check(value)?,
            }
        }
        Ok(())
    }
}

/// Descriptor of an engine's output shape. Documentation-only; outputs are
/// typed in Rust and serialised by serde.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OutputSchema {
    pub fields: Vec<FieldSpec>,
}

impl OutputSchema {
    pub fn new(fields: Vec<FieldSpec>) -> Self {
        Self { fields }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> InputSchema {
        InputSchema::new(vec![
            FieldSpec::required("full_name", FieldKind::String, "Complete birth name"),
            FieldSpec::required("birth_date", FieldKind::Date, "Date of birth"),
            FieldSpec::optional("system", FieldKind::String, "Numerology system")
                .one_of(&["pythagorean", "chaldean"]),
            FieldSpec::optional("forecast_days", FieldKind::Integer, "Days to forecast")
                .range(1.0, 90.0),
        ])
    }

    fn obj(v: Value) -> Map<String, Value> {
        match v {
            Value::Object(m) => m,
            _ => unreachable!(),
        }
    }

    #[test]
    fn accepts_valid_payload() {
        let payload = obj(json!({
            "full_name": "John Smith",
            "birth_date": "1990-05-15",
            "system": "pythagorean",
            "forecast_days": 7
        }));
        assert!(schema().validate(&payload).is_ok());
    }

    #[test]
    fn rejects_unknown_field() {
        let payload = obj(json!({
            "full_name": "A",
            "birth_date": "1990-05-15",
            "favourite_colour": "mauve"
        }));
        let err = schema().validate(&payload).unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput { field, .. } if field == "favourite_colour"));
    }

    #[test]
    fn rejects_missing_required() {
        let payload = obj(json!({ "full_name": "A" }));
        let err = schema().validate(&payload).unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput { field, .. } if field == "birth_date"));
    }

    #[test]
    fn rejects_bad_date() {
        let payload = obj(json!({ "full_name": "A", "birth_date": "15/05/1990" }));
        assert!(schema().validate(&payload).is_err());
    }

    #[test]
    fn rejects_out_of_range() {
        let payload = obj(json!({
            "full_name": "A",
            "birth_date": "1990-05-15",
            "forecast_days": 120
        }));
        assert!(schema().validate(&payload).is_err());
    }

    #[test]
    fn rejects_bad_enum() {
        let payload = obj(json!({
            "full_name": "A",
            "birth_date": "1990-05-15",
            "system": "kabbalah"
        }));
        assert!(schema().validate(&payload).is_err());
    }
}
