//! Validation of incoming plan bodies.
//!
//! The rules are fixed and evaluated independently per field; a failing
//! body produces a per-field error report and nothing is persisted.
//!
//! | field        | rule                          |
//! |--------------|-------------------------------|
//! | title        | required, text                |
//! | description  | optional, text                |
//! | date         | required, `YYYY-MM-DD`        |
//! | location     | required, text                |
//! | participants | optional, array of name texts |

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;

/// Per-field validation error report, keyed by field name.
///
/// Serializes to the wire shape `{"field": ["message", ...], ...}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Messages recorded for one field, if any.
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    fn push(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_default().push(message.into());
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    f.write_str(" ")?;
                }
                write!(f, "{field}: {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}

/// A request body that passed every rule, with typed fields.
///
/// `participants` still holds the client shape (bare names); the service
/// applies the storage transform separately.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanFields {
    pub title: String,
    pub description: Option<String>,
    pub date: NaiveDate,
    pub location: String,
    pub participants: Vec<String>,
}

/// Validate a raw JSON body against the plan rules.
///
/// All applicable rules are evaluated; the error report carries every
/// broken rule, keyed by field name. A non-object body reports every
/// required field as missing.
pub fn validate(body: &Value) -> Result<PlanFields, ValidationErrors> {
    let empty = serde_json::Map::new();
    let fields = body.as_object().unwrap_or(&empty);
    let mut errors = ValidationErrors::default();

    let title = required_text(fields, "title", &mut errors);
    let description = optional_text(fields, "description", &mut errors);
    let date = required_date(fields, &mut errors);
    let location = required_text(fields, "location", &mut errors);
    let participants = optional_names(fields, &mut errors);

    match (title, date, location) {
        (Some(title), Some(date), Some(location)) if errors.is_empty() => Ok(PlanFields {
            title,
            description,
            date,
            location,
            participants,
        }),
        _ => Err(errors),
    }
}

fn required_text(
    fields: &serde_json::Map<String, Value>,
    name: &str,
    errors: &mut ValidationErrors,
) -> Option<String> {
    match fields.get(name) {
        None | Some(Value::Null) => {
            errors.push(name, format!("The {name} field is required."));
            None
        }
        Some(Value::String(s)) if s.is_empty() => {
            errors.push(name, format!("The {name} field is required."));
            None
        }
        Some(Value::String(s)) => Some(s.clone()),
        Some(_) => {
            errors.push(name, format!("The {name} field must be a string."));
            None
        }
    }
}

fn optional_text(
    fields: &serde_json::Map<String, Value>,
    name: &str,
    errors: &mut ValidationErrors,
) -> Option<String> {
    match fields.get(name) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(_) => {
            errors.push(name, format!("The {name} field must be a string."));
            None
        }
    }
}

fn required_date(
    fields: &serde_json::Map<String, Value>,
    errors: &mut ValidationErrors,
) -> Option<NaiveDate> {
    let s = match fields.get("date") {
        None | Some(Value::Null) => {
            errors.push("date", "The date field is required.");
            return None;
        }
        Some(Value::String(s)) if s.is_empty() => {
            errors.push("date", "The date field is required.");
            return None;
        }
        Some(Value::String(s)) => s,
        Some(_) => {
            errors.push("date", "The date must be in the format Y-m-d.");
            return None;
        }
    };

    match parse_date(s) {
        Some(date) => Some(date),
        None => {
            errors.push("date", "The date must be in the format Y-m-d.");
            None
        }
    }
}

/// Parse a strict `YYYY-MM-DD` calendar date.
///
/// The shape check keeps chrono from accepting unpadded variants like
/// `2024-1-5`; the parse itself rejects impossible dates like `2024-02-31`.
fn parse_date(s: &str) -> Option<NaiveDate> {
    let bytes = s.as_bytes();
    let shaped = bytes.len() == 10
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| if i == 4 || i == 7 { *b == b'-' } else { b.is_ascii_digit() });
    if !shaped {
        return None;
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

fn optional_names(
    fields: &serde_json::Map<String, Value>,
    errors: &mut ValidationErrors,
) -> Vec<String> {
    let items = match fields.get("participants") {
        None | Some(Value::Null) => return Vec::new(),
        Some(Value::Array(items)) => items,
        Some(_) => {
            errors.push("participants", "The participants field must be an array.");
            return Vec::new();
        }
    };

    let mut names = Vec::with_capacity(items.len());
    for item in items {
        match item {
            Value::String(name) => names.push(name.clone()),
            _ => {
                errors.push("participants", "Each participant must be a string.");
                return Vec::new();
            }
        }
    }
    names
}
