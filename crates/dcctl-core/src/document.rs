//! Semi-structured code location documents.
//!
//! A document is the raw JSON object the platform accepts for a code
//! location. It can carry options the typed [`CodeLocation`] does not model,
//! so only the identity field is inspected.
//!
//! [`CodeLocation`]: crate::types::CodeLocation

use serde_json::{Map, Value};

use crate::error::{Error, Result};

const WHAT: &str = "CodeLocationDocument";

/// Key holding a location document's identity.
pub const IDENTITY_FIELD: &str = "location_name";

/// Parse `document` as a JSON object.
pub fn parse(document: &str) -> Result<Map<String, Value>> {
    match serde_json::from_str::<Value>(document) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(Error::invalid(
            WHAT,
            format!("expected a JSON object, got {}", json_type(&other)),
        )),
        Err(e) => Err(Error::invalid(WHAT, format!("malformed JSON: {e}"))),
    }
}

/// Pull the location name out of `document` without validating the rest.
pub fn extract_identity(document: &str) -> Result<String> {
    identity_of(&parse(document)?)
}

pub fn identity_of(document: &Map<String, Value>) -> Result<String> {
    match document.get(IDENTITY_FIELD) {
        Some(Value::String(name)) => Ok(name.clone()),
        Some(_) => Err(Error::invalid(
            WHAT,
            format!("could not parse {IDENTITY_FIELD} into a string"),
        )),
        None => Err(Error::invalid(
            WHAT,
            format!("{IDENTITY_FIELD} not found in document"),
        )),
    }
}

/// Canonical rendering: sorted keys, no incidental whitespace.
///
/// Two documents that differ only in key order or formatting normalize to
/// identical strings, and normalizing twice is a no-op.
pub fn normalize(document: &str) -> Result<String> {
    let map = parse(document)?;
    Ok(canonical(&Value::Object(map)))
}

/// Canonical rendering of an already-parsed value.
pub fn canonical(value: &Value) -> String {
    // serde_json's Map is ordered by key unless `preserve_order` is enabled,
    // which this workspace never turns on.
    value.to_string()
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
