//! Normalization of the backend's inconsistent response shapes
//!
//! The same endpoint may answer `{ "data": T }`, a bare `T`, or `T`'s fields at
//! the top level. Lookups always try `.data` first, then the top level; a
//! `null` value counts as missing.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{ApiError, Result};

fn present(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| !v.is_null())
}

/// The `.data` member when there is one, otherwise the body itself
pub fn payload(body: &Value) -> &Value {
    present(body.get("data")).unwrap_or(body)
}

/// Finds a single field under `.data`, then at the top level
pub fn locate<'a>(body: &'a Value, field: &str) -> Option<&'a Value> {
    present(body.get("data").and_then(|data| data.get(field))).or_else(|| present(body.get(field)))
}

/// The object (`.data` or the body) that carries every one of `fields`
pub fn container<'a>(body: &'a Value, fields: &[&str]) -> Result<&'a Value> {
    let has_all = |candidate: &Value| fields.iter().all(|f| present(candidate.get(*f)).is_some());

    if let Some(data) = present(body.get("data")).filter(|data| has_all(*data)) {
        return Ok(data);
    }
    if has_all(body) {
        return Ok(body);
    }
    Err(ApiError::invalid_format(format!("missing {}", fields.join(" or "))))
}

/// Deserializes the container holding `fields`
pub fn extract<T: DeserializeOwned>(body: &Value, fields: &[&str]) -> Result<T> {
    decode(container(body, fields)?)
}

/// Deserializes the payload of an endpoint without a marker field
pub fn data<T: DeserializeOwned>(body: &Value) -> Result<T> {
    decode(payload(body))
}

pub fn decode<T: DeserializeOwned>(value: &Value) -> Result<T> {
    T::deserialize(value).map_err(|e| ApiError::invalid_format(e.to_string()))
}
