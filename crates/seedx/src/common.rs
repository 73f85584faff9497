//! 📦 Common data structures: the humble structs that ferry movies from the
//! generator to the bulk request.
//!
//! A [`Record`] is one document. It is a JSON object and nothing else, it is
//! built once, and it never changes afterwards. Think of it as a letter that
//! has already been sealed: you may read the envelope, you may not edit the
//! contents. 🦆

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::SeedError;

/// 📍 A latitude/longitude pair, serialized as `{"lat": .., "lon": ..}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

/// 🎯 One document, one destiny. An immutable JSON object.
///
/// Built from any `Serialize` type that turns into a JSON object (see
/// [`Record::from_document`]) or from a raw map. There are no mutating
/// accessors on purpose: ownership moves from the record source into the
/// bulk batch and the contents go along for the ride untouched.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    /// 🏗️ Serialize a typed document into a record. Anything that does not
    /// come out as a JSON object (a bare number, an array, a `null`) is refused.
    pub fn from_document<T: Serialize>(document: &T) -> Result<Self, SeedError> {
        let value = serde_json::to_value(document).map_err(|e| {
            SeedError::invalid_input(format!("document could not be serialized: {e}"))
        })?;
        match value {
            Value::Object(fields) => Ok(Self(fields)),
            not_an_object => Err(SeedError::invalid_input(format!(
                "a record must be a JSON object, got {not_an_object}"
            ))),
        }
    }

    pub fn from_map(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// 📡 The source line of a bulk request. One line, no trailing newline.
    pub fn to_json_line(&self) -> String {
        // Map<String, Value> always serializes; Display on Value is the infallible path.
        Value::Object(self.0.clone()).to_string()
    }
}
