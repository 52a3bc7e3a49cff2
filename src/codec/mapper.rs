//! # Value Mapper
//!
//! Canonical wire objects for typed values:
//!
//! ```text
//! reference  {"$type": "ref",     "$id": "note/123"}
//! key path   {"$type": "keypath", "$val": "owner.name"}
//! location   {"$type": "geo",     "$lat": 22.3, "$lng": 114.2}
//! date       {"$type": "date",    "$date": "2016-01-02T15:04:05Z"}
//! ```
//!
//! Objects without a `$type` key are plain literals.
//!
//! Mapping refuses values that would not survive `unmap`: a reference whose
//! halves are empty or whose record type contains `/`, an empty key path, a
//! non-finite coordinate, or a date outside years 0000 to 9999.

use chrono::{DateTime, Datelike, SecondsFormat, Utc};
use serde_json::{json, Value};

use crate::query::{GeoPoint, Reference};

use super::errors::{CodecError, CodecResult};

/// A typed value recovered from its wire object
#[derive(Debug, Clone, PartialEq)]
pub enum Mapped {
    Reference(Reference),
    KeyPath(String),
    Location(GeoPoint),
    Date(DateTime<Utc>),
}

/// Translates typed values to and from their wire objects.
///
/// `unmap` must invert every `map_*` method. A value with no invertible
/// wire form is an error, never a lossy object.
pub trait ValueMapper {
    fn map_reference(&self, reference: &Reference) -> CodecResult<Value>;

    fn map_key_path(&self, path: &str) -> CodecResult<Value>;

    fn map_location(&self, point: &GeoPoint) -> CodecResult<Value>;

    fn map_date(&self, date: &DateTime<Utc>) -> CodecResult<Value>;

    /// Recover a typed value. `Ok(None)` means `value` is a plain literal.
    fn unmap(&self, value: &Value) -> CodecResult<Option<Mapped>>;
}

/// RFC 3339 years are exactly four digits
const MAX_RFC3339_YEAR: i32 = 9999;

/// The default `$type`-tagged mapper
#[derive(Debug, Clone, Copy, Default)]
pub struct CanonicalMapper;

impl ValueMapper for CanonicalMapper {
    fn map_reference(&self, reference: &Reference) -> CodecResult<Value> {
        // "a/b" + "c" and "a" + "b/c" would share one wire id
        if reference.record_type.is_empty() || reference.record_type.contains('/') {
            return Err(CodecError::invalid(format!(
                "reference record type '{}' must be non-empty and free of '/'",
                reference.record_type
            )));
        }
        if reference.id.is_empty() {
            return Err(CodecError::invalid(format!(
                "reference to '{}' has an empty id",
                reference.record_type
            )));
        }
        Ok(json!({"$type": "ref", "$id": reference.qualified_id()}))
    }

    fn map_key_path(&self, path: &str) -> CodecResult<Value> {
        if path.is_empty() {
            return Err(CodecError::invalid("key path must not be empty"));
        }
        Ok(json!({"$type": "keypath", "$val": path}))
    }

    fn map_location(&self, point: &GeoPoint) -> CodecResult<Value> {
        if !point.lat.is_finite() || !point.lng.is_finite() {
            return Err(CodecError::invalid(format!(
                "location ({}, {}) is not finite",
                point.lat, point.lng
            )));
        }
        Ok(json!({"$type": "geo", "$lat": point.lat, "$lng": point.lng}))
    }

    fn map_date(&self, date: &DateTime<Utc>) -> CodecResult<Value> {
        if !(0..=MAX_RFC3339_YEAR).contains(&date.year()) {
            return Err(CodecError::invalid(format!(
                "date year {} is outside 0000-9999",
                date.year()
            )));
        }
        Ok(json!({"$type": "date", "$date": date.to_rfc3339_opts(SecondsFormat::AutoSi, true)}))
    }

    fn unmap(&self, value: &Value) -> CodecResult<Option<Mapped>> {
        let Some(object) = value.as_object() else {
            return Ok(None);
        };
        let Some(type_tag) = object.get("$type") else {
            return Ok(None);
        };
        let type_tag = type_tag
            .as_str()
            .ok_or_else(|| CodecError::invalid("$type must be a string"))?;

        let string_field = |key: &str| {
            object
                .get(key)
                .and_then(Value::as_str)
                .ok_or_else(|| CodecError::invalid(format!("{} object requires string {}", type_tag, key)))
        };
        let number_field = |key: &str| {
            object
                .get(key)
                .and_then(Value::as_f64)
                .ok_or_else(|| CodecError::invalid(format!("{} object requires numeric {}", type_tag, key)))
        };

        let mapped = match type_tag {
            "ref" => {
                let id = string_field("$id")?;
                let reference = Reference::parse(id).ok_or_else(|| {
                    CodecError::invalid(format!("reference id '{}' is not of the form type/id", id))
                })?;
                Mapped::Reference(reference)
            }
            "keypath" => {
                let path = string_field("$val")?;
                if path.is_empty() {
                    return Err(CodecError::invalid("key path must not be empty"));
                }
                Mapped::KeyPath(path.to_string())
            }
            "geo" => Mapped::Location(GeoPoint::new(number_field("$lat")?, number_field("$lng")?)),
            "date" => {
                let raw = string_field("$date")?;
                let date = DateTime::parse_from_rfc3339(raw)
                    .map_err(|e| CodecError::invalid(format!("invalid date '{}': {}", raw, e)))?;
                Mapped::Date(date.with_timezone(&Utc))
            }
            other => {
                return Err(CodecError::UnrecognizedExpressionType {
                    tag: other.to_string(),
                })
            }
        };
        Ok(Some(mapped))
    }
}
