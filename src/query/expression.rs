//! # Expression Model
//!
//! Leaf values inside a predicate: literals, dotted key paths and
//! function calls.

use chrono::{DateTime, Utc};
use serde_json::Value;

/// Reference to another record, `record_type/id` on the wire
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Reference {
    pub record_type: String,
    pub id: String,
}

impl Reference {
    /// Create a new reference
    pub fn new(record_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            record_type: record_type.into(),
            id: id.into(),
        }
    }

    /// Parse a `record_type/id` string. Both halves must be non-empty.
    pub fn parse(raw: &str) -> Option<Self> {
        let (record_type, id) = raw.split_once('/')?;
        if record_type.is_empty() || id.is_empty() {
            return None;
        }
        Some(Self::new(record_type, id))
    }

    /// The `record_type/id` form
    pub fn qualified_id(&self) -> String {
        format!("{}/{}", self.record_type, self.id)
    }
}

/// Geographic point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Literal payload
///
/// `Value` is opaque: numbers, strings, booleans, null and containers of
/// them pass through the codec unchanged.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Value(Value),
    Reference(Reference),
    Date(DateTime<Utc>),
}

/// Direction of a user relation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationDirection {
    Outward,
    Inward,
    Mutual,
}

/// Function call expressions
#[derive(Debug, Clone, PartialEq)]
pub enum FunctionCall {
    /// Distance from the geo field at `field` to `location`
    Distance { field: String, location: GeoPoint },

    /// Relation between the record at `field` and the acting user.
    /// Resolved server side at match time; it has no wire encoding.
    UserRelation {
        field: String,
        relation: String,
        direction: RelationDirection,
    },
}

impl FunctionCall {
    /// Function name as it appears in logs and errors
    pub fn name(&self) -> &'static str {
        match self {
            FunctionCall::Distance { .. } => "distance",
            FunctionCall::UserRelation { .. } => "user_relation",
        }
    }
}

/// An expression leaf
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Literal(Literal),
    /// Dotted field path, e.g. `owner.name`
    KeyPath(String),
    Function(FunctionCall),
}

impl Expression {
    /// Raw literal value
    pub fn literal(value: impl Into<Value>) -> Self {
        Expression::Literal(Literal::Value(value.into()))
    }

    /// Reference literal
    pub fn reference(record_type: impl Into<String>, id: impl Into<String>) -> Self {
        Expression::Literal(Literal::Reference(Reference::new(record_type, id)))
    }

    /// Date literal
    pub fn date(date: DateTime<Utc>) -> Self {
        Expression::Literal(Literal::Date(date))
    }

    /// Key path
    pub fn key_path(path: impl Into<String>) -> Self {
        Expression::KeyPath(path.into())
    }

    /// `distance(field, (lat, lng))`
    pub fn distance(field: impl Into<String>, lat: f64, lng: f64) -> Self {
        Expression::Function(FunctionCall::Distance {
            field: field.into(),
            location: GeoPoint::new(lat, lng),
        })
    }

    /// Variant name, used in error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Expression::Literal(_) => "literal",
            Expression::KeyPath(_) => "keypath",
            Expression::Function(_) => "function",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_reference_parse() {
        let r = Reference::parse("note/abc-123").unwrap();
        assert_eq!(r.record_type, "note");
        assert_eq!(r.id, "abc-123");
        assert_eq!(r.qualified_id(), "note/abc-123");
    }

    #[test]
    fn test_reference_id_may_contain_slash() {
        let r = Reference::parse("note/a/b").unwrap();
        assert_eq!(r.record_type, "note");
        assert_eq!(r.id, "a/b");
    }

    #[test]
    fn test_reference_parse_rejects_malformed() {
        assert!(Reference::parse("note").is_none());
        assert!(Reference::parse("/abc").is_none());
        assert!(Reference::parse("note/").is_none());
    }

    #[test]
    fn test_constructors() {
        assert_eq!(
            Expression::literal(json!(3)),
            Expression::Literal(Literal::Value(json!(3)))
        );
        assert_eq!(Expression::key_path("a.b").kind(), "keypath");
        assert_eq!(Expression::distance("location", 1.0, 2.0).kind(), "function");
    }

    #[test]
    fn test_function_names() {
        let user = FunctionCall::UserRelation {
            field: "_owner".into(),
            relation: "friend".into(),
            direction: RelationDirection::Mutual,
        };
        assert_eq!(user.name(), "user_relation");
    }
}
