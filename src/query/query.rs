//! Query and sort model
//!
//! A `Query` is read-only once built and consumed by the encoder.

use std::collections::BTreeMap;

use super::expression::Expression;
use super::predicate::Predicate;

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "asc" => Some(SortOrder::Asc),
            "desc" => Some(SortOrder::Desc),
            _ => None,
        }
    }
}

/// Sort key: a key path or a function such as distance
#[derive(Debug, Clone, PartialEq)]
pub struct Sort {
    pub expression: Expression,
    pub order: SortOrder,
}

impl Sort {
    pub fn asc(expression: Expression) -> Self {
        Self {
            expression,
            order: SortOrder::Asc,
        }
    }

    pub fn desc(expression: Expression) -> Self {
        Self {
            expression,
            order: SortOrder::Desc,
        }
    }
}

/// A typed record query
///
/// `predicate: None` means "no filter". `offset` is always present on the
/// wire; every other optional field is omitted when absent or empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub record_type: String,
    pub predicate: Option<Predicate>,
    pub sorts: Vec<Sort>,
    pub readable_by: Option<String>,
    pub computed_keys: BTreeMap<String, Expression>,
    pub desired_keys: Option<Vec<String>>,
    pub limit: Option<u64>,
    pub offset: u64,
}

impl Query {
    /// Creates a new query over `record_type`
    pub fn new(record_type: impl Into<String>) -> Self {
        Self {
            record_type: record_type.into(),
            ..Default::default()
        }
    }

    /// Sets the filter
    pub fn with_predicate(mut self, predicate: Predicate) -> Self {
        self.predicate = Some(predicate);
        self
    }

    /// Appends a sort key
    pub fn sort_by(mut self, sort: Sort) -> Self {
        self.sorts.push(sort);
        self
    }

    /// Restricts results to records readable by `user_id`
    pub fn readable_by(mut self, user_id: impl Into<String>) -> Self {
        self.readable_by = Some(user_id.into());
        self
    }

    /// Adds a named computed key
    pub fn with_computed_key(mut self, name: impl Into<String>, expression: Expression) -> Self {
        self.computed_keys.insert(name.into(), expression);
        self
    }

    /// Sets the keys returned per record
    pub fn with_desired_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.desired_keys = Some(keys.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_offset(mut self, offset: u64) -> Self {
        self.offset = offset;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builder_defaults() {
        let q = Query::new("note");
        assert_eq!(q.record_type, "note");
        assert!(q.predicate.is_none());
        assert_eq!(q.offset, 0);
        assert_eq!(q.limit, None);
        assert!(q.desired_keys.is_none());
    }

    #[test]
    fn test_builder_chain() {
        let q = Query::new("note")
            .with_predicate(Predicate::eq(
                Expression::key_path("title"),
                Expression::literal(json!("hi")),
            ))
            .sort_by(Sort::desc(Expression::key_path("_created_at")))
            .with_desired_keys(["title", "body"])
            .with_limit(10)
            .with_offset(20);

        assert!(q.predicate.is_some());
        assert_eq!(q.sorts[0].order, SortOrder::Desc);
        assert_eq!(q.desired_keys.as_deref(), Some(&["title".to_string(), "body".to_string()][..]));
        assert_eq!(q.limit, Some(10));
        assert_eq!(q.offset, 20);
    }

    #[test]
    fn test_sort_order_parse() {
        assert_eq!(SortOrder::parse("asc"), Some(SortOrder::Asc));
        assert_eq!(SortOrder::parse("desc"), Some(SortOrder::Desc));
        assert_eq!(SortOrder::parse("DESC"), None);
    }
}
