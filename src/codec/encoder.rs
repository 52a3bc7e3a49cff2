//! # Canonical Encoder
//!
//! Renders predicates, expressions and queries to the canonical wire form:
//!
//! ```text
//! predicate   ["and", ["eq", {"$type":"keypath","$val":"a"}, 1], ...]
//! distance    ["func", "distance", <keypath>, <location>]
//! query       {"record_type": ..., "predicate": ..., "offset": 0, ...}
//! ```
//!
//! Encoding is all-or-nothing per tree: the first failing node fails the
//! whole call, and the error carries the sub-path it was raised at.

use serde_json::{json, Map, Value};

use crate::config::{CodecConfig, UnknownOperatorPolicy};
use crate::observability::{Event, Logger};
use crate::query::{Child, Expression, FunctionCall, Literal, Predicate, Query, UNKNOWN_OPERATOR};

use super::errors::{CodecError, CodecResult};
use super::mapper::{CanonicalMapper, ValueMapper};

/// Canonical encoder
#[derive(Debug, Clone, Default)]
pub struct Encoder<M: ValueMapper = CanonicalMapper> {
    mapper: M,
    config: CodecConfig,
}

impl Encoder<CanonicalMapper> {
    /// Create an encoder with the canonical mapper
    pub fn new(config: CodecConfig) -> Self {
        Self::with_mapper(CanonicalMapper, config)
    }
}

impl<M: ValueMapper> Encoder<M> {
    /// Create an encoder with a custom value mapper
    pub fn with_mapper(mapper: M, config: CodecConfig) -> Self {
        Self { mapper, config }
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Encode a predicate tree
    pub fn encode_predicate(&self, predicate: &Predicate) -> CodecResult<Value> {
        self.predicate_at(predicate, "", 1)
    }

    /// Encode a single expression
    pub fn encode_expression(&self, expression: &Expression) -> CodecResult<Value> {
        self.expression_at(expression, "")
    }

    /// Encode a query to its wire map.
    ///
    /// `record_type` and `offset` are always present; every other key is
    /// omitted when absent or empty.
    pub fn encode_query(&self, query: &Query) -> CodecResult<Value> {
        let mut wire = Map::new();
        wire.insert("record_type".into(), Value::from(query.record_type.as_str()));

        if let Some(predicate) = &query.predicate {
            wire.insert("predicate".into(), self.predicate_at(predicate, "predicate", 1)?);
        }

        if !query.sorts.is_empty() {
            let mut order = Vec::with_capacity(query.sorts.len());
            for (i, sort) in query.sorts.iter().enumerate() {
                let path = format!("order[{}]", i);
                let key = self.expression_at(&sort.expression, &path)?;
                order.push(json!([key, sort.order.as_str()]));
            }
            wire.insert("order".into(), Value::Array(order));
        }

        if let Some(readable_by) = query.readable_by.as_deref().filter(|s| !s.is_empty()) {
            wire.insert("readable_by".into(), Value::from(readable_by));
        }

        if !query.computed_keys.is_empty() {
            let mut computed = Map::new();
            for (name, expression) in &query.computed_keys {
                let path = format!("computed_keys.{}", name);
                computed.insert(name.clone(), self.expression_at(expression, &path)?);
            }
            wire.insert("computed_keys".into(), Value::Object(computed));
        }

        if let Some(keys) = query.desired_keys.as_ref().filter(|k| !k.is_empty()) {
            wire.insert("desired_keys".into(), json!(keys));
        }

        if let Some(limit) = query.limit {
            wire.insert("limit".into(), Value::from(limit));
        }

        wire.insert("offset".into(), Value::from(query.offset));
        Ok(Value::Object(wire))
    }

    fn predicate_at(&self, predicate: &Predicate, path: &str, depth: usize) -> CodecResult<Value> {
        if depth > self.config.max_depth {
            return Err(CodecError::DepthExceeded {
                max: self.config.max_depth,
            }
            .at(path));
        }

        if !predicate.operator().is_known() {
            return self.unknown_operator_at(predicate, path, depth);
        }

        predicate
            .check_node(self.config.compound_arity_policy)
            .map_err(|e| e.at(path))?;

        let mut out = Vec::with_capacity(predicate.children().len() + 1);
        out.push(Value::from(predicate.operator().tag()));
        self.push_children(&mut out, predicate, path, depth)?;
        Ok(Value::Array(out))
    }

    /// Children of an already-checked node, each in its own shape
    fn push_children(
        &self,
        out: &mut Vec<Value>,
        predicate: &Predicate,
        path: &str,
        depth: usize,
    ) -> CodecResult<()> {
        for (index, child) in predicate.children().iter().enumerate() {
            let child_path = format!("{}[{}]", path, index + 1);
            let encoded = match child {
                Child::Predicate(p) => self.predicate_at(p, &child_path, depth + 1)?,
                Child::Expression(e) => self.expression_at(e, &child_path)?,
            };
            out.push(encoded);
        }
        Ok(())
    }

    fn unknown_operator_at(&self, predicate: &Predicate, path: &str, depth: usize) -> CodecResult<Value> {
        let raw = predicate.operator().raw_tag();
        match self.config.unknown_operator_policy {
            UnknownOperatorPolicy::Reject => {
                Err(CodecError::UnknownOperator { tag: raw.to_string() }.at(path))
            }
            UnknownOperatorPolicy::Sentinel => {
                Logger::emit(Event::UnknownOperatorEmitted, &[("path", path), ("tag", raw)]);
                let mut out = Vec::with_capacity(predicate.children().len() + 1);
                out.push(Value::from(UNKNOWN_OPERATOR));
                self.push_children(&mut out, predicate, path, depth)?;
                Ok(Value::Array(out))
            }
        }
    }

    fn expression_at(&self, expression: &Expression, path: &str) -> CodecResult<Value> {
        let mapped = match expression {
            Expression::Literal(Literal::Value(value)) => return Ok(value.clone()),
            Expression::Literal(Literal::Reference(reference)) => self.mapper.map_reference(reference),
            Expression::Literal(Literal::Date(date)) => self.mapper.map_date(date),
            Expression::KeyPath(key_path) => self.mapper.map_key_path(key_path),
            Expression::Function(function) => return self.function_at(function, path),
        };
        mapped.map_err(|e| e.at(path))
    }

    fn function_at(&self, function: &FunctionCall, path: &str) -> CodecResult<Value> {
        match function {
            FunctionCall::Distance { field, location } => {
                let field = self.mapper.map_key_path(field).map_err(|e| e.at(path))?;
                let location = self.mapper.map_location(location).map_err(|e| e.at(path))?;
                Ok(json!(["func", "distance", field, location]))
            }
            other => {
                Logger::emit(
                    Event::UnsupportedFunction,
                    &[("function", other.name()), ("path", path)],
                );
                Err(CodecError::UnsupportedVariant {
                    function: other.name().to_string(),
                }
                .at(path))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CompoundArityPolicy;
    use crate::query::{Arity, Operator, RelationDirection, Shape, Sort};
    use serde_json::json;

    fn keypath(path: &str) -> Value {
        json!({"$type": "keypath", "$val": path})
    }

    fn encoder() -> Encoder {
        Encoder::new(CodecConfig::default())
    }

    fn age_over(n: i64) -> Predicate {
        Predicate::compare(
            Operator::GreaterThan,
            Expression::key_path("age"),
            Expression::literal(json!(n)),
        )
        .unwrap()
    }

    #[test]
    fn test_encode_comparison() {
        let wire = encoder().encode_predicate(&age_over(18)).unwrap();
        assert_eq!(wire, json!(["gt", keypath("age"), 18]));
    }

    #[test]
    fn test_encode_compound() {
        let p = Predicate::and(vec![age_over(18), Predicate::not(age_over(65))]).unwrap();
        let wire = encoder().encode_predicate(&p).unwrap();
        assert_eq!(
            wire,
            json!(["and", ["gt", keypath("age"), 18], ["not", ["gt", keypath("age"), 65]]])
        );
    }

    #[test]
    fn test_equal_with_one_child_is_arity_mismatch() {
        let p = Predicate::from_parts(Operator::Equal, vec![Expression::key_path("a").into()]);
        let err = encoder().encode_predicate(&p).unwrap_err();
        assert_eq!(
            err,
            CodecError::ArityMismatch {
                operator: Operator::Equal,
                expected: Arity::Exactly(2),
                actual: 1,
            }
        );
    }

    #[test]
    fn test_equal_with_two_expressions_succeeds() {
        let p = Predicate::eq(Expression::key_path("a"), Expression::literal(json!(null)));
        assert_eq!(encoder().encode_predicate(&p).unwrap(), json!(["eq", keypath("a"), null]));
    }

    #[test]
    fn test_expression_under_and_is_type_mismatch() {
        let p = Predicate::from_parts(
            Operator::And,
            vec![Expression::key_path("flag").into(), age_over(1).into()],
        );
        let err = encoder().encode_predicate(&p).unwrap_err();
        assert_eq!(
            err.root(),
            &CodecError::TypeMismatch {
                operator: Operator::And,
                index: 0,
                expected: Shape::Predicate,
                actual: Shape::Expression,
            }
        );
    }

    #[test]
    fn test_nested_error_reports_path() {
        let bad = Predicate::from_parts(Operator::Equal, vec![]);
        let p = Predicate::from_parts(Operator::Or, vec![age_over(1).into(), bad.into()]);
        let err = encoder().encode_predicate(&p).unwrap_err();
        assert_eq!(err.path(), Some("[2]"));
        assert!(matches!(err.root(), CodecError::ArityMismatch { actual: 0, .. }));
    }

    #[test]
    fn test_unknown_operator_rejected_by_default() {
        let p = Predicate::from_parts(Operator::Unknown("near".into()), vec![]);
        let err = encoder().encode_predicate(&p).unwrap_err();
        assert_eq!(err, CodecError::UnknownOperator { tag: "near".into() });
    }

    #[test]
    fn test_unknown_operator_sentinel_policy() {
        let config = CodecConfig {
            unknown_operator_policy: UnknownOperatorPolicy::Sentinel,
            ..CodecConfig::default()
        };
        let p = Predicate::from_parts(
            Operator::Unknown("near".into()),
            vec![Expression::key_path("loc").into(), Expression::literal(json!(5)).into()],
        );
        let wire = Encoder::new(config).encode_predicate(&p).unwrap();
        assert_eq!(wire, json!(["UNKNOWN_OPERATOR", keypath("loc"), 5]));
    }

    #[test]
    fn test_not_with_two_children() {
        let p = Predicate::from_parts(Operator::Not, vec![age_over(1).into(), age_over(2).into()]);
        assert!(encoder().encode_predicate(&p).is_err());

        let lenient = Encoder::new(CodecConfig {
            compound_arity_policy: CompoundArityPolicy::Unchecked,
            ..CodecConfig::default()
        });
        let wire = lenient.encode_predicate(&p).unwrap();
        assert_eq!(wire.as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_depth_limit() {
        let mut p = age_over(1);
        for _ in 0..4 {
            p = Predicate::not(p);
        }
        let shallow = Encoder::new(CodecConfig {
            max_depth: 4,
            ..CodecConfig::default()
        });
        let err = shallow.encode_predicate(&p).unwrap_err();
        assert_eq!(err.root(), &CodecError::DepthExceeded { max: 4 });
        assert!(encoder().encode_predicate(&p).is_ok());
    }

    #[test]
    fn test_encode_literals() {
        let e = encoder();
        assert_eq!(e.encode_expression(&Expression::literal(json!("s"))).unwrap(), json!("s"));
        assert_eq!(
            e.encode_expression(&Expression::literal(json!({"nested": [1, true]}))).unwrap(),
            json!({"nested": [1, true]})
        );
        assert_eq!(
            e.encode_expression(&Expression::reference("note", "n1")).unwrap(),
            json!({"$type": "ref", "$id": "note/n1"})
        );
    }

    #[test]
    fn test_encode_distance() {
        let wire = encoder()
            .encode_expression(&Expression::distance("location", 22.3, 114.2))
            .unwrap();
        assert_eq!(
            wire,
            json!([
                "func",
                "distance",
                keypath("location"),
                {"$type": "geo", "$lat": 22.3, "$lng": 114.2}
            ])
        );
    }

    #[test]
    fn test_unmappable_values_fail_at_their_path() {
        let p = Predicate::and(vec![
            age_over(1),
            Predicate::eq(Expression::key_path("owner"), Expression::reference("user", "")),
        ])
        .unwrap();
        let err = encoder().encode_predicate(&p).unwrap_err();
        assert_eq!(err.path(), Some("[2][2]"));
        assert!(matches!(err.root(), CodecError::InvalidQuery(_)));

        let far = Expression::distance("location", f64::NAN, 114.2);
        let q = Query::new("note").with_computed_key("dist", far);
        let err = encoder().encode_query(&q).unwrap_err();
        assert_eq!(err.path(), Some("computed_keys.dist"));
        assert_eq!(err.code(), "AERO_CODEC_INVALID_QUERY");
    }

    #[test]
    fn test_user_relation_is_unsupported_variant() {
        let e = Expression::Function(FunctionCall::UserRelation {
            field: "_owner".into(),
            relation: "friend".into(),
            direction: RelationDirection::Mutual,
        });
        let err = encoder().encode_expression(&e).unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(
            err,
            CodecError::UnsupportedVariant {
                function: "user_relation".into()
            }
        );
    }

    #[test]
    fn test_encode_query_minimal() {
        let wire = encoder().encode_query(&Query::new("note")).unwrap();
        assert_eq!(wire, json!({"record_type": "note", "offset": 0}));
    }

    #[test]
    fn test_encode_query_full() {
        let q = Query::new("note")
            .with_predicate(age_over(18))
            .sort_by(Sort::asc(Expression::distance("location", 1.0, 2.0)))
            .readable_by("user-1")
            .with_computed_key("dist", Expression::distance("location", 1.0, 2.0))
            .with_desired_keys(["title"])
            .with_limit(5)
            .with_offset(10);

        let wire = encoder().encode_query(&q).unwrap();
        let distance = json!(["func", "distance", keypath("location"), {"$type": "geo", "$lat": 1.0, "$lng": 2.0}]);
        assert_eq!(
            wire,
            json!({
                "record_type": "note",
                "predicate": ["gt", keypath("age"), 18],
                "order": [[distance, "asc"]],
                "readable_by": "user-1",
                "computed_keys": {"dist": distance},
                "desired_keys": ["title"],
                "limit": 5,
                "offset": 10
            })
        );
    }

    #[test]
    fn test_encode_query_omits_empty_fields() {
        let mut q = Query::new("note").with_desired_keys(Vec::<String>::new());
        q.readable_by = Some(String::new());
        let wire = encoder().encode_query(&q).unwrap();
        let object = wire.as_object().unwrap();
        assert!(!object.contains_key("desired_keys"));
        assert!(!object.contains_key("readable_by"));
        assert!(!object.contains_key("limit"));
        assert!(!object.contains_key("predicate"));
        assert_eq!(object["offset"], json!(0));
    }

    #[test]
    fn test_computed_key_failure_fails_query() {
        let q = Query::new("note").with_computed_key(
            "rel",
            Expression::Function(FunctionCall::UserRelation {
                field: "_owner".into(),
                relation: "follow".into(),
                direction: RelationDirection::Outward,
            }),
        );
        let err = encoder().encode_query(&q).unwrap_err();
        assert_eq!(err.path(), Some("computed_keys.rel"));
        assert!(err.is_fatal());
    }
}
