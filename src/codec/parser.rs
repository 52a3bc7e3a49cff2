//! # Query Parser
//!
//! Decodes the canonical wire form back into a typed [`Query`]. Accepts
//! exactly what the encoder emits, so that
//! `parse(encode(q)) == q` for every encodable query.
//!
//! Normalization:
//! - `predicate` absent, `null`, `[]` or `{}` means no filter
//! - empty `order`, `computed_keys`, `desired_keys` and `readable_by` are absent
//!
//! The acting caller is passed in explicitly through [`ParseContext`].

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::config::CodecConfig;
use crate::observability::{Event, Logger};
use crate::query::{
    Child, Expression, FunctionCall, Literal, Operator, Predicate, Query, Shape, Sort, SortOrder,
};

use super::errors::{CodecError, CodecResult};
use super::mapper::{CanonicalMapper, Mapped, ValueMapper};

/// Identity of the caller submitting a query
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseContext {
    pub user_id: Option<String>,
    /// Master callers may query on behalf of any user
    pub master: bool,
}

impl ParseContext {
    /// Unauthenticated caller
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Authenticated user
    pub fn user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            master: false,
        }
    }

    /// Master key caller
    pub fn master() -> Self {
        Self {
            user_id: None,
            master: true,
        }
    }

    fn may_read_as(&self, readable_by: &str) -> bool {
        self.master || self.user_id.as_deref() == Some(readable_by)
    }
}

/// Wire-to-typed query parser
#[derive(Debug, Clone)]
pub struct QueryParser<M: ValueMapper = CanonicalMapper> {
    context: ParseContext,
    mapper: M,
    config: CodecConfig,
}

impl QueryParser<CanonicalMapper> {
    pub fn new(context: ParseContext, config: &CodecConfig) -> Self {
        Self::with_mapper(context, CanonicalMapper, config)
    }
}

impl<M: ValueMapper> QueryParser<M> {
    pub fn with_mapper(context: ParseContext, mapper: M, config: &CodecConfig) -> Self {
        Self {
            context,
            mapper,
            config: config.clone(),
        }
    }

    pub fn context(&self) -> &ParseContext {
        &self.context
    }

    /// Parse a wire query object
    pub fn parse_query(&self, raw: &Value) -> CodecResult<Query> {
        self.query(raw).map_err(|err| {
            let reason = err.to_string();
            Logger::emit(Event::QueryRejected, &[("code", err.code()), ("reason", reason.as_str())]);
            err
        })
    }

    /// Parse a wire predicate. `Ok(None)` for the empty forms.
    pub fn parse_predicate(&self, raw: &Value) -> CodecResult<Option<Predicate>> {
        self.optional_predicate(raw, "")
    }

    /// Parse a single wire expression
    pub fn parse_expression(&self, raw: &Value) -> CodecResult<Expression> {
        self.expression_at(raw, "")
    }

    fn query(&self, raw: &Value) -> CodecResult<Query> {
        let object = raw
            .as_object()
            .ok_or_else(|| CodecError::invalid("query must be a JSON object"))?;

        let record_type = match object.get("record_type") {
            Some(Value::String(s)) if !s.is_empty() => s.clone(),
            _ => {
                return Err(CodecError::invalid("record_type must be a non-empty string").at("record_type"))
            }
        };

        let predicate = match object.get("predicate") {
            Some(raw) => self.optional_predicate(raw, "predicate")?,
            None => None,
        };

        Ok(Query {
            record_type,
            predicate,
            sorts: self.sorts(object)?,
            readable_by: self.readable_by(object)?,
            computed_keys: self.computed_keys(object)?,
            desired_keys: desired_keys(object)?,
            limit: unsigned(object, "limit")?,
            offset: unsigned(object, "offset")?.unwrap_or(0),
        })
    }

    fn sorts(&self, object: &Map<String, Value>) -> CodecResult<Vec<Sort>> {
        let items = match object.get("order") {
            None | Some(Value::Null) => return Ok(Vec::new()),
            Some(Value::Array(items)) => items,
            Some(_) => return Err(CodecError::invalid("order must be an array").at("order")),
        };

        let mut sorts = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            let path = format!("order[{}]", i);
            let (key, order) = match item.as_array().map(Vec::as_slice) {
                Some([key, Value::String(order)]) => (key, order),
                _ => return Err(CodecError::invalid("sort must be [expression, \"asc\"|\"desc\"]").at(&path)),
            };
            let order = SortOrder::parse(order)
                .ok_or_else(|| CodecError::invalid(format!("unknown sort order '{}'", order)).at(&path))?;
            sorts.push(Sort {
                expression: self.expression_at(key, &path)?,
                order,
            });
        }
        Ok(sorts)
    }

    fn readable_by(&self, object: &Map<String, Value>) -> CodecResult<Option<String>> {
        let readable_by = match object.get("readable_by") {
            None | Some(Value::Null) => return Ok(None),
            Some(Value::String(s)) if s.is_empty() => return Ok(None),
            Some(Value::String(s)) => s,
            Some(_) => return Err(CodecError::invalid("readable_by must be a string").at("readable_by")),
        };

        if !self.context.may_read_as(readable_by) {
            return Err(CodecError::PermissionDenied(format!(
                "cannot query records readable by \"{}\"",
                readable_by
            ))
            .at("readable_by"));
        }
        Ok(Some(readable_by.clone()))
    }

    fn computed_keys(&self, object: &Map<String, Value>) -> CodecResult<BTreeMap<String, Expression>> {
        let keys = match object.get("computed_keys") {
            None | Some(Value::Null) => return Ok(BTreeMap::new()),
            Some(Value::Object(keys)) => keys,
            Some(_) => return Err(CodecError::invalid("computed_keys must be an object").at("computed_keys")),
        };

        let mut computed = BTreeMap::new();
        for (name, raw) in keys {
            let path = format!("computed_keys.{}", name);
            computed.insert(name.clone(), self.expression_at(raw, &path)?);
        }
        Ok(computed)
    }

    fn optional_predicate(&self, raw: &Value, path: &str) -> CodecResult<Option<Predicate>> {
        match raw {
            Value::Null => Ok(None),
            Value::Array(items) if items.is_empty() => Ok(None),
            Value::Object(map) if map.is_empty() => Ok(None),
            Value::Array(items) => self.predicate_at(items, path, 1).map(Some),
            _ => Err(CodecError::invalid("predicate must be an array").at(path)),
        }
    }

    fn predicate_at(&self, items: &[Value], path: &str, depth: usize) -> CodecResult<Predicate> {
        if depth > self.config.max_depth {
            return Err(CodecError::DepthExceeded {
                max: self.config.max_depth,
            }
            .at(path));
        }

        let (tag, rest) = match items.split_first() {
            Some((Value::String(tag), rest)) => (tag, rest),
            _ => return Err(CodecError::invalid("predicate must start with an operator tag").at(path)),
        };
        let operator = Operator::from_tag(tag)
            .ok_or_else(|| CodecError::UnknownOperatorTag { tag: tag.clone() }.at(path))?;

        let mut children = Vec::with_capacity(rest.len());
        for (i, raw) in rest.iter().enumerate() {
            let child_path = format!("{}[{}]", path, i + 1);
            let child = match raw {
                Value::Array(nested) if operator.is_compound() && !is_function_call(nested) => {
                    Child::Predicate(self.predicate_at(nested, &child_path, depth + 1)?)
                }
                // Shape decides before content under a compound operator
                _ if operator.is_compound() => {
                    return Err(CodecError::TypeMismatch {
                        operator: operator.clone(),
                        index: i,
                        expected: Shape::Predicate,
                        actual: Shape::Expression,
                    }
                    .at(path))
                }
                _ => Child::Expression(self.expression_at(raw, &child_path)?),
            };
            children.push(child);
        }

        let predicate = Predicate::from_parts(operator, children);
        predicate
            .check_node(self.config.compound_arity_policy)
            .map_err(|e| e.at(path))?;
        Ok(predicate)
    }

    fn expression_at(&self, raw: &Value, path: &str) -> CodecResult<Expression> {
        if let Value::Array(items) = raw {
            if is_function_call(items) {
                return self.function_at(items, path);
            }
        }

        let expression = match self.mapper.unmap(raw).map_err(|e| e.at(path))? {
            None => Expression::Literal(Literal::Value(raw.clone())),
            Some(Mapped::Reference(reference)) => Expression::Literal(Literal::Reference(reference)),
            Some(Mapped::Date(date)) => Expression::Literal(Literal::Date(date)),
            Some(Mapped::KeyPath(key_path)) => Expression::KeyPath(key_path),
            // A location is only meaningful as a function argument
            Some(Mapped::Location(_)) => {
                return Err(CodecError::UnrecognizedExpressionType { tag: "geo".into() }.at(path))
            }
        };
        Ok(expression)
    }

    fn function_at(&self, items: &[Value], path: &str) -> CodecResult<Expression> {
        let name = match items.get(1) {
            Some(Value::String(name)) => name.as_str(),
            _ => return Err(CodecError::invalid("function call requires a name").at(path)),
        };

        match name {
            "distance" => {
                let (field, location) = match &items[2..] {
                    [field, location] => (field, location),
                    args => {
                        return Err(CodecError::invalid(format!(
                            "distance takes 2 arguments, got {}",
                            args.len()
                        ))
                        .at(path))
                    }
                };
                let field = match self.mapper.unmap(field).map_err(|e| e.at(path))? {
                    Some(Mapped::KeyPath(field)) => field,
                    _ => return Err(CodecError::invalid("distance requires a key path").at(path)),
                };
                let location = match self.mapper.unmap(location).map_err(|e| e.at(path))? {
                    Some(Mapped::Location(location)) => location,
                    _ => return Err(CodecError::invalid("distance requires a location").at(path)),
                };
                Ok(Expression::Function(FunctionCall::Distance { field, location }))
            }
            other => Err(CodecError::UnknownFunction {
                name: other.to_string(),
            }
            .at(path)),
        }
    }
}

/// `["func", ...]`
fn is_function_call(items: &[Value]) -> bool {
    matches!(items.first(), Some(Value::String(head)) if head == "func")
}

fn desired_keys(object: &Map<String, Value>) -> CodecResult<Option<Vec<String>>> {
    let items = match object.get("desired_keys") {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Array(items)) => items,
        Some(_) => return Err(CodecError::invalid("desired_keys must be an array").at("desired_keys")),
    };
    if items.is_empty() {
        return Ok(None);
    }

    items
        .iter()
        .map(|item| {
            item.as_str()
                .map(str::to_string)
                .ok_or_else(|| CodecError::invalid("desired_keys must contain strings").at("desired_keys"))
        })
        .collect::<CodecResult<Vec<_>>>()
        .map(Some)
}

fn unsigned(object: &Map<String, Value>, key: &str) -> CodecResult<Option<u64>> {
    match object.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_u64()
            .map(Some)
            .ok_or_else(|| CodecError::invalid(format!("{} must be a non-negative integer", key)).at(key)),
    }
}
