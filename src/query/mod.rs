//! # Query Model
//!
//! Typed representation of a subscription query:
//!
//! - **Operator**: tag and arity class table
//! - **Expression**: literal, key path or function leaf
//! - **Predicate**: recursive filter tree
//! - **Query**: record type, filter, sorts, paging

pub mod expression;
pub mod operator;
pub mod predicate;
#[allow(clippy::module_inception)]
pub mod query;

pub use expression::{Expression, FunctionCall, GeoPoint, Literal, Reference, RelationDirection};
pub use operator::{Arity, ArityClass, Operator, UNKNOWN_OPERATOR};
pub use predicate::{Child, Predicate, Shape};
pub use query::{Query, Sort, SortOrder};
