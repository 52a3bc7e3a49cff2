//! # Predicate Model
//!
//! A predicate is an operator plus an ordered list of children. Compound
//! operators take predicate children; comparison operators take
//! expression children.

use std::fmt;

use crate::codec::{CodecError, CodecResult};
use crate::config::CompoundArityPolicy;

use super::expression::Expression;
use super::operator::{ArityClass, Operator};

/// Child shape, used by type checks and errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Predicate,
    Expression,
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shape::Predicate => write!(f, "Predicate"),
            Shape::Expression => write!(f, "Expression"),
        }
    }
}

/// A predicate child
#[derive(Debug, Clone, PartialEq)]
pub enum Child {
    Predicate(Predicate),
    Expression(Expression),
}

impl Child {
    pub fn shape(&self) -> Shape {
        match self {
            Child::Predicate(_) => Shape::Predicate,
            Child::Expression(_) => Shape::Expression,
        }
    }
}

impl From<Predicate> for Child {
    fn from(p: Predicate) -> Self {
        Child::Predicate(p)
    }
}

impl From<Expression> for Child {
    fn from(e: Expression) -> Self {
        Child::Expression(e)
    }
}

/// A node in the filter tree
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    operator: Operator,
    children: Vec<Child>,
}

impl Predicate {
    /// Build a predicate, validating child shapes and counts under the
    /// strict arity policy
    pub fn new(operator: Operator, children: Vec<Child>) -> CodecResult<Self> {
        let predicate = Self::from_parts(operator, children);
        predicate.check_node(CompoundArityPolicy::Strict)?;
        Ok(predicate)
    }

    /// Build a predicate without validation.
    ///
    /// The encoder re-checks every node, so a malformed tree built here
    /// fails at encode time instead.
    pub fn from_parts(operator: Operator, children: Vec<Child>) -> Self {
        Self { operator, children }
    }

    /// `and` over one or more predicates
    pub fn and(children: Vec<Predicate>) -> CodecResult<Self> {
        Self::new(Operator::And, children.into_iter().map(Child::from).collect())
    }

    /// `or` over one or more predicates
    pub fn or(children: Vec<Predicate>) -> CodecResult<Self> {
        Self::new(Operator::Or, children.into_iter().map(Child::from).collect())
    }

    /// `not` of a single predicate
    pub fn not(child: Predicate) -> Self {
        Self::from_parts(Operator::Not, vec![Child::Predicate(child)])
    }

    /// Binary comparison
    pub fn compare(operator: Operator, lhs: Expression, rhs: Expression) -> CodecResult<Self> {
        Self::new(operator, vec![Child::Expression(lhs), Child::Expression(rhs)])
    }

    /// `eq` comparison
    pub fn eq(lhs: Expression, rhs: Expression) -> Self {
        Self::from_parts(Operator::Equal, vec![lhs.into(), rhs.into()])
    }

    pub fn operator(&self) -> &Operator {
        &self.operator
    }

    pub fn children(&self) -> &[Child] {
        &self.children
    }

    /// Validate this node only: operator known, child shapes and count.
    ///
    /// Comparison operators check count before shapes; compound operators
    /// check shapes before count.
    pub fn check_node(&self, policy: CompoundArityPolicy) -> CodecResult<()> {
        let (class, arity) = match (self.operator.arity_class(), self.operator.arity(policy)) {
            (Some(class), Some(arity)) => (class, arity),
            _ => {
                return Err(CodecError::UnknownOperator {
                    tag: self.operator.raw_tag().to_string(),
                })
            }
        };

        let arity_error = || CodecError::ArityMismatch {
            operator: self.operator.clone(),
            expected: arity,
            actual: self.children.len(),
        };

        let expected = if class == ArityClass::Compound {
            Shape::Predicate
        } else {
            Shape::Expression
        };

        if class != ArityClass::Compound && !arity.admits(self.children.len()) {
            return Err(arity_error());
        }

        for (index, child) in self.children.iter().enumerate() {
            if child.shape() != expected {
                return Err(CodecError::TypeMismatch {
                    operator: self.operator.clone(),
                    index,
                    expected,
                    actual: child.shape(),
                });
            }
        }

        if !arity.admits(self.children.len()) {
            return Err(arity_error());
        }

        Ok(())
    }
}
