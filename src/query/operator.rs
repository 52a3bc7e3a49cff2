//! # Operator Classification
//!
//! One lookup table maps every operator to its wire tag and arity class.
//! Encoder, parser and predicate validation all consult it.

use std::fmt;

use crate::config::CompoundArityPolicy;

/// Tag emitted for an operator outside the known table
pub const UNKNOWN_OPERATOR: &str = "UNKNOWN_OPERATOR";

/// How an operator's children are typed and counted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArityClass {
    /// Children are nested predicates
    Compound,
    /// Exactly one expression operand
    Unary,
    /// Exactly two expression operands
    Binary,
}

impl ArityClass {
    /// Number of expression operands, `None` for compound operators
    pub fn operand_count(&self) -> Option<usize> {
        match self {
            ArityClass::Compound => None,
            ArityClass::Unary => Some(1),
            ArityClass::Binary => Some(2),
        }
    }
}

/// Accepted child count for an operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exactly(usize),
    AtLeast(usize),
}

impl Arity {
    /// Check whether `count` children satisfy this arity
    pub fn admits(&self, count: usize) -> bool {
        match *self {
            Arity::Exactly(n) => count == n,
            Arity::AtLeast(n) => count >= n,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Exactly(n) => write!(f, "exactly {}", n),
            Arity::AtLeast(n) => write!(f, "at least {}", n),
        }
    }
}

/// Predicate operators
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Operator {
    And,
    Or,
    Not,
    Equal,
    NotEqual,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    Like,
    ILike,
    In,
    /// Operator this build has no table entry for. Carries the raw tag it
    /// was built from so callers can report it.
    Unknown(String),
}

impl Operator {
    /// Every operator with a table entry, in tag order
    pub fn known() -> [Operator; 12] {
        [
            Operator::And,
            Operator::Or,
            Operator::Not,
            Operator::Equal,
            Operator::NotEqual,
            Operator::GreaterThan,
            Operator::GreaterThanOrEqual,
            Operator::LessThan,
            Operator::LessThanOrEqual,
            Operator::Like,
            Operator::ILike,
            Operator::In,
        ]
    }

    /// The classification table. `None` only for `Unknown`.
    fn entry(&self) -> Option<(&'static str, ArityClass)> {
        let entry = match self {
            Operator::And => ("and", ArityClass::Compound),
            Operator::Or => ("or", ArityClass::Compound),
            Operator::Not => ("not", ArityClass::Compound),
            Operator::Equal => ("eq", ArityClass::Binary),
            Operator::NotEqual => ("neq", ArityClass::Binary),
            Operator::GreaterThan => ("gt", ArityClass::Binary),
            Operator::GreaterThanOrEqual => ("gte", ArityClass::Binary),
            Operator::LessThan => ("lt", ArityClass::Binary),
            Operator::LessThanOrEqual => ("lte", ArityClass::Binary),
            Operator::Like => ("like", ArityClass::Binary),
            Operator::ILike => ("ilike", ArityClass::Binary),
            Operator::In => ("in", ArityClass::Binary),
            Operator::Unknown(_) => return None,
        };
        Some(entry)
    }

    /// Wire tag. Never fails: unknown operators yield [`UNKNOWN_OPERATOR`].
    pub fn tag(&self) -> &'static str {
        self.entry().map(|(tag, _)| tag).unwrap_or(UNKNOWN_OPERATOR)
    }

    /// Arity class, `None` for an unknown operator
    pub fn arity_class(&self) -> Option<ArityClass> {
        self.entry().map(|(_, class)| class)
    }

    /// Look up an operator by wire tag. Never produces `Unknown`.
    pub fn from_tag(tag: &str) -> Option<Operator> {
        Operator::known().into_iter().find(|op| op.tag() == tag)
    }

    /// Returns true for `and`, `or` and `not`
    pub fn is_compound(&self) -> bool {
        self.arity_class() == Some(ArityClass::Compound)
    }

    /// Returns true if the operator has a table entry
    pub fn is_known(&self) -> bool {
        self.entry().is_some()
    }

    /// Raw tag of an unknown operator, or the table tag otherwise
    pub fn raw_tag(&self) -> &str {
        match self {
            Operator::Unknown(raw) => raw,
            known => known.tag(),
        }
    }

    /// Child count this operator accepts under `policy`
    ///
    /// Comparison operators always take their class's operand count.
    /// Under the strict policy `not` takes exactly one child and `and`/`or`
    /// at least one.
    pub fn arity(&self, policy: CompoundArityPolicy) -> Option<Arity> {
        let class = self.arity_class()?;
        let arity = match (class.operand_count(), policy) {
            (Some(n), _) => Arity::Exactly(n),
            (None, CompoundArityPolicy::Unchecked) => Arity::AtLeast(0),
            (None, CompoundArityPolicy::Strict) if *self == Operator::Not => Arity::Exactly(1),
            (None, CompoundArityPolicy::Strict) => Arity::AtLeast(1),
        };
        Some(arity)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}
