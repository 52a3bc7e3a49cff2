//! # Codec Errors
//!
//! Error codes:
//! - AERO_CODEC_TYPE_MISMATCH
//! - AERO_CODEC_ARITY_MISMATCH
//! - AERO_CODEC_UNKNOWN_OPERATOR
//! - AERO_CODEC_UNRECOGNIZED_EXPRESSION
//! - AERO_CODEC_UNKNOWN_FUNCTION
//! - AERO_CODEC_UNSUPPORTED_VARIANT (fatal)
//! - AERO_CODEC_INVALID_QUERY
//! - AERO_CODEC_PERMISSION_DENIED
//! - AERO_CODEC_DEPTH_EXCEEDED
//!
//! Every failure is returned as a value. `UnsupportedVariant` marks a tree
//! the encoder cannot render, which is a defect upstream, but it still does
//! not abort the process.

use thiserror::Error;

use crate::query::{Arity, Operator, Shape};

/// Result type for codec operations
pub type CodecResult<T> = Result<T, CodecError>;

/// Codec errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CodecError {
    /// Child shape disagrees with the operator's class
    #[error("got {operator}.operand[{index}] of type {actual}, want {expected}")]
    TypeMismatch {
        operator: Operator,
        index: usize,
        expected: Shape,
        actual: Shape,
    },

    /// Child count disagrees with the operator's arity
    #[error("{operator} takes {expected} operand(s), got {actual}")]
    ArityMismatch {
        operator: Operator,
        expected: Arity,
        actual: usize,
    },

    /// Operator value with no table entry
    #[error("operator '{tag}' has no table entry")]
    UnknownOperator { tag: String },

    /// Wire tag that names no operator
    #[error("unknown operator tag '{tag}'")]
    UnknownOperatorTag { tag: String },

    /// Expression object whose `$type` is outside the closed set
    #[error("unrecognized expression type '{tag}'")]
    UnrecognizedExpressionType { tag: String },

    /// Function name the parser does not know
    #[error("unknown function '{name}'")]
    UnknownFunction { name: String },

    /// Function variant with no wire encoding
    #[error("function '{function}' has no wire encoding")]
    UnsupportedVariant { function: String },

    /// Malformed query input
    #[error("{0}")]
    InvalidQuery(String),

    /// Caller may not express this query
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Predicate nesting beyond the configured limit
    #[error("predicate nesting exceeds maximum depth of {max}")]
    DepthExceeded { max: usize },

    /// Error raised below `path` in the query tree
    #[error("{path}: {source}")]
    AtPath {
        path: String,
        source: Box<CodecError>,
    },
}

impl CodecError {
    /// Create an invalid query error
    pub fn invalid(reason: impl Into<String>) -> Self {
        CodecError::InvalidQuery(reason.into())
    }

    /// Attach the query sub-path where this error was raised.
    ///
    /// The innermost path wins; an empty path leaves the error unchanged.
    pub fn at(self, path: &str) -> Self {
        match self {
            CodecError::AtPath { .. } => self,
            _ if path.is_empty() => self,
            other => CodecError::AtPath {
                path: path.to_string(),
                source: Box::new(other),
            },
        }
    }

    /// The error with any path context stripped
    pub fn root(&self) -> &CodecError {
        match self {
            CodecError::AtPath { source, .. } => source.root(),
            other => other,
        }
    }

    /// Sub-path the error was raised at, if recorded
    pub fn path(&self) -> Option<&str> {
        match self {
            CodecError::AtPath { path, .. } => Some(path),
            _ => None,
        }
    }

    /// Returns the error code string
    pub fn code(&self) -> &'static str {
        match self {
            CodecError::TypeMismatch { .. } => "AERO_CODEC_TYPE_MISMATCH",
            CodecError::ArityMismatch { .. } => "AERO_CODEC_ARITY_MISMATCH",
            CodecError::UnknownOperator { .. } | CodecError::UnknownOperatorTag { .. } => {
                "AERO_CODEC_UNKNOWN_OPERATOR"
            }
            CodecError::UnrecognizedExpressionType { .. } => "AERO_CODEC_UNRECOGNIZED_EXPRESSION",
            CodecError::UnknownFunction { .. } => "AERO_CODEC_UNKNOWN_FUNCTION",
            CodecError::UnsupportedVariant { .. } => "AERO_CODEC_UNSUPPORTED_VARIANT",
            CodecError::InvalidQuery(_) => "AERO_CODEC_INVALID_QUERY",
            CodecError::PermissionDenied(_) => "AERO_CODEC_PERMISSION_DENIED",
            CodecError::DepthExceeded { .. } => "AERO_CODEC_DEPTH_EXCEEDED",
            CodecError::AtPath { source, .. } => source.code(),
        }
    }

    /// Returns true for internal invariant violations
    pub fn is_fatal(&self) -> bool {
        matches!(self.root(), CodecError::UnsupportedVariant { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_mismatch_message() {
        let err = CodecError::TypeMismatch {
            operator: Operator::And,
            index: 0,
            expected: Shape::Predicate,
            actual: Shape::Expression,
        };
        assert_eq!(
            err.to_string(),
            "got and.operand[0] of type Expression, want Predicate"
        );
    }

    #[test]
    fn test_arity_mismatch_message() {
        let err = CodecError::ArityMismatch {
            operator: Operator::Equal,
            expected: Arity::Exactly(2),
            actual: 1,
        };
        assert_eq!(err.to_string(), "eq takes exactly 2 operand(s), got 1");
    }

    #[test]
    fn test_at_keeps_innermost_path() {
        let err = CodecError::invalid("bad")
            .at("predicate[2]")
            .at("predicate");
        assert_eq!(err.path(), Some("predicate[2]"));
        assert_eq!(err.root(), &CodecError::invalid("bad"));
        assert_eq!(err.to_string(), "predicate[2]: bad");
    }

    #[test]
    fn test_at_empty_path_is_noop() {
        let err = CodecError::invalid("bad").at("");
        assert_eq!(err.path(), None);
    }

    #[test]
    fn test_codes_see_through_path() {
        let err = CodecError::DepthExceeded { max: 4 }.at("predicate");
        assert_eq!(err.code(), "AERO_CODEC_DEPTH_EXCEEDED");
    }

    #[test]
    fn test_only_unsupported_variant_is_fatal() {
        assert!(CodecError::UnsupportedVariant {
            function: "user_relation".into()
        }
        .at("computed_keys.rel")
        .is_fatal());
        assert!(!CodecError::invalid("x").is_fatal());
        assert!(!CodecError::UnknownOperator { tag: "x".into() }.is_fatal());
    }
}
