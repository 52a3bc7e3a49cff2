//! # Error Codes
//!
//! Numeric codes and names shared by batch error records and
//! request-level errors. The values are part of the wire contract.

use std::fmt;

use serde::{Serialize, Serializer};

/// Wire error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    PermissionDenied,
    BadRequest,
    InvalidArgument,
    ResourceNotFound,
    UnexpectedError,
}

impl ErrorCode {
    /// Numeric code
    pub fn code(&self) -> u32 {
        match self {
            ErrorCode::PermissionDenied => 102,
            ErrorCode::BadRequest => 107,
            ErrorCode::InvalidArgument => 108,
            ErrorCode::ResourceNotFound => 110,
            ErrorCode::UnexpectedError => 10000,
        }
    }

    /// Name as it appears in the `name` field
    pub fn name(&self) -> &'static str {
        match self {
            ErrorCode::PermissionDenied => "PermissionDenied",
            ErrorCode::BadRequest => "BadRequest",
            ErrorCode::InvalidArgument => "InvalidArgument",
            ErrorCode::ResourceNotFound => "ResourceNotFound",
            ErrorCode::UnexpectedError => "UnexpectedError",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Serialized as the numeric code
impl Serialize for ErrorCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.code())
    }
}
