//! # Subscription Errors
//!
//! Store failures, which become per-item batch errors, and request-level
//! failures, which reject the whole request.

use serde::{Serialize, Serializer};
use serde_json::Value;
use thiserror::Error;

use crate::batch::{ErrorCode, ItemError};
use crate::codec::CodecError;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Subscription store errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// No subscription with this id for the device
    #[error("subscription not found: {0}")]
    SubscriptionNotFound(String),

    /// Per-device limit reached
    #[error("too many subscriptions (max: {0})")]
    TooManySubscriptions(usize),

    #[error("internal store error: {0}")]
    Internal(String),
}

impl From<StoreError> for ItemError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::SubscriptionNotFound(_) => ItemError::NotFound,
            other => ItemError::other(other),
        }
    }
}

impl From<CodecError> for ItemError {
    fn from(err: CodecError) -> Self {
        ItemError::other(err)
    }
}

/// Result type for request handlers
pub type ApiResult<T> = Result<T, ApiError>;

/// Error that rejects a whole request
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{code}: {message}")]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
    pub info: Option<Value>,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            info: None,
        }
    }

    /// Request payload has the wrong shape
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::BadRequest, message)
    }

    /// Request payload is well formed but unacceptable
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidArgument, message)
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::UnexpectedError, message)
    }

    pub fn with_info(mut self, info: Value) -> Self {
        self.info = Some(info);
        self
    }
}

#[derive(Serialize)]
struct ApiErrorBody<'a> {
    name: &'static str,
    code: ErrorCode,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    info: Option<&'a Value>,
}

impl Serialize for ApiError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        ApiErrorBody {
            name: self.code.name(),
            code: self.code,
            message: &self.message,
            info: self.info.as_ref(),
        }
        .serialize(serializer)
    }
}
