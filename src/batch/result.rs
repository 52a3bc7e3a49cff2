//! # Batch Results
//!
//! A batch verb takes an ordered list of ids and produces one item per id,
//! in order. Each item is either the verb's success value or an error
//! record:
//!
//! ```text
//! {"_id": "sub-1", "_type": "error", "name": "ResourceNotFound", "code": 110,
//!  "message": "cannot find subscription \"sub-1\"", "info": {"id": "sub-1"}}
//! ```
//!
//! A failed item never affects its neighbours.

use serde::{Serialize, Serializer};
use serde_json::{json, Value};

use crate::observability::{Event, Logger};

use super::errors::ErrorCode;

/// Why a single batch item failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemError {
    /// No subscription with the item's id
    NotFound,
    /// Any other failure, carried as its message
    Other(String),
}

impl ItemError {
    pub fn other(cause: impl ToString) -> Self {
        ItemError::Other(cause.to_string())
    }
}

/// A failed item, keyed by the id it was requested with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorWithId {
    pub id: String,
    pub cause: ItemError,
}

impl ErrorWithId {
    pub fn new(id: impl Into<String>, cause: ItemError) -> Self {
        Self { id: id.into(), cause }
    }

    pub fn error_code(&self) -> ErrorCode {
        match self.cause {
            ItemError::NotFound => ErrorCode::ResourceNotFound,
            ItemError::Other(_) => ErrorCode::UnexpectedError,
        }
    }

    pub fn message(&self) -> String {
        match &self.cause {
            ItemError::NotFound => format!("cannot find subscription \"{}\"", self.id),
            ItemError::Other(cause) => format!("unknown error occurred: {}", cause),
        }
    }

    pub fn info(&self) -> Option<Value> {
        match self.cause {
            ItemError::NotFound => Some(json!({ "id": self.id })),
            ItemError::Other(_) => None,
        }
    }
}

#[derive(Serialize)]
struct ErrorRecord<'a> {
    #[serde(rename = "_id")]
    id: &'a str,
    #[serde(rename = "_type")]
    item_type: &'static str,
    message: String,
    name: &'static str,
    code: ErrorCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    info: Option<Value>,
}

impl Serialize for ErrorWithId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let code = self.error_code();
        ErrorRecord {
            id: &self.id,
            item_type: "error",
            message: self.message(),
            name: code.name(),
            code,
            info: self.info(),
        }
        .serialize(serializer)
    }
}

/// One position of a batch response
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum BatchItem<T> {
    Ok(T),
    Err(ErrorWithId),
}

impl<T> BatchItem<T> {
    pub fn is_ok(&self) -> bool {
        matches!(self, BatchItem::Ok(_))
    }

    pub fn error(&self) -> Option<&ErrorWithId> {
        match self {
            BatchItem::Ok(_) => None,
            BatchItem::Err(err) => Some(err),
        }
    }
}

/// Run `op` once per id, in order, collecting one item per id.
///
/// Failures are logged and recorded in place; later ids still run.
pub fn run_batch<T, I, F>(ids: I, mut op: F) -> Vec<BatchItem<T>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
    F: FnMut(&str) -> Result<T, ItemError>,
{
    ids.into_iter()
        .map(|id| {
            let id = id.as_ref();
            match op(id) {
                Ok(value) => BatchItem::Ok(value),
                Err(cause) => {
                    let err = ErrorWithId::new(id, cause);
                    let message = err.message();
                    Logger::emit(
                        Event::BatchItemFailed,
                        &[("id", id), ("message", message.as_str()), ("name", err.error_code().name())],
                    );
                    BatchItem::Err(err)
                }
            }
        })
        .collect()
}
