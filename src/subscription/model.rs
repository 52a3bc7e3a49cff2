//! Subscription records

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::codec::{CodecError, CodecResult, Encoder, ValueMapper};
use crate::query::Query;

/// The only subscription type currently defined
pub const QUERY_SUBSCRIPTION: &str = "query";

/// Push payload templates, passed through to the delivery pipeline as-is
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NotificationInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aps: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gcm: Option<Value>,
}

/// A device's standing interest in records matching a query
#[derive(Debug, Clone, PartialEq)]
pub struct Subscription {
    pub id: String,
    pub kind: String,
    pub device_id: String,
    pub notification_info: Option<NotificationInfo>,
    pub query: Query,
}

impl Subscription {
    /// Create a query subscription
    pub fn new(id: impl Into<String>, device_id: impl Into<String>, query: Query) -> Self {
        Self {
            id: id.into(),
            kind: QUERY_SUBSCRIPTION.to_string(),
            device_id: device_id.into(),
            notification_info: None,
            query,
        }
    }

    pub fn with_notification_info(mut self, info: NotificationInfo) -> Self {
        self.notification_info = Some(info);
        self
    }

    /// Wire form, with the query in canonical encoding
    pub fn to_wire<M: ValueMapper>(&self, encoder: &Encoder<M>) -> CodecResult<Value> {
        let mut wire = Map::new();
        wire.insert("id".into(), Value::from(self.id.as_str()));
        wire.insert("type".into(), Value::from(self.kind.as_str()));
        wire.insert("device_id".into(), Value::from(self.device_id.as_str()));
        if let Some(info) = &self.notification_info {
            let info = serde_json::to_value(info).map_err(|e| CodecError::invalid(e.to_string()))?;
            wire.insert("notification_info".into(), info);
        }
        wire.insert("query".into(), encoder.encode_query(&self.query)?);
        Ok(Value::Object(wire))
    }
}
