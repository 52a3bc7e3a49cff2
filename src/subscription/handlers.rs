//! # Subscription Handlers
//!
//! The four subscription verbs. Each takes the request payload as JSON:
//!
//! | Verb        | Payload                              | Result                 |
//! |-------------|--------------------------------------|------------------------|
//! | `fetch`     | `device_id`, `subscription_ids`      | one item per id        |
//! | `fetch_all` | `device_id`                          | one item per stored    |
//! | `save`      | `device_id`, `subscriptions`         | one item per input     |
//! | `delete`    | `device_id`, `subscription_ids`      | `{"id"}` per id        |
//!
//! Payload problems reject the whole request with an [`ApiError`]. Once a
//! request is accepted, each item succeeds or fails on its own. A `null`
//! payload field reads as empty.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::batch::{run_batch, BatchItem, ErrorCode, ErrorWithId, ItemError};
use crate::codec::{CodecError, Encoder, ParseContext, QueryParser};
use crate::config::CodecConfig;
use crate::observability::{Event, Logger};

use super::errors::{ApiError, ApiResult};
use super::model::{NotificationInfo, Subscription, QUERY_SUBSCRIPTION};
use super::store::SubscriptionStore;

/// `fetch` and `delete` payload
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubscriptionIdsPayload {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub device_id: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub subscription_ids: Vec<String>,
}

/// `fetch_all` payload
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DevicePayload {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub device_id: String,
}

/// A subscription as submitted by a client
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSubscription {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub id: String,
    #[serde(default, rename = "type", deserialize_with = "null_as_empty")]
    pub kind: String,
    /// Ignored; the payload's device id wins
    #[serde(default, deserialize_with = "null_as_empty")]
    pub device_id: String,
    #[serde(default)]
    pub notification_info: Option<NotificationInfo>,
    #[serde(default)]
    pub query: Value,
}

/// `save` payload
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SavePayload {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub device_id: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub subscriptions: Vec<RawSubscription>,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Subscription verbs over a store
pub struct SubscriptionHandler<S: SubscriptionStore> {
    store: S,
    encoder: Encoder,
    config: CodecConfig,
}

impl<S: SubscriptionStore> SubscriptionHandler<S> {
    pub fn new(store: S, config: CodecConfig) -> Self {
        Self {
            store,
            encoder: Encoder::new(config.clone()),
            config,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Fetch subscriptions of a device by id
    pub fn fetch(&self, payload: &Value) -> ApiResult<Vec<BatchItem<Value>>> {
        let payload: SubscriptionIdsPayload = decode(payload)?;
        require_device(&payload.device_id)?;

        Ok(run_batch(&payload.subscription_ids, |id| {
            let subscription = self.store.get(id, &payload.device_id)?;
            Ok(subscription.to_wire(&self.encoder)?)
        }))
    }

    /// Fetch every subscription of a device
    pub fn fetch_all(&self, payload: &Value) -> ApiResult<Vec<BatchItem<Value>>> {
        let payload: DevicePayload = decode(payload)?;
        require_device(&payload.device_id)?;

        let subscriptions = self.store.list_by_device(&payload.device_id).map_err(|e| {
            let reason = e.to_string();
            Logger::emit(
                Event::StoreFailed,
                &[("device_id", payload.device_id.as_str()), ("reason", reason.as_str())],
            );
            ApiError::unexpected(reason)
        })?;

        Ok(subscriptions
            .iter()
            .map(|subscription| match subscription.to_wire(&self.encoder) {
                Ok(wire) => BatchItem::Ok(wire),
                Err(err) => {
                    let failed = ErrorWithId::new(subscription.id.as_str(), err.into());
                    let message = failed.message();
                    Logger::emit(
                        Event::BatchItemFailed,
                        &[("id", subscription.id.as_str()), ("message", message.as_str())],
                    );
                    BatchItem::Err(failed)
                }
            })
            .collect())
    }

    /// Save subscriptions for a device.
    ///
    /// Every query is parsed before anything is stored; one unparsable
    /// query rejects the request and nothing is saved. The rejection names
    /// the subscription and the failing query sub-path in `info`.
    pub fn save(&self, context: &ParseContext, payload: &Value) -> ApiResult<Vec<BatchItem<Value>>> {
        let payload: SavePayload = decode(payload)?;
        if payload.subscriptions.is_empty() {
            return Err(ApiError::invalid_argument("empty subscriptions"));
        }
        require_device(&payload.device_id)?;

        let parser = QueryParser::new(context.clone(), &self.config);
        let mut subscriptions = Vec::with_capacity(payload.subscriptions.len());
        for (index, raw) in payload.subscriptions.into_iter().enumerate() {
            let kind = match raw.kind.as_str() {
                "" | QUERY_SUBSCRIPTION => QUERY_SUBSCRIPTION.to_string(),
                other => {
                    return Err(ApiError::invalid_argument(format!(
                        "unsupported subscription type \"{}\"",
                        other
                    )))
                }
            };
            let query = parser
                .parse_query(&raw.query)
                .map_err(|e| rejected_query(index, e))?;
            let id = if raw.id.is_empty() {
                Uuid::new_v4().to_string()
            } else {
                raw.id
            };

            subscriptions.push(Subscription {
                id,
                kind,
                device_id: payload.device_id.clone(),
                notification_info: raw.notification_info,
                query,
            });
        }

        let ids: Vec<String> = subscriptions.iter().map(|s| s.id.clone()).collect();
        let mut pending = subscriptions.into_iter();
        Ok(run_batch(&ids, |id| {
            let subscription = pending
                .next()
                .ok_or_else(|| ItemError::other("subscription missing from batch"))?;
            self.store.save(&subscription)?;
            Logger::emit(
                Event::SubscriptionSaved,
                &[("device_id", subscription.device_id.as_str()), ("id", id)],
            );
            Ok(subscription.to_wire(&self.encoder)?)
        }))
    }

    /// Delete subscriptions of a device by id
    pub fn delete(&self, payload: &Value) -> ApiResult<Vec<BatchItem<Value>>> {
        let payload: SubscriptionIdsPayload = decode(payload)?;
        require_device(&payload.device_id)?;

        Ok(run_batch(&payload.subscription_ids, |id| {
            self.store.delete(id, &payload.device_id)?;
            Logger::emit(
                Event::SubscriptionDeleted,
                &[("device_id", payload.device_id.as_str()), ("id", id)],
            );
            Ok(json!({ "id": id }))
        }))
    }
}

fn decode<T: DeserializeOwned>(payload: &Value) -> ApiResult<T> {
    T::deserialize(payload).map_err(|e| ApiError::bad_request(e.to_string()))
}

/// Request-level error for the `index`th subscription's unparsable query
fn rejected_query(index: usize, err: CodecError) -> ApiError {
    let code = match err.root() {
        CodecError::PermissionDenied(_) => ErrorCode::PermissionDenied,
        _ => ErrorCode::InvalidArgument,
    };
    let mut info = json!({"subscription": index, "reason": err.code()});
    if let Some(path) = err.path() {
        info["path"] = Value::from(path);
    }
    ApiError::new(code, format!("failed to parse subscriptions: {}", err)).with_info(info)
}

fn require_device(device_id: &str) -> ApiResult<()> {
    if device_id.is_empty() {
        return Err(ApiError::invalid_argument("empty device_id"));
    }
    Ok(())
}
