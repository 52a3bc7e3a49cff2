//! # Subscriptions
//!
//! Subscription records, the store they live in, and the batch verbs that
//! fetch, save and delete them for a device.

pub mod errors;
pub mod handlers;
pub mod model;
pub mod store;

pub use errors::{ApiError, ApiResult, StoreError, StoreResult};
pub use handlers::{DevicePayload, RawSubscription, SavePayload, SubscriptionHandler, SubscriptionIdsPayload};
pub use model::{NotificationInfo, Subscription, QUERY_SUBSCRIPTION};
pub use store::{MemorySubscriptionStore, SubscriptionStore, DEFAULT_MAX_PER_DEVICE};
