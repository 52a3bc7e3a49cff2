//! # Subscription Store
//!
//! Persistence boundary for subscriptions. Lookups are scoped to a device:
//! a subscription saved for one device is not found through another.

use std::collections::{BTreeSet, HashMap};
use std::sync::RwLock;

use super::errors::{StoreError, StoreResult};
use super::model::Subscription;

/// Default per-device subscription limit
pub const DEFAULT_MAX_PER_DEVICE: usize = 100;

/// Storage for subscriptions
pub trait SubscriptionStore {
    /// Fetch a subscription owned by `device_id`
    fn get(&self, id: &str, device_id: &str) -> StoreResult<Subscription>;

    /// Every subscription of a device, ordered by id
    fn list_by_device(&self, device_id: &str) -> StoreResult<Vec<Subscription>>;

    /// Insert or replace by id
    fn save(&self, subscription: &Subscription) -> StoreResult<()>;

    /// Remove a subscription owned by `device_id`
    fn delete(&self, id: &str, device_id: &str) -> StoreResult<()>;
}

impl<S: SubscriptionStore + ?Sized> SubscriptionStore for &S {
    fn get(&self, id: &str, device_id: &str) -> StoreResult<Subscription> {
        (**self).get(id, device_id)
    }

    fn list_by_device(&self, device_id: &str) -> StoreResult<Vec<Subscription>> {
        (**self).list_by_device(device_id)
    }

    fn save(&self, subscription: &Subscription) -> StoreResult<()> {
        (**self).save(subscription)
    }

    fn delete(&self, id: &str, device_id: &str) -> StoreResult<()> {
        (**self).delete(id, device_id)
    }
}

/// In-memory store
///
/// Locks are always taken `by_id` first, then `by_device`.
#[derive(Debug)]
pub struct MemorySubscriptionStore {
    /// Subscriptions by ID
    by_id: RwLock<HashMap<String, Subscription>>,

    /// Subscription IDs by device
    by_device: RwLock<HashMap<String, BTreeSet<String>>>,

    max_per_device: usize,
}

impl Default for MemorySubscriptionStore {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned<T>(_: T) -> StoreError {
    StoreError::Internal("lock poisoned".into())
}

impl MemorySubscriptionStore {
    pub fn new() -> Self {
        Self::with_limit(DEFAULT_MAX_PER_DEVICE)
    }

    /// Create a store allowing at most `max_per_device` subscriptions per device
    pub fn with_limit(max_per_device: usize) -> Self {
        Self {
            by_id: RwLock::new(HashMap::new()),
            by_device: RwLock::new(HashMap::new()),
            max_per_device,
        }
    }

    /// Get subscription count
    pub fn len(&self) -> usize {
        self.by_id.read().map(|m| m.len()).unwrap_or(0)
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of devices owning at least one subscription
    pub fn device_count(&self) -> usize {
        self.by_device.read().map(|m| m.len()).unwrap_or(0)
    }
}

impl SubscriptionStore for MemorySubscriptionStore {
    fn get(&self, id: &str, device_id: &str) -> StoreResult<Subscription> {
        let by_id = self.by_id.read().map_err(poisoned)?;
        by_id
            .get(id)
            .filter(|sub| sub.device_id == device_id)
            .cloned()
            .ok_or_else(|| StoreError::SubscriptionNotFound(id.to_string()))
    }

    fn list_by_device(&self, device_id: &str) -> StoreResult<Vec<Subscription>> {
        let by_id = self.by_id.read().map_err(poisoned)?;
        let by_device = self.by_device.read().map_err(poisoned)?;

        let Some(ids) = by_device.get(device_id) else {
            return Ok(Vec::new());
        };
        Ok(ids.iter().filter_map(|id| by_id.get(id).cloned()).collect())
    }

    fn save(&self, subscription: &Subscription) -> StoreResult<()> {
        let mut by_id = self.by_id.write().map_err(poisoned)?;
        let mut by_device = self.by_device.write().map_err(poisoned)?;

        let id = &subscription.id;
        let device_id = &subscription.device_id;

        let owned = by_device.get(device_id).map_or(0, |ids| ids.len());
        let replacing = by_device.get(device_id).is_some_and(|ids| ids.contains(id));
        if !replacing && owned >= self.max_per_device {
            return Err(StoreError::TooManySubscriptions(self.max_per_device));
        }

        // Re-homing an id moves it out of its previous device's index
        if let Some(previous) = by_id.insert(id.clone(), subscription.clone()) {
            if previous.device_id != *device_id {
                unindex(&mut by_device, &previous.device_id, id);
            }
        }
        by_device.entry(device_id.clone()).or_default().insert(id.clone());

        Ok(())
    }

    fn delete(&self, id: &str, device_id: &str) -> StoreResult<()> {
        let mut by_id = self.by_id.write().map_err(poisoned)?;
        let mut by_device = self.by_device.write().map_err(poisoned)?;

        let owned = by_id.get(id).is_some_and(|sub| sub.device_id == device_id);
        if !owned {
            return Err(StoreError::SubscriptionNotFound(id.to_string()));
        }

        by_id.remove(id);
        unindex(&mut by_device, device_id, id);
        Ok(())
    }
}

/// Drop `id` from a device's index, and the device once it owns nothing
fn unindex(by_device: &mut HashMap<String, BTreeSet<String>>, device_id: &str, id: &str) {
    if let Some(ids) = by_device.get_mut(device_id) {
        ids.remove(id);
        if ids.is_empty() {
            by_device.remove(device_id);
        }
    }
}
