//! In-memory registry backend
//!
//! Keeps registrations in process, with lease expiry and update
//! subscriptions. Useful for tests and for single-process setups where
//! no external registry is running.

use super::RegistryBackend;
use crate::{
    error::{Error, Result},
    models::*,
    signal::QuitSignal,
    updates::UpdateStream,
};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError, RwLock};
use tracing::{debug, info};

/// Stored registration
#[derive(Debug, Clone)]
struct Entry {
    instance: Instance,
    last_renewal: DateTime<Utc>,
}

impl Entry {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now - self.last_renewal >= Duration::seconds(i64::from(self.instance.lease.duration_secs))
    }
}

/// Active update subscription
struct Subscriber {
    app: String,
    suppress_unchanged: bool,
    tx: async_channel::Sender<AppUpdate>,
    quit: QuitSignal,
    last_delivered: Option<Vec<Instance>>,
}

impl Subscriber {
    fn is_gone(&self) -> bool {
        self.quit.is_quit() || self.tx.is_closed()
    }

    /// Push a snapshot, returns false when the subscriber went away
    fn deliver(&mut self, snapshot: &[Instance]) -> bool {
        if self.is_gone() {
            return false;
        }
        if self.suppress_unchanged && self.last_delivered.as_deref() == Some(snapshot) {
            return true;
        }

        let update = if snapshot.is_empty() {
            Err(Error::app_not_found(&self.app))
        } else {
            Ok(Application {
                name: self.app.clone(),
                instances: snapshot.to_vec(),
            })
        };
        self.last_delivered = Some(snapshot.to_vec());
        self.tx.try_send(update).is_ok()
    }
}

/// In-memory registry backend
pub struct MemoryBackend {
    /// Registrations per application, in registration order
    apps: RwLock<HashMap<String, Vec<Entry>>>,
    /// Update subscribers
    subscribers: Mutex<Vec<Subscriber>>,
}

impl MemoryBackend {
    /// Create an empty backend
    pub fn new() -> Self {
        Self {
            apps: RwLock::new(HashMap::new()),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    /// Remove every instance whose lease ran out, returns how many were evicted
    pub fn evict_expired(&self) -> usize {
        self.evict_expired_at(Utc::now())
    }

    fn evict_expired_at(&self, now: DateTime<Utc>) -> usize {
        let mut touched = Vec::new();
        let mut evicted = 0;
        {
            let mut apps = self.apps.write().unwrap_or_else(PoisonError::into_inner);
            for (app, entries) in apps.iter_mut() {
                let before = entries.len();
                entries.retain(|entry| !entry.is_expired(now));
                if entries.len() != before {
                    evicted += before - entries.len();
                    touched.push(app.clone());
                }
            }
            apps.retain(|_, entries| !entries.is_empty());
        }

        if evicted > 0 {
            info!("Evicted {} expired instance(s)", evicted);
        }
        for app in touched {
            self.notify(&app);
        }
        evicted
    }

    /// Drop all registrations, as if the registry had restarted
    pub fn clear(&self) {
        let apps: Vec<String> = {
            let mut apps = self.apps.write().unwrap_or_else(PoisonError::into_inner);
            apps.drain().map(|(app, _)| app).collect()
        };

        info!("Cleared {} application(s)", apps.len());
        for app in apps {
            self.notify(&app);
        }
    }

    /// Number of live update subscriptions
    pub fn subscriber_count(&self) -> usize {
        let mut subscribers = self.subscribers.lock().unwrap_or_else(PoisonError::into_inner);
        subscribers.retain(|sub| !sub.is_gone());
        subscribers.len()
    }

    fn snapshot(&self, app: &str) -> Vec<Instance> {
        let apps = self.apps.read().unwrap_or_else(PoisonError::into_inner);
        apps.get(app)
            .map(|entries| entries.iter().map(|e| e.instance.clone()).collect())
            .unwrap_or_default()
    }

    /// Deliver the current snapshot of `app` to its subscribers.
    ///
    /// Lock order is subscribers, then apps. Taking the snapshot under the
    /// subscribers lock means a subscriber never sees an older snapshot
    /// after a newer one.
    fn notify(&self, app: &str) {
        let mut subscribers = self.subscribers.lock().unwrap_or_else(PoisonError::into_inner);
        let snapshot = self.snapshot(app);
        subscribers.retain_mut(|sub| sub.app != app || sub.deliver(&snapshot));
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RegistryBackend for MemoryBackend {
    async fn register_instance(&self, instance: &Instance) -> Result<()> {
        debug!("Registering instance {}/{}", instance.app, instance.id());

        let entry = Entry {
            instance: instance.clone(),
            last_renewal: Utc::now(),
        };
        {
            let mut apps = self.apps.write().unwrap_or_else(PoisonError::into_inner);
            let entries = apps.entry(instance.app.clone()).or_default();
            match entries.iter_mut().find(|e| e.instance.id() == instance.id()) {
                Some(existing) => *existing = entry,
                None => entries.push(entry),
            }
        }

        self.notify(&instance.app);
        Ok(())
    }

    async fn deregister_instance(&self, instance: &Instance) -> Result<()> {
        debug!("Deregistering instance {}/{}", instance.app, instance.id());

        {
            let mut apps = self.apps.write().unwrap_or_else(PoisonError::into_inner);
            let entries = apps
                .get_mut(&instance.app)
                .ok_or_else(|| Error::instance_not_found(&instance.app, instance.id()))?;
            let position = entries
                .iter()
                .position(|e| e.instance.id() == instance.id())
                .ok_or_else(|| Error::instance_not_found(&instance.app, instance.id()))?;
            entries.remove(position);
            if entries.is_empty() {
                apps.remove(&instance.app);
            }
        }

        self.notify(&instance.app);
        Ok(())
    }

    async fn heartbeat_instance(&self, instance: &Instance) -> Result<()> {
        debug!("Heartbeat for instance {}/{}", instance.app, instance.id());

        {
            let mut apps = self.apps.write().unwrap_or_else(PoisonError::into_inner);
            let entry = apps
                .get_mut(&instance.app)
                .and_then(|entries| entries.iter_mut().find(|e| e.instance.id() == instance.id()))
                .ok_or_else(|| Error::instance_not_found(&instance.app, instance.id()))?;
            entry.last_renewal = Utc::now();
        }

        self.notify(&instance.app);
        Ok(())
    }

    async fn get_instance(&self, app: &str, id: &str) -> Result<Instance> {
        let apps = self.apps.read().unwrap_or_else(PoisonError::into_inner);
        apps.get(app)
            .and_then(|entries| entries.iter().find(|e| e.instance.id() == id))
            .map(|e| e.instance.clone())
            .ok_or_else(|| Error::instance_not_found(app, id))
    }

    async fn get_application(&self, app: &str) -> Result<Application> {
        let instances = self.snapshot(app);
        if instances.is_empty() {
            return Err(Error::app_not_found(app));
        }
        Ok(Application {
            name: app.to_string(),
            instances,
        })
    }

    fn subscribe_application_updates(
        &self,
        app: &str,
        suppress_unchanged: bool,
        quit: QuitSignal,
    ) -> UpdateStream {
        debug!(
            "Subscribing to updates for {} (suppress_unchanged: {})",
            app, suppress_unchanged
        );

        let (tx, stream) = UpdateStream::channel(quit.clone());
        let mut subscriber = Subscriber {
            app: app.to_string(),
            suppress_unchanged,
            tx,
            quit,
            last_delivered: None,
        };

        // Held across the initial delivery so no change lands between the
        // snapshot and the subscriber becoming visible to notify
        let mut subscribers = self.subscribers.lock().unwrap_or_else(PoisonError::into_inner);
        let snapshot = self.snapshot(app);
        if subscriber.deliver(&snapshot) {
            subscribers.push(subscriber);
        }
        stream
    }
}
