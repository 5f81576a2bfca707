//! Endpoint tracking for a remote application

use crate::{
    client::RegistryClient,
    models::{Instance, InstanceStatus},
    signal::{quit_channel, QuitHandle},
};
use futures::future::BoxFuture;
use futures::{FutureExt, StreamExt};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tracing::{debug, warn};

/// Current view of an application's endpoints
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstancerEvent {
    /// `ip:port` of every instance reporting `Up`
    pub instances: Vec<String>,
    /// Error message of the last failed fetch, if the last fetch failed
    pub error: Option<String>,
}

impl InstancerEvent {
    fn from_instances(instances: &[Instance]) -> Self {
        Self {
            instances: instances
                .iter()
                .filter(|i| i.status == InstanceStatus::Up)
                .map(Instance::endpoint)
                .collect(),
            error: None,
        }
    }

    fn from_error(error: impl ToString) -> Self {
        Self {
            instances: Vec::new(),
            error: Some(error.to_string()),
        }
    }
}

#[derive(Default)]
struct Shared {
    state: RwLock<InstancerEvent>,
    subscribers: Mutex<Vec<async_channel::Sender<InstancerEvent>>>,
}

impl Shared {
    fn update(&self, event: InstancerEvent) {
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = event.clone();

        let mut subscribers = self.subscribers.lock().unwrap_or_else(PoisonError::into_inner);
        subscribers.retain(|tx| tx.try_send(event.clone()).is_ok());
    }
}

/// Follows an application's instances through the registry's update stream
pub struct Instancer {
    app: String,
    shared: Arc<Shared>,
    quit: QuitHandle,
}

impl Instancer {
    /// Fetch the application's instances and start following updates.
    ///
    /// The returned future drives the update stream and must be run by the
    /// caller; it completes once [`Instancer::stop`] is called or the
    /// backend ends the stream.
    pub async fn new(
        client: Arc<dyn RegistryClient>,
        app: impl Into<String>,
    ) -> (Self, BoxFuture<'static, ()>) {
        let app = app.into();
        let shared = Arc::new(Shared::default());

        let initial = match client.instances(&app).await {
            Ok(instances) => InstancerEvent::from_instances(&instances),
            Err(e) => {
                warn!("Initial fetch of {} failed: {}", app, e);
                InstancerEvent::from_error(e)
            }
        };
        shared.update(initial);

        let (quit, signal) = quit_channel();
        let mut updates = client.schedule_updates(&app, signal);

        let driver = {
            let shared = shared.clone();
            let app = app.clone();
            async move {
                while let Some(update) = updates.next().await {
                    let event = match update {
                        Ok(application) => InstancerEvent::from_instances(&application.instances),
                        Err(e) => {
                            debug!("Update for {} failed: {}", app, e);
                            InstancerEvent::from_error(e)
                        }
                    };
                    shared.update(event);
                }
                debug!("Stopped following {}", app);
            }
            .boxed()
        };

        (Self { app, shared, quit }, driver)
    }

    /// Application being followed
    pub fn app(&self) -> &str {
        &self.app
    }

    /// Last known state
    pub fn state(&self) -> InstancerEvent {
        self.shared.state.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Receive every future state change, starting with the current state
    pub fn subscribe(&self) -> async_channel::Receiver<InstancerEvent> {
        let (tx, rx) = async_channel::unbounded();
        let mut subscribers = self.shared.subscribers.lock().unwrap_or_else(PoisonError::into_inner);
        if tx.try_send(self.state()).is_ok() {
            subscribers.push(tx);
        }
        rx
    }

    /// Stop following updates. Safe to call more than once.
    pub fn stop(&self) {
        self.quit.quit();
    }
}
