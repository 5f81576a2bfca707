//! Self-healing registration client
//!
//! [`Client`] sits on top of a [`RegistryBackend`] and keeps the registry's
//! view of an instance consistent with the caller's intent:
//!
//! - registering an instance the registry already knows sends a heartbeat
//!   instead of a duplicate registration;
//! - a heartbeat the registry rejects as not-found re-registers the
//!   instance.
//!
//! The client keeps no state of its own. Registration state is re-derived
//! from the registry on every call.

use crate::{
    backend::RegistryBackend,
    error::Result,
    models::*,
    signal::QuitSignal,
    updates::UpdateStream,
};
use async_trait::async_trait;
use tracing::{debug, info, warn};

/// Registry operations exposed to callers
#[async_trait]
pub trait RegistryClient: Send + Sync {
    /// Register an instance, or heartbeat it when it is already registered
    async fn register(&self, instance: &Instance) -> Result<()>;

    /// Remove an instance from the registry
    async fn deregister(&self, instance: &Instance) -> Result<()>;

    /// Renew an instance's lease, re-registering it if the registry lost it
    async fn heartbeat(&self, instance: &Instance) -> Result<()>;

    /// All instances currently registered for an application
    async fn instances(&self, app: &str) -> Result<Vec<Instance>>;

    /// Follow every update of an application until `quit` fires
    fn schedule_updates(&self, app: &str, quit: QuitSignal) -> UpdateStream;
}

/// Registration client wrapping a backend connection.
///
/// The backend is taken fully configured; how it talks to the registry is
/// left to whoever built it.
pub struct Client<B> {
    backend: B,
}

impl<B: RegistryBackend> Client<B> {
    /// Wrap a backend connection
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Access the underlying backend
    pub fn backend(&self) -> &B {
        &self.backend
    }

    async fn is_registered(&self, instance: &Instance) -> bool {
        match self.backend.get_instance(&instance.app, instance.id()).await {
            Ok(_) => true,
            Err(e) if e.is_not_found() => false,
            Err(e) => {
                // Can't tell, so fall through to a registration
                debug!(
                    "Existence check for {}/{} failed: {}",
                    instance.app,
                    instance.id(),
                    e
                );
                false
            }
        }
    }

    async fn register_checked(&self, instance: &Instance) -> Result<()> {
        if self.is_registered(instance).await {
            debug!(
                "Instance {}/{} already registered, sending heartbeat",
                instance.app,
                instance.id()
            );
            return self.heartbeat_checked(instance).await;
        }

        info!("Registering instance {}/{}", instance.app, instance.id());
        self.backend.register_instance(instance).await
    }

    async fn heartbeat_checked(&self, instance: &Instance) -> Result<()> {
        match self.backend.heartbeat_instance(instance).await {
            Err(e) if e.is_not_found() => {
                warn!(
                    "Instance {}/{} not found on heartbeat, re-registering",
                    instance.app,
                    instance.id()
                );
                self.reregister(instance).await
            }
            result => result,
        }
    }

    /// Single repair hop: a heartbeat sent from here is not repaired again,
    /// not-found included.
    async fn reregister(&self, instance: &Instance) -> Result<()> {
        if self.is_registered(instance).await {
            debug!(
                "Instance {}/{} reappeared, sending heartbeat",
                instance.app,
                instance.id()
            );
            return self.backend.heartbeat_instance(instance).await;
        }

        info!("Re-registering instance {}/{}", instance.app, instance.id());
        self.backend.register_instance(instance).await
    }
}

#[async_trait]
impl<B: RegistryBackend> RegistryClient for Client<B> {
    async fn register(&self, instance: &Instance) -> Result<()> {
        self.register_checked(instance).await
    }

    async fn deregister(&self, instance: &Instance) -> Result<()> {
        info!("Deregistering instance {}/{}", instance.app, instance.id());
        self.backend.deregister_instance(instance).await
    }

    async fn heartbeat(&self, instance: &Instance) -> Result<()> {
        self.heartbeat_checked(instance).await
    }

    async fn instances(&self, app: &str) -> Result<Vec<Instance>> {
        let application = self.backend.get_application(app).await?;
        Ok(application.instances)
    }

    fn schedule_updates(&self, app: &str, quit: QuitSignal) -> UpdateStream {
        self.backend.subscribe_application_updates(app, false, quit)
    }
}
