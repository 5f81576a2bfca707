//! Registry backend abstraction
//!
//! A backend owns the connection to the registry, including its wire
//! protocol, retries and update polling. The client only consumes the
//! operations below.

pub mod memory;

use crate::{error::Result, models::*, signal::QuitSignal, updates::UpdateStream};
use async_trait::async_trait;

/// Operations a registry connection must provide
#[async_trait]
pub trait RegistryBackend: Send + Sync {
    /// Submit a fresh registration for an instance
    async fn register_instance(&self, instance: &Instance) -> Result<()>;

    /// Remove an instance's registration
    async fn deregister_instance(&self, instance: &Instance) -> Result<()>;

    /// Renew an instance's lease.
    ///
    /// Must fail with an error for which [`crate::Error::is_not_found`] holds
    /// when the registry has no entry for the instance.
    async fn heartbeat_instance(&self, instance: &Instance) -> Result<()>;

    /// Look up a single instance, `Error::NotFound` when absent
    async fn get_instance(&self, app: &str, id: &str) -> Result<Instance>;

    /// Fetch the current snapshot of an application
    async fn get_application(&self, app: &str) -> Result<Application>;

    /// Follow updates of an application until `quit` fires.
    ///
    /// With `suppress_unchanged` set the backend may skip snapshots it
    /// considers identical to the previous one.
    fn subscribe_application_updates(
        &self,
        app: &str,
        suppress_unchanged: bool,
        quit: QuitSignal,
    ) -> UpdateStream;
}

#[async_trait]
impl<B: RegistryBackend + ?Sized> RegistryBackend for std::sync::Arc<B> {
    async fn register_instance(&self, instance: &Instance) -> Result<()> {
        (**self).register_instance(instance).await
    }

    async fn deregister_instance(&self, instance: &Instance) -> Result<()> {
        (**self).deregister_instance(instance).await
    }

    async fn heartbeat_instance(&self, instance: &Instance) -> Result<()> {
        (**self).heartbeat_instance(instance).await
    }

    async fn get_instance(&self, app: &str, id: &str) -> Result<Instance> {
        (**self).get_instance(app, id).await
    }

    async fn get_application(&self, app: &str) -> Result<Application> {
        (**self).get_application(app).await
    }

    fn subscribe_application_updates(
        &self,
        app: &str,
        suppress_unchanged: bool,
        quit: QuitSignal,
    ) -> UpdateStream {
        (**self).subscribe_application_updates(app, suppress_unchanged, quit)
    }
}
