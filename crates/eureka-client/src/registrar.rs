//! Registration lifecycle for a local instance
//!
//! A [`Registrar`] registers one instance and produces a heartbeat loop
//! that keeps its lease alive. The loop is returned as a future so the
//! caller decides which runtime drives it.

use crate::{
    client::RegistryClient,
    config::ClientConfig,
    error::Result,
    models::Instance,
    signal::{quit_channel, QuitHandle, QuitSignal},
};
use futures::future::{self, BoxFuture, Either};
use futures::FutureExt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Registers an instance and keeps it alive
pub struct Registrar {
    client: Arc<dyn RegistryClient>,
    instance: Instance,
    heartbeat: bool,
}

impl Registrar {
    /// Create a registrar for `instance`
    pub fn new(client: Arc<dyn RegistryClient>, instance: Instance) -> Self {
        Self {
            client,
            instance,
            heartbeat: true,
        }
    }

    /// Create a registrar for the instance described by `config`
    pub fn from_config(client: Arc<dyn RegistryClient>, config: &ClientConfig) -> Self {
        Self::new(client, config.instance.to_instance()).with_heartbeat(config.heartbeat)
    }

    /// Enable or disable the heartbeat loop
    pub fn with_heartbeat(mut self, enabled: bool) -> Self {
        self.heartbeat = enabled;
        self
    }

    /// Instance managed by this registrar
    pub fn instance(&self) -> &Instance {
        &self.instance
    }

    /// Register the instance.
    ///
    /// Returns a handle for deregistration and the heartbeat loop. The loop
    /// completes immediately when heartbeats are disabled or the renewal
    /// interval is zero.
    ///
    /// The loop runs only as long as the handle is alive: dropping the
    /// handle stops heartbeats the same way [`RegistrarHandle::stop`] does,
    /// so keep it for the lifetime of the registration.
    pub async fn register(&self) -> Result<(RegistrarHandle, BoxFuture<'static, ()>)> {
        self.client.register(&self.instance).await?;
        info!("Registered {}/{}", self.instance.app, self.instance.id());

        let (quit, signal) = quit_channel();
        let handle = RegistrarHandle {
            client: self.client.clone(),
            instance: self.instance.clone(),
            quit,
        };

        let interval = Duration::from_secs(u64::from(self.instance.lease.renewal_interval_secs));
        let heartbeats = if self.heartbeat && !interval.is_zero() {
            heartbeat_loop(self.client.clone(), self.instance.clone(), interval, signal).boxed()
        } else {
            debug!("Heartbeats disabled for {}/{}", self.instance.app, self.instance.id());
            future::ready(()).boxed()
        };

        Ok((handle, heartbeats))
    }
}

/// Handle to a registered instance.
///
/// Dropping the handle stops the heartbeat loop.
#[must_use = "dropping the handle stops the heartbeat loop"]
pub struct RegistrarHandle {
    client: Arc<dyn RegistryClient>,
    instance: Instance,
    quit: QuitHandle,
}

impl RegistrarHandle {
    /// Stop the heartbeat loop without deregistering. Safe to call repeatedly.
    pub fn stop(&self) {
        self.quit.quit();
    }

    /// Whether the heartbeat loop has been told to stop
    pub fn is_stopped(&self) -> bool {
        self.quit.is_quit()
    }

    /// Stop heartbeats and remove the instance from the registry
    pub async fn deregister(&self) -> Result<()> {
        self.stop();
        self.client.deregister(&self.instance).await?;
        info!("Deregistered {}/{}", self.instance.app, self.instance.id());
        Ok(())
    }
}

async fn heartbeat_loop(
    client: Arc<dyn RegistryClient>,
    instance: Instance,
    interval: Duration,
    quit: QuitSignal,
) {
    debug!(
        "Starting heartbeats for {}/{} every {:?}",
        instance.app,
        instance.id(),
        interval
    );

    loop {
        let tick = smol::Timer::after(interval);
        let stop = Box::pin(quit.wait());
        if let Either::Right(_) = future::select(tick, stop).await {
            break;
        }

        if let Err(e) = client.heartbeat(&instance).await {
            warn!("Heartbeat for {}/{} failed: {}", instance.app, instance.id(), e);
        }
    }

    debug!("Heartbeats stopped for {}/{}", instance.app, instance.id());
}
