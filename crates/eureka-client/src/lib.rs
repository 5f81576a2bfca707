//! Self-healing registration client for a service registry
//!
//! This crate keeps a local instance's registration consistent with a
//! remote registry. The registry connection itself is supplied as a
//! [`RegistryBackend`]; [`Client`] adds the reconciliation rules on top:
//!
//! - `register` checks whether the instance exists first and sends a
//!   heartbeat instead of a duplicate registration;
//! - `heartbeat` re-registers the instance when the registry reports it
//!   as not found, e.g. after a registry restart or lease expiry;
//! - every other error is returned to the caller untouched.
//!
//! Everything is runtime-agnostic: long-running work (heartbeat loops,
//! update followers) is handed back as futures for the caller to spawn.
//!
//! # Example
//!
//! ```no_run
//! use eureka_client::{Client, Instance, MemoryBackend, RegistryClient};
//!
//! # async fn example() -> eureka_client::Result<()> {
//! let client = Client::new(MemoryBackend::new());
//! let instance = Instance::new("orders", "orders-1.local", "10.0.0.1", 8080);
//!
//! client.register(&instance).await?;
//! client.heartbeat(&instance).await?;
//!
//! let instances = client.instances("orders").await?;
//! assert_eq!(instances.len(), 1);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod backend;
pub mod client;
pub mod config;
pub mod error;
pub mod instancer;
pub mod models;
pub mod registrar;
pub mod signal;
pub mod updates;

pub use backend::{memory::MemoryBackend, RegistryBackend};
pub use client::{Client, RegistryClient};
pub use config::{ClientConfig, InstanceConfig};
pub use error::{Error, Result};
pub use instancer::{Instancer, InstancerEvent};
pub use models::*;
pub use registrar::{Registrar, RegistrarHandle};
pub use signal::{quit_channel, QuitHandle, QuitSignal};
pub use updates::UpdateStream;

/// Re-export key types for convenience
pub mod prelude {
    pub use crate::{
        quit_channel, AppUpdate, Application, Client, Error, Instance, InstanceStatus,
        RegistryBackend, RegistryClient, Result, UpdateStream,
    };
}
