//! Data models for registry instances and applications

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Default interval between heartbeats, in seconds
pub const DEFAULT_RENEWAL_INTERVAL_SECS: u32 = 30;

/// Default time the registry keeps an instance without a heartbeat, in seconds
pub const DEFAULT_LEASE_DURATION_SECS: u32 = 90;

/// One running process of an application
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instance {
    /// Application name grouping instances
    pub app: String,

    /// Explicit instance id, falls back to the host name when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_id: Option<String>,

    /// Host name of the process
    pub host_name: String,

    /// IP address of the process
    pub ip_addr: String,

    /// Plain port
    pub port: u16,

    /// Secure port, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secure_port: Option<u16>,

    /// Virtual IP address the instance serves
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vip_address: Option<String>,

    /// Reported status
    #[serde(default)]
    pub status: InstanceStatus,

    /// Lease timings
    #[serde(default)]
    pub lease: LeaseInfo,

    /// Free-form metadata
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl Instance {
    /// Create an instance with status `Up` and default lease timings
    pub fn new(
        app: impl Into<String>,
        host_name: impl Into<String>,
        ip_addr: impl Into<String>,
        port: u16,
    ) -> Self {
        Self {
            app: app.into(),
            instance_id: None,
            host_name: host_name.into(),
            ip_addr: ip_addr.into(),
            port,
            secure_port: None,
            vip_address: None,
            status: InstanceStatus::Up,
            lease: LeaseInfo::default(),
            metadata: HashMap::new(),
        }
    }

    /// Set an explicit instance id
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.instance_id = Some(id.into());
        self
    }

    /// Identifier of the instance, unique within its application
    pub fn id(&self) -> &str {
        self.instance_id.as_deref().unwrap_or(&self.host_name)
    }

    /// Address other processes use to reach this instance
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.ip_addr, self.port)
    }
}

/// Status an instance reports to the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InstanceStatus {
    /// Ready to receive traffic
    #[default]
    Up,
    /// Not able to serve
    Down,
    /// Still initializing
    Starting,
    /// Deliberately taken out of rotation
    OutOfService,
    /// Status not known
    Unknown,
}

/// Lease timings for an instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaseInfo {
    /// Seconds between heartbeats; zero disables the heartbeat loop
    pub renewal_interval_secs: u32,
    /// Seconds the registry keeps the instance without a heartbeat
    pub duration_secs: u32,
}

impl Default for LeaseInfo {
    fn default() -> Self {
        Self {
            renewal_interval_secs: DEFAULT_RENEWAL_INTERVAL_SECS,
            duration_secs: DEFAULT_LEASE_DURATION_SECS,
        }
    }
}

/// Point-in-time snapshot of the instances registered for an application
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    /// Application name
    pub name: String,
    /// Instances in the order the registry delivered them
    pub instances: Vec<Instance>,
}

/// One element of an application update stream.
///
/// Backends deliver fetch failures in-band rather than ending the stream.
pub type AppUpdate = crate::Result<Application>;
