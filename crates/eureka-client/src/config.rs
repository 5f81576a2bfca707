//! Configuration for the local instance and its registration

use crate::error::Result;
use crate::models::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Instance to register
    pub instance: InstanceConfig,
    /// Whether the registrar sends periodic heartbeats
    #[serde(default = "default_heartbeat")]
    pub heartbeat: bool,
}

fn default_heartbeat() -> bool {
    true
}

/// Description of the local instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceConfig {
    /// Application name
    pub app: String,
    /// Explicit instance id, defaults to the host name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_id: Option<String>,
    /// Host name
    pub host_name: String,
    /// IP address
    pub ip_addr: String,
    /// Plain port
    pub port: u16,
    /// Secure port (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secure_port: Option<u16>,
    /// Virtual IP address (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vip_address: Option<String>,
    /// Metadata attached to the registration
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    /// Seconds between heartbeats
    #[serde(default = "default_renewal_interval")]
    pub renewal_interval_secs: u32,
    /// Seconds the registry keeps the instance without a heartbeat
    #[serde(default = "default_lease_duration")]
    pub lease_duration_secs: u32,
}

fn default_renewal_interval() -> u32 {
    DEFAULT_RENEWAL_INTERVAL_SECS
}

fn default_lease_duration() -> u32 {
    DEFAULT_LEASE_DURATION_SECS
}

impl InstanceConfig {
    /// Build the instance this configuration describes, with status `Up`
    pub fn to_instance(&self) -> Instance {
        Instance {
            app: self.app.clone(),
            instance_id: self.instance_id.clone(),
            host_name: self.host_name.clone(),
            ip_addr: self.ip_addr.clone(),
            port: self.port,
            secure_port: self.secure_port,
            vip_address: self.vip_address.clone(),
            status: InstanceStatus::Up,
            lease: LeaseInfo {
                renewal_interval_secs: self.renewal_interval_secs,
                duration_secs: self.lease_duration_secs,
            },
            metadata: self.metadata.clone(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from file
    pub async fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        use async_fs::File;
        use futures::io::AsyncReadExt;

        let mut file = File::open(path.as_ref()).await?;
        let mut contents = String::new();
        file.read_to_string(&mut contents).await?;

        // YAML by extension, JSON otherwise
        match path.as_ref().extension().and_then(|s| s.to_str()) {
            Some("yaml") | Some("yml") => Ok(serde_yaml::from_str(&contents)?),
            _ => Ok(serde_json::from_str(&contents)?),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const YAML: &str = r#"
instance:
  app: orders
  instance_id: i-1
  host_name: orders-1.local
  ip_addr: 10.0.0.1
  port: 8080
  metadata:
    zone: eu-west-1a
"#;

    #[test]
    fn test_defaults() {
        let config: ClientConfig = serde_yaml::from_str(YAML).unwrap();
        assert!(config.heartbeat);

        let instance = config.instance.to_instance();
        assert_eq!(instance.id(), "i-1");
        assert_eq!(instance.status, InstanceStatus::Up);
        assert_eq!(instance.lease, LeaseInfo::default());
        assert_eq!(instance.metadata.get("zone").map(String::as_str), Some("eu-west-1a"));
    }

    #[test]
    fn test_config_serialization() {
        let config: ClientConfig = serde_yaml::from_str(YAML).unwrap();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: ClientConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.instance.to_instance(), config.instance.to_instance());
    }

    #[smol_potat::test]
    async fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();

        let yaml_path = dir.path().join("client.yaml");
        std::fs::write(&yaml_path, YAML).unwrap();
        let config = ClientConfig::from_file(&yaml_path).await.unwrap();
        assert_eq!(config.instance.app, "orders");

        let json_path = dir.path().join("client.json");
        std::fs::write(
            &json_path,
            r#"{"instance": {"app": "billing", "host_name": "b", "ip_addr": "10.0.0.2", "port": 9090, "renewal_interval_secs": 0}, "heartbeat": false}"#,
        )
        .unwrap();
        let config = ClientConfig::from_file(&json_path).await.unwrap();
        assert!(!config.heartbeat);
        assert_eq!(config.instance.to_instance().lease.renewal_interval_secs, 0);

        assert!(ClientConfig::from_file(dir.path().join("missing.yaml")).await.is_err());
    }
}
