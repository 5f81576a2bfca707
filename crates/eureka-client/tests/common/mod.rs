//! Common test utilities for registry client integration tests

#![allow(dead_code)]

pub mod scripted_backend;

use anyhow::{Context, Result};
use eureka_client::{Instance, InstancerEvent};

/// The "orders"/"i-1" instance used throughout the scenarios
pub fn orders_instance() -> Instance {
    Instance::new("orders", "orders-1.local", "10.0.0.1", 8080).with_id("i-1")
}

/// Install a tracing subscriber once so client decisions show up in test output
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_target(false)
        .try_init();
}

/// Receive instancer events until one matches, failing if the instancer stops first
pub async fn wait_for_event(
    events: &async_channel::Receiver<InstancerEvent>,
    matches: impl Fn(&InstancerEvent) -> bool,
) -> Result<InstancerEvent> {
    loop {
        let event = events.recv().await.context("instancer stopped")?;
        if matches(&event) {
            return Ok(event);
        }
    }
}
