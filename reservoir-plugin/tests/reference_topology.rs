//! Builds a small reservoir entirely from the bundled `mem:` reference
//! plugins and exercises the start/stop cycle against real (not
//! test-fixture) stage implementations.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::time::Duration;

use reservoir_core::adapter::{DigesterAdapter, ExpellerAdapter, IngesterAdapter};
use reservoir_core::control::control_pair;
use reservoir_core::{ControlHandle, QueueAdapter, Reservoir};
use reservoir_plugin::mem::InMemoryPluginRegistry;
use reservoir_plugin::PluginRegistry;

fn placeholder_handle() -> ControlHandle {
    control_pair().1
}

#[tokio::test]
async fn reference_plugins_assemble_into_a_working_reservoir() {
    let registry = InMemoryPluginRegistry::with_reference_plugins();

    let queue1 = registry.resolve_queue("mem:channel", r#"{"capacity": 8}"#).expect("queue resolves");
    let queue2 = registry.resolve_queue("mem:channel", r#"{"capacity": 8}"#).expect("queue resolves");
    let ingester = registry.resolve_ingester("mem:stdin", "").expect("ingester resolves");
    let digester = registry.resolve_digester("mem:echo", "").expect("digester resolves");
    let expeller = registry.resolve_expeller("mem:stdout", "").expect("expeller resolves");

    let digester_queue = QueueAdapter::new(queue2, placeholder_handle());
    let digester_adapter = DigesterAdapter::new(digester, digester_queue, placeholder_handle(), placeholder_handle());

    let ingester_queue = QueueAdapter::new(queue1, placeholder_handle());
    let ingester_adapter = IngesterAdapter::new(ingester, ingester_queue, vec![digester_adapter], placeholder_handle(), placeholder_handle());

    let expeller_adapter = ExpellerAdapter::new(expeller, vec![ingester_adapter], placeholder_handle(), placeholder_handle());

    let mut reservoir = Reservoir::new("reference-demo".to_string(), expeller_adapter);
    assert_eq!(reservoir.get_flow().unwrap(), vec!["stdin", "channel", "echo", "channel", "stdout"]);

    reservoir.start().expect("start");
    // The reference stdin ingester blocks on real stdin, which in a test
    // harness is closed/empty; it should observe EOF near-instantly and
    // then idle until told to stop.
    tokio::time::sleep(Duration::from_millis(100)).await;
    reservoir.init_stop().expect("init_stop");
    reservoir.wait().await;

    assert!(reservoir.is_stopped());
}

#[tokio::test]
async fn unknown_plugin_name_is_an_instantiation_error() {
    let registry = InMemoryPluginRegistry::with_reference_plugins();
    let err = registry.resolve_digester("mem:does-not-exist", "").unwrap_err();
    assert!(matches!(err, reservoir_plugin::PluginError::UnknownLocation(_)));
}
