// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::report::RecordingReporter;
use dl_adapters::FakeTunneler;
use dl_core::Exposure;
use dl_storage::FakeProbe;
use std::sync::Arc;
use tempfile::TempDir;

const PID: u32 = 4242;

fn endpoint(container: &str, name: &str, port: u16) -> ContainerEndpoint {
    ContainerEndpoint {
        container: container.to_string(),
        name: name.to_string(),
        target_port: port,
        exposure: Exposure::Public,
        is_debug: name.starts_with("debug"),
    }
}

fn endpoints() -> Vec<ContainerEndpoint> {
    vec![endpoint("runtime", "http-3000", 3000), endpoint("runtime", "debug", 5858)]
}

struct Harness {
    dir: TempDir,
    tunneler: FakeTunneler,
    store: StateStore,
    reporter: RecordingReporter,
}

fn setup() -> Harness {
    let dir = TempDir::new().unwrap();
    let probe = Arc::new(FakeProbe::with_alive(&[PID]));
    let store = StateStore::new(dir.path(), PID, Platform::Cluster, probe);
    Harness { dir: dir, tunneler: FakeTunneler::new(), store, reporter: RecordingReporter::new() }
}

fn manager(h: &Harness, config: ForwardConfig) -> PortForwardManager<FakeTunneler> {
    PortForwardManager::with_rng(h.tunneler.clone(), Platform::Cluster, config, StdRng::seed_from_u64(7))
}

#[tokio::test]
async fn forwards_each_endpoint_within_range_and_persists() {
    let mut h = setup();
    let mut fwd = manager(&h, ForwardConfig::default());

    let ports = fwd.forward(&endpoints(), &mut h.store, &h.reporter).await.unwrap();

    assert_eq!(ports.len(), 2);
    for port in &ports {
        assert!((20001..30001).contains(&port.local_port), "{port}");
        assert_eq!(port.local_address, "127.0.0.1");
    }
    assert_ne!(ports[0].local_port, ports[1].local_port);
    assert!(ports[1].is_debug);
    assert_eq!(h.store.load().unwrap().forwarded_ports, ports);
    assert!(h.reporter.contains(&format!("Forwarding from 127.0.0.1:{} -> 3000", ports[0].local_port)));
}

#[tokio::test]
async fn forwarding_twice_does_not_duplicate_entries() {
    let mut h = setup();
    let mut fwd = manager(&h, ForwardConfig::default());

    let first = fwd.forward(&endpoints(), &mut h.store, &h.reporter).await.unwrap();
    let second = fwd.forward(&endpoints(), &mut h.store, &h.reporter).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(h.store.load().unwrap().forwarded_ports.len(), 2);
    assert_eq!(h.tunneler.attempts().len(), 2);
}

#[tokio::test]
async fn busy_port_is_retried_with_another() {
    let mut h = setup();
    h.tunneler.set_busy(20001);
    h.tunneler.set_busy(20002);
    let config = ForwardConfig { range: 20001..20004, ..Default::default() };
    let mut fwd = manager(&h, config);

    let ports = fwd.forward(&endpoints()[..1], &mut h.store, &h.reporter).await.unwrap();

    assert_eq!(ports[0].local_port, 20003);
}

#[tokio::test]
async fn exhausted_attempts_fail_with_port_allocation() {
    let mut h = setup();
    for port in 20001..20011 {
        h.tunneler.set_busy(port);
    }
    let config = ForwardConfig { range: 20001..20011, attempts: 4, ..Default::default() };
    let mut fwd = manager(&h, config);

    let err = fwd.forward(&endpoints()[..1], &mut h.store, &h.reporter).await.unwrap_err();

    assert!(matches!(err, ForwardError::PortAllocation { attempts: 4, .. }));
    assert_eq!(err.kind(), "PortAllocationError");
    assert_eq!(h.tunneler.attempts().len(), 4);
}

#[tokio::test]
async fn pinned_port_is_never_retried() {
    let mut h = setup();
    h.tunneler.set_busy(8080);
    let config = ForwardConfig { pins: vec![PortPin::parse("8080:3000").unwrap()], ..Default::default() };
    let mut fwd = manager(&h, config);

    let err = fwd.forward(&endpoints()[..1], &mut h.store, &h.reporter).await.unwrap_err();

    assert!(matches!(err, ForwardError::PortAllocation { attempts: 1, .. }));
    assert_eq!(h.tunneler.attempts().len(), 1);
}

#[tokio::test]
async fn pinned_port_is_used() {
    let mut h = setup();
    let config =
        ForwardConfig { pins: vec![PortPin::parse("8080:runtime:3000").unwrap()], ..Default::default() };
    let mut fwd = manager(&h, config);

    let ports = fwd.forward(&endpoints(), &mut h.store, &h.reporter).await.unwrap();
    assert_eq!(ports[0].local_port, 8080);
    assert_ne!(ports[1].local_port, 8080);
}

#[tokio::test]
async fn previous_port_is_reused_when_free() {
    let mut h = setup();
    let mut previous = manager(&h, ForwardConfig::default());
    let earlier = previous.forward(&endpoints(), &mut h.store, &h.reporter).await.unwrap();
    previous.release(&mut h.store, &h.reporter).await;

    let config = ForwardConfig { previous: earlier.clone(), ..Default::default() };
    let mut fwd = PortForwardManager::with_rng(h.tunneler.clone(), Platform::Cluster, config, StdRng::seed_from_u64(99));
    let ports = fwd.forward(&endpoints(), &mut h.store, &h.reporter).await.unwrap();

    assert_eq!(ports, earlier);
}

#[tokio::test]
async fn release_clears_state_and_closes_tunnels() {
    let mut h = setup();
    let mut fwd = manager(&h, ForwardConfig::default());
    fwd.forward(&endpoints(), &mut h.store, &h.reporter).await.unwrap();

    fwd.release(&mut h.store, &h.reporter).await;

    assert!(fwd.ports().is_empty());
    assert!(h.tunneler.active().is_empty());
    assert!(h.store.load().unwrap().forwarded_ports.is_empty());
}

#[tokio::test]
async fn removed_endpoint_is_closed() {
    let mut h = setup();
    let mut fwd = manager(&h, ForwardConfig::default());
    fwd.forward(&endpoints(), &mut h.store, &h.reporter).await.unwrap();

    let ports = fwd.forward(&endpoints()[..1], &mut h.store, &h.reporter).await.unwrap();

    assert_eq!(ports.len(), 1);
    assert_eq!(h.tunneler.active().len(), 1);
    assert_eq!(h.store.load().unwrap().forwarded_ports, ports);
}

#[tokio::test]
async fn unwritable_state_file_warns_but_keeps_forwarding() {
    let mut h = setup();
    std::fs::create_dir_all(h.dir.path().join(".devloop").join("devstate.json.tmp")).unwrap();
    let mut fwd = manager(&h, ForwardConfig::default());

    let ports = fwd.forward(&endpoints(), &mut h.store, &h.reporter).await.unwrap();
    fwd.release(&mut h.store, &h.reporter).await;

    assert_eq!(ports.len(), 2);
    assert!(h.tunneler.active().is_empty());
    let warnings: Vec<_> = h
        .reporter
        .reports()
        .into_iter()
        .filter(|r| matches!(r, crate::report::Report::Warn(m) if m.contains("Could not update the dev state file")))
        .collect();
    // Two forwards and one release
    assert_eq!(warnings.len(), 3, "{:?}", h.reporter.reports());
}

#[yare::parameterized(
    two_parts   = { "8080:3000", 8080, None, 3000 },
    three_parts = { "9229:runtime:5858", 9229, Some("runtime"), 5858 },
)]
fn parses_pins(spec: &str, local: u16, container: Option<&str>, port: u16) {
    let pin = PortPin::parse(spec).unwrap();
    assert_eq!(pin.local_port, local);
    assert_eq!(pin.container.as_deref(), container);
    assert_eq!(pin.container_port, port);
}

#[yare::parameterized(
    one_part     = { "8080" },
    not_number   = { "http:3000" },
    zero         = { "0:3000" },
    empty_name   = { "8080::3000" },
    four_parts   = { "1:2:3:4" },
    out_of_range = { "70000:3000" },
)]
fn rejects_bad_pins(spec: &str) {
    assert!(matches!(PortPin::parse(spec), Err(ForwardError::InvalidSpec { .. })));
}

#[test]
fn pins_must_name_an_endpoint() {
    let ok = vec![PortPin::parse("8080:3000").unwrap()];
    assert!(validate_pins(&ok, &endpoints()).is_ok());

    let wrong_container = vec![PortPin::parse("8080:db:3000").unwrap()];
    assert!(matches!(
        validate_pins(&wrong_container, &endpoints()),
        Err(ForwardError::UnknownEndpoint { .. })
    ));

    let duplicate = vec![PortPin::parse("8080:3000").unwrap(), PortPin::parse("8080:5858").unwrap()];
    assert!(validate_pins(&duplicate, &endpoints()).is_err());
}
