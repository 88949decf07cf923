// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json;

fn http_port() -> ForwardedPort {
    ForwardedPort {
        container_name: "runtime".to_string(),
        port_name: "http-8080".to_string(),
        local_address: "127.0.0.1".to_string(),
        local_port: 20001,
        container_port: 8080,
        is_debug: false,
        platform: Platform::Cluster,
        exposure: None,
    }
}

#[test]
fn forwarded_port_uses_camel_case_fields() {
    let value = serde_json::to_value(http_port()).unwrap();
    assert_eq!(
        value,
        json!({
            "containerName": "runtime",
            "portName": "http-8080",
            "localAddress": "127.0.0.1",
            "localPort": 20001,
            "containerPort": 8080,
            "isDebug": false,
            "platform": "cluster",
        })
    );
}

#[test]
fn exposure_serialized_only_when_set() {
    let mut port = http_port();
    port.exposure = Some(Exposure::Internal);
    let value = serde_json::to_value(&port).unwrap();
    assert_eq!(value["exposure"], "internal");
}

#[test]
fn is_debug_defaults_to_false_when_missing() {
    let port: ForwardedPort = serde_json::from_value(json!({
        "containerName": "runtime",
        "portName": "debug",
        "localAddress": "127.0.0.1",
        "localPort": 20002,
        "containerPort": 5858,
        "platform": "podman",
    }))
    .unwrap();
    assert!(!port.is_debug);
    assert_eq!(port.platform, Platform::Podman);
}

#[test]
fn display_shows_both_ends() {
    assert_eq!(http_port().to_string(), "[runtime] 127.0.0.1:20001 -> http-8080:8080");
}

#[yare::parameterized(
    cluster = { "cluster", Platform::Cluster },
    podman  = { "podman", Platform::Podman },
)]
fn platform_parses(input: &str, expected: Platform) {
    assert_eq!(input.parse::<Platform>().unwrap(), expected);
    assert_eq!(expected.to_string(), input);
}

#[test]
fn platform_rejects_unknown() {
    let err = "docker".parse::<Platform>().unwrap_err();
    assert!(err.to_string().contains("docker"));
}

#[test]
fn endpoint_key_ignores_local_side() {
    let a = http_port();
    let mut b = http_port();
    b.local_port = 25000;
    assert_eq!(a.endpoint_key(), b.endpoint_key());
}
