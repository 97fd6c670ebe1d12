//! Service fixture provisioner tests: scoped teardown, bounded readiness,
//! and the unreachable-socket gate.

#![allow(clippy::expect_used)]

use std::time::Duration;

use wharf::application::ports::ContainerSpec;
use wharf::application::services::provision::{Readiness, with_service};
use wharf::domain::{ImageRef, ProvisionError, RuntimeError};

use crate::mocks::{RecordingRuntime, spawn_http_stub};

fn web_spec() -> ContainerSpec {
    ContainerSpec {
        image: ImageRef::new("nginx:alpine"),
        name: "wharf-fixture-test".to_owned(),
        cmd: None,
        publish_port: Some(80),
    }
}

#[tokio::test]
async fn runs_body_against_endpoint_and_releases() {
    // A bound listener is enough for the TCP probe; no accept needed.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind listener");
    let port = listener.local_addr().expect("listener addr").port();
    let runtime = RecordingRuntime {
        endpoint_port: port,
        ..Default::default()
    };

    let endpoint_seen = with_service(
        &runtime,
        web_spec(),
        Readiness::TcpConnect,
        Duration::from_secs(2),
        |endpoint| async move { Ok(endpoint.to_string()) },
    )
    .await
    .expect("fixture should provision");

    assert_eq!(endpoint_seen, format!("127.0.0.1:{port}"));
    assert!(runtime.called("stop_container"));
    assert!(runtime.called("remove_container"));
}

#[tokio::test]
async fn readiness_timeout_raises_provision_timeout_and_releases() {
    // Grab a port with no listener so every probe fails fast.
    let port = {
        let probe = std::net::TcpListener::bind("127.0.0.1:0").expect("bind probe");
        probe.local_addr().expect("probe addr").port()
    };
    let runtime = RecordingRuntime {
        endpoint_port: port,
        ..Default::default()
    };

    let err = with_service(
        &runtime,
        web_spec(),
        Readiness::TcpConnect,
        Duration::from_millis(600),
        |_endpoint| async move { Ok(()) },
    )
    .await
    .expect_err("readiness must time out");

    match err.downcast_ref::<ProvisionError>() {
        Some(ProvisionError::Timeout { image, .. }) => assert_eq!(image, "nginx:alpine"),
        other => panic!("expected ProvisionError::Timeout, got {other:?}"),
    }
    assert!(runtime.called("remove_container"), "timeout must release");
}

#[tokio::test]
async fn body_error_propagates_after_release() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind listener");
    let port = listener.local_addr().expect("listener addr").port();
    let runtime = RecordingRuntime {
        endpoint_port: port,
        ..Default::default()
    };

    let err = with_service(
        &runtime,
        web_spec(),
        Readiness::TcpConnect,
        Duration::from_secs(2),
        |_endpoint| async move { Err::<(), _>(anyhow::anyhow!("assertion failed in test body")) },
    )
    .await
    .expect_err("body error must propagate");

    assert!(err.to_string().contains("assertion failed"));
    assert!(runtime.called("stop_container"));
    assert!(runtime.called("remove_container"));
}

#[tokio::test]
async fn unreachable_socket_fails_before_any_container_creation() {
    let runtime = RecordingRuntime {
        fail_ping: true,
        ..Default::default()
    };

    let err = with_service(
        &runtime,
        web_spec(),
        Readiness::TcpConnect,
        Duration::from_secs(1),
        |_endpoint| async move { Ok(()) },
    )
    .await
    .expect_err("dead socket must fail the fixture");

    match err.downcast_ref::<ProvisionError>() {
        Some(ProvisionError::Runtime(RuntimeError::Unavailable(_))) => {}
        other => panic!("expected RuntimeUnavailable, got {other:?}"),
    }
    assert!(!runtime.called("create_container"));
    assert!(!runtime.called("remove_container"));
}

#[tokio::test]
async fn http_readiness_accepts_a_success_response() {
    let addr = spawn_http_stub("HTTP/1.1 200 OK\r\ncontent-length: 2\r\n\r\nok");
    let runtime = RecordingRuntime {
        endpoint_port: addr.port(),
        ..Default::default()
    };

    with_service(
        &runtime,
        web_spec(),
        Readiness::HttpGet {
            path: "/".to_owned(),
        },
        Duration::from_secs(3),
        |_endpoint| async move { Ok(()) },
    )
    .await
    .expect("stub answers 200, fixture should be ready");

    assert!(runtime.called("remove_container"));
}

#[tokio::test]
async fn http_readiness_rejects_server_errors_until_timeout() {
    let addr = spawn_http_stub("HTTP/1.1 503 Service Unavailable\r\ncontent-length: 0\r\n\r\n");
    let runtime = RecordingRuntime {
        endpoint_port: addr.port(),
        ..Default::default()
    };

    let err = with_service(
        &runtime,
        web_spec(),
        Readiness::HttpGet {
            path: "/".to_owned(),
        },
        Duration::from_millis(600),
        |_endpoint| async move { Ok(()) },
    )
    .await
    .expect_err("503 is not ready");

    assert!(matches!(
        err.downcast_ref::<ProvisionError>(),
        Some(ProvisionError::Timeout { .. })
    ));
    assert!(runtime.called("remove_container"));
}
