//! Application service — service fixture provisioning for integration tests.
//!
//! Stands up a backing service container bound to an ephemeral host port,
//! blocks until it reports ready (bounded polling, never indefinite), hands
//! the resolved endpoint to the caller's closure, and guarantees teardown
//! when the scope ends — success or failure.

use std::time::{Duration, Instant};

use anyhow::Result;
use tracing::{debug, warn};

use crate::application::ports::{ContainerRuntime, ContainerSpec};
use crate::domain::{ContainerHandle, Endpoint, LifecycleState, ProvisionError};

/// Delay between readiness probe attempts.
pub const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Per-attempt bound for a single probe round-trip.
const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// How to decide a provisioned service is ready.
#[derive(Debug, Clone)]
pub enum Readiness {
    /// An HTTP GET on the mapped endpoint must return a success status.
    HttpGet { path: String },
    /// A TCP connect on the mapped endpoint must succeed.
    TcpConnect,
}

/// Stand up `spec` as a sibling container, wait until `readiness` passes,
/// run `body` against the resolved endpoint, and tear the container down on
/// every exit path.
///
/// # Errors
///
/// - [`crate::domain::RuntimeError::Unavailable`] when the control socket
///   does not answer — raised before any container is created.
/// - [`ProvisionError::Timeout`] when readiness is not reached within
///   `timeout`; the container has been released by then.
/// - Whatever `body` returns is propagated unchanged; teardown has run
///   either way.
pub async fn with_service<R, F, Fut, T>(
    runtime: &R,
    spec: ContainerSpec,
    readiness: Readiness,
    timeout: Duration,
    body: F,
) -> Result<T>
where
    R: ContainerRuntime,
    F: FnOnce(Endpoint) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    runtime.ping().await.map_err(ProvisionError::Runtime)?;

    let container_port = spec.publish_port.unwrap_or(80);
    let mut handle = runtime
        .create_container(&spec)
        .await
        .map_err(ProvisionError::Runtime)?;

    // From here on the container exists; release it no matter what.
    let result = provision_and_run(
        runtime,
        &mut handle,
        container_port,
        &readiness,
        timeout,
        body,
    )
    .await;
    release(runtime, &mut handle).await;
    result
}

async fn provision_and_run<R, F, Fut, T>(
    runtime: &R,
    handle: &mut ContainerHandle,
    container_port: u16,
    readiness: &Readiness,
    timeout: Duration,
    body: F,
) -> Result<T>
where
    R: ContainerRuntime,
    F: FnOnce(Endpoint) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    runtime
        .start_container(handle)
        .await
        .map_err(ProvisionError::Runtime)?;
    let _ = handle.advance(LifecycleState::Running);

    let endpoint = runtime
        .resolve_endpoint(handle, container_port)
        .await
        .map_err(ProvisionError::Runtime)?;
    debug!(container = %handle.name, %endpoint, "service container started");

    wait_ready(&endpoint, readiness, timeout)
        .await
        .map_err(|waited| ProvisionError::Timeout {
            image: handle.image.to_string(),
            waited_secs: waited.as_secs(),
        })?;

    body(endpoint).await
}

/// Poll the endpoint until the probe passes or `timeout` elapses. Returns
/// the elapsed wait on failure.
async fn wait_ready(
    endpoint: &Endpoint,
    readiness: &Readiness,
    timeout: Duration,
) -> Result<(), Duration> {
    let started = Instant::now();
    loop {
        if probe_once(endpoint, readiness).await {
            return Ok(());
        }
        if started.elapsed() >= timeout {
            return Err(started.elapsed());
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

async fn probe_once(endpoint: &Endpoint, readiness: &Readiness) -> bool {
    match readiness {
        Readiness::HttpGet { path } => {
            let Ok(client) = reqwest::Client::builder().timeout(PROBE_TIMEOUT).build() else {
                return false;
            };
            match client.get(endpoint.http_url(path)).send().await {
                Ok(resp) => resp.status().is_success(),
                Err(_) => false,
            }
        }
        Readiness::TcpConnect => {
            let addr = format!("{}:{}", endpoint.host, endpoint.port);
            matches!(
                tokio::time::timeout(PROBE_TIMEOUT, tokio::net::TcpStream::connect(&addr)).await,
                Ok(Ok(_))
            )
        }
    }
}

/// Best-effort release: stop if running, then force-remove. Failures are
/// logged, not raised — the caller's result must survive teardown.
async fn release(runtime: &impl ContainerRuntime, handle: &mut ContainerHandle) {
    if handle.state == LifecycleState::Running {
        match runtime.stop_container(handle).await {
            Ok(()) => {
                let _ = handle.advance(LifecycleState::Stopped);
            }
            Err(e) => warn!(container = %handle.name, error = %e, "stop during release failed"),
        }
    }
    match runtime.remove_container(handle).await {
        Ok(()) => {
            let _ = handle.advance(LifecycleState::Removed);
        }
        Err(e) => warn!(container = %handle.name, error = %e, "remove during release failed"),
    }
}
