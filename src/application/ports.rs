//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain` — never from `crate::infra`,
//! `crate::commands`, or `crate::output`.

use std::process::Output;
use std::time::Duration;

use anyhow::Result;

use crate::domain::{ContainerHandle, Endpoint, ImageRef, RuntimeError};

// ── Constants ─────────────────────────────────────────────────────────────────

/// Prefix for every container name this tool generates, so stray
/// containers from interrupted runs are easy to spot and sweep.
pub const NAME_PREFIX: &str = "wharf";

// ── Value Types ───────────────────────────────────────────────────────────────

/// Daemon version information.
#[derive(Debug, Clone)]
pub struct RuntimeVersion {
    pub version: String,
    pub api_version: String,
}

/// Summary of an image known to the daemon.
#[derive(Debug, Clone)]
pub struct ImageSummary {
    pub id: String,
    pub tags: Vec<String>,
}

/// Summary of a container known to the daemon.
#[derive(Debug, Clone)]
pub struct ContainerSummary {
    pub id: String,
    pub name: String,
    pub image: String,
    pub state: String,
}

/// Parameters for creating a container. Struct-based to avoid breaking
/// test doubles on future parameter additions.
#[derive(Debug, Clone)]
pub struct ContainerSpec {
    /// Image to create the container from.
    pub image: ImageRef,
    /// Container name; generated names use [`NAME_PREFIX`].
    pub name: String,
    /// Command override. `None` runs the image's default command.
    pub cmd: Option<Vec<String>>,
    /// Container-side TCP port to publish on an ephemeral host port.
    pub publish_port: Option<u16>,
}

/// Output of a command executed inside a running container.
#[derive(Debug, Clone)]
pub struct ExecOutput {
    pub exit_code: i64,
    pub output: String,
}

// ── Container Runtime Port ────────────────────────────────────────────────────

/// Abstraction over the container-runtime API, enabling test doubles.
///
/// Methods return domain types and [`RuntimeError`] only — no client-library
/// types cross this boundary. Callers track lifecycle state on the
/// [`ContainerHandle`] they own.
#[allow(async_fn_in_trait)]
pub trait ContainerRuntime {
    /// Verify the control socket answers at all.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::Unavailable`] when the socket is unreachable.
    async fn ping(&self) -> Result<(), RuntimeError>;

    /// Query daemon version information.
    async fn version(&self) -> Result<RuntimeVersion, RuntimeError>;

    /// List images known to the daemon.
    async fn list_images(&self) -> Result<Vec<ImageSummary>, RuntimeError>;

    /// List containers; `all` includes stopped ones.
    async fn list_containers(&self, all: bool) -> Result<Vec<ContainerSummary>, RuntimeError>;

    /// Pull `image` from its registry. Pulling an already-present image is
    /// a no-op refresh, not an error.
    async fn pull_image(&self, image: &ImageRef) -> Result<(), RuntimeError>;

    /// Create a container from `spec`. The returned handle is in the
    /// `Created` state; the caller owns its release.
    async fn create_container(&self, spec: &ContainerSpec) -> Result<ContainerHandle, RuntimeError>;

    /// Start a created container.
    async fn start_container(&self, handle: &ContainerHandle) -> Result<(), RuntimeError>;

    /// Resolve the ephemeral host binding published for `container_port`.
    async fn resolve_endpoint(
        &self,
        handle: &ContainerHandle,
        container_port: u16,
    ) -> Result<Endpoint, RuntimeError>;

    /// Fetch up to `tail` trailing log lines (stdout and stderr interleaved).
    async fn logs(&self, handle: &ContainerHandle, tail: usize) -> Result<String, RuntimeError>;

    /// Execute `cmd` inside the running container and capture its output.
    async fn exec(&self, handle: &ContainerHandle, cmd: &[&str]) -> Result<ExecOutput, RuntimeError>;

    /// Stop a running container. Already-stopped and absent containers are
    /// no-ops.
    async fn stop_container(&self, handle: &ContainerHandle) -> Result<(), RuntimeError>;

    /// Force-remove the container. Removal succeeds from any state; an
    /// absent container is a no-op.
    async fn remove_container(&self, handle: &ContainerHandle) -> Result<(), RuntimeError>;

    /// Remove `image` from the daemon. An absent image is a no-op.
    async fn remove_image(&self, image: &ImageRef) -> Result<(), RuntimeError>;
}

// ── Command Runner Port ───────────────────────────────────────────────────────

/// Abstracts process execution so infrastructure can be swapped or mocked.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Run a program and capture its output.
    ///
    /// Implementations should delegate to `run_with_timeout` using the
    /// instance's configured default timeout.
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output>;

    /// Run a program with a custom timeout override.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned or exceeds
    /// `timeout`. On timeout, the child process must be killed (not left
    /// orphaned).
    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<Output>;
}

// ── Progress Reporting Port ───────────────────────────────────────────────────

/// Abstracts progress reporting so services can emit events without
/// depending on the Presentation layer. Sync trait — no async needed.
pub trait ProgressReporter {
    /// Emit an in-progress step message.
    fn step(&self, message: &str);
    /// Emit a success message.
    fn success(&self, message: &str);
    /// Emit a warning message.
    fn warn(&self, message: &str);
}

// ── Network Probe Port ────────────────────────────────────────────────────────

/// Abstracts host-side network connectivity checks so application services
/// can be tested without real network access.
#[allow(async_fn_in_trait)]
pub trait NetworkProbe {
    /// Check TCP connectivity to the given host and port.
    async fn check_tcp_connectivity(&self, host: &str, port: u16) -> Result<bool>;
    /// Check DNS resolution for the given hostname.
    async fn check_dns_resolution(&self, hostname: &str) -> Result<bool>;
}
