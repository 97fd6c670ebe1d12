//! Typed domain error enums.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! or `crate::application`. All error types implement `thiserror::Error`
//! and convert to `anyhow::Error` via the `?` operator.

use thiserror::Error;

// ── Runtime errors ────────────────────────────────────────────────────────────

/// Errors crossing the container-runtime boundary.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// The control socket could not be reached. Fatal: nothing attempted
    /// after this point in a flow can succeed, so the flow aborts after
    /// cleaning up anything it already created.
    #[error("Docker daemon unreachable: {0}")]
    Unavailable(String),

    /// The requested image does not exist locally or in the registry.
    /// Non-fatal in the demo flow.
    #[error("image not found: {0}")]
    ImageNotFound(String),

    /// The daemon answered, but an operation failed in transit or was
    /// rejected. Non-fatal in the demo flow.
    #[error("runtime operation failed: {0}")]
    Network(String),

    /// A direct `docker` CLI invocation exited non-zero.
    #[error("docker CLI exited with status {code}: {stderr}")]
    Cli { code: i32, stderr: String },
}

impl RuntimeError {
    /// Whether this error aborts the owning flow rather than being logged
    /// at the step boundary.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

// ── Provisioning errors ───────────────────────────────────────────────────────

/// Errors from the service fixture provisioner.
#[derive(Debug, Error)]
pub enum ProvisionError {
    /// The readiness probe exhausted its bound. The container has already
    /// been torn down by the time this is returned.
    #[error("service {image} did not become ready within {waited_secs}s")]
    Timeout { image: String, waited_secs: u64 },

    /// The runtime failed underneath the provisioner.
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}
