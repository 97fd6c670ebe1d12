//! Container-side domain types: image references, endpoints, and the
//! per-container lifecycle state machine.

use std::fmt;

use serde::Serialize;

// ── Image reference ───────────────────────────────────────────────────────────

/// A `name:tag` image reference. A missing tag defaults to `latest`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ImageRef(String);

impl ImageRef {
    #[must_use]
    pub fn new(reference: impl Into<String>) -> Self {
        let reference = reference.into();
        // A ':' after the last '/' means a tag is present. Anything before
        // it may be a registry host with a port.
        let tagged = reference
            .rsplit('/')
            .next()
            .is_some_and(|last| last.contains(':'));
        if tagged {
            Self(reference)
        } else {
            Self(format!("{reference}:latest"))
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ── Endpoint ──────────────────────────────────────────────────────────────────

/// A resolved `host:port` binding for a published container port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    /// Render an `http://` URL for `path` (which must start with `/`).
    #[must_use]
    pub fn http_url(&self, path: &str) -> String {
        format!("http://{}:{}{path}", self.host, self.port)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

// ── Lifecycle state machine ───────────────────────────────────────────────────

/// Where a demo/fixture container sits in its lifecycle.
///
/// Forward path: `Absent → Pulling → Created → Running → Stopped → Removed`.
/// `Removed` is reachable from every state: forced cleanup on a failure
/// path skips straight to removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
    Absent,
    Pulling,
    Created,
    Running,
    Stopped,
    Removed,
}

impl LifecycleState {
    /// Whether the machine may move from `self` to `next`.
    ///
    /// `Absent → Created` is allowed directly: the pull step is skippable
    /// when the image is already local.
    #[must_use]
    pub fn can_advance_to(self, next: Self) -> bool {
        if next == Self::Removed {
            return self != Self::Removed;
        }
        matches!(
            (self, next),
            (Self::Absent, Self::Pulling)
                | (Self::Absent | Self::Pulling, Self::Created)
                | (Self::Created, Self::Running)
                | (Self::Running, Self::Stopped)
        )
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Absent => "absent",
            Self::Pulling => "pulling",
            Self::Created => "created",
            Self::Running => "running",
            Self::Stopped => "stopped",
            Self::Removed => "removed",
        };
        f.write_str(name)
    }
}

// ── Container handle ──────────────────────────────────────────────────────────

/// Handle to a container created by a flow.
///
/// The creating flow owns the handle and must release it (stop + remove)
/// before its scope ends, on every exit path.
#[derive(Debug, Clone)]
pub struct ContainerHandle {
    /// Daemon-assigned container id.
    pub id: String,
    /// Generated container name.
    pub name: String,
    /// Image the container was created from.
    pub image: ImageRef,
    /// Current lifecycle state as tracked by the owning flow.
    pub state: LifecycleState,
}

impl ContainerHandle {
    /// Advance the tracked state, returning `false` when the transition is
    /// not a legal move of the lifecycle machine.
    pub fn advance(&mut self, next: LifecycleState) -> bool {
        if self.state.can_advance_to(next) {
            self.state = next;
            true
        } else {
            false
        }
    }
}
