//! Runtime configuration — control socket resolution.
//!
//! The socket is read from the environment once, at construction, and
//! handed to the client as an explicit value — never consulted as ambient
//! global state afterwards.

/// Environment variable naming the container-runtime control socket.
pub const DOCKER_HOST_ENV: &str = "DOCKER_HOST";

/// Default Unix socket path when the variable is unset.
pub const DEFAULT_SOCKET: &str = "/var/run/docker.sock";

/// Explicit control-socket configuration for runtime clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    socket: String,
}

impl RuntimeConfig {
    /// Build from an explicit socket value. A `unix://` scheme prefix is
    /// accepted and stripped.
    #[must_use]
    pub fn new(socket: impl Into<String>) -> Self {
        let socket = socket.into();
        let socket = socket
            .strip_prefix("unix://")
            .map_or(socket.as_str(), |rest| rest)
            .to_owned();
        Self { socket }
    }

    /// Read the socket from `DOCKER_HOST` at process start, falling back
    /// to the default socket path.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(std::env::var(DOCKER_HOST_ENV).ok().as_deref())
    }

    /// Resolve from an optional environment value. Split out from
    /// [`Self::from_env`] so it can be tested without mutating the process
    /// environment.
    #[must_use]
    pub fn from_lookup(value: Option<&str>) -> Self {
        match value {
            Some(v) if !v.trim().is_empty() => Self::new(v.trim()),
            _ => Self::new(DEFAULT_SOCKET),
        }
    }

    /// The resolved socket path (scheme stripped).
    #[must_use]
    pub fn socket_path(&self) -> &str {
        &self.socket
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self::from_env()
    }
}
