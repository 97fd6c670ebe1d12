//! Shared mock infrastructure for unit tests.
//!
//! Provides a recording [`ContainerRuntime`] fake with injectable
//! failures, canned [`CommandRunner`]/[`NetworkProbe`] implementations,
//! and output helpers so each test file doesn't have to re-define the
//! same boilerplate.

#![allow(clippy::expect_used)]

use std::os::unix::process::ExitStatusExt;
use std::process::{ExitStatus, Output};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::Result;
use wharf::application::ports::{
    CommandRunner, ContainerRuntime, ContainerSpec, ContainerSummary, ExecOutput, ImageSummary,
    NetworkProbe, ProgressReporter, RuntimeVersion,
};
use wharf::domain::{ContainerHandle, Endpoint, ImageRef, LifecycleState, RuntimeError};

// ── Output helpers ────────────────────────────────────────────────────────────

pub fn ok_output(stdout: &[u8]) -> Output {
    Output {
        status: ExitStatus::from_raw(0),
        stdout: stdout.to_vec(),
        stderr: Vec::new(),
    }
}

pub fn err_output(stderr: &[u8]) -> Output {
    Output {
        status: ExitStatus::from_raw(1 << 8),
        stdout: Vec::new(),
        stderr: stderr.to_vec(),
    }
}

// ── Recording container runtime ───────────────────────────────────────────────

/// Fake runtime that records every call and fails on demand.
#[derive(Default)]
pub struct RecordingRuntime {
    pub calls: Mutex<Vec<String>>,
    pub fail_ping: bool,
    pub fail_pull: bool,
    pub fail_start: bool,
    pub fail_logs: bool,
    pub fail_exec: bool,
    pub fail_stop: bool,
    /// `version` reports the daemon connection as lost (fatal).
    pub drop_daemon_at_version: bool,
    /// `logs` reports the daemon connection as lost (fatal).
    pub drop_daemon_at_logs: bool,
    /// Host port reported by `resolve_endpoint`.
    pub endpoint_port: u16,
}

impl RecordingRuntime {
    pub fn record(&self, call: &str) {
        self.calls.lock().expect("calls lock").push(call.to_owned());
    }

    pub fn recorded(&self) -> Vec<String> {
        self.calls.lock().expect("calls lock").clone()
    }

    pub fn called(&self, name: &str) -> bool {
        self.recorded().iter().any(|c| c == name)
    }
}

impl ContainerRuntime for RecordingRuntime {
    async fn ping(&self) -> Result<(), RuntimeError> {
        self.record("ping");
        if self.fail_ping {
            Err(RuntimeError::Unavailable("mock socket down".to_owned()))
        } else {
            Ok(())
        }
    }

    async fn version(&self) -> Result<RuntimeVersion, RuntimeError> {
        self.record("version");
        if self.drop_daemon_at_version {
            return Err(RuntimeError::Unavailable("daemon connection lost".to_owned()));
        }
        Ok(RuntimeVersion {
            version: "27.0.1".to_owned(),
            api_version: "1.46".to_owned(),
        })
    }

    async fn list_images(&self) -> Result<Vec<ImageSummary>, RuntimeError> {
        self.record("list_images");
        Ok(vec![ImageSummary {
            id: "sha256:0000".to_owned(),
            tags: vec!["alpine:latest".to_owned()],
        }])
    }

    async fn list_containers(&self, _all: bool) -> Result<Vec<ContainerSummary>, RuntimeError> {
        self.record("list_containers");
        Ok(Vec::new())
    }

    async fn pull_image(&self, image: &ImageRef) -> Result<(), RuntimeError> {
        self.record("pull_image");
        if self.fail_pull {
            Err(RuntimeError::ImageNotFound(image.to_string()))
        } else {
            Ok(())
        }
    }

    async fn create_container(&self, spec: &ContainerSpec) -> Result<ContainerHandle, RuntimeError> {
        self.record("create_container");
        Ok(ContainerHandle {
            id: "c0ffee00d00d".to_owned(),
            name: spec.name.clone(),
            image: spec.image.clone(),
            state: LifecycleState::Created,
        })
    }

    async fn start_container(&self, _handle: &ContainerHandle) -> Result<(), RuntimeError> {
        self.record("start_container");
        if self.fail_start {
            Err(RuntimeError::Network("start refused".to_owned()))
        } else {
            Ok(())
        }
    }

    async fn resolve_endpoint(
        &self,
        _handle: &ContainerHandle,
        _container_port: u16,
    ) -> Result<Endpoint, RuntimeError> {
        self.record("resolve_endpoint");
        Ok(Endpoint {
            host: "127.0.0.1".to_owned(),
            port: self.endpoint_port,
        })
    }

    async fn logs(&self, _handle: &ContainerHandle, tail: usize) -> Result<String, RuntimeError> {
        self.record("logs");
        if self.drop_daemon_at_logs {
            Err(RuntimeError::Unavailable("daemon connection lost".to_owned()))
        } else if self.fail_logs {
            Err(RuntimeError::Network("logs failed".to_owned()))
        } else {
            Ok("wharf demo heartbeat\n".repeat(tail))
        }
    }

    async fn exec(
        &self,
        _handle: &ContainerHandle,
        _cmd: &[&str],
    ) -> Result<ExecOutput, RuntimeError> {
        self.record("exec");
        if self.fail_exec {
            Err(RuntimeError::Network("exec failed".to_owned()))
        } else {
            Ok(ExecOutput {
                exit_code: 0,
                output: "ok".to_owned(),
            })
        }
    }

    async fn stop_container(&self, _handle: &ContainerHandle) -> Result<(), RuntimeError> {
        self.record("stop_container");
        if self.fail_stop {
            Err(RuntimeError::Network("stop failed".to_owned()))
        } else {
            Ok(())
        }
    }

    async fn remove_container(&self, _handle: &ContainerHandle) -> Result<(), RuntimeError> {
        self.record("remove_container");
        Ok(())
    }

    async fn remove_image(&self, _image: &ImageRef) -> Result<(), RuntimeError> {
        self.record("remove_image");
        Ok(())
    }
}

// ── Canned command runner ─────────────────────────────────────────────────────

/// Command runner returning a fixed output for every invocation.
pub struct StaticCommandRunner {
    pub output: Output,
}

impl StaticCommandRunner {
    pub fn ok(stdout: &[u8]) -> Self {
        Self {
            output: ok_output(stdout),
        }
    }

    pub fn failing(stderr: &[u8]) -> Self {
        Self {
            output: err_output(stderr),
        }
    }
}

impl CommandRunner for StaticCommandRunner {
    async fn run(&self, _program: &str, _args: &[&str]) -> Result<Output> {
        Ok(self.output.clone())
    }

    async fn run_with_timeout(
        &self,
        _program: &str,
        _args: &[&str],
        _timeout: Duration,
    ) -> Result<Output> {
        Ok(self.output.clone())
    }
}

// ── Canned network probe ──────────────────────────────────────────────────────

/// Network probe answering `true`/`false` for everything.
pub struct StaticNetworkProbe(pub bool);

impl NetworkProbe for StaticNetworkProbe {
    async fn check_tcp_connectivity(&self, _host: &str, _port: u16) -> Result<bool> {
        Ok(self.0)
    }

    async fn check_dns_resolution(&self, _hostname: &str) -> Result<bool> {
        Ok(self.0)
    }
}

// ── Silent reporter ───────────────────────────────────────────────────────────

/// Reporter that swallows all progress events.
pub struct NullReporter;

impl ProgressReporter for NullReporter {
    fn step(&self, _message: &str) {}
    fn success(&self, _message: &str) {}
    fn warn(&self, _message: &str) {}
}

// ── Local HTTP stub ───────────────────────────────────────────────────────────

/// Spawn a thread serving the fixed `response` bytes to every connection
/// on an ephemeral local port. The thread lives until the test binary
/// exits.
pub fn spawn_http_stub(response: &'static str) -> std::net::SocketAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind stub listener");
    let addr = listener.local_addr().expect("stub listener addr");
    let _ = std::thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else { break };
            use std::io::{Read, Write};
            let mut buf = [0u8; 1024];
            let _ = stream.read(&mut buf);
            let _ = stream.write_all(response.as_bytes());
        }
    });
    addr
}
