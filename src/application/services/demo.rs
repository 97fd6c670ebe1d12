//! Application service — the container lifecycle demo flow.
//!
//! A sequence of discrete operations against the container runtime, each
//! modeled as a result-returning unit so the orchestrating sequence can
//! inspect and log failures without exception-style control flow. A failure
//! in one step does not abort the remaining steps; only an unreachable
//! control socket is fatal. Once a container exists, stop + remove runs on
//! every path out of the flow.

use anyhow::Result;
use serde::Serialize;
use tracing::debug;

use crate::application::ports::{
    CommandRunner, ContainerRuntime, ContainerSpec, NAME_PREFIX, NetworkProbe, ProgressReporter,
};
use crate::domain::{ContainerHandle, ImageRef, LifecycleState, RuntimeError};

// ── Options and reports ───────────────────────────────────────────────────────

/// What the demo runs and how.
#[derive(Debug, Clone)]
pub struct DemoOptions {
    /// Image used for the lifecycle walk.
    pub image: ImageRef,
    /// Trailing log lines to fetch from the running container.
    pub tail: usize,
    /// Remove the pulled image after the walk.
    pub remove_image: bool,
    /// External host used for the reachability check.
    pub probe_host: String,
}

impl Default for DemoOptions {
    fn default() -> Self {
        Self {
            image: ImageRef::new("alpine"),
            tail: 5,
            remove_image: false,
            probe_host: "example.com".to_owned(),
        }
    }
}

/// Outcome of one demo step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Passed,
    Failed(String),
    Skipped(String),
}

/// One named step and how it went.
#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    pub name: &'static str,
    pub status: StepStatus,
}

/// Aggregated step outcomes for the whole walk.
#[derive(Debug, Default, Serialize)]
pub struct DemoSummary {
    pub steps: Vec<StepReport>,
}

impl DemoSummary {
    #[must_use]
    pub fn failed(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| matches!(s.status, StepStatus::Failed(_)))
            .count()
    }

    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.steps
            .iter()
            .all(|s| matches!(s.status, StepStatus::Passed))
    }

    /// Record a step outcome. A fatal error is recorded like any other
    /// failure and then handed back so the walk aborts.
    fn record(
        &mut self,
        reporter: &impl ProgressReporter,
        name: &'static str,
        result: Result<String, RuntimeError>,
    ) -> Result<(), RuntimeError> {
        match result {
            Ok(detail) => {
                reporter.success(&format!("{name}: {detail}"));
                self.steps.push(StepReport {
                    name,
                    status: StepStatus::Passed,
                });
                Ok(())
            }
            Err(e) => {
                reporter.warn(&format!("{name}: {e}"));
                self.steps.push(StepReport {
                    name,
                    status: StepStatus::Failed(e.to_string()),
                });
                if e.is_fatal() { Err(e) } else { Ok(()) }
            }
        }
    }

    fn skip(&mut self, reporter: &impl ProgressReporter, name: &'static str, reason: &str) {
        reporter.warn(&format!("{name}: skipped ({reason})"));
        self.steps.push(StepReport {
            name,
            status: StepStatus::Skipped(reason.to_owned()),
        });
    }
}

// ── The flow ──────────────────────────────────────────────────────────────────

/// Walk the lifecycle demonstration.
///
/// # Errors
///
/// Returns [`RuntimeError::Unavailable`] when the control socket does not
/// answer the initial ping — before any container is created — or when
/// the daemon drops away mid-walk; anything created by then is still torn
/// down first. Every other failure is recorded in the returned summary
/// and the walk continues.
pub async fn run_demo(
    runtime: &impl ContainerRuntime,
    cmd: &impl CommandRunner,
    probe: &impl NetworkProbe,
    reporter: &impl ProgressReporter,
    opts: &DemoOptions,
) -> Result<DemoSummary, RuntimeError> {
    let mut summary = DemoSummary::default();

    // Fatal gate: nothing is created until the socket answers.
    reporter.step("checking control socket...");
    runtime.ping().await?;
    reporter.success("daemon is reachable");

    let mut handle = None;
    let walked = walk_steps(runtime, cmd, probe, reporter, opts, &mut summary, &mut handle).await;

    // Teardown runs whenever a container exists, no matter which of the
    // steps above failed — including a fatal abort of the walk.
    let torn_down = match handle.as_mut() {
        Some(handle) => {
            reporter.step("stopping and removing container...");
            summary.record(reporter, "stop and remove", teardown(runtime, handle).await)
        }
        None => Ok(()),
    };
    walked?;
    torn_down?;

    if opts.remove_image {
        reporter.step(&format!("removing {}...", opts.image));
        summary.record(reporter, "remove image", remove_image(runtime, &opts.image).await)?;
    }

    Ok(summary)
}

/// The steps between the ping gate and teardown. Stops at the first
/// fatal error; the caller still releases whatever was created.
async fn walk_steps(
    runtime: &impl ContainerRuntime,
    cmd: &impl CommandRunner,
    probe: &impl NetworkProbe,
    reporter: &impl ProgressReporter,
    opts: &DemoOptions,
    summary: &mut DemoSummary,
    handle: &mut Option<ContainerHandle>,
) -> Result<(), RuntimeError> {
    reporter.step("querying versions...");
    summary.record(reporter, "docker CLI version", cli_version(cmd).await)?;
    summary.record(reporter, "daemon version", daemon_version(runtime).await)?;

    reporter.step("listing images and containers...");
    summary.record(reporter, "list images", list_images(runtime).await)?;
    summary.record(reporter, "list containers", list_containers(runtime).await)?;

    reporter.step(&format!("pulling {}...", opts.image));
    summary.record(reporter, "pull image", pull_image(runtime, &opts.image).await)?;

    reporter.step("running demo container...");
    match run_container(runtime, &opts.image).await {
        Ok(running) => {
            reporter.success(&format!(
                "run container: {} ({})",
                running.name,
                short_id(&running.id)
            ));
            summary.steps.push(StepReport {
                name: "run container",
                status: StepStatus::Passed,
            });
            *handle = Some(running);
        }
        Err((e, created)) => {
            reporter.warn(&format!("run container: {e}"));
            summary.steps.push(StepReport {
                name: "run container",
                status: StepStatus::Failed(e.to_string()),
            });
            // A create that succeeded but failed to start still owns a
            // container; the caller releases it.
            *handle = created;
            if e.is_fatal() {
                return Err(e);
            }
        }
    }

    match handle.as_ref().filter(|h| h.state == LifecycleState::Running) {
        Some(running) => {
            reporter.step("fetching logs...");
            summary.record(reporter, "fetch logs", fetch_logs(runtime, running, opts.tail).await)?;

            reporter.step("checking network reachability...");
            summary.record(
                reporter,
                "network check",
                network_check(runtime, probe, running, &opts.probe_host).await,
            )?;
        }
        None => {
            summary.skip(reporter, "fetch logs", "no running container");
            summary.skip(reporter, "network check", "no running container");
        }
    }
    Ok(())
}

// ── Steps ─────────────────────────────────────────────────────────────────────

async fn cli_version(cmd: &impl CommandRunner) -> Result<String, RuntimeError> {
    let output = cmd
        .run("docker", &["--version"])
        .await
        .map_err(|e| RuntimeError::Cli {
            code: -1,
            stderr: e.to_string(),
        })?;
    if output.status.success() {
        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(stdout.lines().next().unwrap_or_default().to_owned())
    } else {
        Err(RuntimeError::Cli {
            code: output.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
        })
    }
}

async fn daemon_version(runtime: &impl ContainerRuntime) -> Result<String, RuntimeError> {
    let version = runtime.version().await?;
    Ok(format!("{} (API {})", version.version, version.api_version))
}

async fn list_images(runtime: &impl ContainerRuntime) -> Result<String, RuntimeError> {
    let images = runtime.list_images().await?;
    Ok(format!("{} image(s)", images.len()))
}

async fn list_containers(runtime: &impl ContainerRuntime) -> Result<String, RuntimeError> {
    let containers = runtime.list_containers(true).await?;
    Ok(format!("{} container(s)", containers.len()))
}

async fn pull_image(
    runtime: &impl ContainerRuntime,
    image: &ImageRef,
) -> Result<String, RuntimeError> {
    runtime.pull_image(image).await?;
    Ok(format!("{image} is present"))
}

/// Create and start the demo container. On a start failure the created
/// handle is returned alongside the error so the caller can release it.
async fn run_container(
    runtime: &impl ContainerRuntime,
    image: &ImageRef,
) -> Result<ContainerHandle, (RuntimeError, Option<ContainerHandle>)> {
    let spec = ContainerSpec {
        image: image.clone(),
        name: format!("{NAME_PREFIX}-demo-{}", uuid::Uuid::new_v4()),
        // Keep the container alive and chatty so the log fetch has content.
        cmd: Some(vec![
            "sh".to_owned(),
            "-c".to_owned(),
            "while true; do echo wharf demo heartbeat; sleep 1; done".to_owned(),
        ]),
        publish_port: None,
    };

    let mut handle = runtime
        .create_container(&spec)
        .await
        .map_err(|e| (e, None))?;
    debug!(container = %handle.name, id = %handle.id, "container created");

    if let Err(e) = runtime.start_container(&handle).await {
        return Err((e, Some(handle)));
    }
    let _ = handle.advance(LifecycleState::Running);
    Ok(handle)
}

async fn fetch_logs(
    runtime: &impl ContainerRuntime,
    handle: &ContainerHandle,
    tail: usize,
) -> Result<String, RuntimeError> {
    // Give the container's first heartbeat a moment to land.
    tokio::time::sleep(std::time::Duration::from_millis(1200)).await;
    let logs = runtime.logs(handle, tail).await?;
    let lines = logs.lines().count();
    debug!(container = %handle.name, lines, "fetched logs");
    Ok(format!("{lines} line(s) of output"))
}

/// Reachability from the container's vantage point, with a host-side
/// cross-check through the network probe.
async fn network_check(
    runtime: &impl ContainerRuntime,
    probe: &impl NetworkProbe,
    handle: &ContainerHandle,
    host: &str,
) -> Result<String, RuntimeError> {
    let exec = runtime
        .exec(handle, &["nslookup", host])
        .await?;
    let container_dns = exec.exit_code == 0;

    let host_dns = probe.check_dns_resolution(host).await.unwrap_or(false);
    let host_tcp = probe
        .check_tcp_connectivity("8.8.8.8", 53)
        .await
        .unwrap_or(false);

    if container_dns {
        Ok(format!(
            "container resolves {host}; host dns={host_dns} tcp={host_tcp}"
        ))
    } else {
        Err(RuntimeError::Network(format!(
            "container cannot resolve {host} (exit {}); host dns={host_dns} tcp={host_tcp}",
            exec.exit_code
        )))
    }
}

async fn teardown(
    runtime: &impl ContainerRuntime,
    handle: &mut ContainerHandle,
) -> Result<String, RuntimeError> {
    let mut stop_err = None;
    if handle.state == LifecycleState::Running {
        match runtime.stop_container(handle).await {
            Ok(()) => {
                let _ = handle.advance(LifecycleState::Stopped);
            }
            // Forced removal below still reaches `Removed` from `Running`.
            Err(e) => stop_err = Some(e),
        }
    }
    runtime.remove_container(handle).await?;
    let _ = handle.advance(LifecycleState::Removed);
    match stop_err {
        None => Ok(format!("{} is {}", handle.name, handle.state)),
        Some(e) => Err(RuntimeError::Network(format!(
            "container removed, but stop failed first: {e}"
        ))),
    }
}

async fn remove_image(
    runtime: &impl ContainerRuntime,
    image: &ImageRef,
) -> Result<String, RuntimeError> {
    runtime.remove_image(image).await?;
    Ok(format!("{image} removed"))
}

fn short_id(id: &str) -> &str {
    id.get(..12).unwrap_or(id)
}
