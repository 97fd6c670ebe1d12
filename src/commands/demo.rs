//! Demo command — wires the lifecycle demo service to real infrastructure.

use anyhow::Result;
use clap::Args;
use owo_colors::OwoColorize as _;

use crate::application::services::demo::{self, DemoOptions, DemoSummary, StepStatus};
use crate::domain::ImageRef;
use crate::infra::{BollardRuntime, RuntimeConfig, TokioCommandRunner, TokioNetworkProbe};
use crate::output::OutputContext;
use crate::output::reporter::TerminalReporter;

/// Arguments for the demo command.
#[derive(Args)]
pub struct DemoArgs {
    /// Image used for the lifecycle walk
    #[arg(long, default_value = "alpine:latest")]
    pub image: String,

    /// Container-runtime control socket (unix:// prefix accepted)
    #[arg(long, env = "DOCKER_HOST")]
    pub socket: Option<String>,

    /// Trailing log lines to fetch from the running container
    #[arg(long, default_value_t = 5)]
    pub tail: usize,

    /// Remove the pulled image after the walk
    #[arg(long)]
    pub remove_image: bool,

    /// External host used for the reachability check
    #[arg(long, default_value = "example.com")]
    pub probe_host: String,
}

/// Run the lifecycle demo.
///
/// # Errors
///
/// Returns an error only when the control socket is unreachable — every
/// other step failure is logged into the summary and the exit stays clean.
pub async fn run(ctx: &OutputContext, args: &DemoArgs, json: bool) -> Result<()> {
    let config = args
        .socket
        .as_deref()
        .map_or_else(RuntimeConfig::from_env, RuntimeConfig::new);
    let runtime = BollardRuntime::connect(&config)?;
    let cmd_runner = TokioCommandRunner::default();
    let probe = TokioNetworkProbe;
    let reporter = TerminalReporter::new(ctx);

    let opts = DemoOptions {
        image: ImageRef::new(args.image.as_str()),
        tail: args.tail,
        remove_image: args.remove_image,
        probe_host: args.probe_host.clone(),
    };

    ctx.header("Container lifecycle demo");
    let summary = demo::run_demo(&runtime, &cmd_runner, &probe, &reporter, &opts).await?;
    if json {
        println!("{}", serde_json::to_string(&summary)?);
    } else {
        render_summary(ctx, &summary);
    }
    Ok(())
}

fn render_summary(ctx: &OutputContext, summary: &DemoSummary) {
    ctx.header("Summary");
    for step in &summary.steps {
        let status = match &step.status {
            StepStatus::Passed => "ok".style(ctx.styles.success).to_string(),
            StepStatus::Failed(reason) => {
                format!("{} ({reason})", "failed".style(ctx.styles.warning))
            }
            StepStatus::Skipped(reason) => {
                format!("{} ({reason})", "skipped".style(ctx.styles.dim))
            }
        };
        ctx.kv(step.name, &status);
    }
    if summary.all_passed() {
        ctx.success("all steps passed");
    } else {
        ctx.warn(&format!(
            "{} of {} step(s) did not pass",
            summary.steps.len() - summary
                .steps
                .iter()
                .filter(|s| s.status == StepStatus::Passed)
                .count(),
            summary.steps.len()
        ));
    }
}
