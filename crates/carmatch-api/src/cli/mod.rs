//! CLI command definitions and dispatch for the `carmatch` binary.
//!
//! Uses clap derive macros for argument parsing. Commands are grouped by
//! noun: `carmatch flows ...` for the managed workflows, `carmatch single ...`
//! for the legacy single-workflow setup.

pub mod config;
pub mod flows;
pub mod single;

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use indicatif::{ProgressBar, ProgressStyle};

/// Operate the CarMatch automation workflows.
#[derive(Parser)]
#[command(name = "carmatch", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Only log errors. Command output is still printed.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to the config file (default: $CARMATCH_CONFIG or ./carmatch.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Export tracing spans to stdout via OpenTelemetry.
    #[arg(long, global = true)]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Managed workflows (N8N_FLOW_IDS).
    Flows {
        #[command(subcommand)]
        command: FlowsCommand,
    },

    /// The single configured workflow (N8N_WORKFLOW_ID).
    Single {
        #[command(subcommand)]
        command: SingleCommand,
    },

    /// Print the effective configuration (secrets masked).
    Config,

    /// Start the REST API server.
    Serve {
        /// Port to listen on.
        #[arg(long, default_value = "8080")]
        port: u16,

        /// Host to bind.
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },

    /// Generate shell completions.
    Completions {
        /// Target shell.
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum FlowsCommand {
    /// List managed workflows with their last run.
    #[command(alias = "ls")]
    List,

    /// Show one workflow.
    Show {
        /// Workflow id.
        id: String,
    },

    /// Enable or disable a workflow. Flips the current state by default.
    Toggle {
        /// Workflow id.
        id: String,

        /// Enable the workflow.
        #[arg(long, conflicts_with = "off")]
        on: bool,

        /// Disable the workflow.
        #[arg(long)]
        off: bool,
    },

    /// Trigger a workflow through its webhook.
    Run {
        /// Workflow id.
        id: String,

        /// JSON payload forwarded to the webhook.
        #[arg(long)]
        payload: Option<String>,
    },

    /// Show the normalized status of the last execution.
    Status {
        /// Workflow id.
        id: String,
    },
}

#[derive(Subcommand)]
pub enum SingleCommand {
    /// Show the workflow.
    Show,

    /// Activate the workflow.
    Enable,

    /// Deactivate the workflow.
    Disable,

    /// List recent executions.
    Executions {
        /// Number of executions to fetch.
        #[arg(long, default_value = "20")]
        limit: u32,
    },

    /// Print the editor URL.
    EditorUrl,

    /// Replace the whole workflow definition with a JSON file.
    Replace {
        /// Path to the workflow JSON.
        file: PathBuf,

        /// Skip the confirmation prompt.
        #[arg(long)]
        force: bool,
    },

    /// Trigger the workflow through its webhook.
    Run {
        /// JSON payload forwarded to the webhook.
        #[arg(long)]
        payload: Option<String>,
    },
}

/// Requested active state from the `--on`/`--off` flags; `None` flips.
pub fn desired_state(on: bool, off: bool) -> Option<bool> {
    match (on, off) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

/// Parse a `--payload` argument.
pub fn parse_payload(raw: Option<&str>) -> anyhow::Result<Option<serde_json::Value>> {
    raw.map(|raw| {
        serde_json::from_str(raw).map_err(|e| anyhow::anyhow!("--payload is not valid JSON: {e}"))
    })
    .transpose()
}

/// Cyan spinner used while waiting on the remote.
pub(crate) fn spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}
