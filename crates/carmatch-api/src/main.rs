//! CarMatch automation CLI and REST API entry point.
//!
//! Binary name: `carmatch`
//!
//! Parses CLI arguments, loads configuration, wires the workflow service,
//! then dispatches to the matching command or starts the REST API server.

mod cli;
mod http;
mod state;

use clap::Parser;
use clap_complete::generate;

use carmatch_observe::tracing_setup::{init_tracing, shutdown_tracing, verbosity_directives};

use cli::{desired_state, parse_payload, Cli, Commands, FlowsCommand, SingleCommand};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing(verbosity_directives(cli.verbose, cli.quiet), cli.otel)
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;

    // Shell completions don't need app state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "carmatch", &mut std::io::stdout());
        return Ok(());
    }

    let config_path = cli.config.clone();
    flush_after(
        async move {
            let state = AppState::init(config_path.as_deref()).await?;
            run(cli, state).await
        },
        shutdown_tracing,
    )
    .await
}

/// Await `work`, then call `flush` whether it succeeded or not.
async fn flush_after<T>(
    work: impl Future<Output = anyhow::Result<T>>,
    flush: impl FnOnce(),
) -> anyhow::Result<T> {
    let result = work.await;
    flush();
    result
}

async fn run(cli: Cli, state: AppState) -> anyhow::Result<()> {
    let json = cli.json;

    match cli.command {
        Commands::Flows { command } => match command {
            FlowsCommand::List => cli::flows::list_flows(&state, json).await?,
            FlowsCommand::Show { id } => cli::flows::show_flow(&state, &id, json).await?,
            FlowsCommand::Toggle { id, on, off } => {
                cli::flows::toggle_flow(&state, &id, desired_state(on, off), json).await?;
            }
            FlowsCommand::Run { id, payload } => {
                let payload = parse_payload(payload.as_deref())?;
                cli::flows::run_flow(&state, &id, payload, json).await?;
            }
            FlowsCommand::Status { id } => cli::flows::flow_status(&state, &id, json).await?,
        },

        Commands::Single { command } => match command {
            SingleCommand::Show => cli::single::show(&state, json).await?,
            SingleCommand::Enable => cli::single::set_active(&state, true, json).await?,
            SingleCommand::Disable => cli::single::set_active(&state, false, json).await?,
            SingleCommand::Executions { limit } => {
                cli::single::executions(&state, limit, json).await?;
            }
            SingleCommand::EditorUrl => cli::single::editor_url(&state, json)?,
            SingleCommand::Replace { file, force } => {
                cli::single::replace(&state, &file, force, json).await?;
            }
            SingleCommand::Run { payload } => {
                let payload = parse_payload(payload.as_deref())?;
                cli::single::run(&state, payload, json).await?;
            }
        },

        Commands::Config => cli::config::show_config(&state, json)?,

        Commands::Serve { port, host } => {
            if state.admin_token_hash.is_none() {
                tracing::warn!("CARMATCH_ADMIN_TOKEN is not set; the REST API is unauthenticated");
            }

            let addr = format!("{host}:{port}");
            let listener = tokio::net::TcpListener::bind(&addr).await?;

            println!(
                "  {} CarMatch automation API listening on {}",
                console::style("⚡").bold(),
                console::style(format!("http://{addr}")).cyan()
            );
            println!("  Press Ctrl+C to stop.");
            println!();

            let router = http::router::build_router(state);

            axum::serve(listener, router)
                .with_graceful_shutdown(shutdown_signal())
                .await?;

            println!("\n  Server stopped.");
        }

        Commands::Completions { .. } => unreachable!("handled above"),
    }

    Ok(())
}

/// Resolve on Ctrl+C or SIGTERM.
///
/// If a handler cannot be installed, that branch never resolves.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[tokio::test]
    async fn flush_runs_when_startup_fails() {
        let flushed = AtomicBool::new(false);
        let result: anyhow::Result<()> = flush_after(
            async { Err(anyhow::anyhow!("failed to build HTTP client")) },
            || flushed.store(true, Ordering::SeqCst),
        )
        .await;

        assert!(result.is_err());
        assert!(flushed.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn flush_runs_after_success() {
        let flushed = AtomicBool::new(false);
        let value = flush_after(async { Ok(7) }, || flushed.store(true, Ordering::SeqCst))
            .await
            .unwrap();

        assert_eq!(value, 7);
        assert!(flushed.load(Ordering::SeqCst));
    }
}
