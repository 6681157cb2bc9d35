//! Managed-workflow CLI commands: list, show, toggle, run, status.

use anyhow::Result;
use comfy_table::{presets, Cell, Color, ContentArrangement, Table};
use console::style;

use carmatch_types::automation::{RunStatus, TriggerReport};

use crate::cli::spinner;
use crate::state::AppState;

/// List managed workflows in a table.
///
/// Workflows that fail to load are skipped (see the warnings with `-v`).
pub async fn list_flows(state: &AppState, json: bool) -> Result<()> {
    let spinner = spinner("Fetching workflows...");
    let flows = state.workflow_service.list_flows().await;
    spinner.finish_and_clear();

    if json {
        println!("{}", serde_json::to_string_pretty(&flows)?);
        return Ok(());
    }

    if flows.is_empty() {
        println!();
        println!(
            "  {} No workflows to show. Configure ids with {}",
            style("i").blue().bold(),
            style("N8N_FLOW_IDS").yellow()
        );
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("ID").fg(Color::White),
        Cell::new("Name").fg(Color::White),
        Cell::new("State").fg(Color::White),
        Cell::new("Last Run").fg(Color::White),
        Cell::new("Webhook").fg(Color::White),
        Cell::new("Editor").fg(Color::White),
    ]);

    for flow in &flows {
        let state_cell = if flow.enabled {
            Cell::new("● enabled").fg(Color::Green)
        } else {
            Cell::new("○ disabled").fg(Color::Yellow)
        };
        let webhook_cell = if flow.has_webhook {
            Cell::new("yes").fg(Color::Green)
        } else {
            Cell::new("no").fg(Color::DarkGrey)
        };

        table.add_row(vec![
            Cell::new(&flow.id).fg(Color::Cyan),
            Cell::new(flow.name.as_deref().unwrap_or("-")),
            state_cell,
            Cell::new(flow.last_run.as_deref().unwrap_or("never")).fg(Color::DarkGrey),
            webhook_cell,
            Cell::new(&flow.n8n_url).fg(Color::DarkGrey),
        ]);
    }

    println!();
    println!("{table}");
    println!();
    println!(
        "  {} workflow{}",
        style(flows.len()).bold(),
        if flows.len() == 1 { "" } else { "s" }
    );
    println!();

    Ok(())
}

/// Show one workflow's metadata.
pub async fn show_flow(state: &AppState, id: &str, json: bool) -> Result<()> {
    let workflow = state.workflow_service.get_workflow(id).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&workflow)?);
        return Ok(());
    }

    let config = &state.automation_config;

    println!();
    println!(
        "  {}  {}",
        style("Name:").bold(),
        style(workflow.name.as_deref().unwrap_or("(unnamed)")).cyan()
    );
    println!("  {}    {}", style("ID:").bold(), style(&workflow.id).dim());
    println!("  {} {}", style("State:").bold(), format_active(workflow.active));
    println!(
        "  {} {}",
        style("Webhook:").bold(),
        if config.has_webhook(id) {
            style("configured").green()
        } else {
            style("none").dim()
        }
    );
    if let Some(url) = config.editor_url(id) {
        println!("  {} {}", style("Editor:").bold(), style(url).underlined());
    }
    println!();

    Ok(())
}

/// Enable, disable, or flip a workflow.
pub async fn toggle_flow(state: &AppState, id: &str, desired: Option<bool>, json: bool) -> Result<()> {
    let outcome = state.workflow_service.toggle(id, desired).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} Workflow {} is now {}",
        style("✓").green().bold(),
        style(&outcome.id).cyan(),
        format_active(outcome.active)
    );
    println!();

    Ok(())
}

/// Trigger a workflow through its webhook.
pub async fn run_flow(
    state: &AppState,
    id: &str,
    payload: Option<serde_json::Value>,
    json: bool,
) -> Result<()> {
    let spinner = spinner("Calling webhook...");
    let outcome = state.workflow_service.run_now(id, payload).await;
    spinner.finish_and_clear();

    print_trigger_report(outcome?.into_report(), json)
}

/// Show the normalized status of the last execution.
pub async fn flow_status(state: &AppState, id: &str, json: bool) -> Result<()> {
    let status = state.workflow_service.last_execution_status(id).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} {}",
        style("Status:").bold(),
        format_run_status(status.status())
    );
    match (status.execution(), status.lookup_error()) {
        (Some(execution), _) => {
            println!(
                "  {} {}",
                style("Execution:").bold(),
                style(execution.id.as_deref().unwrap_or("-")).dim()
            );
            println!(
                "  {} {}",
                style("Started:").bold(),
                execution.started_at.as_deref().unwrap_or("-")
            );
            println!(
                "  {} {}",
                style("Stopped:").bold(),
                execution.stopped_at.as_deref().unwrap_or("-")
            );
            if !execution.error.is_empty() {
                println!("  {} {}", style("Error:").bold(), style(&execution.error).red());
            }
        }
        (None, Some(error)) => {
            println!("  {} {}", style("Lookup failed:").bold(), style(error).red());
        }
        (None, None) => {
            println!("  {}", style("No executions yet").dim());
        }
    }
    println!();

    Ok(())
}

/// Print a trigger report; a failed trigger becomes a command error.
pub(crate) fn print_trigger_report(report: TriggerReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if report.ok {
        println!();
        println!("  {} {}", style("✓").green().bold(), report.message);
        if !report.details.is_null() {
            println!("  {}", style(&report.details).dim());
        }
        println!();
    }

    if !report.ok {
        anyhow::bail!("{} (HTTP {})", report.message, report.status);
    }
    Ok(())
}

pub(crate) fn format_active(active: bool) -> String {
    if active {
        style("enabled").green().to_string()
    } else {
        style("disabled").yellow().to_string()
    }
}

fn format_run_status(status: RunStatus) -> String {
    match status {
        RunStatus::Success => style("success").green().to_string(),
        RunStatus::Error => style("error").red().to_string(),
        RunStatus::Running => style("running").cyan().to_string(),
        RunStatus::Canceled => style("canceled").yellow().to_string(),
        RunStatus::Unknown => style("unknown").dim().to_string(),
    }
}
