//! Legacy single-workflow commands, driven by `N8N_WORKFLOW_ID`.

use std::path::Path;

use anyhow::{Context, Result};
use comfy_table::{presets, Cell, Color, ContentArrangement, Table};
use console::style;
use dialoguer::Confirm;

use carmatch_core::automation::status::resolve_run_status;

use crate::cli::flows::{format_active, print_trigger_report};
use crate::cli::spinner;
use crate::state::AppState;

pub async fn show(state: &AppState, json: bool) -> Result<()> {
    let workflow = state.workflow_service.get_workflow_single().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&workflow)?);
        return Ok(());
    }

    println!();
    println!(
        "  {}  {}",
        style("Name:").bold(),
        style(workflow.name.as_deref().unwrap_or("(unnamed)")).cyan()
    );
    println!("  {}    {}", style("ID:").bold(), style(&workflow.id).dim());
    println!("  {} {}", style("State:").bold(), format_active(workflow.active));
    println!();

    Ok(())
}

/// Activate or deactivate the configured workflow.
pub async fn set_active(state: &AppState, active: bool, json: bool) -> Result<()> {
    let workflow = state.workflow_service.set_active_single(active).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&workflow)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} Workflow {} is now {}",
        style("✓").green().bold(),
        style(&workflow.id).cyan(),
        format_active(workflow.active)
    );
    println!();

    Ok(())
}

/// List recent executions, newest first as returned by the remote.
pub async fn executions(state: &AppState, limit: u32, json: bool) -> Result<()> {
    let list = state.workflow_service.list_executions_single(limit).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&list)?);
        return Ok(());
    }

    let executions = list.executions();
    if executions.is_empty() {
        println!();
        println!("  {} No executions yet", style("i").blue().bold());
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Execution").fg(Color::White),
        Cell::new("Status").fg(Color::White),
        Cell::new("Started").fg(Color::White),
        Cell::new("Stopped").fg(Color::White),
    ]);

    for execution in executions {
        let status = resolve_run_status(execution);
        let status_cell = if status.is_success() {
            Cell::new(status.to_string()).fg(Color::Green)
        } else {
            Cell::new(status.to_string()).fg(Color::Yellow)
        };

        table.add_row(vec![
            Cell::new(execution.id.as_deref().unwrap_or("-")).fg(Color::Cyan),
            status_cell,
            Cell::new(execution.started_at.as_deref().unwrap_or("-")),
            Cell::new(execution.stopped_at.as_deref().unwrap_or("-")).fg(Color::DarkGrey),
        ]);
    }

    println!();
    println!("{table}");
    println!();

    Ok(())
}

pub fn editor_url(state: &AppState, json: bool) -> Result<()> {
    let url = state.workflow_service.editor_url_single()?;

    if json {
        println!("{}", serde_json::json!({ "url": url }));
    } else {
        println!("{url}");
    }

    Ok(())
}

/// Replace the whole workflow definition.
///
/// The remote keeps no history, so the previous definition is lost unless
/// exported beforehand.
pub async fn replace(state: &AppState, file: &Path, force: bool, json: bool) -> Result<()> {
    let raw = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let definition: serde_json::Value = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not valid JSON", file.display()))?;

    if !force {
        let workflow_id = state.automation_config.single_workflow_id()?;
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Replace the full definition of workflow '{workflow_id}'? This cannot be undone"
            ))
            .default(false)
            .interact()?;

        if !confirmed {
            println!("  Cancelled.");
            return Ok(());
        }
    }

    let spinner = spinner("Uploading workflow...");
    let result = state.workflow_service.replace_workflow_single(&definition).await;
    spinner.finish_and_clear();
    let updated = result?;

    if json {
        println!("{}", serde_json::to_string_pretty(&updated)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} Workflow definition replaced from {}",
        style("✓").green().bold(),
        style(file.display()).dim()
    );
    println!();

    Ok(())
}

pub async fn run(state: &AppState, payload: Option<serde_json::Value>, json: bool) -> Result<()> {
    let spinner = spinner("Calling webhook...");
    let outcome = state.workflow_service.run_now_single(payload).await;
    spinner.finish_and_clear();

    print_trigger_report(outcome?.into_report(), json)
}
