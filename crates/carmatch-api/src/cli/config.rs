//! `carmatch config`: print the effective configuration.
//!
//! Secrets (API key, admin token) and webhook URLs, which often embed tokens,
//! are never printed.

use anyhow::Result;
use console::style;
use serde_json::json;

use carmatch_types::config::AutomationConfig;

use crate::state::AppState;

pub fn show_config(state: &AppState, json: bool) -> Result<()> {
    let view = effective_config(&state.automation_config, state.admin_token_hash.is_some());

    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    let config = &state.automation_config;
    let unset = || style("(unset)").dim().to_string();
    let opt = |value: &Option<String>| value.clone().unwrap_or_else(unset);

    println!();
    println!("  {}", style("Automation").bold().underlined());
    println!("  {}     {}", style("API URL:").bold(), opt(&config.api_url));
    println!(
        "  {}     {}",
        style("API key:").bold(),
        if config.api_key.is_some() { "****".to_string() } else { unset() }
    );
    println!("  {}    {}", style("Base URL:").bold(), opt(&config.base_url));
    println!("  {}  {}", style("Project ID:").bold(), opt(&config.project_id));
    println!("  {} {}", style("Workflow ID:").bold(), opt(&config.workflow_id));
    println!(
        "  {}       {}",
        style("Flows:").bold(),
        if config.flow_ids.is_empty() { unset() } else { config.flow_ids.join(", ") }
    );
    println!(
        "  {}    {}",
        style("Webhooks:").bold(),
        webhook_ids(config).join(", ")
    );
    println!(
        "  {}    {}s api, {}s replace, {}s webhook",
        style("Timeouts:").bold(),
        config.api_timeout_secs,
        config.replace_timeout_secs,
        config.webhook_timeout_secs
    );
    println!();
    println!("  {}", style("Server").bold().underlined());
    println!(
        "  {} {}",
        style("Admin token:").bold(),
        if state.admin_token_hash.is_some() {
            style("set").green().to_string()
        } else {
            style("unset (API open)").yellow().to_string()
        }
    );
    println!();

    Ok(())
}

/// Masked, serializable view of the configuration.
fn effective_config(config: &AutomationConfig, admin_token_set: bool) -> serde_json::Value {
    json!({
        "automation": {
            "api_url": config.api_url,
            "api_key_set": config.api_key.is_some(),
            "base_url": config.base_url,
            "project_id": config.project_id,
            "workflow_id": config.workflow_id,
            "flow_ids": config.flow_ids,
            "webhook_ids": webhook_ids(config),
            "webhook_url_set": config.webhook_url.is_some(),
            "api_timeout_secs": config.api_timeout_secs,
            "replace_timeout_secs": config.replace_timeout_secs,
            "webhook_timeout_secs": config.webhook_timeout_secs,
        },
        "server": {
            "admin_token_set": admin_token_set,
        }
    })
}

fn webhook_ids(config: &AutomationConfig) -> Vec<&str> {
    let mut ids: Vec<&str> = config.webhooks.keys().map(String::as_str).collect();
    ids.sort_unstable();
    ids
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    #[test]
    fn effective_config_masks_secrets() {
        let mut config = AutomationConfig::default();
        config.api_url = Some("http://n8n.local/api/v1".into());
        config.api_key = Some(SecretString::from("jwt-secret"));
        config
            .webhooks
            .insert("b".into(), "http://n8n.local/webhook/b?token=t".into());
        config
            .webhooks
            .insert("a".into(), "http://n8n.local/webhook/a".into());

        let view = effective_config(&config, true);
        let rendered = view.to_string();

        assert!(!rendered.contains("jwt-secret"));
        assert!(!rendered.contains("token=t"));
        assert_eq!(view["automation"]["api_key_set"], true);
        assert_eq!(view["automation"]["webhook_ids"], json!(["a", "b"]));
        assert_eq!(view["server"]["admin_token_set"], true);
    }
}
