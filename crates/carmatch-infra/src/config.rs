//! Configuration loader for CarMatch.
//!
//! Reads `carmatch.toml` (if any) into [`CarmatchConfig`], then applies the
//! `N8N_*` environment variables used by the existing deployment. Falls back
//! to defaults when the file is missing or malformed; missing settings only
//! surface later, as configuration errors of the operations that need them.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use secrecy::SecretString;

use carmatch_types::config::CarmatchConfig;

/// Default config file name.
pub const CONFIG_FILE_NAME: &str = "carmatch.toml";

/// Resolve the config file path.
///
/// Priority:
/// 1. Explicit path (CLI `--config`)
/// 2. `CARMATCH_CONFIG` environment variable
/// 3. `carmatch.toml` in the current directory
pub fn resolve_config_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    if let Ok(path) = std::env::var("CARMATCH_CONFIG") {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }
    PathBuf::from(CONFIG_FILE_NAME)
}

/// Load the config file at `path`.
///
/// - Missing file: defaults.
/// - Unreadable or unparsable file: logs a warning, defaults.
pub async fn load_config_file(path: &Path) -> CarmatchConfig {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config file at {}, using defaults", path.display());
            return CarmatchConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", path.display());
            return CarmatchConfig::default();
        }
    };

    match toml::from_str::<CarmatchConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!("Failed to parse {}: {err}, using defaults", path.display());
            CarmatchConfig::default()
        }
    }
}

/// Load the config file and apply process environment overrides.
pub async fn load_carmatch_config(explicit: Option<&Path>) -> CarmatchConfig {
    let path = resolve_config_path(explicit);
    let mut config = load_config_file(&path).await;
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    config
}

/// Override file values with non-empty environment values.
///
/// `lookup` abstracts the environment so the mapping can be tested without
/// touching process state.
pub fn apply_env_overrides(config: &mut CarmatchConfig, lookup: impl Fn(&str) -> Option<String>) {
    let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
    let automation = &mut config.automation;

    if let Some(v) = get("N8N_API_URL") {
        automation.api_url = Some(v);
    }
    if let Some(v) = get("N8N_API_KEY") {
        automation.api_key = Some(SecretString::from(v));
    }
    if let Some(v) = get("N8N_BASE_URL") {
        automation.base_url = Some(v);
    }
    if let Some(v) = get("N8N_PROJECT_ID") {
        automation.project_id = Some(v);
    }
    if let Some(v) = get("N8N_WORKFLOW_ID") {
        automation.workflow_id = Some(v);
    }
    if let Some(v) = get("N8N_FLOW_IDS") {
        automation.flow_ids = parse_flow_ids(&v);
    }
    if let Some(v) = get("N8N_WEBHOOKS") {
        automation.webhooks = parse_webhook_map(&v);
    }
    if let Some(v) = get("N8N_WEBHOOK_URL") {
        automation.webhook_url = Some(v);
    }
    if let Some(v) = get("CARMATCH_ADMIN_TOKEN") {
        config.server.admin_token = Some(SecretString::from(v));
    }
}

/// Parse a comma-separated id list, dropping blanks.
pub fn parse_flow_ids(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse the webhook map.
///
/// Accepts a JSON object (`{"id": "url"}`) or `id=url` pairs separated by
/// commas. Anything else yields an empty map and a warning.
pub fn parse_webhook_map(raw: &str) -> HashMap<String, String> {
    let raw = raw.trim();

    if raw.starts_with('{') {
        return match serde_json::from_str::<HashMap<String, serde_json::Value>>(raw) {
            Ok(map) => map
                .into_iter()
                .filter_map(|(id, url)| match url {
                    serde_json::Value::String(url) if !url.trim().is_empty() => {
                        Some((id, url.trim().to_string()))
                    }
                    _ => None,
                })
                .collect(),
            Err(err) => {
                tracing::warn!("N8N_WEBHOOKS is not valid JSON: {err}; no webhooks configured");
                HashMap::new()
            }
        };
    }

    let mut map = HashMap::new();
    for pair in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        match pair.split_once('=') {
            Some((id, url)) if !id.trim().is_empty() && !url.trim().is_empty() => {
                map.insert(id.trim().to_string(), url.trim().to_string());
            }
            _ => {
                tracing::warn!("Ignoring malformed N8N_WEBHOOKS entry '{pair}'");
            }
        }
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[tokio::test]
    async fn load_config_missing_file_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config = load_config_file(&tmp.path().join(CONFIG_FILE_NAME)).await;
        assert!(config.automation.api_url.is_none());
        assert_eq!(config.automation.webhook_timeout_secs, 90);
    }

    #[tokio::test]
    async fn load_config_valid_toml_returns_parsed() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILE_NAME);
        tokio::fs::write(
            &path,
            r#"
[automation]
api_url = "http://localhost:5678/api/v1"
flow_ids = ["XeE1r9jt7Z6Sdghb"]

[automation.webhooks]
XeE1r9jt7Z6Sdghb = "http://localhost:5678/webhook/scrape/sync"
"#,
        )
        .await
        .unwrap();

        let config = load_config_file(&path).await;
        assert_eq!(
            config.automation.api_url.as_deref(),
            Some("http://localhost:5678/api/v1")
        );
        assert!(config.automation.has_webhook("XeE1r9jt7Z6Sdghb"));
    }

    #[tokio::test]
    async fn load_config_invalid_toml_returns_default() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILE_NAME);
        tokio::fs::write(&path, "this is not { valid toml !!!")
            .await
            .unwrap();

        let config = load_config_file(&path).await;
        assert!(config.automation.api_url.is_none());
        assert!(config.automation.flow_ids.is_empty());
    }

    #[test]
    fn env_overrides_replace_file_values() {
        let mut config = CarmatchConfig::default();
        config.automation.api_url = Some("http://from-file/api/v1".to_string());
        config.automation.base_url = Some("http://from-file".to_string());

        apply_env_overrides(
            &mut config,
            env(&[
                ("N8N_API_URL", "http://from-env/api/v1"),
                ("N8N_API_KEY", "jwt-token"),
                ("N8N_BASE_URL", ""),
                ("N8N_FLOW_IDS", "a, b,,c "),
                ("N8N_WEBHOOKS", r#"{"a": "http://hook/a"}"#),
                ("CARMATCH_ADMIN_TOKEN", "admin"),
            ]),
        );

        let automation = &config.automation;
        assert_eq!(automation.api_url.as_deref(), Some("http://from-env/api/v1"));
        assert_eq!(
            automation.api_key.as_ref().unwrap().expose_secret(),
            "jwt-token"
        );
        // Empty env values do not clobber the file.
        assert_eq!(automation.base_url.as_deref(), Some("http://from-file"));
        assert_eq!(automation.flow_ids, vec!["a", "b", "c"]);
        assert_eq!(automation.webhook_for("a"), Some("http://hook/a"));
        assert!(config.server.admin_token.is_some());
    }

    #[test]
    fn webhook_map_accepts_pairs() {
        let map = parse_webhook_map("a=http://hook/a?token=x, b = http://hook/b");
        assert_eq!(map.get("a").map(String::as_str), Some("http://hook/a?token=x"));
        assert_eq!(map.get("b").map(String::as_str), Some("http://hook/b"));
    }

    #[test]
    fn webhook_map_invalid_json_is_empty() {
        assert!(parse_webhook_map("{not json").is_empty());
    }

    #[test]
    fn webhook_map_skips_non_string_urls() {
        let map = parse_webhook_map(r#"{"a": "http://hook/a", "b": 3, "c": ""}"#);
        assert_eq!(map.len(), 1);
        assert!(map.contains_key("a"));
    }

    #[test]
    fn explicit_config_path_wins() {
        let path = resolve_config_path(Some(Path::new("/etc/carmatch/carmatch.toml")));
        assert_eq!(path, PathBuf::from("/etc/carmatch/carmatch.toml"));
    }
}
