use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use cutquote_core::config::{AppConfig, LoadOptions};
use secrecy::ExposeSecret;
use serde::Serialize;
use toml::Value;

use crate::commands::CommandResult;

#[derive(Debug, Serialize)]
struct ConfigField {
    key: &'static str,
    value: String,
    source: String,
}

pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "config",
                "config_validation",
                format!("config validation failed: {error}"),
                2,
            )
        }
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let fields: Vec<ConfigField> = effective_values(&config)
        .into_iter()
        .map(|(key, value)| ConfigField {
            key,
            value,
            source: field_source(key, config_file_doc.as_ref(), config_file_path.as_deref()),
        })
        .collect();

    let message = "effective config (source precedence: env > file > default)";
    match serde_json::to_value(&fields) {
        Ok(data) => CommandResult::success_with_data("config", message, Some(data)),
        Err(error) => CommandResult::failure("config", "serialization", error.to_string(), 7),
    }
}

fn effective_values(config: &AppConfig) -> Vec<(&'static str, String)> {
    let api_token = config
        .channel
        .api_token
        .as_ref()
        .map(|token| redact_token(token.expose_secret()))
        .unwrap_or_else(|| "<unset>".to_string());
    let formulas_path = config
        .formulas
        .path
        .as_ref()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "<builtin>".to_string());

    vec![
        ("database.url", config.database.url.clone()),
        ("database.max_connections", config.database.max_connections.to_string()),
        ("database.timeout_secs", config.database.timeout_secs.to_string()),
        ("channel.base_url", config.channel.base_url.clone()),
        ("channel.api_token", api_token),
        ("channel.max_retries", config.channel.max_retries.to_string()),
        ("channel.retry_base_delay_ms", config.channel.retry_base_delay_ms.to_string()),
        ("channel.timeout_secs", config.channel.timeout_secs.to_string()),
        ("inactivity.warning_secs", config.inactivity.warning_secs.to_string()),
        ("inactivity.final_secs", config.inactivity.final_secs.to_string()),
        ("inactivity.poll_interval_secs", config.inactivity.poll_interval_secs.to_string()),
        ("server.bind_address", config.server.bind_address.clone()),
        ("server.port", config.server.port.to_string()),
        ("server.graceful_shutdown_secs", config.server.graceful_shutdown_secs.to_string()),
        ("formulas.path", formulas_path),
        ("logging.level", config.logging.level.clone()),
        ("logging.format", format!("{:?}", config.logging.format).to_ascii_lowercase()),
    ]
}

fn detect_config_path() -> Option<PathBuf> {
    [PathBuf::from("cutquote.toml"), PathBuf::from("config/cutquote.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let raw = fs::read_to_string(path?).ok()?;
    raw.parse::<Value>().ok()
}

/// `database.url` reads `CUTQUOTE_DATABASE_URL`; logging also honours the short
/// `CUTQUOTE_LOG_*` aliases.
fn env_keys(key_path: &str) -> Vec<String> {
    let primary = format!("CUTQUOTE_{}", key_path.replace('.', "_").to_ascii_uppercase());
    match key_path {
        "logging.level" => vec![primary, "CUTQUOTE_LOG_LEVEL".to_string()],
        "logging.format" => vec![primary, "CUTQUOTE_LOG_FORMAT".to_string()],
        _ => vec![primary],
    }
}

fn field_source(
    key_path: &str,
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys(key_path).into_iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn redact_token(token: &str) -> String {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }
    let visible: String = trimmed.chars().take(4).collect();
    format!("{visible}***")
}
