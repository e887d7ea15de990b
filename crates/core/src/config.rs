use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub channel: ChannelConfig,
    pub inactivity: InactivityConfig,
    pub server: ServerConfig,
    pub formulas: FormulaConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

/// Messaging gateway used for outbound replies.
#[derive(Clone, Debug)]
pub struct ChannelConfig {
    pub base_url: String,
    pub api_token: Option<SecretString>,
    pub max_retries: u32,
    pub retry_base_delay_ms: u64,
    pub timeout_secs: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InactivityConfig {
    pub warning_secs: u64,
    pub final_secs: u64,
    pub poll_interval_secs: u64,
}

impl InactivityConfig {
    pub fn warning_after(&self) -> Duration {
        Duration::from_secs(self.warning_secs)
    }

    pub fn final_after(&self) -> Duration {
        Duration::from_secs(self.final_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub graceful_shutdown_secs: u64,
}

#[derive(Clone, Debug, Default)]
pub struct FormulaConfig {
    /// TOML file replacing the builtin formula registry.
    pub path: Option<PathBuf>,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub log_level: Option<String>,
    pub channel_base_url: Option<String>,
    pub server_port: Option<u16>,
    pub formulas_path: Option<PathBuf>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://cutquote.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            channel: ChannelConfig {
                base_url: "http://localhost:3000".to_string(),
                api_token: None,
                max_retries: 3,
                retry_base_delay_ms: 250,
                timeout_secs: 10,
            },
            inactivity: InactivityConfig {
                warning_secs: 60,
                final_secs: 60,
                poll_interval_secs: 5,
            },
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 5000,
                graceful_shutdown_secs: 15,
            },
            formulas: FormulaConfig::default(),
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("cutquote.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(database) = patch.database {
            if let Some(url) = database.url {
                self.database.url = url;
            }
            if let Some(max_connections) = database.max_connections {
                self.database.max_connections = max_connections;
            }
            if let Some(timeout_secs) = database.timeout_secs {
                self.database.timeout_secs = timeout_secs;
            }
        }

        if let Some(channel) = patch.channel {
            if let Some(base_url) = channel.base_url {
                self.channel.base_url = base_url;
            }
            if let Some(api_token) = channel.api_token {
                self.channel.api_token = Some(secret_value(api_token));
            }
            if let Some(max_retries) = channel.max_retries {
                self.channel.max_retries = max_retries;
            }
            if let Some(retry_base_delay_ms) = channel.retry_base_delay_ms {
                self.channel.retry_base_delay_ms = retry_base_delay_ms;
            }
            if let Some(timeout_secs) = channel.timeout_secs {
                self.channel.timeout_secs = timeout_secs;
            }
        }

        if let Some(inactivity) = patch.inactivity {
            if let Some(warning_secs) = inactivity.warning_secs {
                self.inactivity.warning_secs = warning_secs;
            }
            if let Some(final_secs) = inactivity.final_secs {
                self.inactivity.final_secs = final_secs;
            }
            if let Some(poll_interval_secs) = inactivity.poll_interval_secs {
                self.inactivity.poll_interval_secs = poll_interval_secs;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
        }

        if let Some(formulas) = patch.formulas {
            if let Some(path) = formulas.path {
                self.formulas.path = Some(path);
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("CUTQUOTE_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("CUTQUOTE_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections =
                parse_u32("CUTQUOTE_DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("CUTQUOTE_DATABASE_TIMEOUT_SECS") {
            self.database.timeout_secs = parse_u64("CUTQUOTE_DATABASE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("CUTQUOTE_CHANNEL_BASE_URL") {
            self.channel.base_url = value;
        }
        if let Some(value) = read_env("CUTQUOTE_CHANNEL_API_TOKEN") {
            self.channel.api_token = Some(secret_value(value));
        }
        if let Some(value) = read_env("CUTQUOTE_CHANNEL_MAX_RETRIES") {
            self.channel.max_retries = parse_u32("CUTQUOTE_CHANNEL_MAX_RETRIES", &value)?;
        }
        if let Some(value) = read_env("CUTQUOTE_CHANNEL_RETRY_BASE_DELAY_MS") {
            self.channel.retry_base_delay_ms =
                parse_u64("CUTQUOTE_CHANNEL_RETRY_BASE_DELAY_MS", &value)?;
        }
        if let Some(value) = read_env("CUTQUOTE_CHANNEL_TIMEOUT_SECS") {
            self.channel.timeout_secs = parse_u64("CUTQUOTE_CHANNEL_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("CUTQUOTE_INACTIVITY_WARNING_SECS") {
            self.inactivity.warning_secs = parse_u64("CUTQUOTE_INACTIVITY_WARNING_SECS", &value)?;
        }
        if let Some(value) = read_env("CUTQUOTE_INACTIVITY_FINAL_SECS") {
            self.inactivity.final_secs = parse_u64("CUTQUOTE_INACTIVITY_FINAL_SECS", &value)?;
        }
        if let Some(value) = read_env("CUTQUOTE_INACTIVITY_POLL_INTERVAL_SECS") {
            self.inactivity.poll_interval_secs =
                parse_u64("CUTQUOTE_INACTIVITY_POLL_INTERVAL_SECS", &value)?;
        }

        if let Some(value) = read_env("CUTQUOTE_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("CUTQUOTE_SERVER_PORT") {
            self.server.port = parse_u16("CUTQUOTE_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("CUTQUOTE_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_u64("CUTQUOTE_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }

        if let Some(value) = read_env("CUTQUOTE_FORMULAS_PATH") {
            self.formulas.path = Some(PathBuf::from(value));
        }

        let log_level =
            read_env("CUTQUOTE_LOGGING_LEVEL").or_else(|| read_env("CUTQUOTE_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("CUTQUOTE_LOGGING_FORMAT").or_else(|| read_env("CUTQUOTE_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(database_url) = overrides.database_url {
            self.database.url = database_url;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(channel_base_url) = overrides.channel_base_url {
            self.channel.base_url = channel_base_url;
        }
        if let Some(server_port) = overrides.server_port {
            self.server.port = server_port;
        }
        if let Some(formulas_path) = overrides.formulas_path {
            self.formulas.path = Some(formulas_path);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_database(&self.database)?;
        validate_channel(&self.channel)?;
        validate_inactivity(&self.inactivity)?;
        validate_server(&self.server)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("cutquote.toml"), PathBuf::from("config/cutquote.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_database(database: &DatabaseConfig) -> Result<(), ConfigError> {
    let url = database.url.trim();
    let sqlite_url =
        url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
    if !sqlite_url {
        return Err(ConfigError::Validation(
            "database.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                .to_string(),
        ));
    }

    if database.max_connections == 0 {
        return Err(ConfigError::Validation(
            "database.max_connections must be greater than zero".to_string(),
        ));
    }

    if database.timeout_secs == 0 || database.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "database.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_channel(channel: &ChannelConfig) -> Result<(), ConfigError> {
    let base_url = channel.base_url.trim();
    if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
        return Err(ConfigError::Validation(
            "channel.base_url must start with http:// or https://".to_string(),
        ));
    }

    if channel.timeout_secs == 0 || channel.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "channel.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    if channel.retry_base_delay_ms == 0 {
        return Err(ConfigError::Validation(
            "channel.retry_base_delay_ms must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_inactivity(inactivity: &InactivityConfig) -> Result<(), ConfigError> {
    let fields = [
        ("inactivity.warning_secs", inactivity.warning_secs),
        ("inactivity.final_secs", inactivity.final_secs),
        ("inactivity.poll_interval_secs", inactivity.poll_interval_secs),
    ];
    if let Some((name, _)) = fields.iter().find(|(_, value)| *value == 0) {
        return Err(ConfigError::Validation(format!("{name} must be greater than zero")));
    }

    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    channel: Option<ChannelPatch>,
    inactivity: Option<InactivityPatch>,
    server: Option<ServerPatch>,
    formulas: Option<FormulaPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ChannelPatch {
    base_url: Option<String>,
    api_token: Option<String>,
    max_retries: Option<u32>,
    retry_base_delay_ms: Option<u64>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct InactivityPatch {
    warning_secs: Option<u64>,
    final_secs: Option<u64>,
    poll_interval_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct FormulaPatch {
    path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::io;
    use std::sync::{Mutex, OnceLock};

    use secrecy::ExposeSecret;
    use tempfile::TempDir;

    use super::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars(vars: &[&str]) {
        for var in vars {
            env::remove_var(var);
        }
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    #[test]
    fn defaults_match_the_production_timeouts() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let config = AppConfig::load(LoadOptions::default())
            .map_err(|err| format!("config load failed: {err}"))?;

        ensure(config.inactivity.warning_secs == 60, "warning threshold defaults to 60s")?;
        ensure(config.inactivity.final_secs == 60, "final threshold defaults to 60s")?;
        ensure(config.inactivity.poll_interval_secs == 5, "supervisor polls every 5s")?;
        ensure(config.server.port == 5000, "webhook listens on 5000 by default")?;
        ensure(config.formulas.path.is_none(), "builtin formulas are used by default")
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("TEST_CHANNEL_TOKEN", "gateway-token-from-env");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("cutquote.toml");
            fs::write(
                &path,
                r#"
[channel]
base_url = "https://gateway.example.test"
api_token = "${TEST_CHANNEL_TOKEN}"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.channel.api_token.as_ref().map(|token| token.expose_secret())
                    == Some("gateway-token-from-env"),
                "api token should be loaded from environment",
            )?;
            ensure(
                config.channel.base_url == "https://gateway.example.test",
                "base url should come from the file",
            )
        })();

        clear_vars(&["TEST_CHANNEL_TOKEN"]);
        result
    }

    #[test]
    fn missing_interpolation_variable_is_reported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
        let path = dir.path().join("cutquote.toml");
        fs::write(&path, "[channel]\napi_token = \"${CUTQUOTE_TEST_UNSET_TOKEN}\"\n")
            .map_err(|err| err.to_string())?;

        match AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() }) {
            Err(ConfigError::MissingEnvInterpolation { var }) => {
                ensure(var == "CUTQUOTE_TEST_UNSET_TOKEN", "error should name the variable")
            }
            other => Err(format!("expected interpolation failure, got {other:?}")),
        }
    }

    #[test]
    fn logging_env_aliases_are_supported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("CUTQUOTE_LOG_LEVEL", "warn");
        env::set_var("CUTQUOTE_LOG_FORMAT", "pretty");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.logging.level == "warn", "warning log level should be set from env var")?;
            ensure(
                matches!(config.logging.format, LogFormat::Pretty),
                "pretty logging format should be set from env var",
            )?;
            Ok(())
        })();

        clear_vars(&["CUTQUOTE_LOG_LEVEL", "CUTQUOTE_LOG_FORMAT"]);
        result
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("CUTQUOTE_DATABASE_URL", "sqlite://from-env.db");
        env::set_var("CUTQUOTE_INACTIVITY_WARNING_SECS", "45");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("cutquote.toml");
            fs::write(
                &path,
                r#"
[database]
url = "sqlite://from-file.db"

[inactivity]
warning_secs = 30
final_secs = 90

[logging]
level = "warn"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    database_url: Some("sqlite://from-override.db".to_string()),
                    log_level: Some("debug".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.database.url == "sqlite://from-override.db",
                "override database url should win",
            )?;
            ensure(config.logging.level == "debug", "overridden log level should be debug")?;
            ensure(config.inactivity.warning_secs == 45, "env warning threshold should win")?;
            ensure(config.inactivity.final_secs == 90, "file final threshold should apply")?;
            Ok(())
        })();

        clear_vars(&["CUTQUOTE_DATABASE_URL", "CUTQUOTE_INACTIVITY_WARNING_SECS"]);
        result
    }

    #[test]
    fn invalid_numeric_env_override_is_rejected() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("CUTQUOTE_INACTIVITY_FINAL_SECS", "soon");

        let result = match AppConfig::load(LoadOptions::default()) {
            Err(ConfigError::InvalidEnvOverride { key, .. }) => {
                ensure(key == "CUTQUOTE_INACTIVITY_FINAL_SECS", "error should name the key")
            }
            other => Err(format!("expected invalid override, got {other:?}")),
        };

        clear_vars(&["CUTQUOTE_INACTIVITY_FINAL_SECS"]);
        result
    }

    #[test]
    fn validation_fails_fast_with_actionable_error() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("CUTQUOTE_CHANNEL_BASE_URL", "gateway.local:3000");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => {
                    return Err("expected validation failure but config load succeeded".to_string())
                }
                Err(error) => error,
            };
            let has_message = matches!(
                error,
                ConfigError::Validation(ref message) if message.contains("channel.base_url")
            );
            ensure(has_message, "validation failure should mention channel.base_url")
        })();

        clear_vars(&["CUTQUOTE_CHANNEL_BASE_URL"]);
        result
    }

    #[test]
    fn zero_inactivity_threshold_is_rejected() -> Result<(), String> {
        let mut config = AppConfig::default();
        config.inactivity.poll_interval_secs = 0;

        match config.validate() {
            Err(ConfigError::Validation(message)) => ensure(
                message.contains("inactivity.poll_interval_secs"),
                "validation failure should name the field",
            ),
            other => Err(format!("expected validation failure, got {other:?}")),
        }
    }

    #[test]
    fn secret_values_are_not_leaked_by_debug() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("CUTQUOTE_CHANNEL_API_TOKEN", "gateway-secret-value");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;
            let debug = format!("{config:?}");

            ensure(
                !debug.contains("gateway-secret-value"),
                "debug output should not contain the channel token",
            )?;
            ensure(
                matches!(config.logging.format, LogFormat::Compact),
                "default logging format should be compact",
            )?;
            Ok(())
        })();

        clear_vars(&["CUTQUOTE_CHANNEL_API_TOKEN"]);
        result
    }

    #[test]
    fn required_file_must_exist() -> Result<(), String> {
        let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
        let path = dir.path().join("absent.toml");

        match AppConfig::load(LoadOptions {
            config_path: Some(path.clone()),
            require_file: true,
            ..LoadOptions::default()
        }) {
            Err(ConfigError::MissingConfigFile(missing)) => {
                ensure(missing == path, "error should carry the requested path")
            }
            other => Err(format!("expected missing file error, got {other:?}")),
        }
    }
}
