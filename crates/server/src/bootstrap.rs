use std::sync::Arc;

use axum::Router;
use cutquote_agent::{
    DialogueEngine, InactivitySupervisor, MessageSender, OrderLedger, RetryPolicy,
    RetryingSender, SessionStore,
};
use cutquote_core::audit::AuditSink;
use cutquote_core::config::{AppConfig, ConfigError, FormulaConfig, LoadOptions};
use cutquote_core::cpq::{FormulaError, FormulaRegistry};
use cutquote_db::repositories::{
    SqlCatalogRepository, SqlCustomerRepository, SqlMaterialRepository, SqlOrderRepository,
};
use cutquote_db::{connect_with_settings, migrations, DbPool};
use thiserror::Error;
use tracing::info;

use crate::channel::HttpMessageSender;
use crate::transcript::TracingAuditSink;
use crate::webhook::WebhookState;
use crate::{health, webhook};

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub engine: Arc<DialogueEngine>,
    pub supervisor: Arc<InactivitySupervisor>,
    pub sender: Arc<dyn MessageSender>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("could not read formula file `{path}`: {source}")]
    FormulaFile { path: String, source: std::io::Error },
    #[error("formula registry is invalid: {0}")]
    Formulas(#[from] FormulaError),
    #[error("http client could not be built: {0}")]
    HttpClient(#[source] reqwest::Error),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let db_pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(BootstrapError::DatabaseConnect)?;
    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.database_ready",
        correlation_id = "bootstrap",
        "database connected and migrations applied"
    );

    let formulas = load_formulas(&config.formulas).await?;
    info!(
        event_name = "system.bootstrap.formulas_loaded",
        correlation_id = "bootstrap",
        formula_count = formulas.len(),
        custom = config.formulas.path.is_some(),
        "formula registry loaded"
    );

    let http =
        HttpMessageSender::from_config(&config.channel).map_err(BootstrapError::HttpClient)?;
    info!(
        event_name = "system.bootstrap.channel_configured",
        correlation_id = "bootstrap",
        endpoint = http.endpoint(),
        max_retries = config.channel.max_retries,
        "outbound channel configured"
    );
    let policy = RetryPolicy {
        max_retries: config.channel.max_retries,
        base_delay_ms: config.channel.retry_base_delay_ms,
        ..RetryPolicy::default()
    };
    let sender: Arc<dyn MessageSender> = Arc::new(RetryingSender::new(http, policy));

    let audit: Arc<dyn AuditSink> = Arc::new(TracingAuditSink);
    let sessions = Arc::new(SessionStore::new());
    let ledger = Arc::new(OrderLedger::new(Arc::new(SqlOrderRepository::new(db_pool.clone()))));
    let engine = Arc::new(DialogueEngine::new(
        sessions.clone(),
        Arc::new(SqlCustomerRepository::new(db_pool.clone())),
        Arc::new(SqlCatalogRepository::new(db_pool.clone())),
        Arc::new(SqlMaterialRepository::new(db_pool.clone())),
        Arc::new(formulas),
        ledger,
        audit.clone(),
    ));
    let supervisor =
        Arc::new(InactivitySupervisor::new(sessions, sender.clone(), audit, config.inactivity));

    Ok(Application { config, db_pool, engine, supervisor, sender })
}

/// The configured formula file when one is set, the builtin registry otherwise.
pub async fn load_formulas(config: &FormulaConfig) -> Result<FormulaRegistry, BootstrapError> {
    let Some(path) = &config.path else {
        return Ok(FormulaRegistry::builtin());
    };
    let raw = tokio::fs::read_to_string(path).await.map_err(|source| {
        BootstrapError::FormulaFile { path: path.display().to_string(), source }
    })?;
    Ok(FormulaRegistry::from_toml_str(&raw)?)
}

pub fn router(app: &Application) -> Router {
    let webhook_state = WebhookState { engine: app.engine.clone(), sender: app.sender.clone() };
    health::router(app.db_pool.clone()).merge(webhook::router(webhook_state))
}
