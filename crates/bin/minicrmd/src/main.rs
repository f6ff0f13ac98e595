//! # minicrmd — minicrm automation daemon
//!
//! Composition root that wires all adapters together and starts the server.
//!
//! ## Responsibilities
//! - Load configuration (config file, env vars)
//! - Initialize the `SQLite` connection pool and run migrations
//! - Construct repository implementations (adapters)
//! - Load each configured tenant's rule store and start its automation engine
//! - Build the axum router and serve
//! - Stop the engines once the server has shut down (SIGTERM/SIGINT)
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no domain logic belongs here.

mod config;

use std::sync::Arc;

use anyhow::Context;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing_subscriber::EnvFilter;

use minicrm_adapter_http_axum::router;
use minicrm_adapter_http_axum::state::AppState;
use minicrm_adapter_storage_sqlite_sqlx::{
    SqliteAutomationRuleRepository, SqliteExecutionLogStore, SqliteTaskRepository,
};
use minicrm_adapter_webhook_reqwest::ReqwestWebhookClient;
use minicrm_app::action_dispatcher::ActionDispatcher;
use minicrm_app::automation_engine::AutomationEngine;
use minicrm_app::change_feed::InProcessChangeFeed;
use minicrm_app::rule_store::RuleStore;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("failed to load configuration")?;

    let filter = EnvFilter::try_new(&config.logging.filter)
        .with_context(|| format!("invalid log filter `{}`", config.logging.filter))?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // Database
    let db = minicrm_adapter_storage_sqlite_sqlx::Config {
        database_url: config.database_url().to_string(),
    }
    .build()
    .await
    .context("failed to open database")?;
    let pool = db.pool().clone();

    // Change feed and repositories
    let feed = Arc::new(InProcessChangeFeed::new());
    let rule_repo = Arc::new(SqliteAutomationRuleRepository::new(
        pool.clone(),
        Arc::clone(&feed),
    ));
    let webhooks = ReqwestWebhookClient::new(config.webhook_timeout())?;
    let dispatcher = Arc::new(ActionDispatcher::new(
        SqliteTaskRepository::new(pool.clone()),
        webhooks,
        SqliteExecutionLogStore::new(pool),
    ));

    // Automation engines, one per tenant
    let tenants = config.tenants();
    if tenants.is_empty() {
        tracing::warn!("no tenants configured, automations will not run");
    }
    let (stop_tx, stop_rx) = watch::channel(false);
    let mut engines = JoinSet::new();
    let mut stores = Vec::with_capacity(tenants.len());
    for tenant_id in tenants {
        let store = Arc::new(RuleStore::new(tenant_id, Arc::clone(&rule_repo)));
        store
            .load()
            .await
            .with_context(|| format!("failed to load rules of tenant {tenant_id}"))?;

        let engine = AutomationEngine::new(Arc::clone(&store), Arc::clone(&dispatcher));
        let mut stop = stop_rx.clone();
        engines.spawn(engine.run(Arc::clone(&feed), async move {
            // the only value ever sent is `true`; a dropped sender also stops
            let _ = stop.changed().await;
        }));
        stores.push(store);
    }

    // HTTP
    let state = AppState::new(stores, Arc::clone(&feed));
    let app = router::build(state);

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    tracing::info!("minicrmd listening on http://{bind_addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    // Engines
    let _ = stop_tx.send(true);
    while let Some(joined) = engines.join_next().await {
        if let Err(err) = joined {
            tracing::error!(error = %err, "automation engine aborted");
        }
    }
    tracing::info!("minicrmd stopped");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("received Ctrl+C, shutting down"),
        () = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}
