use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tracing::info;

use acl_hangman::config;
use acl_hangman::db;
use acl_hangman::event::ChangeBatch;
use acl_hangman::gateway::SqliteAclGateway;
use acl_hangman::metrics::ReconcileMetrics;
use acl_hangman::store::SqliteDenialStore;
use acl_hangman::Reconciler;

const DEFAULT_TABLE_NAME: &str = "denied_applicants";

/// Reads one change batch (JSON) from stdin and applies it.
#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("acl_hangman=info".parse()?)
        )
        .with_writer(std::io::stderr)
        .init();

    info!("Starting acl-hangman v{}", env!("CARGO_PKG_VERSION"));

    let cfg = config::load()?;
    info!("Configuration loaded");

    let mut input = String::new();
    tokio::io::stdin()
        .read_to_string(&mut input)
        .await
        .context("Failed to read change batch from stdin")?;
    let batch = ChangeBatch::from_json(&input)?;

    let table_name = match &cfg.reconcile.table_name {
        Some(name) => name.clone(),
        None => batch
            .source_table()?
            .unwrap_or_else(|| DEFAULT_TABLE_NAME.to_string()),
    };

    let db_pool = db::init(&cfg).await?;
    let gateway = Arc::new(SqliteAclGateway::new(
        db_pool.clone(),
        cfg.gateway.egress,
        cfg.gateway.max_entries_per_acl,
    ));
    let store = Arc::new(SqliteDenialStore::new(db_pool.clone(), table_name));
    info!("Reconciling {} records from table {}", batch.records.len(), store.namespace());
    let metrics = Arc::new(ReconcileMetrics::default());

    let reconciler = Reconciler::from_config(&cfg, gateway, store, metrics.clone());
    let result = reconciler.handle_batch(&batch).await;

    info!("Batch finished\n{}", metrics.to_prometheus_text());
    db_pool.close().await;

    let status = result?;
    println!("{}", status);
    Ok(())
}
