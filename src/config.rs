use anyhow::Result;
use serde::Deserialize;

/// Highest rule number a network ACL accepts (32767 is the implicit catch-all).
pub const RULE_NUMBER_UPPER_LIMIT: i64 = 32766;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub allocator: AllocatorConfig,
    pub reconcile: ReconcileConfig,
    pub database: DatabaseConfig,
    pub gateway: GatewayConfig,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct AllocatorConfig {
    /// First rule number probed when looking for a free slot.
    #[serde(default = "default_begin_rule_number")]
    pub begin_rule_number: i64,
    #[serde(default = "default_rule_number_ceiling")]
    pub rule_number_ceiling: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReconcileConfig {
    /// Keep going past a failing change record instead of aborting the batch.
    #[serde(default)]
    pub ignore_error: bool,
    /// Store namespace. When unset it is taken from the event source ARN.
    #[serde(default)]
    pub table_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_max_entries_per_acl")]
    pub max_entries_per_acl: usize,
    /// Direction of the managed rules; inbound by default.
    #[serde(default)]
    pub egress: bool,
}

fn default_begin_rule_number() -> i64 { 100 }
fn default_rule_number_ceiling() -> i64 { RULE_NUMBER_UPPER_LIMIT }
fn default_db_path() -> String { "./acl-hangman.db".to_string() }
fn default_max_entries_per_acl() -> usize { 20 }

impl Default for AllocatorConfig {
    fn default() -> Self {
        Self {
            begin_rule_number: default_begin_rule_number(),
            rule_number_ceiling: default_rule_number_ceiling(),
        }
    }
}

pub fn validate(cfg: &Config) -> Result<()> {
    let alloc = &cfg.allocator;
    if alloc.begin_rule_number < 1 {
        anyhow::bail!(
            "CONFIG ERROR: begin_rule_number must be at least 1 (current: {})",
            alloc.begin_rule_number
        );
    }
    if alloc.rule_number_ceiling > RULE_NUMBER_UPPER_LIMIT {
        anyhow::bail!(
            "CONFIG ERROR: rule_number_ceiling must not exceed {} (current: {})",
            RULE_NUMBER_UPPER_LIMIT,
            alloc.rule_number_ceiling
        );
    }
    if alloc.begin_rule_number > alloc.rule_number_ceiling {
        anyhow::bail!(
            "CONFIG ERROR: begin_rule_number ({}) is above rule_number_ceiling ({})",
            alloc.begin_rule_number,
            alloc.rule_number_ceiling
        );
    }
    if cfg.gateway.max_entries_per_acl == 0 {
        anyhow::bail!("CONFIG ERROR: max_entries_per_acl must be at least 1");
    }
    if let Some(table) = &cfg.reconcile.table_name {
        if table.trim().is_empty() {
            anyhow::bail!("CONFIG ERROR: table_name is set but empty");
        }
    }

    tracing::info!("Configuration validation passed");
    Ok(())
}

/// Load from an optional `config` file, then `HANGMAN__*` environment variables
/// (e.g. `HANGMAN__ALLOCATOR__BEGIN_RULE_NUMBER=200`).
pub fn load() -> Result<Config> {
    let cfg = config::Config::builder()
        .add_source(config::File::with_name("config").required(false))
        .add_source(config::Environment::with_prefix("HANGMAN").separator("__"))
        .set_default("allocator.begin_rule_number", default_begin_rule_number())?
        .set_default("allocator.rule_number_ceiling", default_rule_number_ceiling())?
        .set_default("reconcile.ignore_error", false)?
        .set_default("database.path", default_db_path())?
        .set_default("gateway.max_entries_per_acl", default_max_entries_per_acl() as i64)?
        .set_default("gateway.egress", false)?
        .build()?
        .try_deserialize()?;

    validate(&cfg)?;

    Ok(cfg)
}
