//! Configuration management CLI commands.

use clap::{Args, Subcommand};
use serde::Serialize;

use cerberus_cache::redis::mask_redis_url;
use cerberus_core::config::{AppConfig, CacheProviderKind};
use cerberus_core::error::AppError;

use crate::output::{self, FieldRow, OutputFormat};

/// Arguments for config commands
#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// Config subcommand
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Config subcommands
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Validate the configuration and print a summary (secret omitted)
    Check,
}

/// Redacted view of the effective configuration.
#[derive(Debug, Serialize)]
struct ConfigSummary {
    access_ttl_seconds: u64,
    refresh_ttl_seconds: u64,
    clock_skew_leeway_seconds: u64,
    store_timeout_ms: u64,
    compensation_timeout_ms: u64,
    serialize_per_user: bool,
    backend: String,
}

impl ConfigSummary {
    fn from_config(config: &AppConfig) -> Self {
        let backend = match config.cache.provider {
            CacheProviderKind::Memory => "memory".to_string(),
            CacheProviderKind::Redis => format!("redis ({})", mask_redis_url(&config.cache.redis.url)),
        };

        Self {
            access_ttl_seconds: config.auth.access_ttl().as_secs(),
            refresh_ttl_seconds: config.auth.refresh_ttl().as_secs(),
            clock_skew_leeway_seconds: config.auth.clock_skew_leeway_seconds,
            store_timeout_ms: config.session.store_timeout_ms,
            compensation_timeout_ms: config.session.compensation_timeout_ms,
            serialize_per_user: config.session.serialize_per_user,
            backend,
        }
    }

    fn rows(&self) -> Vec<FieldRow> {
        vec![
            FieldRow::new("access ttl (s)", self.access_ttl_seconds),
            FieldRow::new("refresh ttl (s)", self.refresh_ttl_seconds),
            FieldRow::new("clock skew leeway (s)", self.clock_skew_leeway_seconds),
            FieldRow::new("store timeout (ms)", self.store_timeout_ms),
            FieldRow::new("compensation timeout (ms)", self.compensation_timeout_ms),
            FieldRow::new("serialize per user", self.serialize_per_user),
            FieldRow::new("backend", &self.backend),
        ]
    }
}

/// Execute config commands
pub fn execute(
    args: &ConfigArgs,
    config_path: &str,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    match &args.command {
        ConfigCommand::Check => {
            if format == OutputFormat::Table {
                output::print_success(&format!("Configuration '{config_path}' is valid"));
            }
            let summary = ConfigSummary::from_config(config);
            output::print_record(&summary, summary.rows(), format);
        }
    }

    Ok(())
}
