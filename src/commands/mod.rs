//! CLI command definitions and dispatch.

pub mod config;
pub mod health;
pub mod session;

use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};

use cerberus_auth::SessionService;
use cerberus_cache::CacheManager;
use cerberus_core::config::AppConfig;
use cerberus_core::error::AppError;
use cerberus_core::types::Deadline;

use crate::output::OutputFormat;

/// Cerberus: session and token authority
#[derive(Debug, Parser)]
#[command(name = "cerberus", version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: String,

    /// Environment overlay loaded from config/{env}.toml
    #[arg(short, long, env = "CERBERUS_ENV")]
    pub env: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Per-command backend deadline in milliseconds (defaults to session.store_timeout_ms)
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Configuration management
    Config(config::ConfigArgs),
    /// Check that the backend answers
    Health,
    /// Session lifecycle operations
    Session(session::SessionArgs),
}

impl Cli {
    /// Load and validate the layered configuration.
    pub fn load_config(&self) -> Result<AppConfig, AppError> {
        AppConfig::load(&self.config, self.env.as_deref())
    }

    /// Execute the CLI command
    pub async fn execute(&self, config: AppConfig) -> Result<(), AppError> {
        match &self.command {
            Commands::Config(args) => config::execute(args, &self.config, &config, self.format),
            Commands::Health => {
                let ctx = CommandContext::build(&config, self.timeout_ms).await?;
                health::execute(&ctx, self.format).await
            }
            Commands::Session(args) => {
                let ctx = CommandContext::build(&config, self.timeout_ms).await?;
                session::execute(args, &ctx, self.format).await
            }
        }
    }
}

/// Everything a backend-facing command needs.
pub struct CommandContext {
    pub service: SessionService,
    timeout: Duration,
}

impl CommandContext {
    /// Connects the configured backend and builds the session service.
    pub async fn build(config: &AppConfig, timeout_ms: Option<u64>) -> Result<Self, AppError> {
        let cache = CacheManager::new(&config.cache).await?;
        let service =
            SessionService::from_config(&config.auth, &config.session, Arc::new(cache))?;
        let timeout = timeout_ms
            .map(Duration::from_millis)
            .unwrap_or_else(|| config.session.store_timeout());

        Ok(Self { service, timeout })
    }

    /// A fresh deadline for one operation.
    pub fn deadline(&self) -> Deadline {
        Deadline::after(self.timeout)
    }
}
