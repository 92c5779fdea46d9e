//! CLI command definitions and dispatch.

pub mod invitation;
pub mod migrate;
pub mod password;
pub mod token;

use clap::{Parser, Subcommand, ValueEnum};

use tollgate_core::config::AppConfig;
use tollgate_core::error::AppError;
use tollgate_database::DatabasePool;

/// Tollgate: credential and token administration
#[derive(Debug, Parser)]
#[command(name = "tollgate", version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/tollgate.toml")]
    pub config: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Apply pending database migrations
    Migrate,
    /// Print the stored digest of a password
    HashPassword(password::HashPasswordArgs),
    /// Verify an access token and print its claims
    InspectToken(token::InspectTokenArgs),
    /// Delete invitations past their removal date
    PurgeInvitations(invitation::PurgeArgs),
}

/// How command results are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// JSON document
    Json,
}

impl Cli {
    /// Execute the selected command
    pub async fn execute(&self, config: &AppConfig) -> Result<(), AppError> {
        match &self.command {
            Commands::Migrate => migrate::execute(config).await,
            Commands::HashPassword(args) => password::execute(args, config, self.format),
            Commands::InspectToken(args) => token::execute(args, config, self.format),
            Commands::PurgeInvitations(args) => {
                invitation::execute(args, config, self.format).await
            }
        }
    }
}

/// Helper: open the configured database
pub async fn connect(config: &AppConfig) -> Result<DatabasePool, AppError> {
    DatabasePool::connect(&config.database).await
}
