//! Password digest command.

use clap::Args;

use tollgate_auth::CredentialHasher;
use tollgate_core::config::{AppConfig, PasswordAlgorithm};
use tollgate_core::error::AppError;

use super::OutputFormat;

/// Arguments for `hash-password`
#[derive(Debug, Args)]
pub struct HashPasswordArgs {
    /// Plaintext password
    pub password: String,

    /// Override the configured algorithm
    #[arg(long, value_parser = parse_algorithm)]
    pub algorithm: Option<PasswordAlgorithm>,
}

fn parse_algorithm(s: &str) -> Result<PasswordAlgorithm, String> {
    match s.to_lowercase().as_str() {
        "sha256" => Ok(PasswordAlgorithm::Sha256),
        "argon2" => Ok(PasswordAlgorithm::Argon2),
        other => Err(format!("unknown algorithm '{other}' (expected sha256 or argon2)")),
    }
}

/// Hash the password and print the digest.
pub fn execute(
    args: &HashPasswordArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let algorithm = args.algorithm.unwrap_or(config.auth.password_algorithm);
    let digest = CredentialHasher::new(algorithm).hash(&args.password)?;

    match format {
        OutputFormat::Text => println!("{digest}"),
        OutputFormat::Json => println!(
            "{}",
            serde_json::json!({ "algorithm": algorithm, "digest": digest })
        ),
    }
    Ok(())
}
