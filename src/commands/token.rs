//! Access-token inspection command.

use std::sync::Arc;

use clap::Args;

use tollgate_auth::AccessTokenIssuer;
use tollgate_core::config::AppConfig;
use tollgate_core::error::AppError;
use tollgate_core::traits::SystemClock;

use super::OutputFormat;

/// Arguments for `inspect-token`
#[derive(Debug, Args)]
pub struct InspectTokenArgs {
    /// Encoded access token
    pub token: String,
}

/// Verify the token with the configured secret and print its claims.
pub fn execute(
    args: &InspectTokenArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let issuer = AccessTokenIssuer::new(&config.auth, Arc::new(SystemClock));
    let claims = issuer.decode(&args.token)?;

    match format {
        OutputFormat::Text => {
            let roles: Vec<&str> = claims.role.iter().map(|c| c.as_str()).collect();
            println!("subject:  {}", claims.sub);
            println!("email:    {}", claims.email);
            println!("roles:    {}", roles.join(", "));
            if let Some(expires_at) = claims.expires_at() {
                println!("expires:  {expires_at}");
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&claims)?),
    }
    Ok(())
}
