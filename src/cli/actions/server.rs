use crate::{api, cli::globals::GlobalArgs, cli::telemetry, identity::GoTrueClient};
use anyhow::{Context, Result};
use secrecy::SecretString;
use std::{sync::Arc, time::Duration};
use tracing::{debug, info};

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub identity_url: String,
    pub identity_key: SecretString,
    pub identity_timeout: Duration,
    pub cors_origin: Option<String>,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the identity client cannot be built or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let globals = GlobalArgs::new(args.identity_url, args.identity_key)
        .with_identity_timeout(args.identity_timeout);

    debug!("Global args: {:?}", globals);

    let client = GoTrueClient::new(
        &globals.identity_url,
        &globals.identity_key,
        globals.identity_timeout,
    )
    .context("Failed to build identity provider client")?;

    info!(identity_url = %client.base_url(), "identity provider configured");

    let result = api::new(args.port, Arc::new(client), args.cors_origin.as_deref()).await;

    telemetry::shutdown_tracer();

    result
}
