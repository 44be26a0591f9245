//! Map parsed CLI arguments to an action.

use crate::cli::actions::{Action, server::Args};
use crate::cli::commands::identity;
use anyhow::Result;

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>("port").copied().unwrap_or(8000);

    let identity_opts = identity::Options::parse(matches)?;

    Ok(Action::Server(Args {
        port,
        identity_url: identity_opts.url,
        identity_key: identity_opts.key,
        identity_timeout: identity_opts.timeout,
        cors_origin: identity_opts.cors_origin,
    }))
}
