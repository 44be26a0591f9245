use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;
use std::time::Duration;

pub const ARG_IDENTITY_URL: &str = "identity-url";
pub const ARG_IDENTITY_KEY: &str = "identity-key";
pub const ARG_IDENTITY_TIMEOUT_SECONDS: &str = "identity-timeout-seconds";
pub const ARG_CORS_ORIGIN: &str = "cors-origin";

#[derive(Debug, Clone)]
pub struct Options {
    pub url: String,
    pub key: SecretString,
    pub timeout: Duration,
    pub cors_origin: Option<String>,
}

impl Options {
    /// Parse identity provider arguments from matches.
    ///
    /// # Errors
    /// Returns an error if the provider URL or key is missing or blank.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        // env vars set to "" reach us as empty strings
        let get_non_empty = |id: &str| {
            matches
                .get_one::<String>(id)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let Some(url) = get_non_empty(ARG_IDENTITY_URL) else {
            anyhow::bail!("missing required argument: --{ARG_IDENTITY_URL}");
        };

        let Some(key) = get_non_empty(ARG_IDENTITY_KEY) else {
            anyhow::bail!("missing required argument: --{ARG_IDENTITY_KEY}");
        };

        let timeout = matches
            .get_one::<u64>(ARG_IDENTITY_TIMEOUT_SECONDS)
            .copied()
            .unwrap_or(10);

        Ok(Self {
            url,
            key: SecretString::from(key),
            timeout: Duration::from_secs(timeout),
            cors_origin: get_non_empty(ARG_CORS_ORIGIN),
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_IDENTITY_URL)
                .long(ARG_IDENTITY_URL)
                .help("Base URL of the identity provider, e.g. https://<project>.supabase.co")
                .env("ZENTORA_IDENTITY_URL"),
        )
        .arg(
            Arg::new(ARG_IDENTITY_KEY)
                .long(ARG_IDENTITY_KEY)
                .help("API key sent to the identity provider")
                .env("ZENTORA_IDENTITY_KEY")
                .hide_env_values(true),
        )
        .arg(
            Arg::new(ARG_IDENTITY_TIMEOUT_SECONDS)
                .long(ARG_IDENTITY_TIMEOUT_SECONDS)
                .help("Timeout for identity provider requests in seconds")
                .env("ZENTORA_IDENTITY_TIMEOUT_SECONDS")
                .default_value("10")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
        .arg(
            Arg::new(ARG_CORS_ORIGIN)
                .long(ARG_CORS_ORIGIN)
                .help("Browser origin allowed to call the API; CORS is off when unset")
                .env("ZENTORA_CORS_ORIGIN"),
        )
}
