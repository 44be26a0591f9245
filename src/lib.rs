//! # Zentora (identity relay)
//!
//! `zentora` is a thin HTTP API in front of a GoTrue-compatible identity
//! provider. It validates registration, login and confirmation-resend
//! requests, forwards them to the provider, and returns the provider's records
//! as plain JSON.
//!
//! ## Delegation
//!
//! Nothing security-sensitive happens locally: password checks, token
//! issuance, confirmation delivery and session storage all live in the
//! provider. The relay never persists credentials or sessions.
//!
//! ## Response normalization
//!
//! Provider records carry timestamps and nested records. The [`serializer`]
//! flattens them into JSON-safe values (timestamps become ISO-8601 strings,
//! records become objects of their fields) before they are wrapped in the
//! `{message, data}` envelope.

pub mod api;
pub mod cli;
pub mod identity;
pub mod serializer;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
