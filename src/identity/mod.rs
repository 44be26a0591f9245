//! Identity provider collaborator.
//!
//! Registration, password login and confirmation resends are delegated to an
//! external GoTrue-compatible auth API. Handlers only see the
//! [`IdentityProvider`] trait, so tests can swap in a stub.

mod client;
pub mod models;

pub use client::GoTrueClient;
pub use models::{
    AuthResponse, Credentials, Identity, OtpResponse, ResendOptions, ResendRequest, ResendTarget,
    ResendType, Session, User,
};

use async_trait::async_trait;
use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("identity provider request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("identity provider returned {status}: {message}")]
    Api { status: StatusCode, message: String },
    #[error("invalid identity provider response: {0}")]
    Decode(String),
    #[error("invalid identity provider configuration: {0}")]
    Config(String),
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Create an account.
    async fn sign_up(&self, credentials: &Credentials) -> Result<AuthResponse, ProviderError>;

    /// Exchange an email/password pair for a session.
    async fn sign_in_with_password(
        &self,
        credentials: &Credentials,
    ) -> Result<AuthResponse, ProviderError>;

    /// Ask the provider to send the confirmation message again.
    async fn resend(&self, request: &ResendRequest) -> Result<OtpResponse, ProviderError>;

    /// Probe provider reachability.
    async fn health(&self) -> Result<(), ProviderError>;
}
