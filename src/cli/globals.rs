use secrecy::SecretString;
use std::time::Duration;

/// Process-wide settings resolved once at startup.
#[derive(Clone)]
pub struct GlobalArgs {
    pub identity_url: String,
    pub identity_key: SecretString,
    pub identity_timeout: Duration,
}

impl GlobalArgs {
    #[must_use]
    pub fn new(identity_url: String, identity_key: SecretString) -> Self {
        Self {
            identity_url,
            identity_key,
            identity_timeout: Duration::from_secs(10),
        }
    }

    #[must_use]
    pub fn with_identity_timeout(mut self, timeout: Duration) -> Self {
        self.identity_timeout = timeout;
        self
    }
}

impl std::fmt::Debug for GlobalArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlobalArgs")
            .field("identity_url", &self.identity_url)
            .field("identity_key", &"***")
            .field("identity_timeout", &self.identity_timeout)
            .finish()
    }
}
