//! Session configuration: target environment, timeout and credentials.

use std::fmt;
use std::time::Duration;

use crate::error::{Error, Result};

/// Production API base URL.
pub const PRODUCTION_URL: &str = "https://api.bentoforbusiness.com";

/// Sandbox API base URL.
pub const SANDBOX_URL: &str = "https://sandbox-api.bentoforbusiness.com/api";

/// Timeout applied to each exchange unless configured otherwise.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub const ACCESS_KEY_VAR: &str = "BENTO_ACCESS_KEY";
pub const SECRET_KEY_VAR: &str = "BENTO_SECRET_KEY";

/// Which Bento deployment to talk to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Production,
    Sandbox,
    /// Any other base URL, e.g. a local mock.
    Custom(String),
}

impl Environment {
    pub fn base_url(&self) -> &str {
        match self {
            Environment::Production => PRODUCTION_URL,
            Environment::Sandbox => SANDBOX_URL,
            Environment::Custom(url) => url,
        }
    }
}

/// Where and how a session connects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Base URL without a trailing slash.
    pub base_url: String,
    /// Deadline for a whole exchange; `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

impl SessionConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout: Some(DEFAULT_TIMEOUT),
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Environment::Production.into()
    }
}

impl From<Environment> for SessionConfig {
    fn from(environment: Environment) -> Self {
        Self::new(environment.base_url())
    }
}

/// API key pair exchanged for a session token.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub access_key: String,
    pub secret_key: String,
}

impl Credentials {
    pub fn new(access_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            access_key: access_key.into(),
            secret_key: secret_key.into(),
        }
    }

    /// Reads `BENTO_ACCESS_KEY` and `BENTO_SECRET_KEY`.
    pub fn from_env() -> Result<Self> {
        let access_key =
            std::env::var(ACCESS_KEY_VAR).map_err(|_| Error::MissingCredential(ACCESS_KEY_VAR))?;
        let secret_key =
            std::env::var(SECRET_KEY_VAR).map_err(|_| Error::MissingCredential(SECRET_KEY_VAR))?;
        Ok(Self::new(access_key, secret_key))
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .finish()
    }
}
