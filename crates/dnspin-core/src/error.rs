//! Error types for the dnspin system
//!
//! Startup-fatal and per-tick-recoverable conditions share one enum; the
//! caller decides which variants terminate the process (only the daemon's
//! startup path ever does).

use thiserror::Error;

/// Result type alias for dnspin operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the dnspin system
#[derive(Error, Debug)]
pub enum Error {
    /// Bad or missing configuration; fatal at startup
    #[error("configuration error: {0}")]
    Config(String),

    /// API token rejected by the provider; fatal at startup
    #[error("credential verification failed: {0}")]
    Credential(String),

    /// Zone could not be resolved at the provider; fatal at startup
    #[error("zone resolution failed: {0}")]
    Resolution(String),

    /// No public address obtainable this tick; recovered by skipping the tick
    #[error("address discovery failed: {0}")]
    Discovery(String),

    /// Provider API call failed; recovered by retrying on the next tick
    #[error("provider error ({provider}): {message}")]
    Provider {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
    },
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a credential error
    pub fn credential(msg: impl Into<String>) -> Self {
        Self::Credential(msg.into())
    }

    /// Create a zone resolution error
    pub fn resolution(msg: impl Into<String>) -> Self {
        Self::Resolution(msg.into())
    }

    /// Create an address discovery error
    pub fn discovery(msg: impl Into<String>) -> Self {
        Self::Discovery(msg.into())
    }

    /// Create a provider-specific error
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }
}
