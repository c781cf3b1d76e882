//! Configuration types for the dnspin system
//!
//! A single immutable [`Settings`] struct replaces ad-hoc globals; it is
//! validated once at startup and then passed by reference into constructors.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::traits::RecordType;

/// Default seconds between reconciliation ticks
const DEFAULT_INTERVAL_SECS: u64 = 50;

/// Runtime settings for one managed record
///
/// The target is always a single `(fqdn, record_type)` pair; the fqdn is
/// `subdomain.zone_name`, constructed once and invariant afterwards.
#[derive(Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Provider API token
    pub api_token: String,

    /// Zone (domain) name the record lives under
    pub zone_name: String,

    /// Subdomain to keep pointed at this host
    pub subdomain: String,

    /// Record type to manage
    #[serde(default = "default_record_type")]
    pub record_type: RecordType,

    /// Seconds between reconciliation ticks
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Upper bound on the uniform random delay added to each tick interval
    ///
    /// Zero disables jitter. Spreads ticks out across hosts sharing a
    /// network egress.
    #[serde(default)]
    pub jitter_secs: u64,
}

// The API token must not leak through Debug output
impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("api_token", &"<REDACTED>")
            .field("zone_name", &self.zone_name)
            .field("subdomain", &self.subdomain)
            .field("record_type", &self.record_type)
            .field("interval_secs", &self.interval_secs)
            .field("jitter_secs", &self.jitter_secs)
            .finish()
    }
}

impl Settings {
    /// Create settings with defaults for everything but the required triple
    pub fn new(
        api_token: impl Into<String>,
        zone_name: impl Into<String>,
        subdomain: impl Into<String>,
    ) -> Self {
        Self {
            api_token: api_token.into(),
            zone_name: zone_name.into(),
            subdomain: subdomain.into(),
            record_type: default_record_type(),
            interval_secs: default_interval_secs(),
            jitter_secs: 0,
        }
    }

    /// Set the record type
    pub fn with_record_type(mut self, record_type: RecordType) -> Self {
        self.record_type = record_type;
        self
    }

    /// Set the tick interval
    pub fn with_interval_secs(mut self, interval_secs: u64) -> Self {
        self.interval_secs = interval_secs;
        self
    }

    /// Set the tick jitter bound
    pub fn with_jitter_secs(mut self, jitter_secs: u64) -> Self {
        self.jitter_secs = jitter_secs;
        self
    }

    /// The fully-qualified record name, `subdomain.zone_name`
    pub fn fqdn(&self) -> String {
        format!("{}.{}", self.subdomain, self.zone_name)
    }

    /// Validate the settings
    ///
    /// Checks token plausibility, domain-name syntax of the zone and the
    /// resulting fqdn, and numeric ranges.
    pub fn validate(&self) -> Result<()> {
        if self.api_token.is_empty() {
            return Err(Error::config("API key is required"));
        }

        // Scoped Cloudflare tokens are 40 characters; other providers vary,
        // so only the obviously-wrong inputs are rejected here.
        if self.api_token.len() < 20 {
            return Err(Error::config(format!(
                "API key appears too short ({} chars); verify the token is correct",
                self.api_token.len()
            )));
        }

        let token_lower = self.api_token.to_lowercase();
        if token_lower.contains("your_token")
            || token_lower.contains("replace_me")
            || token_lower.contains("example")
            || token_lower == "token"
        {
            return Err(Error::config(
                "API key appears to be a placeholder; use an actual token from your DNS provider",
            ));
        }

        validate_domain_name(&self.zone_name)?;
        validate_domain_name(&self.subdomain)?;
        validate_domain_name(&self.fqdn())?;

        if !(10..=3600).contains(&self.interval_secs) {
            return Err(Error::config(format!(
                "interval must be between 10 and 3600 seconds, got {}",
                self.interval_secs
            )));
        }

        if self.jitter_secs > self.interval_secs {
            return Err(Error::config(format!(
                "jitter ({}s) must not exceed the interval ({}s)",
                self.jitter_secs, self.interval_secs
            )));
        }

        Ok(())
    }
}

/// Validate that a string is a plausible DNS name per RFC 1035
///
/// Not comprehensive, but catches the common operator typos before any
/// API call is made.
fn validate_domain_name(domain: &str) -> Result<()> {
    if domain.is_empty() {
        return Err(Error::config("domain name cannot be empty"));
    }

    // Total length limit (RFC 1035: 253 chars max)
    if domain.len() > 253 {
        return Err(Error::config(format!(
            "domain name too long: {} chars (max 253): {}",
            domain.len(),
            domain
        )));
    }

    for label in domain.split('.') {
        if label.is_empty() {
            return Err(Error::config(format!(
                "domain name has empty label: '{}'",
                domain
            )));
        }

        if label.len() > 63 {
            return Err(Error::config(format!(
                "domain label too long: {} chars (max 63): '{}'",
                label.len(),
                label
            )));
        }

        if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(Error::config(format!(
                "domain label contains invalid characters: '{}'",
                label
            )));
        }

        if label.starts_with('-') || label.ends_with('-') {
            return Err(Error::config(format!(
                "domain label cannot start or end with hyphen: '{}'",
                label
            )));
        }
    }

    Ok(())
}

fn default_record_type() -> RecordType {
    RecordType::Aaaa
}

fn default_interval_secs() -> u64 {
    DEFAULT_INTERVAL_SECS
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_settings() -> Settings {
        Settings::new("0123456789abcdef0123456789abcdef01234567", "example.com", "home")
    }

    #[test]
    fn fqdn_joins_subdomain_and_zone() {
        assert_eq!(valid_settings().fqdn(), "home.example.com");
    }

    #[test]
    fn defaults_follow_the_single_record_target() {
        let settings = valid_settings();
        assert_eq!(settings.record_type, RecordType::Aaaa);
        assert_eq!(settings.interval_secs, 50);
        assert_eq!(settings.jitter_secs, 0);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn rejects_placeholder_token() {
        let settings = Settings::new("your_token_goes_right_here", "example.com", "home");
        assert!(settings.validate().is_err());
    }

    #[test]
    fn rejects_short_token() {
        let settings = Settings::new("short", "example.com", "home");
        assert!(settings.validate().is_err());
    }

    #[test]
    fn rejects_bad_zone_name() {
        let settings = Settings::new(
            "0123456789abcdef0123456789abcdef01234567",
            "exa mple.com",
            "home",
        );
        assert!(settings.validate().is_err());

        let settings = Settings::new(
            "0123456789abcdef0123456789abcdef01234567",
            "-example.com",
            "home",
        );
        assert!(settings.validate().is_err());
    }

    #[test]
    fn rejects_out_of_range_interval() {
        let settings = valid_settings().with_interval_secs(5);
        assert!(settings.validate().is_err());

        let settings = valid_settings().with_interval_secs(4000);
        assert!(settings.validate().is_err());
    }

    #[test]
    fn rejects_jitter_exceeding_interval() {
        let settings = valid_settings().with_interval_secs(50).with_jitter_secs(60);
        assert!(settings.validate().is_err());
    }

    #[test]
    fn debug_output_redacts_token() {
        let rendered = format!("{:?}", valid_settings());
        assert!(!rendered.contains("0123456789abcdef"));
        assert!(rendered.contains("<REDACTED>"));
    }
}
