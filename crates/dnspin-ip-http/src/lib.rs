// # HTTPS Echo Address Source
//
// Discovers the host's public address by asking an HTTPS echo service
// (a plain-text endpoint that answers with the caller's address).
//
// This is the fallback mechanism for networks where outbound DNS to a
// public resolver is filtered; the resolver-based source in `dnspin-ip-dns`
// is the default.

use async_trait::async_trait;
use dnspin_core::error::{Error, Result};
use dnspin_core::traits::{AddressFamily, AddressSource};
use std::net::IpAddr;
use std::time::Duration;

/// Default echo endpoints, one per family
///
/// ipify answers over both families with a bare textual address and no
/// documented rate limit for this volume of traffic.
pub const DEFAULT_V4_ECHO_URL: &str = "https://api.ipify.org";
pub const DEFAULT_V6_ECHO_URL: &str = "https://api6.ipify.org";

/// Timeout for one echo request
const ECHO_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTPS echo-based address source
pub struct HttpEchoSource {
    v4_url: String,
    v6_url: String,
    client: reqwest::Client,
}

impl HttpEchoSource {
    /// Create a source using the default echo endpoints
    pub fn new() -> Self {
        Self::with_urls(DEFAULT_V4_ECHO_URL, DEFAULT_V6_ECHO_URL)
    }

    /// Create a source with custom echo endpoints
    pub fn with_urls(v4_url: impl Into<String>, v6_url: impl Into<String>) -> Self {
        Self {
            v4_url: v4_url.into(),
            v6_url: v6_url.into(),
            client: reqwest::Client::builder()
                .timeout(ECHO_TIMEOUT)
                .build()
                .unwrap_or_default(),
        }
    }

    /// Create a source that queries one endpoint for both families
    pub fn for_url(url: impl Into<String>) -> Self {
        let url = url.into();
        Self::with_urls(url.clone(), url)
    }
}

impl Default for HttpEchoSource {
    fn default() -> Self {
        Self::new()
    }
}

/// Normalize and validate an echo service's answer
fn parse_echo_body(body: &str, family: AddressFamily) -> Result<IpAddr> {
    let text = body.trim().trim_matches('"');

    let ip: IpAddr = text.parse().map_err(|_| {
        Error::discovery(format!("echo service answered '{text}', not an address"))
    })?;

    if !family.matches(&ip) {
        return Err(Error::discovery(format!(
            "echo service answered {ip}, wrong address family"
        )));
    }

    Ok(ip)
}

#[async_trait]
impl AddressSource for HttpEchoSource {
    async fn discover(&self, family: AddressFamily) -> Result<IpAddr> {
        let url = match family {
            AddressFamily::V4 => &self.v4_url,
            AddressFamily::V6 => &self.v6_url,
        };

        tracing::debug!("querying echo service {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::discovery(format!("echo request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::discovery(format!(
                "echo service returned {}",
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::discovery(format!("failed to read echo response: {e}")))?;

        parse_echo_body(&body, family)
    }

    fn source_name(&self) -> &'static str {
        "http-echo"
    }
}
