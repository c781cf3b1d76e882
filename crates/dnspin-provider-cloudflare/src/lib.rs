// # Cloudflare DNS Provider
//
// Implements the `DnsProvider` trait against the Cloudflare API v4.
//
// - One HTTP request per trait operation; no retry, backoff, or caching
//   (retry cadence is owned by the scheduler's tick loop)
// - Every request carries a 30 second timeout
// - Specific handling for HTTP status codes (401/403, 404, 429, 5xx)
// - Both A and AAAA records
//
// ## Security
//
// - The API token never appears in logs
// - The `Debug` implementation redacts the token
//
// ## API Reference
//
// - Cloudflare API v4: https://developers.cloudflare.com/api/
// - Verify Token: GET `/user/tokens/verify`
// - List Zones: GET `/zones?name=...`
// - List DNS Records: GET `/zones/:zone_id/dns_records?type=...&name=...`
// - Create DNS Record: POST `/zones/:zone_id/dns_records`
// - Update DNS Record: PUT `/zones/:zone_id/dns_records/:record_id`

use async_trait::async_trait;
use dnspin_core::error::{Error, Result};
use dnspin_core::traits::{DnsProvider, ObservedRecord, RecordRef, RecordType, ZoneRef};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::net::IpAddr;
use std::time::Duration;

/// Cloudflare API base URL
const CLOUDFLARE_API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// Default HTTP timeout for API requests
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Cloudflare's "automatic" TTL sentinel
const TTL_AUTOMATIC: u32 = 1;

/// Cloudflare DNS provider
///
/// Stateless single-shot client: zone and record identifiers are supplied by
/// the caller on every operation, so the provider holds nothing but the
/// token and the HTTP client.
pub struct CloudflareProvider {
    /// Cloudflare API token; never logged
    api_token: String,

    /// HTTP client for API requests
    client: reqwest::Client,
}

// The API token must not leak through Debug output
impl std::fmt::Debug for CloudflareProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudflareProvider")
            .field("api_token", &"<REDACTED>")
            .finish()
    }
}

/// Every v4 response wraps its payload in a `result` field
#[derive(Deserialize)]
struct Envelope<T> {
    result: Option<T>,
}

#[derive(Deserialize)]
struct ZoneBody {
    id: String,
    name: String,
}

#[derive(Deserialize)]
struct RecordBody {
    id: String,
    name: String,
    #[serde(rename = "type")]
    record_type: String,
    content: String,
    #[serde(default)]
    proxied: bool,
}

impl CloudflareProvider {
    /// Create a new Cloudflare provider
    ///
    /// The token needs Zone:Read and DNS:Edit permissions on the target zone.
    pub fn new(api_token: impl Into<String>) -> Result<Self> {
        let api_token = api_token.into();
        if api_token.is_empty() {
            return Err(Error::config("Cloudflare API token cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| {
                Error::provider("cloudflare", format!("failed to build HTTP client: {e}"))
            })?;

        Ok(Self { api_token, client })
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response> {
        request
            .bearer_auth(&self.api_token)
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(|e| Error::provider("cloudflare", format!("HTTP request failed: {e}")))
    }
}

/// Map a non-success response to the error taxonomy
async fn status_error(context: &str, response: reqwest::Response) -> Error {
    let status = response.status();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "unable to read error response".to_string());

    match status.as_u16() {
        401 | 403 => Error::credential(format!(
            "{context}: invalid API token or insufficient permissions ({status})"
        )),
        404 => Error::provider("cloudflare", format!("{context}: not found ({status})")),
        429 => Error::provider(
            "cloudflare",
            format!("{context}: rate limit exceeded, retry later ({status})"),
        ),
        500..=599 => Error::provider(
            "cloudflare",
            format!("{context}: server error (transient): {status} - {body}"),
        ),
        _ => Error::provider("cloudflare", format!("{context}: {status} - {body}")),
    }
}

/// Unwrap a response whose `result` must be present
async fn parse<T: DeserializeOwned>(context: &str, response: reqwest::Response) -> Result<T> {
    let envelope: Envelope<T> = response.json().await.map_err(|e| {
        Error::provider("cloudflare", format!("{context}: failed to parse response: {e}"))
    })?;

    envelope.result.ok_or_else(|| {
        Error::provider("cloudflare", format!("{context}: response carried no result"))
    })
}

/// Unwrap a listing response; a null `result` counts as empty
async fn parse_list<T: DeserializeOwned>(
    context: &str,
    response: reqwest::Response,
) -> Result<Vec<T>> {
    let envelope: Envelope<Vec<T>> = response.json().await.map_err(|e| {
        Error::provider("cloudflare", format!("{context}: failed to parse response: {e}"))
    })?;

    Ok(envelope.result.unwrap_or_default())
}

#[async_trait]
impl DnsProvider for CloudflareProvider {
    async fn verify_credentials(&self) -> Result<bool> {
        let url = format!("{CLOUDFLARE_API_BASE}/user/tokens/verify");
        let response = self.send(self.client.get(&url)).await?;

        let status = response.status();
        if status.is_success() {
            tracing::debug!("API token verified");
            return Ok(true);
        }
        if matches!(status.as_u16(), 401 | 403) {
            tracing::debug!("API token rejected: {}", status);
            return Ok(false);
        }

        Err(status_error("token verification", response).await)
    }

    async fn find_zone(&self, zone_name: &str) -> Result<Option<ZoneRef>> {
        let url = format!("{CLOUDFLARE_API_BASE}/zones?name={zone_name}");
        let response = self.send(self.client.get(&url)).await?;

        if !response.status().is_success() {
            return Err(status_error("zone lookup", response).await);
        }

        let zones: Vec<ZoneBody> = parse_list("zone lookup", response).await?;
        Ok(zones
            .into_iter()
            .next()
            .map(|zone| ZoneRef {
                id: zone.id,
                name: zone.name,
            }))
    }

    async fn list_records(
        &self,
        zone_id: &str,
        fqdn: &str,
        record_type: RecordType,
    ) -> Result<Vec<ObservedRecord>> {
        let url = format!(
            "{CLOUDFLARE_API_BASE}/zones/{zone_id}/dns_records?type={}&name={fqdn}",
            record_type.as_str()
        );
        let response = self.send(self.client.get(&url)).await?;

        if !response.status().is_success() {
            return Err(status_error("record lookup", response).await);
        }

        let bodies: Vec<RecordBody> = parse_list("record lookup", response).await?;
        Ok(bodies
            .into_iter()
            .filter_map(|body| {
                // The query is type-filtered; anything else is dropped here
                let record_type = RecordType::from_wire(&body.record_type)?;
                Some(ObservedRecord {
                    id: body.id,
                    record_type,
                    content: body.content,
                    proxied: body.proxied,
                })
            })
            .collect())
    }

    async fn create_record(
        &self,
        zone_id: &str,
        fqdn: &str,
        record_type: RecordType,
        address: IpAddr,
    ) -> Result<RecordRef> {
        let url = format!("{CLOUDFLARE_API_BASE}/zones/{zone_id}/dns_records");
        let body = serde_json::json!({
            "type": record_type.as_str(),
            "name": fqdn,
            "content": address.to_string(),
            "proxied": false,
            "ttl": TTL_AUTOMATIC,
        });

        let response = self.send(self.client.post(&url).json(&body)).await?;
        if !response.status().is_success() {
            return Err(status_error("record create", response).await);
        }

        let created: RecordBody = parse("record create", response).await?;
        tracing::debug!("created record {} for {}", created.id, fqdn);

        Ok(RecordRef {
            id: created.id,
            fqdn: created.name,
            record_type,
            proxied: created.proxied,
        })
    }

    async fn update_record(
        &self,
        zone_id: &str,
        record_id: &str,
        fqdn: &str,
        record_type: RecordType,
        address: IpAddr,
        proxied: bool,
    ) -> Result<RecordRef> {
        let url = format!("{CLOUDFLARE_API_BASE}/zones/{zone_id}/dns_records/{record_id}");
        let body = serde_json::json!({
            "name": fqdn,
            "type": record_type.as_str(),
            "content": address.to_string(),
            "proxied": proxied,
        });

        let response = self.send(self.client.put(&url).json(&body)).await?;
        if !response.status().is_success() {
            return Err(status_error("record update", response).await);
        }

        let updated: RecordBody = parse("record update", response).await?;
        tracing::debug!("updated record {} for {}", updated.id, fqdn);

        Ok(RecordRef {
            id: updated.id,
            fqdn: updated.name,
            record_type,
            proxied: updated.proxied,
        })
    }

    fn provider_name(&self) -> &'static str {
        "cloudflare"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_token_is_rejected() {
        assert!(CloudflareProvider::new("").is_err());
    }

    #[test]
    fn api_token_not_exposed_in_debug() {
        let provider =
            CloudflareProvider::new("secret_token_12345").expect("provider constructs");

        let rendered = format!("{:?}", provider);
        assert!(!rendered.contains("secret_token_12345"));
        assert!(!rendered.contains("secret_token"));
        assert!(rendered.contains("CloudflareProvider"));
    }

    #[test]
    fn provider_name_is_cloudflare() {
        let provider = CloudflareProvider::new("token-value").expect("provider constructs");
        assert_eq!(provider.provider_name(), "cloudflare");
    }

    #[test]
    fn record_listing_drops_unknown_types() {
        let raw = r#"{
            "result": [
                {"id": "r1", "name": "home.example.com", "type": "AAAA",
                 "content": "2001:db8::1", "proxied": false},
                {"id": "r2", "name": "home.example.com", "type": "TXT",
                 "content": "v=spf1 -all"}
            ]
        }"#;

        let envelope: Envelope<Vec<RecordBody>> =
            serde_json::from_str(raw).expect("envelope parses");
        let records: Vec<_> = envelope
            .result
            .unwrap_or_default()
            .into_iter()
            .filter_map(|body| RecordType::from_wire(&body.record_type).map(|t| (body.id, t)))
            .collect();

        assert_eq!(records, vec![("r1".to_string(), RecordType::Aaaa)]);
    }
}
