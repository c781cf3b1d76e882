// # DNS Provider Trait
//
// Defines the interface for the DNS hosting provider's management API.
//
// ## Implementations
//
// - Cloudflare: `dnspin-provider-cloudflare` crate
// - Test double: `tests/common/mod.rs`
//
// Implementations perform exactly one API call per operation. Retries,
// scheduling, and the decision of whether a mutation is needed are owned by
// the `Reconciler` and `Scheduler`; a provider that fails simply returns an
// error and the next tick starts over from a fresh record listing.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;

use crate::error::Result;
use crate::traits::address_source::AddressFamily;

/// DNS record type managed by this system
///
/// Only address records are reconciled; anything else a permissive provider
/// returns is ignored by the reconciler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecordType {
    /// A record (IPv4)
    A,
    /// AAAA record (IPv6)
    Aaaa,
}

impl RecordType {
    /// Wire name of the record type ("A" / "AAAA")
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::Aaaa => "AAAA",
        }
    }

    /// Parse a provider wire name; unknown types yield `None`
    pub fn from_wire(s: &str) -> Option<Self> {
        match s {
            "A" => Some(RecordType::A),
            "AAAA" => Some(RecordType::Aaaa),
            _ => None,
        }
    }

    /// The address family this record type carries
    pub fn family(&self) -> AddressFamily {
        match self {
            RecordType::A => AddressFamily::V4,
            RecordType::Aaaa => AddressFamily::V6,
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A DNS zone as identified by the provider
///
/// Resolved once at startup and held immutably for the process lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneRef {
    /// Provider-assigned zone identifier
    pub id: String,
    /// Zone (domain) name
    pub name: String,
}

/// A specific DNS record as identified by the provider
///
/// Returned by mutating calls; the `id` does not exist until the record does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordRef {
    /// Provider-assigned record identifier
    pub id: String,
    /// Fully-qualified record name
    pub fqdn: String,
    /// Record type
    pub record_type: RecordType,
    /// Whether traffic is routed through the provider's edge
    pub proxied: bool,
}

/// One existing record returned by a filtered listing
///
/// `content` stays a string: providers can hold values that do not parse as
/// an address, and such records are treated as stale rather than rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservedRecord {
    /// Provider-assigned record identifier
    pub id: String,
    /// Record type as reported by the provider
    pub record_type: RecordType,
    /// Current record content (address text)
    pub content: String,
    /// Current proxied flag; preserved verbatim across updates
    pub proxied: bool,
}

/// Trait over a DNS hosting provider's management API
///
/// Every create/update is a real, externally-visible mutation. Implementations
/// must be thread-safe and usable across async tasks, and must put an explicit
/// timeout on each request so a hung call cannot stall the tick loop.
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// Check that the configured API token is valid
    ///
    /// Used once at startup. `Ok(false)` means the provider answered and
    /// rejected the token; transport-level failures are errors.
    async fn verify_credentials(&self) -> Result<bool>;

    /// Look up a zone by name
    ///
    /// Returns `Ok(None)` when the provider has no zone of that name.
    async fn find_zone(&self, zone_name: &str) -> Result<Option<ZoneRef>>;

    /// List existing records for `(fqdn, record_type)` in the given zone
    ///
    /// The returned order is the provider's; the reconciler does not resort.
    async fn list_records(
        &self,
        zone_id: &str,
        fqdn: &str,
        record_type: RecordType,
    ) -> Result<Vec<ObservedRecord>>;

    /// Create a new record with `proxied = false` and the provider's
    /// automatic TTL
    async fn create_record(
        &self,
        zone_id: &str,
        fqdn: &str,
        record_type: RecordType,
        address: IpAddr,
    ) -> Result<RecordRef>;

    /// Rewrite an existing record's content, carrying `proxied` through
    /// unchanged
    async fn update_record(
        &self,
        zone_id: &str,
        record_id: &str,
        fqdn: &str,
        record_type: RecordType,
        address: IpAddr,
        proxied: bool,
    ) -> Result<RecordRef>;

    /// Provider name for logging
    fn provider_name(&self) -> &'static str;
}
