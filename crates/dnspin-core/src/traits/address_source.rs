// # Address Source Trait
//
// Defines the interface for discovering the host's current public address.
//
// ## Implementations
//
// - Resolver echo (DNS query to a well-known resolver): `dnspin-ip-dns` crate
// - HTTPS echo endpoint: `dnspin-ip-http` crate
//
// Sources are pull-only: the scheduler calls `discover` once per tick and a
// failed call means the tick is skipped, not that the process dies. No
// caching is permitted; every call performs a fresh external query.

use async_trait::async_trait;
use std::net::IpAddr;

use crate::error::Result;

/// Address family to discover
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressFamily {
    /// IPv4
    V4,
    /// IPv6
    V6,
}

impl AddressFamily {
    /// Whether `ip` belongs to this family
    pub fn matches(&self, ip: &IpAddr) -> bool {
        match self {
            AddressFamily::V4 => ip.is_ipv4(),
            AddressFamily::V6 => ip.is_ipv6(),
        }
    }
}

/// Trait for public-address discovery implementations
///
/// Implementations must normalize the external service's answer (trim
/// whitespace and quoting) and verify the result belongs to the requested
/// family before returning it. The underlying query carries an explicit
/// timeout so a hung call cannot stall the tick loop.
#[async_trait]
pub trait AddressSource: Send + Sync {
    /// Discover the current public address of the given family
    ///
    /// Transient failures are returned as `Error::Discovery`; implementations
    /// never panic on them and never retry internally.
    async fn discover(&self, family: AddressFamily) -> Result<IpAddr>;

    /// Source name for logging
    fn source_name(&self) -> &'static str;
}
