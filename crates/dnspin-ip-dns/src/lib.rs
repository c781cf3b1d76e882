// # Resolver-Echo Address Source
//
// Discovers the host's public address by asking a well-known resolver that
// echoes the querier's address back as the answer: an A/AAAA lookup of
// `myip.opendns.com` against the OpenDNS resolvers answers with the address
// the query arrived from.
//
// This is the default discovery mechanism. The lookup runs in-process over
// UDP with an explicit per-query timeout; a fresh resolver is built for
// every call so no answer is ever served from cache.

use async_trait::async_trait;
use dnspin_core::error::{Error, Result};
use dnspin_core::traits::{AddressFamily, AddressSource};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::time::Duration;

use hickory_resolver::TokioResolver;
use hickory_resolver::config::{NameServerConfigGroup, ResolverConfig, ResolverOpts};
use hickory_resolver::name_server::TokioConnectionProvider;

/// Name whose answer echoes the querier's address
const ECHO_NAME: &str = "myip.opendns.com.";

/// OpenDNS resolver addresses, reached over the family being discovered so
/// the echoed address belongs to that family
const RESOLVERS_V4: [IpAddr; 2] = [
    IpAddr::V4(Ipv4Addr::new(208, 67, 222, 222)),
    IpAddr::V4(Ipv4Addr::new(208, 67, 220, 220)),
];
const RESOLVERS_V6: [IpAddr; 2] = [
    IpAddr::V6(Ipv6Addr::new(0x2620, 0x119, 0x35, 0, 0, 0, 0, 0x35)),
    IpAddr::V6(Ipv6Addr::new(0x2620, 0x119, 0x53, 0, 0, 0, 0, 0x53)),
];

/// Timeout for one echo lookup
const QUERY_TIMEOUT: Duration = Duration::from_secs(10);

/// Resolver-echo address source
pub struct ResolverAddressSource {
    echo_name: String,
}

impl ResolverAddressSource {
    /// Create a source using the OpenDNS echo name
    pub fn new() -> Self {
        Self {
            echo_name: ECHO_NAME.to_string(),
        }
    }

    /// A resolver pinned to the echo resolvers of the given family, with
    /// caching off so every discovery is a fresh query
    fn resolver_for(&self, family: AddressFamily) -> TokioResolver {
        let resolvers: &[IpAddr] = match family {
            AddressFamily::V4 => &RESOLVERS_V4,
            AddressFamily::V6 => &RESOLVERS_V6,
        };

        let config = ResolverConfig::from_parts(
            None,
            vec![],
            NameServerConfigGroup::from_ips_clear(resolvers, 53, true),
        );

        let mut opts = ResolverOpts::default();
        opts.timeout = QUERY_TIMEOUT;
        opts.cache_size = 0;

        TokioResolver::builder_with_config(config, TokioConnectionProvider::default())
            .with_options(opts)
            .build()
    }
}

impl Default for ResolverAddressSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AddressSource for ResolverAddressSource {
    async fn discover(&self, family: AddressFamily) -> Result<IpAddr> {
        let resolver = self.resolver_for(family);

        tracing::debug!("querying {} for a {:?} address", self.echo_name, family);

        let answer = match family {
            AddressFamily::V4 => resolver
                .ipv4_lookup(self.echo_name.as_str())
                .await
                .map_err(|e| Error::discovery(format!("echo lookup failed: {e}")))?
                .iter()
                .next()
                .map(|a| IpAddr::V4(a.0)),
            AddressFamily::V6 => resolver
                .ipv6_lookup(self.echo_name.as_str())
                .await
                .map_err(|e| Error::discovery(format!("echo lookup failed: {e}")))?
                .iter()
                .next()
                .map(|aaaa| IpAddr::V6(aaaa.0)),
        };

        answer.ok_or_else(|| Error::discovery("echo lookup returned no records"))
    }

    fn source_name(&self) -> &'static str {
        "resolver-echo"
    }
}
