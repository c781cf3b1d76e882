// # Trait definitions
//
// The two seams of the system: address discovery and the provider API.

pub mod address_source;
pub mod dns_provider;

pub use address_source::{AddressFamily, AddressSource};
pub use dns_provider::{DnsProvider, ObservedRecord, RecordRef, RecordType, ZoneRef};
