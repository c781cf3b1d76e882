// # dnspin-core
//
// Core library for the dnspin dynamic-DNS updater.
//
// ## Architecture Overview
//
// This library provides everything except the actual I/O backends:
// - **AddressSource**: Trait for discovering the host's current public address
// - **DnsProvider**: Trait over the DNS hosting provider's management API
// - **Reconciler**: Decides per tick whether to create, update, or skip records
// - **Scheduler**: Drives the reconciler on a fixed interval, forever
//
// ## Design Principles
//
// 1. **Narrow seams**: Providers and address sources are trait objects, so the
//    reconciliation contract is testable with fakes and no network access.
// 2. **Pull-based ticks**: The scheduler asks for a fresh address and a fresh
//    record listing each tick; nothing is cached between ticks except the
//    resolved zone.
// 3. **Per-tick recovery**: After startup, no error terminates the process.

pub mod config;
pub mod error;
pub mod reconciler;
pub mod scheduler;
pub mod traits;

// Re-export core types for convenience
pub use config::Settings;
pub use error::{Error, Result};
pub use reconciler::{Reconciler, RecordDisposition, TickOutcome};
pub use scheduler::Scheduler;
pub use traits::{
    AddressFamily, AddressSource, DnsProvider, ObservedRecord, RecordRef, RecordType, ZoneRef,
};
