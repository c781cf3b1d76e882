//! Record reconciliation
//!
//! The Reconciler is the core of the system: given the freshly discovered
//! address, it compares the provider's stored records against the desired
//! state and performs at most one corrective API call per record per tick.
//!
//! ## Per-tick state machine
//!
//! ```text
//!               ┌──────────┐   content == address    ┌──────────┐
//!  listed ────▶ │  Stale   │ ──────────────────────▶ │ Matching │  (no-op)
//!               └──────────┘        update           └──────────┘
//!                                                         ▲
//!               ┌──────────┐        create                │
//!  nothing ───▶ │ NoRecord │ ────────────────────────────-┘
//!               └──────────┘   (only when no record of the
//!                               right type was processed)
//! ```
//!
//! Rules the loop enforces:
//! - a record already holding the address costs zero API calls;
//! - every mismatched record of the right type gets exactly one update,
//!   preserving its own `proxied` flag;
//! - a record of the wrong family is never touched;
//! - `create` runs only when the listing produced nothing of the right type;
//! - a provider error aborts the remainder of the tick, so a failed update
//!   can never be followed by a duplicate-producing create.

use std::net::IpAddr;
use std::sync::Arc;
use tracing::info;

use crate::error::Result;
use crate::traits::{DnsProvider, RecordType, ZoneRef};

/// What happened to one observed (or created) record during a tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordDisposition {
    /// No record of the right type existed; one was created
    Created {
        /// Provider-assigned id of the new record
        record_id: String,
        /// Address the record was created with
        address: IpAddr,
    },

    /// An existing record held a different address and was rewritten
    Updated {
        /// Id of the rewritten record
        record_id: String,
        /// Content the record held before the update
        previous: String,
        /// Address written
        address: IpAddr,
    },

    /// An existing record already held the address; no API call was made
    Unchanged {
        /// Id of the matching record
        record_id: String,
        /// The address both sides agree on
        address: IpAddr,
    },

    /// A record of the wrong family was returned and left untouched
    Ignored {
        /// Id of the ignored record
        record_id: String,
        /// The record's actual type
        record_type: RecordType,
    },
}

/// Outcome of one reconciliation tick
#[derive(Debug, Clone, Default)]
pub struct TickOutcome {
    /// Per-record dispositions, in provider listing order (a trailing
    /// `Created` entry when the create path ran)
    pub dispositions: Vec<RecordDisposition>,
}

impl TickOutcome {
    /// Number of mutating provider calls this tick performed
    pub fn mutation_count(&self) -> usize {
        self.dispositions
            .iter()
            .filter(|d| {
                matches!(
                    d,
                    RecordDisposition::Created { .. } | RecordDisposition::Updated { .. }
                )
            })
            .count()
    }
}

/// The record-reconciliation state machine
///
/// Holds the desired `(fqdn, record_type)` target and the zone resolved at
/// startup; the address arrives fresh with every [`reconcile`] call.
///
/// [`reconcile`]: Reconciler::reconcile
pub struct Reconciler {
    provider: Arc<dyn DnsProvider>,
    zone: ZoneRef,
    fqdn: String,
    record_type: RecordType,
}

impl Reconciler {
    /// Create a reconciler for one `(fqdn, record_type)` target
    pub fn new(
        provider: Arc<dyn DnsProvider>,
        zone: ZoneRef,
        fqdn: impl Into<String>,
        record_type: RecordType,
    ) -> Self {
        Self {
            provider,
            zone,
            fqdn: fqdn.into(),
            record_type,
        }
    }

    /// The fully-qualified name this reconciler manages
    pub fn fqdn(&self) -> &str {
        &self.fqdn
    }

    /// The record type this reconciler manages
    pub fn record_type(&self) -> RecordType {
        self.record_type
    }

    /// Run one reconciliation tick against the given desired address
    ///
    /// Fetches the provider's current records for the target and walks them
    /// in provider order. Errors from mutating calls propagate immediately;
    /// the caller retries on its next tick with a fresh listing, so no
    /// partial state survives a failure.
    pub async fn reconcile(&self, address: IpAddr) -> Result<TickOutcome> {
        let observed = self
            .provider
            .list_records(&self.zone.id, &self.fqdn, self.record_type)
            .await?;

        let mut dispositions = Vec::with_capacity(observed.len() + 1);
        let mut processed = false;

        for record in observed {
            // Defensive: the listing is already filtered by type, but a
            // permissive provider must still never see a cross-family update.
            if record.record_type != self.record_type {
                info!(
                    "IGNORED: {} {} ; wrong address family",
                    self.fqdn, record.content
                );
                dispositions.push(RecordDisposition::Ignored {
                    record_id: record.id,
                    record_type: record.record_type,
                });
                continue;
            }

            // Parsed comparison: textual variants of the same address
            // (IPv6 zero compression, case) count as matching.
            if record.content.parse::<IpAddr>().ok() == Some(address) {
                info!("UNCHANGED: {} {}", self.fqdn, address);
                dispositions.push(RecordDisposition::Unchanged {
                    record_id: record.id,
                    address,
                });
                processed = true;
                continue;
            }

            self.provider
                .update_record(
                    &self.zone.id,
                    &record.id,
                    &self.fqdn,
                    self.record_type,
                    address,
                    record.proxied,
                )
                .await?;
            info!("UPDATED: {} {} -> {}", self.fqdn, record.content, address);
            dispositions.push(RecordDisposition::Updated {
                record_id: record.id,
                previous: record.content,
                address,
            });
            processed = true;
        }

        if !processed {
            let created = self
                .provider
                .create_record(&self.zone.id, &self.fqdn, self.record_type, address)
                .await?;
            info!("CREATED: {} {}", self.fqdn, address);
            dispositions.push(RecordDisposition::Created {
                record_id: created.id,
                address,
            });
        }

        Ok(TickOutcome { dispositions })
    }
}
