//! Tick scheduling
//!
//! The Scheduler owns the forever-loop: sleep for the configured interval
//! (plus optional jitter), pull a fresh address, reconcile. A failed
//! discovery skips the tick; a failed reconciliation is logged with an
//! `ERROR` prefix and retried from scratch on the next tick. After startup
//! the loop never exits on its own; it stops only on a shutdown signal.

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tracing::{error, info, warn};

use crate::error::Result;
use crate::reconciler::Reconciler;
use crate::traits::{AddressFamily, AddressSource};

/// Fixed-interval driver for one reconciler
pub struct Scheduler {
    source: Arc<dyn AddressSource>,
    reconciler: Reconciler,
    family: AddressFamily,
    interval: Duration,
    jitter: Duration,
}

impl Scheduler {
    /// Create a scheduler
    ///
    /// The discovery family follows the reconciler's record type. `jitter`
    /// is the upper bound of a uniform random delay added to each interval;
    /// zero disables it.
    pub fn new(
        source: Arc<dyn AddressSource>,
        reconciler: Reconciler,
        interval: Duration,
        jitter: Duration,
    ) -> Self {
        let family = reconciler.record_type().family();
        Self {
            source,
            reconciler,
            family,
            interval,
            jitter,
        }
    }

    /// Run the loop until the process receives ctrl-c
    ///
    /// `initial_address` is the address discovered during startup; it is
    /// reconciled once before the first sleep, matching the startup-then-loop
    /// flow of the daemon.
    pub async fn run(&self, initial_address: IpAddr) -> Result<()> {
        self.run_internal(initial_address, None).await
    }

    /// Test-only entry point with a controlled shutdown signal
    ///
    /// Production code uses [`run`], which stops on ctrl-c instead.
    ///
    /// [`run`]: Scheduler::run
    pub async fn run_with_shutdown(
        &self,
        initial_address: IpAddr,
        shutdown_rx: Option<tokio::sync::oneshot::Receiver<()>>,
    ) -> Result<()> {
        self.run_internal(initial_address, shutdown_rx).await
    }

    async fn run_internal(
        &self,
        initial_address: IpAddr,
        shutdown_rx: Option<tokio::sync::oneshot::Receiver<()>>,
    ) -> Result<()> {
        info!(
            "scheduling {} reconciliation every {:?} (source: {})",
            self.reconciler.fqdn(),
            self.interval,
            self.source.source_name()
        );

        self.reconcile_logging_errors(initial_address).await;

        if let Some(mut rx) = shutdown_rx {
            // Test mode: wait for the provided shutdown signal
            loop {
                tokio::select! {
                    _ = tokio::time::sleep(self.tick_delay()) => {
                        self.tick().await;
                    }
                    _ = &mut rx => {
                        info!("shutdown signal received");
                        break;
                    }
                }
            }
        } else {
            // Production mode: stop on SIGINT
            loop {
                tokio::select! {
                    _ = tokio::time::sleep(self.tick_delay()) => {
                        self.tick().await;
                    }
                    _ = tokio::signal::ctrl_c() => {
                        info!("shutdown signal received");
                        break;
                    }
                }
            }
        }

        Ok(())
    }

    /// One scheduled tick: discover, then reconcile
    ///
    /// A discovery failure skips the tick entirely; the provider is not
    /// contacted and the loop continues.
    async fn tick(&self) {
        let address = match self.source.discover(self.family).await {
            Ok(address) => address,
            Err(e) => {
                warn!(
                    "{}: no address this tick, skipping: {}",
                    self.reconciler.fqdn(),
                    e
                );
                return;
            }
        };

        self.reconcile_logging_errors(address).await;
    }

    async fn reconcile_logging_errors(&self, address: IpAddr) {
        if let Err(e) = self.reconciler.reconcile(address).await {
            // Per-tick recovery: the next tick re-fetches provider state
            // from scratch, so nothing is rolled back here.
            error!(
                "ERROR: {} reconciliation aborted: {}",
                self.reconciler.fqdn(),
                e
            );
        }
    }

    fn tick_delay(&self) -> Duration {
        if self.jitter.is_zero() {
            return self.interval;
        }
        let extra = rand::thread_rng().gen_range(0..=self.jitter.as_millis() as u64);
        self.interval + Duration::from_millis(extra)
    }
}
