//! Test doubles for the reconciliation contract tests
//!
//! A counting fake provider (deliberately permissive: it returns whatever
//! records it was seeded with, even of the wrong type) and a scripted
//! address source. No real functionality, no network.

#![allow(dead_code)]

use async_trait::async_trait;
use dnspin_core::error::{Error, Result};
use dnspin_core::traits::{
    AddressFamily, AddressSource, DnsProvider, ObservedRecord, RecordRef, RecordType, ZoneRef,
};
use std::collections::VecDeque;
use std::net::IpAddr;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// The zone every test reconciles into
pub fn test_zone() -> ZoneRef {
    ZoneRef {
        id: "zone-1".to_string(),
        name: "example.com".to_string(),
    }
}

/// One recorded `update_record` invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedUpdate {
    pub record_id: String,
    pub address: IpAddr,
    pub proxied: bool,
}

/// A fake DnsProvider that tracks calls and applies mutations to an
/// in-memory record table
pub struct FakeDnsProvider {
    records: Mutex<Vec<ObservedRecord>>,
    list_calls: AtomicUsize,
    create_calls: AtomicUsize,
    update_calls: AtomicUsize,
    update_log: Mutex<Vec<RecordedUpdate>>,
    fail_updates: AtomicBool,
    next_id: AtomicUsize,
}

impl FakeDnsProvider {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            list_calls: AtomicUsize::new(0),
            create_calls: AtomicUsize::new(0),
            update_calls: AtomicUsize::new(0),
            update_log: Mutex::new(Vec::new()),
            fail_updates: AtomicBool::new(false),
            next_id: AtomicUsize::new(1),
        }
    }

    /// Seed an existing record; returns its id
    pub fn seed(&self, record_type: RecordType, content: &str, proxied: bool) -> String {
        let id = format!("rec-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        self.records.lock().unwrap().push(ObservedRecord {
            id: id.clone(),
            record_type,
            content: content.to_string(),
            proxied,
        });
        id
    }

    /// Make subsequent `update_record` calls fail (or stop failing)
    pub fn fail_updates(&self, fail: bool) {
        self.fail_updates.store(fail, Ordering::SeqCst);
    }

    pub fn list_call_count(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn create_call_count(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn update_call_count(&self) -> usize {
        self.update_calls.load(Ordering::SeqCst)
    }

    /// Every successful update, in call order
    pub fn recorded_updates(&self) -> Vec<RecordedUpdate> {
        self.update_log.lock().unwrap().clone()
    }

    /// Snapshot of the provider's current record table
    pub fn records(&self) -> Vec<ObservedRecord> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait]
impl DnsProvider for FakeDnsProvider {
    async fn verify_credentials(&self) -> Result<bool> {
        Ok(true)
    }

    async fn find_zone(&self, zone_name: &str) -> Result<Option<ZoneRef>> {
        Ok(Some(ZoneRef {
            id: "zone-1".to_string(),
            name: zone_name.to_string(),
        }))
    }

    async fn list_records(
        &self,
        _zone_id: &str,
        _fqdn: &str,
        _record_type: RecordType,
    ) -> Result<Vec<ObservedRecord>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        // Permissive on purpose: no type filtering, so the reconciler's own
        // family-isolation check is what the tests exercise.
        Ok(self.records.lock().unwrap().clone())
    }

    async fn create_record(
        &self,
        _zone_id: &str,
        fqdn: &str,
        record_type: RecordType,
        address: IpAddr,
    ) -> Result<RecordRef> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        let id = format!("rec-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        self.records.lock().unwrap().push(ObservedRecord {
            id: id.clone(),
            record_type,
            content: address.to_string(),
            proxied: false,
        });
        Ok(RecordRef {
            id,
            fqdn: fqdn.to_string(),
            record_type,
            proxied: false,
        })
    }

    async fn update_record(
        &self,
        _zone_id: &str,
        record_id: &str,
        fqdn: &str,
        record_type: RecordType,
        address: IpAddr,
        proxied: bool,
    ) -> Result<RecordRef> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);

        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(Error::provider("fake", "injected update failure"));
        }

        self.update_log.lock().unwrap().push(RecordedUpdate {
            record_id: record_id.to_string(),
            address,
            proxied,
        });

        let mut records = self.records.lock().unwrap();
        let record = records
            .iter_mut()
            .find(|r| r.id == record_id)
            .ok_or_else(|| Error::provider("fake", format!("no such record: {record_id}")))?;
        record.content = address.to_string();
        record.proxied = proxied;

        Ok(RecordRef {
            id: record_id.to_string(),
            fqdn: fqdn.to_string(),
            record_type,
            proxied,
        })
    }

    fn provider_name(&self) -> &'static str {
        "fake"
    }
}

/// A scripted AddressSource: answers are popped in order, and once the
/// script runs dry every call fails (or repeats a fixed address)
pub struct FakeAddressSource {
    script: Mutex<VecDeque<Result<IpAddr>>>,
    repeat: Option<IpAddr>,
    discover_calls: AtomicUsize,
}

impl FakeAddressSource {
    /// Pop scripted answers, then fail forever
    pub fn scripted(script: Vec<Result<IpAddr>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            repeat: None,
            discover_calls: AtomicUsize::new(0),
        }
    }

    /// Always return the same address
    pub fn always(address: IpAddr) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            repeat: Some(address),
            discover_calls: AtomicUsize::new(0),
        }
    }

    /// Fail every discovery
    pub fn always_failing() -> Self {
        Self::scripted(Vec::new())
    }

    /// A scripted discovery failure entry
    pub fn failure() -> Result<IpAddr> {
        Err(Error::discovery("injected discovery failure"))
    }

    pub fn discover_call_count(&self) -> usize {
        self.discover_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AddressSource for FakeAddressSource {
    async fn discover(&self, _family: AddressFamily) -> Result<IpAddr> {
        self.discover_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(answer) = self.script.lock().unwrap().pop_front() {
            return answer;
        }

        match self.repeat {
            Some(address) => Ok(address),
            None => Err(Error::discovery("script exhausted")),
        }
    }

    fn source_name(&self) -> &'static str {
        "fake"
    }
}
