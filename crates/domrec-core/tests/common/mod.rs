//! Test doubles and common utilities for architecture contract tests
//!
//! `MockGateway` behaves as a small in-memory remote service: creates insert
//! into maps (applying the server-side defaults a real service would, such
//! as a default TTL), gets read from them, deletes remove from them and
//! report 404 when nothing was there. Failures can be injected per call
//! kind, and every call is counted so tests can assert that an operation
//! touched the gateway exactly as often as the contract allows.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use domrec_core::traits::{
    DomainInfo, ForwardInfo, ForwardWrite, GatewayError, GatewayResult, RecordInfo, RecordWrite,
    RedirectionInfo, RedirectionUpdate, RedirectionWrite, RemoteGateway,
};

/// TTL the mock "server" assigns when a write carries none
pub const DEFAULT_TTL: u32 = 10800;

#[derive(Default)]
pub struct MockGateway {
    domains: Mutex<HashMap<String, DomainInfo>>,
    records: Mutex<HashMap<(String, String, String), RecordInfo>>,
    redirections: Mutex<HashMap<(String, String), RedirectionInfo>>,
    forwards: Mutex<HashMap<(String, String), ForwardInfo>>,

    fail_next_get: Mutex<VecDeque<GatewayError>>,
    fail_next_create: Mutex<VecDeque<GatewayError>>,
    fail_next_update: Mutex<VecDeque<GatewayError>>,
    fail_next_delete: Mutex<VecDeque<GatewayError>>,

    get_calls: AtomicUsize,
    create_calls: AtomicUsize,
    update_calls: AtomicUsize,
    delete_calls: AtomicUsize,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    // -- scripting --

    pub fn insert_domain(&self, fqdn: &str, nameservers: &[&str]) {
        self.domains.lock().unwrap().insert(
            fqdn.to_string(),
            DomainInfo {
                fqdn: fqdn.to_string(),
                nameservers: nameservers.iter().map(|s| s.to_string()).collect(),
            },
        );
    }

    /// Insert a record exactly as given (values kept in the given order, so
    /// tests can verify read-side normalization)
    pub fn insert_record(&self, zone: &str, name: &str, rtype: &str, ttl: u32, values: &[&str]) {
        self.records.lock().unwrap().insert(
            (zone.to_string(), name.to_string(), rtype.to_string()),
            RecordInfo {
                name: name.to_string(),
                rtype: rtype.to_string(),
                ttl,
                href: record_href(zone, name, rtype),
                values: values.iter().map(|s| s.to_string()).collect(),
            },
        );
    }

    pub fn insert_redirection(
        &self,
        domain: &str,
        host: &str,
        url: &str,
        protocol: &str,
        kind: &str,
    ) {
        self.redirections.lock().unwrap().insert(
            (domain.to_string(), host.to_string()),
            RedirectionInfo {
                host: host.to_string(),
                url: url.to_string(),
                protocol: protocol.to_string(),
                kind: kind.to_string(),
                cert_status: "active".to_string(),
                cert_uuid: Some("3e38e726-a279-4e9c-bd9f-e44a9e63d723".to_string()),
            },
        );
    }

    /// Insert a forward exactly as given (destinations kept in the given
    /// order)
    pub fn insert_forward(&self, domain: &str, source: &str, destinations: &[&str]) {
        self.forwards.lock().unwrap().insert(
            (domain.to_string(), source.to_string()),
            ForwardInfo {
                source: source.to_string(),
                destinations: destinations.iter().map(|s| s.to_string()).collect(),
            },
        );
    }

    /// Drop a forward behind the engine's back (out-of-band deletion)
    pub fn remove_forward(&self, domain: &str, source: &str) {
        self.forwards
            .lock()
            .unwrap()
            .remove(&(domain.to_string(), source.to_string()));
    }

    pub fn fail_next_get(&self, err: GatewayError) {
        self.fail_next_get.lock().unwrap().push_back(err);
    }

    pub fn fail_next_create(&self, err: GatewayError) {
        self.fail_next_create.lock().unwrap().push_back(err);
    }

    pub fn fail_next_update(&self, err: GatewayError) {
        self.fail_next_update.lock().unwrap().push_back(err);
    }

    pub fn fail_next_delete(&self, err: GatewayError) {
        self.fail_next_delete.lock().unwrap().push_back(err);
    }

    // -- inspection --

    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn update_calls(&self) -> usize {
        self.update_calls.load(Ordering::SeqCst)
    }

    pub fn delete_calls(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        self.get_calls() + self.create_calls() + self.update_calls() + self.delete_calls()
    }

    /// The record as the mock service stores it (write-side view)
    pub fn stored_record(&self, zone: &str, name: &str, rtype: &str) -> Option<RecordInfo> {
        self.records
            .lock()
            .unwrap()
            .get(&(zone.to_string(), name.to_string(), rtype.to_string()))
            .cloned()
    }

    pub fn stored_redirection(&self, domain: &str, host: &str) -> Option<RedirectionInfo> {
        self.redirections
            .lock()
            .unwrap()
            .get(&(domain.to_string(), host.to_string()))
            .cloned()
    }

    pub fn stored_forward(&self, domain: &str, source: &str) -> Option<ForwardInfo> {
        self.forwards
            .lock()
            .unwrap()
            .get(&(domain.to_string(), source.to_string()))
            .cloned()
    }

    fn take_failure(&self, queue: &Mutex<VecDeque<GatewayError>>) -> Option<GatewayError> {
        queue.lock().unwrap().pop_front()
    }
}

fn record_href(zone: &str, name: &str, rtype: &str) -> String {
    format!(
        "https://dns.example.net/api/v5/domains/{}/records/{}/{}",
        zone, name, rtype
    )
}

fn not_found(what: &str) -> GatewayError {
    GatewayError::status(404, format!("{} does not exist", what))
}

#[async_trait::async_trait]
impl RemoteGateway for MockGateway {
    async fn get_domain(&self, fqdn: &str) -> GatewayResult<DomainInfo> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.take_failure(&self.fail_next_get) {
            return Err(err);
        }
        self.domains
            .lock()
            .unwrap()
            .get(fqdn)
            .cloned()
            .ok_or_else(|| not_found(fqdn))
    }

    async fn get_record(&self, zone: &str, name: &str, rtype: &str) -> GatewayResult<RecordInfo> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.take_failure(&self.fail_next_get) {
            return Err(err);
        }
        self.stored_record(zone, name, rtype)
            .ok_or_else(|| not_found(name))
    }

    async fn create_record(&self, zone: &str, record: &RecordWrite) -> GatewayResult<()> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.take_failure(&self.fail_next_create) {
            return Err(err);
        }
        let key = (
            zone.to_string(),
            record.name.clone(),
            record.rtype.clone(),
        );
        let mut records = self.records.lock().unwrap();
        if records.contains_key(&key) {
            return Err(GatewayError::status(409, "record already exists"));
        }
        records.insert(
            key,
            RecordInfo {
                name: record.name.clone(),
                rtype: record.rtype.clone(),
                ttl: record.ttl.unwrap_or(DEFAULT_TTL),
                href: record_href(zone, &record.name, &record.rtype),
                values: record.values.clone(),
            },
        );
        Ok(())
    }

    async fn update_record(
        &self,
        zone: &str,
        name: &str,
        rtype: &str,
        ttl: Option<u32>,
        values: &[String],
    ) -> GatewayResult<()> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.take_failure(&self.fail_next_update) {
            return Err(err);
        }
        let key = (zone.to_string(), name.to_string(), rtype.to_string());
        let mut records = self.records.lock().unwrap();
        match records.get_mut(&key) {
            Some(record) => {
                record.ttl = ttl.unwrap_or(DEFAULT_TTL);
                record.values = values.to_vec();
                Ok(())
            }
            None => Err(not_found(name)),
        }
    }

    async fn delete_record(&self, zone: &str, name: &str, rtype: &str) -> GatewayResult<()> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.take_failure(&self.fail_next_delete) {
            return Err(err);
        }
        let key = (zone.to_string(), name.to_string(), rtype.to_string());
        match self.records.lock().unwrap().remove(&key) {
            Some(_) => Ok(()),
            None => Err(not_found(name)),
        }
    }

    async fn get_redirection(&self, domain: &str, host: &str) -> GatewayResult<RedirectionInfo> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.take_failure(&self.fail_next_get) {
            return Err(err);
        }
        self.stored_redirection(domain, host)
            .ok_or_else(|| not_found(host))
    }

    async fn create_redirection(
        &self,
        domain: &str,
        redirection: &RedirectionWrite,
    ) -> GatewayResult<()> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.take_failure(&self.fail_next_create) {
            return Err(err);
        }
        let key = (domain.to_string(), redirection.host.clone());
        let mut redirections = self.redirections.lock().unwrap();
        if redirections.contains_key(&key) {
            return Err(GatewayError::status(409, "redirection already exists"));
        }
        let https = redirection.protocol != "http";
        redirections.insert(
            key,
            RedirectionInfo {
                host: redirection.host.clone(),
                url: redirection.url.clone(),
                protocol: redirection.protocol.clone(),
                kind: redirection.kind.clone(),
                cert_status: if https { "pending" } else { "none" }.to_string(),
                cert_uuid: https.then(|| "3e38e726-a279-4e9c-bd9f-e44a9e63d723".to_string()),
            },
        );
        Ok(())
    }

    async fn update_redirection(
        &self,
        domain: &str,
        host: &str,
        update: &RedirectionUpdate,
    ) -> GatewayResult<()> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.take_failure(&self.fail_next_update) {
            return Err(err);
        }
        let key = (domain.to_string(), host.to_string());
        let mut redirections = self.redirections.lock().unwrap();
        match redirections.get_mut(&key) {
            Some(redirection) => {
                redirection.url = update.url.clone();
                redirection.protocol = update.protocol.clone();
                redirection.kind = update.kind.clone();
                Ok(())
            }
            None => Err(not_found(host)),
        }
    }

    async fn delete_redirection(&self, domain: &str, host: &str) -> GatewayResult<()> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.take_failure(&self.fail_next_delete) {
            return Err(err);
        }
        let key = (domain.to_string(), host.to_string());
        match self.redirections.lock().unwrap().remove(&key) {
            Some(_) => Ok(()),
            None => Err(not_found(host)),
        }
    }

    async fn get_forward(&self, domain: &str, source: &str) -> GatewayResult<ForwardInfo> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.take_failure(&self.fail_next_get) {
            return Err(err);
        }
        self.stored_forward(domain, source)
            .ok_or_else(|| not_found(source))
    }

    async fn create_forward(&self, domain: &str, forward: &ForwardWrite) -> GatewayResult<()> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.take_failure(&self.fail_next_create) {
            return Err(err);
        }
        let key = (domain.to_string(), forward.source.clone());
        let mut forwards = self.forwards.lock().unwrap();
        if forwards.contains_key(&key) {
            return Err(GatewayError::status(409, "forward already exists"));
        }
        forwards.insert(
            key,
            ForwardInfo {
                source: forward.source.clone(),
                destinations: forward.destinations.clone(),
            },
        );
        Ok(())
    }

    async fn update_forward(
        &self,
        domain: &str,
        source: &str,
        destinations: &[String],
    ) -> GatewayResult<()> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.take_failure(&self.fail_next_update) {
            return Err(err);
        }
        let key = (domain.to_string(), source.to_string());
        let mut forwards = self.forwards.lock().unwrap();
        match forwards.get_mut(&key) {
            Some(forward) => {
                forward.destinations = destinations.to_vec();
                Ok(())
            }
            None => Err(not_found(source)),
        }
    }

    async fn delete_forward(&self, domain: &str, source: &str) -> GatewayResult<()> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.take_failure(&self.fail_next_delete) {
            return Err(err);
        }
        let key = (domain.to_string(), source.to_string());
        match self.forwards.lock().unwrap().remove(&key) {
            Some(_) => Ok(()),
            None => Err(not_found(source)),
        }
    }
}
