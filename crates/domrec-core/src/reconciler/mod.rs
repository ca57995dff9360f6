//! Reconciliation engine
//!
//! The Reconciler converges remote state toward desired state, one identity
//! at a time, through five host-driven operations:
//!
//! - **Create**: validate locally, write remotely, then read back to
//!   populate computed fields
//! - **Read**: refresh observed state; a remote 404 becomes `Absent`, not an
//!   error (that is the drift-detection contract)
//! - **Update**: refuse identity-bearing field changes, send one full
//!   snapshot, then read back
//! - **Delete**: idempotent — deleting an already-absent resource succeeds
//! - **Import**: decode an identifier, read, and adopt the remote state
//!   verbatim
//!
//! ## Normalization
//!
//! Order-irrelevant multi-value fields (record values, forward destinations)
//! are sorted lexicographically on both write and read, so two reads of
//! logically-identical remote state are byte-identical and the host's
//! diffing never reports spurious changes from ordering alone.
//!
//! ## Concurrency
//!
//! One lifecycle operation per identity at a time; the host serializes. The
//! engine takes `&self`, commits no local bookkeeping before a call's result
//! is known, and is therefore safe to cancel cooperatively: dropping an
//! in-flight operation leaves local state unchanged.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Operation, ReconcileError, RemoteFailure, Result};
use crate::identity::{ForwardId, RecordId, RedirectionId};
use crate::resources::{
    DnsRecord, DnsRecordSpec, Domain, EmailForward, EmailForwardSpec, WebRedirection,
    WebRedirectionSpec,
};
use crate::traits::{
    ForwardWrite, GatewayError, RecordWrite, RedirectionUpdate, RedirectionWrite, RemoteGateway,
};
use crate::validate;
use crate::validate::Violations;

/// Reconciliation state of one managed identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "observed", rename_all = "snake_case")]
pub enum ResourceState<T> {
    /// Desired but not yet created remotely
    Planned,
    /// Confirmed to exist remotely; observed fields populated
    Present(T),
    /// Confirmed not to exist remotely
    Absent,
}

impl<T> ResourceState<T> {
    /// Whether the resource is confirmed present
    pub fn is_present(&self) -> bool {
        matches!(self, ResourceState::Present(_))
    }

    /// Whether the resource is confirmed absent
    pub fn is_absent(&self) -> bool {
        matches!(self, ResourceState::Absent)
    }

    /// Borrow the observed record, if present
    pub fn as_present(&self) -> Option<&T> {
        match self {
            ResourceState::Present(observed) => Some(observed),
            _ => None,
        }
    }

    /// Consume the state, yielding the observed record if present
    pub fn into_present(self) -> Option<T> {
        match self {
            ResourceState::Present(observed) => Some(observed),
            _ => None,
        }
    }
}

/// Outcome of a Create or Update whose write succeeded.
///
/// The mandatory read-after-write is best-effort: when it fails, `state` is
/// seeded from the desired spec (computed fields unpopulated) and
/// `refresh_error` carries the classified failure. The write itself is never
/// reported as failed because of a refresh problem.
#[derive(Debug)]
pub struct WriteOutcome<T> {
    /// State after the write and refresh
    pub state: ResourceState<T>,
    /// Error from the post-write refresh, if it failed
    pub refresh_error: Option<ReconcileError>,
}

impl<T> WriteOutcome<T> {
    fn clean(state: ResourceState<T>) -> Self {
        Self {
            state,
            refresh_error: None,
        }
    }

    fn degraded(state: ResourceState<T>, refresh_error: ReconcileError) -> Self {
        Self {
            state,
            refresh_error: Some(refresh_error),
        }
    }
}

fn remote_err(operation: Operation, identity: &str, err: GatewayError) -> ReconcileError {
    ReconcileError::remote(operation, identity, RemoteFailure::classify(&err))
}

/// The reconciliation engine
///
/// Holds the remote gateway and nothing else: all state lives with the host,
/// which passes identities and desired specs in and persists the returned
/// [`ResourceState`] values.
pub struct Reconciler {
    gateway: Arc<dyn RemoteGateway>,
}

impl Reconciler {
    /// Create a reconciler over a remote gateway
    pub fn new(gateway: Arc<dyn RemoteGateway>) -> Self {
        Self { gateway }
    }

    // ---- domains (read-only) ----

    /// Refresh a registered domain by FQDN.
    ///
    /// A remote 404 yields `Absent` without error; the domain variant has no
    /// write lifecycle.
    pub async fn read_domain(&self, fqdn: &str) -> Result<ResourceState<Domain>> {
        match self.gateway.get_domain(fqdn).await {
            Ok(found) => {
                debug!("read domain {}", fqdn);
                Ok(ResourceState::Present(Domain {
                    fqdn: found.fqdn,
                    nameservers: found.nameservers,
                }))
            }
            Err(err) => match RemoteFailure::classify(&err) {
                RemoteFailure::NotFound => {
                    warn!("domain {} not found remotely", fqdn);
                    Ok(ResourceState::Absent)
                }
                failure => Err(ReconcileError::remote(Operation::Read, fqdn, failure)),
            },
        }
    }

    /// Adopt a registered domain into management by FQDN
    pub async fn import_domain(&self, fqdn: &str) -> Result<Domain> {
        match self.read_domain(fqdn).await? {
            ResourceState::Present(domain) => Ok(domain),
            _ => Err(ReconcileError::remote(
                Operation::Import,
                fqdn,
                RemoteFailure::NotFound,
            )),
        }
    }

    // ---- DNS records ----

    /// Create a DNS record from desired state
    pub async fn create_record(&self, spec: &DnsRecordSpec) -> Result<WriteOutcome<DnsRecord>> {
        let id = RecordId::new(&spec.zone, &spec.name, &spec.rtype);
        let identity = id.encode();

        let violations = validate::record_spec(spec);
        if !violations.is_empty() {
            return Err(ReconcileError::validation(identity, violations));
        }

        let values = sorted(&spec.values);
        let write = RecordWrite {
            name: spec.name.clone(),
            rtype: spec.rtype.clone(),
            ttl: spec.ttl,
            values: values.clone(),
        };
        self.gateway
            .create_record(&spec.zone, &write)
            .await
            .map_err(|e| remote_err(Operation::Create, &identity, e))?;
        info!("created record {}", identity);

        let seeded = DnsRecord {
            zone: spec.zone.clone(),
            name: spec.name.clone(),
            rtype: spec.rtype.clone(),
            ttl: spec.ttl,
            href: None,
            values,
        };
        Ok(self.refresh_record(&id, seeded).await)
    }

    /// Refresh a DNS record by identity
    pub async fn read_record(&self, id: &RecordId) -> Result<ResourceState<DnsRecord>> {
        let identity = id.encode();
        match self.gateway.get_record(&id.zone, &id.name, &id.rtype).await {
            Ok(found) => {
                debug!("read record {}", identity);
                Ok(ResourceState::Present(DnsRecord {
                    zone: id.zone.clone(),
                    name: found.name,
                    rtype: found.rtype,
                    ttl: Some(found.ttl),
                    href: Some(found.href),
                    values: sorted(&found.values),
                }))
            }
            Err(err) => match RemoteFailure::classify(&err) {
                RemoteFailure::NotFound => {
                    warn!("record {} not found remotely, marking absent", identity);
                    Ok(ResourceState::Absent)
                }
                failure => Err(ReconcileError::remote(Operation::Read, identity, failure)),
            },
        }
    }

    /// Update a DNS record in place.
    ///
    /// The zone, name and type are identity-bearing and immutable: there is
    /// no remote rename, so a change in any of them is refused before any
    /// remote call (destroy and recreate instead). The remaining fields are
    /// always sent as one full snapshot.
    pub async fn update_record(
        &self,
        id: &RecordId,
        spec: &DnsRecordSpec,
    ) -> Result<WriteOutcome<DnsRecord>> {
        let identity = id.encode();

        let mut violations = Violations::new();
        if spec.zone != id.zone {
            violations.push("zone", "cannot be changed in place; destroy and recreate");
        }
        if spec.name != id.name {
            violations.push("name", "cannot be changed in place; destroy and recreate");
        }
        if spec.rtype != id.rtype {
            violations.push("type", "cannot be changed in place; destroy and recreate");
        }
        if !violations.is_empty() {
            return Err(ReconcileError::validation(identity, violations));
        }

        let violations = validate::record_spec(spec);
        if !violations.is_empty() {
            return Err(ReconcileError::validation(identity, violations));
        }

        let values = sorted(&spec.values);
        self.gateway
            .update_record(&id.zone, &id.name, &id.rtype, spec.ttl, &values)
            .await
            .map_err(|e| remote_err(Operation::Update, &identity, e))?;
        info!("updated record {}", identity);

        let seeded = DnsRecord {
            zone: id.zone.clone(),
            name: id.name.clone(),
            rtype: id.rtype.clone(),
            ttl: spec.ttl,
            href: None,
            values,
        };
        Ok(self.refresh_record(id, seeded).await)
    }

    /// Delete a DNS record. Deleting an already-absent record succeeds.
    pub async fn delete_record(&self, id: &RecordId) -> Result<()> {
        let identity = id.encode();
        match self.gateway.delete_record(&id.zone, &id.name, &id.rtype).await {
            Ok(()) => {
                info!("deleted record {}", identity);
                Ok(())
            }
            Err(err) => match RemoteFailure::classify(&err) {
                RemoteFailure::NotFound => {
                    debug!("record {} already absent", identity);
                    Ok(())
                }
                failure => Err(ReconcileError::remote(Operation::Delete, identity, failure)),
            },
        }
    }

    /// Adopt a DNS record into management from its identifier.
    ///
    /// The normalized remote response becomes the local state verbatim; an
    /// absent record cannot be adopted and fails with not-found.
    pub async fn import_record(&self, raw: &str) -> Result<DnsRecord> {
        let id = RecordId::decode(raw)?;
        match self.read_record(&id).await? {
            ResourceState::Present(record) => {
                info!("imported record {}", raw);
                Ok(record)
            }
            _ => Err(ReconcileError::remote(
                Operation::Import,
                raw,
                RemoteFailure::NotFound,
            )),
        }
    }

    async fn refresh_record(&self, id: &RecordId, seeded: DnsRecord) -> WriteOutcome<DnsRecord> {
        match self.read_record(id).await {
            Ok(state @ ResourceState::Present(_)) => WriteOutcome::clean(state),
            Ok(_) => {
                // A 404 immediately after a successful write is eventual
                // visibility, not deletion: keep the seeded state and
                // surface the refresh miss.
                warn!("record {} not yet visible after write", id.encode());
                WriteOutcome::degraded(
                    ResourceState::Present(seeded),
                    ReconcileError::remote(Operation::Read, id.encode(), RemoteFailure::NotFound),
                )
            }
            Err(err) => {
                warn!("refresh of record {} failed: {}", id.encode(), err);
                WriteOutcome::degraded(ResourceState::Present(seeded), err)
            }
        }
    }

    // ---- web redirections ----

    /// Create a web redirection from desired state.
    ///
    /// When the spec carries no explicit domain, the registrable domain is
    /// derived from the host (last two labels). The host must end with the
    /// resolved domain.
    pub async fn create_redirection(
        &self,
        spec: &WebRedirectionSpec,
    ) -> Result<WriteOutcome<WebRedirection>> {
        let id = RedirectionId::new(&spec.host);
        let identity = id.encode();

        let violations = validate::redirection_spec(spec);
        if !violations.is_empty() {
            return Err(ReconcileError::validation(identity, violations));
        }

        let domain = resolve_domain(&id, spec.domain.as_deref())?;
        check_host_suffix(&identity, &spec.host, &domain)?;

        let write = RedirectionWrite {
            host: spec.host.clone(),
            url: spec.url.clone(),
            protocol: spec.protocol.clone(),
            kind: spec.kind.clone(),
            override_existing: spec.override_existing,
        };
        self.gateway
            .create_redirection(&domain, &write)
            .await
            .map_err(|e| remote_err(Operation::Create, &identity, e))?;
        info!("created redirection {} under {}", identity, domain);

        let seeded = WebRedirection {
            domain: domain.clone(),
            host: spec.host.clone(),
            url: spec.url.clone(),
            override_existing: spec.override_existing,
            protocol: spec.protocol.clone(),
            kind: spec.kind.clone(),
            cert_status: None,
            cert_uuid: None,
        };
        Ok(self
            .refresh_redirection(&id, &domain, spec.override_existing, seeded)
            .await)
    }

    /// Refresh a web redirection by identity.
    ///
    /// `domain` is the explicit domain when the caller tracks one; `None`
    /// falls back to derivation from the host.
    pub async fn read_redirection(
        &self,
        id: &RedirectionId,
        domain: Option<&str>,
    ) -> Result<ResourceState<WebRedirection>> {
        self.read_redirection_with(id, domain, false).await
    }

    async fn read_redirection_with(
        &self,
        id: &RedirectionId,
        domain: Option<&str>,
        override_existing: bool,
    ) -> Result<ResourceState<WebRedirection>> {
        let identity = id.encode();
        let domain = resolve_domain(id, domain)?;
        check_host_suffix(&identity, &id.host, &domain)?;

        match self.gateway.get_redirection(&domain, &id.host).await {
            Ok(found) => {
                debug!("read redirection {}", identity);
                Ok(ResourceState::Present(WebRedirection {
                    domain,
                    host: found.host,
                    url: found.url,
                    override_existing,
                    protocol: found.protocol,
                    kind: found.kind,
                    cert_status: Some(found.cert_status),
                    cert_uuid: found.cert_uuid,
                }))
            }
            Err(err) => match RemoteFailure::classify(&err) {
                RemoteFailure::NotFound => {
                    warn!("redirection {} not found remotely, marking absent", identity);
                    Ok(ResourceState::Absent)
                }
                failure => Err(ReconcileError::remote(Operation::Read, identity, failure)),
            },
        }
    }

    /// Update a web redirection in place.
    ///
    /// The host is identity-bearing and immutable; the target URL, protocol,
    /// type and override flag are sent as one full snapshot.
    pub async fn update_redirection(
        &self,
        id: &RedirectionId,
        spec: &WebRedirectionSpec,
    ) -> Result<WriteOutcome<WebRedirection>> {
        let identity = id.encode();

        if spec.host != id.host {
            let mut violations = Violations::new();
            violations.push("host", "cannot be changed in place; destroy and recreate");
            return Err(ReconcileError::validation(identity, violations));
        }

        let violations = validate::redirection_spec(spec);
        if !violations.is_empty() {
            return Err(ReconcileError::validation(identity, violations));
        }

        let domain = resolve_domain(id, spec.domain.as_deref())?;
        check_host_suffix(&identity, &id.host, &domain)?;

        let update = RedirectionUpdate {
            url: spec.url.clone(),
            protocol: spec.protocol.clone(),
            kind: spec.kind.clone(),
            override_existing: spec.override_existing,
        };
        self.gateway
            .update_redirection(&domain, &id.host, &update)
            .await
            .map_err(|e| remote_err(Operation::Update, &identity, e))?;
        info!("updated redirection {}", identity);

        let seeded = WebRedirection {
            domain: domain.clone(),
            host: id.host.clone(),
            url: spec.url.clone(),
            override_existing: spec.override_existing,
            protocol: spec.protocol.clone(),
            kind: spec.kind.clone(),
            cert_status: None,
            cert_uuid: None,
        };
        Ok(self
            .refresh_redirection(id, &domain, spec.override_existing, seeded)
            .await)
    }

    /// Delete a web redirection. Deleting an already-absent redirection
    /// succeeds.
    pub async fn delete_redirection(
        &self,
        id: &RedirectionId,
        domain: Option<&str>,
    ) -> Result<()> {
        let identity = id.encode();
        let domain = resolve_domain(id, domain)?;

        match self.gateway.delete_redirection(&domain, &id.host).await {
            Ok(()) => {
                info!("deleted redirection {}", identity);
                Ok(())
            }
            Err(err) => match RemoteFailure::classify(&err) {
                RemoteFailure::NotFound => {
                    debug!("redirection {} already absent", identity);
                    Ok(())
                }
                failure => Err(ReconcileError::remote(Operation::Delete, identity, failure)),
            },
        }
    }

    /// Adopt a web redirection into management from its identifier (the
    /// host; the domain is derived).
    pub async fn import_redirection(&self, raw: &str) -> Result<WebRedirection> {
        let id = RedirectionId::decode(raw)?;
        match self.read_redirection(&id, None).await? {
            ResourceState::Present(redirection) => {
                info!("imported redirection {}", raw);
                Ok(redirection)
            }
            _ => Err(ReconcileError::remote(
                Operation::Import,
                raw,
                RemoteFailure::NotFound,
            )),
        }
    }

    async fn refresh_redirection(
        &self,
        id: &RedirectionId,
        domain: &str,
        override_existing: bool,
        seeded: WebRedirection,
    ) -> WriteOutcome<WebRedirection> {
        match self
            .read_redirection_with(id, Some(domain), override_existing)
            .await
        {
            Ok(state @ ResourceState::Present(_)) => WriteOutcome::clean(state),
            Ok(_) => {
                warn!("redirection {} not yet visible after write", id.encode());
                WriteOutcome::degraded(
                    ResourceState::Present(seeded),
                    ReconcileError::remote(Operation::Read, id.encode(), RemoteFailure::NotFound),
                )
            }
            Err(err) => {
                warn!("refresh of redirection {} failed: {}", id.encode(), err);
                WriteOutcome::degraded(ResourceState::Present(seeded), err)
            }
        }
    }

    // ---- email forwards ----

    /// Create an email forward from desired state. Destinations are sorted
    /// before the write.
    pub async fn create_forward(
        &self,
        spec: &EmailForwardSpec,
    ) -> Result<WriteOutcome<EmailForward>> {
        let violations = validate::forward_spec(spec);
        if !violations.is_empty() {
            return Err(ReconcileError::validation(&spec.source, violations));
        }

        // Infallible after source validation
        let id = ForwardId::decode(&spec.source)?;
        let identity = id.encode();

        let destinations = sorted(&spec.destinations);
        let write = ForwardWrite {
            source: id.local.clone(),
            destinations: destinations.clone(),
        };
        self.gateway
            .create_forward(&id.domain, &write)
            .await
            .map_err(|e| remote_err(Operation::Create, &identity, e))?;
        info!("created forward {}", identity);

        let seeded = EmailForward {
            source: identity.clone(),
            destinations,
        };
        Ok(self.refresh_forward(&id, seeded).await)
    }

    /// Refresh an email forward by identity
    pub async fn read_forward(&self, id: &ForwardId) -> Result<ResourceState<EmailForward>> {
        let identity = id.encode();
        match self.gateway.get_forward(&id.domain, &id.local).await {
            Ok(found) => {
                debug!("read forward {}", identity);
                Ok(ResourceState::Present(EmailForward {
                    source: identity,
                    destinations: sorted(&found.destinations),
                }))
            }
            Err(err) => match RemoteFailure::classify(&err) {
                RemoteFailure::NotFound => {
                    warn!("forward {} not found remotely, marking absent", identity);
                    Ok(ResourceState::Absent)
                }
                failure => Err(ReconcileError::remote(Operation::Read, identity, failure)),
            },
        }
    }

    /// Update an email forward in place.
    ///
    /// The source is identity-bearing and immutable; the destination set is
    /// sent as one full snapshot, sorted.
    pub async fn update_forward(
        &self,
        id: &ForwardId,
        spec: &EmailForwardSpec,
    ) -> Result<WriteOutcome<EmailForward>> {
        let identity = id.encode();

        if spec.source != identity {
            let mut violations = Violations::new();
            violations.push("source", "cannot be changed in place; destroy and recreate");
            return Err(ReconcileError::validation(identity, violations));
        }

        let violations = validate::forward_spec(spec);
        if !violations.is_empty() {
            return Err(ReconcileError::validation(identity, violations));
        }

        let destinations = sorted(&spec.destinations);
        self.gateway
            .update_forward(&id.domain, &id.local, &destinations)
            .await
            .map_err(|e| remote_err(Operation::Update, &identity, e))?;
        info!("updated forward {}", identity);

        let seeded = EmailForward {
            source: identity,
            destinations,
        };
        Ok(self.refresh_forward(id, seeded).await)
    }

    /// Delete an email forward. Deleting an already-absent forward succeeds.
    pub async fn delete_forward(&self, id: &ForwardId) -> Result<()> {
        let identity = id.encode();
        match self.gateway.delete_forward(&id.domain, &id.local).await {
            Ok(()) => {
                info!("deleted forward {}", identity);
                Ok(())
            }
            Err(err) => match RemoteFailure::classify(&err) {
                RemoteFailure::NotFound => {
                    debug!("forward {} already absent", identity);
                    Ok(())
                }
                failure => Err(ReconcileError::remote(Operation::Delete, identity, failure)),
            },
        }
    }

    /// Adopt an email forward into management from its identifier
    pub async fn import_forward(&self, raw: &str) -> Result<EmailForward> {
        let id = ForwardId::decode(raw)?;
        match self.read_forward(&id).await? {
            ResourceState::Present(forward) => {
                info!("imported forward {}", raw);
                Ok(forward)
            }
            _ => Err(ReconcileError::remote(
                Operation::Import,
                raw,
                RemoteFailure::NotFound,
            )),
        }
    }

    async fn refresh_forward(&self, id: &ForwardId, seeded: EmailForward) -> WriteOutcome<EmailForward> {
        match self.read_forward(id).await {
            Ok(state @ ResourceState::Present(_)) => WriteOutcome::clean(state),
            Ok(_) => {
                warn!("forward {} not yet visible after write", id.encode());
                WriteOutcome::degraded(
                    ResourceState::Present(seeded),
                    ReconcileError::remote(Operation::Read, id.encode(), RemoteFailure::NotFound),
                )
            }
            Err(err) => {
                warn!("refresh of forward {} failed: {}", id.encode(), err);
                WriteOutcome::degraded(ResourceState::Present(seeded), err)
            }
        }
    }
}

/// Resolve the registrable domain of a redirection: the explicit domain when
/// one is given, otherwise derived from the host.
fn resolve_domain(id: &RedirectionId, explicit: Option<&str>) -> Result<String> {
    match explicit {
        Some(domain) if !domain.is_empty() => Ok(domain.to_string()),
        _ => id.derive_domain(),
    }
}

fn check_host_suffix(identity: &str, host: &str, domain: &str) -> Result<()> {
    if !host.ends_with(domain) {
        let mut violations = Violations::new();
        violations.push(
            "host",
            format!(
                "the host {:?} does not end with the domain name {:?}",
                host, domain
            ),
        );
        return Err(ReconcileError::validation(identity, violations));
    }
    Ok(())
}

fn sorted(values: &[String]) -> Vec<String> {
    let mut values = values.to_vec();
    values.sort();
    values
}
