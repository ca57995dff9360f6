//! Remote gateway trait
//!
//! Defines the interface to the remote REST service. The engine depends only
//! on these request/response shapes and on the error contract: the gateway
//! reports the remote status code verbatim and performs no classification,
//! no retries and no caching of its own. Retrying a non-idempotent create
//! blindly could duplicate remote resources, so retry policy belongs to the
//! gateway's caller or the host, never inside an implementation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Error reported by a gateway call.
///
/// `status` carries the remote HTTP status code verbatim when a response was
/// received; `None` means the call failed in transport before any status was
/// available. Status 404 is the sole signal for "not found" — the
/// classifier in the core relies on that and on nothing else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayError {
    /// HTTP status code of the remote response, if one was received
    pub status: Option<u16>,
    /// Error detail, remote message or transport description
    pub message: String,
}

impl GatewayError {
    /// Create an error carrying a remote status code
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            message: message.into(),
        }
    }

    /// Create a transport-level error (no status available)
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for GatewayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.status {
            Some(status) => write!(f, "remote service returned {}: {}", status, self.message),
            None => write!(f, "transport failure: {}", self.message),
        }
    }
}

impl std::error::Error for GatewayError {}

/// Convenience alias for gateway call results
pub type GatewayResult<T> = std::result::Result<T, GatewayError>;

/// Remote fields of a registered domain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainInfo {
    /// Fully qualified domain name
    pub fqdn: String,
    /// Nameservers, in remote order
    pub nameservers: Vec<String>,
}

/// Remote fields of a DNS record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordInfo {
    /// Record name relative to the zone
    pub name: String,
    /// Record type, uppercase
    pub rtype: String,
    /// TTL in seconds, server-assigned when not requested explicitly
    pub ttl: u32,
    /// API URL of the record
    pub href: String,
    /// Record values, in remote order
    pub values: Vec<String>,
}

/// Fields sent when creating a DNS record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordWrite {
    /// Record name relative to the zone
    pub name: String,
    /// Record type, uppercase
    pub rtype: String,
    /// TTL in seconds; the server assigns a default when unset
    pub ttl: Option<u32>,
    /// Record values
    pub values: Vec<String>,
}

/// Remote fields of a web redirection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedirectionInfo {
    /// Source hostname
    pub host: String,
    /// Target URL
    pub url: String,
    /// Redirection protocol
    pub protocol: String,
    /// Redirection type
    pub kind: String,
    /// TLS certificate status (none, pending, active, error)
    pub cert_status: String,
    /// UUID of the TLS certificate, when one exists
    pub cert_uuid: Option<String>,
}

/// Fields sent when creating a web redirection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedirectionWrite {
    /// Source hostname, including the domain name
    pub host: String,
    /// Target URL
    pub url: String,
    /// Redirection protocol
    pub protocol: String,
    /// Redirection type
    pub kind: String,
    /// Overwrite an existing DNS record for the host instead of failing
    pub override_existing: bool,
}

/// Fields sent when updating a web redirection (the host is the address,
/// not part of the payload)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedirectionUpdate {
    /// Target URL
    pub url: String,
    /// Redirection protocol
    pub protocol: String,
    /// Redirection type
    pub kind: String,
    /// Overwrite an existing DNS record for the host instead of failing
    pub override_existing: bool,
}

/// Remote fields of an email forward
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForwardInfo {
    /// Local part of the forwarding source
    pub source: String,
    /// Destination addresses, in remote order
    pub destinations: Vec<String>,
}

/// Fields sent when creating an email forward
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForwardWrite {
    /// Local part of the forwarding source
    pub source: String,
    /// Destination addresses
    pub destinations: Vec<String>,
}

/// Interface to the remote REST service
///
/// Implementations perform one network call per method and report failures
/// as [`GatewayError`] with the remote status code preserved. They must not
/// retry, classify errors, or keep state between calls; all of that is owned
/// by the reconciler and the host.
///
/// # Thread Safety
///
/// Implementations must be thread-safe and usable across async tasks.
#[async_trait]
pub trait RemoteGateway: Send + Sync {
    /// Fetch a registered domain by FQDN
    async fn get_domain(&self, fqdn: &str) -> GatewayResult<DomainInfo>;

    /// Fetch a DNS record by zone, name and type
    async fn get_record(&self, zone: &str, name: &str, rtype: &str) -> GatewayResult<RecordInfo>;

    /// Create a DNS record in a zone
    async fn create_record(&self, zone: &str, record: &RecordWrite) -> GatewayResult<()>;

    /// Replace the TTL and values of a DNS record
    async fn update_record(
        &self,
        zone: &str,
        name: &str,
        rtype: &str,
        ttl: Option<u32>,
        values: &[String],
    ) -> GatewayResult<()>;

    /// Delete a DNS record
    async fn delete_record(&self, zone: &str, name: &str, rtype: &str) -> GatewayResult<()>;

    /// Fetch a web redirection by domain and host
    async fn get_redirection(&self, domain: &str, host: &str) -> GatewayResult<RedirectionInfo>;

    /// Create a web redirection under a domain
    async fn create_redirection(
        &self,
        domain: &str,
        redirection: &RedirectionWrite,
    ) -> GatewayResult<()>;

    /// Update a web redirection in place
    async fn update_redirection(
        &self,
        domain: &str,
        host: &str,
        update: &RedirectionUpdate,
    ) -> GatewayResult<()>;

    /// Delete a web redirection
    async fn delete_redirection(&self, domain: &str, host: &str) -> GatewayResult<()>;

    /// Fetch an email forward by domain and source local part
    async fn get_forward(&self, domain: &str, source: &str) -> GatewayResult<ForwardInfo>;

    /// Create an email forward under a domain
    async fn create_forward(&self, domain: &str, forward: &ForwardWrite) -> GatewayResult<()>;

    /// Replace the destinations of an email forward
    async fn update_forward(
        &self,
        domain: &str,
        source: &str,
        destinations: &[String],
    ) -> GatewayResult<()>;

    /// Delete an email forward
    async fn delete_forward(&self, domain: &str, source: &str) -> GatewayResult<()>;
}
