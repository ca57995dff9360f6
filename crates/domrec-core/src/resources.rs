//! Typed records for the managed resource variants
//!
//! Each variant is a distinct record with named fields; conversion to and
//! from a host's untyped representation is the host's adapter concern, not
//! something the core reasons about.
//!
//! Variants with a write lifecycle come in two shapes: a desired-state spec
//! (what the caller wants) and an observed record (what the remote service
//! reports, computed fields included).

use serde::{Deserialize, Serialize};

/// Record types accepted by the remote zone service
pub const RECORD_TYPES: &[&str] = &[
    "A", "AAAA", "ALIAS", "CAA", "CDS", "CNAME", "DNAME", "DS", "KEY", "LOC", "MX", "NAPTR", "NS",
    "OPENPGPKEY", "PTR", "RP", "SPF", "SRV", "SSHFP", "TLSA", "TXT", "WKS",
];

/// Protocols accepted for a web redirection
pub const REDIRECTION_PROTOCOLS: &[&str] = &["http", "https", "httpsonly"];

/// Redirection types accepted for a web redirection
pub const REDIRECTION_KINDS: &[&str] = &["cloak", "http301", "http302"];

/// A registered domain. Read-only: the engine observes it but never writes
/// to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Domain {
    /// Fully qualified domain name
    pub fqdn: String,
    /// Nameservers, in remote (delegation) order
    pub nameservers: Vec<String>,
}

/// Desired state for a DNS record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsRecordSpec {
    /// FQDN of the zone the record lives in
    pub zone: String,
    /// Record name relative to the zone (`@` for the apex)
    pub name: String,
    /// Record type, uppercase (e.g. `A`, `MX`, `TXT`)
    #[serde(rename = "type")]
    pub rtype: String,
    /// TTL in seconds; the server assigns a default when unset
    #[serde(default)]
    pub ttl: Option<u32>,
    /// Record values; order is irrelevant and normalized away
    pub values: Vec<String>,
}

impl DnsRecordSpec {
    /// Create a new DNS record spec with a server-assigned TTL
    pub fn new(
        zone: impl Into<String>,
        name: impl Into<String>,
        rtype: impl Into<String>,
        values: Vec<String>,
    ) -> Self {
        Self {
            zone: zone.into(),
            name: name.into(),
            rtype: rtype.into(),
            ttl: None,
            values,
        }
    }

    /// Set an explicit TTL
    pub fn with_ttl(mut self, ttl: u32) -> Self {
        self.ttl = Some(ttl);
        self
    }
}

/// Observed state of a DNS record
///
/// `ttl` and `href` are computed remotely; they are `None` only when a
/// post-write refresh could not complete and the record was seeded from its
/// spec instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsRecord {
    /// FQDN of the zone the record lives in
    pub zone: String,
    /// Record name relative to the zone
    pub name: String,
    /// Record type, uppercase
    #[serde(rename = "type")]
    pub rtype: String,
    /// TTL in seconds
    pub ttl: Option<u32>,
    /// API URL of the record
    pub href: Option<String>,
    /// Record values, sorted lexicographically
    pub values: Vec<String>,
}

/// Desired state for a web redirection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebRedirectionSpec {
    /// Registrable domain the redirection belongs to. When unset it is
    /// derived from the host (see `RedirectionId::derive_domain`); an
    /// explicit value always wins over the derived one.
    #[serde(default)]
    pub domain: Option<String>,
    /// Source hostname, including the domain name
    pub host: String,
    /// Target URL
    pub url: String,
    /// Overwrite an existing DNS record for the host instead of failing
    #[serde(default)]
    pub override_existing: bool,
    /// Redirection protocol: `http`, `https` or `httpsonly`
    #[serde(default = "default_protocol")]
    pub protocol: String,
    /// Redirection type: `cloak`, `http301` or `http302`
    #[serde(default = "default_kind", rename = "type")]
    pub kind: String,
}

impl WebRedirectionSpec {
    /// Create a new redirection spec with the default protocol (`https`)
    /// and type (`http301`)
    pub fn new(host: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            domain: None,
            host: host.into(),
            url: url.into(),
            override_existing: false,
            protocol: default_protocol(),
            kind: default_kind(),
        }
    }

    /// Set an explicit domain, bypassing derivation from the host
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// Set the redirection protocol
    pub fn with_protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = protocol.into();
        self
    }

    /// Set the redirection type
    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = kind.into();
        self
    }

    /// Allow overwriting an existing DNS record for the host
    pub fn with_override(mut self, override_existing: bool) -> Self {
        self.override_existing = override_existing;
        self
    }
}

/// Observed state of a web redirection
///
/// `cert_status` and `cert_uuid` describe the TLS certificate backing an
/// HTTPS redirection; both are computed remotely and are `None` until a read
/// has populated them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebRedirection {
    /// Registrable domain the redirection belongs to
    pub domain: String,
    /// Source hostname
    pub host: String,
    /// Target URL
    pub url: String,
    /// Whether an existing DNS record is overwritten
    pub override_existing: bool,
    /// Redirection protocol
    pub protocol: String,
    /// Redirection type
    #[serde(rename = "type")]
    pub kind: String,
    /// TLS certificate status (none, pending, active, error)
    pub cert_status: Option<String>,
    /// UUID of the TLS certificate
    pub cert_uuid: Option<String>,
}

/// Desired state for an email forward
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailForwardSpec {
    /// Forwarding source as `local@domain`
    pub source: String,
    /// Destination addresses; order is irrelevant and normalized away
    pub destinations: Vec<String>,
}

impl EmailForwardSpec {
    /// Create a new email forward spec
    pub fn new(source: impl Into<String>, destinations: Vec<String>) -> Self {
        Self {
            source: source.into(),
            destinations,
        }
    }
}

/// Observed state of an email forward
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailForward {
    /// Forwarding source as `local@domain`
    pub source: String,
    /// Destination addresses, sorted lexicographically
    pub destinations: Vec<String>,
}

fn default_protocol() -> String {
    "https".to_string()
}

fn default_kind() -> String {
    "http301".to_string()
}
