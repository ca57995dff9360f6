//! Identity codecs
//!
//! Every managed resource is addressed remotely by a compound key; the host
//! persists a single opaque identifier per resource instead. The codecs here
//! encode a compound key into that identifier and decode it back, with
//! `decode(encode(k)) == k` for all valid keys.
//!
//! Identifier formats are part of the host-facing contract and must stay
//! stable across versions:
//! - domain: the FQDN itself
//! - DNS record: `zone/name/type`
//! - web redirection: the source host
//! - email forward: `localpart@domain`

use serde::{Deserialize, Serialize};

use crate::error::ReconcileError;

/// Compound key of a DNS record: zone, name and type
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordId {
    /// FQDN of the zone
    pub zone: String,
    /// Record name relative to the zone
    pub name: String,
    /// Record type, uppercase
    pub rtype: String,
}

impl RecordId {
    /// Create a record key
    pub fn new(
        zone: impl Into<String>,
        name: impl Into<String>,
        rtype: impl Into<String>,
    ) -> Self {
        Self {
            zone: zone.into(),
            name: name.into(),
            rtype: rtype.into(),
        }
    }

    /// Encode as `zone/name/type`.
    ///
    /// A zone or name containing `/` produces an identifier that does not
    /// round-trip; this is a known limitation of the format, not silently
    /// handled.
    pub fn encode(&self) -> String {
        format!("{}/{}/{}", self.zone, self.name, self.rtype)
    }

    /// Decode from `zone/name/type`
    pub fn decode(raw: &str) -> Result<Self, ReconcileError> {
        let mut parts = raw.splitn(3, '/');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(zone), Some(name), Some(rtype))
                if !zone.is_empty() && !name.is_empty() && !rtype.is_empty() =>
            {
                Ok(Self::new(zone, name, rtype))
            }
            _ => Err(ReconcileError::malformed(
                raw,
                "expected zone/name/type with three non-empty segments",
            )),
        }
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.encode())
    }
}

/// Compound key of a web redirection: the source host.
///
/// The host carries enough information on its own because the registrable
/// domain is always a suffix of it and can be re-derived.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RedirectionId {
    /// Source hostname, including the domain name
    pub host: String,
}

impl RedirectionId {
    /// Create a redirection key
    pub fn new(host: impl Into<String>) -> Self {
        Self { host: host.into() }
    }

    /// Encode as the host itself
    pub fn encode(&self) -> String {
        self.host.clone()
    }

    /// Decode from a host. The host must have at least two labels so a
    /// domain can be derived from it.
    pub fn decode(raw: &str) -> Result<Self, ReconcileError> {
        if raw.is_empty() || !raw.contains('.') {
            return Err(ReconcileError::malformed(
                raw,
                "expected a hostname of at least two labels",
            ));
        }
        Ok(Self::new(raw))
    }

    /// Derive the registrable domain as the last two labels of the host.
    ///
    /// This heuristic is wrong for multi-label public suffixes: for
    /// `shop.example.co.uk` it yields `co.uk`, not `example.co.uk`. Callers
    /// with such domains must supply the domain explicitly; an explicit
    /// domain always wins over the derived one.
    pub fn derive_domain(&self) -> Result<String, ReconcileError> {
        let parts: Vec<&str> = self.host.split('.').collect();
        if parts.len() < 2 {
            return Err(ReconcileError::malformed(
                &self.host,
                "cannot derive a domain from a single-label host",
            ));
        }
        Ok(format!(
            "{}.{}",
            parts[parts.len() - 2],
            parts[parts.len() - 1]
        ))
    }
}

impl std::fmt::Display for RedirectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.host)
    }
}

/// Compound key of an email forward: local part and domain
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ForwardId {
    /// Local part of the forwarding source
    pub local: String,
    /// Domain of the forwarding source
    pub domain: String,
}

impl ForwardId {
    /// Create a forward key
    pub fn new(local: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            local: local.into(),
            domain: domain.into(),
        }
    }

    /// Encode as `localpart@domain`
    pub fn encode(&self) -> String {
        format!("{}@{}", self.local, self.domain)
    }

    /// Decode from `localpart@domain`, splitting on the first `@` only.
    /// Local parts never contain `@` per email syntax, so the split is
    /// unambiguous.
    pub fn decode(raw: &str) -> Result<Self, ReconcileError> {
        match raw.split_once('@') {
            Some((local, domain)) if !local.is_empty() && !domain.is_empty() => {
                Ok(Self::new(local, domain))
            }
            _ => Err(ReconcileError::malformed(
                raw,
                "expected localpart@domain",
            )),
        }
    }
}

impl std::fmt::Display for ForwardId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.encode())
    }
}
