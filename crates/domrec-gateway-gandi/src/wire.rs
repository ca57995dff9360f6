//! Wire types for the Gandi v5 REST API
//!
//! Field names follow the remote JSON exactly (`rrset_*` for LiveDNS record
//! sets, `type`/`override` for web redirections); conversion to the core's
//! gateway shapes happens here so the rest of the crate never touches raw
//! JSON.

use serde::{Deserialize, Serialize};

use domrec_core::traits::{
    DomainInfo, ForwardInfo, RecordInfo, RecordWrite, RedirectionInfo, RedirectionUpdate,
    RedirectionWrite,
};

/// LiveDNS record set as returned by the API
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiRecord {
    #[serde(rename = "rrset_name")]
    pub name: String,
    #[serde(rename = "rrset_type")]
    pub rtype: String,
    #[serde(rename = "rrset_ttl")]
    pub ttl: u32,
    #[serde(rename = "rrset_href", default)]
    pub href: String,
    #[serde(rename = "rrset_values")]
    pub values: Vec<String>,
}

impl From<ApiRecord> for RecordInfo {
    fn from(api: ApiRecord) -> Self {
        Self {
            name: api.name,
            rtype: api.rtype,
            ttl: api.ttl,
            href: api.href,
            values: api.values,
        }
    }
}

/// LiveDNS record set creation payload
#[derive(Debug, Clone, Serialize)]
pub(crate) struct ApiRecordWrite {
    #[serde(rename = "rrset_name")]
    pub name: String,
    #[serde(rename = "rrset_type")]
    pub rtype: String,
    #[serde(rename = "rrset_ttl", skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u32>,
    #[serde(rename = "rrset_values")]
    pub values: Vec<String>,
}

impl From<&RecordWrite> for ApiRecordWrite {
    fn from(write: &RecordWrite) -> Self {
        Self {
            name: write.name.clone(),
            rtype: write.rtype.clone(),
            ttl: write.ttl,
            values: write.values.clone(),
        }
    }
}

/// LiveDNS record set replacement payload (name and type are in the URL)
#[derive(Debug, Clone, Serialize)]
pub(crate) struct ApiRecordUpdate {
    #[serde(rename = "rrset_ttl", skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u32>,
    #[serde(rename = "rrset_values")]
    pub values: Vec<String>,
}

/// Registered domain as returned by the API
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiDomain {
    pub fqdn: String,
    #[serde(default)]
    pub nameservers: Vec<String>,
}

impl From<ApiDomain> for DomainInfo {
    fn from(api: ApiDomain) -> Self {
        Self {
            fqdn: api.fqdn,
            nameservers: api.nameservers,
        }
    }
}

/// Web redirection as returned by the API
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiRedirection {
    pub host: String,
    pub url: String,
    pub protocol: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default = "default_cert_status")]
    pub cert_status: String,
    #[serde(default)]
    pub cert_uuid: Option<String>,
}

fn default_cert_status() -> String {
    "none".to_string()
}

impl From<ApiRedirection> for RedirectionInfo {
    fn from(api: ApiRedirection) -> Self {
        Self {
            host: api.host,
            url: api.url,
            protocol: api.protocol,
            kind: api.kind,
            cert_status: api.cert_status,
            cert_uuid: api.cert_uuid,
        }
    }
}

/// Web redirection creation payload
#[derive(Debug, Clone, Serialize)]
pub(crate) struct ApiRedirectionWrite {
    pub host: String,
    pub url: String,
    pub protocol: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(rename = "override")]
    pub override_existing: bool,
}

impl From<&RedirectionWrite> for ApiRedirectionWrite {
    fn from(write: &RedirectionWrite) -> Self {
        Self {
            host: write.host.clone(),
            url: write.url.clone(),
            protocol: write.protocol.clone(),
            kind: write.kind.clone(),
            override_existing: write.override_existing,
        }
    }
}

/// Web redirection update payload (the host is in the URL)
#[derive(Debug, Clone, Serialize)]
pub(crate) struct ApiRedirectionUpdate {
    pub url: String,
    pub protocol: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(rename = "override")]
    pub override_existing: bool,
}

impl From<&RedirectionUpdate> for ApiRedirectionUpdate {
    fn from(update: &RedirectionUpdate) -> Self {
        Self {
            url: update.url.clone(),
            protocol: update.protocol.clone(),
            kind: update.kind.clone(),
            override_existing: update.override_existing,
        }
    }
}

/// Email forward as returned by the API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct ApiForward {
    pub source: String,
    pub destinations: Vec<String>,
}

impl From<ApiForward> for ForwardInfo {
    fn from(api: ApiForward) -> Self {
        Self {
            source: api.source,
            destinations: api.destinations,
        }
    }
}

/// Email forward update payload (the source is in the URL)
#[derive(Debug, Clone, Serialize)]
pub(crate) struct ApiForwardUpdate {
    pub destinations: Vec<String>,
}

/// Error body the API attaches to non-2xx responses. Two shapes exist: a
/// plain `message`, or an `errors` array of field-level descriptions.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub errors: Vec<ApiFieldError>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiFieldError {
    #[serde(default)]
    pub name: Option<String>,
    pub description: String,
}

impl ApiErrorBody {
    /// Best-effort human-readable message out of either error shape
    pub fn into_message(self) -> Option<String> {
        if let Some(message) = self.message {
            return Some(message);
        }
        let first = self.errors.into_iter().next()?;
        Some(match first.name {
            Some(name) => format!("{}: {}", name, first.description),
            None => first.description,
        })
    }
}
