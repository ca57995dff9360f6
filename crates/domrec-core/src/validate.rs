//! Validation pipeline
//!
//! Pure, side-effect-free checks run before any remote call. Validation is
//! local and cheap, so it always runs first; input that can never succeed
//! remotely is rejected without spending a round trip.
//!
//! Each rule returns the full set of violations for the field being checked
//! rather than a boolean, so the host can attribute failures to the specific
//! offending input field.

use serde::{Deserialize, Serialize};

use crate::resources::{RECORD_TYPES, REDIRECTION_KINDS, REDIRECTION_PROTOCOLS};
use crate::resources::{DnsRecordSpec, EmailForwardSpec, WebRedirectionSpec};

/// A single field-level constraint violation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Name of the offending input field
    pub field: String,
    /// Human-readable description of the violation
    pub message: String,
}

/// Ordered collection of violations; empty means the input is valid
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violations(Vec<Violation>);

impl Violations {
    /// Create an empty collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a violation against a field
    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.push(Violation {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Append all violations from another collection
    pub fn extend(&mut self, other: Violations) {
        self.0.extend(other.0);
    }

    /// Whether the checked input passed
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of recorded violations
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate over the recorded violations
    pub fn iter(&self) -> impl Iterator<Item = &Violation> {
        self.0.iter()
    }
}

impl std::fmt::Display for Violations {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, v) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", v.field, v.message)?;
        }
        Ok(())
    }
}

impl IntoIterator for Violations {
    type Item = Violation;
    type IntoIter = std::vec::IntoIter<Violation>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Check a hostname: one or more dot-separated labels, each 1-63 characters
/// of ASCII alphanumerics or hyphens, not starting or ending with a hyphen.
/// Empty labels (consecutive dots, leading or trailing dots) are rejected.
pub fn hostname(field: &str, value: &str) -> Violations {
    let mut violations = Violations::new();

    if value.is_empty() {
        violations.push(field, format!("{:?} is not a valid hostname", value));
        return violations;
    }

    for label in value.split('.') {
        if label.is_empty() {
            violations.push(
                field,
                format!("{:?} is not a valid hostname: empty label", value),
            );
            continue;
        }
        if label.len() > 63 {
            violations.push(
                field,
                format!(
                    "{:?} is not a valid hostname: label {:?} is longer than 63 characters",
                    value, label
                ),
            );
        }
        if !label
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-')
        {
            violations.push(
                field,
                format!(
                    "{:?} is not a valid hostname: label {:?} contains invalid characters",
                    value, label
                ),
            );
        }
        if label.starts_with('-') || label.ends_with('-') {
            violations.push(
                field,
                format!(
                    "{:?} is not a valid hostname: label {:?} starts or ends with a hyphen",
                    value, label
                ),
            );
        }
    }

    violations
}

/// Check a URL: optional `http://` or `https://` scheme, a dot-separated
/// host whose final label is at least two letters, and an optional path.
///
/// This is a deliberately permissive syntactic check, not a full URI
/// grammar. It exists to reject obviously malformed input, not to validate
/// deliverability.
pub fn url(field: &str, value: &str) -> Violations {
    let mut violations = Violations::new();

    let rest = value
        .strip_prefix("http://")
        .or_else(|| value.strip_prefix("https://"))
        .unwrap_or(value);

    // Everything after the first slash is the path and is unconstrained.
    let host = match rest.split_once('/') {
        Some((host, _path)) => host,
        None => rest,
    };

    let labels: Vec<&str> = host.split('.').collect();
    let final_label_ok = labels
        .last()
        .is_some_and(|l| l.len() >= 2 && l.chars().all(|c| c.is_ascii_alphabetic()));
    let host_ok = labels.len() >= 2
        && labels
            .iter()
            .all(|l| !l.is_empty() && l.chars().all(|c| c.is_ascii_alphanumeric() || c == '-'))
        && final_label_ok;

    if !host_ok {
        violations.push(field, format!("{:?} is not a valid URL", value));
    }

    violations
}

/// Check membership of a value in an allowed set, reporting the offending
/// value and the field name on failure.
pub fn one_of(field: &str, value: &str, allowed: &[&str]) -> Violations {
    let mut violations = Violations::new();
    if !allowed.contains(&value) {
        violations.push(field, format!("{:?} is not a valid {}", value, field));
    }
    violations
}

/// Check a forwarding source: `local@domain` with a non-empty local part and
/// a hostname-valid domain.
pub fn email_source(field: &str, value: &str) -> Violations {
    let mut violations = Violations::new();
    match value.split_once('@') {
        Some((local, domain)) if !local.is_empty() && hostname(field, domain).is_empty() => {}
        _ => violations.push(
            field,
            format!(
                "{:?} is not a valid forwarding source (expected local@domain)",
                value
            ),
        ),
    }
    violations
}

/// Validate the desired state of a DNS record.
///
/// The record name is only required to be non-empty: zone apexes are
/// addressed as `@` and names like `_dmarc` or `*.staging` are legal, so no
/// hostname shape is imposed on it.
pub fn record_spec(spec: &DnsRecordSpec) -> Violations {
    let mut violations = hostname("zone", &spec.zone);
    if spec.name.is_empty() {
        violations.push("name", "record name cannot be empty");
    }
    violations.extend(one_of("type", &spec.rtype, RECORD_TYPES));
    if spec.values.is_empty() {
        violations.push("values", "at least one value is required");
    }
    violations
}

/// Validate the desired state of a web redirection.
///
/// The host/domain suffix rule is checked by the reconciler once the domain
/// has been resolved (it may need to be derived from the host first).
pub fn redirection_spec(spec: &WebRedirectionSpec) -> Violations {
    let mut violations = hostname("host", &spec.host);
    violations.extend(url("url", &spec.url));
    violations.extend(one_of(
        "protocol",
        &spec.protocol,
        REDIRECTION_PROTOCOLS,
    ));
    violations.extend(one_of("type", &spec.kind, REDIRECTION_KINDS));
    if let Some(domain) = &spec.domain {
        violations.extend(hostname("domain", domain));
    }
    violations
}

/// Validate the desired state of an email forward.
pub fn forward_spec(spec: &EmailForwardSpec) -> Violations {
    let mut violations = email_source("source", &spec.source);
    if spec.destinations.is_empty() {
        violations.push("destinations", "at least one destination is required");
    }
    violations
}
