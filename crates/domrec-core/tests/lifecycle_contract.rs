//! Architectural Contract Test: Create/Update lifecycle
//!
//! Constraints verified:
//! - Validation runs before any remote call; invalid specs never reach the
//!   gateway
//! - Every successful write is followed by a read that populates computed
//!   fields (read-after-write)
//! - A failed refresh does not fail the write: the outcome carries seeded
//!   state plus the refresh error
//! - Write-side normalization: unordered multi-value fields reach the
//!   gateway sorted

mod common;

use std::sync::Arc;

use common::{DEFAULT_TTL, MockGateway};
use domrec_core::traits::GatewayError;
use domrec_core::{
    DnsRecordSpec, EmailForwardSpec, ReconcileError, Reconciler, RecordId, ResourceState,
    WebRedirectionSpec,
};

fn reconciler(gateway: &Arc<MockGateway>) -> Reconciler {
    Reconciler::new(gateway.clone())
}

#[tokio::test]
async fn create_record_populates_computed_fields_via_read() {
    let gateway = Arc::new(MockGateway::new());
    let engine = reconciler(&gateway);

    let spec = DnsRecordSpec::new(
        "example.com",
        "www",
        "A",
        vec!["192.0.2.1".to_string(), "192.0.2.2".to_string()],
    );
    let outcome = engine.create_record(&spec).await.expect("create succeeds");

    assert!(outcome.refresh_error.is_none());
    let record = outcome.state.into_present().expect("present after create");
    // TTL and href come from the post-write read, not the spec
    assert_eq!(record.ttl, Some(DEFAULT_TTL));
    assert!(record.href.is_some());

    assert_eq!(gateway.create_calls(), 1);
    assert_eq!(gateway.get_calls(), 1, "create must be followed by a read");
}

#[tokio::test]
async fn create_record_rejects_invalid_spec_without_gateway_call() {
    let gateway = Arc::new(MockGateway::new());
    let engine = reconciler(&gateway);

    let spec = DnsRecordSpec::new("example.com", "www", "BOGUS", vec!["x".to_string()]);
    let err = engine.create_record(&spec).await.unwrap_err();

    match err {
        ReconcileError::ValidationFailed { violations, .. } => {
            assert!(violations.iter().any(|v| v.field == "type"));
        }
        other => panic!("expected ValidationFailed, got {:?}", other),
    }
    assert_eq!(gateway.total_calls(), 0, "validation must run pre-flight");
}

#[tokio::test]
async fn create_survives_failed_refresh() {
    let gateway = Arc::new(MockGateway::new());
    let engine = reconciler(&gateway);

    // The write succeeds, the immediate read hits a server error
    gateway.fail_next_get(GatewayError::status(500, "internal error"));

    let spec = DnsRecordSpec::new("example.com", "www", "A", vec!["192.0.2.1".to_string()])
        .with_ttl(300);
    let outcome = engine
        .create_record(&spec)
        .await
        .expect("write success is not masked by the refresh failure");

    let record = outcome.state.into_present().expect("seeded state kept");
    assert_eq!(record.ttl, Some(300));
    assert_eq!(record.href, None, "computed field stays unpopulated");

    let refresh_error = outcome.refresh_error.expect("refresh error surfaced");
    assert!(matches!(refresh_error, ReconcileError::Unknown { .. }));
}

#[tokio::test]
async fn update_record_sends_full_snapshot_then_reads() {
    let gateway = Arc::new(MockGateway::new());
    gateway.insert_record("example.com", "www", "A", 300, &["192.0.2.1"]);
    let engine = reconciler(&gateway);

    let id = RecordId::new("example.com", "www", "A");
    let spec = DnsRecordSpec::new(
        "example.com",
        "www",
        "A",
        vec!["192.0.2.9".to_string(), "192.0.2.3".to_string()],
    )
    .with_ttl(600);
    let outcome = engine.update_record(&id, &spec).await.expect("update succeeds");

    assert!(outcome.refresh_error.is_none());
    let record = outcome.state.into_present().expect("present after update");
    assert_eq!(record.ttl, Some(600));
    assert_eq!(record.values, vec!["192.0.2.3", "192.0.2.9"]);

    // The gateway saw the sorted snapshot
    let stored = gateway.stored_record("example.com", "www", "A").unwrap();
    assert_eq!(stored.values, vec!["192.0.2.3", "192.0.2.9"]);
    assert_eq!(gateway.update_calls(), 1);
    assert_eq!(gateway.get_calls(), 1);
}

#[tokio::test]
async fn create_forward_sorts_destinations_before_write() {
    let gateway = Arc::new(MockGateway::new());
    let engine = reconciler(&gateway);

    let spec = EmailForwardSpec::new(
        "sales@example.com",
        vec!["b@x.com".to_string(), "a@x.com".to_string()],
    );
    let outcome = engine.create_forward(&spec).await.expect("create succeeds");

    let forward = outcome.state.into_present().expect("present after create");
    assert_eq!(forward.source, "sales@example.com");
    assert_eq!(forward.destinations, vec!["a@x.com", "b@x.com"]);

    // Sorted on the wire, not just in the observed state
    let stored = gateway.stored_forward("example.com", "sales").unwrap();
    assert_eq!(stored.destinations, vec!["a@x.com", "b@x.com"]);
}

#[tokio::test]
async fn create_redirection_derives_domain_from_host() {
    let gateway = Arc::new(MockGateway::new());
    let engine = reconciler(&gateway);

    let spec = WebRedirectionSpec::new("shop.example.com", "https://example.com/new")
        .with_protocol("https")
        .with_kind("http301");
    let outcome = engine
        .create_redirection(&spec)
        .await
        .expect("create succeeds");

    let redirection = outcome.state.into_present().expect("present after create");
    assert_eq!(redirection.domain, "example.com");
    assert_eq!(redirection.host, "shop.example.com");
    // Computed certificate fields populated by the read-after-write
    assert_eq!(redirection.cert_status.as_deref(), Some("pending"));
    assert!(redirection.cert_uuid.is_some());

    // The gateway stored it under the derived domain
    assert!(
        gateway
            .stored_redirection("example.com", "shop.example.com")
            .is_some()
    );
}

#[tokio::test]
async fn create_redirection_explicit_domain_wins_over_derivation() {
    let gateway = Arc::new(MockGateway::new());
    let engine = reconciler(&gateway);

    // Multi-label public suffix: derivation would yield "co.uk"
    let spec = WebRedirectionSpec::new("shop.example.co.uk", "https://example.co.uk/new")
        .with_domain("example.co.uk");
    let outcome = engine
        .create_redirection(&spec)
        .await
        .expect("create succeeds");

    let redirection = outcome.state.into_present().expect("present after create");
    assert_eq!(redirection.domain, "example.co.uk");
    assert!(
        gateway
            .stored_redirection("example.co.uk", "shop.example.co.uk")
            .is_some()
    );
}

#[tokio::test]
async fn create_redirection_host_domain_mismatch_rejected_locally() {
    let gateway = Arc::new(MockGateway::new());
    let engine = reconciler(&gateway);

    let spec = WebRedirectionSpec::new("shop.example.com", "https://example.com/new")
        .with_domain("other.com");
    let err = engine.create_redirection(&spec).await.unwrap_err();

    match err {
        ReconcileError::ValidationFailed { violations, .. } => {
            assert!(violations.iter().any(|v| v.field == "host"));
        }
        other => panic!("expected ValidationFailed, got {:?}", other),
    }
    assert_eq!(gateway.total_calls(), 0);
}

#[tokio::test]
async fn failed_create_write_surfaces_classified_error() {
    let gateway = Arc::new(MockGateway::new());
    let engine = reconciler(&gateway);

    gateway.fail_next_create(GatewayError::status(403, "forbidden"));
    let spec = DnsRecordSpec::new("example.com", "www", "A", vec!["192.0.2.1".to_string()]);
    let err = engine.create_record(&spec).await.unwrap_err();

    assert!(matches!(err, ReconcileError::Rejected { .. }));
    assert_eq!(gateway.get_calls(), 0, "no read after a failed write");

    // The error is attributable without inspecting call sites
    let rendered = err.to_string();
    assert!(rendered.contains("create"));
    assert!(rendered.contains("example.com/www/A"));
}

#[tokio::test]
async fn recreate_after_delete_is_allowed() {
    let gateway = Arc::new(MockGateway::new());
    let engine = reconciler(&gateway);

    let spec = DnsRecordSpec::new("example.com", "www", "A", vec!["192.0.2.1".to_string()]);
    let id = RecordId::new("example.com", "www", "A");

    engine.create_record(&spec).await.expect("first create");
    engine.delete_record(&id).await.expect("delete");
    assert!(matches!(
        engine.read_record(&id).await.unwrap(),
        ResourceState::Absent
    ));

    // A new Create for the same identity re-enters the lifecycle
    let outcome = engine.create_record(&spec).await.expect("second create");
    assert!(outcome.state.is_present());
}
