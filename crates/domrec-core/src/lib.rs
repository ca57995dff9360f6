// # domrec-core
//
// Reconciliation core for declaratively managed domain, DNS and email
// resources.
//
// ## Architecture Overview
//
// A caller supplies desired state; the engine converges a remote REST
// service toward it and reports observed state back:
//
// - **identity**: bidirectional codecs between compound remote keys and the
//   single opaque identifier the host persists
// - **validate**: pure field-level checks run before any remote call
// - **traits::RemoteGateway**: the remote service as the engine sees it —
//   request/response shapes plus a status-code-preserving error contract
// - **error**: the closed failure taxonomy and the status-code classifier
// - **reconciler**: the per-identity state machine
//   (Planned / Present / Absent) behind Create/Read/Update/Delete/Import
//
// ## Design Principles
//
// 1. **Validate before the wire**: input that can never succeed remotely is
//    rejected locally
// 2. **Absence is not failure**: a remote 404 on Read is drift, reported as
//    `Absent`
// 3. **Normalize observed state**: unordered multi-value fields are sorted
//    so repeated reads compare equal
// 4. **No retries, no locking**: retry policy and per-identity serialization
//    belong to the host

pub mod error;
pub mod identity;
pub mod reconciler;
pub mod resources;
pub mod traits;
pub mod validate;

// Re-export core types for convenience
pub use error::{Operation, ReconcileError, RemoteFailure, Result};
pub use identity::{ForwardId, RecordId, RedirectionId};
pub use reconciler::{Reconciler, ResourceState, WriteOutcome};
pub use resources::{
    DnsRecord, DnsRecordSpec, Domain, EmailForward, EmailForwardSpec, WebRedirection,
    WebRedirectionSpec,
};
pub use traits::{GatewayError, GatewayResult, RemoteGateway};
pub use validate::{Violation, Violations};
