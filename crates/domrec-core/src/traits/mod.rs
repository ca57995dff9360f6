//! Core traits for the reconciliation engine
//!
//! - [`RemoteGateway`]: the remote REST service, as the engine sees it

pub mod gateway;

pub use gateway::{
    DomainInfo, ForwardInfo, ForwardWrite, GatewayError, GatewayResult, RecordInfo, RecordWrite,
    RedirectionInfo, RedirectionUpdate, RedirectionWrite, RemoteGateway,
};
