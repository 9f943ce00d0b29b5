//! # eRx Core
//!
//! Gateway between a clinical application and a remote e-prescribing network.
//!
//! This crate contains:
//! - the domain models the gateway reads and mutates ([`models`])
//! - mapping between those models and the wire shapes of `erx-wire` ([`mapping`])
//! - reconciliation of local records with their remote mirrors ([`reconcile`])
//! - the SOAP transport with per-operation telemetry ([`transport`], [`telemetry`])
//! - the [`ErxApi`] capability surface, its network implementation [`ErxGateway`] and the
//!   in-process [`StubErxService`]
//!
//! **No wire concerns**: XML, envelopes and credential minting live in `erx-wire`.

pub mod api;
pub mod config;
pub mod constants;
pub mod context;
pub mod error;
pub mod gateway;
pub mod mapping;
pub mod models;
pub mod reconcile;
pub mod stub;
pub mod telemetry;
pub mod transport;

#[cfg(test)]
mod test_support;

pub use api::ErxApi;
pub use config::{ClinicIdentity, GatewayConfig};
pub use context::CallContext;
pub use error::{ErxError, ErxResult};
pub use gateway::ErxGateway;
pub use models::*;
pub use stub::StubErxService;
pub use telemetry::{
    Counter, Histogram, HistogramSnapshot, InMemoryRegistry, MetricsRegistry, OperationMetrics,
    RegistrySnapshot, Telemetry,
};

pub use erx_wire::Operation;
