//! Artifact registry - typed client for Kubeflow's ML Metadata store
//!
//! Queries an MLMD `MetadataStoreService` over gRPC and reshapes its generic
//! property-bag records into flat artifact and workspace records.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────┐     ┌──────────────────────────────┐
//! │        ArtifactStore         │────▶│          Workspace           │
//! │ by-id, workspaces, by-type   │     │ artifacts, by-type, by-run,  │
//! └──────────────────────────────┘     │ lineage                      │
//!                │                     └──────────────────────────────┘
//!                ▼                                    │
//! ┌──────────────────────────────────────────────────────────────────┐
//! │               MetadataStoreConnection (tonic)                     │
//! └──────────────────────────────────────────────────────────────────┘
//!                │
//!                ▼
//! ┌──────────────────────────────────────────────────────────────────┐
//! │      convert: Artifact/Context/Event → registry records           │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every call is a fresh round trip; nothing is cached. Failures are returned
//! as [`RegistryError`], never swallowed.

pub mod client;
pub mod config;
pub mod convert;
pub mod error;
pub mod logging;
pub mod proto;
pub mod store;
pub mod types;
pub mod workspace;

pub use client::MetadataStoreConnection;
pub use config::RegistryConfig;
pub use error::{RegistryError, Result};
pub use store::ArtifactStore;
pub use types::{
    ArtifactKind, ArtifactRecord, EventDirection, Lineage, LineageEvent, WorkspaceRecord,
};
pub use workspace::Workspace;
