//! Error types for the artifact registry client.
//!
//! Every remote failure is surfaced to the caller; nothing is logged and
//! swallowed. The `operation` carried by [`RegistryError::Rpc`] names the
//! MLMD RPC that failed so callers can tell which step of a multi-call
//! operation (e.g. lineage) aborted.

use thiserror::Error;

use crate::types::ArtifactKind;

pub type Result<T> = std::result::Result<T, RegistryError>;

/// Main error type for registry operations
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Invalid metadata store endpoint '{endpoint}': {source}")]
    InvalidEndpoint {
        endpoint: String,
        #[source]
        source: tonic::transport::Error,
    },

    #[error("Failed to connect to metadata store at {endpoint}: {source}")]
    Connect {
        endpoint: String,
        #[source]
        source: tonic::transport::Error,
    },

    #[error("{operation} failed: {status}")]
    Rpc {
        operation: &'static str,
        #[source]
        status: tonic::Status,
    },

    #[error("Workspace '{0}' not found")]
    WorkspaceNotFound(String),

    #[error("Artifact kind '{0}' has no metadata type name")]
    UnsupportedArtifactKind(ArtifactKind),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl RegistryError {
    pub(crate) fn rpc(operation: &'static str, status: tonic::Status) -> Self {
        RegistryError::Rpc { operation, status }
    }

    /// gRPC status code for RPC failures, `None` for everything else.
    pub fn code(&self) -> Option<tonic::Code> {
        match self {
            RegistryError::Rpc { status, .. } => Some(status.code()),
            _ => None,
        }
    }

    /// True when the store answered `NOT_FOUND`, or the workspace lookup came
    /// back empty.
    pub fn is_not_found(&self) -> bool {
        matches!(self, RegistryError::WorkspaceNotFound(_))
            || self.code() == Some(tonic::Code::NotFound)
    }
}
