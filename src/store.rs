//! Artifact store: the entry point of the registry client.
//!
//! An [`ArtifactStore`] owns one connection to MLMD and exposes lookups that
//! are not scoped to a workspace, plus workspace resolution.
//!
//! ```ignore
//! use artifact_registry::{ArtifactStore, RegistryConfig};
//!
//! let store = ArtifactStore::connect("run-uuid", &RegistryConfig::from_env()?).await?;
//! for artifact in store.artifacts_by_id(&[9474]).await? {
//!     println!("{} {} {}", artifact.name, artifact.uri, artifact.version);
//! }
//!
//! let workspace = store.workspace("ws-mnist").await?;
//! let models = workspace.artifacts_by_type(ArtifactKind::Model).await?;
//! ```

use crate::client::MetadataStoreConnection;
use crate::config::RegistryConfig;
use crate::convert::{self, ArtifactTypeMap};
use crate::error::{RegistryError, Result};
use crate::proto::Artifact;
use crate::types::{ArtifactKind, ArtifactRecord, WorkspaceRecord, WORKSPACE_CONTEXT_TYPE};
use crate::workspace::Workspace;

#[derive(Debug, Clone)]
pub struct ArtifactStore {
    uuid: String,
    connection: MetadataStoreConnection,
}

impl ArtifactStore {
    /// Connect to the store described by `config`.
    ///
    /// `uuid` identifies the caller (typically a pipeline run) in logs.
    pub async fn connect(uuid: impl Into<String>, config: &RegistryConfig) -> Result<Self> {
        let connection = MetadataStoreConnection::connect(config).await?;
        Ok(Self::with_connection(uuid, connection))
    }

    /// Like [`ArtifactStore::connect`] but defers dialing to the first call.
    pub fn connect_lazy(uuid: impl Into<String>, config: &RegistryConfig) -> Result<Self> {
        let connection = MetadataStoreConnection::connect_lazy(config)?;
        Ok(Self::with_connection(uuid, connection))
    }

    /// Connect using `MLMD_*` environment variables.
    pub async fn from_env(uuid: impl Into<String>) -> Result<Self> {
        Self::connect(uuid, &RegistryConfig::from_env()?).await
    }

    pub fn with_connection(uuid: impl Into<String>, connection: MetadataStoreConnection) -> Self {
        Self {
            uuid: uuid.into(),
            connection,
        }
    }

    pub fn uuid(&self) -> &str {
        &self.uuid
    }

    pub fn connection(&self) -> &MetadataStoreConnection {
        &self.connection
    }

    /// Fetch artifacts by id. Ids the store does not know are skipped.
    pub async fn artifacts_by_id(&self, ids: &[i64]) -> Result<Vec<ArtifactRecord>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let artifacts = self.connection.get_artifacts_by_id(ids.to_vec()).await?;
        tracing::debug!(
            uuid = %self.uuid,
            requested = ids.len(),
            found = artifacts.len(),
            "Fetched artifacts by id"
        );
        shape_artifacts(&self.connection, &artifacts).await
    }

    /// Resolve a workspace by name.
    pub async fn workspace(&self, name: &str) -> Result<Workspace> {
        let context = self
            .connection
            .get_context_by_type_and_name(WORKSPACE_CONTEXT_TYPE, name)
            .await?
            .ok_or_else(|| RegistryError::WorkspaceNotFound(name.to_string()))?;

        let record = convert::workspace_record(&context);
        tracing::debug!(
            uuid = %self.uuid,
            workspace = %record.name,
            id = record.id,
            "Fetched workspace"
        );
        Ok(Workspace::new(record, self.connection.clone()))
    }

    /// All workspaces known to the store.
    pub async fn workspaces(&self) -> Result<Vec<WorkspaceRecord>> {
        let contexts = self
            .connection
            .get_contexts_by_type(WORKSPACE_CONTEXT_TYPE)
            .await?;
        Ok(contexts.iter().map(convert::workspace_record).collect())
    }

    /// Artifact type id → kind, fetched fresh.
    pub async fn artifact_type_map(&self) -> Result<ArtifactTypeMap> {
        artifact_type_map(&self.connection).await
    }

    /// Every artifact of the given kind, across workspaces.
    pub async fn artifacts_by_type(&self, kind: ArtifactKind) -> Result<Vec<ArtifactRecord>> {
        let artifacts = fetch_by_kind(&self.connection, kind).await?;
        shape_artifacts(&self.connection, &artifacts).await
    }
}

pub(crate) async fn artifact_type_map(
    connection: &MetadataStoreConnection,
) -> Result<ArtifactTypeMap> {
    let types = connection.get_artifact_types().await?;
    Ok(convert::artifact_type_map(&types))
}

/// Resolve type ids with an extra `GetArtifactTypes` round trip and flatten.
pub(crate) async fn shape_artifacts(
    connection: &MetadataStoreConnection,
    artifacts: &[Artifact],
) -> Result<Vec<ArtifactRecord>> {
    if artifacts.is_empty() {
        return Ok(Vec::new());
    }
    let types = artifact_type_map(connection).await?;
    Ok(convert::prepare_artifacts(artifacts, &types))
}

pub(crate) async fn fetch_by_kind(
    connection: &MetadataStoreConnection,
    kind: ArtifactKind,
) -> Result<Vec<Artifact>> {
    let type_name = kind
        .type_name()
        .ok_or(RegistryError::UnsupportedArtifactKind(kind))?;
    connection.get_artifacts_by_type(type_name).await
}
