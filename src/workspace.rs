//! Workspace-scoped artifact queries and lineage.
//!
//! A [`Workspace`] is obtained from [`crate::ArtifactStore::workspace`] and
//! shares the store's connection.

use crate::client::MetadataStoreConnection;
use crate::convert;
use crate::error::Result;
use crate::store::{fetch_by_kind, shape_artifacts};
use crate::types::{ArtifactKind, ArtifactRecord, Lineage, WorkspaceRecord};

#[derive(Debug, Clone)]
pub struct Workspace {
    record: WorkspaceRecord,
    connection: MetadataStoreConnection,
}

impl Workspace {
    pub fn new(record: WorkspaceRecord, connection: MetadataStoreConnection) -> Self {
        Self { record, connection }
    }

    pub fn id(&self) -> i64 {
        self.record.id
    }

    pub fn name(&self) -> &str {
        &self.record.name
    }

    pub fn record(&self) -> &WorkspaceRecord {
        &self.record
    }

    /// All artifacts attributed to this workspace's context.
    pub async fn artifacts(&self) -> Result<Vec<ArtifactRecord>> {
        let artifacts = self
            .connection
            .get_artifacts_by_context(self.record.id)
            .await?;
        tracing::debug!(
            workspace = %self.record.name,
            count = artifacts.len(),
            "Fetched workspace artifacts"
        );
        shape_artifacts(&self.connection, &artifacts).await
    }

    /// Artifacts of one kind that were logged under this workspace.
    ///
    /// MLMD has no type-and-context query, so this fetches the kind
    /// store-wide and keeps artifacts tagged with this workspace's name.
    pub async fn artifacts_by_type(&self, kind: ArtifactKind) -> Result<Vec<ArtifactRecord>> {
        let artifacts: Vec<_> = fetch_by_kind(&self.connection, kind)
            .await?
            .into_iter()
            .filter(|a| convert::in_workspace(a, &self.record.name))
            .collect();
        shape_artifacts(&self.connection, &artifacts).await
    }

    /// Workspace artifacts produced by the given Kubeflow run.
    pub async fn artifacts_by_run(&self, run_id: &str) -> Result<Vec<ArtifactRecord>> {
        let mut artifacts = self.artifacts().await?;
        artifacts.retain(|a| a.run_id == run_id);
        Ok(artifacts)
    }

    /// Lineage of a model artifact.
    ///
    /// 1. events of the model → executions that touched it
    /// 2. events of those executions → every artifact they used or produced
    /// 3. fetch those artifacts
    ///
    /// Any failing step aborts with that step's error.
    pub async fn lineage_by_model(&self, model_id: i64) -> Result<Lineage> {
        let model_events = self
            .connection
            .get_events_by_artifact_ids(vec![model_id])
            .await?;
        let execution_ids = convert::dedup_ids(model_events.iter().map(|e| e.execution_id()));

        if execution_ids.is_empty() {
            tracing::debug!(workspace = %self.record.name, model_id, "Model has no events");
            return Ok(Lineage {
                model_id,
                ..Default::default()
            });
        }

        let execution_events = self
            .connection
            .get_events_by_execution_ids(execution_ids.clone())
            .await?;
        let artifact_ids = convert::dedup_ids(execution_events.iter().map(|e| e.artifact_id()));

        let artifacts = self.connection.get_artifacts_by_id(artifact_ids).await?;
        let artifacts = shape_artifacts(&self.connection, &artifacts).await?;

        tracing::debug!(
            workspace = %self.record.name,
            model_id,
            executions = execution_ids.len(),
            artifacts = artifacts.len(),
            "Resolved model lineage"
        );

        Ok(Lineage {
            model_id,
            execution_ids,
            events: execution_events.iter().map(convert::lineage_event).collect(),
            artifacts,
        })
    }
}
