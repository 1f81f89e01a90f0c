//! Core types for the artifact registry.
//!
//! These are the simplified shapes handed back to callers. MLMD's generic
//! property bags are flattened into plain fields by [`crate::convert`].

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ─── MLMD conventions ────────────────────────────────────────────────────────

/// Context type under which Kubeflow records workspaces.
pub const WORKSPACE_CONTEXT_TYPE: &str = "kubeflow.org/alpha/workspace";

/// Artifact type names written by the Kubeflow metadata SDK.
pub const DATASET_TYPE: &str = "kubeflow.org/alpha/data_set";
pub const MODEL_TYPE: &str = "kubeflow.org/alpha/model";
pub const METRICS_TYPE: &str = "kubeflow.org/alpha/metrics";

/// Property keys read off artifacts.
pub const NAME_PROPERTY: &str = "name";
pub const VERSION_PROPERTY: &str = "version";
pub const RUN_PROPERTY: &str = "__kf_run__";
pub const WORKSPACE_PROPERTY: &str = "__kf_workspace__";

// ─── Artifact kind ───────────────────────────────────────────────────────────

/// Coarse artifact type tag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Dataset,
    Model,
    Metrics,
    /// Any type outside the Kubeflow conventions, or an unknown type id.
    #[default]
    Other,
}

impl ArtifactKind {
    /// Map an MLMD artifact type name to its kind.
    pub fn from_type_name(type_name: &str) -> Self {
        match type_name {
            DATASET_TYPE => ArtifactKind::Dataset,
            MODEL_TYPE => ArtifactKind::Model,
            METRICS_TYPE => ArtifactKind::Metrics,
            _ => ArtifactKind::Other,
        }
    }

    /// MLMD artifact type name for this kind. `Other` has none.
    pub fn type_name(self) -> Option<&'static str> {
        match self {
            ArtifactKind::Dataset => Some(DATASET_TYPE),
            ArtifactKind::Model => Some(MODEL_TYPE),
            ArtifactKind::Metrics => Some(METRICS_TYPE),
            ArtifactKind::Other => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ArtifactKind::Dataset => "dataset",
            ArtifactKind::Model => "model",
            ArtifactKind::Metrics => "metrics",
            ArtifactKind::Other => "other",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArtifactKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "dataset" | "data_set" => Ok(ArtifactKind::Dataset),
            "model" => Ok(ArtifactKind::Model),
            "metrics" => Ok(ArtifactKind::Metrics),
            "other" => Ok(ArtifactKind::Other),
            other => Err(format!(
                "unknown artifact kind '{}' (expected dataset, model, metrics or other)",
                other
            )),
        }
    }
}

// ─── Records ─────────────────────────────────────────────────────────────────

/// A flattened MLMD artifact.
///
/// Fields absent upstream are empty strings; `created_at` is `None` when the
/// store did not report a creation time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArtifactRecord {
    /// MLMD artifact id.
    pub id: i64,
    /// `properties["name"]`, or the artifact's own name when unset.
    pub name: String,
    /// Storage URI.
    pub uri: String,
    /// `properties["version"]`.
    pub version: String,
    /// Kubeflow run that produced the artifact (`__kf_run__`).
    pub run_id: String,
    /// Workspace the artifact was logged under (`__kf_workspace__`).
    pub workspace: String,
    /// Coarse type tag resolved through the store's artifact types.
    pub kind: ArtifactKind,
    pub created_at: Option<DateTime<Utc>>,
}

/// A workspace context as stored in MLMD.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceRecord {
    pub id: i64,
    pub name: String,
}

// ─── Lineage ─────────────────────────────────────────────────────────────────

/// Direction of an artifact/execution event, collapsed from MLMD's event types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventDirection {
    /// The artifact was consumed by the execution.
    Input,
    /// The artifact was produced by the execution.
    Output,
    Unknown,
}

/// One edge of the lineage graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineageEvent {
    pub artifact_id: i64,
    pub execution_id: i64,
    pub direction: EventDirection,
}

/// Lineage of a model: every execution that touched it and every artifact
/// those executions consumed or produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Lineage {
    pub model_id: i64,
    /// Executions with an event on the model (sorted, unique).
    pub execution_ids: Vec<i64>,
    /// Events of those executions.
    pub events: Vec<LineageEvent>,
    /// Artifacts referenced by those events, the model included.
    pub artifacts: Vec<ArtifactRecord>,
}

impl Lineage {
    /// Artifacts that fed into the given execution.
    pub fn inputs_of(&self, execution_id: i64) -> Vec<&ArtifactRecord> {
        self.related(execution_id, EventDirection::Input)
    }

    /// Artifacts produced by the given execution.
    pub fn outputs_of(&self, execution_id: i64) -> Vec<&ArtifactRecord> {
        self.related(execution_id, EventDirection::Output)
    }

    fn related(&self, execution_id: i64, direction: EventDirection) -> Vec<&ArtifactRecord> {
        self.artifacts
            .iter()
            .filter(|a| {
                self.events.iter().any(|e| {
                    e.execution_id == execution_id
                        && e.direction == direction
                        && e.artifact_id == a.id
                })
            })
            .collect()
    }
}
