//! Response shaping: MLMD property-bag records into registry records.
//!
//! Everything here is pure. The only remote dependency, the artifact type
//! table, is fetched by the caller and passed in as an [`ArtifactTypeMap`].

use std::collections::HashMap;

use chrono::DateTime;

use crate::proto::{event, value, Artifact, ArtifactType, Context, Event, Value};
use crate::types::{
    ArtifactKind, ArtifactRecord, EventDirection, LineageEvent, WorkspaceRecord, NAME_PROPERTY,
    RUN_PROPERTY, VERSION_PROPERTY, WORKSPACE_PROPERTY,
};

/// MLMD artifact type id → coarse kind.
pub type ArtifactTypeMap = HashMap<i64, ArtifactKind>;

/// Build the type-id lookup from a `GetArtifactTypes` response.
pub fn artifact_type_map(types: &[ArtifactType]) -> ArtifactTypeMap {
    types
        .iter()
        .map(|t| (t.id(), ArtifactKind::from_type_name(t.name())))
        .collect()
}

/// String value of a property, or `""` when missing or not a string.
pub fn string_property(properties: &HashMap<String, Value>, key: &str) -> String {
    match properties.get(key).and_then(|v| v.value.as_ref()) {
        Some(value::Value::StringValue(s)) => s.clone(),
        _ => String::new(),
    }
}

/// Flatten a single artifact.
pub fn artifact_record(artifact: &Artifact, types: &ArtifactTypeMap) -> ArtifactRecord {
    let mut name = string_property(&artifact.properties, NAME_PROPERTY);
    if name.is_empty() {
        name = artifact.name().to_string();
    }

    ArtifactRecord {
        id: artifact.id(),
        name,
        uri: artifact.uri().to_string(),
        version: string_property(&artifact.properties, VERSION_PROPERTY),
        run_id: string_property(&artifact.custom_properties, RUN_PROPERTY),
        workspace: string_property(&artifact.custom_properties, WORKSPACE_PROPERTY),
        kind: types
            .get(&artifact.type_id())
            .copied()
            .unwrap_or(ArtifactKind::Other),
        created_at: artifact
            .create_time_since_epoch
            .and_then(DateTime::from_timestamp_millis),
    }
}

/// Flatten a list of artifacts, preserving order.
pub fn prepare_artifacts(artifacts: &[Artifact], types: &ArtifactTypeMap) -> Vec<ArtifactRecord> {
    artifacts
        .iter()
        .map(|a| artifact_record(a, types))
        .collect()
}

/// True when the artifact was tagged with the given workspace name.
pub fn in_workspace(artifact: &Artifact, workspace: &str) -> bool {
    string_property(&artifact.custom_properties, WORKSPACE_PROPERTY) == workspace
}

pub fn workspace_record(context: &Context) -> WorkspaceRecord {
    WorkspaceRecord {
        id: context.id(),
        name: context.name().to_string(),
    }
}

/// Collapse MLMD event types into input/output.
pub fn event_direction(event_type: event::Type) -> EventDirection {
    use event::Type;

    match event_type {
        Type::Input | Type::DeclaredInput | Type::InternalInput => EventDirection::Input,
        Type::Output | Type::DeclaredOutput | Type::InternalOutput | Type::PendingOutput => {
            EventDirection::Output
        }
        Type::Unknown => EventDirection::Unknown,
    }
}

pub fn lineage_event(event: &Event) -> LineageEvent {
    LineageEvent {
        artifact_id: event.artifact_id(),
        execution_id: event.execution_id(),
        direction: event_direction(event.r#type()),
    }
}

/// Sorted, duplicate-free copy of the given ids.
pub fn dedup_ids(ids: impl IntoIterator<Item = i64>) -> Vec<i64> {
    let mut ids: Vec<i64> = ids.into_iter().collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}
