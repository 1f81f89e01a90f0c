//! gRPC connection to the MLMD `MetadataStoreService`.
//!
//! One typed method per RPC the registry uses. Each call carries the
//! configured per-call deadline and maps failures into
//! [`RegistryError::Rpc`] tagged with the RPC name.

use std::time::Duration;

use tonic::transport::{Channel, Endpoint};
use tonic::{Request, Status};

use crate::config::RegistryConfig;
use crate::error::{RegistryError, Result};
use crate::proto::{
    Artifact, ArtifactType, Context, Event, GetArtifactTypesRequest, GetArtifactsByContextRequest,
    GetArtifactsByIdRequest, GetArtifactsByTypeRequest, GetContextByTypeAndNameRequest,
    GetContextsByTypeRequest, GetEventsByArtifactIDsRequest, GetEventsByExecutionIDsRequest,
    MetadataStoreServiceClient,
};

/// Shared handle to the metadata store. Cloning is cheap: clones share the
/// underlying channel.
#[derive(Debug, Clone)]
pub struct MetadataStoreConnection {
    client: MetadataStoreServiceClient<Channel>,
    endpoint: String,
    timeout: Duration,
}

impl MetadataStoreConnection {
    /// Dial the store and wait for the connection to come up.
    pub async fn connect(config: &RegistryConfig) -> Result<Self> {
        let endpoint = build_endpoint(config)?;
        let channel = endpoint
            .connect()
            .await
            .map_err(|source| RegistryError::Connect {
                endpoint: config.endpoint(),
                source,
            })?;

        tracing::info!(endpoint = %config.endpoint(), "Connected to metadata store");
        Ok(Self::from_channel(channel, config))
    }

    /// Create the channel without dialing. The first RPC connects.
    pub fn connect_lazy(config: &RegistryConfig) -> Result<Self> {
        let channel = build_endpoint(config)?.connect_lazy();
        tracing::debug!(endpoint = %config.endpoint(), "Created lazy metadata store channel");
        Ok(Self::from_channel(channel, config))
    }

    /// Connect using `MLMD_*` environment variables.
    pub async fn from_env() -> Result<Self> {
        Self::connect(&RegistryConfig::from_env()?).await
    }

    fn from_channel(channel: Channel, config: &RegistryConfig) -> Self {
        Self {
            client: MetadataStoreServiceClient::new(channel),
            endpoint: config.endpoint(),
            timeout: config.timeout(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn request<T>(&self, message: T) -> Request<T> {
        let mut request = Request::new(message);
        request.set_timeout(self.timeout);
        request
    }

    pub async fn get_artifacts_by_id(&self, artifact_ids: Vec<i64>) -> Result<Vec<Artifact>> {
        const OP: &str = "GetArtifactsByID";
        tracing::debug!(operation = OP, count = artifact_ids.len(), "MLMD call");

        let response = self
            .client
            .clone()
            .get_artifacts_by_id(self.request(GetArtifactsByIdRequest { artifact_ids }))
            .await
            .map_err(|s| rpc_failed(OP, s))?;
        Ok(response.into_inner().artifacts)
    }

    pub async fn get_artifact_types(&self) -> Result<Vec<ArtifactType>> {
        const OP: &str = "GetArtifactTypes";
        tracing::debug!(operation = OP, "MLMD call");

        let response = self
            .client
            .clone()
            .get_artifact_types(self.request(GetArtifactTypesRequest {}))
            .await
            .map_err(|s| rpc_failed(OP, s))?;
        Ok(response.into_inner().artifact_types)
    }

    pub async fn get_artifacts_by_type(&self, type_name: &str) -> Result<Vec<Artifact>> {
        const OP: &str = "GetArtifactsByType";
        tracing::debug!(operation = OP, type_name, "MLMD call");

        let request = GetArtifactsByTypeRequest {
            type_name: Some(type_name.to_string()),
            type_version: None,
        };
        let response = self
            .client
            .clone()
            .get_artifacts_by_type(self.request(request))
            .await
            .map_err(|s| rpc_failed(OP, s))?;
        Ok(response.into_inner().artifacts)
    }

    /// `None` when the store has no context with that type and name.
    pub async fn get_context_by_type_and_name(
        &self,
        type_name: &str,
        context_name: &str,
    ) -> Result<Option<Context>> {
        const OP: &str = "GetContextByTypeAndName";
        tracing::debug!(operation = OP, type_name, context_name, "MLMD call");

        let request = GetContextByTypeAndNameRequest {
            type_name: Some(type_name.to_string()),
            context_name: Some(context_name.to_string()),
            type_version: None,
        };
        let response = self
            .client
            .clone()
            .get_context_by_type_and_name(self.request(request))
            .await
            .map_err(|s| rpc_failed(OP, s))?;
        Ok(response.into_inner().context)
    }

    pub async fn get_contexts_by_type(&self, type_name: &str) -> Result<Vec<Context>> {
        const OP: &str = "GetContextsByType";
        tracing::debug!(operation = OP, type_name, "MLMD call");

        let request = GetContextsByTypeRequest {
            type_name: Some(type_name.to_string()),
            type_version: None,
        };
        let response = self
            .client
            .clone()
            .get_contexts_by_type(self.request(request))
            .await
            .map_err(|s| rpc_failed(OP, s))?;
        Ok(response.into_inner().contexts)
    }

    pub async fn get_artifacts_by_context(&self, context_id: i64) -> Result<Vec<Artifact>> {
        const OP: &str = "GetArtifactsByContext";
        tracing::debug!(operation = OP, context_id, "MLMD call");

        let request = GetArtifactsByContextRequest {
            context_id: Some(context_id),
        };
        let response = self
            .client
            .clone()
            .get_artifacts_by_context(self.request(request))
            .await
            .map_err(|s| rpc_failed(OP, s))?;
        Ok(response.into_inner().artifacts)
    }

    pub async fn get_events_by_artifact_ids(&self, artifact_ids: Vec<i64>) -> Result<Vec<Event>> {
        const OP: &str = "GetEventsByArtifactIDs";
        tracing::debug!(operation = OP, count = artifact_ids.len(), "MLMD call");

        let response = self
            .client
            .clone()
            .get_events_by_artifact_i_ds(self.request(GetEventsByArtifactIDsRequest {
                artifact_ids,
            }))
            .await
            .map_err(|s| rpc_failed(OP, s))?;
        Ok(response.into_inner().events)
    }

    pub async fn get_events_by_execution_ids(&self, execution_ids: Vec<i64>) -> Result<Vec<Event>> {
        const OP: &str = "GetEventsByExecutionIDs";
        tracing::debug!(operation = OP, count = execution_ids.len(), "MLMD call");

        let response = self
            .client
            .clone()
            .get_events_by_execution_i_ds(self.request(GetEventsByExecutionIDsRequest {
                execution_ids,
            }))
            .await
            .map_err(|s| rpc_failed(OP, s))?;
        Ok(response.into_inner().events)
    }
}

fn build_endpoint(config: &RegistryConfig) -> Result<Endpoint> {
    let endpoint = Endpoint::from_shared(config.endpoint()).map_err(|source| {
        RegistryError::InvalidEndpoint {
            endpoint: config.endpoint(),
            source,
        }
    })?;
    Ok(endpoint
        .connect_timeout(config.connect_timeout())
        .timeout(config.timeout()))
}

fn rpc_failed(operation: &'static str, status: Status) -> RegistryError {
    tracing::debug!(
        operation,
        code = ?status.code(),
        status_message = status.message(),
        "MLMD call failed"
    );
    RegistryError::rpc(operation, status)
}
