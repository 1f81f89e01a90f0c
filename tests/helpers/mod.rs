//! In-process fake of the MLMD `MetadataStoreService`.
//!
//! Serves a small fixed catalogue over a real tonic server on an ephemeral
//! port, counts calls per RPC, and can be told to fail a given RPC.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::net::TcpListener;
use tonic::transport::Server;
use tonic::{Request, Response, Status};

use artifact_registry::proto::{
    event, value, Artifact, ArtifactType, Context, Event, GetArtifactTypesRequest,
    GetArtifactTypesResponse, GetArtifactsByContextRequest, GetArtifactsByContextResponse,
    GetArtifactsByIdRequest, GetArtifactsByIdResponse, GetArtifactsByTypeRequest,
    GetArtifactsByTypeResponse, GetContextByTypeAndNameRequest, GetContextByTypeAndNameResponse,
    GetContextsByTypeRequest, GetContextsByTypeResponse, GetEventsByArtifactIDsRequest,
    GetEventsByArtifactIDsResponse, GetEventsByExecutionIDsRequest,
    GetEventsByExecutionIDsResponse, MetadataStoreService, MetadataStoreServiceServer, Value,
};
use artifact_registry::types::{
    DATASET_TYPE, METRICS_TYPE, MODEL_TYPE, WORKSPACE_CONTEXT_TYPE,
};
use artifact_registry::{ArtifactStore, RegistryConfig};

// ---------------------------------------------------------------------------
// Fixture ids
// ---------------------------------------------------------------------------

pub const WS_MNIST: i64 = 100;
pub const WS_CIFAR: i64 = 101;

pub const MNIST_TRAIN: i64 = 1;
pub const MNIST_CNN: i64 = 2;
pub const MNIST_EVAL: i64 = 3;
pub const CIFAR_RESNET: i64 = 4;
pub const MNIST_NOTES: i64 = 5;
/// Model with no recorded events.
pub const ORPHAN_MODEL: i64 = 6;

pub const TRAIN_EXECUTION: i64 = 10;
pub const EVAL_EXECUTION: i64 = 11;
pub const CIFAR_EXECUTION: i64 = 12;

// ---------------------------------------------------------------------------
// Fake service
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Catalogue {
    types: Vec<ArtifactType>,
    artifacts: Vec<Artifact>,
    contexts: Vec<Context>,
    /// context id -> artifact ids
    attributions: HashMap<i64, Vec<i64>>,
    events: Vec<Event>,
}

#[derive(Clone, Default)]
pub struct FakeMetadataStore {
    catalogue: Arc<Catalogue>,
    calls: Arc<Mutex<HashMap<&'static str, usize>>>,
    failing: Arc<Mutex<Option<&'static str>>>,
    stalled: Arc<Mutex<Option<(&'static str, Duration)>>>,
    /// `artifact_ids` of every GetArtifactsByID request, in arrival order.
    artifact_id_requests: Arc<Mutex<Vec<Vec<i64>>>>,
}

impl FakeMetadataStore {
    pub fn seeded() -> Self {
        Self {
            catalogue: Arc::new(seed()),
            ..Default::default()
        }
    }

    /// Number of times an RPC was served (failed calls included).
    pub fn calls(&self, rpc: &str) -> usize {
        self.calls.lock().unwrap().get(rpc).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }

    /// Make `rpc` answer UNAVAILABLE from now on.
    pub fn fail(&self, rpc: &'static str) {
        *self.failing.lock().unwrap() = Some(rpc);
    }

    /// Make `rpc` sleep for `delay` before answering.
    pub fn stall(&self, rpc: &'static str, delay: Duration) {
        *self.stalled.lock().unwrap() = Some((rpc, delay));
    }

    pub fn artifact_id_requests(&self) -> Vec<Vec<i64>> {
        self.artifact_id_requests.lock().unwrap().clone()
    }

    async fn enter(&self, rpc: &'static str) -> Result<(), Status> {
        *self.calls.lock().unwrap().entry(rpc).or_insert(0) += 1;
        let stall = *self.stalled.lock().unwrap();
        if let Some((stalled_rpc, delay)) = stall {
            if stalled_rpc == rpc {
                tokio::time::sleep(delay).await;
            }
        }
        if *self.failing.lock().unwrap() == Some(rpc) {
            return Err(Status::unavailable(format!("{} is down", rpc)));
        }
        Ok(())
    }

    fn artifacts_with_ids(&self, ids: &[i64]) -> Vec<Artifact> {
        self.catalogue
            .artifacts
            .iter()
            .filter(|a| ids.contains(&a.id()))
            .cloned()
            .collect()
    }
}

#[tonic::async_trait]
impl MetadataStoreService for FakeMetadataStore {
    async fn get_artifacts_by_id(
        &self,
        request: Request<GetArtifactsByIdRequest>,
    ) -> Result<Response<GetArtifactsByIdResponse>, Status> {
        self.enter("GetArtifactsByID").await?;
        let req = request.into_inner();
        self.artifact_id_requests
            .lock()
            .unwrap()
            .push(req.artifact_ids.clone());
        Ok(Response::new(GetArtifactsByIdResponse {
            artifacts: self.artifacts_with_ids(&req.artifact_ids),
        }))
    }

    async fn get_artifact_types(
        &self,
        _request: Request<GetArtifactTypesRequest>,
    ) -> Result<Response<GetArtifactTypesResponse>, Status> {
        self.enter("GetArtifactTypes").await?;
        Ok(Response::new(GetArtifactTypesResponse {
            artifact_types: self.catalogue.types.clone(),
        }))
    }

    async fn get_artifacts_by_type(
        &self,
        request: Request<GetArtifactsByTypeRequest>,
    ) -> Result<Response<GetArtifactsByTypeResponse>, Status> {
        self.enter("GetArtifactsByType").await?;
        let req = request.into_inner();
        let type_id = self
            .catalogue
            .types
            .iter()
            .find(|t| t.name() == req.type_name())
            .map(|t| t.id());
        let artifacts = self
            .catalogue
            .artifacts
            .iter()
            .filter(|a| Some(a.type_id()) == type_id)
            .cloned()
            .collect();
        Ok(Response::new(GetArtifactsByTypeResponse {
            artifacts,
            next_page_token: None,
        }))
    }

    async fn get_context_by_type_and_name(
        &self,
        request: Request<GetContextByTypeAndNameRequest>,
    ) -> Result<Response<GetContextByTypeAndNameResponse>, Status> {
        self.enter("GetContextByTypeAndName").await?;
        let req = request.into_inner();
        let context = self
            .catalogue
            .contexts
            .iter()
            .find(|c| c.r#type() == req.type_name() && c.name() == req.context_name())
            .cloned();
        Ok(Response::new(GetContextByTypeAndNameResponse { context }))
    }

    async fn get_contexts_by_type(
        &self,
        request: Request<GetContextsByTypeRequest>,
    ) -> Result<Response<GetContextsByTypeResponse>, Status> {
        self.enter("GetContextsByType").await?;
        let req = request.into_inner();
        let contexts = self
            .catalogue
            .contexts
            .iter()
            .filter(|c| c.r#type() == req.type_name())
            .cloned()
            .collect();
        Ok(Response::new(GetContextsByTypeResponse {
            contexts,
            next_page_token: None,
        }))
    }

    async fn get_artifacts_by_context(
        &self,
        request: Request<GetArtifactsByContextRequest>,
    ) -> Result<Response<GetArtifactsByContextResponse>, Status> {
        self.enter("GetArtifactsByContext").await?;
        let req = request.into_inner();
        let ids = self
            .catalogue
            .attributions
            .get(&req.context_id())
            .cloned()
            .unwrap_or_default();
        Ok(Response::new(GetArtifactsByContextResponse {
            artifacts: self.artifacts_with_ids(&ids),
            next_page_token: None,
        }))
    }

    async fn get_events_by_artifact_i_ds(
        &self,
        request: Request<GetEventsByArtifactIDsRequest>,
    ) -> Result<Response<GetEventsByArtifactIDsResponse>, Status> {
        self.enter("GetEventsByArtifactIDs").await?;
        let req = request.into_inner();
        let events = self
            .catalogue
            .events
            .iter()
            .filter(|e| req.artifact_ids.contains(&e.artifact_id()))
            .cloned()
            .collect();
        Ok(Response::new(GetEventsByArtifactIDsResponse { events }))
    }

    async fn get_events_by_execution_i_ds(
        &self,
        request: Request<GetEventsByExecutionIDsRequest>,
    ) -> Result<Response<GetEventsByExecutionIDsResponse>, Status> {
        self.enter("GetEventsByExecutionIDs").await?;
        let req = request.into_inner();
        let events = self
            .catalogue
            .events
            .iter()
            .filter(|e| req.execution_ids.contains(&e.execution_id()))
            .cloned()
            .collect();
        Ok(Response::new(GetEventsByExecutionIDsResponse { events }))
    }
}

// ---------------------------------------------------------------------------
// Test rig
// ---------------------------------------------------------------------------

pub struct TestRig {
    pub fake: FakeMetadataStore,
    pub addr: SocketAddr,
    pub store: ArtifactStore,
}

impl TestRig {
    /// Start the fake on a random port and connect a store to it.
    pub async fn setup() -> Self {
        Self::setup_with(|_| {}).await
    }

    /// Like [`TestRig::setup`], letting the caller adjust the client config.
    pub async fn setup_with(adjust: impl FnOnce(&mut RegistryConfig)) -> Self {
        let fake = FakeMetadataStore::seeded();
        let addr = spawn_server(fake.clone()).await;
        let mut config = Self::config(addr);
        adjust(&mut config);
        let store = ArtifactStore::connect("test-run", &config)
            .await
            .expect("Failed to connect to in-process metadata store");
        Self { fake, addr, store }
    }

    pub fn config(addr: SocketAddr) -> RegistryConfig {
        RegistryConfig::new(addr.ip().to_string(), addr.port())
    }
}

pub async fn spawn_server(fake: FakeMetadataStore) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind TCP listener");
    let addr = listener.local_addr().expect("Failed to get local address");

    tokio::spawn(async move {
        Server::builder()
            .add_service(MetadataStoreServiceServer::new(fake))
            .serve_with_incoming(tokio_stream::wrappers::TcpListenerStream::new(listener))
            .await
            .expect("gRPC server failed");
    });

    addr
}

// ---------------------------------------------------------------------------
// Fixture
// ---------------------------------------------------------------------------

fn string_value(s: &str) -> Value {
    Value {
        value: Some(value::Value::StringValue(s.to_string())),
    }
}

fn artifact_type(id: i64, name: &str) -> ArtifactType {
    ArtifactType {
        id: Some(id),
        name: Some(name.to_string()),
        ..Default::default()
    }
}

fn artifact(id: i64, type_id: i64, name: &str, version: &str, run: &str, ws: &str) -> Artifact {
    let mut artifact = Artifact {
        id: Some(id),
        type_id: Some(type_id),
        uri: Some(format!("gs://kf-artifacts/{}", name)),
        create_time_since_epoch: Some(1_700_000_000_000 + id),
        ..Default::default()
    };
    artifact
        .properties
        .insert("name".to_string(), string_value(name));
    artifact
        .properties
        .insert("version".to_string(), string_value(version));
    artifact
        .custom_properties
        .insert("__kf_run__".to_string(), string_value(run));
    artifact
        .custom_properties
        .insert("__kf_workspace__".to_string(), string_value(ws));
    artifact
}

fn workspace(id: i64, name: &str) -> Context {
    Context {
        id: Some(id),
        name: Some(name.to_string()),
        r#type: Some(WORKSPACE_CONTEXT_TYPE.to_string()),
        ..Default::default()
    }
}

fn event(artifact_id: i64, execution_id: i64, event_type: event::Type) -> Event {
    Event {
        artifact_id: Some(artifact_id),
        execution_id: Some(execution_id),
        r#type: Some(event_type as i32),
        ..Default::default()
    }
}

fn seed() -> Catalogue {
    let types = vec![
        artifact_type(1, DATASET_TYPE),
        artifact_type(2, MODEL_TYPE),
        artifact_type(3, METRICS_TYPE),
        artifact_type(4, "system.Artifact"),
    ];

    let artifacts = vec![
        artifact(MNIST_TRAIN, 1, "mnist-train", "v1", "run-a", "ws-mnist"),
        artifact(MNIST_CNN, 2, "mnist-cnn", "v1", "run-a", "ws-mnist"),
        artifact(MNIST_EVAL, 3, "mnist-eval", "v1", "run-b", "ws-mnist"),
        artifact(CIFAR_RESNET, 2, "cifar-resnet", "v3", "run-c", "ws-cifar"),
        artifact(MNIST_NOTES, 4, "notes", "", "run-b", "ws-mnist"),
        artifact(ORPHAN_MODEL, 2, "orphan", "v0", "", "ws-mnist"),
    ];

    let contexts = vec![
        workspace(WS_MNIST, "ws-mnist"),
        workspace(WS_CIFAR, "ws-cifar"),
        // Same name under a different context type must not resolve as a workspace
        Context {
            id: Some(200),
            name: Some("ws-mnist".to_string()),
            r#type: Some("kubeflow.org/alpha/execution".to_string()),
            ..Default::default()
        },
    ];

    let attributions = HashMap::from([
        (
            WS_MNIST,
            vec![MNIST_TRAIN, MNIST_CNN, MNIST_EVAL, MNIST_NOTES, ORPHAN_MODEL],
        ),
        (WS_CIFAR, vec![CIFAR_RESNET]),
    ]);

    let events = vec![
        // training: dataset in, model out (reported twice)
        event(MNIST_TRAIN, TRAIN_EXECUTION, event::Type::Input),
        event(MNIST_CNN, TRAIN_EXECUTION, event::Type::PendingOutput),
        event(MNIST_CNN, TRAIN_EXECUTION, event::Type::Output),
        // evaluation: model and dataset in, metrics out
        event(MNIST_CNN, EVAL_EXECUTION, event::Type::Input),
        event(MNIST_TRAIN, EVAL_EXECUTION, event::Type::DeclaredInput),
        event(MNIST_EVAL, EVAL_EXECUTION, event::Type::Output),
        // unrelated workspace
        event(CIFAR_RESNET, CIFAR_EXECUTION, event::Type::Output),
    ];

    Catalogue {
        types,
        artifacts,
        contexts,
        attributions,
        events,
    }
}
