//! Generated protobuf modules for the MLMD gRPC contract
//!
//! Compiled by `build.rs` from the `ml_metadata` protos under `proto/`.

pub mod ml_metadata {
    tonic::include_proto!("ml_metadata");
}

pub use ml_metadata::metadata_store_service_client::MetadataStoreServiceClient;
pub use ml_metadata::metadata_store_service_server::{
    MetadataStoreService, MetadataStoreServiceServer,
};
pub use ml_metadata::*;
