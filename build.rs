//! Build script for mlmd-artifact-registry

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=proto/ml_metadata/metadata_store.proto");
    println!("cargo:rerun-if-changed=proto/ml_metadata/metadata_store_service.proto");

    // Server stubs are only used by the in-process fake store in tests/
    tonic_build::configure()
        .build_server(true)
        .build_client(true)
        .compile_protos(
            &["proto/ml_metadata/metadata_store_service.proto"],
            &["proto"],
        )?;
    Ok(())
}
