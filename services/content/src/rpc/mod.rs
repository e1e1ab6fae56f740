//! gRPC surface of the content service (`dictybase.content.v1.ContentService`).
pub mod convert;
pub mod descriptor;
pub mod proto;
mod server;

pub use server::ContentRpc;

/// Server and client glue generated by `build.rs`.
pub mod content_service {
    include!(concat!(
        env!("OUT_DIR"),
        "/dictybase.content.v1.ContentService.rs"
    ));
}

pub use content_service::content_service_client::ContentServiceClient;
pub use content_service::content_service_server::ContentServiceServer;
