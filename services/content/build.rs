//! Build script for the content service.
//!
//! Generates the `ContentService` gRPC server and client glue with
//! `tonic_build::manual`. Message types are declared by hand in
//! `src/rpc/proto.rs`, so no `protoc` is needed at build time.

use tonic_build::manual::{Builder, Method, Service};

const CODEC: &str = "tonic::codec::ProstCodec";

fn unary(name: &str, route: &str, input: &str, output: &str) -> Method {
    Method::builder()
        .name(name)
        .route_name(route)
        .input_type(format!("crate::rpc::proto::{input}"))
        .output_type(format!("crate::rpc::proto::{output}"))
        .codec_path(CODEC)
        .build()
}

fn main() {
    let service = Service::builder()
        .name("ContentService")
        .package("dictybase.content.v1")
        .method(unary("healthz", "Healthz", "HealthzIdRequest", "Empty"))
        .method(unary(
            "get_content_by_slug",
            "GetContentBySlug",
            "ContentRequest",
            "Content",
        ))
        .method(unary("get_content", "GetContent", "ContentIdRequest", "Content"))
        .method(unary(
            "store_content",
            "StoreContent",
            "StoreContentRequest",
            "Content",
        ))
        .method(unary(
            "update_content",
            "UpdateContent",
            "UpdateContentRequest",
            "Content",
        ))
        .method(unary(
            "delete_content",
            "DeleteContent",
            "ContentIdRequest",
            "Empty",
        ))
        .build();

    Builder::new().compile(&[service]);
}
