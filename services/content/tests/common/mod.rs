#![allow(dead_code)]

use axum::body::Body;
use axum::http::Request;
use modware_content::app::AppState;
use modware_content::message::memory::{ChannelPublisher, PublishedEvent, StaticUserDirectory};
use modware_content::service::{ContentService, ServiceConfig};
use modware_content::store::memory::InMemoryStore;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;

pub const CREATOR: &str = "a@b.org";
pub const BASE_URL: &str = "http://localhost:9560";

pub struct TestApp {
    pub state: AppState,
    pub events: UnboundedReceiver<PublishedEvent>,
}

pub fn test_app() -> TestApp {
    let (publisher, events) = ChannelPublisher::new();
    let service = ContentService::new(
        ServiceConfig::new(BASE_URL),
        Arc::new(InMemoryStore::new()),
        Arc::new(StaticUserDirectory::new([CREATOR, "p@p.com"])),
        Arc::new(publisher),
    )
    .expect("service");
    TestApp {
        state: AppState::new(Arc::new(service)),
        events,
    }
}

pub async fn read_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json")
}

pub fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

pub fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

pub fn store_body(namespace: &str, name: &str) -> serde_json::Value {
    serde_json::json!({
        "data": {
            "type": "contents",
            "attributes": {
                "name": name,
                "namespace": namespace,
                "created_by": CREATOR,
                "content": "{\"blocks\":[]}"
            }
        }
    })
}
