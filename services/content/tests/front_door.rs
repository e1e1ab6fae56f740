mod common;

use common::{CREATOR, store_body, test_app};
use modware_content::app::{build_router, grpc_routes};
use modware_content::frontdoor::{FrontDoor, FrontDoorError};
use modware_content::rpc::{ContentServiceClient, proto};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

struct Running {
    addr: SocketAddr,
    stop: oneshot::Sender<()>,
    server: JoinHandle<Result<(), FrontDoorError>>,
}

async fn start() -> Running {
    let test = test_app();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let front_door = FrontDoor::new(listener)
        .with_sniff_timeout(Duration::from_secs(2))
        .with_shutdown_grace(Duration::from_secs(5));
    let addr = front_door.local_addr().expect("addr");
    let (stop, stop_rx) = oneshot::channel::<()>();
    let grpc = grpc_routes(&test.state).expect("grpc routes");
    let http = build_router(test.state);
    let server = tokio::spawn(front_door.serve(grpc, http, async move {
        let _ = stop_rx.await;
    }));
    Running { addr, stop, server }
}

impl Running {
    async fn shutdown(self) {
        let _ = self.stop.send(());
        let result = tokio::time::timeout(Duration::from_secs(15), self.server)
            .await
            .expect("front door stopped in time")
            .expect("join");
        assert!(result.is_ok(), "{result:?}");
    }
}

fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .no_proxy()
        .build()
        .expect("client")
}

fn http2_client() -> reqwest::Client {
    reqwest::Client::builder()
        .http2_prior_knowledge()
        .timeout(Duration::from_secs(5))
        .no_proxy()
        .build()
        .expect("client")
}

async fn grpc_client(addr: SocketAddr) -> ContentServiceClient<tonic::transport::Channel> {
    ContentServiceClient::connect(format!("http://{addr}"))
        .await
        .expect("grpc connect")
}

#[tokio::test(flavor = "multi_thread")]
async fn grpc_and_http_share_one_port() {
    let running = start().await;
    let mut grpc = grpc_client(running.addr).await;

    grpc.healthz(proto::HealthzIdRequest::default())
        .await
        .expect("grpc healthz");

    let created = grpc
        .store_content(proto::StoreContentRequest {
            data: Some(proto::StoreContentData {
                r#type: "contents".into(),
                attributes: Some(proto::NewContentAttributes {
                    name: "catalog".into(),
                    namespace: "dsc".into(),
                    created_by: CREATOR.into(),
                    content: "{}".into(),
                }),
            }),
        })
        .await
        .expect("grpc store")
        .into_inner();
    let data = created.data.expect("data");
    assert_eq!(
        data.attributes.as_ref().map(|attrs| attrs.slug.as_str()),
        Some("dsc-catalog")
    );

    let http = http_client();
    let response = http
        .get(format!("http://{}/contents/{}", running.addr, data.id))
        .send()
        .await
        .expect("http get");
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let body: serde_json::Value = response.json().await.expect("json");
    assert_eq!(body["data"]["id"], data.id);
    assert_eq!(body["data"]["attributes"]["slug"], "dsc-catalog");

    let response = http
        .get(format!("http://{}/healthz", running.addr))
        .send()
        .await
        .expect("http healthz");
    assert_eq!(response.status(), reqwest::StatusCode::OK);

    let by_slug = grpc
        .get_content_by_slug(proto::ContentRequest {
            slug: "dsc-catalog".into(),
        })
        .await
        .expect("grpc get by slug")
        .into_inner();
    assert_eq!(by_slug.data.map(|data| data.id), Some(data.id));

    drop(grpc);
    running.shutdown().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn grpc_errors_carry_status_codes() {
    let running = start().await;
    let mut grpc = grpc_client(running.addr).await;

    let status = grpc
        .get_content(proto::ContentIdRequest { id: 404 })
        .await
        .expect_err("missing");
    assert_eq!(status.code(), tonic::Code::NotFound);

    let status = grpc
        .store_content(proto::StoreContentRequest { data: None })
        .await
        .expect_err("no data");
    assert_eq!(status.code(), tonic::Code::InvalidArgument);

    drop(grpc);
    running.shutdown().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn http2_json_requests_reach_the_gateway() {
    let running = start().await;
    let client = http2_client();

    let response = client
        .post(format!("http://{}/contents", running.addr))
        .json(&store_body("dsc", "catalog"))
        .send()
        .await
        .expect("h2 store");
    assert_eq!(response.version(), reqwest::Version::HTTP_2);
    assert_eq!(response.status(), reqwest::StatusCode::CREATED);
    let created: serde_json::Value = response.json().await.expect("json");
    let id = created["data"]["id"].as_i64().expect("id");

    let response = client
        .get(format!("http://{}/contents/{id}", running.addr))
        .send()
        .await
        .expect("h2 get");
    assert_eq!(response.version(), reqwest::Version::HTTP_2);
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert!(response.headers().get("grpc-status").is_none());
    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(content_type.starts_with("application/json"), "{content_type}");
    let body: serde_json::Value = response.json().await.expect("json");
    assert_eq!(body["data"]["attributes"]["slug"], "dsc-catalog");

    let response = client
        .get(format!("http://{}/contents/{}", running.addr, id + 1))
        .send()
        .await
        .expect("h2 missing");
    assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);
    let body: serde_json::Value = response.json().await.expect("json");
    assert_eq!(body["code"], "not_found");

    let mut grpc = grpc_client(running.addr).await;
    let fetched = grpc
        .get_content(proto::ContentIdRequest { id })
        .await
        .expect("grpc get")
        .into_inner();
    assert_eq!(fetched.data.map(|data| data.id), Some(id));

    drop(grpc);
    drop(client);
    running.shutdown().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn silent_connection_does_not_block_others() {
    let running = start().await;
    let _idle = tokio::net::TcpStream::connect(running.addr)
        .await
        .expect("idle connect");

    let response = http_client()
        .get(format!("http://{}/healthz", running.addr))
        .send()
        .await
        .expect("http healthz");
    assert_eq!(response.status(), reqwest::StatusCode::OK);

    running.shutdown().await;
}
