//! Single-port protocol front door.
//!
//! # Purpose
//! Serves gRPC and the HTTP/JSON gateway from one `TcpListener`. Every accepted
//! connection is sniffed: a connection that opens with the HTTP/2 client
//! preface is handed to the tonic server, anything else to a hyper-util loop
//! running the Axum gateway. On HTTP/2 connections each request is dispatched
//! on its `content-type`: `application/grpc*` reaches the gRPC routes, all
//! other requests reach the gateway.
//!
//! # Task model
//! [`FrontDoor::serve`] runs three tasks: the accept/demux loop, the HTTP/2
//! server and the HTTP/1 server. Each reports its exit on a channel of capacity
//! three. The first report ends the front door and aborts the other tasks; an
//! error report fails it. The caller's shutdown future stops all three and
//! waits (bounded by the shutdown grace period) for them to finish.
//!
//! # Notes
//! - Sniffing is bounded by `sniff_timeout`; a client that sends nothing, or
//!   disconnects early, loses only its own connection.
//! - HTTP/2 is only recognised by prior knowledge (h2c); an `Upgrade: h2c`
//!   request stays on HTTP/1.
use axum::Router;
use axum::http::header::CONTENT_TYPE;
use bytes::{Buf, Bytes};
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto;
use hyper_util::service::TowerToHyperService;
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, ReadBuf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinSet;
use tokio_stream::wrappers::ReceiverStream;
use tonic::transport::server::Connected;
use tower::ServiceExt;
use tracing_opentelemetry::OpenTelemetrySpanExt;

/// Client connection preface every HTTP/2 connection starts with.
pub const H2_PREFACE: &[u8] = b"PRI * HTTP/2.0\r\n\r\nSM\r\n\r\n";

pub const DEFAULT_SNIFF_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

const CONNECTION_BACKLOG: usize = 128;

#[derive(Debug, Error)]
pub enum FrontDoorError {
    #[error("accept failed: {0}")]
    Accept(#[source] io::Error),
    #[error("http/2 server failed: {0}")]
    Grpc(#[from] tonic::transport::Error),
    #[error("{0} task ended unexpectedly")]
    TaskExited(&'static str),
    #[error("front door task panicked: {0}")]
    Panicked(#[from] tokio::task::JoinError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Http2,
    Http1,
}

/// Accepted connection with its sniffed bytes queued for replay.
#[derive(Debug)]
pub struct MuxedStream {
    prefix: Bytes,
    inner: TcpStream,
}

impl MuxedStream {
    pub fn new(prefix: impl Into<Bytes>, inner: TcpStream) -> Self {
        Self {
            prefix: prefix.into(),
            inner,
        }
    }

    pub fn peer_addr(&self) -> io::Result<SocketAddr> {
        self.inner.peer_addr()
    }
}

impl AsyncRead for MuxedStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        if self.prefix.has_remaining() {
            let n = self.prefix.len().min(buf.remaining());
            buf.put_slice(&self.prefix[..n]);
            self.prefix.advance(n);
            return Poll::Ready(Ok(()));
        }
        Pin::new(&mut self.inner).poll_read(cx, buf)
    }
}

impl AsyncWrite for MuxedStream {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.inner).poll_write(cx, buf)
    }

    fn poll_write_vectored(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        bufs: &[io::IoSlice<'_>],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.inner).poll_write_vectored(cx, bufs)
    }

    fn is_write_vectored(&self) -> bool {
        self.inner.is_write_vectored()
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_shutdown(cx)
    }
}

impl Connected for MuxedStream {
    type ConnectInfo = <TcpStream as Connected>::ConnectInfo;

    fn connect_info(&self) -> Self::ConnectInfo {
        self.inner.connect_info()
    }
}

/// Whether a request carries gRPC framing (`application/grpc`, `+proto`, ...).
pub fn is_grpc_request<B>(request: &axum::http::Request<B>) -> bool {
    request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/grpc"))
}

/// Route table for HTTP/2 connections: gRPC requests go to `grpc`, the rest
/// to the gateway.
pub fn http2_router(grpc: tonic::service::Routes, http: Router) -> Router {
    let grpc = grpc.into_axum_router();
    let dispatch = tower::service_fn(move |request: axum::extract::Request| {
        let target = if is_grpc_request(&request) {
            grpc.clone()
        } else {
            http.clone()
        };
        target.oneshot(request)
    });
    Router::new().fallback_service(dispatch)
}

/// Read up to the length of [`H2_PREFACE`] and classify the connection.
///
/// Reading stops at the first byte that diverges from the preface, so an
/// HTTP/1 client is never waited on for more than its first segment.
///
/// # Errors
/// - `TimedOut` if nothing conclusive arrives within `timeout`.
/// - `UnexpectedEof` if the peer closes before sending anything.
pub async fn sniff(mut stream: TcpStream, timeout: Duration) -> io::Result<(Protocol, MuxedStream)> {
    let mut buf = vec![0u8; H2_PREFACE.len()];
    let mut filled = 0;
    let read = async {
        while filled < buf.len() {
            let n = stream.read(&mut buf[filled..]).await?;
            if n == 0 {
                break;
            }
            filled += n;
            if buf[..filled] != H2_PREFACE[..filled] {
                break;
            }
        }
        Ok::<_, io::Error>(())
    };
    tokio::time::timeout(timeout, read)
        .await
        .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "protocol sniff timed out"))??;

    if filled == 0 {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "connection closed before sending data",
        ));
    }
    buf.truncate(filled);
    let protocol = if buf == H2_PREFACE {
        Protocol::Http2
    } else {
        Protocol::Http1
    };
    Ok((protocol, MuxedStream::new(buf, stream)))
}

pub struct FrontDoor {
    listener: TcpListener,
    sniff_timeout: Duration,
    shutdown_grace: Duration,
}

impl FrontDoor {
    pub fn new(listener: TcpListener) -> Self {
        Self {
            listener,
            sniff_timeout: DEFAULT_SNIFF_TIMEOUT,
            shutdown_grace: DEFAULT_SHUTDOWN_GRACE,
        }
    }

    pub fn with_sniff_timeout(mut self, timeout: Duration) -> Self {
        self.sniff_timeout = timeout;
        self
    }

    pub fn with_shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = grace;
        self
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serve both protocols until a task exits or `shutdown` resolves.
    ///
    /// # Errors
    /// - [`FrontDoorError::Accept`] when the listener fails.
    /// - [`FrontDoorError::Grpc`] when the tonic server fails.
    /// - [`FrontDoorError::TaskExited`] / [`FrontDoorError::Panicked`] when a
    ///   task stops on its own.
    pub async fn serve<F>(
        self,
        grpc: tonic::service::Routes,
        http: Router,
        shutdown: F,
    ) -> Result<(), FrontDoorError>
    where
        F: Future<Output = ()> + Send,
    {
        let (stop_tx, stop_rx) = watch::channel(false);
        let (h2_tx, h2_rx) = mpsc::channel::<io::Result<MuxedStream>>(CONNECTION_BACKLOG);
        let (http1_tx, http1_rx) = mpsc::channel::<MuxedStream>(CONNECTION_BACKLOG);
        let h2_routes = tonic::service::Routes::from(http2_router(grpc, http.clone()));
        let (report_tx, mut report_rx) =
            mpsc::channel::<(&'static str, Result<(), FrontDoorError>)>(3);

        let mut tasks = JoinSet::new();
        {
            let report = report_tx.clone();
            let stop = stop_rx.clone();
            let sniff_timeout = self.sniff_timeout;
            let listener = self.listener;
            tasks.spawn(async move {
                let result = accept_loop(listener, h2_tx, http1_tx, sniff_timeout, stop).await;
                let _ = report.send(("accept", result)).await;
            });
        }
        {
            let report = report_tx.clone();
            let stop = stop_rx.clone();
            tasks.spawn(async move {
                let result = serve_http2(h2_routes, h2_rx, stop).await;
                let _ = report.send(("http2", result)).await;
            });
        }
        {
            let report = report_tx;
            let stop = stop_rx;
            tasks.spawn(async move {
                let result = serve_http1(http, http1_rx, stop).await;
                let _ = report.send(("http1", result)).await;
            });
        }

        tokio::pin!(shutdown);
        tokio::select! {
            biased;
            Some((task, result)) = report_rx.recv() => {
                tasks.abort_all();
                tracing::warn!(task, "front door task exited; stopping");
                result?;
                Err(FrontDoorError::TaskExited(task))
            }
            Some(joined) = tasks.join_next() => {
                tasks.abort_all();
                joined?;
                // Reports are sent before a task returns.
                match report_rx.try_recv() {
                    Ok((_, Err(err))) => Err(err),
                    Ok((task, Ok(()))) => Err(FrontDoorError::TaskExited(task)),
                    Err(_) => Err(FrontDoorError::TaskExited("front door")),
                }
            }
            _ = &mut shutdown => {
                let _ = stop_tx.send(true);
                let drained = tokio::time::timeout(self.shutdown_grace, async {
                    while let Some(joined) = tasks.join_next().await {
                        joined?;
                    }
                    Ok::<_, FrontDoorError>(())
                })
                .await;
                match drained {
                    Ok(result) => result?,
                    Err(_) => {
                        tracing::warn!("front door shutdown grace elapsed; aborting tasks");
                        tasks.abort_all();
                    }
                }
                while let Ok((_, result)) = report_rx.try_recv() {
                    result?;
                }
                Ok(())
            }
        }
    }
}

async fn stopped(mut stop: watch::Receiver<bool>) {
    let _ = stop.wait_for(|stop| *stop).await;
}

fn is_transient_accept_error(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::ConnectionAborted
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::Interrupted
            | io::ErrorKind::WouldBlock
    )
}

async fn accept_loop(
    listener: TcpListener,
    http2: mpsc::Sender<io::Result<MuxedStream>>,
    http1: mpsc::Sender<MuxedStream>,
    sniff_timeout: Duration,
    stop: watch::Receiver<bool>,
) -> Result<(), FrontDoorError> {
    let stop_signal = stopped(stop);
    tokio::pin!(stop_signal);
    loop {
        let (stream, peer) = tokio::select! {
            _ = &mut stop_signal => return Ok(()),
            accepted = listener.accept() => match accepted {
                Ok(accepted) => accepted,
                Err(err) if is_transient_accept_error(&err) => {
                    tracing::debug!(error = %err, "transient accept error");
                    continue;
                }
                Err(err) => return Err(FrontDoorError::Accept(err)),
            },
        };
        let http2 = http2.clone();
        let http1 = http1.clone();
        tokio::spawn(async move {
            match sniff(stream, sniff_timeout).await {
                Ok((Protocol::Http2, stream)) => {
                    let _ = http2.send(Ok(stream)).await;
                }
                Ok((Protocol::Http1, stream)) => {
                    let _ = http1.send(stream).await;
                }
                Err(err) => {
                    tracing::debug!(%peer, error = %err, "dropping connection after failed sniff");
                }
            }
        });
    }
}

fn http2_span(request: &axum::http::Request<()>) -> tracing::Span {
    let parent = crate::observability::trace_context_from_headers(request.headers());
    let span = tracing::info_span!(
        "h2.request",
        path = %request.uri().path(),
        grpc = is_grpc_request(request)
    );
    span.set_parent(parent);
    span
}

async fn serve_http2(
    routes: tonic::service::Routes,
    connections: mpsc::Receiver<io::Result<MuxedStream>>,
    stop: watch::Receiver<bool>,
) -> Result<(), FrontDoorError> {
    tonic::transport::Server::builder()
        .trace_fn(http2_span)
        .add_routes(routes)
        .serve_with_incoming_shutdown(ReceiverStream::new(connections), stopped(stop))
        .await?;
    Ok(())
}

async fn serve_http1(
    router: Router,
    mut connections: mpsc::Receiver<MuxedStream>,
    stop: watch::Receiver<bool>,
) -> Result<(), FrontDoorError> {
    let stop_signal = stopped(stop);
    tokio::pin!(stop_signal);
    loop {
        let stream = tokio::select! {
            _ = &mut stop_signal => return Ok(()),
            next = connections.recv() => match next {
                Some(stream) => stream,
                None => return Ok(()),
            },
        };
        let service = TowerToHyperService::new(router.clone());
        tokio::spawn(async move {
            let peer = stream.peer_addr().ok();
            if let Err(err) = auto::Builder::new(TokioExecutor::new())
                .serve_connection(TokioIo::new(stream), service)
                .await
            {
                tracing::debug!(?peer, error = %err, "http connection ended with error");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;

    async fn connected_pair() -> (TcpStream, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        let client = TcpStream::connect(addr).await.expect("connect");
        let (server, _) = listener.accept().await.expect("accept");
        (client, server)
    }

    #[tokio::test]
    async fn preface_is_classified_as_http2_and_replayed() {
        let (mut client, server) = connected_pair().await;
        client.write_all(H2_PREFACE).await.expect("write");
        client.write_all(b"frames").await.expect("write");

        let (protocol, mut stream) = sniff(server, Duration::from_secs(1))
            .await
            .expect("sniff");
        assert_eq!(protocol, Protocol::Http2);

        let mut replayed = vec![0u8; H2_PREFACE.len() + 6];
        stream.read_exact(&mut replayed).await.expect("read");
        assert_eq!(&replayed[..H2_PREFACE.len()], H2_PREFACE);
        assert_eq!(&replayed[H2_PREFACE.len()..], b"frames");
    }

    #[tokio::test]
    async fn http1_request_is_classified_as_http1_and_replayed() {
        let (mut client, server) = connected_pair().await;
        let request = b"GET /healthz HTTP/1.1\r\nHost: localhost\r\n\r\n";
        client.write_all(request).await.expect("write");
        client.shutdown().await.expect("shutdown write");

        let (protocol, mut stream) = sniff(server, Duration::from_secs(1))
            .await
            .expect("sniff");
        assert_eq!(protocol, Protocol::Http1);

        let mut replayed = Vec::new();
        stream.read_to_end(&mut replayed).await.expect("read");
        assert_eq!(replayed, request);
    }

    #[tokio::test]
    async fn truncated_preface_is_http1() {
        let (mut client, server) = connected_pair().await;
        client.write_all(b"PRI * HTTP").await.expect("write");
        client.shutdown().await.expect("shutdown write");

        let (protocol, _) = sniff(server, Duration::from_secs(1))
            .await
            .expect("sniff");
        assert_eq!(protocol, Protocol::Http1);
    }

    #[tokio::test]
    async fn silent_client_times_out() {
        let (_client, server) = connected_pair().await;
        let err = sniff(server, Duration::from_millis(50))
            .await
            .expect_err("timeout");
        assert_eq!(err.kind(), io::ErrorKind::TimedOut);
    }

    #[tokio::test]
    async fn immediate_close_is_eof() {
        let (client, server) = connected_pair().await;
        drop(client);
        let err = sniff(server, Duration::from_secs(1))
            .await
            .expect_err("eof");
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    fn request(content_type: Option<&str>) -> axum::http::Request<axum::body::Body> {
        let mut builder = axum::http::Request::builder().method("POST").uri("/ping");
        if let Some(content_type) = content_type {
            builder = builder.header(CONTENT_TYPE, content_type);
        }
        builder.body(axum::body::Body::empty()).expect("request")
    }

    #[test]
    fn grpc_content_types_are_recognised() {
        assert!(is_grpc_request(&request(Some("application/grpc"))));
        assert!(is_grpc_request(&request(Some("application/grpc+proto"))));
        assert!(!is_grpc_request(&request(Some("application/json"))));
        assert!(!is_grpc_request(&request(None)));
    }

    #[tokio::test]
    async fn http2_requests_dispatch_on_content_type() {
        let gateway = Router::new().route("/ping", axum::routing::post(|| async { "pong" }));
        let router = http2_router(tonic::service::Routes::default(), gateway);

        let response = router
            .clone()
            .oneshot(request(Some("application/json")))
            .await
            .expect("gateway");
        assert_eq!(response.status(), axum::http::StatusCode::OK);
        assert!(response.headers().get("grpc-status").is_none());
        let body = axum::body::to_bytes(response.into_body(), 1024)
            .await
            .expect("body");
        assert_eq!(&body[..], b"pong");

        let response = router
            .oneshot(request(Some("application/grpc")))
            .await
            .expect("grpc");
        assert_eq!(
            response
                .headers()
                .get("grpc-status")
                .and_then(|value| value.to_str().ok()),
            Some("12")
        );
    }

    #[tokio::test]
    async fn shutdown_stops_front_door_cleanly() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let front_door = FrontDoor::new(listener).with_shutdown_grace(Duration::from_secs(2));
        let server = tokio::spawn(front_door.serve(
            tonic::service::Routes::default(),
            Router::new(),
            async move {
                let _ = rx.await;
            },
        ));
        tokio::time::sleep(Duration::from_millis(20)).await;
        let _ = tx.send(());
        let result = tokio::time::timeout(Duration::from_secs(5), server)
            .await
            .expect("front door stopped in time")
            .expect("join");
        assert!(result.is_ok(), "{result:?}");
    }
}
