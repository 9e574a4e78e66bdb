//! Connection handling: one hyper-util auto connection per accepted stream.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use http::{header, HeaderValue, StatusCode};
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming as IncomingBody;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo, TokioTimer};
use hyper_util::server::conn::auto;
use tokio::net::TcpStream;
use tracing::{debug, error, info, warn};

use crate::core::{DispatchError, Request, Response};
use crate::dispatch::Dispatcher;

/// Errors that only mean the peer went away.
fn is_connection_error(err_str: &str) -> bool {
    err_str.contains("connection reset")
        || err_str.contains("broken pipe")
        || err_str.contains("Connection reset")
        || err_str.contains("os error 104")
        || err_str.contains("os error 32")
        || err_str.contains("timed out")
        || err_str.contains("HeaderTimeout")
}

/// Shared state for every connection accepted by one server.
pub(crate) struct ConnectionContext {
    pub dispatcher: Dispatcher,
    pub active_connections: Arc<AtomicUsize>,
    pub header_timeout: Duration,
    pub access_log_enabled: bool,
}

impl ConnectionContext {
    /// Serve one connection to completion.
    ///
    /// Shutdown is handled by the server: accept loops stop, connections
    /// already open finish their in-flight requests, and the drain wait
    /// watches `active_connections`.
    pub async fn handle_connection(self: Arc<Self>, stream: TcpStream, remote_addr: SocketAddr) {
        self.active_connections.fetch_add(1, Ordering::Relaxed);

        let ctx = Arc::clone(&self);
        let service = service_fn(move |req| {
            let ctx = Arc::clone(&ctx);
            async move { ctx.handle_request(req, remote_addr).await }
        });

        let io = TokioIo::new(stream);
        if let Err(err) = auto::Builder::new(TokioExecutor::new())
            .http1()
            .timer(TokioTimer::new())
            .header_read_timeout(Some(self.header_timeout))
            .keep_alive(true)
            .http2()
            .max_concurrent_streams(250)
            .serve_connection(io, service)
            .await
        {
            let err_str = format!("{:?}", err);
            if !is_connection_error(&err_str) {
                debug!("Connection error: {:?}", err);
            }
        }

        self.active_connections.fetch_sub(1, Ordering::Relaxed);
    }

    async fn handle_request(
        &self,
        req: http::Request<IncomingBody>,
        remote_addr: SocketAddr,
    ) -> Result<http::Response<Full<Bytes>>, Infallible> {
        let started = Instant::now();
        let (parts, body) = req.into_parts();

        let body = match body.collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(e) => {
                debug!(error = %e, "failed to read request body");
                return Ok(into_hyper(Response::status_only(StatusCode::BAD_REQUEST)));
            }
        };

        let request = Request::from(http::Request::from_parts(parts, body));
        let method = request.method().clone();
        let path = request.path().to_string();
        let http_version = request.version();

        let response = match self.dispatcher.dispatch(request).await {
            Ok(response) => response,
            Err(DispatchError::Timeout { duration_ms }) => {
                warn!(method = %method, path = %path, timeout_ms = duration_ms, "request timed out");
                Response::status_only(StatusCode::GATEWAY_TIMEOUT)
            }
            Err(e) => {
                error!(method = %method, path = %path, error = %e, "request failed");
                Response::internal_error("Internal Server Error")
            }
        };

        if self.access_log_enabled {
            info!(
                target: "access",
                method = %method,
                path = %path,
                http = ?http_version,
                status = response.status().as_u16() as u64,
                bytes = response.body_len() as u64,
                duration_ms = started.elapsed().as_secs_f64() * 1000.0,
                ip = %remote_addr.ip(),
            );
        }

        Ok(into_hyper(response))
    }
}

fn into_hyper(response: Response) -> http::Response<Full<Bytes>> {
    let mut response = http::Response::<Bytes>::from(response).map(Full::new);
    response
        .headers_mut()
        .entry(header::SERVER)
        .or_insert(HeaderValue::from_static("tokio_chain"));
    response
}
