//! Test helpers and utilities

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Method, Response, StatusCode};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use tokio_chain::config::ServerConfig;
use tokio_chain::core::ChainBuildError;
use tokio_chain::dispatch::Dispatcher;
use tokio_chain::handler::{Chain, ChainHandler};
use tokio_chain::registry::Registry;
use tokio_chain::server::Server;

/// Build a chain against an empty registry, panicking on build errors.
pub fn app<F>(block: F) -> ChainHandler
where
    F: FnOnce(&mut Chain) -> Result<(), ChainBuildError>,
{
    Chain::build(&Registry::empty(), block).expect("chain should build")
}

/// Server running in this process on 127.0.0.1 with an ephemeral port.
pub struct TestServer {
    pub base_url: String,
    pub client: Client,
    server: Arc<Server>,
    handle: JoinHandle<std::io::Result<()>>,
}

#[allow(dead_code)]
impl TestServer {
    /// Serve `app` with default dispatcher settings.
    pub async fn start(app: ChainHandler) -> Self {
        Self::with_dispatcher(Dispatcher::new(app)).await
    }

    /// Serve a fully configured dispatcher.
    pub async fn with_dispatcher(dispatcher: Dispatcher) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Failed to read local address");

        let config = ServerConfig {
            listen_addr: addr,
            ..ServerConfig::default()
        };
        let server = Arc::new(Server::new(config, dispatcher));
        let running = Arc::clone(&server);
        let handle = tokio::spawn(async move { running.serve(listener).await });

        // No pooled connections, so draining is not held up by idle keep-alives
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .pool_max_idle_per_host(0)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: format!("http://{}", addr),
            client,
            server,
            handle,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Make a GET request to the server
    pub async fn get(&self, path: &str) -> Response {
        self.request(Method::GET, path).await
    }

    /// Make a GET request with custom headers
    pub async fn get_with_headers(&self, path: &str, headers: &[(&str, &str)]) -> Response {
        let mut req = self.client.get(self.url(path));
        for (name, value) in headers {
            req = req.header(*name, *value);
        }
        req.send().await.expect("GET request failed")
    }

    /// Make a request with an arbitrary method
    pub async fn request(&self, method: Method, path: &str) -> Response {
        self.client
            .request(method, self.url(path))
            .send()
            .await
            .expect("request failed")
    }

    /// Stop accepting, wait for the accept loop and then for open connections.
    pub async fn shutdown(self) -> bool {
        self.server.trigger_shutdown();
        self.handle
            .await
            .expect("server task panicked")
            .expect("server returned an error");
        self.server.wait_for_drain(Duration::from_secs(5)).await
    }
}

/// Assert that response has expected status
pub fn assert_status(response: &Response, expected: StatusCode) {
    assert_eq!(
        response.status(),
        expected,
        "Expected status {}, got {}",
        expected,
        response.status()
    );
}

/// Assert that response contains header
pub fn assert_header(response: &Response, name: &str, expected: &str) {
    let value = response
        .headers()
        .get(name)
        .unwrap_or_else(|| panic!("Header '{}' not found", name))
        .to_str()
        .unwrap();
    assert_eq!(value, expected, "Header '{}' mismatch", name);
}

/// Assert status and exact body
pub async fn assert_body(response: Response, expected_status: StatusCode, expected: &str) {
    assert_status(&response, expected_status);
    let body = response.text().await.expect("Failed to read body");
    assert_eq!(body, expected);
}
