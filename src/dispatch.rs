//! Framework boundary: runs one request through a compiled chain.

use std::sync::Arc;
use std::time::{Duration, Instant};

use http::StatusCode;
use tracing::{debug, warn};

use crate::config::ServerConfig;
use crate::core::{CloseHooks, Context, DispatchError, Exchange, Handlers, Request, RequestOutcome, Response, Scope};
use crate::file_system::FileSystemBinding;
use crate::handler::ChainHandler;
use crate::path::PathBinding;
use crate::registry::Registry;

/// Installs a compiled chain as the root and dispatches requests through it.
///
/// Cheap to clone; the chain and registries are shared.
#[derive(Clone)]
pub struct Dispatcher {
    root: Handlers,
    /// Registry the root chain was built against
    chain_registry: Registry,
    /// What the root scope sees: the base registry with the chain's on top
    registry: Registry,
    file_system: FileSystemBinding,
    request_timeout: Option<Duration>,
}

impl Dispatcher {
    /// Dispatch through `root` with the registry it was built against, the
    /// working directory as file-system root and no timeout.
    pub fn new(root: ChainHandler) -> Self {
        let chain_registry = root.registry().clone();
        Self {
            root: root.handlers(),
            registry: chain_registry.clone(),
            chain_registry,
            file_system: FileSystemBinding::current_dir(),
            request_timeout: None,
        }
    }

    /// Use settings from server configuration.
    pub fn from_config(root: ChainHandler, config: &ServerConfig) -> Self {
        Self::new(root)
            .with_file_system(FileSystemBinding::new(&config.base_dir))
            .with_request_timeout(config.request_timeout.as_duration())
    }

    /// Base registry every request starts with. Entries of the chain's own
    /// registry take precedence.
    pub fn with_registry(mut self, registry: Registry) -> Self {
        self.registry = registry.join(&self.chain_registry);
        self
    }

    /// Base file-system binding every request starts with.
    pub fn with_file_system(mut self, file_system: FileSystemBinding) -> Self {
        self.file_system = file_system;
        self
    }

    /// Fail dispatches that have not rendered within `timeout`.
    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Run `request` through the chain and wait for its response.
    ///
    /// Handlers run synchronously until they render or hand the context to a
    /// task. Close callbacks fire exactly once, whatever the result.
    pub async fn dispatch(&self, request: Request) -> Result<Response, DispatchError> {
        let started = Instant::now();
        let (exchange, receiver) = Exchange::new(started);
        let hooks = exchange.hooks();

        let scope = Scope::new(
            self.registry.clone(),
            PathBinding::root(request.path()),
            self.file_system.clone(),
        );
        let ctx = Context::new(Arc::new(request), Arc::new(exchange), Arc::clone(&self.root), scope);

        if let Err(e) = ctx.next() {
            warn!(error = %e, "dispatch failed");
            close(&hooks, StatusCode::INTERNAL_SERVER_ERROR, started);
            return Err(e);
        }

        let received = match self.request_timeout {
            Some(timeout) => match tokio::time::timeout(timeout, receiver).await {
                Ok(received) => received,
                Err(_) => {
                    let duration_ms = timeout.as_millis() as u64;
                    warn!(timeout_ms = duration_ms, "request timed out");
                    close(&hooks, StatusCode::GATEWAY_TIMEOUT, started);
                    return Err(DispatchError::Timeout { duration_ms });
                }
            },
            None => receiver.await,
        };

        match received {
            Ok(response) => {
                close(&hooks, response.status(), started);
                Ok(response)
            }
            Err(_) => {
                debug!("context dropped without a response");
                close(&hooks, StatusCode::INTERNAL_SERVER_ERROR, started);
                Err(DispatchError::Unhandled)
            }
        }
    }
}

fn close(hooks: &CloseHooks, status: StatusCode, started: Instant) {
    hooks.fire(&RequestOutcome::new(status, started.elapsed()));
}
