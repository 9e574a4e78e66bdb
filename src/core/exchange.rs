//! One-shot response slot and close notification for a single request.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use http::StatusCode;
use tokio::sync::oneshot;

use super::{DispatchError, Response};

type CloseHook = Box<dyn FnOnce(&RequestOutcome) + Send>;

/// How an exchange ended, as seen by close callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestOutcome {
    status: StatusCode,
    duration: Duration,
}

impl RequestOutcome {
    pub(crate) fn new(status: StatusCode, duration: Duration) -> Self {
        Self { status, duration }
    }

    /// Status sent to the client (500 when dispatch failed).
    #[inline]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Time from the start of dispatch until the exchange closed.
    #[inline]
    pub fn duration(&self) -> Duration {
        self.duration
    }
}

/// Callbacks registered through `Context::on_close`.
///
/// Held separately from [`Exchange`] so the dispatcher can fire them without
/// keeping the response sender alive.
pub(crate) struct CloseHooks {
    // None once fired
    hooks: Mutex<Option<Vec<CloseHook>>>,
}

impl Default for CloseHooks {
    fn default() -> Self {
        Self {
            hooks: Mutex::new(Some(Vec::new())),
        }
    }
}

impl CloseHooks {
    /// Register a callback. Registrations after the hooks fired are dropped.
    pub(crate) fn push(&self, hook: CloseHook) {
        match self.hooks.lock().unwrap_or_else(PoisonError::into_inner).as_mut() {
            Some(hooks) => hooks.push(hook),
            None => tracing::debug!("exchange already closed, dropping close callback"),
        }
    }

    /// Run every registered callback once. Later calls are no-ops.
    pub(crate) fn fire(&self, outcome: &RequestOutcome) {
        let hooks = self
            .hooks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .unwrap_or_default();
        for hook in hooks {
            hook(outcome);
        }
    }
}

/// Per-request response slot shared by every context of one dispatch.
pub(crate) struct Exchange {
    started: Instant,
    responder: Mutex<Option<oneshot::Sender<Response>>>,
    hooks: Arc<CloseHooks>,
}

impl Exchange {
    /// Create an exchange and the receiver its response is delivered to.
    pub(crate) fn new(started: Instant) -> (Self, oneshot::Receiver<Response>) {
        let (tx, rx) = oneshot::channel();
        let exchange = Self {
            started,
            responder: Mutex::new(Some(tx)),
            hooks: Arc::new(CloseHooks::default()),
        };
        (exchange, rx)
    }

    pub(crate) fn hooks(&self) -> Arc<CloseHooks> {
        Arc::clone(&self.hooks)
    }

    pub(crate) fn started(&self) -> Instant {
        self.started
    }

    pub(crate) fn is_committed(&self) -> bool {
        self.responder
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }

    /// Deliver the response. Fails if a response was already delivered.
    pub(crate) fn commit(&self, response: Response) -> Result<(), DispatchError> {
        let sender = self
            .responder
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or(DispatchError::AlreadyCommitted)?;

        // Receiver gone means the dispatcher gave up (timeout); nothing to do.
        if sender.send(response).is_err() {
            tracing::debug!("response receiver dropped before commit");
        }
        Ok(())
    }
}
