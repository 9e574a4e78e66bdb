//! Dispatch context threaded through a compiled chain.
//!
//! A [`Context`] is moved into every handler. Delegating ([`Context::next`],
//! [`Context::insert`]) and rendering ([`Context::render`]) consume it, so a
//! handler can do exactly one of them.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use http::header::HeaderName;
use http::{HeaderMap, HeaderValue, StatusCode};
use tracing::{debug, trace};

use super::exchange::{Exchange, RequestOutcome};
use super::{DispatchError, Request, Response};
use crate::file_system::FileSystemBinding;
use crate::handler::{ClientErrorHandler, DefaultClientErrorHandler, Handler};
use crate::path::PathBinding;
use crate::registry::Registry;

/// Handlers of one (nested) chain.
pub type Handlers = Arc<[Arc<dyn Handler>]>;

/// What a nested chain sees: registry, path binding and file-system binding.
#[derive(Clone, Debug)]
pub(crate) struct Scope {
    pub(crate) registry: Registry,
    pub(crate) path: PathBinding,
    pub(crate) file_system: FileSystemBinding,
}

impl Scope {
    pub(crate) fn new(registry: Registry, path: PathBinding, file_system: FileSystemBinding) -> Self {
        Self {
            registry,
            path,
            file_system,
        }
    }

    pub(crate) fn with_registry(&self, registry: &Registry) -> Self {
        Self {
            registry: self.registry.join(registry),
            ..self.clone()
        }
    }

    pub(crate) fn with_path(&self, path: PathBinding) -> Self {
        Self {
            path,
            ..self.clone()
        }
    }

    pub(crate) fn with_file_system(&self, file_system: FileSystemBinding) -> Self {
        Self {
            file_system,
            ..self.clone()
        }
    }
}

struct Frame {
    handlers: Handlers,
    next: usize,
    scope: Scope,
}

/// Per-request dispatch state.
pub struct Context {
    request: Arc<Request>,
    exchange: Arc<Exchange>,
    current: Frame,
    parents: Vec<Frame>,
    response_headers: HeaderMap,
}

impl Context {
    pub(crate) fn new(request: Arc<Request>, exchange: Arc<Exchange>, handlers: Handlers, scope: Scope) -> Self {
        Self {
            request,
            exchange,
            current: Frame {
                handlers,
                next: 0,
                scope,
            },
            parents: Vec::new(),
            response_headers: HeaderMap::new(),
        }
    }

    /// The request being dispatched.
    #[inline]
    pub fn request(&self) -> &Request {
        &self.request
    }

    /// Registry visible at this point of the chain.
    #[inline]
    pub fn registry(&self) -> &Registry {
        &self.current.scope.registry
    }

    /// Look up `T` in the visible registry.
    pub fn get<T: ?Sized + Send + Sync + 'static>(&self) -> Result<Arc<T>, DispatchError> {
        Ok(self.registry().get::<T>()?)
    }

    /// Look up `T` in the visible registry, if present.
    pub fn maybe_get<T: ?Sized + Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.registry().maybe_get::<T>()
    }

    /// Consumed and remaining request path for this chain.
    #[inline]
    pub fn path_binding(&self) -> &PathBinding {
        &self.current.scope.path
    }

    /// Current file-system binding.
    #[inline]
    pub fn file_system(&self) -> &FileSystemBinding {
        &self.current.scope.file_system
    }

    /// Resolve `relative` against the current file-system binding.
    pub fn file(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.file_system().file(relative)
    }

    /// Time since dispatch started.
    pub fn elapsed(&self) -> Duration {
        self.exchange.started().elapsed()
    }

    /// Whether a response has been rendered for this exchange.
    pub fn is_committed(&self) -> bool {
        self.exchange.is_committed()
    }

    /// Add a header to whatever response is eventually rendered.
    ///
    /// Headers set on the rendered response itself take precedence.
    pub fn set_response_header(&mut self, name: impl AsRef<str>, value: impl AsRef<str>) {
        match (
            HeaderName::try_from(name.as_ref()),
            HeaderValue::try_from(value.as_ref()),
        ) {
            (Ok(name), Ok(value)) => {
                self.response_headers.insert(name, value);
            }
            _ => debug!(name = name.as_ref(), "ignoring invalid response header"),
        }
    }

    /// Pending response headers.
    pub fn response_headers(&self) -> &HeaderMap {
        &self.response_headers
    }

    /// Register a callback fired once when the exchange completes.
    pub fn on_close<F>(&self, callback: F)
    where
        F: FnOnce(&RequestOutcome) + Send + 'static,
    {
        self.exchange.hooks().push(Box::new(callback));
    }

    /// Delegate to the next handler.
    ///
    /// When the current chain is exhausted, the enclosing chain resumes with
    /// its own scope. Past the end of the root chain a 404 is rendered.
    pub fn next(mut self) -> Result<(), DispatchError> {
        loop {
            if let Some(handler) = self.current.handlers.get(self.current.next).cloned() {
                self.current.next += 1;
                trace!(handler = handler.name(), depth = self.parents.len(), "delegating");
                return handler.handle(self);
            }
            match self.parents.pop() {
                Some(parent) => self.current = parent,
                None => {
                    debug!(path = self.request.path(), "end of chain reached");
                    return self.client_error(StatusCode::NOT_FOUND);
                }
            }
        }
    }

    /// Delegate to the next handler with `registry` joined onto the scope of
    /// the current chain. The entries stay visible for the rest of this chain.
    pub fn next_with(mut self, registry: &Registry) -> Result<(), DispatchError> {
        self.current.scope = self.current.scope.with_registry(registry);
        self.next()
    }

    /// Run `handlers` before the rest of the current chain.
    pub fn insert(self, handlers: impl Into<Handlers>) -> Result<(), DispatchError> {
        let scope = self.current.scope.clone();
        self.enter(scope, handlers.into())
    }

    /// Run `handlers` with `registry` joined onto their scope only.
    pub fn insert_with(self, registry: &Registry, handlers: impl Into<Handlers>) -> Result<(), DispatchError> {
        let scope = self.current.scope.with_registry(registry);
        self.enter(scope, handlers.into())
    }

    pub(crate) fn scope(&self) -> &Scope {
        &self.current.scope
    }

    /// Run `handlers` in `scope`; the current chain resumes afterwards.
    pub(crate) fn enter(mut self, scope: Scope, handlers: Handlers) -> Result<(), DispatchError> {
        let nested = Frame {
            handlers,
            next: 0,
            scope,
        };
        let parent = std::mem::replace(&mut self.current, nested);
        self.parents.push(parent);
        self.next()
    }

    /// Send `response` to the client. Pending headers are merged where the
    /// response does not set them.
    pub fn render(self, mut response: Response) -> Result<(), DispatchError> {
        let pending: Vec<HeaderName> = self
            .response_headers
            .keys()
            .filter(|name| !response.headers().contains_key(*name))
            .cloned()
            .collect();
        for name in pending {
            for value in self.response_headers.get_all(&name) {
                response.headers_mut().append(name.clone(), value.clone());
            }
        }

        trace!(status = response.status().as_u16(), "rendering response");
        self.exchange.commit(response)
    }

    /// Render a redirect to `location`.
    pub fn redirect(self, status: StatusCode, location: &str) -> Result<(), DispatchError> {
        debug!(status = status.as_u16(), location, "redirecting");
        self.render(Response::redirect(status, location))
    }

    /// Render a client error through the registered [`ClientErrorHandler`].
    pub fn client_error(self, status: StatusCode) -> Result<(), DispatchError> {
        let handler: Arc<dyn ClientErrorHandler> = match self.maybe_get::<dyn ClientErrorHandler>() {
            Some(handler) => handler,
            None => Arc::new(DefaultClientErrorHandler),
        };
        handler.error(self, status)
    }

    /// Render a 404.
    pub fn not_found(self) -> Result<(), DispatchError> {
        self.client_error(StatusCode::NOT_FOUND)
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("method", self.request.method())
            .field("path", &self.request.path())
            .field("remaining", &self.current.scope.path.remaining())
            .field("cursor", &self.current.next)
            .field("depth", &self.parents.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    use bytes::Bytes;
    use tokio::sync::oneshot;

    fn context(path: &str, handlers: Vec<Arc<dyn Handler>>) -> (Context, oneshot::Receiver<Response>) {
        let request = Request::from(
            http::Request::builder()
                .uri(path)
                .body(Bytes::new())
                .unwrap(),
        );
        let (exchange, rx) = Exchange::new(Instant::now());
        let scope = Scope::new(
            Registry::empty(),
            PathBinding::root(request.path()),
            FileSystemBinding::new("/srv"),
        );
        let ctx = Context::new(Arc::new(request), Arc::new(exchange), handlers.into(), scope);
        (ctx, rx)
    }

    fn handler(f: impl Fn(Context) -> Result<(), DispatchError> + Send + Sync + 'static) -> Arc<dyn Handler> {
        Arc::new(f)
    }

    #[test]
    fn test_end_of_chain_renders_404() {
        let (ctx, mut rx) = context("/missing", vec![handler(|ctx| ctx.next())]);
        ctx.next().unwrap();
        assert_eq!(rx.try_recv().unwrap().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_inserted_chain_resumes_parent_scope() {
        let inner: Handlers = vec![handler(|ctx: Context| {
            assert!(ctx.registry().contains::<u32>());
            ctx.next()
        })]
        .into();
        let (ctx, mut rx) = context(
            "/",
            vec![
                handler(move |ctx: Context| ctx.insert_with(&Registry::single(1u32), inner.clone())),
                handler(|ctx: Context| {
                    assert!(!ctx.registry().contains::<u32>());
                    ctx.render(Response::ok("outer"))
                }),
            ],
        );
        ctx.next().unwrap();
        assert_eq!(rx.try_recv().unwrap().body().as_ref(), b"outer");
    }

    #[test]
    fn test_next_with_visible_to_later_siblings() {
        let (ctx, mut rx) = context(
            "/",
            vec![
                handler(|ctx: Context| ctx.next_with(&Registry::single("scoped"))),
                handler(|ctx: Context| {
                    let value = ctx.get::<&'static str>()?;
                    ctx.render(Response::ok(*value))
                }),
            ],
        );
        ctx.next().unwrap();
        assert_eq!(rx.try_recv().unwrap().body().as_ref(), b"scoped");
    }

    #[test]
    fn test_render_merges_pending_headers() {
        let (mut ctx, mut rx) = context("/", vec![]);
        ctx.set_response_header("x-pending", "1");
        ctx.set_response_header("content-type", "text/html");
        ctx.render(Response::ok("body").with_header("content-type", "text/plain"))
            .unwrap();

        let response = rx.try_recv().unwrap();
        assert_eq!(response.header("x-pending"), Some("1"));
        assert_eq!(response.content_type(), Some("text/plain"));
    }

    #[test]
    fn test_missing_registry_entry_is_dispatch_error() {
        let (ctx, _rx) = context("/", vec![]);
        let err = ctx.get::<u64>().unwrap_err();
        assert!(matches!(err, DispatchError::Resolution(_)));
    }

    #[test]
    fn test_file_resolves_against_binding() {
        let (ctx, _rx) = context("/", vec![]);
        assert_eq!(ctx.file("a/b.txt"), PathBuf::from("/srv/a/b.txt"));
    }
}
