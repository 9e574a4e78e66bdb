//! Chain builder and the compiled chain handler.

use std::path::PathBuf;
use std::sync::Arc;

use http::header::HeaderName;
use http::{Method, StatusCode};

use super::assets::AssetsHandler;
use super::predicate::{ContentTypeHandler, HeaderHandler, HostHandler, PathHandler, WhenHandler};
use super::scoped::{FileSystemHandler, NestedRegistryHandler, RedirectHandler, RegistryHandler};
use super::{Handler, IntoHandler};
use crate::core::{ChainBuildError, Context, DispatchError, Handlers};
use crate::path::PathPattern;
use crate::registry::{Registry, RegistrySpec};

/// Collects handlers in declaration order and compiles them into a
/// [`ChainHandler`].
///
/// Every append returns `Result<&mut Chain, _>` so declarations can be chained
/// with `?`. Nothing runs at build time except declaration blocks and
/// registry lookups.
pub struct Chain {
    registry: Registry,
    handlers: Vec<Arc<dyn Handler>>,
}

impl Chain {
    fn new(registry: Registry) -> Self {
        Self {
            registry,
            handlers: Vec::new(),
        }
    }

    /// Build a chain against `registry`.
    ///
    /// If the block fails, the error is returned and no chain is produced.
    pub fn build<F>(registry: &Registry, block: F) -> Result<ChainHandler, ChainBuildError>
    where
        F: FnOnce(&mut Chain) -> Result<(), ChainBuildError>,
    {
        let mut chain = Chain::new(registry.clone());
        block(&mut chain)?;
        let handler = ChainHandler::new(chain.handlers, registry.clone());
        tracing::debug!(handlers = handler.len(), "chain built");
        Ok(handler)
    }

    /// Build a nested chain against the current registry without appending it.
    pub fn handler<F>(&self, block: F) -> Result<ChainHandler, ChainBuildError>
    where
        F: FnOnce(&mut Chain) -> Result<(), ChainBuildError>,
    {
        Chain::build(&self.registry, block)
    }

    /// Registry used to resolve declarations at this point.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Number of handlers appended so far.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether nothing has been appended.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    fn push(&mut self, handler: Arc<dyn Handler>) -> &mut Self {
        self.handlers.push(handler);
        self
    }

    fn single(&self, handler: impl IntoHandler) -> Result<Handlers, ChainBuildError> {
        Ok(vec![handler.into_handler(&self.registry)?].into())
    }

    fn nested<F>(&self, registry: &Registry, block: F) -> Result<Handlers, ChainBuildError>
    where
        F: FnOnce(&mut Chain) -> Result<(), ChainBuildError>,
    {
        Ok(Chain::build(registry, block)?.handlers())
    }

    /// Append a handler that sees every request reaching this point.
    pub fn all(&mut self, handler: impl IntoHandler) -> Result<&mut Self, ChainBuildError> {
        let handler = handler.into_handler(&self.registry)?;
        Ok(self.push(handler))
    }

    /// Append a nested chain that sees every request reaching this point.
    pub fn insert<F>(&mut self, block: F) -> Result<&mut Self, ChainBuildError>
    where
        F: FnOnce(&mut Chain) -> Result<(), ChainBuildError>,
    {
        // Built against the registry already visible here, so nothing to carry
        let handlers = self.nested(&self.registry, block)?;
        Ok(self.push(Arc::new(ChainHandler {
            handlers,
            registry: Registry::empty(),
        })))
    }

    /// Handle requests whose remaining path is exactly `pattern`.
    pub fn path(&mut self, pattern: &str, handler: impl IntoHandler) -> Result<&mut Self, ChainBuildError> {
        let pattern = PathPattern::parse(pattern)?;
        let handlers = self.single(handler)?;
        Ok(self.push(Arc::new(PathHandler::new(pattern, true, None, handlers))))
    }

    /// Handle requests with nothing left to match.
    pub fn path_root(&mut self, handler: impl IntoHandler) -> Result<&mut Self, ChainBuildError> {
        self.path("", handler)
    }

    /// Nest a chain under `pattern`; it sees the path after the prefix.
    pub fn prefix<F>(&mut self, pattern: &str, block: F) -> Result<&mut Self, ChainBuildError>
    where
        F: FnOnce(&mut Chain) -> Result<(), ChainBuildError>,
    {
        let pattern = PathPattern::parse(pattern)?;
        let handlers = self.nested(&self.registry, block)?;
        Ok(self.push(Arc::new(PathHandler::new(pattern, false, None, handlers))))
    }

    /// Handle requests with method `method` whose remaining path is exactly
    /// `pattern`. The method name is matched case-insensitively.
    pub fn method(
        &mut self,
        method: &str,
        pattern: &str,
        handler: impl IntoHandler,
    ) -> Result<&mut Self, ChainBuildError> {
        let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())
            .map_err(|e| ChainBuildError::declaration(format!("invalid method '{}': {}", method, e)))?;
        self.method_path(method, pattern, handler)
    }

    fn method_path(
        &mut self,
        method: Method,
        pattern: &str,
        handler: impl IntoHandler,
    ) -> Result<&mut Self, ChainBuildError> {
        let pattern = PathPattern::parse(pattern)?;
        let handlers = self.single(handler)?;
        Ok(self.push(Arc::new(PathHandler::new(pattern, true, Some(method), handlers))))
    }

    /// `GET` with nothing left to match.
    pub fn get(&mut self, handler: impl IntoHandler) -> Result<&mut Self, ChainBuildError> {
        self.method_path(Method::GET, "", handler)
    }

    /// `GET` at `pattern`.
    pub fn get_path(&mut self, pattern: &str, handler: impl IntoHandler) -> Result<&mut Self, ChainBuildError> {
        self.method_path(Method::GET, pattern, handler)
    }

    pub fn post(&mut self, handler: impl IntoHandler) -> Result<&mut Self, ChainBuildError> {
        self.method_path(Method::POST, "", handler)
    }

    pub fn post_path(&mut self, pattern: &str, handler: impl IntoHandler) -> Result<&mut Self, ChainBuildError> {
        self.method_path(Method::POST, pattern, handler)
    }

    pub fn put(&mut self, handler: impl IntoHandler) -> Result<&mut Self, ChainBuildError> {
        self.method_path(Method::PUT, "", handler)
    }

    pub fn put_path(&mut self, pattern: &str, handler: impl IntoHandler) -> Result<&mut Self, ChainBuildError> {
        self.method_path(Method::PUT, pattern, handler)
    }

    pub fn patch(&mut self, handler: impl IntoHandler) -> Result<&mut Self, ChainBuildError> {
        self.method_path(Method::PATCH, "", handler)
    }

    pub fn patch_path(&mut self, pattern: &str, handler: impl IntoHandler) -> Result<&mut Self, ChainBuildError> {
        self.method_path(Method::PATCH, pattern, handler)
    }

    pub fn delete(&mut self, handler: impl IntoHandler) -> Result<&mut Self, ChainBuildError> {
        self.method_path(Method::DELETE, "", handler)
    }

    pub fn delete_path(&mut self, pattern: &str, handler: impl IntoHandler) -> Result<&mut Self, ChainBuildError> {
        self.method_path(Method::DELETE, pattern, handler)
    }

    pub fn options(&mut self, handler: impl IntoHandler) -> Result<&mut Self, ChainBuildError> {
        self.method_path(Method::OPTIONS, "", handler)
    }

    pub fn options_path(&mut self, pattern: &str, handler: impl IntoHandler) -> Result<&mut Self, ChainBuildError> {
        self.method_path(Method::OPTIONS, pattern, handler)
    }

    /// Handle requests where header `name` equals `value` exactly.
    pub fn header(
        &mut self,
        name: &str,
        value: &str,
        handler: impl IntoHandler,
    ) -> Result<&mut Self, ChainBuildError> {
        let name = HeaderName::try_from(name).map_err(|_| ChainBuildError::InvalidHeader {
            name: name.to_string(),
        })?;
        let handlers = self.single(handler)?;
        Ok(self.push(Arc::new(HeaderHandler::new(name, value, handlers))))
    }

    /// Nest a chain for requests addressed to `host`.
    pub fn host<F>(&mut self, host: &str, block: F) -> Result<&mut Self, ChainBuildError>
    where
        F: FnOnce(&mut Chain) -> Result<(), ChainBuildError>,
    {
        let handlers = self.nested(&self.registry, block)?;
        Ok(self.push(Arc::new(HostHandler::new(host, handlers))))
    }

    /// Handle requests whose body media type is `mime` (parameters ignored).
    pub fn content_type(&mut self, mime: &str, handler: impl IntoHandler) -> Result<&mut Self, ChainBuildError> {
        let handlers = self.single(handler)?;
        Ok(self.push(Arc::new(ContentTypeHandler::new(mime, handlers))))
    }

    /// Nest a chain for requests accepted by `predicate`.
    pub fn when<P, F>(&mut self, predicate: P, block: F) -> Result<&mut Self, ChainBuildError>
    where
        P: Fn(&Context) -> bool + Send + Sync + 'static,
        F: FnOnce(&mut Chain) -> Result<(), ChainBuildError>,
    {
        let handlers = self.nested(&self.registry, block)?;
        Ok(self.push(Arc::new(WhenHandler::new(predicate, handlers))))
    }

    /// Nest a chain whose file-system binding is rebased onto `path`.
    pub fn file_system<F>(&mut self, path: impl Into<PathBuf>, block: F) -> Result<&mut Self, ChainBuildError>
    where
        F: FnOnce(&mut Chain) -> Result<(), ChainBuildError>,
    {
        let handlers = self.nested(&self.registry, block)?;
        Ok(self.push(Arc::new(FileSystemHandler::new(path.into(), handlers))))
    }

    /// Serve files under `path`: requests prefixed with `path` resolve against
    /// the `path` directory of the current file-system binding. Directories
    /// are served through the first existing `index_files` entry. Misses pass
    /// on to the next handler.
    pub fn assets(&mut self, path: &str, index_files: &[&str]) -> Result<&mut Self, ChainBuildError> {
        let handler = AssetsHandler::new(index_files);
        self.prefix(path, |chain| {
            chain.file_system(path, |files| {
                files.all(handler)?;
                Ok(())
            })?;
            Ok(())
        })
    }

    /// Make `registry` visible to every handler appended after this call in
    /// this chain, and to their nested chains.
    pub fn register(&mut self, registry: Registry) -> Result<&mut Self, ChainBuildError> {
        self.registry = self.registry.join(&registry);
        Ok(self.push(Arc::new(RegistryHandler::new(registry))))
    }

    /// [`Chain::register`] with entries collected by `spec`.
    pub fn register_spec<S>(&mut self, spec: S) -> Result<&mut Self, ChainBuildError>
    where
        S: FnOnce(&mut RegistrySpec) -> Result<(), ChainBuildError>,
    {
        let mut entries = RegistrySpec::new();
        spec(&mut entries)?;
        self.register(entries.build())
    }

    /// Nest a chain that sees `registry`. Later siblings do not.
    pub fn register_with<F>(&mut self, registry: Registry, block: F) -> Result<&mut Self, ChainBuildError>
    where
        F: FnOnce(&mut Chain) -> Result<(), ChainBuildError>,
    {
        let handlers = self.nested(&self.registry.join(&registry), block)?;
        Ok(self.push(Arc::new(NestedRegistryHandler::new(registry, handlers))))
    }

    /// [`Chain::register_with`] with entries collected by `spec`.
    pub fn register_spec_with<S, F>(&mut self, spec: S, block: F) -> Result<&mut Self, ChainBuildError>
    where
        S: FnOnce(&mut RegistrySpec) -> Result<(), ChainBuildError>,
        F: FnOnce(&mut Chain) -> Result<(), ChainBuildError>,
    {
        let mut entries = RegistrySpec::new();
        spec(&mut entries)?;
        self.register_with(entries.build(), block)
    }

    /// Redirect every request reaching this point. `code` must be 3xx.
    pub fn redirect(&mut self, code: u16, location: &str) -> Result<&mut Self, ChainBuildError> {
        let status = StatusCode::from_u16(code)
            .ok()
            .filter(StatusCode::is_redirection)
            .ok_or(ChainBuildError::InvalidRedirect { code })?;
        Ok(self.push(Arc::new(RedirectHandler::new(status, location))))
    }
}

/// A compiled, immutable chain. Cloning shares the handler list.
///
/// The chain keeps the registry it was built against; its handlers see those
/// entries when it runs. An empty chain passes every request straight on.
#[derive(Clone)]
pub struct ChainHandler {
    handlers: Handlers,
    registry: Registry,
}

impl ChainHandler {
    fn new(handlers: Vec<Arc<dyn Handler>>, registry: Registry) -> Self {
        Self {
            handlers: handlers.into(),
            registry,
        }
    }

    pub(crate) fn handlers(&self) -> Handlers {
        Arc::clone(&self.handlers)
    }

    /// Registry the chain was built against.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Number of top-level handlers.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether the chain has no handlers.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Names of the top-level handlers in declaration order.
    pub fn names(&self) -> Vec<&'static str> {
        self.handlers.iter().map(|h| h.name()).collect()
    }
}

impl Handler for ChainHandler {
    fn handle(&self, ctx: Context) -> Result<(), DispatchError> {
        if self.handlers.is_empty() {
            return ctx.next();
        }
        ctx.insert_with(&self.registry, self.handlers())
    }

    fn name(&self) -> &'static str {
        "chain"
    }
}

impl std::fmt::Debug for ChainHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainHandler")
            .field("handlers", &self.names())
            .finish()
    }
}
