//! Context-transforming handlers: registry joins, file-system rebinding and
//! redirects.

use std::path::PathBuf;

use http::StatusCode;
use tracing::trace;

use super::Handler;
use crate::core::{Context, DispatchError, Handlers};
use crate::registry::Registry;

/// Joins entries onto the current chain's scope, then continues.
pub(crate) struct RegistryHandler {
    registry: Registry,
}

impl RegistryHandler {
    pub(crate) fn new(registry: Registry) -> Self {
        Self { registry }
    }
}

impl Handler for RegistryHandler {
    fn handle(&self, ctx: Context) -> Result<(), DispatchError> {
        ctx.next_with(&self.registry)
    }

    fn name(&self) -> &'static str {
        "register"
    }
}

/// Runs a nested chain with extra registry entries only it can see.
pub(crate) struct NestedRegistryHandler {
    registry: Registry,
    handlers: Handlers,
}

impl NestedRegistryHandler {
    pub(crate) fn new(registry: Registry, handlers: Handlers) -> Self {
        Self { registry, handlers }
    }
}

impl Handler for NestedRegistryHandler {
    fn handle(&self, ctx: Context) -> Result<(), DispatchError> {
        ctx.insert_with(&self.registry, self.handlers.clone())
    }

    fn name(&self) -> &'static str {
        "register_with"
    }
}

/// Runs a nested chain with the file-system binding rebased onto `path`.
pub(crate) struct FileSystemHandler {
    path: PathBuf,
    handlers: Handlers,
}

impl FileSystemHandler {
    pub(crate) fn new(path: PathBuf, handlers: Handlers) -> Self {
        Self { path, handlers }
    }
}

impl Handler for FileSystemHandler {
    fn handle(&self, ctx: Context) -> Result<(), DispatchError> {
        let binding = ctx.file_system().binding(&self.path);
        trace!(root = %binding.root().display(), "rebinding file system");
        let scope = ctx.scope().with_file_system(binding);
        ctx.enter(scope, self.handlers.clone())
    }

    fn name(&self) -> &'static str {
        "file_system"
    }
}

/// Redirects every request that reaches it.
pub(crate) struct RedirectHandler {
    status: StatusCode,
    location: String,
}

impl RedirectHandler {
    pub(crate) fn new(status: StatusCode, location: &str) -> Self {
        Self {
            status,
            location: location.to_string(),
        }
    }
}

impl Handler for RedirectHandler {
    fn handle(&self, ctx: Context) -> Result<(), DispatchError> {
        ctx.redirect(self.status, &self.location)
    }

    fn name(&self) -> &'static str {
        "redirect"
    }
}
