//! Predicate wrappers.
//!
//! Each wrapper tests one request attribute. On a match it runs its nested
//! handlers; on a miss it is transparent and the enclosing chain continues.
//! Evaluation has no side effects.

use http::header::HeaderName;
use http::Method;
use tracing::trace;

use super::Handler;
use crate::core::{Context, DispatchError, Handlers};
use crate::path::PathPattern;

/// Path (and optionally method) predicate.
///
/// Exhaustive patterns must consume the whole remaining path; prefixes only
/// their own segments. The nested chain sees the advanced binding.
pub(crate) struct PathHandler {
    pattern: PathPattern,
    exhaustive: bool,
    method: Option<Method>,
    handlers: Handlers,
}

impl PathHandler {
    pub(crate) fn new(pattern: PathPattern, exhaustive: bool, method: Option<Method>, handlers: Handlers) -> Self {
        Self {
            pattern,
            exhaustive,
            method,
            handlers,
        }
    }
}

impl Handler for PathHandler {
    fn handle(&self, ctx: Context) -> Result<(), DispatchError> {
        let bound = match self.pattern.bind(ctx.path_binding(), self.exhaustive) {
            Some(bound) => bound,
            None => {
                trace!(
                    pattern = %self.pattern,
                    remaining = ctx.path_binding().remaining(),
                    "path predicate missed"
                );
                return ctx.next();
            }
        };

        if let Some(method) = &self.method {
            if !ctx.request().method().as_str().eq_ignore_ascii_case(method.as_str()) {
                trace!(
                    expected = %method,
                    actual = %ctx.request().method(),
                    "method predicate missed"
                );
                return ctx.next();
            }
        }

        let scope = ctx.scope().with_path(bound);
        ctx.enter(scope, self.handlers.clone())
    }

    fn name(&self) -> &'static str {
        if self.exhaustive {
            "path"
        } else {
            "prefix"
        }
    }
}

/// Exact match on a header value. An absent header never matches.
pub(crate) struct HeaderHandler {
    name: HeaderName,
    value: String,
    handlers: Handlers,
}

impl HeaderHandler {
    pub(crate) fn new(name: HeaderName, value: &str, handlers: Handlers) -> Self {
        Self {
            name,
            value: value.to_string(),
            handlers,
        }
    }
}

impl Handler for HeaderHandler {
    fn handle(&self, ctx: Context) -> Result<(), DispatchError> {
        let matched = ctx
            .request()
            .headers()
            .get_all(&self.name)
            .iter()
            .any(|v| v.as_bytes() == self.value.as_bytes());

        if !matched {
            trace!(header = %self.name, "header predicate missed");
            return ctx.next();
        }
        ctx.insert(self.handlers.clone())
    }

    fn name(&self) -> &'static str {
        "header"
    }
}

/// Match on the effective host name exactly (port ignored).
pub(crate) struct HostHandler {
    host: String,
    handlers: Handlers,
}

impl HostHandler {
    pub(crate) fn new(host: &str, handlers: Handlers) -> Self {
        Self {
            host: host.to_string(),
            handlers,
        }
    }
}

impl Handler for HostHandler {
    fn handle(&self, ctx: Context) -> Result<(), DispatchError> {
        let matched = ctx
            .request()
            .host()
            .is_some_and(|host| host == self.host);

        if !matched {
            trace!(expected = %self.host, actual = ?ctx.request().host(), "host predicate missed");
            return ctx.next();
        }
        ctx.insert(self.handlers.clone())
    }

    fn name(&self) -> &'static str {
        "host"
    }
}

/// Match on the request body media type, parameters ignored.
pub(crate) struct ContentTypeHandler {
    mime: String,
    handlers: Handlers,
}

impl ContentTypeHandler {
    pub(crate) fn new(mime: &str, handlers: Handlers) -> Self {
        Self {
            mime: mime.trim().to_string(),
            handlers,
        }
    }
}

impl Handler for ContentTypeHandler {
    fn handle(&self, ctx: Context) -> Result<(), DispatchError> {
        let matched = ctx
            .request()
            .content_type_essence()
            .is_some_and(|essence| essence.eq_ignore_ascii_case(&self.mime));

        if !matched {
            trace!(expected = %self.mime, "content type predicate missed");
            return ctx.next();
        }
        ctx.insert(self.handlers.clone())
    }

    fn name(&self) -> &'static str {
        "content_type"
    }
}

type Predicate = Box<dyn Fn(&Context) -> bool + Send + Sync>;

/// Arbitrary predicate over the context.
pub(crate) struct WhenHandler {
    predicate: Predicate,
    handlers: Handlers,
}

impl WhenHandler {
    pub(crate) fn new<P>(predicate: P, handlers: Handlers) -> Self
    where
        P: Fn(&Context) -> bool + Send + Sync + 'static,
    {
        Self {
            predicate: Box::new(predicate),
            handlers,
        }
    }
}

impl Handler for WhenHandler {
    fn handle(&self, ctx: Context) -> Result<(), DispatchError> {
        if !(self.predicate)(&ctx) {
            trace!("when predicate missed");
            return ctx.next();
        }
        ctx.insert(self.handlers.clone())
    }

    fn name(&self) -> &'static str {
        "when"
    }
}
