//! Handlers and the declaration adapters that turn user input into them.
//!
//! A [`Handler`] receives the [`Context`] by value and does exactly one of:
//! render a response, delegate (`ctx.next()`), insert a nested chain, or fail.
//!
//! # Example
//!
//! ```rust,ignore
//! use tokio_chain::handler::{Chain, resolve};
//! use tokio_chain::core::{Context, Response};
//!
//! let app = Chain::build(&registry, |chain| {
//!     chain
//!         .prefix("api", |api| {
//!             api.get_path("users/:id", |ctx: Context| {
//!                 let id = ctx.path_binding().token("id").unwrap_or_default().to_string();
//!                 ctx.render(Response::ok(id))
//!             })?;
//!             Ok(())
//!         })?
//!         .all(resolve::<dyn Fallback>())?;
//!     Ok(())
//! })?;
//! ```

mod assets;
mod by_content;
mod by_method;
mod chain;
mod predicate;
mod scoped;

pub use by_content::ByContentSpec;
pub use by_method::ByMethodSpec;
pub use chain::{Chain, ChainHandler};

use std::marker::PhantomData;
use std::sync::Arc;

use http::StatusCode;

use crate::core::{ChainBuildError, Context, DispatchError, Response};
use crate::registry::Registry;

/// Atomic unit of request processing.
pub trait Handler: Send + Sync {
    /// Handle the request, consuming the context.
    fn handle(&self, ctx: Context) -> Result<(), DispatchError>;

    /// Name used in dispatch logs.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

impl<F> Handler for F
where
    F: Fn(Context) -> Result<(), DispatchError> + Send + Sync,
{
    fn handle(&self, ctx: Context) -> Result<(), DispatchError> {
        self(ctx)
    }

    fn name(&self) -> &'static str {
        "closure"
    }
}

/// Anything that can be appended to a chain as a single handler.
///
/// Conversion happens at chain-build time against the chain's registry.
pub trait IntoHandler {
    fn into_handler(self, registry: &Registry) -> Result<Arc<dyn Handler>, ChainBuildError>;
}

impl<H: Handler + 'static> IntoHandler for H {
    fn into_handler(self, _registry: &Registry) -> Result<Arc<dyn Handler>, ChainBuildError> {
        Ok(Arc::new(self))
    }
}

/// Reference to a handler registered under `H` (usually `dyn SomeTrait`).
///
/// Created by [`resolve`]. The lookup happens once, when the chain is built;
/// a missing entry fails the build with [`ChainBuildError::Resolution`].
pub struct Resolve<H: ?Sized> {
    _marker: PhantomData<fn() -> Box<H>>,
}

/// Refer to the handler registered under `H`.
pub fn resolve<H: ?Sized + Handler + 'static>() -> Resolve<H> {
    Resolve {
        _marker: PhantomData,
    }
}

impl<H: ?Sized + Handler + 'static> IntoHandler for Resolve<H> {
    fn into_handler(self, registry: &Registry) -> Result<Arc<dyn Handler>, ChainBuildError> {
        let handler = registry.get::<H>()?;
        tracing::trace!(handler = handler.name(), "resolved handler from registry");
        Ok(Arc::new(Resolved(handler)))
    }
}

// Arc<H> cannot be unsized into Arc<dyn Handler> when H is itself unsized.
struct Resolved<H: ?Sized>(Arc<H>);

impl<H: ?Sized + Handler> Handler for Resolved<H> {
    fn handle(&self, ctx: Context) -> Result<(), DispatchError> {
        self.0.handle(ctx)
    }

    fn name(&self) -> &'static str {
        self.0.name()
    }
}

/// A reusable chain fragment registered in the registry.
pub trait ChainModule: Send + Sync {
    fn configure(&self, chain: &mut Chain) -> Result<(), ChainBuildError>;
}

/// Chain block that applies the [`ChainModule`] registered under `M`.
pub fn module<M>() -> impl FnOnce(&mut Chain) -> Result<(), ChainBuildError>
where
    M: ?Sized + ChainModule + 'static,
{
    |chain: &mut Chain| {
        let module = chain.registry().get::<M>()?;
        module.configure(chain)
    }
}

/// Renders client errors (404 at end of chain, 405, 406).
///
/// Register an `Arc<dyn ClientErrorHandler>` to customize error pages.
pub trait ClientErrorHandler: Send + Sync {
    fn error(&self, ctx: Context, status: StatusCode) -> Result<(), DispatchError>;
}

/// Renders the bare status with its reason phrase.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultClientErrorHandler;

impl ClientErrorHandler for DefaultClientErrorHandler {
    fn error(&self, ctx: Context, status: StatusCode) -> Result<(), DispatchError> {
        ctx.render(Response::status_only(status).with_header("content-type", "text/plain; charset=utf-8"))
    }
}
