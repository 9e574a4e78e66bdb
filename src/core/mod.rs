//! Core types for dispatching a request through a compiled chain.
//!
//! - [`Request`] - read-only request view shared by every handler
//! - [`Response`] - response rendered by terminal handlers, with a builder
//! - [`Context`] - per-request dispatch state passed by value
//! - [`RequestOutcome`] - what close callbacks observe
//! - error types for chain assembly and dispatch
//!
//! # Example
//!
//! ```rust,ignore
//! use tokio_chain::core::{Context, DispatchError, Response};
//!
//! fn hello(mut ctx: Context) -> Result<(), DispatchError> {
//!     ctx.set_response_header("X-Custom", "value");
//!     ctx.render(Response::ok("Hello, World!"))
//! }
//! ```

mod context;
mod error;
mod exchange;
mod request;
mod response;

pub use context::{Context, Handlers};
pub(crate) use context::Scope;
pub use error::{BoxError, ChainBuildError, DispatchError, ResolutionError};
pub use exchange::RequestOutcome;
pub(crate) use exchange::{CloseHooks, Exchange};
pub use request::Request;
pub use response::Response;
