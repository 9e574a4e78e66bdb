//! tokio_chain - declarative request-handling chains on Tokio and hyper.
//!
//! A chain is an ordered list of handlers assembled once at startup. Each
//! request walks it in declaration order; handlers either render a response
//! or pass the request on with [`Context::next`](core::Context::next).
//! Predicate wrappers (path, method, header, host, content type) run a
//! nested chain only when they match and are transparent otherwise.
//!
//! # Features
//!
//! - **Chain builder**: [`Chain`](handler::Chain) with path, prefix, method,
//!   header, host, content-type and custom predicates
//! - **Registry**: typed lookup scoped per nested chain, joined rather than
//!   mutated
//! - **File-system binding**: rebased per nested chain, no escape from root
//! - **By-method / by-content dispatch** with 405/406 defaults
//! - **Server**: HTTP/1 and HTTP/2 through hyper-util with graceful shutdown
//!
//! # Example
//!
//! ```rust,ignore
//! use tokio_chain::core::{Context, Response};
//! use tokio_chain::handler::Chain;
//! use tokio_chain::registry::Registry;
//!
//! let app = Chain::build(&Registry::empty(), |chain| {
//!     chain
//!         .get_path("hello/:name", |ctx: Context| {
//!             let name = ctx.path_binding().token("name").unwrap_or("world").to_string();
//!             ctx.render(Response::ok(format!("hello {}", name)))
//!         })?
//!         .prefix("api", |api| {
//!             api.path("items", |ctx: Context| {
//!                 ctx.by_content(|c| {
//!                     c.json(|ctx| ctx.render(Response::ok("[]")))
//!                         .html(|ctx| ctx.render(Response::ok("<ul></ul>")));
//!                 })
//!             })?;
//!             Ok(())
//!         })?;
//!     Ok(())
//! })?;
//! ```

/// Package version from Cargo.toml
pub const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Git commit hash (8 chars) with optional "-dirty" suffix
pub const BUILD_VERSION: &str = env!("BUILD_VERSION");

/// Full version string: "0.1.0 (abc12345)" or "0.1.0 (abc12345-dirty)"
pub const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("BUILD_VERSION"), ")");

pub mod config;
pub mod core;
pub mod dispatch;
pub mod file_system;
pub mod handler;
pub mod logging;
pub mod negotiation;
pub mod path;
pub mod registry;
pub mod server;
