//! Integration tests for tokio_chain
//!
//! Each test starts a server in-process on an ephemeral port and talks to it
//! over real HTTP with reqwest.
//!
//! Run with: cargo test --test integration

mod helpers;

mod files;
mod lifecycle;
mod negotiation;
mod registry;
mod routing;
