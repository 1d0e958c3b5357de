//! Shared wire types for the gigmart service marketplace.
//!
//! Everything that crosses the HTTP or WebSocket boundary lives here so the
//! server and its clients agree on one definition. The typed clients are
//! gated behind the `client` feature.

pub mod objects;
pub mod token;

#[cfg(feature = "client")]
pub mod client;
