#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![forbid(unsafe_code)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

pub mod auth;
pub mod config;
pub mod entities;
pub mod error;
pub mod framework;
pub mod lifecycle;
pub mod notify;
pub mod payment;
pub mod store;
pub mod utils;

#[cfg(test)]
pub(crate) mod testing;
