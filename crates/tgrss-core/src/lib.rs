//! Core domain + application logic for the Telegram channel feed gateway.
//!
//! This crate is intentionally framework-agnostic. HTTP lives in the axum
//! adapter crate and the upstream messaging session lives behind the
//! [`session::SessionClient`] port.

pub mod config;
pub mod domain;
pub mod errors;
pub mod feed;
pub mod gateway;
pub mod logging;
pub mod medialink;
pub mod range;
pub mod render;
pub mod session;

#[cfg(test)]
pub(crate) mod testutil;

pub use errors::{Error, Result};
