//! Shared wire types for apprv, an asynchronous approval workflow server.
//!
//! This crate holds everything that crosses a process boundary: the event
//! DTOs returned by the HTTP API, the interactive-callback payload posted by
//! Slack and its structural validation, the result payload sent back to the
//! callback's `response_url`, and the Slack request-signing scheme.
//!
//! The HTTP client lives behind the `client` feature so the server does not
//! pull in `reqwest` twice for nothing.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![forbid(unsafe_code)]

#[cfg(feature = "client")]
pub mod client;
pub mod objects;
pub mod signature;
