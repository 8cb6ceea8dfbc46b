//! Remote job backend client library.
//!
//! Provides the backend contract ([`backend::JobBackend`]), its HTTP
//! implementation over hosted edge functions, typed wire messages,
//! session credentials with token refresh, and the submit-and-poll
//! [`client::WorkflowClient`] that drives one generation to completion.

pub mod api;
pub mod backend;
pub mod client;
pub mod config;
pub mod enhance;
pub mod messages;
pub mod session;
pub mod storage;
