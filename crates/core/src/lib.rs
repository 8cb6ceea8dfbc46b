//! Domain layer for the rendering workflow client.
//!
//! Holds the request/status/result types exchanged with the remote job
//! backend, the static service resolution tables, the caller-facing
//! error taxonomy, and the pure text rules used for prompt enhancement.
//! Nothing in this crate performs I/O.

pub mod catalog;
pub mod classify;
pub mod error;
pub mod job;
pub mod progress;
pub mod prompt;
pub mod request;
pub mod routing;
