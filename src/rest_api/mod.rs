//! REST API module for health probes and cache inspection
//!
//! Provides an HTTP API exposing liveness, readiness and the content of the
//! serving cache per Envoy node.

mod dto;
mod handlers;
mod server;

pub use server::{run_server, ApiState};
