//! revision-operator: Kubernetes operator for EnvoyConfigRevision resources
//!
//! This crate reconciles versioned Envoy configuration snapshots stored as
//! custom resources and publishes them into the serving cache consumed by
//! Envoy nodes.

pub mod cache;
pub mod controller;
pub mod crd;
pub mod envoy;
pub mod error;
pub mod telemetry;

#[cfg(feature = "rest-api")]
pub mod rest_api;

pub use crate::error::{Error, Result};
