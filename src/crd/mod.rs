//! Custom Resource Definitions for the revision operator
//!
//! This module defines the Kubernetes CRD holding versioned Envoy configuration.

mod revision;
pub mod types;

#[cfg(test)]
mod tests;

pub use revision::{
    EnvoyConfigRevision, EnvoyConfigRevisionSpec, EnvoyConfigRevisionStatus, ENVOY_API_LABEL,
    NODE_ID_LABEL, RESOURCES_OUT_OF_SYNC_CONDITION, REVISION_PUBLISHED_CONDITION,
    REVISION_TAINTED_CONDITION, VERSION_LABEL,
};
pub use types::*;
