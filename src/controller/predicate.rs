//! Admission of revisions into this controller
//!
//! One operator instance serves a single Envoy API version. Revisions
//! declaring another version belong to a different instance and are ignored.

use crate::crd::{EnvoyApiVersion, EnvoyConfigRevision};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ApiVersionFilter {
    version: EnvoyApiVersion,
}

impl ApiVersionFilter {
    pub fn new(version: EnvoyApiVersion) -> Self {
        Self { version }
    }

    pub fn version(&self) -> EnvoyApiVersion {
        self.version
    }

    pub fn admits(&self, revision: &EnvoyConfigRevision) -> bool {
        revision.envoy_api() == self.version
    }
}
