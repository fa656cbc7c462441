//! Error types for the revision operator

use thiserror::Error;

use crate::controller::publish::PublishError;

#[derive(Error, Debug)]
pub enum Error {
    /// Kubernetes API error
    #[error("Kubernetes API error: {0}")]
    KubeError(#[from] kube::Error),

    /// Invalid operator configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A lookup matched no revision
    #[error("Not found: {0}")]
    NotFound(String),

    /// A point lookup matched more than one revision
    #[error("Ambiguous result: {0}")]
    AmbiguousResult(String),

    /// Optimistic concurrency clash while writing a revision
    #[error("Conflict writing {0}, object was modified concurrently")]
    Conflict(String),

    /// The publish pipeline failed
    #[error(transparent)]
    Publish(#[from] PublishError),

    /// Removing resources from the serving cache failed
    #[error("Cleanup error: {0}")]
    CleanupError(String),
}

impl Error {
    /// Whether retrying the reconciliation soon is likely to succeed
    pub fn is_retriable(&self) -> bool {
        match self {
            Error::KubeError(_) | Error::Conflict(_) | Error::CleanupError(_) => true,
            Error::Publish(e) => !e.is_permanent(),
            _ => false,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
