//! Error types for the boundary pipeline.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can abort a run.
///
/// Every variant is fatal: a topology with a missing region is not a valid
/// artifact, so nothing here is retried or skipped.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("input error: {0}")]
    Input(String),

    #[error("failed to fetch region {id}: {reason}")]
    Fetch { id: String, reason: String },

    #[error("malformed payload for region {id}: {reason}")]
    MalformedPayload { id: String, reason: String },

    #[error("no boundary records to compose")]
    EmptyInput,

    #[error("cache storage error at {}: {source}", path.display())]
    CacheStorage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write output {}: {source}", path.display())]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PipelineError {
    pub(crate) fn cache(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::CacheStorage {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn output(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::OutputWrite {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn malformed(id: &str, reason: impl Into<String>) -> Self {
        Self::MalformedPayload {
            id: id.to_string(),
            reason: reason.into(),
        }
    }

    /// Region identifier this error is attributed to, if any.
    pub fn region(&self) -> Option<&str> {
        match self {
            Self::Fetch { id, .. } | Self::MalformedPayload { id, .. } => Some(id),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
