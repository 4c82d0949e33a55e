//! Cached, concurrency-limited boundary fetching.

pub mod limiter;
pub mod source;

pub use limiter::{FetchLimiter, FetchPermit, DEFAULT_CONCURRENCY};
pub use source::{relative_path, BoundarySource, HttpSource, DEFAULT_SOURCE_URL};

use crate::cache::{CacheKey, ContentCache};
use crate::error::{PipelineError, Result};
use crate::ids::{RegionId, Variant};
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

/// Where a payload came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadOrigin {
    Cache,
    Network,
}

/// A raw payload plus its provenance.
#[derive(Debug, Clone)]
pub struct FetchedPayload {
    pub body: String,
    pub origin: PayloadOrigin,
}

/// Write-through cache in front of a [`BoundarySource`].
///
/// Cache reads are not gated by the limiter; only upstream retrievals are.
pub struct BoundaryFetcher {
    cache: ContentCache,
    source: Arc<dyn BoundarySource>,
    limiter: FetchLimiter,
}

impl BoundaryFetcher {
    pub fn new(cache: ContentCache, source: Arc<dyn BoundarySource>, limiter: FetchLimiter) -> Self {
        Self {
            cache,
            source,
            limiter,
        }
    }

    pub fn limiter(&self) -> &FetchLimiter {
        &self.limiter
    }

    /// Resolve a region to its raw payload, hitting the network only on a
    /// cache miss. A miss results in exactly one cache write.
    pub async fn fetch(&self, id: &RegionId, variant: Option<&Variant>) -> Result<FetchedPayload> {
        let key = CacheKey::new(id, variant);

        if let Some(body) = self.cache.get(&key).await? {
            return Ok(FetchedPayload {
                body,
                origin: PayloadOrigin::Cache,
            });
        }

        let body = {
            let _permit = self.limiter.acquire().await.map_err(|_| PipelineError::Fetch {
                id: id.to_string(),
                reason: "fetch limiter closed".to_string(),
            })?;
            debug!("cache miss {key}, fetching upstream");
            self.source.retrieve(id, variant).await?
        };

        self.cache.put(&key, &body).await?;
        Ok(FetchedPayload {
            body,
            origin: PayloadOrigin::Network,
        })
    }
}
