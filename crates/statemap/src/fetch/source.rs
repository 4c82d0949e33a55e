//! Upstream boundary sources.
//!
//! The default source is the Who's On First data host, which stores each
//! record at a path derived from its identifier: the id is split into
//! three-character directories followed by `<id>.geojson`, or
//! `<id>-alt-<variant>.geojson` for alternate geometries.

use crate::error::{PipelineError, Result};
use crate::ids::{RegionId, Variant, ALT_MARKER};
use async_trait::async_trait;
use tracing::debug;

/// Default upstream host.
pub const DEFAULT_SOURCE_URL: &str = "https://data.whosonfirst.org";

/// Something that can retrieve the raw payload for a region.
#[async_trait]
pub trait BoundarySource: Send + Sync {
    async fn retrieve(&self, id: &RegionId, variant: Option<&Variant>) -> Result<String>;
}

/// Relative path of a region's payload on the upstream host.
pub fn relative_path(id: &RegionId, variant: Option<&Variant>) -> String {
    let chars: Vec<char> = id.as_str().chars().collect();
    let mut path: Vec<String> = chars.chunks(3).map(|c| c.iter().collect()).collect();

    let file = match variant {
        Some(v) => format!("{id}{ALT_MARKER}{v}.geojson"),
        None => format!("{id}.geojson"),
    };
    path.push(file);
    path.join("/")
}

/// HTTP source backed by `reqwest`.
pub struct HttpSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpSource {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("statemap/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| PipelineError::Configuration(format!("cannot build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn url_for(&self, id: &RegionId, variant: Option<&Variant>) -> String {
        format!("{}/{}", self.base_url, relative_path(id, variant))
    }
}

#[async_trait]
impl BoundarySource for HttpSource {
    async fn retrieve(&self, id: &RegionId, variant: Option<&Variant>) -> Result<String> {
        let url = self.url_for(id, variant);
        debug!("GET {url}");

        let fail = |reason: String| PipelineError::Fetch {
            id: id.to_string(),
            reason,
        };

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| fail(format!("request to {url} failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(fail(format!("HTTP {} from {url}", status.as_u16())));
        }

        resp.text()
            .await
            .map_err(|e| fail(format!("reading body from {url}: {e}")))
    }
}
