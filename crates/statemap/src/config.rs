//! Run configuration and default locations.

use crate::error::{PipelineError, Result};
use crate::fetch::limiter::check_capacity;
use crate::fetch::{DEFAULT_CONCURRENCY, DEFAULT_SOURCE_URL};
use crate::ids::Variant;
use crate::tier::FidelityTier;
use crate::topology::DEFAULT_OBJECT_NAME;
use std::path::PathBuf;

/// Default identifier list, as shipped next to the generator.
pub const DEFAULT_INPUT: &str = "wof-ids";

/// Default artifact path.
pub const DEFAULT_OUTPUT: &str = "usa-50-states-and-dc.topojson";

/// Root directory for persistent state: `$STATEMAP_HOME` or `~/.statemap`.
pub fn statemap_home() -> PathBuf {
    if let Ok(p) = std::env::var("STATEMAP_HOME") {
        return PathBuf::from(p);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join(".statemap")
}

/// Default payload cache directory.
pub fn default_cache_dir() -> PathBuf {
    statemap_home().join("cache")
}

/// Everything a run needs to know.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    pub cache_dir: PathBuf,
    pub source_url: String,
    pub concurrency: usize,
    pub tier: FidelityTier,
    pub variant: Option<Variant>,
    pub object_name: String,
    pub clear_cache: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from(DEFAULT_INPUT),
            output: PathBuf::from(DEFAULT_OUTPUT),
            cache_dir: default_cache_dir(),
            source_url: DEFAULT_SOURCE_URL.to_string(),
            concurrency: DEFAULT_CONCURRENCY,
            tier: FidelityTier::default(),
            variant: None,
            object_name: DEFAULT_OBJECT_NAME.to_string(),
            clear_cache: false,
        }
    }
}

impl PipelineConfig {
    /// Reject settings that can be checked before touching disk or network.
    pub fn validate(&self) -> Result<()> {
        check_capacity(self.concurrency)?;
        if self.object_name.trim().is_empty() {
            return Err(PipelineError::Configuration(
                "object name must not be empty".to_string(),
            ));
        }
        if !(self.source_url.starts_with("http://") || self.source_url.starts_with("https://")) {
            return Err(PipelineError::Configuration(format!(
                "source URL '{}' must be http(s)",
                self.source_url
            )));
        }
        if self.output.as_os_str().is_empty() || self.output.file_name().is_none() {
            return Err(PipelineError::Configuration(format!(
                "output path '{}' does not name a file",
                self.output.display()
            )));
        }
        Ok(())
    }
}
