//! statemap: build a compact TopoJSON map of U.S. state boundaries from
//! per-region GeoJSON records.
//!
//! A run reads an identifier list, fetches each region's boundary through an
//! on-disk cache with bounded concurrency, strips the payloads down to
//! `{ type, id, geometry }`, merges everything into one shared-arc topology,
//! simplifies and quantizes it for the chosen [`FidelityTier`], and writes the
//! result atomically.

pub mod cache;
pub mod config;
pub mod error;
pub mod fetch;
pub mod ids;
pub mod normalize;
pub mod pipeline;
pub mod progress;
pub mod record;
pub mod tier;
pub mod topology;
pub mod writer;

pub use cache::{CacheKey, CacheStats, ContentCache};
pub use config::PipelineConfig;
pub use error::{PipelineError, Result};
pub use fetch::{BoundaryFetcher, BoundarySource, FetchLimiter, HttpSource, PayloadOrigin};
pub use ids::{RegionId, Variant};
pub use pipeline::{generate, run, RunSummary};
pub use progress::{NullProgress, ProgressSink};
pub use record::{BoundaryRecord, FeatureId, Geometry};
pub use tier::FidelityTier;
pub use topology::{compose, Topology};
