//! End-to-end run: identifiers → fetch → normalize → compose → write.

use crate::cache::ContentCache;
use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::fetch::{BoundaryFetcher, BoundarySource, FetchLimiter, HttpSource, PayloadOrigin};
use crate::ids::{read_identifiers, RegionId, Variant};
use crate::normalize::normalize;
use crate::progress::ProgressSink;
use crate::record::BoundaryRecord;
use crate::tier::FidelityTier;
use crate::topology::compose;
use crate::writer::write_topology;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Fetch tasks admitted per limiter slot. Tasks beyond the limiter's
/// capacity only read the cache or wait for a slot.
const PENDING_PER_SLOT: usize = 4;

/// What a completed run did.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub regions: usize,
    pub cache_hits: usize,
    pub network_fetches: usize,
    pub arcs: usize,
    pub tier: FidelityTier,
    pub output: PathBuf,
    pub output_bytes: u64,
    pub duration_ms: u64,
}

/// Records for every requested region, in identifier order.
#[derive(Debug)]
pub struct FetchedRecords {
    pub records: Vec<BoundaryRecord>,
    pub cache_hits: usize,
    pub network_fetches: usize,
}

/// Run against the configured HTTP source.
pub async fn generate(config: &PipelineConfig, progress: &dyn ProgressSink) -> Result<RunSummary> {
    config.validate()?;
    let source = Arc::new(HttpSource::new(&config.source_url)?);
    run(config, source, progress).await
}

/// Run against an arbitrary source. `progress.finish()` is called on every exit path.
pub async fn run(
    config: &PipelineConfig,
    source: Arc<dyn BoundarySource>,
    progress: &dyn ProgressSink,
) -> Result<RunSummary> {
    let result = run_stages(config, source, progress).await;
    progress.finish();
    result
}

async fn run_stages(
    config: &PipelineConfig,
    source: Arc<dyn BoundarySource>,
    progress: &dyn ProgressSink,
) -> Result<RunSummary> {
    let started = Instant::now();
    config.validate()?;
    let limiter = FetchLimiter::new(config.concurrency)?;

    let ids = read_identifiers(&config.input).await?;
    if ids.is_empty() {
        return Err(PipelineError::EmptyInput);
    }
    info!("{} regions listed in {}", ids.len(), config.input.display());

    let cache = ContentCache::open(&config.cache_dir).await?;
    if config.clear_cache {
        let removed = cache.clear().await?;
        info!("cleared {removed} cached payloads");
    }

    let fetcher = BoundaryFetcher::new(cache, source, limiter);
    let fetched = fetch_records(&fetcher, &ids, config.variant.as_ref(), progress).await?;

    progress.composing(fetched.records.len());
    let topology = compose(&fetched.records, config.tier, &config.object_name)?;

    let output_bytes = write_topology(&topology, &config.output).await?;
    progress.written(&config.output, output_bytes);

    Ok(RunSummary {
        regions: topology.geometry_count(),
        cache_hits: fetched.cache_hits,
        network_fetches: fetched.network_fetches,
        arcs: topology.arcs.len(),
        tier: config.tier,
        output: config.output.clone(),
        output_bytes,
        duration_ms: started.elapsed().as_millis() as u64,
    })
}

/// Fetch and normalize every region, then restore identifier order.
///
/// Returns on the first failure; tasks not yet started are never started.
pub async fn fetch_records(
    fetcher: &BoundaryFetcher,
    ids: &[RegionId],
    variant: Option<&Variant>,
    progress: &dyn ProgressSink,
) -> Result<FetchedRecords> {
    let total = ids.len();
    progress.fetch_started(total);

    let mut tasks = stream::iter(ids.iter().enumerate())
        .map(|(index, id)| async move {
            let payload = fetcher.fetch(id, variant).await?;
            let record = normalize(id, &payload.body)?;
            Ok::<_, PipelineError>((index, record, payload.origin))
        })
        .buffer_unordered(fetcher.limiter().capacity().saturating_mul(PENDING_PER_SLOT));

    let mut slots: Vec<Option<BoundaryRecord>> = Vec::with_capacity(total);
    slots.resize_with(total, || None);
    let mut cache_hits = 0;
    let mut network_fetches = 0;
    let mut done = 0;

    while let Some(result) = tasks.next().await {
        let (index, record, origin) = result?;
        match origin {
            PayloadOrigin::Cache => cache_hits += 1,
            PayloadOrigin::Network => network_fetches += 1,
        }
        done += 1;
        slots[index] = Some(record);
        progress.region_fetched(&ids[index], origin, done, total);
    }

    let records: Vec<BoundaryRecord> = slots.into_iter().flatten().collect();
    info!(
        "fetched {} regions ({cache_hits} cached, {network_fetches} from upstream)",
        records.len()
    );

    Ok(FetchedRecords {
        records,
        cache_hits,
        network_fetches,
    })
}
