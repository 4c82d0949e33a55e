//! `statemap generate`: build the TopoJSON artifact.

use crate::cli::output::{self, OutputMode, Styled};
use crate::cli::progress::StderrProgress;
use crate::cli::GenerateArgs;
use anyhow::{Context, Result};
use statemap::config::default_cache_dir;
use statemap::{PipelineConfig, RunSummary};
use tracing::debug;

impl GenerateArgs {
    /// Resolve flags into a pipeline configuration.
    pub fn to_config(&self) -> PipelineConfig {
        PipelineConfig {
            input: self.input.clone(),
            output: self.output.clone(),
            cache_dir: self.cache_dir.clone().unwrap_or_else(default_cache_dir),
            source_url: self.source_url.clone(),
            concurrency: self.concurrency,
            tier: self.tier,
            variant: self.alt.clone(),
            object_name: self.object_name.clone(),
            clear_cache: self.clear_cache,
        }
    }
}

/// Run the generate command.
pub async fn run(args: &GenerateArgs, mode: OutputMode) -> Result<RunSummary> {
    let s = Styled::new();
    let config = args.to_config();
    debug!(?config, "resolved generate configuration");

    if mode.chatty() {
        output::print_header(&s);
        if mode.verbose {
            eprintln!("  Input:       {}", config.input.display());
            eprintln!("  Cache:       {}", config.cache_dir.display());
            eprintln!("  Source:      {}", config.source_url);
            eprintln!("  Tier:        {}", config.tier);
            eprintln!("  Concurrency: {}", config.concurrency);
            eprintln!();
        }
    }

    let progress = StderrProgress::new(mode);
    let summary = statemap::generate(&config, &progress)
        .await
        .with_context(|| format!("generating {}", config.output.display()))?;

    if mode.json {
        output::print_json(&serde_json::to_value(&summary)?);
    } else if !mode.quiet {
        print_summary(&s, &summary);
    }

    Ok(summary)
}

fn print_summary(s: &Styled, summary: &RunSummary) {
    eprintln!();
    eprintln!(
        "  Done in {:.1}s",
        summary.duration_ms as f64 / 1000.0
    );
    eprintln!("  Regions:   {}", summary.regions);
    eprintln!(
        "  Fetched:   {} from cache, {} from upstream",
        summary.cache_hits, summary.network_fetches
    );
    eprintln!("  Arcs:      {}", summary.arcs);
    eprintln!("  Tier:      {}", summary.tier);
    eprintln!(
        "  Output:    {} ({})",
        s.bold(&summary.output.display().to_string()),
        output::format_size(summary.output_bytes)
    );
}
