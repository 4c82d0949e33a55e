//! `statemap cache`: manage cached boundary payloads.

use crate::cli::output::{self, OutputMode, Styled};
use anyhow::{anyhow, Context, Result};
use statemap::config::default_cache_dir;
use statemap::{CacheKey, ContentCache, RegionId, Variant};
use std::path::PathBuf;

async fn open(dir: Option<PathBuf>) -> Result<ContentCache> {
    let dir = dir.unwrap_or_else(default_cache_dir);
    ContentCache::open(&dir)
        .await
        .with_context(|| format!("opening cache at {}", dir.display()))
}

/// Clear one cached payload, or all of them.
pub async fn run_clear(
    dir: Option<PathBuf>,
    id: Option<&str>,
    alt: Option<&Variant>,
    mode: OutputMode,
) -> Result<()> {
    let s = Styled::new();
    let cache = open(dir).await?;

    match id {
        Some(raw) => {
            let region = RegionId::parse(raw).map_err(|e| anyhow!("invalid region identifier: {e}"))?;
            let key = CacheKey::new(&region, alt);
            let removed = cache.remove(&key).await?;

            if mode.json {
                output::print_json(&serde_json::json!({
                    "key": key.as_str(),
                    "cleared": removed,
                }));
            } else if !mode.quiet {
                if removed {
                    eprintln!("  {} Cleared cached payload for '{key}'.", s.ok_sym());
                } else {
                    eprintln!("  No cached payload for '{key}'.");
                }
            }
        }
        None => {
            let before = cache.stats().await?;
            let count = cache.clear().await?;

            if mode.json {
                output::print_json(&serde_json::json!({
                    "cleared_count": count,
                    "cleared_bytes": before.bytes,
                }));
            } else if !mode.quiet {
                if count > 0 {
                    eprintln!(
                        "  {} Cleared {count} cached payload(s) ({}).",
                        s.ok_sym(),
                        output::format_size(before.bytes)
                    );
                } else {
                    eprintln!("  No cached payloads to clear.");
                }
            }
        }
    }

    Ok(())
}

/// Show how much is cached.
pub async fn run_stats(dir: Option<PathBuf>, mode: OutputMode) -> Result<()> {
    let cache = open(dir).await?;
    let stats = cache.stats().await?;

    if mode.json {
        output::print_json(&serde_json::json!({
            "dir": cache.dir().display().to_string(),
            "entries": stats.entries,
            "bytes": stats.bytes,
        }));
    } else if !mode.quiet {
        eprintln!("  Cache:     {}", cache.dir().display());
        eprintln!("  Entries:   {}", stats.entries);
        eprintln!("  Size:      {}", output::format_size(stats.bytes));
    }

    Ok(())
}
