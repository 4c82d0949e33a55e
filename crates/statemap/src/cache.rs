//! On-disk content cache for raw boundary payloads.
//!
//! One file per key under the cache directory. Entries are immutable once
//! written and are never revalidated against upstream; only `clear` and
//! `remove` make them go away.

use crate::error::{PipelineError, Result};
use crate::ids::{RegionId, Variant, ALT_MARKER};
use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime};
use tracing::debug;

/// Extension of cache entry files.
const ENTRY_EXT: &str = "geojson";

/// Extension of in-progress writes.
const TEMP_EXT: &str = "tmp";

/// Temp files untouched for this long belong to an interrupted write.
const STALE_TEMP_AGE: Duration = Duration::from_secs(10 * 60);

/// Monotonic counter for unique temp file names within this process.
static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Key of a cached payload: the region identifier plus optional variant.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(id: &RegionId, variant: Option<&Variant>) -> Self {
        match variant {
            Some(v) => Self(format!("{id}{ALT_MARKER}{v}")),
            None => Self(id.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Entry count and total size of the cache directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub bytes: u64,
}

/// Directory-backed payload cache.
#[derive(Debug, Clone)]
pub struct ContentCache {
    dir: PathBuf,
}

impl ContentCache {
    /// Open (creating if needed) a cache rooted at `dir`, removing temp files
    /// left behind by interrupted writes.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| PipelineError::cache(&dir, e))?;
        let cache = Self { dir };
        cache.sweep_stale_temps(STALE_TEMP_AGE).await?;
        Ok(cache)
    }

    /// Remove temp files not modified within `max_age`. Younger ones may
    /// belong to a write still in progress in another process.
    async fn sweep_stale_temps(&self, max_age: Duration) -> Result<usize> {
        let now = SystemTime::now();
        let mut swept = 0;
        let mut entries = tokio::fs::read_dir(&self.dir)
            .await
            .map_err(|e| PipelineError::cache(&self.dir, e))?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| PipelineError::cache(&self.dir, e))?
        {
            let path = entry.path();
            if !path.extension().is_some_and(|e| e == TEMP_EXT) {
                continue;
            }
            let age = entry
                .metadata()
                .await
                .and_then(|m| m.modified())
                .ok()
                .and_then(|t| now.duration_since(t).ok());
            if !age.is_some_and(|a| a >= max_age) {
                continue;
            }
            match tokio::fs::remove_file(&path).await {
                Ok(()) => swept += 1,
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(PipelineError::cache(&path, e)),
            }
        }

        if swept > 0 {
            debug!("swept {swept} stale temp files from {}", self.dir.display());
        }
        Ok(swept)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, key: &CacheKey) -> PathBuf {
        self.dir.join(format!("{key}.{ENTRY_EXT}"))
    }

    /// Look up a payload. A missing entry is a miss, never an error.
    pub async fn get(&self, key: &CacheKey) -> Result<Option<String>> {
        let path = self.entry_path(key);
        match tokio::fs::read_to_string(&path).await {
            Ok(body) => {
                debug!("cache hit {key}");
                Ok(Some(body))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(PipelineError::cache(path, e)),
        }
    }

    /// Store a payload. The entry appears atomically via rename.
    pub async fn put(&self, key: &CacheKey, body: &str) -> Result<()> {
        let path = self.entry_path(key);
        let tmp = self.dir.join(format!(
            ".{key}.{}-{}.{TEMP_EXT}",
            std::process::id(),
            TEMP_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));

        if let Err(e) = tokio::fs::write(&tmp, body).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(PipelineError::cache(tmp, e));
        }
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(PipelineError::cache(path, e));
        }
        debug!("cached {key} ({} bytes)", body.len());
        Ok(())
    }

    /// Remove a single entry. Returns whether it existed.
    pub async fn remove(&self, key: &CacheKey) -> Result<bool> {
        let path = self.entry_path(key);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(PipelineError::cache(path, e)),
        }
    }

    /// Remove every entry, including leftover temp files. Returns the number
    /// of entries removed.
    pub async fn clear(&self) -> Result<usize> {
        let mut count = 0;
        let mut entries = tokio::fs::read_dir(&self.dir)
            .await
            .map_err(|e| PipelineError::cache(&self.dir, e))?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| PipelineError::cache(&self.dir, e))?
        {
            let path = entry.path();
            let is_entry = path.extension().is_some_and(|e| e == ENTRY_EXT);
            let is_temp = path.extension().is_some_and(|e| e == TEMP_EXT);
            if !(is_entry || is_temp) {
                continue;
            }
            tokio::fs::remove_file(&path)
                .await
                .map_err(|e| PipelineError::cache(&path, e))?;
            if is_entry {
                count += 1;
            }
        }

        debug!("cleared {count} cache entries from {}", self.dir.display());
        Ok(count)
    }

    /// Count entries and their total size.
    pub async fn stats(&self) -> Result<CacheStats> {
        let mut stats = CacheStats::default();
        let mut entries = tokio::fs::read_dir(&self.dir)
            .await
            .map_err(|e| PipelineError::cache(&self.dir, e))?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| PipelineError::cache(&self.dir, e))?
        {
            let path = entry.path();
            if path.extension().is_some_and(|e| e == ENTRY_EXT) {
                let meta = entry
                    .metadata()
                    .await
                    .map_err(|e| PipelineError::cache(&path, e))?;
                stats.entries += 1;
                stats.bytes += meta.len();
            }
        }

        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(id: &str) -> CacheKey {
        CacheKey::new(&RegionId::parse(id).unwrap(), None)
    }

    #[tokio::test]
    async fn test_put_then_get_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ContentCache::open(dir.path()).await.unwrap();

        cache.put(&key("R1"), r#"{"type":"Feature"}"#).await.unwrap();
        let got = cache.get(&key("R1")).await.unwrap();
        assert_eq!(got.as_deref(), Some(r#"{"type":"Feature"}"#));
    }

    #[tokio::test]
    async fn test_get_unused_key_is_miss() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ContentCache::open(dir.path()).await.unwrap();
        assert!(cache.get(&key("never")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_clear_removes_entries() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ContentCache::open(dir.path()).await.unwrap();
        cache.put(&key("R1"), "a").await.unwrap();
        cache.put(&key("R2"), "b").await.unwrap();

        assert_eq!(cache.clear().await.unwrap(), 2);
        assert!(cache.get(&key("R1")).await.unwrap().is_none());
        assert_eq!(cache.stats().await.unwrap(), CacheStats::default());
    }

    #[tokio::test]
    async fn test_variant_keys_do_not_collide() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ContentCache::open(dir.path()).await.unwrap();
        let id = RegionId::parse("85688637").unwrap();
        let low = Variant::parse("low").unwrap();

        cache.put(&CacheKey::new(&id, None), "default").await.unwrap();
        cache.put(&CacheKey::new(&id, Some(&low)), "low").await.unwrap();

        assert_eq!(
            cache.get(&CacheKey::new(&id, None)).await.unwrap().as_deref(),
            Some("default")
        );
        assert_eq!(
            cache.get(&CacheKey::new(&id, Some(&low))).await.unwrap().as_deref(),
            Some("low")
        );
        assert_eq!(CacheKey::new(&id, Some(&low)).as_str(), "85688637-alt-low");
    }

    #[tokio::test]
    async fn test_remove_single_entry() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ContentCache::open(dir.path()).await.unwrap();
        cache.put(&key("R1"), "a").await.unwrap();
        cache.put(&key("R2"), "bb").await.unwrap();

        assert!(cache.remove(&key("R1")).await.unwrap());
        assert!(!cache.remove(&key("R1")).await.unwrap());
        assert_eq!(
            cache.stats().await.unwrap(),
            CacheStats {
                entries: 1,
                bytes: 2
            }
        );
    }

    fn backdate(path: &Path, by: Duration) {
        let file = std::fs::File::options().write(true).open(path).unwrap();
        file.set_modified(SystemTime::now() - by).unwrap();
    }

    #[tokio::test]
    async fn test_open_sweeps_stale_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let stale = dir.path().join(".R1.1234-0.tmp");
        let fresh = dir.path().join(".R2.1234-1.tmp");
        std::fs::write(&stale, "partial").unwrap();
        std::fs::write(&fresh, "in progress").unwrap();
        backdate(&stale, STALE_TEMP_AGE + Duration::from_secs(60));

        let cache = ContentCache::open(dir.path()).await.unwrap();
        cache.put(&key("R3"), "c").await.unwrap();

        assert!(!stale.exists());
        assert!(fresh.exists());
        assert_eq!(cache.stats().await.unwrap().entries, 1);
    }

    #[tokio::test]
    async fn test_sweep_leaves_entries_alone() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ContentCache::open(dir.path()).await.unwrap();
        cache.put(&key("R1"), "a").await.unwrap();
        backdate(&dir.path().join("R1.geojson"), STALE_TEMP_AGE * 2);

        assert_eq!(cache.sweep_stale_temps(Duration::ZERO).await.unwrap(), 0);
        assert_eq!(cache.get(&key("R1")).await.unwrap().as_deref(), Some("a"));
    }

    #[tokio::test]
    async fn test_entries_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let cache = ContentCache::open(dir.path()).await.unwrap();
            cache.put(&key("R1"), "persisted").await.unwrap();
        }
        let cache = ContentCache::open(dir.path()).await.unwrap();
        assert_eq!(
            cache.get(&key("R1")).await.unwrap().as_deref(),
            Some("persisted")
        );
    }
}
