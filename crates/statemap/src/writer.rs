//! Atomic artifact output.

use crate::error::{PipelineError, Result};
use crate::topology::Topology;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::io::AsyncWriteExt;
use tracing::info;

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

fn temp_path(dest: &Path) -> PathBuf {
    let name = dest
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    dest.with_file_name(format!(
        ".{name}.{}-{}.tmp",
        std::process::id(),
        TEMP_COUNTER.fetch_add(1, Ordering::Relaxed)
    ))
}

/// Serialize `topology` and move it onto `dest` in one rename.
///
/// The payload goes to a sibling temp file first, so a failure at any point
/// leaves an existing `dest` untouched. Returns the number of bytes written.
pub async fn write_topology(topology: &Topology, dest: &Path) -> Result<u64> {
    let body = serde_json::to_vec(topology).map_err(|e| {
        PipelineError::output(dest, std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    })?;

    if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| PipelineError::output(dest, e))?;
    }

    let tmp = temp_path(dest);
    if let Err(e) = write_synced(&tmp, &body).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(PipelineError::output(dest, e));
    }
    if let Err(e) = tokio::fs::rename(&tmp, dest).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(PipelineError::output(dest, e));
    }

    info!("wrote {} ({} bytes)", dest.display(), body.len());
    Ok(body.len() as u64)
}

async fn write_synced(path: &Path, body: &[u8]) -> std::io::Result<()> {
    let mut file = tokio::fs::File::create(path).await?;
    file.write_all(body).await?;
    file.sync_all().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{BoundaryRecord, FeatureId, Geometry};
    use crate::tier::FidelityTier;
    use crate::topology::compose;

    fn sample() -> Topology {
        let record = BoundaryRecord {
            kind: "Feature".to_string(),
            id: FeatureId::Text("R1".to_string()),
            geometry: Geometry::Polygon(vec![vec![
                [0.0, 0.0],
                [1.0, 0.0],
                [1.0, 1.0],
                [0.0, 0.0],
            ]]),
        };
        compose(&[record], FidelityTier::Medium, "states").unwrap()
    }

    #[tokio::test]
    async fn test_write_creates_parent_and_leaves_no_temp() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out/states.topojson");

        let bytes = write_topology(&sample(), &dest).await.unwrap();
        assert_eq!(bytes, std::fs::metadata(&dest).unwrap().len());

        let names: Vec<_> = std::fs::read_dir(dest.parent().unwrap())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("states.topojson")]);

        let back: Topology = serde_json::from_slice(&std::fs::read(&dest).unwrap()).unwrap();
        assert_eq!(back, sample());
    }

    #[test]
    fn test_temp_paths_unique_per_write() {
        let dest = Path::new("/data/states.topojson");
        let a = temp_path(dest);
        let b = temp_path(dest);
        assert_ne!(a, b);
        assert_eq!(a.parent(), dest.parent());
    }

    #[tokio::test]
    async fn test_concurrent_writes_to_same_destination() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("states.topojson");
        let topo = sample();

        let (a, b) = tokio::join!(write_topology(&topo, &dest), write_topology(&topo, &dest));
        assert!(a.is_ok() && b.is_ok());

        let back: Topology = serde_json::from_slice(&std::fs::read(&dest).unwrap()).unwrap();
        assert_eq!(back, topo);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_failed_write_keeps_previous_output() {
        let dir = tempfile::tempdir().unwrap();
        // A directory in the way of the rename target makes the rename fail.
        let dest = dir.path().join("taken");
        std::fs::create_dir(&dest).unwrap();
        std::fs::write(dest.join("keep"), "previous").unwrap();

        let err = write_topology(&sample(), &dest).await.unwrap_err();
        assert!(matches!(err, PipelineError::OutputWrite { ref path, .. } if path == &dest));
        assert_eq!(std::fs::read_to_string(dest.join("keep")).unwrap(), "previous");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
