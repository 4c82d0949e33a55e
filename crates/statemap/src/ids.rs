//! Region identifiers, geometry variants, and the identifier list reader.
//!
//! Identifiers end up as path segments both in upstream URLs and in cache
//! file names, so they are restricted to a conservative character set.

use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::warn;

/// Marker separating an identifier from its geometry variant.
pub const ALT_MARKER: &str = "-alt-";

/// Line prefix that marks a comment in the identifier list.
pub const COMMENT_PREFIX: char = '#';

/// Opaque key identifying one boundary region upstream.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionId(String);

impl RegionId {
    /// Validate and wrap an identifier.
    pub fn parse(raw: &str) -> std::result::Result<Self, String> {
        check_segment(raw)?;
        if raw.contains(ALT_MARKER) {
            return Err(format!("identifier '{raw}' contains reserved marker '{ALT_MARKER}'"));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RegionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Name of an alternate geometry for a region (e.g. a lower-detail source).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Variant(String);

impl Variant {
    pub fn parse(raw: &str) -> Result<Self> {
        check_segment(raw)
            .map(|()| Self(raw.to_string()))
            .map_err(|e| PipelineError::Configuration(format!("invalid geometry variant: {e}")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Variant {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn check_segment(raw: &str) -> std::result::Result<(), String> {
    if raw.is_empty() {
        return Err("empty value".to_string());
    }
    if raw == "." || raw == ".." {
        return Err(format!("'{raw}' is not a valid name"));
    }
    match raw
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
    {
        Some(c) => Err(format!("'{raw}' contains invalid character {c:?}")),
        None => Ok(()),
    }
}

/// Parse an identifier list.
///
/// Blank lines and lines starting with `#` are ignored, surrounding
/// whitespace is trimmed, and repeated identifiers keep their first position.
pub fn parse_identifiers(text: &str) -> Result<Vec<RegionId>> {
    let mut seen = HashSet::new();
    let mut ids = Vec::new();

    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with(COMMENT_PREFIX) {
            continue;
        }

        let id = RegionId::parse(line)
            .map_err(|e| PipelineError::Input(format!("line {}: {e}", lineno + 1)))?;

        if !seen.insert(id.clone()) {
            warn!("duplicate region identifier {id} on line {}, ignoring", lineno + 1);
            continue;
        }
        ids.push(id);
    }

    Ok(ids)
}

/// Read and parse the identifier list at `path`.
pub async fn read_identifiers(path: &Path) -> Result<Vec<RegionId>> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| PipelineError::Input(format!("cannot read {}: {e}", path.display())))?;
    parse_identifiers(&text)
}
