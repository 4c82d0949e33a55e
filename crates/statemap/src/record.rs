//! Canonical boundary record passed from the normalizer to the composer.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A `[longitude, latitude]` position.
pub type Position = [f64; 2];

/// A closed linear ring.
pub type Ring = Vec<Position>;

/// Feature identifier as assigned upstream: Who's On First uses integers,
/// other sources use strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureId {
    Number(serde_json::Number),
    Text(String),
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Polygonal geometry. Other GeoJSON geometry types are rejected upstream of here.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Polygon(Vec<Ring>),
    MultiPolygon(Vec<Vec<Ring>>),
}

impl Geometry {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Polygon(_) => "Polygon",
            Self::MultiPolygon(_) => "MultiPolygon",
        }
    }

    /// Iterate over every polygon (a list of rings).
    pub fn polygons(&self) -> impl Iterator<Item = &[Ring]> {
        let polys: Vec<&[Ring]> = match self {
            Self::Polygon(rings) => vec![rings.as_slice()],
            Self::MultiPolygon(polys) => polys.iter().map(Vec::as_slice).collect(),
        };
        polys.into_iter()
    }
}

/// Minimal `{ type, id, geometry }` record with upstream metadata stripped.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryRecord {
    /// Top-level payload type (`Feature` for GeoJSON features).
    pub kind: String,
    pub id: FeatureId,
    pub geometry: Geometry,
}
