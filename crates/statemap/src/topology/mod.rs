//! Topology composition: shared arcs, presimplification, simplification and
//! quantization, producing a TopoJSON document.
//!
//! Sharing runs before simplification so that an edge common to two regions
//! is simplified once and both regions keep identical boundaries.
//! Quantization runs last for the same reason.

pub mod build;
pub mod quantize;
pub mod simplify;

pub use build::ArcRef;
pub use quantize::Transform;

use crate::error::{PipelineError, Result};
use crate::record::{BoundaryRecord, FeatureId};
use crate::tier::FidelityTier;
use build::ShapeRefs;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Default name of the geometry collection in the output.
pub const DEFAULT_OBJECT_NAME: &str = "states";

/// Arc references of a geometry, nested like its coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArcRefs {
    Polygon(Vec<Vec<ArcRef>>),
    MultiPolygon(Vec<Vec<Vec<ArcRef>>>),
}

/// One region in the output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopoGeometry {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: FeatureId,
    pub arcs: ArcRefs,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometryCollection {
    #[serde(rename = "type")]
    pub kind: String,
    pub geometries: Vec<TopoGeometry>,
}

/// Quantized TopoJSON topology.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topology {
    #[serde(rename = "type")]
    pub kind: String,
    pub bbox: [f64; 4],
    pub transform: Transform,
    pub objects: BTreeMap<String, GeometryCollection>,
    pub arcs: Vec<Vec<[i64; 2]>>,
}

impl Topology {
    /// Total number of region geometries across all objects.
    pub fn geometry_count(&self) -> usize {
        self.objects.values().map(|o| o.geometries.len()).sum()
    }
}

/// Merge `records` into one simplified, quantized topology.
///
/// Requires the complete record set; an empty set is [`PipelineError::EmptyInput`].
pub fn compose(
    records: &[BoundaryRecord],
    tier: FidelityTier,
    object_name: &str,
) -> Result<Topology> {
    if records.is_empty() {
        return Err(PipelineError::EmptyInput);
    }
    let params = tier.params();

    let shared = build::share_arcs(records);
    debug!(
        "{} records share {} arcs",
        records.len(),
        shared.arcs.len()
    );

    let weights: Vec<Vec<f64>> = shared
        .arcs
        .iter()
        .map(|arc| simplify::effective_areas(arc))
        .collect();

    let simplified: Vec<_> = shared
        .arcs
        .iter()
        .zip(&weights)
        .map(|(arc, w)| simplify::filter_arc(arc, w, params.min_weight))
        .collect();

    let before: usize = shared.arcs.iter().map(Vec::len).sum();
    let after: usize = simplified.iter().map(Vec::len).sum();
    debug!("tier {tier}: kept {after} of {before} points");

    let bbox = quantize::bbox(&shared.arcs);
    let transform = quantize::transform_for(bbox, params.quantization);
    let arcs = quantize::quantize_arcs(&simplified, &transform);

    let geometries = records
        .iter()
        .zip(shared.shapes)
        .map(|(record, shape)| TopoGeometry {
            kind: record.geometry.type_name().to_string(),
            id: record.id.clone(),
            arcs: match shape {
                ShapeRefs::Polygon(r) => ArcRefs::Polygon(r),
                ShapeRefs::MultiPolygon(r) => ArcRefs::MultiPolygon(r),
            },
        })
        .collect();

    let mut objects = BTreeMap::new();
    objects.insert(
        object_name.to_string(),
        GeometryCollection {
            kind: "GeometryCollection".to_string(),
            geometries,
        },
    );

    Ok(Topology {
        kind: "Topology".to_string(),
        bbox,
        transform,
        objects,
        arcs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Geometry;
    use std::collections::HashSet;

    fn square(id: &str, x0: f64, y0: f64, size: f64) -> BoundaryRecord {
        BoundaryRecord {
            kind: "Feature".to_string(),
            id: FeatureId::Text(id.to_string()),
            geometry: Geometry::Polygon(vec![vec![
                [x0, y0],
                [x0 + size, y0],
                [x0 + size, y0 + size],
                [x0, y0 + size],
                [x0, y0],
            ]]),
        }
    }

    /// Two regions sharing a wiggly border with many small-area vertices.
    fn wiggly_neighbours() -> Vec<BoundaryRecord> {
        let border: Vec<[f64; 2]> = (0..=20)
            .map(|i| {
                let y = i as f64 * 0.05;
                let x = 1.0 + if i % 2 == 0 { 0.0 } else { 0.000_04 };
                [x, y]
            })
            .collect();

        let mut west = vec![[0.0, 0.0]];
        west.extend(border.iter().copied());
        west.push([0.0, 1.0]);
        west.push([0.0, 0.0]);

        let mut east: Vec<[f64; 2]> = border.iter().rev().copied().collect();
        east.push([2.0, 0.0]);
        east.insert(0, [2.0, 1.0]);
        east.push([2.0, 1.0]);

        vec![
            BoundaryRecord {
                kind: "Feature".to_string(),
                id: FeatureId::Text("W".to_string()),
                geometry: Geometry::Polygon(vec![west]),
            },
            BoundaryRecord {
                kind: "Feature".to_string(),
                id: FeatureId::Text("E".to_string()),
                geometry: Geometry::Polygon(vec![east]),
            },
        ]
    }

    fn arc_indices(g: &TopoGeometry) -> HashSet<ArcRef> {
        let refs: Vec<ArcRef> = match &g.arcs {
            ArcRefs::Polygon(rings) => rings.iter().flatten().copied().collect(),
            ArcRefs::MultiPolygon(polys) => polys.iter().flatten().flatten().copied().collect(),
        };
        refs.into_iter().map(|r| if r < 0 { !r } else { r }).collect()
    }

    #[test]
    fn test_empty_input_rejected() {
        assert!(matches!(
            compose(&[], FidelityTier::Medium, DEFAULT_OBJECT_NAME),
            Err(PipelineError::EmptyInput)
        ));
    }

    #[test]
    fn test_single_region_is_valid() {
        let topo = compose(&[square("R1", 0.0, 0.0, 1.0)], FidelityTier::Fine, "states").unwrap();
        assert_eq!(topo.geometry_count(), 1);
        assert_eq!(topo.arcs.len(), 1);
        assert_eq!(topo.bbox, [0.0, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn test_shared_edge_single_arc_every_tier() {
        for tier in FidelityTier::ALL {
            let records = wiggly_neighbours();
            let topo = compose(&records, tier, DEFAULT_OBJECT_NAME).unwrap();
            let geoms = &topo.objects[DEFAULT_OBJECT_NAME].geometries;

            let common: Vec<_> = arc_indices(&geoms[0])
                .intersection(&arc_indices(&geoms[1]))
                .copied()
                .collect();
            assert_eq!(common.len(), 1, "tier {tier}");
            assert_eq!(topo.arcs.len(), 3, "tier {tier}");
        }
    }

    #[test]
    fn test_coarse_tier_simplifies_border() {
        let records = wiggly_neighbours();
        let fine = compose(&records, FidelityTier::Fine, DEFAULT_OBJECT_NAME).unwrap();
        let coarse = compose(&records, FidelityTier::Coarse, DEFAULT_OBJECT_NAME).unwrap();
        let points = |t: &Topology| t.arcs.iter().map(Vec::len).sum::<usize>();
        assert!(points(&coarse) < points(&fine));
    }

    #[test]
    fn test_bbox_covers_points_removed_by_simplification() {
        let spiked = BoundaryRecord {
            kind: "Feature".to_string(),
            id: FeatureId::Text("S".to_string()),
            geometry: Geometry::Polygon(vec![vec![
                [0.0, 0.0],
                [0.5, -0.000_01],
                [1.0, 0.0],
                [1.0, 1.0],
                [0.0, 1.0],
                [0.0, 0.0],
            ]]),
        };
        let fine = compose(std::slice::from_ref(&spiked), FidelityTier::Fine, "s").unwrap();
        let coarse = compose(std::slice::from_ref(&spiked), FidelityTier::Coarse, "s").unwrap();

        assert_eq!(fine.arcs[0].len(), 6);
        assert_eq!(coarse.arcs[0].len(), 5);
        assert_eq!(coarse.bbox, [0.0, -0.000_01, 1.0, 1.0]);
        assert_eq!(coarse.bbox, fine.bbox);
    }

    #[test]
    fn test_compose_is_deterministic() {
        let records = wiggly_neighbours();
        let a = serde_json::to_string(&compose(&records, FidelityTier::Medium, "s").unwrap()).unwrap();
        let b = serde_json::to_string(&compose(&records, FidelityTier::Medium, "s").unwrap()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_serialized_shape() {
        let topo = compose(&[square("R1", 0.0, 0.0, 1.0)], FidelityTier::Medium, "states").unwrap();
        let v = serde_json::to_value(&topo).unwrap();
        assert_eq!(v["type"], "Topology");
        assert_eq!(v["objects"]["states"]["type"], "GeometryCollection");
        assert_eq!(v["objects"]["states"]["geometries"][0]["type"], "Polygon");
        assert_eq!(v["objects"]["states"]["geometries"][0]["id"], "R1");
        assert_eq!(v["objects"]["states"]["geometries"][0]["arcs"], serde_json::json!([[0]]));
        assert!(v["transform"]["scale"].is_array());
    }
}
