//! Parse raw boundary payloads into [`BoundaryRecord`]s.

use crate::error::{PipelineError, Result};
use crate::ids::RegionId;
use crate::record::{BoundaryRecord, FeatureId, Geometry, Position, Ring};
use serde_json::Value;

/// Extract `type`, `id` and `geometry` from a GeoJSON payload, dropping
/// everything else.
///
/// The upstream `id` wins when present; otherwise the requested identifier is
/// used. Only `Polygon` and `MultiPolygon` geometries are accepted.
pub fn normalize(requested: &RegionId, raw: &str) -> Result<BoundaryRecord> {
    let id = requested.as_str();
    let value: Value =
        serde_json::from_str(raw).map_err(|e| PipelineError::malformed(id, format!("invalid JSON: {e}")))?;

    let obj = value
        .as_object()
        .ok_or_else(|| PipelineError::malformed(id, "payload is not a JSON object"))?;

    let kind = obj
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| PipelineError::malformed(id, "missing 'type'"))?
        .to_string();

    let feature_id = match obj.get("id") {
        Some(Value::Number(n)) => FeatureId::Number(n.clone()),
        Some(Value::String(s)) => FeatureId::Text(s.clone()),
        None | Some(Value::Null) => FeatureId::Text(id.to_string()),
        Some(_) => return Err(PipelineError::malformed(id, "'id' must be a string or number")),
    };

    let geometry = obj
        .get("geometry")
        .filter(|g| !g.is_null())
        .ok_or_else(|| PipelineError::malformed(id, "missing 'geometry'"))?;

    Ok(BoundaryRecord {
        kind,
        id: feature_id,
        geometry: parse_geometry(id, geometry)?,
    })
}

fn parse_geometry(id: &str, geometry: &Value) -> Result<Geometry> {
    let gtype = geometry
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| PipelineError::malformed(id, "geometry has no 'type'"))?;
    let coords = geometry
        .get("coordinates")
        .ok_or_else(|| PipelineError::malformed(id, "geometry has no 'coordinates'"))?;

    match gtype {
        "Polygon" => Ok(Geometry::Polygon(parse_polygon(id, coords)?)),
        "MultiPolygon" => {
            let polys = as_array(id, coords, "multipolygon")?
                .iter()
                .map(|p| parse_polygon(id, p))
                .collect::<Result<Vec<_>>>()?;
            if polys.is_empty() {
                return Err(PipelineError::malformed(id, "multipolygon has no polygons"));
            }
            Ok(Geometry::MultiPolygon(polys))
        }
        other => Err(PipelineError::malformed(
            id,
            format!("unsupported geometry type '{other}'"),
        )),
    }
}

fn parse_polygon(id: &str, value: &Value) -> Result<Vec<Ring>> {
    let rings = as_array(id, value, "polygon")?
        .iter()
        .map(|r| parse_ring(id, r))
        .collect::<Result<Vec<_>>>()?;
    if rings.is_empty() {
        return Err(PipelineError::malformed(id, "polygon has no rings"));
    }
    Ok(rings)
}

fn parse_ring(id: &str, value: &Value) -> Result<Ring> {
    let ring = as_array(id, value, "ring")?
        .iter()
        .map(|p| parse_position(id, p))
        .collect::<Result<Ring>>()?;
    if ring.len() < 4 {
        return Err(PipelineError::malformed(
            id,
            format!("ring has {} positions, need at least 4", ring.len()),
        ));
    }
    Ok(ring)
}

fn parse_position(id: &str, value: &Value) -> Result<Position> {
    let parts = as_array(id, value, "position")?;
    match (
        parts.first().and_then(Value::as_f64),
        parts.get(1).and_then(Value::as_f64),
    ) {
        (Some(x), Some(y)) => Ok([x, y]),
        _ => Err(PipelineError::malformed(id, "position is not a numeric pair")),
    }
}

fn as_array<'a>(id: &str, value: &'a Value, what: &str) -> Result<&'a Vec<Value>> {
    value
        .as_array()
        .ok_or_else(|| PipelineError::malformed(id, format!("{what} is not an array")))
}
