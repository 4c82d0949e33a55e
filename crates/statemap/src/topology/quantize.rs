//! Grid quantization and delta encoding of arcs.

use crate::record::Position;
use serde::{Deserialize, Serialize};

/// Maps quantized integer coordinates back to longitude/latitude.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub scale: [f64; 2],
    pub translate: [f64; 2],
}

/// Bounding box `[min_x, min_y, max_x, max_y]` over all arc positions.
pub fn bbox(arcs: &[Vec<Position>]) -> [f64; 4] {
    let mut b = [
        f64::INFINITY,
        f64::INFINITY,
        f64::NEG_INFINITY,
        f64::NEG_INFINITY,
    ];
    for p in arcs.iter().flatten() {
        b[0] = b[0].min(p[0]);
        b[1] = b[1].min(p[1]);
        b[2] = b[2].max(p[0]);
        b[3] = b[3].max(p[1]);
    }
    if b[0] > b[2] {
        return [0.0; 4];
    }
    b
}

/// Transform placing `bbox` on a grid of `cells` positions per axis.
pub fn transform_for(bbox: [f64; 4], cells: u32) -> Transform {
    let steps = f64::from(cells.max(2) - 1);
    let kx = if bbox[2] > bbox[0] {
        (bbox[2] - bbox[0]) / steps
    } else {
        1.0
    };
    let ky = if bbox[3] > bbox[1] {
        (bbox[3] - bbox[1]) / steps
    } else {
        1.0
    };
    Transform {
        scale: [kx, ky],
        translate: [bbox[0], bbox[1]],
    }
}

/// Quantize and delta-encode arcs.
///
/// The first point of each arc is absolute, the rest are offsets from the
/// previous kept point. Points that land on the same cell as their
/// predecessor are dropped, but every arc keeps at least two points.
pub fn quantize_arcs(arcs: &[Vec<Position>], t: &Transform) -> Vec<Vec<[i64; 2]>> {
    arcs.iter()
        .map(|arc| {
            let mut out: Vec<[i64; 2]> = Vec::with_capacity(arc.len());
            let mut last: Option<[i64; 2]> = None;
            for p in arc {
                let q = [
                    ((p[0] - t.translate[0]) / t.scale[0]).round() as i64,
                    ((p[1] - t.translate[1]) / t.scale[1]).round() as i64,
                ];
                match last {
                    None => out.push(q),
                    Some(prev) if prev != q => out.push([q[0] - prev[0], q[1] - prev[1]]),
                    Some(_) => continue,
                }
                last = Some(q);
            }
            if out.len() == 1 {
                out.push([0, 0]);
            }
            out
        })
        .collect()
}
