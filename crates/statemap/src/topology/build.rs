//! Shared-arc construction: junction detection, cutting, and deduplication.
//!
//! A position is a junction when two visits to it disagree about its
//! neighbours. Cutting every ring at its junctions yields arcs whose interior
//! points are visited identically by every ring that uses them, so equal arcs
//! (in either direction) collapse to one.

use crate::record::{BoundaryRecord, Geometry, Position, Ring};
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

/// Bit-exact hashable form of a position. `-0.0` folds onto `0.0`.
pub(crate) type PointKey = (u64, u64);

pub(crate) fn point_key(p: &Position) -> PointKey {
    ((p[0] + 0.0).to_bits(), (p[1] + 0.0).to_bits())
}

/// Arc reference: `i` for arc `i`, `!i` (one's complement) for arc `i` reversed.
pub type ArcRef = i64;

/// Arc references of one region, shaped like its geometry.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ShapeRefs {
    Polygon(Vec<Vec<ArcRef>>),
    MultiPolygon(Vec<Vec<Vec<ArcRef>>>),
}

/// Output of the sharing stage: unique arcs plus per-record references.
#[derive(Debug, Clone)]
pub(crate) struct SharedArcs {
    pub arcs: Vec<Vec<Position>>,
    pub shapes: Vec<ShapeRefs>,
}

/// Distinct positions of a ring: closing point and consecutive repeats removed.
fn distinct_ring(ring: &Ring) -> Vec<Position> {
    let mut out: Vec<Position> = Vec::with_capacity(ring.len());
    for p in ring {
        if out.last().map(point_key) != Some(point_key(p)) {
            out.push(*p);
        }
    }
    while out.len() > 1 && point_key(&out[0]) == point_key(&out[out.len() - 1]) {
        out.pop();
    }
    out
}

#[derive(Default)]
struct Junctions {
    first_visit: HashMap<PointKey, (PointKey, PointKey)>,
    junctions: HashSet<PointKey>,
}

impl Junctions {
    fn visit_ring(&mut self, ring: &[Position]) {
        let n = ring.len();
        for i in 0..n {
            let here = point_key(&ring[i]);
            let prev = point_key(&ring[(i + n - 1) % n]);
            let next = point_key(&ring[(i + 1) % n]);

            match self.first_visit.entry(here) {
                Entry::Vacant(slot) => {
                    slot.insert((prev, next));
                }
                Entry::Occupied(seen) => {
                    let (a, b) = *seen.get();
                    let same = (a == prev && b == next) || (a == next && b == prev);
                    if !same {
                        self.junctions.insert(here);
                    }
                }
            }
        }
    }

    fn contains(&self, p: &Position) -> bool {
        self.junctions.contains(&point_key(p))
    }
}

#[derive(Default)]
struct ArcIndex {
    arcs: Vec<Vec<Position>>,
    by_points: HashMap<Vec<PointKey>, usize>,
}

impl ArcIndex {
    /// Intern an arc, returning a reference to an existing equal arc
    /// (forward or reversed) when there is one.
    fn intern(&mut self, arc: Vec<Position>) -> ArcRef {
        let forward: Vec<PointKey> = arc.iter().map(point_key).collect();
        if let Some(&i) = self.by_points.get(&forward) {
            return i as ArcRef;
        }
        let reversed: Vec<PointKey> = forward.iter().rev().copied().collect();
        if let Some(&i) = self.by_points.get(&reversed) {
            return !(i as ArcRef);
        }

        let i = self.arcs.len();
        self.by_points.insert(forward, i);
        self.arcs.push(arc);
        i as ArcRef
    }
}

/// Cut one ring into arcs and intern them.
fn cut_ring(ring: &[Position], junctions: &Junctions, index: &mut ArcIndex) -> Vec<ArcRef> {
    let n = ring.len();
    let cuts: Vec<usize> = (0..n).filter(|&i| junctions.contains(&ring[i])).collect();

    let Some(&start) = cuts.first() else {
        // No junction: the whole ring is one closed arc. Start it at its
        // smallest position so rotated copies of the same ring intern equal.
        let start = (0..n)
            .min_by(|&a, &b| {
                ring[a][0]
                    .total_cmp(&ring[b][0])
                    .then(ring[a][1].total_cmp(&ring[b][1]))
            })
            .unwrap_or(0);
        let mut closed: Vec<Position> = ring[start..].iter().chain(&ring[..start]).copied().collect();
        if let Some(&first) = closed.first() {
            closed.push(first);
        }
        return vec![index.intern(closed)];
    };

    let rotated: Vec<Position> = ring[start..]
        .iter()
        .chain(&ring[..start])
        .chain(std::iter::once(&ring[start]))
        .copied()
        .collect();

    let mut refs = Vec::with_capacity(cuts.len());
    let mut from = 0;
    for i in 1..rotated.len() {
        if junctions.contains(&rotated[i]) {
            refs.push(index.intern(rotated[from..=i].to_vec()));
            from = i;
        }
    }
    refs
}

/// Build shared arcs for all records jointly.
pub(crate) fn share_arcs(records: &[BoundaryRecord]) -> SharedArcs {
    let distinct: Vec<Vec<Vec<Vec<Position>>>> = records
        .iter()
        .map(|r| {
            r.geometry
                .polygons()
                .map(|rings| rings.iter().map(distinct_ring).collect())
                .collect()
        })
        .collect();

    let mut junctions = Junctions::default();
    for ring in distinct.iter().flatten().flatten() {
        junctions.visit_ring(ring);
    }

    let mut index = ArcIndex::default();
    let shapes = records
        .iter()
        .zip(&distinct)
        .map(|(record, polygons)| {
            let mut refs: Vec<Vec<Vec<ArcRef>>> = polygons
                .iter()
                .map(|rings| {
                    rings
                        .iter()
                        .map(|ring| cut_ring(ring, &junctions, &mut index))
                        .collect()
                })
                .collect();
            match record.geometry {
                Geometry::Polygon(_) => ShapeRefs::Polygon(refs.pop().unwrap_or_default()),
                Geometry::MultiPolygon(_) => ShapeRefs::MultiPolygon(refs),
            }
        })
        .collect();

    SharedArcs {
        arcs: index.arcs,
        shapes,
    }
}
