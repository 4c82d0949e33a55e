//! Visvalingam presimplification and threshold filtering.

use crate::record::Position;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

fn triangle_area(a: &Position, b: &Position, c: &Position) -> f64 {
    ((b[0] - a[0]) * (c[1] - a[1]) - (c[0] - a[0]) * (b[1] - a[1])).abs() / 2.0
}

/// Heap entry ordered so the smallest area pops first; ties pop the lower index.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    area: f64,
    index: usize,
    version: u32,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .area
            .total_cmp(&self.area)
            .then(other.index.cmp(&self.index))
            .then(other.version.cmp(&self.version))
    }
}

/// Effective area of every point of an arc.
///
/// Points are removed smallest-triangle first; a neighbour's recomputed area
/// never drops below the area of the point just removed, so weights are
/// monotonic in removal order. Endpoints are weighted `+∞`.
pub fn effective_areas(points: &[Position]) -> Vec<f64> {
    let n = points.len();
    let mut weights = vec![f64::INFINITY; n];
    if n < 3 {
        return weights;
    }

    let mut prev: Vec<usize> = (0..n).map(|i| i.saturating_sub(1)).collect();
    let mut next: Vec<usize> = (0..n).map(|i| (i + 1).min(n - 1)).collect();
    let mut version = vec![0u32; n];
    let mut heap = BinaryHeap::with_capacity(n);

    for i in 1..n - 1 {
        heap.push(Candidate {
            area: triangle_area(&points[i - 1], &points[i], &points[i + 1]),
            index: i,
            version: 0,
        });
    }

    while let Some(c) = heap.pop() {
        if c.version != version[c.index] || weights[c.index].is_finite() {
            continue;
        }
        let i = c.index;
        weights[i] = c.area;

        let (p, q) = (prev[i], next[i]);
        next[p] = q;
        prev[q] = p;

        for j in [p, q] {
            if j == 0 || j == n - 1 {
                continue;
            }
            version[j] += 1;
            let area = triangle_area(&points[prev[j]], &points[j], &points[next[j]]).max(c.area);
            heap.push(Candidate {
                area,
                index: j,
                version: version[j],
            });
        }
    }

    weights
}

/// Keep the points of an arc whose weight reaches `min_weight`.
///
/// A closed arc (first point equals last) always keeps its two most
/// significant interior points so it still describes a ring.
pub fn filter_arc(points: &[Position], weights: &[f64], min_weight: f64) -> Vec<Position> {
    let n = points.len();
    let mut keep: Vec<bool> = weights.iter().map(|&w| w >= min_weight).collect();

    let closed = n >= 4 && points[0] == points[n - 1];
    if closed {
        let kept_interior = keep[1..n - 1].iter().filter(|&&k| k).count();
        if kept_interior < 2 {
            let mut interior: Vec<usize> = (1..n - 1).collect();
            interior.sort_by(|&a, &b| weights[b].total_cmp(&weights[a]).then(a.cmp(&b)));
            for &i in interior.iter().take(2) {
                keep[i] = true;
            }
        }
    }

    points
        .iter()
        .zip(keep)
        .filter_map(|(p, k)| k.then_some(*p))
        .collect()
}
