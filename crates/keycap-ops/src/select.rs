//! Geometric selection predicates over kernel signatures.
//!
//! Selections are plain `(KernelId, TopoSignature)` lists so they work the
//! same against any kernel that implements `KernelIntrospect`.

use geom_kernel::{KernelId, TopoSignature};
use keycap_types::{distance, dot, Axis, Point3};

/// Centroid coordinates closer than this along an axis share a layer.
pub const LAYER_TOLERANCE: f64 = 1e-4;

/// `|cos|` above this counts as parallel.
const PARALLEL_TOLERANCE: f64 = 1e-6;

pub type Selection = Vec<(KernelId, TopoSignature)>;

/// Group entities into layers by centroid coordinate along `axis`, lowest
/// layer first. Within a layer the input order is kept. Entities without a
/// centroid are dropped.
pub fn group_by_axis(entities: Selection, axis: Axis, tolerance: f64) -> Vec<Selection> {
    let mut keyed: Vec<(f64, (KernelId, TopoSignature))> = entities
        .into_iter()
        .filter_map(|(id, sig)| sig.centroid.map(|c| (axis.coord(c), (id, sig))))
        .collect();
    keyed.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut layers: Vec<Selection> = Vec::new();
    let mut floor = f64::NEG_INFINITY;
    for (coord, entity) in keyed {
        match layers.last_mut() {
            Some(layer) if coord - floor <= tolerance => layer.push(entity),
            _ => {
                floor = coord;
                layers.push(vec![entity]);
            }
        }
    }
    layers
}

/// Every layer except the lowest.
pub fn without_bottom_layer(mut layers: Vec<Selection>) -> Vec<Selection> {
    if !layers.is_empty() {
        layers.remove(0);
    }
    layers
}

fn parallel(v: Point3, axis: Axis) -> bool {
    dot(v, axis.unit()).abs() >= 1.0 - PARALLEL_TOLERANCE
}

/// Straight edges running along `axis` and planar faces whose normal is
/// along `axis`.
pub fn filter_parallel(entities: Selection, axis: Axis) -> Selection {
    entities
        .into_iter()
        .filter(|(_, sig)| {
            if sig.is_line() {
                sig.direction.is_some_and(|d| parallel(d, axis))
            } else if sig.is_planar() {
                sig.normal.is_some_and(|n| parallel(n, axis))
            } else {
                false
            }
        })
        .collect()
}

/// Entities ordered by centroid distance from `point`, nearest first.
pub fn sort_by_distance(mut entities: Selection, point: Point3) -> Selection {
    let key = |sig: &TopoSignature| sig.centroid.map_or(f64::INFINITY, |c| distance(c, point));
    entities.sort_by(|a, b| key(&a.1).total_cmp(&key(&b.1)));
    entities
}

/// Flatten layers into ids, keeping first occurrences only.
pub fn merge(layers: &[Selection]) -> Vec<KernelId> {
    let mut out: Vec<KernelId> = Vec::new();
    for (id, _) in layers.iter().flatten() {
        if !out.contains(id) {
            out.push(*id);
        }
    }
    out
}
