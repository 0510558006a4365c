use rustc_hash::FxHashMap;
use tracing::trace;

use crate::math::{cmp_points, point_key, Point3, TOLERANCE};
use crate::skeleton::Skeleton;

use super::isomorphism::isomorphic;

/// Tests whether two skeletons describe the same object.
///
/// Two skeletons are equivalent when they hold the same multiset of vertex
/// coordinates (within tolerance), their edge graphs are isomorphic, and every
/// attribute of the first is present on the second with identical rows at
/// coinciding coordinates. Vertex numbering and edge order are irrelevant.
///
/// The attribute check is one-sided: extra attributes on the second skeleton
/// are ignored. `-0.0` and `0.0` are the same coordinate.
///
/// Coordinates are matched by sorting both sides and comparing in order, so
/// points that lie within tolerance of each other but sort differently (for
/// example `(0, 0, 0), (5e-8, -1, 0)` against `(5e-8, 0, 0), (0, -1, 0)`)
/// are reported as different.
#[derive(Debug, Clone, Copy)]
pub struct Equivalent {
    tolerance: f64,
}

impl Default for Equivalent {
    fn default() -> Self {
        Self {
            tolerance: TOLERANCE,
        }
    }
}

impl Equivalent {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Absolute tolerance for coordinate comparison.
    #[must_use]
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    #[must_use]
    pub fn execute(&self, first: &Skeleton, second: &Skeleton) -> bool {
        if first.is_empty() && second.is_empty() {
            return true;
        }
        if first.vertex_count() != second.vertex_count() || first.edge_count() != second.edge_count() {
            trace!("vertex or edge counts differ");
            return false;
        }
        if !self.same_vertices(first.vertices(), second.vertices()) {
            trace!("vertex coordinates differ");
            return false;
        }
        if !isomorphic(first.vertex_count(), first.edges(), second.edges()) {
            trace!("edge graphs are not isomorphic");
            return false;
        }
        same_attributes(first, second)
    }

    fn same_vertices(&self, first: &[Point3], second: &[Point3]) -> bool {
        let mut a = first.to_vec();
        let mut b = second.to_vec();
        a.sort_by(cmp_points);
        b.sort_by(cmp_points);
        a.iter().zip(&b).all(|(p, q)| {
            (0..3).all(|axis| (f64::from(p[axis]) - f64::from(q[axis])).abs() <= self.tolerance)
        })
    }
}

fn same_attributes(first: &Skeleton, second: &Skeleton) -> bool {
    if first.attributes().is_empty() {
        return true;
    }

    let mut lookup: FxHashMap<[u32; 3], usize> = FxHashMap::default();
    for (j, p) in second.vertices().iter().enumerate() {
        lookup.insert(point_key(p), j);
    }

    for attribute in first.attributes().iter() {
        let Some(other) = second.attribute(attribute.name()) else {
            trace!(attribute = attribute.name(), "attribute missing");
            return false;
        };
        if other.spec() != attribute.spec() {
            trace!(attribute = attribute.name(), "attribute type differs");
            return false;
        }
        for (i, p) in first.vertices().iter().enumerate() {
            let Some(&j) = lookup.get(&point_key(p)) else {
                return false;
            };
            if !attribute.row_eq(i, other, j) {
                trace!(attribute = attribute.name(), vertex = i, "attribute rows differ");
                return false;
            }
        }
    }
    true
}
