use tracing::debug;

use crate::error::{OperationError, Result};
use crate::math::filter::zero_phase_moving_average;
use crate::math::Point3;
use crate::operations::consolidate::{chain_edges, Consolidate};
use crate::operations::decompose::InterjointPaths;
use crate::skeleton::{AttributeData, Skeleton, RADIUS};

/// Smooths every interjoint path with a zero-phase moving average.
///
/// Path endpoints (terminals and branch points) are pinned to their original
/// positions so the topology is unchanged. Attribute rows travel with their
/// vertices.
#[derive(Debug, Clone, Copy)]
pub struct AverageSmoothing {
    window: usize,
    check_boundary: bool,
    shrink_radii: bool,
}

impl AverageSmoothing {
    /// Creates a smoothing operation with the given window width.
    ///
    /// Boundary checking is on and radius shrinking is off by default.
    #[must_use]
    pub fn new(window: usize) -> Self {
        Self {
            window,
            check_boundary: true,
            shrink_radii: false,
        }
    }

    /// Whether to fail when a vertex leaves the ball given by its radius.
    #[must_use]
    pub fn with_check_boundary(mut self, check_boundary: bool) -> Self {
        self.check_boundary = check_boundary;
        self
    }

    /// Whether to reduce each radius by the distance its vertex moved.
    #[must_use]
    pub fn with_shrink_radii(mut self, shrink_radii: bool) -> Self {
        self.shrink_radii = shrink_radii;
        self
    }

    /// Executes the smoothing, returning a new consolidated skeleton.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::BoundaryViolation`] if boundary checking is
    /// on, the skeleton carries radii, and a vertex moves further than its
    /// original radius.
    pub fn execute(&self, skel: &Skeleton) -> Result<Skeleton> {
        if self.window <= 1 {
            return Ok(skel.clone());
        }

        let radius = skel.attribute(RADIUS);
        let mut pieces = Vec::new();
        for path in InterjointPaths::new().indices(skel) {
            let original: Vec<[f64; 3]> = path
                .iter()
                .map(|&i| {
                    let p = skel.vertices()[i];
                    [f64::from(p.x), f64::from(p.y), f64::from(p.z)]
                })
                .collect();
            let mut smoothed = zero_phase_moving_average(&original, self.window);
            let last = original.len() - 1;
            smoothed[0] = original[0];
            smoothed[last] = original[last];

            let displacement: Vec<f64> = original
                .iter()
                .zip(&smoothed)
                .map(|(a, b)| {
                    ((a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2) + (a[2] - b[2]).powi(2)).sqrt()
                })
                .collect();

            if self.check_boundary {
                if let Some(radius) = radius {
                    for (k, &vertex) in path.iter().enumerate() {
                        let Some(r) = radius.data().get_f64(vertex * radius.components()) else {
                            continue;
                        };
                        if displacement[k] > r {
                            return Err(OperationError::BoundaryViolation {
                                vertex,
                                displacement: displacement[k],
                                radius: r,
                            }
                            .into());
                        }
                    }
                }
            }

            #[allow(clippy::cast_possible_truncation)]
            let points: Vec<Point3> = smoothed
                .iter()
                .map(|p| Point3::new(p[0] as f32, p[1] as f32, p[2] as f32))
                .collect();
            let mut piece = skel.select(&path, chain_edges(path.len()));
            piece.set_vertices(points);
            if self.shrink_radii {
                shrink(&mut piece, &displacement);
            }
            pieces.push(piece);
        }

        if pieces.is_empty() {
            return Ok(skel.empty_like());
        }

        let merged = Skeleton::simple_merge(&pieces)?;
        let mut out = Consolidate::new().execute(&merged);
        out.set_id(skel.id());
        debug!(
            window = self.window,
            paths = pieces.len(),
            vertices = out.vertex_count(),
            "smoothed skeleton"
        );
        Ok(out)
    }
}

#[allow(clippy::cast_possible_truncation)]
fn shrink(piece: &mut Skeleton, displacement: &[f64]) {
    let Some(radius) = piece.attribute_mut(RADIUS) else {
        return;
    };
    let components = radius.components();
    match radius.data_mut() {
        AttributeData::F32(values) => {
            for (k, d) in displacement.iter().enumerate() {
                values[k * components] -= *d as f32;
            }
        }
        AttributeData::F64(values) => {
            for (k, d) in displacement.iter().enumerate() {
                values[k * components] -= d;
            }
        }
        _ => {}
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::SkeletalError;

    fn zigzag() -> Skeleton {
        Skeleton::from_path(&[
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(3.0, 1.0, 0.0),
            Point3::new(4.0, 0.0, 0.0),
        ])
    }

    #[test]
    fn unit_window_is_identity() {
        let skel = zigzag();
        let out = AverageSmoothing::new(1).execute(&skel).unwrap();
        assert_eq!(out.vertices(), skel.vertices());
        assert_eq!(out.edges(), skel.edges());
    }

    #[test]
    fn endpoints_stay_and_interior_moves() {
        let skel = zigzag().with_radii(vec![10.0; 5]).unwrap();
        let out = AverageSmoothing::new(3).execute(&skel).unwrap();
        assert_eq!(out.vertex_count(), 5);
        assert_eq!(out.edge_count(), 4);
        assert_eq!(out.id(), skel.id());
        assert!(out.vertices().contains(&Point3::new(0.0, 0.0, 0.0)));
        assert!(out.vertices().contains(&Point3::new(4.0, 0.0, 0.0)));
        assert!(out
            .vertices()
            .iter()
            .any(|p| p.y.abs() > 1e-6 && (p.y - 1.0).abs() > 1e-6));
        assert_eq!(out.terminals().len(), 2);
    }

    #[test]
    fn leaving_the_radius_is_an_error() {
        let skel = zigzag().with_radii(vec![1e-3; 5]).unwrap();
        let err = AverageSmoothing::new(3).execute(&skel).unwrap_err();
        assert!(matches!(
            err,
            SkeletalError::Operation(OperationError::BoundaryViolation { .. })
        ));

        let unchecked = AverageSmoothing::new(3)
            .with_check_boundary(false)
            .execute(&skel);
        assert!(unchecked.is_ok());
    }

    #[test]
    fn shrinking_reduces_moved_radii() {
        let skel = zigzag().with_radii(vec![10.0; 5]).unwrap();
        let out = AverageSmoothing::new(3)
            .with_shrink_radii(true)
            .execute(&skel)
            .unwrap();
        let radii = out.radii().unwrap();
        assert!(radii.iter().all(|&r| r <= 10.0));
        assert!(radii.iter().any(|&r| r < 10.0));
    }

    #[test]
    fn edgeless_skeleton_smooths_to_empty() {
        let skel = Skeleton::new(vec![Point3::origin()], vec![]).unwrap();
        let out = AverageSmoothing::new(5).execute(&skel).unwrap();
        assert!(out.is_empty());
        assert_eq!(out.id(), skel.id());
    }
}
