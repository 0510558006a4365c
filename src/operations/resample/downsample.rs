use tracing::debug;

use crate::error::{OperationError, Result};
use crate::operations::consolidate::{chain_edges, Consolidate};
use crate::operations::decompose::InterjointPaths;
use crate::skeleton::Skeleton;

/// Keeps every `factor`-th vertex along each interjoint path.
///
/// Path endpoints are always kept, so terminals and branch points survive
/// and the topology is preserved. Attribute rows of kept vertices are copied
/// unchanged.
#[derive(Debug, Clone, Copy)]
pub struct Downsample {
    factor: usize,
}

impl Downsample {
    /// Creates a new `Downsample` operation.
    #[must_use]
    pub fn new(factor: usize) -> Self {
        Self { factor }
    }

    /// Executes the downsampling, returning a new consolidated skeleton.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::InvalidArgument`] if the factor is zero.
    pub fn execute(&self, skel: &Skeleton) -> Result<Skeleton> {
        if self.factor == 0 {
            return Err(OperationError::InvalidArgument(
                "downsample factor must be at least 1".into(),
            )
            .into());
        }
        if self.factor == 1 {
            return Ok(skel.clone());
        }

        let pieces: Vec<Skeleton> = InterjointPaths::new()
            .indices(skel)
            .into_iter()
            .map(|path| {
                let mut kept: Vec<usize> = path.iter().step_by(self.factor).copied().collect();
                if kept.last() != path.last() {
                    kept.extend(path.last());
                }
                skel.select(&kept, chain_edges(kept.len()))
            })
            .collect();

        if pieces.is_empty() {
            return Ok(skel.empty_like());
        }

        let merged = Skeleton::simple_merge(&pieces)?;
        let mut out = Consolidate::new().execute(&merged);
        out.set_id(skel.id());
        debug!(
            factor = self.factor,
            vertices_in = skel.vertex_count(),
            vertices_out = out.vertex_count(),
            "downsampled skeleton"
        );
        Ok(out)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::SkeletalError;
    use crate::math::Point3;

    #[allow(clippy::cast_precision_loss)]
    fn chain(n: usize) -> Skeleton {
        let points: Vec<Point3> = (0..n).map(|i| Point3::new(i as f32, 0.0, 0.0)).collect();
        Skeleton::from_path(&points)
    }

    #[test]
    fn zero_factor_is_rejected() {
        let err = Downsample::new(0).execute(&chain(3)).unwrap_err();
        assert!(matches!(
            err,
            SkeletalError::Operation(OperationError::InvalidArgument(_))
        ));
    }

    #[test]
    fn unit_factor_is_identity() {
        let skel = chain(4);
        let out = Downsample::new(1).execute(&skel).unwrap();
        assert_eq!(out.vertices(), skel.vertices());
    }

    #[test]
    fn keeps_stride_and_last_vertex() {
        let skel = chain(6)
            .with_radii(vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0])
            .unwrap();
        let out = Downsample::new(2).execute(&skel).unwrap();
        let xs: Vec<f32> = out.vertices().iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![0.0, 2.0, 4.0, 5.0]);
        assert_eq!(out.radii().unwrap(), &[0.0, 2.0, 4.0, 5.0]);
        assert_eq!(out.edge_count(), 3);
    }

    #[test]
    fn branch_points_survive() {
        // arms of length 4 meeting at the origin
        let mut points = vec![Point3::origin()];
        let mut edges = Vec::new();
        for axis in 0..3 {
            let mut previous = 0;
            for step in 1..=4_u8 {
                let mut p = Point3::origin();
                p[axis] = f32::from(step);
                points.push(p);
                edges.push([previous, points.len() - 1]);
                previous = points.len() - 1;
            }
        }
        let skel = Skeleton::new(points, edges).unwrap();
        let out = Downsample::new(3).execute(&skel).unwrap();
        assert_eq!(out.branches().len(), 1);
        assert_eq!(out.terminals().len(), 3);
        assert_eq!(out.vertex_count(), 7);
    }
}
