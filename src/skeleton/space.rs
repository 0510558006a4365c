use std::fmt;
use std::str::FromStr;

use crate::error::OperationError;
use crate::math::{Point3, Transform};

/// Coordinate frame the vertices of a skeleton are expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Space {
    /// Voxel grid coordinates; the transform maps these to physical space.
    #[default]
    Voxel,
    /// Physical coordinates (e.g. nanometers).
    Physical,
    /// A caller-defined frame; transform application is meaningless here.
    Other,
}

impl Space {
    /// Two-bit code used by the binary format flags.
    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            Self::Voxel => 0,
            Self::Physical => 1,
            Self::Other => 2,
        }
    }

    #[must_use]
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Voxel),
            1 => Some(Self::Physical),
            2 => Some(Self::Other),
            _ => None,
        }
    }
}

impl fmt::Display for Space {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Voxel => f.write_str("voxel"),
            Self::Physical => f.write_str("physical"),
            Self::Other => f.write_str("other"),
        }
    }
}

impl FromStr for Space {
    type Err = OperationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "voxel" | "vx" => Ok(Self::Voxel),
            "physical" => Ok(Self::Physical),
            "other" => Ok(Self::Other),
            _ => Err(OperationError::InvalidArgument(format!(
                "unknown coordinate space {s:?}"
            ))),
        }
    }
}

/// Applies an affine 3x4 transform to a point.
#[must_use]
pub fn apply_transform(transform: &Transform, p: &Point3) -> Point3 {
    let v = transform * nalgebra::Vector4::new(p.x, p.y, p.z, 1.0);
    Point3::new(v.x, v.y, v.z)
}

/// Inverse of an affine 3x4 transform: `x = A^-1 (y - t)`.
///
/// # Errors
///
/// Returns [`OperationError::Transform`] if the linear part is singular.
pub fn invert_transform(transform: &Transform) -> Result<Transform, OperationError> {
    let linear = transform.fixed_view::<3, 3>(0, 0).into_owned();
    let translation = transform.column(3).into_owned();
    let inverse = linear.try_inverse().ok_or_else(|| {
        OperationError::Transform("the linear part of the transform is singular".into())
    })?;
    let offset = -(inverse * translation);
    let mut out = Transform::zeros();
    out.fixed_view_mut::<3, 3>(0, 0).copy_from(&inverse);
    out.set_column(3, &offset);
    Ok(out)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn scale_translate() -> Transform {
        Transform::new(
            2.0, 0.0, 0.0, 10.0, //
            0.0, 4.0, 0.0, -5.0, //
            0.0, 0.0, 40.0, 1.0,
        )
    }

    #[test]
    fn transform_scales_then_translates() {
        let p = apply_transform(&scale_translate(), &Point3::new(1.0, 1.0, 1.0));
        assert_relative_eq!(p.x, 12.0);
        assert_relative_eq!(p.y, -1.0);
        assert_relative_eq!(p.z, 41.0);
    }

    #[test]
    fn inverse_undoes_transform() {
        let t = scale_translate();
        let inv = invert_transform(&t).unwrap();
        let p = Point3::new(3.0, -2.0, 0.5);
        let back = apply_transform(&inv, &apply_transform(&t, &p));
        assert_relative_eq!(back.x, p.x, epsilon = 1e-5);
        assert_relative_eq!(back.y, p.y, epsilon = 1e-5);
        assert_relative_eq!(back.z, p.z, epsilon = 1e-5);
    }

    #[test]
    fn singular_transform_is_rejected() {
        let err = invert_transform(&Transform::zeros()).unwrap_err();
        assert!(matches!(err, OperationError::Transform(_)));
    }

    #[test]
    fn space_parses_and_round_trips_codes() {
        assert_eq!("vx".parse::<Space>().unwrap(), Space::Voxel);
        assert!("nowhere".parse::<Space>().is_err());
        for space in [Space::Voxel, Space::Physical, Space::Other] {
            assert_eq!(Space::from_code(space.code()), Some(space));
        }
    }
}
