pub mod aabb;
pub mod filter;

pub use aabb::Aabb;

/// 3D point type used for skeleton vertices.
pub type Point3 = nalgebra::Point3<f32>;

/// 3x4 affine matrix mapping voxel coordinates to physical coordinates.
pub type Transform = nalgebra::Matrix3x4<f32>;

/// Absolute tolerance for comparing vertex coordinates of two skeletons.
pub const TOLERANCE: f64 = 1e-7;

/// Returns the 3x4 identity transform.
#[must_use]
pub fn identity_transform() -> Transform {
    Transform::identity()
}

/// Euclidean distance between two points, computed in double precision.
#[must_use]
pub fn distance(a: &Point3, b: &Point3) -> f64 {
    let dx = f64::from(a.x) - f64::from(b.x);
    let dy = f64::from(a.y) - f64::from(b.y);
    let dz = f64::from(a.z) - f64::from(b.z);
    (dx * dx + dy * dy + dz * dz).sqrt()
}

/// Folds `-0.0` into `0.0`; every other value is returned unchanged.
fn unsigned_zero(v: f32) -> f32 {
    v + 0.0
}

/// Lexicographic (x, y, z) ordering under the IEEE total order, except that
/// `-0.0` and `0.0` compare equal.
#[must_use]
pub fn cmp_points(a: &Point3, b: &Point3) -> std::cmp::Ordering {
    let axis = |i: usize| unsigned_zero(a[i]).total_cmp(&unsigned_zero(b[i]));
    axis(0).then_with(|| axis(1)).then_with(|| axis(2))
}

/// Bit-exact key of a point, suitable for hashing. Both zeros share a key.
#[must_use]
pub fn point_key(p: &Point3) -> [u32; 3] {
    [
        unsigned_zero(p.x).to_bits(),
        unsigned_zero(p.y).to_bits(),
        unsigned_zero(p.z).to_bits(),
    ]
}
