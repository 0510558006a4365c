use super::Point3;

/// An axis-aligned bounding box with inclusive bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner of the bounding box.
    pub min: Point3,
    /// Maximum corner of the bounding box.
    pub max: Point3,
}

impl Aabb {
    /// Creates a box from two opposite corners in any order.
    #[must_use]
    pub fn new(a: Point3, b: Point3) -> Self {
        Self {
            min: Point3::new(a.x.min(b.x), a.y.min(b.y), a.z.min(b.z)),
            max: Point3::new(a.x.max(b.x), a.y.max(b.y), a.z.max(b.z)),
        }
    }

    /// Smallest box containing every point, or `None` for an empty slice.
    #[must_use]
    pub fn from_points(points: &[Point3]) -> Option<Self> {
        let first = points.first()?;
        let mut min = *first;
        let mut max = *first;
        for p in &points[1..] {
            min = Point3::new(min.x.min(p.x), min.y.min(p.y), min.z.min(p.z));
            max = Point3::new(max.x.max(p.x), max.y.max(p.y), max.z.max(p.z));
        }
        Some(Self { min, max })
    }

    /// Returns `true` if the point lies inside or on the boundary.
    #[must_use]
    pub fn contains(&self, p: &Point3) -> bool {
        (self.min.x..=self.max.x).contains(&p.x)
            && (self.min.y..=self.max.y).contains(&p.y)
            && (self.min.z..=self.max.z).contains(&p.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corners_are_normalized() {
        let bbox = Aabb::new(Point3::new(2.0, 0.0, 5.0), Point3::new(0.0, 3.0, 1.0));
        assert_eq!(bbox.min, Point3::new(0.0, 0.0, 1.0));
        assert_eq!(bbox.max, Point3::new(2.0, 3.0, 5.0));
    }

    #[test]
    fn boundary_counts_as_inside() {
        let bbox = Aabb::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0));
        assert!(bbox.contains(&Point3::new(1.0, 0.0, 0.5)));
        assert!(!bbox.contains(&Point3::new(1.01, 0.0, 0.5)));
    }

    #[test]
    fn from_points_spans_all() {
        let pts = [
            Point3::new(1.0, -1.0, 0.0),
            Point3::new(-2.0, 4.0, 3.0),
        ];
        let bbox = Aabb::from_points(&pts);
        assert_eq!(
            bbox,
            Some(Aabb::new(Point3::new(-2.0, -1.0, 0.0), Point3::new(1.0, 4.0, 3.0)))
        );
        assert!(Aabb::from_points(&[]).is_none());
    }
}
