pub mod attribute;
pub mod space;

pub use attribute::{
    Attribute, AttributeData, AttributeSpec, Attributes, DataType, RADIUS, VERTEX_TYPES,
};
pub use space::Space;

use tracing::debug;
use uuid::Uuid;

use crate::error::{ModelError, OperationError, Result};
use crate::math::{self, Aabb, Point3, Transform};
use crate::operations::consolidate::{chain_edges, Consolidate};

/// An undirected edge between two vertex indices.
pub type Edge = [usize; 2];

/// A sparse 3D graph approximating the medial curve of an object.
///
/// Vertices are addressed by index; every attribute array holds one row per
/// vertex and is kept aligned with `vertices` by every transform. Transforms
/// never mutate their input: they return a new `Skeleton` with freshly owned
/// buffers.
#[derive(Debug, Clone)]
pub struct Skeleton {
    vertices: Vec<Point3>,
    edges: Vec<Edge>,
    attributes: Attributes,
    transform: Transform,
    space: Space,
    id: Uuid,
}

impl Default for Skeleton {
    fn default() -> Self {
        Self::empty()
    }
}

impl Skeleton {
    /// Creates a skeleton from raw vertex and edge arrays.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidEdge`] if an edge references a vertex
    /// index outside the vertex array.
    pub fn new(vertices: Vec<Point3>, edges: Vec<Edge>) -> Result<Self> {
        let vertex_count = vertices.len();
        if let Some(&edge) = edges
            .iter()
            .find(|e| e[0] >= vertex_count || e[1] >= vertex_count)
        {
            return Err(ModelError::InvalidEdge { edge, vertex_count }.into());
        }
        Ok(Self::from_raw_parts(vertices, edges))
    }

    /// Creates a skeleton without validating edges.
    pub(crate) fn from_raw_parts(vertices: Vec<Point3>, edges: Vec<Edge>) -> Self {
        Self {
            vertices,
            edges,
            attributes: Attributes::new(),
            transform: math::identity_transform(),
            space: Space::Voxel,
            id: Uuid::new_v4(),
        }
    }

    /// A skeleton with no vertices, no edges and no attributes.
    #[must_use]
    pub fn empty() -> Self {
        Self::from_raw_parts(Vec::new(), Vec::new())
    }

    /// Builds a chain skeleton whose edges connect consecutive points.
    #[must_use]
    pub fn from_path(points: &[Point3]) -> Self {
        Self::from_raw_parts(points.to_vec(), chain_edges(points.len()))
    }

    /// Sets the identifier.
    #[must_use]
    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = id;
        self
    }

    /// Sets the coordinate space tag.
    #[must_use]
    pub fn with_space(mut self, space: Space) -> Self {
        self.space = space;
        self
    }

    /// Sets the voxel-to-physical transform.
    #[must_use]
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    /// Attaches an attribute array with `components` values per vertex.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::ShapeMismatch`] if `data` does not hold exactly
    /// one row per vertex, or [`ModelError::DuplicateAttribute`] if the name
    /// is already in use.
    pub fn with_attribute(
        mut self,
        name: impl Into<String>,
        components: usize,
        data: AttributeData,
    ) -> Result<Self> {
        self.add_attribute(Attribute::new(name, components, data))?;
        Ok(self)
    }

    /// Attaches a `radius` attribute.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::ShapeMismatch`] if the length differs from the vertex count.
    pub fn with_radii(self, radii: Vec<f32>) -> Result<Self> {
        self.with_attribute(RADIUS, 1, AttributeData::F32(radii))
    }

    /// Attaches a `vertex_types` attribute (SWC type codes).
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::ShapeMismatch`] if the length differs from the vertex count.
    pub fn with_vertex_types(self, types: Vec<u8>) -> Result<Self> {
        self.with_attribute(VERTEX_TYPES, 1, AttributeData::U8(types))
    }

    /// Attaches an attribute to this skeleton.
    ///
    /// # Errors
    ///
    /// See [`Attributes::insert`].
    pub fn add_attribute(&mut self, attribute: Attribute) -> Result<()> {
        self.attributes.insert(attribute, self.vertices.len())?;
        Ok(())
    }

    pub fn set_id(&mut self, id: Uuid) {
        self.id = id;
    }

    #[must_use]
    pub fn vertices(&self) -> &[Point3] {
        &self.vertices
    }

    #[must_use]
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    #[must_use]
    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    pub fn attribute_mut(&mut self, name: &str) -> Option<&mut Attribute> {
        self.attributes.get_mut(name)
    }

    /// Per-vertex radii, if a one-component `f32` radius attribute is present.
    #[must_use]
    pub fn radii(&self) -> Option<&[f32]> {
        match self.attributes.get(RADIUS)?.data() {
            AttributeData::F32(values) => Some(values),
            _ => None,
        }
    }

    /// Per-vertex SWC type codes, if a one-component `u8` attribute is present.
    #[must_use]
    pub fn vertex_types(&self) -> Option<&[u8]> {
        match self.attributes.get(VERTEX_TYPES)?.data() {
            AttributeData::U8(values) => Some(values),
            _ => None,
        }
    }

    #[must_use]
    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    #[must_use]
    pub fn space(&self) -> Space {
        self.space
    }

    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Returns `true` if the skeleton has no vertices or no edges.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.edges.is_empty()
    }

    /// Axis-aligned bounds of the vertices, or `None` without vertices.
    #[must_use]
    pub fn bounds(&self) -> Option<Aabb> {
        Aabb::from_points(&self.vertices)
    }

    /// Number of edge endpoints incident to each vertex.
    #[must_use]
    pub fn degrees(&self) -> Vec<usize> {
        let mut degrees = vec![0_usize; self.vertices.len()];
        for &[a, b] in &self.edges {
            degrees[a] += 1;
            degrees[b] += 1;
        }
        degrees
    }

    /// Indices of vertices with exactly one incident edge.
    #[must_use]
    pub fn terminals(&self) -> Vec<usize> {
        self.degrees()
            .iter()
            .enumerate()
            .filter_map(|(i, &d)| (d == 1).then_some(i))
            .collect()
    }

    /// Indices of vertices with three or more incident edges.
    #[must_use]
    pub fn branches(&self) -> Vec<usize> {
        self.degrees()
            .iter()
            .enumerate()
            .filter_map(|(i, &d)| (d >= 3).then_some(i))
            .collect()
    }

    /// Total length of all edges, measured in physical space.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::Transform`] if the skeleton is in
    /// [`Space::Other`] or its transform cannot be applied.
    pub fn cable_length(&self) -> Result<f64> {
        let skel = self.physical_space()?;
        Ok(skel
            .edges
            .iter()
            .map(|&[a, b]| math::distance(&skel.vertices[a], &skel.vertices[b]))
            .sum())
    }

    /// Copy of this skeleton with vertices in physical coordinates.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::Transform`] for [`Space::Other`].
    pub fn physical_space(&self) -> Result<Self> {
        match self.space {
            Space::Physical => Ok(self.clone()),
            Space::Voxel => {
                let mut skel = self.clone();
                skel.vertices = self
                    .vertices
                    .iter()
                    .map(|p| space::apply_transform(&self.transform, p))
                    .collect();
                skel.space = Space::Physical;
                Ok(skel)
            }
            Space::Other => Err(other_space_error().into()),
        }
    }

    /// Copy of this skeleton with vertices in voxel coordinates.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::Transform`] for [`Space::Other`] or a
    /// singular transform.
    pub fn voxel_space(&self) -> Result<Self> {
        match self.space {
            Space::Voxel => Ok(self.clone()),
            Space::Physical => {
                let inverse = space::invert_transform(&self.transform)?;
                let mut skel = self.clone();
                skel.vertices = self
                    .vertices
                    .iter()
                    .map(|p| space::apply_transform(&inverse, p))
                    .collect();
                skel.space = Space::Voxel;
                Ok(skel)
            }
            Space::Other => Err(other_space_error().into()),
        }
    }

    /// Concatenates skeletons without connecting them.
    ///
    /// Empty parts are skipped. The result takes the id, space and transform
    /// of the first non-empty part; parts in another space are converted into
    /// it first.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::AttributeMixing`] if the attribute schemas
    /// differ, or [`OperationError::Transform`] if a space conversion fails.
    pub fn simple_merge(parts: &[Self]) -> Result<Self> {
        let mut parts = parts.iter().filter(|s| !s.is_empty());
        let Some(first) = parts.next() else {
            return Ok(Self::empty());
        };

        let mut merged = first.clone();
        for part in parts {
            let converted;
            let part = if part.space == merged.space {
                part
            } else {
                converted = match merged.space {
                    Space::Voxel => part.voxel_space()?,
                    Space::Physical => part.physical_space()?,
                    Space::Other => return Err(other_space_error().into()),
                };
                &converted
            };

            merged.attributes.append(&part.attributes)?;
            let offset = merged.vertices.len();
            merged.vertices.extend_from_slice(&part.vertices);
            merged
                .edges
                .extend(part.edges.iter().map(|&[a, b]| [a + offset, b + offset]));
        }

        debug!(
            vertices = merged.vertices.len(),
            edges = merged.edges.len(),
            "merged skeletons"
        );
        Ok(merged)
    }

    /// Merges `other` into a copy of this skeleton and consolidates the result.
    ///
    /// # Errors
    ///
    /// See [`Skeleton::simple_merge`].
    pub fn merge(&self, other: &Self) -> Result<Self> {
        let merged = Self::simple_merge(&[self.clone(), other.clone()])?;
        Ok(Consolidate::new().execute(&merged))
    }

    /// Skeleton with the same id, space, transform and attribute schema but
    /// no vertices or edges.
    #[must_use]
    pub fn empty_like(&self) -> Self {
        Self {
            vertices: Vec::new(),
            edges: Vec::new(),
            attributes: self.attributes.empty_like(),
            transform: self.transform,
            space: self.space,
            id: self.id,
        }
    }

    /// New skeleton holding the vertices (and attribute rows) at `indices`,
    /// connected by `edges` expressed in the new numbering.
    pub(crate) fn select(&self, indices: &[usize], edges: Vec<Edge>) -> Self {
        Self {
            vertices: indices.iter().map(|&i| self.vertices[i]).collect(),
            edges,
            attributes: self.attributes.gather(indices),
            transform: self.transform,
            space: self.space,
            id: self.id,
        }
    }

    /// Replaces the vertex coordinates, keeping everything else.
    pub(crate) fn set_vertices(&mut self, vertices: Vec<Point3>) {
        debug_assert_eq!(vertices.len(), self.vertices.len());
        self.vertices = vertices;
    }
}

fn other_space_error() -> OperationError {
    OperationError::Transform(
        "vertices are in a caller-defined space; the transform has no defined meaning".into(),
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::SkeletalError;
    use approx::assert_relative_eq;

    fn p(x: f32, y: f32, z: f32) -> Point3 {
        Point3::new(x, y, z)
    }

    #[test]
    fn new_rejects_dangling_edges() {
        let err = Skeleton::new(vec![p(0.0, 0.0, 0.0)], vec![[0, 1]]).unwrap_err();
        assert!(matches!(
            err,
            SkeletalError::Model(ModelError::InvalidEdge { vertex_count: 1, .. })
        ));
    }

    #[test]
    fn from_path_chains_points() {
        let skel = Skeleton::from_path(&[p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(2.0, 0.0, 0.0)]);
        assert_eq!(skel.edges(), &[[0, 1], [1, 2]]);
        assert_eq!(skel.terminals(), vec![0, 2]);
        assert!(skel.branches().is_empty());
        assert!(Skeleton::from_path(&[]).is_empty());
    }

    #[test]
    fn star_has_one_branch() {
        let skel = Skeleton::new(
            vec![p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(0.0, 1.0, 0.0), p(0.0, 0.0, 1.0)],
            vec![[0, 1], [0, 2], [0, 3]],
        )
        .unwrap();
        assert_eq!(skel.branches(), vec![0]);
        assert_eq!(skel.terminals(), vec![1, 2, 3]);
    }

    #[test]
    fn cable_length_uses_physical_space() {
        let skel = Skeleton::from_path(&[p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(1.0, 1.0, 0.0)])
            .with_transform(Transform::new(
                2.0, 0.0, 0.0, 0.0, //
                0.0, 3.0, 0.0, 0.0, //
                0.0, 0.0, 1.0, 0.0,
            ));
        assert_relative_eq!(skel.cable_length().unwrap(), 5.0, epsilon = 1e-9);

        let other = skel.with_space(Space::Other);
        assert!(other.cable_length().is_err());
    }

    #[test]
    fn space_round_trip_restores_vertices() {
        let transform = Transform::new(
            4.0, 0.0, 0.0, 1.0, //
            0.0, 4.0, 0.0, 2.0, //
            0.0, 0.0, 40.0, 3.0,
        );
        let skel = Skeleton::from_path(&[p(1.0, 2.0, 3.0), p(4.0, 5.0, 6.0)]).with_transform(transform);
        let physical = skel.physical_space().unwrap();
        assert_eq!(physical.space(), Space::Physical);
        assert_relative_eq!(physical.vertices()[0].x, 5.0);
        assert_relative_eq!(physical.vertices()[0].z, 123.0);

        let voxel = physical.voxel_space().unwrap();
        for (a, b) in voxel.vertices().iter().zip(skel.vertices()) {
            assert_relative_eq!(a.x, b.x, epsilon = 1e-4);
            assert_relative_eq!(a.y, b.y, epsilon = 1e-4);
            assert_relative_eq!(a.z, b.z, epsilon = 1e-4);
        }
    }

    #[test]
    fn simple_merge_offsets_edges_and_attributes() {
        let a = Skeleton::from_path(&[p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0)])
            .with_radii(vec![1.0, 2.0])
            .unwrap();
        let b = Skeleton::from_path(&[p(5.0, 0.0, 0.0), p(6.0, 0.0, 0.0)])
            .with_radii(vec![3.0, 4.0])
            .unwrap();
        let merged = Skeleton::simple_merge(&[a.clone(), Skeleton::empty(), b]).unwrap();
        assert_eq!(merged.vertex_count(), 4);
        assert_eq!(merged.edges(), &[[0, 1], [2, 3]]);
        assert_eq!(merged.radii().unwrap(), &[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(merged.id(), a.id());
    }

    #[test]
    fn simple_merge_rejects_mixed_schemas() {
        let a = Skeleton::from_path(&[p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0)])
            .with_radii(vec![1.0, 2.0])
            .unwrap();
        let b = Skeleton::from_path(&[p(5.0, 0.0, 0.0), p(6.0, 0.0, 0.0)]);
        let err = Skeleton::simple_merge(&[a, b]).unwrap_err();
        assert!(matches!(
            err,
            SkeletalError::Model(ModelError::AttributeMixing { .. })
        ));
    }

    #[test]
    fn merge_fuses_shared_endpoint() {
        let a = Skeleton::from_path(&[p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0)]);
        let b = Skeleton::from_path(&[p(1.0, 0.0, 0.0), p(2.0, 0.0, 0.0)]);
        let merged = a.merge(&b).unwrap();
        assert_eq!(merged.vertex_count(), 3);
        assert_eq!(merged.edge_count(), 2);
    }

    #[test]
    fn empty_like_keeps_schema_and_identity() {
        let skel = Skeleton::from_path(&[p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0)])
            .with_radii(vec![1.0, 2.0])
            .unwrap()
            .with_space(Space::Physical);
        let empty = skel.empty_like();
        assert_eq!(empty.vertex_count(), 0);
        assert_eq!(empty.id(), skel.id());
        assert_eq!(empty.space(), Space::Physical);
        assert_eq!(empty.attributes().schema(), skel.attributes().schema());
    }
}
