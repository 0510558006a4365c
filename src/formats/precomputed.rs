//! Length-prefixed binary skeletons.
//!
//! ```text
//! Nv u32 | Ne u32 | vertices Nv x 3 x f32 | edges Ne x 2 x u32 | attributes...
//! ```
//!
//! Attribute blocks follow in schema order without any framing, so the
//! decoder must be told the schema. No checksums are stored.

use tracing::debug;
use uuid::Uuid;

use crate::error::{FormatError, Result};
use crate::formats::{block_len, ByteReader};
use crate::math::Point3;
use crate::skeleton::{Attribute, AttributeData, AttributeSpec, DataType, Skeleton, RADIUS, VERTEX_TYPES};

const COUNTS_BYTES: usize = 8;

/// Encodes a skeleton, writing every attribute in registry order.
///
/// # Errors
///
/// Returns [`FormatError::InvalidArgument`] if the vertex count, edge count
/// or a vertex index does not fit in 32 bits.
pub fn to_precomputed(skel: &Skeleton) -> Result<Vec<u8>> {
    let too_large = |what: &str| FormatError::InvalidArgument(format!("{what} does not fit in 32 bits"));
    let vertex_count = u32::try_from(skel.vertex_count()).map_err(|_| too_large("vertex count"))?;
    let edge_count = u32::try_from(skel.edge_count()).map_err(|_| too_large("edge count"))?;

    let mut out = Vec::with_capacity(COUNTS_BYTES + skel.vertex_count() * 12 + skel.edge_count() * 8);
    out.extend_from_slice(&vertex_count.to_le_bytes());
    out.extend_from_slice(&edge_count.to_le_bytes());
    for p in skel.vertices() {
        for axis in 0..3 {
            out.extend_from_slice(&p[axis].to_le_bytes());
        }
    }
    for edge in skel.edges() {
        for &v in edge {
            let v = u32::try_from(v).map_err(|_| too_large("vertex index"))?;
            out.extend_from_slice(&v.to_le_bytes());
        }
    }
    for attribute in skel.attributes().iter() {
        attribute.data().write_le(&mut out);
    }

    debug!(bytes = out.len(), "encoded precomputed skeleton");
    Ok(out)
}

/// Decodes length-prefixed skeletons against a declared attribute schema.
#[derive(Debug, Clone)]
pub struct PrecomputedDecoder {
    schema: Vec<AttributeSpec>,
    id: Option<Uuid>,
}

impl Default for PrecomputedDecoder {
    /// Radius (`f32`) followed by SWC vertex types (`u8`).
    fn default() -> Self {
        Self {
            schema: vec![
                AttributeSpec::new(RADIUS, DataType::F32, 1),
                AttributeSpec::new(VERTEX_TYPES, DataType::U8, 1),
            ],
            id: None,
        }
    }
}

impl PrecomputedDecoder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the attribute schema.
    #[must_use]
    pub fn with_schema(mut self, schema: Vec<AttributeSpec>) -> Self {
        self.schema = schema;
        self
    }

    /// Assigns this id to decoded skeletons instead of a fresh one.
    #[must_use]
    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = Some(id);
        self
    }

    /// Decodes a skeleton.
    ///
    /// A buffer that ends right after the edge block decodes without
    /// attributes; otherwise its length must match the schema exactly.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::Truncated`] if the buffer is shorter than its
    /// counts require, [`FormatError::Malformed`] if the trailing attribute
    /// bytes do not match the schema, and a model error if an edge references
    /// a missing vertex.
    pub fn decode(&self, bytes: &[u8]) -> Result<Skeleton> {
        let mut reader = ByteReader::new(bytes);
        let vertex_count = reader.u32()?;
        let edge_count = reader.u32()?;

        let vertex_bytes = block_len(u64::from(vertex_count), 12)?;
        let edge_bytes = block_len(u64::from(edge_count), 8)?;
        let minimal = COUNTS_BYTES + vertex_bytes + edge_bytes;
        if bytes.len() < minimal {
            return Err(FormatError::Truncated {
                needed: minimal,
                actual: bytes.len(),
            }
            .into());
        }

        let mut vertices = Vec::with_capacity(vertex_bytes / 12);
        for _ in 0..vertex_count {
            vertices.push(Point3::new(reader.f32()?, reader.f32()?, reader.f32()?));
        }
        let mut edges = Vec::with_capacity(edge_bytes / 8);
        for _ in 0..edge_count {
            edges.push([reader.u32()? as usize, reader.u32()? as usize]);
        }

        let mut skel = Skeleton::new(vertices, edges)?;
        if let Some(id) = self.id {
            skel.set_id(id);
        }
        if bytes.len() == minimal {
            return Ok(skel);
        }

        let mut expected = minimal;
        for spec in &self.schema {
            expected += block_len(u64::from(vertex_count), spec.components * spec.data_type.size())?;
        }
        if bytes.len() != expected {
            return Err(FormatError::Malformed(format!(
                "buffer holds {} bytes but the attribute schema requires {expected}",
                bytes.len()
            ))
            .into());
        }

        for spec in &self.schema {
            let len = block_len(u64::from(vertex_count), spec.components * spec.data_type.size())?;
            let data = AttributeData::read_le(spec.data_type, reader.take(len)?);
            skel.add_attribute(Attribute::new(spec.name.clone(), spec.components, data))?;
        }

        debug!(
            vertices = skel.vertex_count(),
            edges = skel.edge_count(),
            attributes = skel.attributes().len(),
            "decoded precomputed skeleton"
        );
        Ok(skel)
    }
}

/// Decodes with the default radius and vertex type schema.
///
/// # Errors
///
/// See [`PrecomputedDecoder::decode`].
pub fn from_precomputed(bytes: &[u8]) -> Result<Skeleton> {
    PrecomputedDecoder::new().decode(bytes)
}
