//! Checksummed binary container.
//!
//! Layout, all integers little-endian:
//!
//! ```text
//! header (114 bytes, crc16 over bytes 4..112)
//! vertices  Nv x 3 x f32          | crc32c
//! edges     Ne x 2 x uint(width)  | crc32c
//! attribute data, one block each  | crc32c
//! directory Nattr x (name, type, offset u64) | crc16
//! crc32c of everything above
//! ```
//!
//! The directory type byte packs the data type code in the low nibble and
//! the component count in the high nibble.

mod header;

pub use header::{
    Compression, EdgeRepresentation, Flags, GraphType, Header, PhysicalUnit, FORMAT_VERSION,
    HEADER_BYTES, MAGIC,
};

use tracing::debug;

use crate::error::{Block, CorruptionError, FormatError, Result};
use crate::formats::{block_len, crc16, crc32c, ByteReader};
use crate::math::Point3;
use crate::operations::decompose::Components;
use crate::skeleton::{Attribute, AttributeData, DataType, Skeleton};

const MAX_COMPONENTS: usize = 15;

/// Serializes skeletons into the ostd container.
#[derive(Debug, Clone, Copy)]
pub struct OstdEncoder {
    physical_unit: PhysicalUnit,
    graph_type: GraphType,
}

impl Default for OstdEncoder {
    fn default() -> Self {
        Self {
            physical_unit: PhysicalUnit::Nanometer,
            graph_type: GraphType::Graph,
        }
    }
}

impl OstdEncoder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_physical_unit(mut self, physical_unit: PhysicalUnit) -> Self {
        self.physical_unit = physical_unit;
        self
    }

    #[must_use]
    pub fn with_graph_type(mut self, graph_type: GraphType) -> Self {
        self.graph_type = graph_type;
        self
    }

    /// Encodes `skel`.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::InvalidArgument`] if an attribute name is empty
    /// or longer than 255 bytes, an attribute has more than 15 components, or
    /// a count does not fit its header field.
    pub fn encode(&self, skel: &Skeleton) -> Result<Vec<u8>> {
        let mut name_width = 1_usize;
        for attribute in skel.attributes().iter() {
            let name = attribute.name();
            if name.is_empty() || name.len() > usize::from(u8::MAX) {
                return Err(FormatError::InvalidArgument(format!(
                    "attribute name {name:?} must be 1 to 255 bytes long"
                ))
                .into());
            }
            if attribute.components() > MAX_COMPONENTS {
                return Err(FormatError::InvalidArgument(format!(
                    "attribute {name:?} has {} components, at most {MAX_COMPONENTS} are supported",
                    attribute.components()
                ))
                .into());
            }
            name_width = name_width.max(name.len());
        }

        let too_large = |what: &str| FormatError::InvalidArgument(format!("{what} does not fit its header field"));
        let header = Header {
            id: skel.id(),
            flags: Flags {
                vertex_type: DataType::F32,
                edge_representation: EdgeRepresentation::Pair,
                compression: Compression::None,
                graph_type: self.graph_type,
                physical_unit: self.physical_unit,
                space: skel.space(),
            },
            vertex_count: skel.vertex_count() as u64,
            edge_count: skel.edge_count() as u64,
            attribute_count: u16::try_from(skel.attributes().len())
                .map_err(|_| too_large("attribute count"))?,
            name_width: u8::try_from(name_width).map_err(|_| too_large("attribute name width"))?,
            components: u32::try_from(Components::new().execute(skel).len())
                .map_err(|_| too_large("component count"))?,
            transform: *skel.transform(),
        };

        let mut out = header.to_bytes();

        let start = out.len();
        for p in skel.vertices() {
            for axis in 0..3 {
                out.extend_from_slice(&p[axis].to_le_bytes());
            }
        }
        let checksum = crc32c(&out[start..]);
        out.extend_from_slice(&checksum.to_le_bytes());

        let width = header.edge_width();
        let start = out.len();
        for edge in skel.edges() {
            for &v in edge {
                out.extend_from_slice(&(v as u64).to_le_bytes()[..width]);
            }
        }
        let checksum = crc32c(&out[start..]);
        out.extend_from_slice(&checksum.to_le_bytes());

        let mut directory = Vec::new();
        for attribute in skel.attributes().iter() {
            let start = out.len();
            attribute.data().write_le(&mut out);
            let checksum = crc32c(&out[start..]);
            out.extend_from_slice(&checksum.to_le_bytes());

            let mut name = vec![0_u8; name_width];
            name[..attribute.name().len()].copy_from_slice(attribute.name().as_bytes());
            #[allow(clippy::cast_possible_truncation)]
            let type_field = attribute.data_type().code() | (attribute.components() as u8) << 4;
            directory.extend_from_slice(&name);
            directory.push(type_field);
            directory.extend_from_slice(&(start as u64).to_le_bytes());
        }
        out.extend_from_slice(&directory);
        out.extend_from_slice(&crc16(&directory).to_le_bytes());

        let checksum = crc32c(&out);
        out.extend_from_slice(&checksum.to_le_bytes());

        debug!(
            vertices = skel.vertex_count(),
            edges = skel.edge_count(),
            attributes = skel.attributes().len(),
            bytes = out.len(),
            "encoded ostd"
        );
        Ok(out)
    }
}

/// Parses the ostd container, verifying every checksum.
#[derive(Debug, Clone, Copy, Default)]
pub struct OstdDecoder;

impl OstdDecoder {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Decodes a skeleton.
    ///
    /// Validation runs in a fixed order: length, magic, version, header
    /// checksum, vertex checksum, edge checksum, directory checksum, each
    /// attribute checksum, and finally the whole-file checksum.
    ///
    /// # Errors
    ///
    /// Returns a [`FormatError`] for structural problems or a
    /// [`CorruptionError`] naming the first block whose checksum fails.
    pub fn decode(&self, bytes: &[u8]) -> Result<Skeleton> {
        let header = Header::from_bytes(bytes)?;
        let mut reader = ByteReader::at(bytes, HEADER_BYTES);

        let vertex_type = header.flags.vertex_type;
        let vertex_bytes = reader.take(block_len(header.vertex_count, 3 * vertex_type.size())?)?;
        verify(Block::Vertices, vertex_bytes, reader.u32()?)?;
        let vertices = read_vertices(vertex_type, vertex_bytes)?;

        let width = header.edge_width();
        let edge_bytes = reader.take(block_len(header.edge_count, 2 * width)?)?;
        verify(Block::Edges, edge_bytes, reader.u32()?)?;
        let mut edge_reader = ByteReader::new(edge_bytes);
        let mut edges = Vec::with_capacity(edge_bytes.len() / (2 * width));
        while edge_reader.offset() < edge_bytes.len() {
            edges.push([index(edge_reader.uint(width)?)?, index(edge_reader.uint(width)?)?]);
        }

        let name_width = usize::from(header.name_width);
        let entry_bytes = name_width + 1 + 8;
        let directory_len = usize::from(header.attribute_count) * entry_bytes;
        let trailer = directory_len + 2 + 4;
        let directory_start = bytes
            .len()
            .checked_sub(trailer)
            .filter(|&start| start >= reader.offset())
            .ok_or(FormatError::Truncated {
                needed: reader.offset() + trailer,
                actual: bytes.len(),
            })?;
        let mut tail = ByteReader::at(bytes, directory_start);
        let directory = tail.take(directory_len)?;
        let stored = tail.u16()?;
        let computed = crc16(directory);
        if stored != computed {
            return Err(CorruptionError {
                block: Block::AttributeDirectory,
                stored: u32::from(stored),
                computed: u32::from(computed),
            }
            .into());
        }

        let mut attributes = Vec::with_capacity(usize::from(header.attribute_count));
        for entry in directory.chunks_exact(entry_bytes) {
            let raw_name = &entry[..name_width];
            let name_end = raw_name.iter().position(|&b| b == 0).unwrap_or(name_width);
            let name = std::str::from_utf8(&raw_name[..name_end])
                .map_err(|_| FormatError::Malformed("attribute name is not valid UTF-8".into()))?
                .to_owned();
            let type_field = entry[name_width];
            let data_type = DataType::from_code(type_field & 0b1111).ok_or_else(|| {
                FormatError::Unsupported(format!(
                    "attribute {name:?} has data type code {}",
                    type_field & 0b1111
                ))
            })?;
            let components = usize::from(type_field >> 4);
            let mut offset = [0_u8; 8];
            offset.copy_from_slice(&entry[name_width + 1..]);
            let offset = index(u64::from_le_bytes(offset))?;

            let mut block = ByteReader::at(&bytes[..directory_start], offset);
            let data = block.take(block_len(header.vertex_count, components * data_type.size())?)?;
            verify(Block::Attribute(name.clone()), data, block.u32()?)?;
            attributes.push(Attribute::new(name, components, AttributeData::read_le(data_type, data)));
        }

        let body = &bytes[..bytes.len() - 4];
        let mut file = ByteReader::at(bytes, bytes.len() - 4);
        verify(Block::File, body, file.u32()?)?;

        let mut skel = Skeleton::new(vertices, edges)?
            .with_id(header.id)
            .with_space(header.flags.space)
            .with_transform(header.transform);
        for attribute in attributes {
            skel.add_attribute(attribute)?;
        }

        debug!(
            vertices = skel.vertex_count(),
            edges = skel.edge_count(),
            attributes = skel.attributes().len(),
            unit = %header.flags.physical_unit,
            "decoded ostd"
        );
        Ok(skel)
    }
}

/// Encodes with the default settings.
///
/// # Errors
///
/// See [`OstdEncoder::encode`].
pub fn to_ostd(skel: &Skeleton) -> Result<Vec<u8>> {
    OstdEncoder::new().encode(skel)
}

/// # Errors
///
/// See [`OstdDecoder::decode`].
pub fn from_ostd(bytes: &[u8]) -> Result<Skeleton> {
    OstdDecoder::new().decode(bytes)
}

fn verify(block: Block, bytes: &[u8], stored: u32) -> Result<()> {
    let computed = crc32c(bytes);
    if stored == computed {
        Ok(())
    } else {
        Err(CorruptionError {
            block,
            stored,
            computed,
        }
        .into())
    }
}

fn index(value: u64) -> std::result::Result<usize, FormatError> {
    usize::try_from(value).map_err(|_| FormatError::Malformed(format!("index {value} is out of range")))
}

#[allow(clippy::cast_possible_truncation)]
fn read_vertices(vertex_type: DataType, bytes: &[u8]) -> std::result::Result<Vec<Point3>, FormatError> {
    let mut reader = ByteReader::new(bytes);
    let mut vertices = Vec::with_capacity(bytes.len() / (3 * vertex_type.size()));
    while reader.offset() < bytes.len() {
        let p = match vertex_type {
            DataType::F64 => Point3::new(
                reader.f64()? as f32,
                reader.f64()? as f32,
                reader.f64()? as f32,
            ),
            _ => Point3::new(reader.f32()?, reader.f32()?, reader.f32()?),
        };
        vertices.push(p);
    }
    Ok(vertices)
}
