use std::fmt;
use std::str::FromStr;

use uuid::Uuid;

use crate::error::{Block, CorruptionError, FormatError, Result};
use crate::formats::{crc16, ByteReader};
use crate::math::Transform;
use crate::skeleton::{DataType, Space};

pub const MAGIC: [u8; 4] = *b"ostd";
pub const FORMAT_VERSION: u8 = 0;
pub const HEADER_BYTES: usize = 114;

/// Offset of the header checksum; it covers bytes `4..CRC16_OFFSET`.
const CRC16_OFFSET: usize = HEADER_BYTES - 2;

macro_rules! coded_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($variant:ident = $code:literal),* $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant,)*
        }

        impl $name {
            #[must_use]
            pub fn code(self) -> u8 {
                match self {
                    $(Self::$variant => $code,)*
                }
            }

            #[must_use]
            pub fn from_code(code: u8) -> Option<Self> {
                match code {
                    $($code => Some(Self::$variant),)*
                    _ => None,
                }
            }
        }
    };
}

coded_enum! {
    /// Unit of the physical space the transform maps into.
    PhysicalUnit {
        Voxel = 0,
        Angstrom = 1,
        Femtometer = 2,
        Picometer = 3,
        Nanometer = 4,
        Micrometer = 5,
        Millimeter = 6,
        Centimeter = 7,
        Meter = 8,
        Kilometer = 9,
        Megameter = 10,
        Lightyear = 11,
        Parsec = 12,
        Mil = 13,
        Inch = 14,
        Foot = 15,
        Yard = 16,
        StatuteMile = 17,
        NauticalMile = 18,
    }
}

coded_enum! {
    /// Whether the edge set is declared to be a general graph or a tree.
    GraphType {
        Graph = 0,
        Tree = 1,
    }
}

coded_enum! {
    EdgeRepresentation {
        Pair = 0,
        Parent = 1,
    }
}

coded_enum! {
    Compression {
        None = 0,
        Gzip = 1,
        Bzip2 = 2,
        Zstd = 3,
    }
}

impl Default for PhysicalUnit {
    fn default() -> Self {
        Self::Nanometer
    }
}

impl FromStr for PhysicalUnit {
    type Err = FormatError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s {
            "vx" | "voxel" => Self::Voxel,
            "A" | "angstrom" => Self::Angstrom,
            "fm" | "femtometer" => Self::Femtometer,
            "pm" | "picometer" => Self::Picometer,
            "nm" | "nanometer" => Self::Nanometer,
            "um" | "micrometer" | "micron" => Self::Micrometer,
            "mm" | "millimeter" => Self::Millimeter,
            "cm" | "centimeter" => Self::Centimeter,
            "m" | "meter" => Self::Meter,
            "km" | "kilometer" => Self::Kilometer,
            "Mm" | "megameter" => Self::Megameter,
            "ly" | "lightyear" => Self::Lightyear,
            "pc" | "parsec" => Self::Parsec,
            "mil" => Self::Mil,
            "in" | "inch" | "inches" => Self::Inch,
            "ft" | "foot" | "feet" => Self::Foot,
            "yd" | "yard" => Self::Yard,
            "mi" | "mile" => Self::StatuteMile,
            "nmi" => Self::NauticalMile,
            _ => {
                return Err(FormatError::InvalidArgument(format!(
                    "unknown physical unit {s:?}"
                )))
            }
        })
    }
}

impl fmt::Display for PhysicalUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            Self::Voxel => "vx",
            Self::Angstrom => "A",
            Self::Femtometer => "fm",
            Self::Picometer => "pm",
            Self::Nanometer => "nm",
            Self::Micrometer => "um",
            Self::Millimeter => "mm",
            Self::Centimeter => "cm",
            Self::Meter => "m",
            Self::Kilometer => "km",
            Self::Megameter => "Mm",
            Self::Lightyear => "ly",
            Self::Parsec => "pc",
            Self::Mil => "mil",
            Self::Inch => "in",
            Self::Foot => "ft",
            Self::Yard => "yd",
            Self::StatuteMile => "mi",
            Self::NauticalMile => "nmi",
        };
        f.write_str(symbol)
    }
}

/// The packed 32-bit flags field.
///
/// | bits  | field               |
/// |-------|---------------------|
/// | 0-3   | vertex data type    |
/// | 4     | edge representation |
/// | 5-8   | compression         |
/// | 9-11  | graph type          |
/// | 12-16 | physical unit       |
/// | 17-18 | space               |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Flags {
    pub vertex_type: DataType,
    pub edge_representation: EdgeRepresentation,
    pub compression: Compression,
    pub graph_type: GraphType,
    pub physical_unit: PhysicalUnit,
    pub space: Space,
}

impl Flags {
    #[must_use]
    pub fn encode(&self) -> u32 {
        u32::from(self.vertex_type.code() & 0b1111)
            | u32::from(self.edge_representation.code() & 0b1) << 4
            | u32::from(self.compression.code() & 0b1111) << 5
            | u32::from(self.graph_type.code() & 0b111) << 9
            | u32::from(self.physical_unit.code() & 0b1_1111) << 12
            | u32::from(self.space.code() & 0b11) << 17
    }

    /// Unpacks the flags, accepting only layouts this codec can read.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::Unsupported`] for unknown codes, vertex types
    /// other than `f32`/`f64`, parent-list edges or any compression.
    #[allow(clippy::cast_possible_truncation)]
    pub fn decode(flags: u32) -> std::result::Result<Self, FormatError> {
        let field = |shift: u32, mask: u32| ((flags >> shift) & mask) as u8;
        let unsupported = |what: &str, code: u8| FormatError::Unsupported(format!("{what} code {code}"));

        let vertex_code = field(0, 0b1111);
        let vertex_type = DataType::from_code(vertex_code)
            .filter(|t| matches!(t, DataType::F32 | DataType::F64))
            .ok_or_else(|| unsupported("vertex data type", vertex_code))?;

        let edge_code = field(4, 0b1);
        let edge_representation = match EdgeRepresentation::from_code(edge_code) {
            Some(EdgeRepresentation::Pair) => EdgeRepresentation::Pair,
            _ => return Err(unsupported("edge representation", edge_code)),
        };

        let compression_code = field(5, 0b1111);
        let compression = match Compression::from_code(compression_code) {
            Some(Compression::None) => Compression::None,
            _ => return Err(unsupported("compression", compression_code)),
        };

        let graph_code = field(9, 0b111);
        let graph_type =
            GraphType::from_code(graph_code).ok_or_else(|| unsupported("graph type", graph_code))?;

        let unit_code = field(12, 0b1_1111);
        let physical_unit = PhysicalUnit::from_code(unit_code)
            .ok_or_else(|| unsupported("physical unit", unit_code))?;

        let space_code = field(17, 0b11);
        let space = Space::from_code(space_code).ok_or_else(|| unsupported("space", space_code))?;

        Ok(Self {
            vertex_type,
            edge_representation,
            compression,
            graph_type,
            physical_unit,
            space,
        })
    }
}

/// Fixed-size header at the start of every ostd buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    pub id: Uuid,
    pub flags: Flags,
    pub vertex_count: u64,
    pub edge_count: u64,
    pub attribute_count: u16,
    pub name_width: u8,
    pub components: u32,
    pub transform: Transform,
}

impl Header {
    /// Bytes per vertex index in the edge block, chosen from the vertex count.
    #[must_use]
    pub fn edge_width(&self) -> usize {
        match self.vertex_count {
            n if n < u64::from(u8::MAX) => 1,
            n if n < u64::from(u16::MAX) => 2,
            n if n < u64::from(u32::MAX) => 4,
            _ => 8,
        }
    }

    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_BYTES);
        out.extend_from_slice(&MAGIC);
        out.push(FORMAT_VERSION);
        out.extend_from_slice(self.id.as_bytes());
        out.extend_from_slice(&self.flags.encode().to_le_bytes());
        out.extend_from_slice(&self.vertex_count.to_le_bytes());
        out.extend_from_slice(&self.edge_count.to_le_bytes());
        out.extend_from_slice(&self.attribute_count.to_le_bytes());
        out.push(self.name_width);
        out.extend_from_slice(&self.components.to_le_bytes());
        for column in 0..4 {
            for row in 0..3 {
                out.extend_from_slice(&self.transform[(row, column)].to_le_bytes());
            }
            let homogeneous: f32 = if column == 3 { 1.0 } else { 0.0 };
            out.extend_from_slice(&homogeneous.to_le_bytes());
        }
        let checksum = crc16(&out[MAGIC.len()..]);
        out.extend_from_slice(&checksum.to_le_bytes());
        out
    }

    /// Parses and validates the header at the start of `bytes`.
    ///
    /// # Errors
    ///
    /// In order: [`FormatError::Truncated`], [`FormatError::BadMagic`],
    /// [`FormatError::UnsupportedVersion`], a header [`CorruptionError`], or
    /// [`FormatError::Unsupported`] for flags this codec cannot read.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_BYTES {
            return Err(FormatError::Truncated {
                needed: HEADER_BYTES,
                actual: bytes.len(),
            }
            .into());
        }

        let mut reader = ByteReader::new(bytes);
        let mut magic = [0_u8; 4];
        magic.copy_from_slice(reader.take(4)?);
        if magic != MAGIC {
            return Err(FormatError::BadMagic {
                expected: MAGIC,
                actual: magic,
            }
            .into());
        }

        let version = reader.u8()?;
        if version > FORMAT_VERSION {
            return Err(FormatError::UnsupportedVersion {
                found: version,
                supported: FORMAT_VERSION,
            }
            .into());
        }

        let stored = u16::from_le_bytes([bytes[CRC16_OFFSET], bytes[CRC16_OFFSET + 1]]);
        let computed = crc16(&bytes[MAGIC.len()..CRC16_OFFSET]);
        if stored != computed {
            return Err(CorruptionError {
                block: Block::Header,
                stored: u32::from(stored),
                computed: u32::from(computed),
            }
            .into());
        }

        let mut id = [0_u8; 16];
        id.copy_from_slice(reader.take(16)?);
        let flags = Flags::decode(reader.u32()?)?;
        let vertex_count = reader.u64()?;
        let edge_count = reader.u64()?;
        let attribute_count = reader.u16()?;
        let name_width = reader.u8()?;
        let components = reader.u32()?;

        let mut transform = Transform::zeros();
        for column in 0..4 {
            for row in 0..3 {
                transform[(row, column)] = reader.f32()?;
            }
            reader.f32()?;
        }

        Ok(Self {
            id: Uuid::from_bytes(id),
            flags,
            vertex_count,
            edge_count,
            attribute_count,
            name_width,
            components,
            transform,
        })
    }
}
