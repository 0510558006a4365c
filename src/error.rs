use std::fmt;

use thiserror::Error;

/// Top-level error type for skeleton operations and codecs.
#[derive(Debug, Error)]
pub enum SkeletalError {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Operation(#[from] OperationError),

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Corruption(#[from] CorruptionError),
}

/// Errors related to the in-memory skeleton model.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("attribute {attribute:?} holds {actual} values but {expected} were expected")]
    ShapeMismatch {
        attribute: String,
        expected: usize,
        actual: usize,
    },

    #[error("cannot merge skeletons with different attribute schemas: expected [{expected}], found [{found}]")]
    AttributeMixing { expected: String, found: String },

    #[error("edge {edge:?} references a vertex outside 0..{vertex_count}")]
    InvalidEdge {
        edge: [usize; 2],
        vertex_count: usize,
    },

    #[error("attribute {0:?} is already defined")]
    DuplicateAttribute(String),

    #[error("attribute {0:?} declares zero components per vertex")]
    ZeroComponents(String),
}

/// Errors raised by skeleton operations.
#[derive(Debug, Error)]
pub enum OperationError {
    #[error(
        "smoothing moved vertex {vertex} by {displacement} which exceeds its radius {radius}"
    )]
    BoundaryViolation {
        vertex: usize,
        displacement: f64,
        radius: f64,
    },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("cannot transform coordinates: {0}")]
    Transform(String),
}

/// Structural errors found while encoding or decoding a serialized skeleton.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("buffer is truncated: needed at least {needed} bytes, got {actual}")]
    Truncated { needed: usize, actual: usize },

    #[error("magic bytes did not match: expected {expected:?}, got {actual:?}")]
    BadMagic { expected: [u8; 4], actual: [u8; 4] },

    #[error("format version {found} is newer than the supported version {supported}")]
    UnsupportedVersion { found: u8, supported: u8 },

    #[error("unsupported encoding: {0}")]
    Unsupported(String),

    #[error("malformed data: {0}")]
    Malformed(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// A serialized block whose checksum can fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Header,
    Vertices,
    Edges,
    Attribute(String),
    AttributeDirectory,
    File,
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Header => f.write_str("header"),
            Self::Vertices => f.write_str("vertex block"),
            Self::Edges => f.write_str("edge block"),
            Self::Attribute(name) => write!(f, "attribute {name:?}"),
            Self::AttributeDirectory => f.write_str("attribute directory"),
            Self::File => f.write_str("whole file"),
        }
    }
}

/// A checksum mismatch in one block of a serialized skeleton.
#[derive(Debug, Error)]
#[error("corruption detected in {block}: stored checksum {stored:#x}, computed {computed:#x}")]
pub struct CorruptionError {
    pub block: Block,
    pub stored: u32,
    pub computed: u32,
}

/// Convenience type alias for results using [`SkeletalError`].
pub type Result<T> = std::result::Result<T, SkeletalError>;
