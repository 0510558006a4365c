use std::fmt;

use crate::error::ModelError;

/// Name of the per-vertex radius attribute (`f32`, one component).
pub const RADIUS: &str = "radius";

/// Name of the per-vertex SWC type attribute (`u8`, one component).
pub const VERTEX_TYPES: &str = "vertex_types";

/// Copies the rows at `indices` out of a row-major buffer with `components`
/// values per row.
fn gather_rows<T: Copy>(values: &[T], indices: &[usize], components: usize) -> Vec<T> {
    let mut out = Vec::with_capacity(indices.len() * components);
    for &i in indices {
        out.extend_from_slice(&values[i * components..(i + 1) * components]);
    }
    out
}

macro_rules! attribute_types {
    ($($variant:ident => $ty:ty, $code:literal, $name:literal;)*) => {
        /// Element type of an attribute array.
        ///
        /// The numeric code is the one used on the wire by the binary formats.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum DataType {
            $($variant,)*
        }

        impl DataType {
            /// Wire code of this element type.
            #[must_use]
            pub fn code(self) -> u8 {
                match self {
                    $(Self::$variant => $code,)*
                }
            }

            /// Looks up an element type by wire code.
            #[must_use]
            pub fn from_code(code: u8) -> Option<Self> {
                match code {
                    $($code => Some(Self::$variant),)*
                    _ => None,
                }
            }

            /// Size of one element in bytes.
            #[must_use]
            pub fn size(self) -> usize {
                match self {
                    $(Self::$variant => std::mem::size_of::<$ty>(),)*
                }
            }

            /// Conventional lowercase name (`"float32"`, `"uint8"`, ...).
            #[must_use]
            pub fn name(self) -> &'static str {
                match self {
                    $(Self::$variant => $name,)*
                }
            }
        }

        /// Owned, row-major storage for one attribute.
        #[derive(Debug, Clone, PartialEq)]
        pub enum AttributeData {
            $($variant(Vec<$ty>),)*
        }

        impl AttributeData {
            /// Element type of the stored values.
            #[must_use]
            pub fn data_type(&self) -> DataType {
                match self {
                    $(Self::$variant(_) => DataType::$variant,)*
                }
            }

            /// Number of scalar elements (rows times components).
            #[must_use]
            pub fn len(&self) -> usize {
                match self {
                    $(Self::$variant(v) => v.len(),)*
                }
            }

            /// Returns `true` if the buffer holds no elements.
            #[must_use]
            pub fn is_empty(&self) -> bool {
                self.len() == 0
            }

            /// Element at flat position `index`, widened to `f64`.
            #[must_use]
            #[allow(
                clippy::cast_precision_loss,
                clippy::cast_lossless,
                clippy::unnecessary_cast
            )]
            pub fn get_f64(&self, index: usize) -> Option<f64> {
                match self {
                    $(Self::$variant(v) => v.get(index).map(|&x| x as f64),)*
                }
            }

            fn gather(&self, indices: &[usize], components: usize) -> Self {
                match self {
                    $(Self::$variant(v) => Self::$variant(gather_rows(v, indices, components)),)*
                }
            }

            fn append(&mut self, other: &Self) -> bool {
                match (self, other) {
                    $((Self::$variant(a), Self::$variant(b)) => {
                        a.extend_from_slice(b);
                        true
                    })*
                    _ => false,
                }
            }

            fn rows_equal(&self, i: usize, other: &Self, j: usize, components: usize) -> bool {
                match (self, other) {
                    $((Self::$variant(a), Self::$variant(b)) => {
                        a[i * components..(i + 1) * components]
                            == b[j * components..(j + 1) * components]
                    })*
                    _ => false,
                }
            }

            /// Appends the values to `out` in little-endian byte order.
            pub fn write_le(&self, out: &mut Vec<u8>) {
                match self {
                    $(Self::$variant(v) => {
                        for x in v {
                            out.extend_from_slice(&x.to_le_bytes());
                        }
                    })*
                }
            }

            /// Reads little-endian values; trailing bytes short of one element are ignored.
            #[must_use]
            pub fn read_le(data_type: DataType, bytes: &[u8]) -> Self {
                match data_type {
                    $(DataType::$variant => Self::$variant(
                        bytes
                            .chunks_exact(std::mem::size_of::<$ty>())
                            .map(|chunk| {
                                let mut buf = [0_u8; std::mem::size_of::<$ty>()];
                                buf.copy_from_slice(chunk);
                                <$ty>::from_le_bytes(buf)
                            })
                            .collect(),
                    ),)*
                }
            }
        }
    };
}

attribute_types! {
    F32 => f32, 2, "float32";
    F64 => f64, 3, "float64";
    U8 => u8, 4, "uint8";
    U16 => u16, 5, "uint16";
    U32 => u32, 6, "uint32";
    U64 => u64, 7, "uint64";
    I8 => i8, 8, "int8";
    I16 => i16, 9, "int16";
    I32 => i32, 10, "int32";
    I64 => i64, 11, "int64";
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Declared shape of an attribute: name, element type and components per vertex.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AttributeSpec {
    pub name: String,
    pub data_type: DataType,
    pub components: usize,
}

impl AttributeSpec {
    /// Creates a new attribute declaration.
    #[must_use]
    pub fn new(name: impl Into<String>, data_type: DataType, components: usize) -> Self {
        Self {
            name: name.into(),
            data_type,
            components,
        }
    }
}

impl fmt::Display for AttributeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}x{}", self.name, self.data_type, self.components)
    }
}

/// A named per-vertex attribute with a fixed number of components.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    name: String,
    components: usize,
    data: AttributeData,
}

impl Attribute {
    /// Creates an attribute. `data` is row-major with `components` values per vertex.
    #[must_use]
    pub fn new(name: impl Into<String>, components: usize, data: AttributeData) -> Self {
        Self {
            name: name.into(),
            components,
            data,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn components(&self) -> usize {
        self.components
    }

    #[must_use]
    pub fn data(&self) -> &AttributeData {
        &self.data
    }

    #[must_use]
    pub fn data_mut(&mut self) -> &mut AttributeData {
        &mut self.data
    }

    #[must_use]
    pub fn data_type(&self) -> DataType {
        self.data.data_type()
    }

    /// Number of vertices this attribute covers.
    #[must_use]
    pub fn rows(&self) -> usize {
        self.data.len().checked_div(self.components).unwrap_or(0)
    }

    #[must_use]
    pub fn spec(&self) -> AttributeSpec {
        AttributeSpec::new(self.name.clone(), self.data_type(), self.components)
    }

    /// Returns `true` if row `i` of `self` equals row `j` of `other` exactly.
    #[must_use]
    pub fn row_eq(&self, i: usize, other: &Self, j: usize) -> bool {
        self.components == other.components
            && self.data.rows_equal(i, &other.data, j, self.components)
    }
}

/// Ordered registry of the attributes attached to a skeleton.
///
/// Every array holds exactly one row per vertex; transforms gather all of
/// them with the same index selection applied to the vertices.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attributes {
    entries: Vec<Attribute>,
}

impl Attributes {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an attribute, checking its length against `vertex_count`.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::DuplicateAttribute`] if the name is taken, or
    /// [`ModelError::ShapeMismatch`] if the array does not hold one row per vertex,
    /// or [`ModelError::ZeroComponents`] if a row would hold no values.
    pub fn insert(&mut self, attribute: Attribute, vertex_count: usize) -> Result<(), ModelError> {
        if self.get(&attribute.name).is_some() {
            return Err(ModelError::DuplicateAttribute(attribute.name));
        }
        if attribute.components == 0 {
            return Err(ModelError::ZeroComponents(attribute.name));
        }
        let expected = vertex_count * attribute.components;
        if attribute.data.len() != expected {
            return Err(ModelError::ShapeMismatch {
                attribute: attribute.name,
                expected,
                actual: attribute.data.len(),
            });
        }
        self.entries.push(attribute);
        Ok(())
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Attribute> {
        self.entries.iter().find(|a| a.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Attribute> {
        self.entries.iter_mut().find(|a| a.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Attribute> {
        self.entries.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Declared shapes of all attributes, in registry order.
    #[must_use]
    pub fn schema(&self) -> Vec<AttributeSpec> {
        self.entries.iter().map(Attribute::spec).collect()
    }

    /// Zero-row registry with the same schema.
    #[must_use]
    pub fn empty_like(&self) -> Self {
        self.gather(&[])
    }

    /// New registry holding the rows at `indices`, in that order.
    #[must_use]
    pub fn gather(&self, indices: &[usize]) -> Self {
        let entries = self
            .entries
            .iter()
            .map(|a| Attribute {
                name: a.name.clone(),
                components: a.components,
                data: a.data.gather(indices, a.components),
            })
            .collect();
        Self { entries }
    }

    /// Appends the rows of `other`, which must share this registry's schema.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::AttributeMixing`] if the schemas differ.
    pub fn append(&mut self, other: &Self) -> Result<(), ModelError> {
        if self.schema() != other.schema() {
            return Err(mixing_error(&self.schema(), &other.schema()));
        }
        for (mine, theirs) in self.entries.iter_mut().zip(&other.entries) {
            mine.data.append(&theirs.data);
        }
        Ok(())
    }
}

/// Builds an [`ModelError::AttributeMixing`] describing both schemas.
#[must_use]
pub fn mixing_error(expected: &[AttributeSpec], found: &[AttributeSpec]) -> ModelError {
    let render = |specs: &[AttributeSpec]| {
        specs
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    };
    ModelError::AttributeMixing {
        expected: render(expected),
        found: render(found),
    }
}
