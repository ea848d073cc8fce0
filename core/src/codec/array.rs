//! Native numeric buffers.
//!
//! [`AttributeArray`] is the in-memory ("already typed") form of an
//! attribute buffer. Element storage is an `Arc<[T]>`, so handing the native
//! form to another owner is a reference-count bump rather than a copy.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::error::CodecError;

/// Element type of a numeric buffer.
///
/// Serialized with the wire constructor names (`"Float32Array"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementType {
    #[serde(rename = "Int8Array")]
    Int8,
    #[serde(rename = "Uint8Array")]
    Uint8,
    #[serde(rename = "Int16Array")]
    Int16,
    #[serde(rename = "Uint16Array")]
    Uint16,
    #[serde(rename = "Int32Array")]
    Int32,
    #[serde(rename = "Uint32Array")]
    Uint32,
    #[serde(rename = "Float32Array")]
    Float32,
    #[serde(rename = "Float64Array")]
    Float64,
}

impl ElementType {
    /// All element types, narrowest integers first.
    pub const ALL: [Self; 8] = [
        Self::Int8,
        Self::Uint8,
        Self::Int16,
        Self::Uint16,
        Self::Int32,
        Self::Uint32,
        Self::Float32,
        Self::Float64,
    ];

    /// Size of one element in bytes.
    pub fn width(self) -> usize {
        match self {
            Self::Int8 | Self::Uint8 => 1,
            Self::Int16 | Self::Uint16 => 2,
            Self::Int32 | Self::Uint32 | Self::Float32 => 4,
            Self::Float64 => 8,
        }
    }

    pub fn is_signed(self) -> bool {
        !matches!(self, Self::Uint8 | Self::Uint16 | Self::Uint32)
    }

    pub fn is_float(self) -> bool {
        matches!(self, Self::Float32 | Self::Float64)
    }

    /// Wire constructor name, e.g. `"Float32Array"`.
    pub fn ctor_name(self) -> &'static str {
        match self {
            Self::Int8 => "Int8Array",
            Self::Uint8 => "Uint8Array",
            Self::Int16 => "Int16Array",
            Self::Uint16 => "Uint16Array",
            Self::Int32 => "Int32Array",
            Self::Uint32 => "Uint32Array",
            Self::Float32 => "Float32Array",
            Self::Float64 => "Float64Array",
        }
    }

    /// Parse a wire constructor name.
    pub fn from_ctor_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|ty| ty.ctor_name() == name)
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.ctor_name())
    }
}

/// A fixed-element-type numeric buffer in native form.
#[derive(Clone, PartialEq)]
pub enum AttributeArray {
    Int8(Arc<[i8]>),
    Uint8(Arc<[u8]>),
    Int16(Arc<[i16]>),
    Uint16(Arc<[u16]>),
    Int32(Arc<[i32]>),
    Uint32(Arc<[u32]>),
    Float32(Arc<[f32]>),
    Float64(Arc<[f64]>),
}

macro_rules! each_array {
    ($array:expr, $values:ident => $body:expr) => {
        match $array {
            AttributeArray::Int8($values) => $body,
            AttributeArray::Uint8($values) => $body,
            AttributeArray::Int16($values) => $body,
            AttributeArray::Uint16($values) => $body,
            AttributeArray::Int32($values) => $body,
            AttributeArray::Uint32($values) => $body,
            AttributeArray::Float32($values) => $body,
            AttributeArray::Float64($values) => $body,
        }
    };
}

macro_rules! build_array {
    ($ty:expr, $convert:ident) => {
        match $ty {
            ElementType::Int8 => AttributeArray::Int8($convert!(i8)),
            ElementType::Uint8 => AttributeArray::Uint8($convert!(u8)),
            ElementType::Int16 => AttributeArray::Int16($convert!(i16)),
            ElementType::Uint16 => AttributeArray::Uint16($convert!(u16)),
            ElementType::Int32 => AttributeArray::Int32($convert!(i32)),
            ElementType::Uint32 => AttributeArray::Uint32($convert!(u32)),
            ElementType::Float32 => AttributeArray::Float32($convert!(f32)),
            ElementType::Float64 => AttributeArray::Float64($convert!(f64)),
        }
    };
}

impl AttributeArray {
    pub fn element_type(&self) -> ElementType {
        match self {
            Self::Int8(_) => ElementType::Int8,
            Self::Uint8(_) => ElementType::Uint8,
            Self::Int16(_) => ElementType::Int16,
            Self::Uint16(_) => ElementType::Uint16,
            Self::Int32(_) => ElementType::Int32,
            Self::Uint32(_) => ElementType::Uint32,
            Self::Float32(_) => ElementType::Float32,
            Self::Float64(_) => ElementType::Float64,
        }
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        each_array!(self, values => values.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn byte_len(&self) -> usize {
        self.len() * self.element_type().width()
    }

    /// Borrow the raw little-endian bytes of the buffer without copying.
    pub fn as_bytes(&self) -> &[u8] {
        each_array!(self, values => bytemuck::cast_slice(&values[..]))
    }

    /// Address of the shared allocation.
    ///
    /// Two arrays with the same identity and byte length are the same buffer.
    pub fn identity(&self) -> usize {
        self.as_bytes().as_ptr() as usize
    }

    /// Returns `true` if both arrays point at the same allocation.
    pub fn same_allocation(&self, other: &Self) -> bool {
        self.identity() == other.identity()
            && self.byte_len() == other.byte_len()
            && self.element_type() == other.element_type()
    }

    /// Element at `index`, widened to `f64`.
    pub fn get_f64(&self, index: usize) -> Option<f64> {
        each_array!(self, values => values.get(index).map(|&v| v as f64))
    }

    /// Copy the elements into a plain `f64` sequence.
    pub fn to_f64_vec(&self) -> Vec<f64> {
        each_array!(self, values => values.iter().map(|&v| v as f64).collect())
    }

    /// Build an array of the given element type from plain numbers.
    ///
    /// Values outside the element type's range saturate.
    pub fn from_f64(ty: ElementType, values: &[f64]) -> Self {
        macro_rules! convert {
            ($t:ty) => {
                values.iter().map(|&v| v as $t).collect()
            };
        }
        build_array!(ty, convert)
    }

    /// Reinterpret little-endian bytes as elements of `ty`.
    ///
    /// Copies once into an aligned allocation. Fails when `bytes` does not
    /// hold a whole number of elements.
    pub fn from_bytes(ty: ElementType, bytes: &[u8]) -> Result<Self, CodecError> {
        let width = ty.width();
        if bytes.len() % width != 0 {
            return Err(CodecError::PartialElement {
                byte_len: bytes.len(),
                width,
            });
        }
        macro_rules! convert {
            ($t:ty) => {
                Arc::from(bytemuck::pod_collect_to_vec::<u8, $t>(bytes))
            };
        }
        Ok(build_array!(ty, convert))
    }
}

impl fmt::Debug for AttributeArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(len={})", self.element_type(), self.len())
    }
}

macro_rules! impl_from_vec {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<Vec<$t>> for AttributeArray {
                fn from(values: Vec<$t>) -> Self {
                    Self::$variant(Arc::from(values))
                }
            }

            impl From<Arc<[$t]>> for AttributeArray {
                fn from(values: Arc<[$t]>) -> Self {
                    Self::$variant(values)
                }
            }
        )*
    };
}

impl_from_vec!(
    i8 => Int8,
    u8 => Uint8,
    i16 => Int16,
    u16 => Uint16,
    i32 => Int32,
    u32 => Uint32,
    f32 => Float32,
    f64 => Float64,
);
