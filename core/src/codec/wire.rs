//! Wire forms of a numeric buffer and the out-of-band buffer list.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::array::{AttributeArray, ElementType};

/// Wire form of an attribute's `array` field.
///
/// In text, `Plain` is a JSON array of numbers and `Descriptor` is an
/// object tagged `"__type": "TypedArray"`. `Native` only exists in memory:
/// it is what a consumer that already holds typed data passes around, and it
/// must be lowered before the record is written as text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireBuffer {
    #[serde(deserialize_with = "super::nullable::f64_seq")]
    Plain(Vec<f64>),
    Descriptor(BufferDescriptor),
    #[serde(skip)]
    Native(AttributeArray),
}

impl WireBuffer {
    /// Number of elements this wire buffer describes.
    pub fn len(&self) -> usize {
        match self {
            Self::Plain(values) => values.len(),
            Self::Descriptor(desc) => desc.length,
            Self::Native(array) => array.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_native(&self) -> bool {
        matches!(self, Self::Native(_))
    }
}

impl From<AttributeArray> for WireBuffer {
    fn from(array: AttributeArray) -> Self {
        Self::Native(array)
    }
}

/// Tag value of a buffer descriptor object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DescriptorTag {
    TypedArray,
}

/// Reference to a raw buffer carried outside the text record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BufferDescriptor {
    #[serde(rename = "__type")]
    pub tag: DescriptorTag,
    /// Index into the accompanying [`TransferList`].
    pub id: usize,
    /// Element type constructor name. Unknown names decode as `Float32Array`.
    #[serde(alias = "elementType")]
    pub ctor: String,
    #[serde(default)]
    pub byte_offset: usize,
    /// Number of elements.
    pub length: usize,
}

impl BufferDescriptor {
    pub fn new(id: usize, ty: ElementType, byte_offset: usize, length: usize) -> Self {
        Self {
            tag: DescriptorTag::TypedArray,
            id,
            ctor: ty.ctor_name().to_owned(),
            byte_offset,
            length,
        }
    }
}

/// Ordered list of raw buffers travelling beside a text record.
///
/// Pushing the same allocation twice returns the slot of the first push, so
/// attributes that share a buffer move it once.
#[derive(Debug, Clone, Default)]
pub struct TransferList {
    buffers: Vec<AttributeArray>,
    slots: HashMap<(usize, usize), usize>,
}

impl TransferList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a list from buffers in slot order (e.g. read back from storage).
    pub fn from_buffers(buffers: Vec<AttributeArray>) -> Self {
        let mut slots = HashMap::new();
        for (index, buffer) in buffers.iter().enumerate() {
            slots
                .entry((buffer.identity(), buffer.byte_len()))
                .or_insert(index);
        }
        Self { buffers, slots }
    }

    /// Append `array`, or return the slot it already occupies.
    pub fn push(&mut self, array: &AttributeArray) -> usize {
        let key = (array.identity(), array.byte_len());
        if let Some(&slot) = self.slots.get(&key)
            && self.buffers[slot].same_allocation(array)
        {
            return slot;
        }
        let slot = self.buffers.len();
        self.buffers.push(array.clone());
        self.slots.insert(key, slot);
        slot
    }

    pub fn get(&self, slot: usize) -> Option<&AttributeArray> {
        self.buffers.get(slot)
    }

    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AttributeArray> {
        self.buffers.iter()
    }

    /// Total bytes across all slots, counting repeated allocations once.
    pub fn unique_byte_len(&self) -> usize {
        let mut seen = std::collections::HashSet::new();
        self.buffers
            .iter()
            .filter(|b| seen.insert((b.identity(), b.byte_len())))
            .map(AttributeArray::byte_len)
            .sum()
    }

    pub fn into_buffers(self) -> Vec<AttributeArray> {
        self.buffers
    }
}
