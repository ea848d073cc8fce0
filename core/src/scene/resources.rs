//! Shared scene resources: geometries, materials and their values.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::codec::{AttributeArray, CodecError, ElementType, nullable};

/// A numeric attribute buffer with its item layout.
///
/// The buffer length is always a multiple of `item_size`.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeBuffer {
    array: AttributeArray,
    item_size: usize,
    normalized: bool,
}

impl AttributeBuffer {
    /// Wrap `array` as items of `item_size` elements each.
    pub fn new(array: impl Into<AttributeArray>, item_size: usize) -> Result<Self, CodecError> {
        let array = array.into();
        if item_size == 0 {
            return Err(CodecError::ZeroItemSize);
        }
        if array.len() % item_size != 0 {
            return Err(CodecError::StrideMismatch {
                len: array.len(),
                item_size,
            });
        }
        Ok(Self {
            array,
            item_size,
            normalized: false,
        })
    }

    #[must_use]
    pub fn with_normalized(mut self, normalized: bool) -> Self {
        self.normalized = normalized;
        self
    }

    pub fn array(&self) -> &AttributeArray {
        &self.array
    }

    pub fn element_type(&self) -> ElementType {
        self.array.element_type()
    }

    /// Elements per logical item (e.g. 3 for a position).
    pub fn item_size(&self) -> usize {
        self.item_size
    }

    pub fn normalized(&self) -> bool {
        self.normalized
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.array.len()
    }

    pub fn is_empty(&self) -> bool {
        self.array.is_empty()
    }

    /// Number of logical items.
    pub fn count(&self) -> usize {
        self.array.len() / self.item_size
    }
}

/// A scalar or color value of a material or node property.
///
/// Untagged in text: booleans, numbers, strings, and 3- or 4-element
/// number arrays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Bool(bool),
    #[serde(deserialize_with = "nullable::f64_value")]
    Number(f64),
    #[serde(deserialize_with = "nullable::f32_array")]
    Color([f32; 3]),
    #[serde(deserialize_with = "nullable::f32_array")]
    Vec4([f32; 4]),
    Text(String),
}

impl From<bool> for PropertyValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<f64> for PropertyValue {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<f32> for PropertyValue {
    fn from(v: f32) -> Self {
        Self::Number(v as f64)
    }
}

impl From<[f32; 3]> for PropertyValue {
    fn from(v: [f32; 3]) -> Self {
        Self::Color(v)
    }
}

impl From<[f32; 4]> for PropertyValue {
    fn from(v: [f32; 4]) -> Self {
        Self::Vec4(v)
    }
}

impl From<&str> for PropertyValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_owned())
    }
}

/// Vertex data shared by any number of drawable nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    /// Stable identity, preserved across serialization.
    pub uuid: String,
    pub name: Option<String>,
    /// Geometry type tag, e.g. `"BufferGeometry"` or `"BoxGeometry"`.
    pub kind: String,
    /// Attribute buffers in insertion order (`position`, `normal`, ...).
    pub attributes: IndexMap<String, AttributeBuffer>,
    /// Optional index buffer for indexed drawing.
    pub index: Option<AttributeBuffer>,
}

impl Geometry {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            uuid: super::new_uuid(),
            name: None,
            kind: kind.into(),
            attributes: IndexMap::new(),
            index: None,
        }
    }

    #[must_use]
    pub fn with_uuid(mut self, uuid: impl Into<String>) -> Self {
        self.uuid = uuid.into();
        self
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, buffer: AttributeBuffer) -> Self {
        self.attributes.insert(name.into(), buffer);
        self
    }

    #[must_use]
    pub fn with_index(mut self, index: AttributeBuffer) -> Self {
        self.index = Some(index);
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeBuffer> {
        self.attributes.get(name)
    }

    /// Number of vertices, taken from the `position` attribute.
    pub fn vertex_count(&self) -> usize {
        self.attribute("position").map_or(0, AttributeBuffer::count)
    }
}

/// Surface appearance shared by any number of drawable nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    /// Stable identity, preserved across serialization.
    pub uuid: String,
    pub name: Option<String>,
    /// Material type tag, e.g. `"MeshStandardMaterial"`.
    pub kind: String,
    pub properties: IndexMap<String, PropertyValue>,
}

impl Material {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            uuid: super::new_uuid(),
            name: None,
            kind: kind.into(),
            properties: IndexMap::new(),
        }
    }

    #[must_use]
    pub fn with_uuid(mut self, uuid: impl Into<String>) -> Self {
        self.uuid = uuid.into();
        self
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    pub fn property(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attribute_buffer_enforces_stride() {
        let ok = AttributeBuffer::new(vec![0.0f32; 9], 3).unwrap();
        assert_eq!(ok.count(), 3);
        assert_eq!(ok.len(), 9);

        assert_eq!(
            AttributeBuffer::new(vec![0.0f32; 8], 3).unwrap_err(),
            CodecError::StrideMismatch {
                len: 8,
                item_size: 3
            }
        );
        assert_eq!(
            AttributeBuffer::new(vec![0u16; 3], 0).unwrap_err(),
            CodecError::ZeroItemSize
        );
    }

    #[test]
    fn property_values_parse_untagged() {
        let values: Vec<PropertyValue> =
            serde_json::from_str(r#"[true, 0.5, [1, 0, 0], [0, 0, 0, 1], "basic"]"#).unwrap();
        assert_eq!(
            values,
            vec![
                PropertyValue::Bool(true),
                PropertyValue::Number(0.5),
                PropertyValue::Color([1.0, 0.0, 0.0]),
                PropertyValue::Vec4([0.0, 0.0, 0.0, 1.0]),
                PropertyValue::Text("basic".into()),
            ]
        );
    }

    #[test]
    fn geometry_vertex_count_uses_position() {
        let geometry = Geometry::new("BufferGeometry")
            .with_attribute(
                "position",
                AttributeBuffer::new(vec![0.0f32; 12], 3).unwrap(),
            )
            .with_attribute("uv", AttributeBuffer::new(vec![0.0f32; 8], 2).unwrap());
        assert_eq!(geometry.vertex_count(), 4);
        assert_eq!(Geometry::new("BufferGeometry").vertex_count(), 0);
    }

    #[test]
    fn material_properties_keep_insertion_order() {
        let material = Material::new("MeshStandardMaterial")
            .with_property("color", [1.0f32, 0.5, 0.0])
            .with_property("roughness", 0.4f32)
            .with_property("transparent", false);
        let keys: Vec<_> = material.properties.keys().map(String::as_str).collect();
        assert_eq!(keys, ["color", "roughness", "transparent"]);
        assert_eq!(
            material.property("roughness"),
            Some(&PropertyValue::Number(0.4f32 as f64))
        );
    }
}
