//! Wire record data structures.
//!
//! A [`WireRecord`] is the transmittable form of a scene graph: a header,
//! one record per distinct geometry and material, and a single root
//! [`NodeRecord`] whose resource fields are ids into those lists.

use std::collections::HashSet;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::codec::{ElementType, WireBuffer};
use crate::resource::ResourceId;
use crate::scene::{NodeKind, NodeTransform, PropertyValue};

/// Newest record version this crate reads and the version it writes.
pub const FORMAT_VERSION: u32 = 1;

/// Generator tag written into record headers.
pub const GENERATOR: &str = "nodist-core";

/// Record header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordMetadata {
    pub version: u32,
    #[serde(rename = "type")]
    pub kind: String,
    pub generator: String,
}

impl Default for RecordMetadata {
    fn default() -> Self {
        Self {
            version: FORMAT_VERSION,
            kind: "Object".to_owned(),
            generator: GENERATOR.to_owned(),
        }
    }
}

/// Just the header of a record, read before committing to a full parse.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RecordHeader {
    pub metadata: RecordMetadata,
}

/// Serialized scene graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireRecord {
    pub metadata: RecordMetadata,
    #[serde(default)]
    pub geometries: Vec<GeometryRecord>,
    #[serde(default)]
    pub materials: Vec<MaterialRecord>,
    /// Root node.
    pub object: NodeRecord,
}

/// One attribute buffer with its layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeRecord {
    pub item_size: usize,
    #[serde(rename = "type")]
    pub element_type: ElementType,
    pub array: WireBuffer,
    #[serde(default)]
    pub normalized: bool,
}

/// Buffers of one geometry.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GeometryData {
    #[serde(default)]
    pub attributes: IndexMap<String, AttributeRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<AttributeRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometryRecord {
    pub id: ResourceId,
    pub uuid: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub data: GeometryData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialRecord {
    pub id: ResourceId,
    pub uuid: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub properties: IndexMap<String, PropertyValue>,
}

fn default_visible() -> bool {
    true
}

fn is_true(v: &bool) -> bool {
    *v
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub uuid: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub transform: NodeTransform,
    #[serde(default = "default_visible", skip_serializing_if = "is_true")]
    pub visible: bool,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub properties: IndexMap<String, PropertyValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry: Option<ResourceId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material: Option<ResourceId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeRecord>,
}

impl NodeRecord {
    pub fn new(uuid: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            uuid: uuid.into(),
            kind,
            name: None,
            transform: NodeTransform::IDENTITY,
            visible: true,
            properties: IndexMap::new(),
            geometry: None,
            material: None,
            children: Vec::new(),
        }
    }
}

/// Pre-order iterator over the node records of a record.
pub struct PreorderNodes<'a> {
    stack: Vec<&'a NodeRecord>,
}

impl<'a> Iterator for PreorderNodes<'a> {
    type Item = &'a NodeRecord;

    fn next(&mut self) -> Option<&'a NodeRecord> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

impl WireRecord {
    /// Record with the current header and no shared resources.
    pub fn new(object: NodeRecord) -> Self {
        Self {
            metadata: RecordMetadata::default(),
            geometries: Vec::new(),
            materials: Vec::new(),
            object,
        }
    }

    /// Node records in emission order: every parent precedes its children.
    pub fn nodes_preorder(&self) -> PreorderNodes<'_> {
        PreorderNodes {
            stack: vec![&self.object],
        }
    }

    pub fn geometry(&self, id: ResourceId) -> Option<&GeometryRecord> {
        self.geometries.iter().find(|g| g.id == id)
    }

    pub fn material(&self, id: ResourceId) -> Option<&MaterialRecord> {
        self.materials.iter().find(|m| m.id == id)
    }

    /// Returns `true` if any attribute still holds a native buffer.
    pub fn has_native_buffers(&self) -> bool {
        self.geometries.iter().any(|g| {
            g.data.attributes.values().any(|a| a.array.is_native())
                || g.data.index.as_ref().is_some_and(|a| a.array.is_native())
        })
    }

    /// Ids referenced by nodes that no geometry or material record defines.
    ///
    /// Empty for every record produced by the serializer.
    pub fn dangling_ids(&self) -> Vec<ResourceId> {
        let geometries: HashSet<_> = self.geometries.iter().map(|g| g.id).collect();
        let materials: HashSet<_> = self.materials.iter().map(|m| m.id).collect();
        let mut dangling = Vec::new();
        for node in self.nodes_preorder() {
            if let Some(id) = node.geometry
                && !geometries.contains(&id)
            {
                dangling.push(id);
            }
            if let Some(id) = node.material
                && !materials.contains(&id)
            {
                dangling.push(id);
            }
        }
        dangling
    }

    /// Apply `f` to every attribute record, including index buffers.
    ///
    /// `f` receives the owning geometry's uuid and the attribute name
    /// (`"index"` for index buffers).
    pub fn try_for_each_attribute_mut<E>(
        &mut self,
        mut f: impl FnMut(&str, &str, &mut AttributeRecord) -> Result<(), E>,
    ) -> Result<(), E> {
        for geometry in &mut self.geometries {
            for (name, attribute) in &mut geometry.data.attributes {
                f(&geometry.uuid, name, attribute)?;
            }
            if let Some(index) = &mut geometry.data.index {
                f(&geometry.uuid, "index", index)?;
            }
        }
        Ok(())
    }
}
