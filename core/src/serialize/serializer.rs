//! Scene graph to wire record.

use std::collections::HashSet;
use std::sync::Arc;

use crate::codec::{self, CodecPolicy, TransferList};
use crate::record::{
    AttributeRecord, GeometryData, GeometryRecord, MaterialRecord, NodeRecord, WireRecord,
};
use crate::resource::{ResourceId, ResourceTable};
use crate::scene::{AttributeBuffer, Geometry, Material, SceneNode};

use super::error::SerializeError;

/// Output of [`serialize`].
///
/// With [`Transport::Transfer`](crate::codec::Transport::Transfer), large
/// buffers are replaced in the record by descriptors indexing `transfers`.
/// With [`Transport::Shared`](crate::codec::Transport::Shared) they stay
/// native and `transfers` is empty.
#[derive(Debug, Clone)]
pub struct SerializedScene {
    pub record: WireRecord,
    pub transfers: TransferList,
}

/// Serialize the graph rooted at `root`.
///
/// Nodes are visited depth-first in pre-order. A node's geometry and
/// material are interned before its record is built, so each distinct
/// resource instance is emitted exactly once, ahead of the first node that
/// references it. The source graph is not modified.
pub fn serialize(root: &SceneNode, policy: &CodecPolicy) -> Result<SerializedScene, SerializeError> {
    let mut ctx = SerializeContext::new(policy);
    let object = ctx.write_node(root)?;
    let SerializeContext {
        transfers,
        geometry_records,
        material_records,
        visited,
        ..
    } = ctx;

    log::debug!(
        "serialized {} nodes, {} geometries, {} materials, {} out-of-band buffers",
        visited.len(),
        geometry_records.len(),
        material_records.len(),
        transfers.len()
    );

    let mut record = WireRecord::new(object);
    record.geometries = geometry_records;
    record.materials = material_records;
    Ok(SerializedScene { record, transfers })
}

struct SerializeContext<'p> {
    policy: &'p CodecPolicy,
    transfers: TransferList,
    geometries: ResourceTable<Geometry>,
    materials: ResourceTable<Material>,
    geometry_records: Vec<GeometryRecord>,
    material_records: Vec<MaterialRecord>,
    visited: HashSet<String>,
}

impl<'p> SerializeContext<'p> {
    fn new(policy: &'p CodecPolicy) -> Self {
        Self {
            policy,
            transfers: TransferList::new(),
            geometries: ResourceTable::new(),
            materials: ResourceTable::new(),
            geometry_records: Vec::new(),
            material_records: Vec::new(),
            visited: HashSet::new(),
        }
    }

    fn write_node(&mut self, node: &SceneNode) -> Result<NodeRecord, SerializeError> {
        if !self.visited.insert(node.uuid.clone()) {
            return Err(SerializeError::CyclicGraph {
                node: node.uuid.clone(),
            });
        }

        let geometry = node.geometry.as_ref().map(|g| self.write_geometry(g));
        let material = node.material.as_ref().map(|m| self.write_material(m));

        let mut record = NodeRecord::new(node.uuid.clone(), node.kind);
        record.name = node.name.clone();
        record.transform = node.transform;
        record.visible = node.visible;
        record.properties = node.properties.clone();
        record.geometry = geometry;
        record.material = material;
        record.children = node
            .children
            .iter()
            .map(|child| self.write_node(child))
            .collect::<Result<_, _>>()?;
        Ok(record)
    }

    fn write_geometry(&mut self, geometry: &Arc<Geometry>) -> ResourceId {
        let interned = self.geometries.intern(geometry);
        if interned.is_new {
            let attributes = geometry
                .attributes
                .iter()
                .map(|(name, buffer)| (name.clone(), self.write_attribute(buffer)))
                .collect();
            let index = geometry.index.as_ref().map(|b| self.write_attribute(b));
            self.geometry_records.push(GeometryRecord {
                id: interned.id,
                uuid: geometry.uuid.clone(),
                kind: geometry.kind.clone(),
                name: geometry.name.clone(),
                data: GeometryData { attributes, index },
            });
        }
        interned.id
    }

    fn write_material(&mut self, material: &Arc<Material>) -> ResourceId {
        let interned = self.materials.intern(material);
        if interned.is_new {
            self.material_records.push(MaterialRecord {
                id: interned.id,
                uuid: material.uuid.clone(),
                kind: material.kind.clone(),
                name: material.name.clone(),
                properties: material.properties.clone(),
            });
        }
        interned.id
    }

    fn write_attribute(&mut self, buffer: &AttributeBuffer) -> AttributeRecord {
        AttributeRecord {
            item_size: buffer.item_size(),
            element_type: buffer.element_type(),
            array: codec::encode(buffer.array(), self.policy, &mut self.transfers),
            normalized: buffer.normalized(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{AttributeArray, WireBuffer};
    use crate::scene::NodeKind;

    fn geometry(len: usize) -> Arc<Geometry> {
        let position = AttributeBuffer::new(vec![1.0f32; len], 3).unwrap();
        Arc::new(Geometry::new("BufferGeometry").with_attribute("position", position))
    }

    #[test]
    fn shared_geometry_is_emitted_once() {
        let geo = geometry(9);
        let mat = Arc::new(Material::new("MeshBasicMaterial"));
        let root = SceneNode::scene().with_children(
            (0..5)
                .map(|_| SceneNode::mesh(Arc::clone(&geo), Arc::clone(&mat)))
                .collect(),
        );

        let out = serialize(&root, &CodecPolicy::default()).unwrap();
        assert_eq!(out.record.geometries.len(), 1);
        assert_eq!(out.record.materials.len(), 1);
        let id = out.record.geometries[0].id;
        let refs = out
            .record
            .nodes_preorder()
            .filter(|n| n.geometry == Some(id))
            .count();
        assert_eq!(refs, 5);
    }

    #[test]
    fn equal_but_distinct_geometries_are_emitted_separately() {
        let root = SceneNode::scene()
            .with_child(SceneNode::mesh(
                geometry(9),
                Arc::new(Material::new("MeshBasicMaterial")),
            ))
            .with_child(SceneNode::mesh(
                geometry(9),
                Arc::new(Material::new("MeshBasicMaterial")),
            ));
        let out = serialize(&root, &CodecPolicy::default()).unwrap();
        assert_eq!(out.record.geometries.len(), 2);
        assert_eq!(out.record.materials.len(), 2);
    }

    #[test]
    fn emission_order_is_preorder() {
        let root = SceneNode::scene().with_uuid("s").with_children(vec![
            SceneNode::group()
                .with_uuid("g")
                .with_child(SceneNode::new(NodeKind::PointLight).with_uuid("l")),
            SceneNode::new(NodeKind::PerspectiveCamera).with_uuid("c"),
        ]);
        let out = serialize(&root, &CodecPolicy::default()).unwrap();
        let order: Vec<_> = out
            .record
            .nodes_preorder()
            .map(|n| n.uuid.as_str())
            .collect();
        assert_eq!(order, ["s", "g", "l", "c"]);
    }

    #[test]
    fn repeated_node_identity_is_cyclic() {
        let child = SceneNode::group().with_uuid("dup");
        let root = SceneNode::scene()
            .with_child(child.clone())
            .with_child(SceneNode::group().with_child(child));
        let err = serialize(&root, &CodecPolicy::default()).unwrap_err();
        assert!(matches!(err, SerializeError::CyclicGraph { node } if node == "dup"));
    }

    #[test]
    fn transport_selects_buffer_form() {
        let root = SceneNode::scene().with_child(SceneNode::mesh(
            geometry(3000),
            Arc::new(Material::new("PointsMaterial")),
        ));

        let transfer = serialize(&root, &CodecPolicy::transfer()).unwrap();
        let array = &transfer.record.geometries[0].data.attributes["position"].array;
        assert!(matches!(array, WireBuffer::Descriptor(_)));
        assert_eq!(transfer.transfers.len(), 1);

        let shared = serialize(&root, &CodecPolicy::shared()).unwrap();
        let array = &shared.record.geometries[0].data.attributes["position"].array;
        let source = root.children[0].geometry.as_ref().unwrap().attributes["position"].array();
        match array {
            WireBuffer::Native(native) => assert!(native.same_allocation(source)),
            other => panic!("expected native, got {other:?}"),
        }
        assert!(shared.transfers.is_empty());
    }

    #[test]
    fn attributes_sharing_one_allocation_transfer_once() {
        let data = AttributeArray::from(vec![0.5f32; 900]);
        let geometry = Geometry::new("BufferGeometry")
            .with_attribute("position", AttributeBuffer::new(data.clone(), 3).unwrap())
            .with_attribute("normal", AttributeBuffer::new(data, 3).unwrap());
        let root = SceneNode::mesh(
            Arc::new(geometry),
            Arc::new(Material::new("MeshNormalMaterial")),
        );
        let out = serialize(&root, &CodecPolicy::transfer()).unwrap();
        assert_eq!(out.transfers.len(), 1);
    }
}
