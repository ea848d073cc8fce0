//! Wire record to scene graph.

use std::sync::Arc;

use crate::codec::{self, TransferList};
use crate::record::{self, AttributeRecord, GeometryRecord, MaterialRecord, NodeRecord, WireRecord};
use crate::resource::ResourceTable;
use crate::scene::{AttributeBuffer, Geometry, Material, SceneNode};

use super::error::DeserializeError;

/// Rebuild a scene graph from `record`.
///
/// Runs in two passes. The first turns every geometry and material record
/// into one shared instance. The second rebuilds nodes top-down and
/// resolves their resource ids against those instances, so nodes that
/// shared a resource before serialization share it again.
///
/// `transfers` backs any descriptors left in the record. Attributes that
/// already hold native buffers (for example after
/// [`decode_text`](crate::record::decode_text)) are taken as they are.
pub fn deserialize(
    record: &WireRecord,
    transfers: &TransferList,
) -> Result<SceneNode, DeserializeError> {
    record::check_version(record.metadata.version)?;

    let mut geometries = ResourceTable::<Geometry>::new();
    for geometry in &record.geometries {
        geometries.insert(geometry.id, Arc::new(read_geometry(geometry, transfers)?))?;
    }
    let mut materials = ResourceTable::<Material>::new();
    for material in &record.materials {
        materials.insert(material.id, Arc::new(read_material(material)))?;
    }

    let root = read_node(&record.object, &geometries, &materials)?;
    log::debug!(
        "deserialized {} nodes, {} geometries, {} materials",
        root.node_count(),
        geometries.len(),
        materials.len()
    );
    Ok(root)
}

fn read_geometry(
    record: &GeometryRecord,
    transfers: &TransferList,
) -> Result<Geometry, DeserializeError> {
    let mut geometry = Geometry::new(record.kind.clone()).with_uuid(record.uuid.clone());
    geometry.name = record.name.clone();
    for (name, attribute) in &record.data.attributes {
        let buffer = read_attribute(attribute, transfers).map_err(|source| {
            DeserializeError::Codec {
                geometry: record.uuid.clone(),
                attribute: name.clone(),
                source,
            }
        })?;
        geometry.attributes.insert(name.clone(), buffer);
    }
    if let Some(index) = &record.data.index {
        let buffer =
            read_attribute(index, transfers).map_err(|source| DeserializeError::Codec {
                geometry: record.uuid.clone(),
                attribute: "index".to_owned(),
                source,
            })?;
        geometry.index = Some(buffer);
    }
    Ok(geometry)
}

fn read_attribute(
    record: &AttributeRecord,
    transfers: &TransferList,
) -> Result<AttributeBuffer, codec::CodecError> {
    let array = codec::decode(&record.array, record.element_type, transfers)?;
    Ok(AttributeBuffer::new(array, record.item_size)?.with_normalized(record.normalized))
}

fn read_material(record: &MaterialRecord) -> Material {
    let mut material = Material::new(record.kind.clone()).with_uuid(record.uuid.clone());
    material.name = record.name.clone();
    material.properties = record.properties.clone();
    material
}

fn read_node(
    record: &NodeRecord,
    geometries: &ResourceTable<Geometry>,
    materials: &ResourceTable<Material>,
) -> Result<SceneNode, DeserializeError> {
    let mut node = SceneNode::new(record.kind)
        .with_uuid(record.uuid.clone())
        .with_transform(record.transform)
        .with_visible(record.visible);
    node.name = record.name.clone();
    node.properties = record.properties.clone();
    node.geometry = record.geometry.map(|id| geometries.resolve(id)).transpose()?;
    node.material = record.material.map(|id| materials.resolve(id)).transpose()?;
    node.children = record
        .children
        .iter()
        .map(|child| read_node(child, geometries, materials))
        .collect::<Result<_, _>>()?;
    Ok(node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{AttributeArray, CodecError, CodecPolicy, ElementType, WireBuffer};
    use crate::resource::{DanglingReference, ResourceId, ResourceKind};
    use crate::scene::NodeKind;
    use crate::serialize::serialize;

    fn mesh_record(geometry: Option<u32>, material: Option<u32>) -> WireRecord {
        let mut mesh = NodeRecord::new("mesh", NodeKind::Mesh);
        mesh.geometry = geometry.map(ResourceId);
        mesh.material = material.map(ResourceId);
        let mut root = NodeRecord::new("root", NodeKind::Scene);
        root.children.push(mesh);
        WireRecord::new(root)
    }

    fn position_record(array: WireBuffer, item_size: usize) -> GeometryRecord {
        let mut data = crate::record::GeometryData::default();
        data.attributes.insert(
            "position".to_owned(),
            AttributeRecord {
                item_size,
                element_type: ElementType::Float32,
                array,
                normalized: false,
            },
        );
        GeometryRecord {
            id: ResourceId(0),
            uuid: "geo".into(),
            kind: "BufferGeometry".into(),
            name: None,
            data,
        }
    }

    #[test]
    fn dangling_geometry_id_fails() {
        let record = mesh_record(Some(2), None);
        let err = deserialize(&record, &TransferList::new()).unwrap_err();
        match err {
            DeserializeError::DanglingReference(DanglingReference { kind, id }) => {
                assert_eq!(kind, ResourceKind::Geometry);
                assert_eq!(id, ResourceId(2));
            }
            other => panic!("expected dangling reference, got {other:?}"),
        }
    }

    #[test]
    fn newer_version_fails() {
        let mut record = mesh_record(None, None);
        record.metadata.version = 2;
        assert!(matches!(
            deserialize(&record, &TransferList::new()),
            Err(DeserializeError::UnsupportedVersion { found: 2, .. })
        ));
    }

    #[test]
    fn duplicate_resource_id_is_malformed() {
        let mut record = mesh_record(Some(0), None);
        let geometry = position_record(WireBuffer::Plain(vec![0.0; 3]), 3);
        record.geometries.push(geometry.clone());
        record.geometries.push(geometry);
        let err = deserialize(&record, &TransferList::new()).unwrap_err();
        assert!(err.is_malformed(), "{err}");
    }

    #[test]
    fn stride_violation_is_reported_per_attribute() {
        let mut record = mesh_record(Some(0), None);
        record
            .geometries
            .push(position_record(WireBuffer::Plain(vec![0.0; 8]), 3));
        match deserialize(&record, &TransferList::new()).unwrap_err() {
            DeserializeError::Codec {
                attribute, source, ..
            } => {
                assert_eq!(attribute, "position");
                assert_eq!(
                    source,
                    CodecError::StrideMismatch {
                        len: 8,
                        item_size: 3
                    }
                );
            }
            other => panic!("expected codec error, got {other:?}"),
        }
    }

    #[test]
    fn native_and_plain_inputs_decode_alike() {
        let values = vec![0.0f32, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0];
        let native = AttributeArray::from(values.clone());
        let plain = WireBuffer::Plain(values.iter().map(|&v| v as f64).collect());

        for array in [WireBuffer::Native(native.clone()), plain] {
            let mut record = mesh_record(Some(0), None);
            record.geometries.push(position_record(array, 3));
            let root = deserialize(&record, &TransferList::new()).unwrap();
            let geometry = root.children[0].geometry.as_ref().unwrap();
            let position = geometry.attribute("position").unwrap();
            assert_eq!(position.len(), 9);
            assert_eq!(position.item_size(), 3);
            assert_eq!(position.array(), &native);
        }
    }

    #[test]
    fn sharing_is_restored() {
        let geometry = Arc::new(
            Geometry::new("BufferGeometry").with_attribute(
                "position",
                AttributeBuffer::new(vec![0.0f32; 6], 3).unwrap(),
            ),
        );
        let a = Arc::new(Material::new("MeshBasicMaterial"));
        let b = Arc::new(Material::new("MeshBasicMaterial"));
        let root = SceneNode::scene()
            .with_child(SceneNode::mesh(Arc::clone(&geometry), Arc::clone(&a)))
            .with_child(SceneNode::mesh(Arc::clone(&geometry), b));

        let out = serialize(&root, &CodecPolicy::default()).unwrap();
        let back = deserialize(&out.record, &out.transfers).unwrap();

        let g0 = back.children[0].geometry.as_ref().unwrap();
        let g1 = back.children[1].geometry.as_ref().unwrap();
        assert!(Arc::ptr_eq(g0, g1));
        let m0 = back.children[0].material.as_ref().unwrap();
        let m1 = back.children[1].material.as_ref().unwrap();
        assert!(!Arc::ptr_eq(m0, m1));
        assert_eq!(back.children[0].uuid, root.children[0].uuid);
    }
}
