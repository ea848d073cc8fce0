//! Sample scenes for the `demo` command and tests.

use std::f32::consts::TAU;
use std::sync::Arc;

use nodist_core::codec::CodecError;
use nodist_core::scene::{
    AttributeBuffer, Geometry, Material, NodeKind, NodeTransform, PropertyValue, SceneNode,
};

/// Flat disc with `vertices` rim points around a center, drawn as a fan.
pub fn disc_geometry(vertices: usize) -> Result<Geometry, CodecError> {
    let rim = vertices.max(3);
    let mut position = vec![0.0f32, 0.0, 0.0];
    let mut uv = vec![0.5f32, 0.5];
    for i in 0..rim {
        let angle = TAU * i as f32 / rim as f32;
        let (sin, cos) = angle.sin_cos();
        position.extend([cos, sin, 0.0]);
        uv.extend([0.5 + cos * 0.5, 0.5 + sin * 0.5]);
    }
    let normal: Vec<f32> = [0.0, 0.0, 1.0].repeat(rim + 1);
    let index: Vec<u32> = (0..rim as u32)
        .flat_map(|i| [0, i + 1, (i + 1) % rim as u32 + 1])
        .collect();

    Ok(Geometry::new("BufferGeometry")
        .with_name("disc")
        .with_attribute("position", AttributeBuffer::new(position, 3)?)
        .with_attribute("normal", AttributeBuffer::new(normal, 3)?)
        .with_attribute("uv", AttributeBuffer::new(uv, 2)?)
        .with_index(AttributeBuffer::new(index, 1)?))
}

/// A scene where `meshes` nodes share one geometry and one material, plus
/// a light and a camera.
pub fn demo_scene(meshes: usize, vertices: usize) -> Result<SceneNode, CodecError> {
    let geometry = Arc::new(disc_geometry(vertices)?);
    let material = Arc::new(
        Material::new("MeshStandardMaterial")
            .with_name("shared")
            .with_property("color", [0.8f32, 0.3, 0.2])
            .with_property("roughness", 0.6)
            .with_property("metalness", 0.1),
    );

    let columns = (meshes as f32).sqrt().ceil().max(1.0) as usize;
    let grid = (0..meshes)
        .map(|i| {
            let (x, y) = ((i % columns) as f32 * 2.5, (i / columns) as f32 * 2.5);
            SceneNode::mesh(Arc::clone(&geometry), Arc::clone(&material))
                .with_name(format!("disc-{i}"))
                .with_transform(NodeTransform::IDENTITY.with_translation([x, y, 0.0]))
        })
        .collect();

    Ok(SceneNode::scene()
        .with_name("demo")
        .with_child(
            SceneNode::new(NodeKind::DirectionalLight)
                .with_name("sun")
                .with_property("color", PropertyValue::Color([1.0, 1.0, 1.0]))
                .with_property("intensity", PropertyValue::Number(3.0))
                .with_transform(NodeTransform::IDENTITY.with_translation([5.0, 10.0, 7.5])),
        )
        .with_child(
            SceneNode::new(NodeKind::PerspectiveCamera)
                .with_name("camera")
                .with_property("fov", PropertyValue::Number(50.0))
                .with_transform(NodeTransform::IDENTITY.with_translation([0.0, 0.0, 20.0])),
        )
        .with_child(SceneNode::group().with_name("discs").with_children(grid)))
}
