//! Scene graph types.
//!
//! - [`SceneNode`]: A node in the scene tree; owns its children
//! - [`NodeKind`] / [`NodeTransform`]: Node type tag and TRS transform
//! - [`Geometry`] / [`Material`]: Resources shared between nodes via `Arc`
//! - [`AttributeBuffer`]: Typed vertex data with item layout
//! - [`PropertyValue`]: Scalar/color values of materials and nodes

mod node;
mod resources;

pub use node::{NodeKind, NodeTransform, SceneNode};
pub use resources::{AttributeBuffer, Geometry, Material, PropertyValue};

/// Generate a fresh stable identity.
pub(crate) fn new_uuid() -> String {
    uuid::Uuid::new_v4().to_string()
}
