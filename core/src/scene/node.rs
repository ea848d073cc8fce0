//! Scene graph node types.
//!
//! Transforms use plain arrays (`[f32; 3]`, `[f32; 4]`) so the core crate
//! stays free of math-library types.

use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::codec::nullable;

use super::resources::{Geometry, Material, PropertyValue};

/// Node transform decomposed into translation, rotation, and scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NodeTransform {
    /// Translation [x, y, z].
    #[serde(deserialize_with = "nullable::f32_array")]
    pub translation: [f32; 3],
    /// Rotation quaternion [x, y, z, w].
    #[serde(deserialize_with = "nullable::f32_array")]
    pub rotation: [f32; 4],
    /// Scale [x, y, z].
    #[serde(deserialize_with = "nullable::f32_array")]
    pub scale: [f32; 3],
}

impl NodeTransform {
    /// Identity transform: no translation, identity rotation, unit scale.
    pub const IDENTITY: Self = Self {
        translation: [0.0, 0.0, 0.0],
        rotation: [0.0, 0.0, 0.0, 1.0],
        scale: [1.0, 1.0, 1.0],
    };

    #[must_use]
    pub const fn with_translation(mut self, translation: [f32; 3]) -> Self {
        self.translation = translation;
        self
    }

    #[must_use]
    pub const fn with_rotation(mut self, rotation: [f32; 4]) -> Self {
        self.rotation = rotation;
        self
    }

    #[must_use]
    pub const fn with_scale(mut self, scale: [f32; 3]) -> Self {
        self.scale = scale;
        self
    }
}

impl Default for NodeTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Type tag of a scene node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum NodeKind {
    Scene,
    Group,
    Mesh,
    Points,
    Line,
    PointLight,
    DirectionalLight,
    AmbientLight,
    SpotLight,
    PerspectiveCamera,
    OrthographicCamera,
    #[default]
    Object3D,
}

impl NodeKind {
    pub fn is_light(self) -> bool {
        matches!(
            self,
            Self::PointLight | Self::DirectionalLight | Self::AmbientLight | Self::SpotLight
        )
    }

    /// Kinds that draw a geometry with a material.
    pub fn is_drawable(self) -> bool {
        matches!(self, Self::Mesh | Self::Points | Self::Line)
    }
}

/// A node in the scene tree.
///
/// A node exclusively owns its children. Geometry and material are shared:
/// several nodes may hold clones of the same `Arc`, and that sharing is what
/// serialization preserves.
#[derive(Debug, Clone)]
pub struct SceneNode {
    /// Stable identity, preserved across serialization.
    pub uuid: String,
    pub name: Option<String>,
    pub kind: NodeKind,
    /// Local transform relative to the parent.
    pub transform: NodeTransform,
    pub visible: bool,
    /// Kind-specific values, e.g. a light's `color` and `intensity`.
    pub properties: IndexMap<String, PropertyValue>,
    pub geometry: Option<Arc<Geometry>>,
    pub material: Option<Arc<Material>>,
    pub children: Vec<SceneNode>,
}

impl SceneNode {
    /// Creates a node of the given kind with a fresh uuid and identity transform.
    pub fn new(kind: NodeKind) -> Self {
        Self {
            uuid: super::new_uuid(),
            name: None,
            kind,
            transform: NodeTransform::IDENTITY,
            visible: true,
            properties: IndexMap::new(),
            geometry: None,
            material: None,
            children: Vec::new(),
        }
    }

    pub fn scene() -> Self {
        Self::new(NodeKind::Scene)
    }

    pub fn group() -> Self {
        Self::new(NodeKind::Group)
    }

    /// Creates a mesh node drawing `geometry` with `material`.
    pub fn mesh(geometry: Arc<Geometry>, material: Arc<Material>) -> Self {
        let mut node = Self::new(NodeKind::Mesh);
        node.geometry = Some(geometry);
        node.material = Some(material);
        node
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
    pub fn with_transform(mut self, transform: NodeTransform) -> Self {
        self.transform = transform;
        self
    }

    #[must_use]
    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    #[must_use]
    pub fn with_property(mut self, name: impl Into<String>, value: PropertyValue) -> Self {
        self.properties.insert(name.into(), value);
        self
    }

    #[must_use]
    pub fn with_geometry(mut self, geometry: Arc<Geometry>) -> Self {
        self.geometry = Some(geometry);
        self
    }

    #[must_use]
    pub fn with_material(mut self, material: Arc<Material>) -> Self {
        self.material = Some(material);
        self
    }

    #[must_use]
    pub fn with_child(mut self, child: SceneNode) -> Self {
        self.children.push(child);
        self
    }

    #[must_use]
    pub fn with_children(mut self, children: Vec<SceneNode>) -> Self {
        self.children = children;
        self
    }

    /// Number of nodes in this sub-tree, including `self`.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(SceneNode::node_count).sum::<usize>()
    }

    /// Visit this node and its descendants in pre-order.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a SceneNode)) {
        visit(self);
        for child in &self.children {
            child.walk(visit);
        }
    }

    /// Find a node in this sub-tree by uuid.
    pub fn find(&self, uuid: &str) -> Option<&SceneNode> {
        if self.uuid == uuid {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(uuid))
    }

    /// Deep copy of the sub-tree with fresh node uuids.
    ///
    /// Geometry and material handles are shared with the original, as
    /// `Clone` does; only node identities change. Use this instead of
    /// `clone()` when the copy is inserted into the same graph.
    pub fn instantiate(&self) -> Self {
        let mut copy = self.clone();
        copy.reassign_uuids();
        copy
    }

    fn reassign_uuids(&mut self) {
        self.uuid = super::new_uuid();
        for child in &mut self.children {
            child.reassign_uuids();
        }
    }
}

impl Default for SceneNode {
    fn default() -> Self {
        Self::new(NodeKind::Object3D)
    }
}
