//! Identity-keyed resource table.
//!
//! On the serialization side, [`ResourceTable::intern`] assigns one
//! [`ResourceId`] per distinct `Arc` allocation. Two resources with equal
//! contents but separate allocations get separate ids. On the
//! deserialization side, [`ResourceTable::insert`] registers rebuilt
//! resources and [`ResourceTable::resolve`] looks them up again, handing out
//! clones of one shared `Arc` so the sharing topology is restored.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::scene::{Geometry, Material};

/// Id of a shared resource inside one wire record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(pub u32);

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Category of a shared resource, used in diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Geometry,
    Material,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Geometry => f.write_str("geometry"),
            Self::Material => f.write_str("material"),
        }
    }
}

/// A resource type that can live in a [`ResourceTable`].
pub trait Resource: Send + Sync + 'static {
    const KIND: ResourceKind;
}

impl Resource for Geometry {
    const KIND: ResourceKind = ResourceKind::Geometry;
}

impl Resource for Material {
    const KIND: ResourceKind = ResourceKind::Material;
}

/// A reference to an id that the table does not hold.
///
/// This signals a corrupt record; retrying cannot fix it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("dangling {kind} reference {id}")]
pub struct DanglingReference {
    pub kind: ResourceKind,
    pub id: ResourceId,
}

/// Two resources registered under one id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("duplicate {kind} id {id}")]
pub struct DuplicateResource {
    pub kind: ResourceKind,
    pub id: ResourceId,
}

/// Result of interning a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interned {
    pub id: ResourceId,
    /// `true` the first time this instance was seen.
    pub is_new: bool,
}

/// Bidirectional table between resource instances and record ids.
pub struct ResourceTable<T: Resource> {
    by_instance: HashMap<usize, ResourceId>,
    by_id: HashMap<ResourceId, Arc<T>>,
    order: Vec<ResourceId>,
    next_id: u32,
}

impl<T: Resource> ResourceTable<T> {
    pub fn new() -> Self {
        Self {
            by_instance: HashMap::new(),
            by_id: HashMap::new(),
            order: Vec::new(),
            next_id: 0,
        }
    }

    /// Return the id of `resource`, assigning a new one on first sight.
    ///
    /// The table keeps a clone of the `Arc`, so the allocation (and with it
    /// the identity key) stays alive for the table's lifetime.
    pub fn intern(&mut self, resource: &Arc<T>) -> Interned {
        let key = Arc::as_ptr(resource) as usize;
        if let Some(&id) = self.by_instance.get(&key) {
            return Interned { id, is_new: false };
        }
        let id = ResourceId(self.next_id);
        self.next_id += 1;
        self.by_instance.insert(key, id);
        self.by_id.insert(id, Arc::clone(resource));
        self.order.push(id);
        Interned { id, is_new: true }
    }

    /// Register a rebuilt resource under an id read from a record.
    pub fn insert(&mut self, id: ResourceId, resource: Arc<T>) -> Result<(), DuplicateResource> {
        if self.by_id.contains_key(&id) {
            return Err(DuplicateResource { kind: T::KIND, id });
        }
        self.by_instance.insert(Arc::as_ptr(&resource) as usize, id);
        self.by_id.insert(id, resource);
        self.order.push(id);
        self.next_id = self.next_id.max(id.0.saturating_add(1));
        Ok(())
    }

    /// Look up the resource registered under `id`.
    pub fn resolve(&self, id: ResourceId) -> Result<Arc<T>, DanglingReference> {
        self.by_id
            .get(&id)
            .cloned()
            .ok_or(DanglingReference { kind: T::KIND, id })
    }

    pub fn contains(&self, id: ResourceId) -> bool {
        self.by_id.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Entries in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (ResourceId, &Arc<T>)> + '_ {
        self.order.iter().map(|id| (*id, &self.by_id[id]))
    }
}

impl<T: Resource> Default for ResourceTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Resource> fmt::Debug for ResourceTable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceTable")
            .field("kind", &T::KIND)
            .field("len", &self.len())
            .finish()
    }
}
