//! Shared-resource deduplication by instance identity.

mod table;

pub use table::{
    DanglingReference, DuplicateResource, Interned, Resource, ResourceId, ResourceKind,
    ResourceTable,
};
