//! # nodist core
//!
//! Scene graph serialization: an in-memory tree of nodes sharing geometries
//! and materials becomes a [`WireRecord`](record::WireRecord) and back,
//! with large attribute buffers kept cheap to move.
//!
//! - [`scene`]: the scene graph data model
//! - [`codec`]: attribute buffer wire forms
//! - [`resource`]: identity-based resource deduplication
//! - [`record`]: the wire record and its text formats
//! - [`serialize`]: graph serializer and deserializer
//! - [`inspect`]: cycle-safe value rendering for logs

pub mod codec;
pub mod inspect;
pub mod record;
pub mod resource;
pub mod scene;
pub mod serialize;

/// Core library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
