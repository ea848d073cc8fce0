//! Graph serializer and deserializer.
//!
//! [`serialize`] turns a [`SceneNode`](crate::scene::SceneNode) tree into a
//! [`WireRecord`](crate::record::WireRecord), emitting each shared geometry
//! and material once. [`deserialize`] reverses it and restores the sharing.

mod deserializer;
mod error;
mod serializer;

pub use deserializer::deserialize;
pub use error::{DeserializeError, SerializeError};
pub use serializer::{SerializedScene, serialize};
