//! Error types for scene serialization and deserialization.

use thiserror::Error;

use crate::codec::CodecError;
use crate::resource::{DanglingReference, DuplicateResource};

/// Errors that can occur while serializing a scene graph.
#[derive(Debug, Error)]
pub enum SerializeError {
    /// A node identity was reached twice in one traversal.
    #[error("scene node {node} was visited twice in one traversal")]
    CyclicGraph { node: String },
    /// Text encoding failed.
    #[error("format error: {0}")]
    Format(String),
}

/// Errors that can occur while deserializing a wire record.
#[derive(Debug, Error)]
pub enum DeserializeError {
    /// The record was written by a newer format version.
    #[error("wire record version {found} is newer than supported version {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },
    /// The record violates the schema (missing fields, duplicate ids, bad text).
    #[error("malformed record: {0}")]
    MalformedRecord(String),
    /// A node references a resource id that no record defines.
    #[error(transparent)]
    DanglingReference(#[from] DanglingReference),
    /// An attribute buffer could not be decoded.
    #[error("malformed attribute '{attribute}' of geometry {geometry}: {source}")]
    Codec {
        geometry: String,
        attribute: String,
        #[source]
        source: CodecError,
    },
}

impl DeserializeError {
    /// Returns `true` for structural schema violations.
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::MalformedRecord(_) | Self::Codec { .. })
    }
}

impl From<DuplicateResource> for DeserializeError {
    fn from(e: DuplicateResource) -> Self {
        Self::MalformedRecord(e.to_string())
    }
}
