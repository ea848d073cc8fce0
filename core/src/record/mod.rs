//! The wire record: the serialized, transmittable form of a scene graph.

mod format;
mod transcode;
mod types;

pub(crate) use transcode::check_version;
pub use format::{Format, decode, encode};
pub use transcode::{EncodedRecord, decode_text, encode_text, encode_text_with};
pub use types::{
    AttributeRecord, FORMAT_VERSION, GENERATOR, GeometryData, GeometryRecord, MaterialRecord,
    NodeRecord, PreorderNodes, RecordMetadata, WireRecord,
};
