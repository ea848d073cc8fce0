//! Buffer codec: wire forms for numeric attribute buffers.
//!
//! - [`AttributeArray`] / [`ElementType`]: native typed buffers
//! - [`CodecPolicy`] / [`Transport`]: encoding strategy, passed per call
//! - [`WireBuffer`]: plain sequence, out-of-band descriptor, or native handle
//! - [`TransferList`]: raw buffers travelling beside a text record
//! - [`encode`] / [`decode`]: the codec itself; `decode(encode(b)) == b`
//!   for every buffer and every branch
//! - [`lower`] / [`raise`]: convert between native and text-safe forms

mod array;
mod buffer;
mod error;
pub(crate) mod nullable;
mod policy;
mod wire;

pub use array::{AttributeArray, ElementType};
pub use buffer::{decode, encode, lower, raise};
pub use error::CodecError;
pub use policy::{CodecPolicy, DEFAULT_INLINE_THRESHOLD, Transport};
pub use wire::{BufferDescriptor, DescriptorTag, TransferList, WireBuffer};
