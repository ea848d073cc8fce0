//! Encoding strategy passed to the codec at call time.

use serde::{Deserialize, Serialize};

/// Default element count below which buffers are written as plain sequences.
///
/// Under a few hundred elements the per-element cost of a plain sequence is
/// smaller than the bookkeeping of an out-of-band buffer.
pub const DEFAULT_INLINE_THRESHOLD: usize = 256;

/// How large buffers reach the destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transport {
    /// The destination shares memory with the source: the native buffer
    /// handle travels as-is and nothing is copied.
    Shared,
    /// The destination is across an execution-context boundary: the buffer
    /// moves to an out-of-band list and the record keeps a descriptor.
    #[default]
    Transfer,
}

/// Strategy object selecting the wire form of each buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecPolicy {
    /// Buffers with fewer elements than this are written as plain sequences.
    pub inline_threshold: usize,
    pub transport: Transport,
}

impl CodecPolicy {
    pub const fn new(inline_threshold: usize, transport: Transport) -> Self {
        Self {
            inline_threshold,
            transport,
        }
    }

    /// Policy for handing a record to a consumer in the same memory space.
    pub const fn shared() -> Self {
        Self::new(DEFAULT_INLINE_THRESHOLD, Transport::Shared)
    }

    /// Policy for moving a record across an execution-context boundary.
    pub const fn transfer() -> Self {
        Self::new(DEFAULT_INLINE_THRESHOLD, Transport::Transfer)
    }

    /// Same threshold, but never emits native buffers. Text cannot carry them.
    #[must_use]
    pub const fn for_text(self) -> Self {
        Self::new(self.inline_threshold, Transport::Transfer)
    }

    #[must_use]
    pub const fn with_inline_threshold(mut self, inline_threshold: usize) -> Self {
        self.inline_threshold = inline_threshold;
        self
    }

    /// Returns `true` if a buffer of `len` elements is written inline.
    pub fn inlines(&self, len: usize) -> bool {
        len < self.inline_threshold
    }
}

impl Default for CodecPolicy {
    fn default() -> Self {
        Self::transfer()
    }
}
