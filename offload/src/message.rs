//! Request and response messages exchanged with the worker.

use std::fmt;

use nodist_core::codec::TransferList;
use nodist_core::record::WireRecord;

/// Token linking a request to its response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CorrelationId(pub u64);

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Operation tag of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Serialize,
    Deserialize,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Serialize => "serialize",
            Self::Deserialize => "deserialize",
        }
    }

    /// Message text of an error reply for this operation.
    pub fn failure_message(self) -> &'static str {
        match self {
            Self::Serialize => "Serialization failed",
            Self::Deserialize => "Deserialization failed",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Work for the worker.
#[derive(Debug, Clone)]
pub enum WorkerRequest {
    /// Encode a record as text. `buffers` back the descriptors already in
    /// `data`; native buffers are moved out of band next to them.
    Serialize {
        data: WireRecord,
        buffers: TransferList,
    },
    /// Decode text; `buffers` back the descriptors in it and move with the
    /// request.
    Deserialize { data: String, buffers: TransferList },
}

impl WorkerRequest {
    pub fn operation(&self) -> Operation {
        match self {
            Self::Serialize { .. } => Operation::Serialize,
            Self::Deserialize { .. } => Operation::Deserialize,
        }
    }
}

/// Answer of the worker. Exactly one per request.
#[derive(Debug, Clone)]
pub enum WorkerReply {
    SerializeComplete { data: String, buffers: TransferList },
    DeserializeComplete { data: WireRecord },
    Error { message: String, error: String },
}

impl WorkerReply {
    /// Message type tag.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SerializeComplete { .. } => "serialize_complete",
            Self::DeserializeComplete { .. } => "deserialize_complete",
            Self::Error { .. } => "error",
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }
}

/// A request tagged with its correlation id.
#[derive(Debug, Clone)]
pub struct RequestEnvelope {
    pub id: CorrelationId,
    pub request: WorkerRequest,
}

/// A reply tagged with the correlation id of its request.
#[derive(Debug, Clone)]
pub struct ResponseEnvelope {
    pub id: CorrelationId,
    pub reply: WorkerReply,
}
