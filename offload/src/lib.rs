//! # nodist offload
//!
//! Runs the expensive half of scene serialization (text encoding and
//! decoding of wire records) on a background worker and hands results back
//! through correlation-id matched [`PendingHandle`]s.
//!
//! ```ignore
//! let mut channel = OffloadChannel::spawn(WorkerConfig::default())?;
//! let handle = channel.serialize(record);
//!
//! // Each tick of the calling loop:
//! channel.pump();
//! if let Some(result) = handle.try_recv() {
//!     let encoded = result?;
//! }
//! ```

mod channel;
mod error;
mod message;
mod pending;
mod worker;

pub use channel::{OffloadChannel, PumpReport};
pub use error::OffloadError;
pub use message::{
    CorrelationId, Operation, RequestEnvelope, ResponseEnvelope, WorkerReply, WorkerRequest,
};
pub use pending::{FromReply, PendingHandle};
pub use worker::{ThreadWorker, Transport, WorkerConfig, handle_request};
