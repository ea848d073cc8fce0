use thiserror::Error;

use crate::message::CorrelationId;

/// Errors of the offload channel.
#[derive(Debug, Error)]
pub enum OffloadError {
    /// The request could not be handed to the worker.
    #[error("failed to post request to worker: {0}")]
    Transport(String),
    /// A response arrived for an id with no outstanding request.
    #[error("response {correlation_id} matches no outstanding request")]
    UnmatchedResponse { correlation_id: CorrelationId },
    /// The worker went away before answering.
    #[error("worker disconnected")]
    Disconnected,
    /// The worker answered with an error message.
    #[error("{message}: {error}")]
    Worker { message: String, error: String },
    /// The worker answered with the wrong kind of reply.
    #[error("expected a {expected} reply, got {found}")]
    UnexpectedReply {
        expected: &'static str,
        found: &'static str,
    },
}
