//! The worker side: request handling and the background thread transport.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, mpsc};

use nodist_core::codec::CodecPolicy;
use nodist_core::record::{self, Format};

use crate::error::OffloadError;
use crate::message::{RequestEnvelope, ResponseEnvelope, WorkerReply, WorkerRequest};

/// Settings the worker encodes and decodes with.
#[derive(Debug, Clone, Default)]
pub struct WorkerConfig {
    pub format: Format,
    pub policy: CodecPolicy,
}

/// Process one request.
///
/// Always returns exactly one reply: failures, including panics, become
/// [`WorkerReply::Error`].
pub fn handle_request(request: WorkerRequest, config: &WorkerConfig) -> WorkerReply {
    let operation = request.operation();
    match panic::catch_unwind(AssertUnwindSafe(|| run(request, config))) {
        Ok(reply) => reply,
        Err(payload) => WorkerReply::Error {
            message: operation.failure_message().to_owned(),
            error: panic_message(payload.as_ref()),
        },
    }
}

fn run(request: WorkerRequest, config: &WorkerConfig) -> WorkerReply {
    let operation = request.operation();
    let result = match request {
        WorkerRequest::Serialize { data, buffers } => {
            record::encode_text_with(data, buffers, config.format, &config.policy)
                .map(|encoded| WorkerReply::SerializeComplete {
                    data: encoded.text,
                    buffers: encoded.buffers,
                })
                .map_err(|e| e.to_string())
        }
        WorkerRequest::Deserialize { data, buffers } => {
            record::decode_text(&data, &buffers, config.format)
                .map(|record| WorkerReply::DeserializeComplete { data: record })
                .map_err(|e| e.to_string())
        }
    };
    result.unwrap_or_else(|error| WorkerReply::Error {
        message: operation.failure_message().to_owned(),
        error,
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "worker panicked".to_owned()
    }
}

/// Delivers requests to a worker.
///
/// Responses come back through a separate channel handed to
/// [`OffloadChannel::new`](crate::OffloadChannel::new), so a transport only
/// moves requests one way.
pub trait Transport {
    fn post(&self, envelope: RequestEnvelope) -> Result<(), OffloadError>;
}

/// Stack of the worker thread. Text decoding recurses once per level of
/// node nesting.
pub const WORKER_STACK_SIZE: usize = 16 * 1024 * 1024;

/// Worker on a dedicated background thread.
///
/// Requests run one at a time on a single-worker tokio runtime; replies
/// are sent back over an `mpsc` channel the calling side drains.
pub struct ThreadWorker {
    runtime: tokio::runtime::Runtime,
    config: Arc<WorkerConfig>,
    replies: mpsc::Sender<ResponseEnvelope>,
}

impl ThreadWorker {
    /// Start the worker. Returns it with the receiving end of its replies.
    pub fn spawn(
        config: WorkerConfig,
    ) -> Result<(Self, mpsc::Receiver<ResponseEnvelope>), OffloadError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .max_blocking_threads(1)
            .thread_name("nodist-offload")
            .thread_stack_size(WORKER_STACK_SIZE)
            .build()
            .map_err(|e| OffloadError::Transport(format!("failed to start worker runtime: {e}")))?;

        let (tx, rx) = mpsc::channel();
        log::debug!("offload worker started ({:?})", config.format);
        Ok((
            Self {
                runtime,
                config: Arc::new(config),
                replies: tx,
            },
            rx,
        ))
    }
}

impl Transport for ThreadWorker {
    fn post(&self, envelope: RequestEnvelope) -> Result<(), OffloadError> {
        let config = Arc::clone(&self.config);
        let replies = self.replies.clone();
        self.runtime.spawn_blocking(move || {
            let RequestEnvelope { id, request } = envelope;
            let reply = handle_request(request, &config);
            if replies.send(ResponseEnvelope { id, reply }).is_err() {
                log::debug!("offload reply {id} dropped, channel closed");
            }
        });
        Ok(())
    }
}
