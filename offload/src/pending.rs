//! Handles to in-flight requests.

use std::cell::Cell;
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;
use std::sync::{Arc, mpsc};
use std::task::{Context, Poll};

use parking_lot::Mutex;

use nodist_core::record::{EncodedRecord, WireRecord};

use crate::error::OffloadError;
use crate::message::{CorrelationId, WorkerReply};

pub(crate) type Delivery = Result<WorkerReply, OffloadError>;

/// Outstanding and abandoned correlation ids, shared between the channel
/// and its handles.
#[derive(Default)]
pub(crate) struct PendingTable {
    pub(crate) outstanding: HashMap<CorrelationId, mpsc::Sender<Delivery>>,
    pub(crate) abandoned: HashSet<CorrelationId>,
}

/// Typed view of a worker reply.
pub trait FromReply: Sized {
    fn from_reply(reply: WorkerReply) -> Result<Self, OffloadError>;
}

impl FromReply for WorkerReply {
    fn from_reply(reply: WorkerReply) -> Result<Self, OffloadError> {
        Ok(reply)
    }
}

impl FromReply for EncodedRecord {
    fn from_reply(reply: WorkerReply) -> Result<Self, OffloadError> {
        match reply {
            WorkerReply::SerializeComplete { data, buffers } => Ok(EncodedRecord {
                text: data,
                buffers,
            }),
            other => Err(unexpected("serialize_complete", other)),
        }
    }
}

impl FromReply for WireRecord {
    fn from_reply(reply: WorkerReply) -> Result<Self, OffloadError> {
        match reply {
            WorkerReply::DeserializeComplete { data } => Ok(data),
            other => Err(unexpected("deserialize_complete", other)),
        }
    }
}

fn unexpected(expected: &'static str, reply: WorkerReply) -> OffloadError {
    match reply {
        WorkerReply::Error { message, error } => OffloadError::Worker { message, error },
        other => OffloadError::UnexpectedReply {
            expected,
            found: other.kind(),
        },
    }
}

/// Handle to one request's eventual result.
///
/// Resolves once [`OffloadChannel::pump`](crate::OffloadChannel::pump) (or
/// [`block_on`](crate::OffloadChannel::block_on)) has routed the matching
/// response. Can be polled with [`try_recv`](Self::try_recv) or awaited;
/// the `Future` impl only checks for a delivered result and is meant for
/// cooperative executors polling with a noop waker.
///
/// Dropping an unresolved handle abandons the request: the worker still
/// finishes it, but the response is discarded.
pub struct PendingHandle<T> {
    id: CorrelationId,
    receiver: mpsc::Receiver<Delivery>,
    table: Arc<Mutex<PendingTable>>,
    done: Cell<bool>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: FromReply> PendingHandle<T> {
    pub(crate) fn new(
        id: CorrelationId,
        receiver: mpsc::Receiver<Delivery>,
        table: Arc<Mutex<PendingTable>>,
    ) -> Self {
        Self {
            id,
            receiver,
            table,
            done: Cell::new(false),
            _marker: PhantomData,
        }
    }

    pub fn id(&self) -> CorrelationId {
        self.id
    }

    /// Returns `true` once the result has been taken.
    pub fn is_done(&self) -> bool {
        self.done.get()
    }

    /// Take the result if it has been delivered.
    ///
    /// Returns `None` while the request is in flight and after the result
    /// has been taken once.
    pub fn try_recv(&self) -> Option<Result<T, OffloadError>> {
        if self.done.get() {
            return None;
        }
        let delivery = match self.receiver.try_recv() {
            Ok(delivery) => delivery,
            Err(mpsc::TryRecvError::Empty) => return None,
            Err(mpsc::TryRecvError::Disconnected) => Err(OffloadError::Disconnected),
        };
        self.done.set(true);
        Some(delivery.and_then(T::from_reply))
    }

    /// Stop waiting for the result.
    ///
    /// In-flight work is not cancelled; its response will be discarded.
    pub fn abandon(self) {
        drop(self);
    }
}

impl<T> Drop for PendingHandle<T> {
    fn drop(&mut self) {
        if self.done.get() {
            return;
        }
        let mut table = self.table.lock();
        if table.outstanding.remove(&self.id).is_some() {
            table.abandoned.insert(self.id);
            log::debug!("offload request {} abandoned", self.id);
        }
    }
}

impl<T: FromReply> Future for PendingHandle<T> {
    type Output = Result<T, OffloadError>;

    fn poll(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Self::Output> {
        match self.try_recv() {
            Some(result) => Poll::Ready(result),
            None if self.done.get() => Poll::Ready(Err(OffloadError::Disconnected)),
            None => Poll::Pending,
        }
    }
}

impl<T> std::fmt::Debug for PendingHandle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingHandle")
            .field("id", &self.id)
            .field("done", &self.done.get())
            .finish()
    }
}
