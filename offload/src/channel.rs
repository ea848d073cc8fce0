//! Correlation-id matched request/response channel.

use std::sync::{Arc, mpsc};

use parking_lot::Mutex;

use nodist_core::codec::TransferList;
use nodist_core::record::{EncodedRecord, WireRecord};
use nodist_core::serialize::SerializedScene;

use crate::error::OffloadError;
use crate::message::{
    CorrelationId, RequestEnvelope, ResponseEnvelope, WorkerReply, WorkerRequest,
};
use crate::pending::{FromReply, PendingHandle, PendingTable};
use crate::worker::{ThreadWorker, Transport, WorkerConfig};

/// Outcome of one [`OffloadChannel::pump`] call.
#[derive(Debug, Default)]
pub struct PumpReport {
    /// Responses routed to their handles.
    pub delivered: usize,
    /// Responses for abandoned requests, dropped.
    pub discarded: usize,
    /// Responses that matched no request.
    pub errors: Vec<OffloadError>,
}

impl PumpReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Calling side of the worker boundary.
///
/// Requests are posted through a [`Transport`]; responses arrive on an
/// `mpsc` receiver and are matched to their [`PendingHandle`] by correlation
/// id. Responses may arrive in any order.
pub struct OffloadChannel<T: Transport = ThreadWorker> {
    transport: T,
    responses: mpsc::Receiver<ResponseEnvelope>,
    table: Arc<Mutex<PendingTable>>,
    next_id: u64,
}

impl OffloadChannel<ThreadWorker> {
    /// Channel backed by a new background [`ThreadWorker`].
    pub fn spawn(config: WorkerConfig) -> Result<Self, OffloadError> {
        let (worker, responses) = ThreadWorker::spawn(config)?;
        Ok(Self::new(worker, responses))
    }
}

impl<T: Transport> OffloadChannel<T> {
    pub fn new(transport: T, responses: mpsc::Receiver<ResponseEnvelope>) -> Self {
        Self {
            transport,
            responses,
            table: Arc::new(Mutex::new(PendingTable::default())),
            next_id: 0,
        }
    }

    /// Send a request to the worker.
    ///
    /// The handle resolves to the raw reply, error replies included. If
    /// the transport refuses the request the handle resolves to
    /// [`OffloadError::Transport`] right away.
    pub fn submit(&mut self, request: WorkerRequest) -> PendingHandle<WorkerReply> {
        self.submit_as(request)
    }

    /// Encode `record` as text on the worker.
    pub fn serialize(&mut self, record: WireRecord) -> PendingHandle<EncodedRecord> {
        self.serialize_scene(SerializedScene {
            record,
            transfers: TransferList::new(),
        })
    }

    /// Encode a serializer result as text on the worker. Its out-of-band
    /// buffers move with the request.
    pub fn serialize_scene(&mut self, scene: SerializedScene) -> PendingHandle<EncodedRecord> {
        self.submit_as(WorkerRequest::Serialize {
            data: scene.record,
            buffers: scene.transfers,
        })
    }

    /// Decode `text` on the worker. `buffers` move to the worker with it.
    pub fn deserialize(&mut self, text: String, buffers: TransferList) -> PendingHandle<WireRecord> {
        self.submit_as(WorkerRequest::Deserialize {
            data: text,
            buffers,
        })
    }

    fn submit_as<R: FromReply>(&mut self, request: WorkerRequest) -> PendingHandle<R> {
        let id = CorrelationId(self.next_id);
        self.next_id += 1;

        let (tx, rx) = mpsc::channel();
        self.table.lock().outstanding.insert(id, tx);
        let handle = PendingHandle::new(id, rx, Arc::clone(&self.table));

        log::debug!("offload {} request {id}", request.operation());
        if let Err(e) = self.transport.post(RequestEnvelope { id, request }) {
            log::warn!("offload request {id} not posted: {e}");
            if let Some(tx) = self.table.lock().outstanding.remove(&id) {
                let _ = tx.send(Err(e));
            }
        }
        handle
    }

    /// Number of requests still waiting for a response.
    pub fn in_flight(&self) -> usize {
        self.table.lock().outstanding.len()
    }

    /// Route every response delivered so far, without blocking.
    pub fn pump(&self) -> PumpReport {
        let mut report = PumpReport::default();
        loop {
            match self.responses.try_recv() {
                Ok(response) => self.route(response, &mut report),
                Err(mpsc::TryRecvError::Empty) => break,
                Err(mpsc::TryRecvError::Disconnected) => {
                    self.fail_outstanding();
                    break;
                }
            }
        }
        if !report.is_clean() {
            log::warn!("offload pump: {} unmatched responses", report.errors.len());
        }
        report
    }

    /// Block until `handle` resolves, routing other responses on the way.
    pub fn block_on<R: FromReply>(&self, handle: PendingHandle<R>) -> Result<R, OffloadError> {
        loop {
            if let Some(result) = handle.try_recv() {
                return result;
            }
            match self.responses.recv() {
                Ok(response) => {
                    let mut report = PumpReport::default();
                    self.route(response, &mut report);
                    for error in report.errors {
                        log::warn!("offload: {error}");
                    }
                }
                Err(mpsc::RecvError) => {
                    self.fail_outstanding();
                    return handle.try_recv().unwrap_or(Err(OffloadError::Disconnected));
                }
            }
        }
    }

    fn route(&self, response: ResponseEnvelope, report: &mut PumpReport) {
        let ResponseEnvelope { id, reply } = response;
        let mut table = self.table.lock();
        if let Some(tx) = table.outstanding.remove(&id) {
            if reply.is_error() {
                log::debug!("offload request {id} failed on worker");
            }
            // The handle may have been dropped between lookup and send.
            let _ = tx.send(Ok(reply));
            report.delivered += 1;
        } else if table.abandoned.remove(&id) {
            log::debug!("offload response {id} discarded, request abandoned");
            report.discarded += 1;
        } else {
            report
                .errors
                .push(OffloadError::UnmatchedResponse { correlation_id: id });
        }
    }

    fn fail_outstanding(&self) {
        let mut table = self.table.lock();
        if !table.outstanding.is_empty() {
            log::error!(
                "offload worker disconnected with {} requests in flight",
                table.outstanding.len()
            );
        }
        for (_, tx) in table.outstanding.drain() {
            let _ = tx.send(Err(OffloadError::Disconnected));
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use nodist_core::record::NodeRecord;
    use nodist_core::scene::NodeKind;

    use super::*;

    struct Refusing;

    impl Transport for Refusing {
        fn post(&self, _envelope: RequestEnvelope) -> Result<(), OffloadError> {
            Err(OffloadError::Transport("closed".into()))
        }
    }

    #[derive(Default)]
    struct Recording(RefCell<Vec<CorrelationId>>);

    impl Transport for Recording {
        fn post(&self, envelope: RequestEnvelope) -> Result<(), OffloadError> {
            self.0.borrow_mut().push(envelope.id);
            Ok(())
        }
    }

    fn record() -> WireRecord {
        WireRecord::new(NodeRecord::new("root", NodeKind::Scene))
    }

    #[test]
    fn refused_post_resolves_handle_with_transport_error() {
        let (_tx, rx) = mpsc::channel();
        let mut channel = OffloadChannel::new(Refusing, rx);
        let handle = channel.serialize(record());
        assert!(matches!(
            handle.try_recv(),
            Some(Err(OffloadError::Transport(_)))
        ));
        assert_eq!(channel.in_flight(), 0);
    }

    #[test]
    fn duplicate_response_is_unmatched() {
        let (tx, rx) = mpsc::channel();
        let mut channel = OffloadChannel::new(Recording::default(), rx);
        let handle = channel.submit(WorkerRequest::Serialize {
            data: record(),
            buffers: TransferList::new(),
        });
        let reply = || WorkerReply::Error {
            message: "m".into(),
            error: "e".into(),
        };
        tx.send(ResponseEnvelope {
            id: handle.id(),
            reply: reply(),
        })
        .unwrap();
        tx.send(ResponseEnvelope {
            id: handle.id(),
            reply: reply(),
        })
        .unwrap();

        let report = channel.pump();
        assert_eq!(report.delivered, 1);
        assert!(matches!(
            report.errors.as_slice(),
            [OffloadError::UnmatchedResponse { correlation_id }] if *correlation_id == handle.id()
        ));
        assert!(handle.try_recv().is_some());
    }

    #[test]
    fn dropped_worker_fails_outstanding_handles() {
        let (tx, rx) = mpsc::channel();
        let mut channel = OffloadChannel::new(Recording::default(), rx);
        let handle = channel.serialize(record());
        drop(tx);

        channel.pump();
        assert!(matches!(
            handle.try_recv(),
            Some(Err(OffloadError::Disconnected))
        ));
    }

    #[test]
    fn ids_are_unique() {
        let (_tx, rx) = mpsc::channel();
        let mut channel = OffloadChannel::new(Recording::default(), rx);
        let a = channel.serialize(record());
        let b = channel.serialize(record());
        assert_ne!(a.id(), b.id());
        assert_eq!(channel.in_flight(), 2);
        assert_eq!(*channel.transport.0.borrow(), vec![a.id(), b.id()]);
    }
}
