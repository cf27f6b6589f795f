//! Routing of completed exchanges back to the calls that issued them.
//!
//! Each issued call registers a pending record under its sequence number
//! before its exchange starts. Exchanges finish in any order and push a
//! [`Completion`] onto the ready queue; the dispatcher pops completions in
//! that order, removes the matching record exactly once and hands the
//! classified reply to the waiting caller.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bytes::Bytes;
use tokio::sync::{mpsc, oneshot};
use tokio::task::AbortHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use xmlrpc_codec::{classify, split_calls, CodecError, Response};
use xmlrpc_transport::HttpResponse;

use crate::error::{ClientError, Result};

/// A classified reply, not yet decoded into the caller's type.
#[derive(Debug)]
pub(crate) enum Reply {
    /// Params of a single call.
    Params(Vec<Bytes>),
    /// One fragment per sub-call of a batch.
    Batch(Vec<Bytes>),
}

/// What the client remembers about a call in flight.
pub(crate) struct PendingRecord {
    pub method: String,
    /// Sub-call method names, for batches.
    pub batch: Option<Arc<[String]>>,
    pub exchange: Option<AbortHandle>,
    pub waiter: oneshot::Sender<Result<Reply>>,
}

/// A finished exchange, tagged with the sequence number of its call.
pub(crate) struct Completion {
    pub seq: u64,
    pub outcome: xmlrpc_transport::Result<HttpResponse>,
}

#[derive(Default)]
struct TableState {
    records: HashMap<u64, PendingRecord>,
    closed: bool,
}

/// Sequence number → pending record, guarded by a single mutex.
#[derive(Default)]
pub(crate) struct CorrelationTable {
    state: Mutex<TableState>,
}

impl CorrelationTable {
    fn lock(&self) -> MutexGuard<'_, TableState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a call. Fails once the table is closed or if `seq` is taken.
    pub fn register(&self, seq: u64, record: PendingRecord) -> Result<()> {
        let mut state = self.lock();
        if state.closed {
            return Err(ClientError::Closed);
        }
        match state.records.entry(seq) {
            Entry::Occupied(_) => Err(CodecError::StructuralMismatch(format!(
                "sequence {seq} is already in flight"
            ))
            .into()),
            Entry::Vacant(slot) => {
                slot.insert(record);
                Ok(())
            }
        }
    }

    /// Remember the exchange task of `seq` so close can cancel it.
    pub fn attach(&self, seq: u64, exchange: AbortHandle) {
        if let Some(record) = self.lock().records.get_mut(&seq) {
            record.exchange = Some(exchange);
        }
    }

    pub fn take(&self, seq: u64) -> Option<PendingRecord> {
        self.lock().records.remove(&seq)
    }

    /// Refuse further registrations and hand back everything in flight.
    pub fn close(&self) -> Vec<(u64, PendingRecord)> {
        let mut state = self.lock();
        state.closed = true;
        state.records.drain().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().records.len()
    }
}

/// Consume completions until shutdown, resolving each waiting caller.
pub(crate) async fn dispatch(
    mut ready: mpsc::UnboundedReceiver<Completion>,
    table: Arc<CorrelationTable>,
    shutdown: CancellationToken,
) {
    loop {
        let completion = tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            completion = ready.recv() => match completion {
                Some(completion) => completion,
                None => break,
            },
        };

        let seq = completion.seq;
        let Some(record) = table.take(seq) else {
            warn!(seq, "completion for unknown sequence, dropping");
            continue;
        };
        let PendingRecord {
            method,
            batch,
            waiter,
            ..
        } = record;

        let reply = read_reply(batch.as_deref(), completion.outcome);
        match &reply {
            Ok(_) => debug!(seq, %method, "call completed"),
            Err(err) => debug!(seq, %method, error = %err, "call failed"),
        }
        if waiter.send(reply).is_err() {
            debug!(seq, %method, "caller went away before completion");
        }
    }
    debug!("dispatcher stopped");
}

fn read_reply(
    batch: Option<&[String]>,
    outcome: xmlrpc_transport::Result<HttpResponse>,
) -> Result<Reply> {
    let response = outcome?.error_for_status()?;
    if let Some(methods) = batch {
        return Ok(Reply::Batch(split_calls(&response.body, methods)?));
    }
    match classify(&response.body)? {
        Response::Params(params) => Ok(Reply::Params(params)),
        Response::Fault(fault) => Err(CodecError::Fault(fault).into()),
    }
}
