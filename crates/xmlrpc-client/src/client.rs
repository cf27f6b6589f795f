use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use futures::FutureExt;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use xmlrpc_codec::{envelope, CodecError, FromXmlRpc, IntoParams, Response};
use xmlrpc_transport::{
    HttpRequest, HttpTransport, ReqwestTransport, TransportConfig, TransportError,
};

use crate::config::ClientConfig;
use crate::correlation::{dispatch, Completion, CorrelationTable, PendingRecord, Reply};
use crate::error::{ClientError, Result};

/// A concurrent XML-RPC client.
///
/// Cloning is cheap; clones share the transport, the sequence counter and
/// the table of calls in flight. Calls may be issued from many tasks at
/// once and complete in whatever order the server answers.
#[derive(Clone)]
pub struct Client {
    inner: Arc<Inner>,
}

struct Inner {
    transport: Arc<dyn HttpTransport>,
    config: ClientConfig,
    next_seq: AtomicU64,
    table: Arc<CorrelationTable>,
    ready: mpsc::UnboundedSender<Completion>,
    shutdown: CancellationToken,
    runtime: Handle,
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

impl Client {
    /// Client over `transport`, driven by the current tokio runtime.
    pub fn new(transport: impl HttpTransport) -> Result<Self> {
        Self::with_config(Arc::new(transport), ClientConfig::default())
    }

    /// Client POSTing to `url` with the default reqwest transport.
    pub fn connect(url: &str) -> Result<Self> {
        Self::new(ReqwestTransport::new(url)?)
    }

    /// Client POSTing through a reqwest transport built from `config`.
    pub fn connect_with_config(config: TransportConfig) -> Result<Self> {
        Self::new(ReqwestTransport::with_config(config)?)
    }

    pub fn with_config(transport: Arc<dyn HttpTransport>, config: ClientConfig) -> Result<Self> {
        let runtime = Handle::try_current().map_err(|e| ClientError::Runtime(e.to_string()))?;
        Ok(Self::with_runtime(transport, config, runtime))
    }

    pub(crate) fn with_runtime(
        transport: Arc<dyn HttpTransport>,
        config: ClientConfig,
        runtime: Handle,
    ) -> Self {
        let (ready, queue) = mpsc::unbounded_channel();
        let table = Arc::new(CorrelationTable::default());
        let shutdown = CancellationToken::new();
        runtime.spawn(dispatch(queue, Arc::clone(&table), shutdown.clone()));
        Self {
            inner: Arc::new(Inner {
                transport,
                next_seq: AtomicU64::new(config.first_sequence),
                config,
                table,
                ready,
                shutdown,
                runtime,
            }),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Number of calls issued but not yet completed.
    pub fn in_flight(&self) -> usize {
        self.inner.table.len()
    }

    pub fn is_closed(&self) -> bool {
        self.inner.shutdown.is_cancelled()
    }

    /// Call `method` and decode its first result param into `T`.
    ///
    /// A fault response yields [`ClientError::Codec`] carrying the
    /// [`Fault`](xmlrpc_codec::Fault); see [`ClientError::fault`].
    pub async fn call<T: FromXmlRpc>(&self, method: &str, params: impl IntoParams) -> Result<T> {
        self.issue(method, params)?.wait().await
    }

    /// Start a call without waiting for it.
    ///
    /// The request is in flight once this returns; await the handle for
    /// the result. Dropping the handle does not cancel the exchange.
    pub fn issue(&self, method: &str, params: impl IntoParams) -> Result<PendingCall> {
        let params = params.into_params()?;
        let body = envelope::build(method, &params);
        self.issue_envelope(method, body, None)
    }

    pub(crate) fn issue_envelope(
        &self,
        method: &str,
        body: Bytes,
        batch: Option<Arc<[String]>>,
    ) -> Result<PendingCall> {
        let inner = &self.inner;
        if inner.shutdown.is_cancelled() {
            return Err(ClientError::Closed);
        }

        let seq = inner.next_seq.fetch_add(1, Ordering::Relaxed);
        let (waiter, reply) = oneshot::channel();
        inner.table.register(
            seq,
            PendingRecord {
                method: method.to_owned(),
                batch,
                exchange: None,
                waiter,
            },
        )?;

        let request = HttpRequest::xml(body);
        debug!(seq, method, bytes = request.content_length(), "issuing call");
        let transport = Arc::clone(&inner.transport);
        let ready = inner.ready.clone();
        let exchange = inner.runtime.spawn(async move {
            let outcome = AssertUnwindSafe(transport.post(request))
                .catch_unwind()
                .await
                .unwrap_or_else(|panic| {
                    warn!(seq, "transport panicked during exchange");
                    Err(TransportError::Exchange(panic_message(panic.as_ref())))
                });
            // A closed queue means the dispatcher is gone and so is the waiter.
            let _ = ready.send(Completion { seq, outcome });
        });
        inner.table.attach(seq, exchange.abort_handle());

        Ok(PendingCall { seq, reply })
    }

    /// Stop the client.
    ///
    /// Every call in flight fails with [`ClientError::Closed`], its exchange
    /// is cancelled and the transport releases its idle connections. Later
    /// calls fail immediately. Closing twice is a no-op.
    pub fn close(&self) {
        let inner = &self.inner;
        if inner.shutdown.is_cancelled() {
            return;
        }
        inner.shutdown.cancel();

        let pending = inner.table.close();
        let released = pending.len();
        for (seq, record) in pending {
            if let Some(exchange) = record.exchange {
                exchange.abort();
            }
            if record.waiter.send(Err(ClientError::Closed)).is_err() {
                debug!(seq, method = %record.method, "caller went away before close");
            }
        }
        inner.transport.close();
        debug!(released, "client closed");
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    let detail = panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown cause");
    format!("transport panicked: {detail}")
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("config", &self.inner.config)
            .field("in_flight", &self.in_flight())
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Handle to an issued call.
#[derive(Debug)]
pub struct PendingCall {
    seq: u64,
    reply: oneshot::Receiver<Result<Reply>>,
}

impl PendingCall {
    /// Sequence number the call was registered under.
    pub fn sequence(&self) -> u64 {
        self.seq
    }

    /// Wait for the call and decode its first result param into `T`.
    pub async fn wait<T: FromXmlRpc>(self) -> Result<T> {
        match self.reply().await? {
            Reply::Params(params) => Ok(Response::Params(params).decode()?),
            Reply::Batch(_) => Err(CodecError::StructuralMismatch(
                "batch reply awaited as a single call".into(),
            )
            .into()),
        }
    }

    /// Wait for a batch and return one `<value>` fragment per sub-call.
    pub async fn wait_batch(self) -> Result<Vec<Bytes>> {
        match self.reply().await? {
            Reply::Batch(fragments) => Ok(fragments),
            Reply::Params(_) => Err(CodecError::StructuralMismatch(
                "single-call reply awaited as a batch".into(),
            )
            .into()),
        }
    }

    async fn reply(self) -> Result<Reply> {
        self.reply.await.map_err(|_| ClientError::Closed)?
    }
}
