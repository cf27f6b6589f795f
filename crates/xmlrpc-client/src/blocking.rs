use std::sync::Arc;

use tokio::runtime::{Builder, Runtime};
use xmlrpc_codec::{Call, FromXmlRpc, IntoParams, Value};
use xmlrpc_transport::{HttpTransport, ReqwestTransport, TransportConfig};

use crate::client::Client;
use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::multicall::Destination;

/// Synchronous facade over [`Client`].
///
/// Owns a small runtime whose worker thread drives exchanges and the
/// dispatcher, so calls may be made from several threads at once. Must not
/// be used or dropped from inside an async context.
pub struct BlockingClient {
    client: Client,
    runtime: Runtime,
}

impl BlockingClient {
    pub fn new(transport: impl HttpTransport) -> Result<Self> {
        Self::with_config(Arc::new(transport), ClientConfig::default())
    }

    pub fn connect(url: &str) -> Result<Self> {
        Self::new(ReqwestTransport::new(url)?)
    }

    pub fn connect_with_config(config: TransportConfig) -> Result<Self> {
        Self::new(ReqwestTransport::with_config(config)?)
    }

    pub fn with_config(transport: Arc<dyn HttpTransport>, config: ClientConfig) -> Result<Self> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("xmlrpc-client")
            .enable_all()
            .build()
            .map_err(|e| ClientError::Runtime(e.to_string()))?;
        let client = Client::with_runtime(transport, config, runtime.handle().clone());
        Ok(Self { client, runtime })
    }

    /// The async client sharing this facade's runtime and call table.
    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn call<T: FromXmlRpc>(&self, method: &str, params: impl IntoParams) -> Result<T> {
        self.runtime.block_on(self.client.call(method, params))
    }

    pub fn multicall(
        &self,
        calls: &[Call],
        destinations: &mut [&mut dyn Destination],
    ) -> Result<()> {
        self.runtime.block_on(self.client.multicall(calls, destinations))
    }

    pub fn multicall_values(&self, calls: &[Call]) -> Result<Vec<Value>> {
        self.runtime.block_on(self.client.multicall_values(calls))
    }

    pub fn close(&self) {
        self.client.close();
    }
}

impl Drop for BlockingClient {
    fn drop(&mut self) {
        self.client.close();
    }
}

impl std::fmt::Debug for BlockingClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockingClient")
            .field("client", &self.client)
            .finish()
    }
}
