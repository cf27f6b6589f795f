use std::sync::Arc;

use tracing::debug;
use xmlrpc_codec::{envelope, multicall_params, Call, CodecError, FromXmlRpc, Value};

use crate::client::{Client, PendingCall};
use crate::error::Result;

/// A slot a multicall result can be decoded into.
///
/// Implemented for every [`FromXmlRpc`] type, so a batch can fill
/// destinations of different types: `[&mut count, &mut name]`.
pub trait Destination {
    fn decode_fragment(&mut self, fragment: &[u8]) -> xmlrpc_codec::Result<()>;
}

impl<T: FromXmlRpc> Destination for T {
    fn decode_fragment(&mut self, fragment: &[u8]) -> xmlrpc_codec::Result<()> {
        *self = xmlrpc_codec::decode(fragment)?;
        Ok(())
    }
}

impl Client {
    /// Send `calls` as one `system.multicall` request and decode result `i`
    /// into `destinations[i]`.
    ///
    /// The first faulted sub-call fails the whole batch with a
    /// [`MulticallFault`](xmlrpc_codec::MulticallFault) naming its index and
    /// method; no destination is written in that case.
    pub async fn multicall(
        &self,
        calls: &[Call],
        destinations: &mut [&mut dyn Destination],
    ) -> Result<()> {
        if calls.len() != destinations.len() {
            return Err(CodecError::StructuralMismatch(format!(
                "{} calls but {} destinations",
                calls.len(),
                destinations.len()
            ))
            .into());
        }
        let fragments = self.issue_multicall(calls)?.wait_batch().await?;
        let slots = fragments.iter().zip(destinations.iter_mut());
        for (index, (fragment, slot)) in slots.enumerate() {
            if let Err(err) = slot.decode_fragment(fragment) {
                debug!(
                    index,
                    method = calls[index].method(),
                    error = %err,
                    "multicall result did not decode"
                );
                return Err(err.into());
            }
        }
        Ok(())
    }

    /// Send `calls` as one batch and return each result as a dynamic [`Value`].
    pub async fn multicall_values(&self, calls: &[Call]) -> Result<Vec<Value>> {
        let fragments = self.issue_multicall(calls)?.wait_batch().await?;
        let values = fragments
            .iter()
            .map(|fragment| xmlrpc_codec::decode(fragment))
            .collect::<xmlrpc_codec::Result<Vec<Value>>>()?;
        Ok(values)
    }

    /// Start a batch without waiting for it; see [`PendingCall::wait_batch`].
    pub fn issue_multicall(&self, calls: &[Call]) -> Result<PendingCall> {
        let method = self.config().multicall_method.as_str();
        let body = envelope::build(method, &multicall_params(calls)?);
        let methods: Arc<[String]> = calls.iter().map(|c| c.method().to_owned()).collect();
        self.issue_envelope(method, body, Some(methods))
    }
}
