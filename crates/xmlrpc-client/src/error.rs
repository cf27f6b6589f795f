use xmlrpc_codec::{CodecError, Fault};
use xmlrpc_transport::TransportError;

/// Errors that can occur while performing a call.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Transport-level error, including non-2xx statuses.
    #[error("request error: {0}")]
    Transport(#[from] TransportError),

    /// Encoding the request or decoding the response failed, or the server
    /// answered with a fault.
    #[error("{0}")]
    Codec(#[from] CodecError),

    /// The client was closed before the call completed.
    #[error("client closed")]
    Closed,

    /// The async runtime backing the client could not be used.
    #[error("runtime error: {0}")]
    Runtime(String),
}

impl ClientError {
    /// The remote fault, for whole-call and multicall faults alike.
    pub fn fault(&self) -> Option<&Fault> {
        match self {
            Self::Codec(err) => err.fault(),
            _ => None,
        }
    }

    pub fn is_type_mismatch(&self) -> bool {
        matches!(self, Self::Codec(err) if err.is_type_mismatch())
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
