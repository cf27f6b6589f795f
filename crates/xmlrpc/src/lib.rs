//! Concurrent XML-RPC client with typed values and `system.multicall`
//! batching.
//!
//! ```no_run
//! use xmlrpc::BlockingClient;
//!
//! let client = BlockingClient::connect("https://bugzilla.example.org/xmlrpc.cgi")?;
//! let version: std::collections::BTreeMap<String, String> = client.call("Bugzilla.version", ())?;
//! # Ok::<(), xmlrpc::ClientError>(())
//! ```
//!
//! # Crate Structure
//!
//! - [`codec`]: Wire values, call envelopes, fault classification, multicall splitting
//! - [`transport`]: The HTTP exchange seam and its reqwest implementation
//! - [`client`]: Call correlation, async and blocking clients (behind `client` feature)

/// Re-export codec types.
pub mod codec {
    pub use xmlrpc_codec::*;
}

/// Re-export transport types.
pub mod transport {
    pub use xmlrpc_transport::*;
}

/// Re-export client types (requires `client` feature).
#[cfg(feature = "client")]
pub mod client {
    pub use xmlrpc_client::*;
}

pub use xmlrpc_codec::{
    Blob, Call, CodecError, Fault, FromXmlRpc, IntoParams, MulticallFault, Params, Record,
    ToXmlRpc, Value,
};
pub use xmlrpc_transport::{HttpTransport, ReqwestTransport, TransportConfig, TransportError};

#[cfg(feature = "derive")]
pub use xmlrpc_codec::XmlRpc;

#[cfg(feature = "client")]
pub use xmlrpc_client::{BlockingClient, Client, ClientConfig, ClientError, Destination};
