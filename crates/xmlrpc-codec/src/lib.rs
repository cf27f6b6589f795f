//! XML-RPC wire format: values, call envelopes, response classification and
//! `system.multicall` splitting.
//!
//! Values are encoded through [`ToXmlRpc`] and decoded through
//! [`FromXmlRpc`] by walking the XML token stream straight into the
//! destination type:
//! - scalars map to Rust primitives, `String`, [`Blob`] and chrono timestamps
//! - `<array>` maps to `Vec<T>`, `<struct>` to string-keyed maps or to
//!   records deriving [`XmlRpc`]
//! - [`Value`] holds anything when the shape is not known ahead of time
//!
//! Nothing here performs I/O.

extern crate self as xmlrpc_codec;

pub mod datetime;
pub mod decode;
pub mod encode;
pub mod envelope;
pub mod error;
pub mod multicall;
pub mod params;
pub mod record;
pub mod response;
pub mod value;

pub use decode::{decode, Decoder, FromXmlRpc, Head};
pub use encode::{encode, Encoder, ToXmlRpc};
pub use envelope::{build, encode_call, CONTENT_TYPE, XML_DECLARATION};
pub use error::{CodecError, Fault, MulticallFault, Result};
pub use multicall::{multicall_params, split, split_calls, MULTICALL_METHOD};
pub use params::{Call, IntoParams, Params};
pub use record::{Record, RecordLayout};
pub use response::{classify, has_fault_marker, Response};
pub use value::{Blob, Value, WireKind};

#[cfg(feature = "derive")]
pub use xmlrpc_derive::XmlRpc;
