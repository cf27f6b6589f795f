//! HTTP transport for XML-RPC.
//!
//! Every call is one POST of a `text/xml` body to a fixed endpoint. The
//! [`HttpTransport`] trait is the seam the client talks to; it can be
//! swapped for a mock or another HTTP stack. [`ReqwestTransport`] is the
//! stock implementation with connection reuse, cookies and basic auth.

pub mod config;
pub mod error;
pub mod http;
pub mod traits;

pub use config::{
    BasicAuth, CookiePolicy, Credentials, TransportConfig, DEFAULT_MAX_RESPONSE_SIZE,
    DEFAULT_TIMEOUT,
};
pub use error::{Result, TransportError};
pub use http::ReqwestTransport;
pub use traits::{HttpRequest, HttpResponse, HttpTransport, XML_CONTENT_TYPE};

pub use reqwest::cookie::Jar;
