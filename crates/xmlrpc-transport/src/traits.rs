use async_trait::async_trait;
use bytes::Bytes;

use crate::error::{Result, TransportError};

/// Content type of XML-RPC request bodies.
pub const XML_CONTENT_TYPE: &str = "text/xml";

/// A request body ready to be POSTed to the endpoint.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// The complete `<methodCall>` document.
    pub body: Bytes,
    /// Value of the `Content-Type` header.
    pub content_type: &'static str,
}

impl HttpRequest {
    /// A `text/xml` request carrying `body`.
    pub fn xml(body: impl Into<Bytes>) -> Self {
        Self {
            body: body.into(),
            content_type: XML_CONTENT_TYPE,
        }
    }

    /// Value of the `Content-Length` header.
    pub fn content_length(&self) -> usize {
        self.body.len()
    }
}

/// The status and raw body of an HTTP response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Bytes,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// A `200 OK` response.
    pub fn ok(body: impl Into<Bytes>) -> Self {
        Self::new(200, body)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Turn a status outside 200–299 into [`TransportError::Status`].
    pub fn error_for_status(self) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(TransportError::Status {
                status: self.status,
            })
        }
    }
}

/// One HTTP POST exchange per call.
///
/// Implementations must be safe to share between concurrently running
/// exchanges. The client never retries and never follows up on a request
/// once `post` returns.
#[async_trait]
pub trait HttpTransport: Send + Sync + 'static {
    /// POST `request` to the endpoint and return the response, whatever its status.
    async fn post(&self, request: HttpRequest) -> Result<HttpResponse>;

    /// Release idle connections. Later exchanges may fail with
    /// [`TransportError::Closed`].
    fn close(&self) {}
}

#[async_trait]
impl<T: HttpTransport + ?Sized> HttpTransport for std::sync::Arc<T> {
    async fn post(&self, request: HttpRequest) -> Result<HttpResponse> {
        (**self).post(request).await
    }

    fn close(&self) {
        (**self).close()
    }
}
