#![allow(dead_code)]

use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use xmlrpc_transport::{HttpRequest, HttpResponse, HttpTransport, TransportError};

/// Method name carried by a request envelope.
pub fn method_of(request: &HttpRequest) -> String {
    let body = String::from_utf8_lossy(&request.body);
    body.split_once("<methodName>")
        .and_then(|(_, rest)| rest.split_once("</methodName>"))
        .map(|(name, _)| name.to_owned())
        .unwrap_or_default()
}

/// A successful response carrying one param.
pub fn params_body(value: &str) -> String {
    format!(
        "<?xml version=\"1.0\"?><methodResponse><params><param>{value}</param></params></methodResponse>"
    )
}

pub fn fault_body(code: i64, message: &str) -> String {
    format!(
        "<?xml version=\"1.0\"?><methodResponse><fault><value><struct>\
         <member><name>faultCode</name><value><int>{code}</int></value></member>\
         <member><name>faultString</name><value><string>{message}</string></value></member>\
         </struct></value></fault></methodResponse>"
    )
}

/// Answers each request synchronously through a closure.
pub struct FnTransport<F> {
    respond: F,
}

impl<F> FnTransport<F>
where
    F: Fn(&HttpRequest) -> Result<HttpResponse, TransportError> + Send + Sync + 'static,
{
    pub fn new(respond: F) -> Self {
        Self { respond }
    }
}

#[async_trait]
impl<F> HttpTransport for FnTransport<F>
where
    F: Fn(&HttpRequest) -> Result<HttpResponse, TransportError> + Send + Sync + 'static,
{
    async fn post(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        (self.respond)(&request)
    }
}

/// An exchange parked until the test releases it.
pub struct Arrival {
    pub method: String,
    pub request: HttpRequest,
    pub release: oneshot::Sender<Result<HttpResponse, TransportError>>,
}

/// Holds every exchange open until the test answers it, so completion
/// order is decided by the test.
pub struct GatedTransport {
    arrivals: mpsc::UnboundedSender<Arrival>,
    closed: Mutex<bool>,
}

impl GatedTransport {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Arrival>) {
        let (arrivals, rx) = mpsc::unbounded_channel();
        (
            Self {
                arrivals,
                closed: Mutex::new(false),
            },
            rx,
        )
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.lock().unwrap()
    }
}

#[async_trait]
impl HttpTransport for GatedTransport {
    async fn post(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let (release, gate) = oneshot::channel();
        let arrival = Arrival {
            method: method_of(&request),
            request,
            release,
        };
        self.arrivals
            .send(arrival)
            .map_err(|_| TransportError::Exchange("test harness gone".into()))?;
        gate.await
            .map_err(|_| TransportError::Exchange("gate dropped".into()))?
    }

    fn close(&self) {
        *self.closed.lock().unwrap() = true;
    }
}
