use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use bytes::BytesMut;
use reqwest::header::CONTENT_TYPE;
use tracing::debug;
use url::Url;

use crate::config::{CookiePolicy, Credentials, TransportConfig};
use crate::error::{Result, TransportError};
use crate::traits::{HttpRequest, HttpResponse, HttpTransport};

/// HTTP transport backed by a shared [`reqwest::Client`].
///
/// The client keeps a connection pool and a cookie jar across calls.
/// [`close`](HttpTransport::close) drops the client, releasing its idle
/// connections; exchanges already in flight keep their own handle.
pub struct ReqwestTransport {
    url: Url,
    client: RwLock<Option<reqwest::Client>>,
    credentials: Option<Arc<dyn Credentials>>,
    config: TransportConfig,
}

impl ReqwestTransport {
    /// Transport to `url` with default settings.
    pub fn new(url: &str) -> Result<Self> {
        Self::with_config(TransportConfig::new(url))
    }

    pub fn with_config(config: TransportConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder().user_agent(config.user_agent.as_str());
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(timeout) = config.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        builder = match &config.cookies {
            CookiePolicy::Private => builder.cookie_store(true),
            CookiePolicy::Shared(jar) => builder.cookie_provider(Arc::clone(jar)),
            CookiePolicy::Disabled => builder,
        };
        let client = builder.build().map_err(TransportError::Build)?;
        Self::with_client(client, config)
    }

    /// Use an already configured HTTP client.
    ///
    /// Timeouts and cookie handling are whatever `client` was built with;
    /// `config` supplies the endpoint, credentials and size limit.
    pub fn with_client(client: reqwest::Client, config: TransportConfig) -> Result<Self> {
        let url = parse_url(&config.url)?;
        debug!(%url, "http transport ready");
        Ok(Self {
            url,
            client: RwLock::new(Some(client)),
            credentials: config.credentials.clone(),
            config,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    fn client(&self) -> Result<reqwest::Client> {
        self.client
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(TransportError::Closed)
    }

    fn map_error(&self, err: reqwest::Error) -> TransportError {
        if err.is_timeout() {
            TransportError::Timeout(self.config.timeout.unwrap_or_default())
        } else {
            TransportError::Http(err)
        }
    }

    fn check_size(&self, size: u64) -> Result<()> {
        let max = self.config.max_response_size;
        if size > max {
            return Err(TransportError::BodyTooLarge { size, max });
        }
        Ok(())
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn post(&self, request: HttpRequest) -> Result<HttpResponse> {
        let client = self.client()?;
        let length = request.content_length();
        let mut builder = client
            .post(self.url.clone())
            .header(CONTENT_TYPE, request.content_type)
            .body(request.body);
        if let Some(auth) = self.credentials.as_ref().and_then(|c| c.basic_auth()) {
            builder = builder.basic_auth(auth.username, auth.password);
        }

        let mut response = builder.send().await.map_err(|e| self.map_error(e))?;
        let status = response.status().as_u16();
        if let Some(declared) = response.content_length() {
            self.check_size(declared)?;
        }
        let mut buffer = BytesMut::new();
        while let Some(chunk) = response.chunk().await.map_err(|e| self.map_error(e))? {
            // Chunked bodies carry no length up front.
            self.check_size((buffer.len() + chunk.len()) as u64)?;
            buffer.extend_from_slice(&chunk);
        }
        let body = buffer.freeze();

        debug!(
            url = %self.url,
            status,
            sent = length,
            received = body.len(),
            "http exchange completed"
        );
        Ok(HttpResponse { status, body })
    }

    fn close(&self) {
        let released = self
            .client
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if released.is_some() {
            debug!(url = %self.url, "http transport closed");
        }
    }
}

impl std::fmt::Debug for ReqwestTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestTransport")
            .field("url", &self.url.as_str())
            .field("config", &self.config)
            .finish()
    }
}

fn parse_url(url: &str) -> Result<Url> {
    let parsed = Url::parse(url).map_err(|e| TransportError::InvalidUrl {
        url: url.to_owned(),
        reason: e.to_string(),
    })?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        scheme => Err(TransportError::InvalidUrl {
            url: url.to_owned(),
            reason: format!("unsupported scheme {scheme:?}"),
        }),
    }
}
