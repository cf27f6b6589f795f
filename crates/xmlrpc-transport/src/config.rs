use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use reqwest::cookie::Jar;

/// Default maximum response body size: 16 MiB.
pub const DEFAULT_MAX_RESPONSE_SIZE: u64 = 16 * 1024 * 1024;

/// Default timeout for a whole exchange.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Supplies HTTP credentials for each request.
pub trait Credentials: Send + Sync {
    fn basic_auth(&self) -> Option<BasicAuth>;
}

/// HTTP basic authentication.
#[derive(Clone, PartialEq, Eq)]
pub struct BasicAuth {
    pub username: String,
    pub password: Option<String>,
}

impl BasicAuth {
    pub fn new(username: impl Into<String>, password: Option<String>) -> Self {
        Self {
            username: username.into(),
            password,
        }
    }
}

impl Credentials for BasicAuth {
    fn basic_auth(&self) -> Option<BasicAuth> {
        Some(self.clone())
    }
}

impl fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicAuth")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Where cookies set by the server are kept between calls.
#[derive(Clone, Default)]
pub enum CookiePolicy {
    /// A jar private to the transport.
    #[default]
    Private,
    /// A jar shared with other transports or inspected by the caller.
    Shared(Arc<Jar>),
    /// Cookies are ignored.
    Disabled,
}

impl fmt::Debug for CookiePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Private => f.write_str("Private"),
            Self::Shared(_) => f.write_str("Shared"),
            Self::Disabled => f.write_str("Disabled"),
        }
    }
}

/// Configuration for [`ReqwestTransport`](crate::ReqwestTransport).
#[derive(Clone)]
pub struct TransportConfig {
    /// Endpoint every request is POSTed to.
    pub url: String,
    /// Timeout for one whole exchange. `None` waits forever.
    pub timeout: Option<Duration>,
    /// Timeout for establishing a connection.
    pub connect_timeout: Option<Duration>,
    /// Value of the `User-Agent` header.
    pub user_agent: String,
    /// Responses larger than this are rejected.
    pub max_response_size: u64,
    pub credentials: Option<Arc<dyn Credentials>>,
    pub cookies: CookiePolicy,
}

impl TransportConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_max_response_size(mut self, max: u64) -> Self {
        self.max_response_size = max;
        self
    }

    pub fn with_credentials(mut self, credentials: impl Credentials + 'static) -> Self {
        self.credentials = Some(Arc::new(credentials));
        self
    }

    pub fn with_basic_auth(self, username: impl Into<String>, password: Option<String>) -> Self {
        self.with_credentials(BasicAuth::new(username, password))
    }

    pub fn with_cookies(mut self, cookies: CookiePolicy) -> Self {
        self.cookies = cookies;
        self
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            timeout: Some(DEFAULT_TIMEOUT),
            connect_timeout: None,
            user_agent: concat!("xmlrpc/", env!("CARGO_PKG_VERSION")).to_owned(),
            max_response_size: DEFAULT_MAX_RESPONSE_SIZE,
            credentials: None,
            cookies: CookiePolicy::default(),
        }
    }
}

impl fmt::Debug for TransportConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportConfig")
            .field("url", &self.url)
            .field("timeout", &self.timeout)
            .field("connect_timeout", &self.connect_timeout)
            .field("user_agent", &self.user_agent)
            .field("max_response_size", &self.max_response_size)
            .field("credentials", &self.credentials.as_ref().map(|_| "<redacted>"))
            .field("cookies", &self.cookies)
            .finish()
    }
}
