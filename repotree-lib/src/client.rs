//! Main DashboardClient

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::HeaderMap;
use reqwest::header::HeaderValue;
use reqwest::header::COOKIE;
use reqwest::Client;
use reqwest::RequestBuilder;

use crate::error::ApiError;
use crate::error::Error;

/// Default path of the backend's login entry point.
pub const DEFAULT_LOGIN_PATH: &str = "/api/auth/login";

/// The client for the repository dashboard backend.
///
/// This client is cheap to clone (uses `Arc` internally) and can be shared
/// across threads safely.
///
/// # Example
///
/// ```ignore
/// use repotree_lib::DashboardClient;
///
/// let client = DashboardClient::builder()
///     .url("http://localhost:5000")
///     .session_cookie("session=abc123")
///     .build();
///
/// let repos = client.list_repositories().await?;
/// ```
#[derive(Clone)]
pub struct DashboardClient {
    pub(crate) inner: Arc<DashboardClientInner>,
}

pub(crate) struct DashboardClientInner {
    pub(crate) base_url: String,
    pub(crate) login_path: String,
    pub(crate) http_client: Client,
    pub(crate) timeout: Option<Duration>,
}

impl DashboardClient {
    /// Creates a new builder for constructing a client.
    pub fn builder() -> DashboardClientBuilder<Missing> {
        DashboardClientBuilder::new()
    }

    /// Returns the base URL of the backend.
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// Returns the absolute URL users are sent to when a call comes back 401.
    pub fn login_url(&self) -> String {
        self.url(&self.inner.login_path)
    }

    /// Joins an absolute API path onto the base URL.
    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.inner.base_url.trim_end_matches('/'), path)
    }

    /// Sends a request, applying the configured timeout.
    pub(crate) async fn send(&self, mut request: RequestBuilder) -> Result<reqwest::Response, ApiError> {
        if let Some(timeout) = self.inner.timeout {
            request = request.timeout(timeout);
        }

        request.send().await.map_err(|e| {
            if e.is_timeout() {
                ApiError::Timeout(self.inner.timeout.unwrap_or_default())
            } else if e.is_builder() {
                ApiError::InvalidUrl(e.url().map(|u| u.to_string()).unwrap_or_default())
            } else {
                ApiError::Network(e)
            }
        })
    }

    /// Checks the status of a response from a GitHub-proxied endpoint.
    ///
    /// HTTP 401 becomes [`Error::NotAuthenticated`]; any other non-success
    /// status becomes [`Error::Fetch`].
    pub(crate) async fn check_github(&self, response: reqwest::Response) -> Result<reqwest::Response, Error> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let error = ApiError::http(status.as_u16(), body);
        if error.is_unauthorized() {
            return Err(Error::NotAuthenticated {
                login_url: self.login_url(),
            });
        }
        Err(Error::Fetch(error))
    }
}

impl std::fmt::Debug for DashboardClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DashboardClient")
            .field("base_url", &self.inner.base_url)
            .field("login_path", &self.inner.login_path)
            .field("timeout", &self.inner.timeout)
            .finish()
    }
}

// =============================================================================
// Typestate Builder
// =============================================================================

/// Marker type for missing required builder fields.
pub struct Missing;

/// Marker type for set builder fields.
pub struct Set<T>(T);

/// Builder for constructing a [`DashboardClient`].
///
/// Uses the typestate pattern so `build()` is only available once the
/// backend URL has been set.
///
/// # Example
///
/// ```ignore
/// let client = DashboardClient::builder()
///     .url("http://localhost:5000")
///     .timeout(Duration::from_secs(30))
///     .build();
/// ```
pub struct DashboardClientBuilder<Url> {
    url: Url,
    login_path: String,
    session_cookie: Option<String>,
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    http_client: Option<Client>,
}

impl DashboardClientBuilder<Missing> {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            url: Missing,
            login_path: DEFAULT_LOGIN_PATH.to_string(),
            session_cookie: None,
            timeout: None,
            connect_timeout: None,
            http_client: None,
        }
    }

    /// Sets the backend base URL.
    ///
    /// # Example
    ///
    /// ```ignore
    /// .url("http://localhost:5000")
    /// ```
    pub fn url(self, url: impl Into<String>) -> DashboardClientBuilder<Set<String>> {
        DashboardClientBuilder {
            url: Set(url.into()),
            login_path: self.login_path,
            session_cookie: self.session_cookie,
            timeout: self.timeout,
            connect_timeout: self.connect_timeout,
            http_client: self.http_client,
        }
    }
}

impl Default for DashboardClientBuilder<Missing> {
    fn default() -> Self {
        Self::new()
    }
}

impl<U> DashboardClientBuilder<U> {
    /// Sets the path of the login entry point.
    ///
    /// Defaults to `/api/auth/login`.
    pub fn login_path(mut self, path: impl Into<String>) -> Self {
        self.login_path = path.into();
        self
    }

    /// Sends the given `Cookie` header value with every request.
    ///
    /// The backend keys its GitHub session off a browser cookie; this is how
    /// a non-browser caller presents it.
    pub fn session_cookie(mut self, cookie: impl Into<String>) -> Self {
        self.session_cookie = Some(cookie.into());
        self
    }

    /// Sets the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the connection timeout.
    ///
    /// This is applied when building the HTTP client.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Sets a custom HTTP client.
    ///
    /// If set, `connect_timeout` and `session_cookie` are not applied to it.
    pub fn http_client(mut self, client: Client) -> Self {
        self.http_client = Some(client);
        self
    }
}

impl DashboardClientBuilder<Set<String>> {
    /// Builds the [`DashboardClient`].
    pub fn build(self) -> DashboardClient {
        let session_cookie = self.session_cookie;
        let connect_timeout = self.connect_timeout;
        let http_client = self.http_client.unwrap_or_else(|| {
            let mut builder = Client::builder();
            if let Some(timeout) = connect_timeout {
                builder = builder.connect_timeout(timeout);
            }
            if let Some(value) = session_cookie.and_then(|c| HeaderValue::from_str(&c).ok()) {
                let mut headers = HeaderMap::new();
                headers.insert(COOKIE, value);
                builder = builder.default_headers(headers);
            }
            builder.build().expect("Failed to build HTTP client")
        });

        DashboardClient {
            inner: Arc::new(DashboardClientInner {
                base_url: self.url.0,
                login_path: self.login_path,
                http_client,
                timeout: self.timeout,
            }),
        }
    }
}
