//! Jira Cloud API client implementation.
//!
//! This module provides the shared transport used by every service: building
//! requests against the configured base URL, applying credentials, sending them
//! and decoding JSON responses or error payloads. No retries are performed;
//! a failed call returns its error immediately.

use std::time::Duration;

use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE, USER_AGENT};
use reqwest::multipart::Form;
use reqwest::{Body, Method, Request, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use super::auth::Auth;
use super::error::ApiError;
use super::response::{Pagination, Response};
use crate::config::{Profile, Settings};
use crate::error::{Error, Result};

/// Placeholder base URL, to be replaced with the caller's own site.
pub const DEFAULT_BASE_URL: &str = "https://your-domain.atlassian.net";

/// The Jira REST API version targeted by this client.
pub const API_VERSION: &str = "3";

/// Default `User-Agent` header value.
pub const DEFAULT_USER_AGENT: &str = "go-jira/1.0";

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Header required by Jira on multipart and raw uploads.
const ATLASSIAN_TOKEN_HEADER: &str = "x-atlassian-token";

const JSON: &str = "application/json";

/// Placeholder for requests without a body.
pub const NO_BODY: Option<&()> = None;

/// The Jira Cloud API client.
///
/// Cheap to clone and safe to share between tasks: all configuration is
/// read-only after construction and every call keeps its state local.
#[derive(Debug, Clone)]
pub struct Client {
    /// The HTTP client.
    http: reqwest::Client,
    /// The base URL for the Jira site.
    base_url: Url,
    /// The user agent sent with every request.
    user_agent: String,
    /// Pre-validated user agent header.
    user_agent_header: HeaderValue,
    /// Authentication credentials, if any.
    auth: Option<Auth>,
}

/// Builder for [`Client`].
#[derive(Debug)]
pub struct ClientBuilder {
    base_url: String,
    auth: Option<Auth>,
    http: Option<reqwest::Client>,
    user_agent: String,
    timeout: Duration,
}

impl ClientBuilder {
    fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            auth: None,
            http: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Authenticate with an account email and API token.
    pub fn with_basic_auth(mut self, email: &str, api_token: &str) -> Self {
        self.auth = Some(Auth::basic(email, api_token));
        self
    }

    /// Authenticate with a bearer token.
    pub fn with_bearer_token(mut self, token: &str) -> Self {
        self.auth = Some(Auth::bearer(token));
        self
    }

    /// Use already constructed credentials.
    pub fn with_auth(mut self, auth: Auth) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Use a custom HTTP client. Its own timeout settings take precedence.
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = Some(http);
        self
    }

    /// Set the `User-Agent` header value.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the overall request timeout of the default HTTP client.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build the client.
    ///
    /// An empty base URL falls back to [`DEFAULT_BASE_URL`].
    ///
    /// # Errors
    ///
    /// Returns `InvalidBaseUrl` if the base URL cannot be parsed or cannot
    /// carry a path, and `Network` if the HTTP client cannot be built.
    pub fn build(self) -> Result<Client> {
        let base_url = parse_base_url(&self.base_url)?;

        let http = match self.http {
            Some(http) => http,
            None => reqwest::Client::builder().timeout(self.timeout).build()?,
        };

        let (user_agent, user_agent_header) = match HeaderValue::from_str(&self.user_agent) {
            Ok(value) => (self.user_agent, value),
            Err(_) => {
                warn!(user_agent = %self.user_agent, "Invalid user agent, using default");
                (
                    DEFAULT_USER_AGENT.to_string(),
                    HeaderValue::from_static(DEFAULT_USER_AGENT),
                )
            }
        };

        debug!(base_url = %base_url, authenticated = self.auth.is_some(), "Jira client built");

        Ok(Client {
            http,
            base_url,
            user_agent,
            user_agent_header,
            auth: self.auth,
        })
    }
}

impl Client {
    /// Create an unauthenticated client with default settings.
    pub fn new(base_url: &str) -> Result<Self> {
        Self::builder(base_url).build()
    }

    /// Start configuring a client for the given base URL.
    pub fn builder(base_url: impl Into<String>) -> ClientBuilder {
        ClientBuilder::new(base_url)
    }

    /// Create a client from a stored profile.
    ///
    /// The API token is read from the OS keyring under the profile name.
    ///
    /// # Errors
    ///
    /// Returns an error if the profile is invalid, the token cannot be
    /// retrieved, or the client cannot be built.
    #[instrument(skip(profile, settings), fields(profile_name = %profile.name))]
    pub fn from_profile(profile: &Profile, settings: &Settings) -> Result<Self> {
        profile.validate()?;
        let auth = Auth::from_keyring(&profile.name, &profile.email)?;

        let client = Self::builder(profile.url.as_str())
            .with_auth(auth)
            .with_user_agent(settings.user_agent.as_str())
            .with_timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        info!("Jira client created from profile");
        Ok(client)
    }

    /// The base URL all paths are resolved against.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The `User-Agent` header value.
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// The configured credentials.
    pub fn auth(&self) -> Option<&Auth> {
        self.auth.as_ref()
    }

    /// Resolve a relative path against the base URL.
    ///
    /// The base path is kept and joined to the path with exactly one `/`.
    /// Absolute URLs are refused so requests cannot leave the configured site,
    /// and so are `.` and `..` segments, which would be collapsed into a
    /// different resource.
    fn resolve(&self, path: &str) -> Result<Url> {
        if Url::parse(path).is_ok_and(|url| url.has_host()) || has_dot_segment(path) {
            return Err(Error::InvalidPath(path.to_string()));
        }
        let base = self.base_url.as_str().trim_end_matches('/');
        let joined = format!("{}/{}", base, path.trim_start_matches('/'));
        Url::parse(&joined).map_err(|e| Error::InvalidPath(format!("{}: {}", path, e)))
    }

    fn standard_headers(&self, headers: &mut HeaderMap) {
        headers.insert(ACCEPT, HeaderValue::from_static(JSON));
        headers.insert(USER_AGENT, self.user_agent_header.clone());
        if let Some(auth) = &self.auth {
            auth.apply(headers);
        }
    }

    /// Build a request with an optional JSON body.
    ///
    /// The body is encoded with `serde_json`, which leaves `<`, `>` and `&`
    /// unescaped so JQL and free text reach the server verbatim.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPath` if the path cannot be resolved and
    /// `Serialization` if the body cannot be encoded.
    pub fn new_request<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<Request> {
        let url = self.resolve(path)?;
        let mut request = Request::new(method, url);

        if let Some(body) = body {
            let encoded = serde_json::to_vec(body).map_err(Error::Serialization)?;
            request
                .headers_mut()
                .insert(CONTENT_TYPE, HeaderValue::from_static(JSON));
            *request.body_mut() = Some(Body::from(encoded));
        }

        self.standard_headers(request.headers_mut());
        Ok(request)
    }

    /// Build a `multipart/form-data` upload request.
    pub fn new_multipart_request(&self, method: Method, path: &str, form: Form) -> Result<Request> {
        let url = self.resolve(path)?;
        let mut request = self.http.request(method, url).multipart(form).build()?;

        let headers = request.headers_mut();
        headers.insert(ATLASSIAN_TOKEN_HEADER, HeaderValue::from_static("no-check"));
        self.standard_headers(headers);
        Ok(request)
    }

    /// Build a request carrying a raw binary body such as an image.
    pub fn new_raw_request(
        &self,
        method: Method,
        path: &str,
        content_type: &'static str,
        body: impl Into<Body>,
    ) -> Result<Request> {
        let url = self.resolve(path)?;
        let mut request = Request::new(method, url);
        *request.body_mut() = Some(body.into());

        let headers = request.headers_mut();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
        headers.insert(ATLASSIAN_TOKEN_HEADER, HeaderValue::from_static("no-check"));
        self.standard_headers(headers);
        Ok(request)
    }

    /// Send a request and fail with an [`ApiError`] on a non-2xx status.
    async fn send(&self, request: Request) -> Result<reqwest::Response> {
        let method = request.method().clone();
        let url = request.url().clone();
        debug!(%method, %url, "Sending request");

        let response = self.http.execute(request).await?;
        let status = response.status();
        if status.is_success() {
            debug!(status = status.as_u16(), "Request succeeded");
            return Ok(response);
        }

        let body = match response.bytes().await {
            Ok(body) => body,
            Err(e) => {
                debug!(status = status.as_u16(), error = %e, "Failed to read error body");
                Bytes::new()
            }
        };
        let error = ApiError::from_response(status, method, url.as_str(), &body);
        warn!(status = status.as_u16(), %url, "Jira returned an error: {}", error);
        Err(error.into())
    }

    async fn read(&self, request: Request) -> Result<(StatusCode, HeaderMap, Url, Bytes)> {
        let url = request.url().clone();
        let response = self.send(request).await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;
        Ok((status, headers, url, body))
    }

    /// Send a request and decode the JSON body into `T`.
    ///
    /// A 204 status or an empty body yields `T::default()` without decoding.
    ///
    /// # Errors
    ///
    /// `Api` on a non-2xx status, `Decode` when a 2xx body is not valid for
    /// `T`, `Network` on transport failure.
    #[instrument(skip(self, request), fields(method = %request.method(), url = %request.url()))]
    pub async fn execute<T: DeserializeOwned + Default>(&self, request: Request) -> Result<Response<T>> {
        let (status, headers, url, body) = self.read(request).await?;
        let pagination = Pagination::from_body(&body);
        let data = decode_body(status, &url, &body)?;
        Ok(Response::new(status, headers, url, pagination, data))
    }

    /// Send a request whose response body is not needed.
    #[instrument(skip(self, request), fields(method = %request.method(), url = %request.url()))]
    pub async fn execute_empty(&self, request: Request) -> Result<Response<()>> {
        let url = request.url().clone();
        let response = self.send(request).await?;
        Ok(Response::new(
            response.status(),
            response.headers().clone(),
            url,
            Pagination::default(),
            (),
        ))
    }

    /// Send a request and return the raw body bytes without JSON decoding.
    #[instrument(skip(self, request), fields(method = %request.method(), url = %request.url()))]
    pub async fn execute_bytes(&self, request: Request) -> Result<Response<Bytes>> {
        let (status, headers, url, body) = self.read(request).await?;
        Ok(Response::new(status, headers, url, Pagination::default(), body))
    }

    /// Send a request and hand back the unread response for streaming.
    ///
    /// The status is checked first; read the body with
    /// [`reqwest::Response::chunk`] or `bytes_stream`.
    #[instrument(skip(self, request), fields(method = %request.method(), url = %request.url()))]
    pub async fn execute_stream(&self, request: Request) -> Result<reqwest::Response> {
        self.send(request).await
    }

    /// Build and execute a JSON request.
    pub(crate) async fn call<T, B>(&self, method: Method, path: &str, body: Option<&B>) -> Result<Response<T>>
    where
        T: DeserializeOwned + Default,
        B: Serialize + ?Sized,
    {
        let request = self.new_request(method, path, body)?;
        self.execute(request).await
    }

    /// Build and execute a request whose response body is discarded.
    pub(crate) async fn call_empty<B>(&self, method: Method, path: &str, body: Option<&B>) -> Result<Response<()>>
    where
        B: Serialize + ?Sized,
    {
        let request = self.new_request(method, path, body)?;
        self.execute_empty(request).await
    }

    pub(crate) async fn get<T: DeserializeOwned + Default>(&self, path: &str) -> Result<Response<T>> {
        self.call(Method::GET, path, NO_BODY).await
    }

    pub(crate) async fn post<T, B>(&self, path: &str, body: &B) -> Result<Response<T>>
    where
        T: DeserializeOwned + Default,
        B: Serialize + ?Sized,
    {
        self.call(Method::POST, path, Some(body)).await
    }

    pub(crate) async fn put<T, B>(&self, path: &str, body: &B) -> Result<Response<T>>
    where
        T: DeserializeOwned + Default,
        B: Serialize + ?Sized,
    {
        self.call(Method::PUT, path, Some(body)).await
    }

    pub(crate) async fn delete(&self, path: &str) -> Result<Response<()>> {
        self.call_empty(Method::DELETE, path, NO_BODY).await
    }

    pub(crate) async fn get_bytes(&self, path: &str) -> Result<Response<Bytes>> {
        let request = self.new_request(Method::GET, path, NO_BODY)?;
        self.execute_bytes(request).await
    }
}

/// Decode a successful response body.
fn decode_body<T: DeserializeOwned + Default>(status: StatusCode, url: &Url, body: &[u8]) -> Result<T> {
    if status == StatusCode::NO_CONTENT || body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|source| Error::Decode {
        url: url.to_string(),
        source,
    })
}

/// Parse and normalize the base URL.
fn parse_base_url(raw: &str) -> Result<Url> {
    let trimmed = normalize_base_url(raw);
    let trimmed = if trimmed.is_empty() { DEFAULT_BASE_URL } else { trimmed };

    let url = Url::parse(trimmed).map_err(|e| Error::InvalidBaseUrl(format!("{}: {}", raw, e)))?;
    if url.cannot_be_a_base() {
        return Err(Error::InvalidBaseUrl(format!("{}: cannot carry a path", raw)));
    }
    Ok(url)
}

/// Remove trailing slashes, warning when the URL is not HTTPS.
fn normalize_base_url(url: &str) -> &str {
    let url = url.trim().trim_end_matches('/');

    if !url.is_empty()
        && !url.starts_with("https://")
        && !url.contains("localhost")
        && !url.contains("127.0.0.1")
    {
        warn!("URL does not use HTTPS: {}. This is insecure for production use.", url);
    }

    url
}

/// Check the path part of `path` for segments URL parsing would normalize
/// away, including their percent-encoded spellings.
fn has_dot_segment(path: &str) -> bool {
    let end = path.find(['?', '#']).unwrap_or(path.len());
    path[..end].split('/').any(|segment| {
        let segment = segment.to_ascii_lowercase().replace("%2e", ".");
        segment == "." || segment == ".."
    })
}
