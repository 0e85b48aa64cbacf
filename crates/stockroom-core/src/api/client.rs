//! API client for the inventory backend.
//!
//! Every backend call goes through `ApiClient::request`, which attaches the
//! session cookies and, for state-changing methods, the `X-CSRFToken` header.
//! Responses are decoded as JSON or text depending on their content type.

use std::borrow::Cow;
use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue, IntoHeaderName};
use reqwest::{Client, Method, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use super::csrf::CsrfResolver;
use super::ApiError;
use crate::config::Config;
use crate::cookies::{CookieStore, HttpCookies};

// ============================================================================
// Constants
// ============================================================================

/// Header carrying the CSRF token on state-changing requests (`X-CSRFToken`)
pub const CSRF_HEADER: HeaderName = HeaderName::from_static("x-csrftoken");

/// Segment every backend path must start with
const API_SEGMENT: &str = "/api";

/// Inventory paths written without the API segment
const BARE_INVENTORY_PREFIX: &str = "/inventory/";

/// Relative path of the token endpoint under the API root
const CSRF_TOKEN_PATH: &str = "csrf-token/";

/// Methods that require a CSRF token
const STATE_CHANGING_METHODS: [&str; 4] = ["POST", "PUT", "PATCH", "DELETE"];

// ============================================================================
// Request / response types
// ============================================================================

/// Whether cookies accompany a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Credentials {
    #[default]
    Include,
    SameOrigin,
    Omit,
}

/// Caller-supplied request options. Unset fields fall back to the defaults
/// computed by `ApiClient::request`; set fields replace them.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub method: Option<Method>,
    pub headers: HeaderMap,
    pub body: Option<String>,
    pub credentials: Option<Credentials>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    pub fn header<K: IntoHeaderName>(mut self, name: K, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }
}

/// Decoded response body
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseData {
    Json(Value),
    Text(String),
}

impl ResponseData {
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            ResponseData::Json(value) => Some(value),
            ResponseData::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ResponseData::Text(text) => Some(text),
            ResponseData::Json(_) => None,
        }
    }
}

/// Outcome of a request. Non-2xx statuses are reported here, not as errors.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub ok: bool,
    pub status: StatusCode,
    pub data: ResponseData,
}

impl ApiResponse {
    async fn from_response(response: reqwest::Response) -> Result<Self, ApiError> {
        let status = response.status();
        let is_json = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|content_type| content_type.contains("application/json"));

        let body = response.text().await?;
        let data = if is_json {
            let value = serde_json::from_str(&body).map_err(|e| {
                ApiError::InvalidResponse(format!("Failed to parse JSON response: {}", e))
            })?;
            ResponseData::Json(value)
        } else {
            ResponseData::Text(body)
        };

        Ok(Self {
            ok: status.is_success(),
            status,
            data,
        })
    }

    /// Deserialize the JSON body into `T`
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        match &self.data {
            ResponseData::Json(value) => T::deserialize(value).map_err(|e| {
                ApiError::InvalidResponse(format!("Unexpected response shape: {}", e))
            }),
            ResponseData::Text(_) => Err(ApiError::InvalidResponse(format!(
                "Expected JSON response, got text (status {})",
                self.status
            ))),
        }
    }
}

// ============================================================================
// Client
// ============================================================================

/// API client for the inventory backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    /// Sends and receives cookies through the shared store
    client: Client,
    /// Used for `Credentials::Omit`
    anonymous: Client,
    base_url: Url,
    api_root: String,
    cookies: Arc<dyn CookieStore>,
    csrf: CsrfResolver,
}

impl ApiClient {
    pub fn new(config: &Config, cookies: Arc<dyn CookieStore>) -> Result<Self, ApiError> {
        let base_url = Url::parse(&config.base_url)?;
        let timeout = config.request_timeout_secs.map(Duration::from_secs);

        let mut builder =
            Client::builder().cookie_provider(Arc::new(HttpCookies::new(cookies.clone(), &base_url)));
        let mut anonymous = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
            anonymous = anonymous.timeout(timeout);
        }
        let client = builder.build()?;
        let anonymous = anonymous.build()?;

        let api_root = config.api_root();
        let token_url = base_url.join(&format!("{}/{}", api_root, CSRF_TOKEN_PATH))?;
        let csrf = CsrfResolver::new(client.clone(), cookies.clone(), token_url);

        Ok(Self {
            client,
            anonymous,
            base_url,
            api_root,
            cookies,
            csrf,
        })
    }

    pub fn csrf(&self) -> &CsrfResolver {
        &self.csrf
    }

    pub fn cookies(&self) -> &Arc<dyn CookieStore> {
        &self.cookies
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Path of an endpoint under the API root, e.g. `auth/login/`
    pub fn endpoint(&self, relative: &str) -> String {
        format!("{}/{}", self.api_root, relative.trim_start_matches('/'))
    }

    /// Resolve a caller URL against the backend origin.
    ///
    /// Absolute URLs are used as given; session cookies only go with them
    /// when they point at the backend origin.
    pub fn resolve_url(&self, url: &str) -> Result<Url, ApiError> {
        if url.starts_with("http://") || url.starts_with("https://") {
            return Ok(Url::parse(url)?);
        }
        Ok(self.base_url.join(&normalize_path(url))?)
    }

    /// Issue a request with session cookies and CSRF protection attached.
    ///
    /// When `options` already carries `X-CSRFToken` no token is resolved.
    /// Only transport failures and undecodable JSON bodies are errors.
    pub async fn request(&self, url: &str, options: RequestOptions) -> Result<ApiResponse, ApiError> {
        let url = self.resolve_url(url)?;
        let method = options.method.unwrap_or(Method::GET);
        let state_changing = is_state_changing(&method);

        // A caller-supplied token replaces the computed one, so skip resolving
        let caller_token = options.headers.contains_key(CSRF_HEADER);
        let token = if caller_token {
            None
        } else if state_changing {
            self.csrf.resolve().await
        } else {
            self.csrf.from_storage()
        };

        let headers = merge_headers(default_headers(token.as_deref())?, options.headers);

        if state_changing && token.is_none() && !caller_token {
            warn!(%method, %url, "CSRF token not found but required for this request");
        }

        let client = match options.credentials.unwrap_or_default() {
            Credentials::Omit => &self.anonymous,
            Credentials::Include | Credentials::SameOrigin => &self.client,
        };

        debug!(%method, %url, "Sending request");
        let mut request = client.request(method, url).headers(headers);
        if let Some(body) = options.body {
            request = request.body(body);
        }
        let response = request.send().await?;

        ApiResponse::from_response(response).await
    }

    // ===== Convenience methods =====

    pub async fn get(&self, url: &str, options: RequestOptions) -> Result<ApiResponse, ApiError> {
        self.request(url, options.method(Method::GET)).await
    }

    pub async fn post<B: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &B,
        options: RequestOptions,
    ) -> Result<ApiResponse, ApiError> {
        self.request(url, options.method(Method::POST).body(encode_body(body)?))
            .await
    }

    pub async fn put<B: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &B,
        options: RequestOptions,
    ) -> Result<ApiResponse, ApiError> {
        self.request(url, options.method(Method::PUT).body(encode_body(body)?))
            .await
    }

    pub async fn patch<B: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &B,
        options: RequestOptions,
    ) -> Result<ApiResponse, ApiError> {
        self.request(url, options.method(Method::PATCH).body(encode_body(body)?))
            .await
    }

    pub async fn delete(&self, url: &str, options: RequestOptions) -> Result<ApiResponse, ApiError> {
        self.request(url, options.method(Method::DELETE)).await
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Prefix bare inventory paths with the API segment. Idempotent.
pub fn normalize_path(url: &str) -> Cow<'_, str> {
    if url.starts_with(BARE_INVENTORY_PREFIX) {
        Cow::Owned(format!("{}{}", API_SEGMENT, url))
    } else {
        Cow::Borrowed(url)
    }
}

/// POST, PUT, PATCH and DELETE, in any letter case
pub fn is_state_changing(method: &Method) -> bool {
    STATE_CHANGING_METHODS
        .iter()
        .any(|m| method.as_str().eq_ignore_ascii_case(m))
}

/// Header value for `X-CSRFToken`; a missing token becomes an empty value
pub fn csrf_header_value(token: Option<&str>) -> Result<HeaderValue, ApiError> {
    HeaderValue::from_str(token.unwrap_or_default()).map_err(|_| ApiError::InvalidHeader("X-CSRFToken"))
}

fn default_headers(token: Option<&str>) -> Result<HeaderMap, ApiError> {
    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
    if let Some(token) = token {
        headers.insert(CSRF_HEADER, csrf_header_value(Some(token))?);
    }
    Ok(headers)
}

/// Caller headers replace defaults with the same name
fn merge_headers(mut defaults: HeaderMap, overrides: HeaderMap) -> HeaderMap {
    let mut current: Option<HeaderName> = None;
    for (name, value) in overrides {
        match name {
            Some(name) => {
                defaults.insert(name.clone(), value);
                current = Some(name);
            }
            // Further values for the previous header name
            None => {
                if let Some(ref name) = current {
                    defaults.append(name, value);
                }
            }
        }
    }
    defaults
}

/// Strings are sent verbatim, anything else as JSON
fn encode_body<B: Serialize + ?Sized>(body: &B) -> Result<String, ApiError> {
    match serde_json::to_value(body)? {
        Value::String(text) => Ok(text),
        other => Ok(other.to_string()),
    }
}
