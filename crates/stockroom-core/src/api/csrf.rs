//! CSRF token resolution.
//!
//! The token normally arrives as the `csrftoken` cookie set by the backend.
//! When it is missing, it is fetched from the token endpoint and stored as a
//! cookie so later requests skip the round trip.

use std::sync::Arc;

use cookie::{Cookie, SameSite};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use super::ApiError;
use crate::cookies::{CookieStore, CSRF_COOKIE};

#[derive(Debug, Deserialize)]
struct CsrfTokenResponse {
    #[serde(rename = "csrfToken")]
    csrf_token: String,
}

/// Resolves CSRF tokens from cookie storage, falling back to the backend.
/// Clone is cheap - the client and store are shared.
#[derive(Clone)]
pub struct CsrfResolver {
    client: Client,
    cookies: Arc<dyn CookieStore>,
    token_url: Url,
}

impl CsrfResolver {
    /// `client` must send the stored cookies with its requests
    pub fn new(client: Client, cookies: Arc<dyn CookieStore>, token_url: Url) -> Self {
        Self {
            client,
            cookies,
            token_url,
        }
    }

    /// Read the token from cookie storage. An empty cookie counts as absent.
    pub fn from_storage(&self) -> Option<String> {
        self.cookies.get(CSRF_COOKIE).filter(|token| !token.is_empty())
    }

    /// Fetch a token from the backend and store it as a cookie.
    ///
    /// Failures are logged and reported as `None`; no cookie is written.
    pub async fn from_network(&self) -> Option<String> {
        match self.fetch_token().await {
            Ok(token) => {
                self.cookies.set(
                    Cookie::build((CSRF_COOKIE, token.clone()))
                        .path("/")
                        .same_site(SameSite::Strict)
                        .build(),
                );
                debug!("Stored CSRF token fetched from API");
                Some(token)
            }
            Err(e) => {
                warn!(error = %e, url = %self.token_url, "Could not fetch CSRF token from API");
                None
            }
        }
    }

    /// Storage first, network second
    pub async fn resolve(&self) -> Option<String> {
        match self.from_storage() {
            Some(token) => Some(token),
            None => self.from_network().await,
        }
    }

    async fn fetch_token(&self) -> Result<String, ApiError> {
        let response = self.client.get(self.token_url.clone()).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::status(status, &body));
        }

        let body = response.text().await?;
        let parsed: CsrfTokenResponse = serde_json::from_str(&body)
            .map_err(|e| ApiError::InvalidResponse(format!("CSRF token response: {}", e)))?;
        Ok(parsed.csrf_token)
    }
}
