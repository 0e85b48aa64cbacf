//! Cookie storage for the backend session.
//!
//! This module provides:
//! - `CookieStore`: key-value access to the cookies held for the backend
//! - `CookieJar`: the in-memory store, optionally persisted to disk
//!
//! The HTTP client reads and writes the same store, so `sessionid` and
//! `csrftoken` set by the backend are visible to the CSRF resolver and
//! vice versa.

pub mod jar;

use std::sync::Arc;

use cookie::Cookie;
use percent_encoding::percent_decode_str;
use reqwest::header::HeaderValue;
use tracing::debug;
use url::{Origin, Url};

pub use jar::CookieJar;

/// Name of the cookie holding the CSRF token
pub const CSRF_COOKIE: &str = "csrftoken";

/// Key-value view over the cookies held for the backend.
pub trait CookieStore: Send + Sync {
    /// All stored cookies rendered as a `Cookie:` request header value,
    /// or `None` when the store is empty.
    fn header(&self) -> Option<String>;

    /// Store a cookie, replacing any cookie with the same name.
    fn set(&self, cookie: Cookie<'static>);

    /// Look up a single cookie value by name.
    fn get(&self, name: &str) -> Option<String> {
        self.header().and_then(|header| parse_cookie_header(&header, name))
    }
}

/// Extract the value of `name` from a `name=value; other=value` cookie string.
///
/// Entries are trimmed before matching and the value is percent-decoded.
/// The first matching entry wins.
pub fn parse_cookie_header(header: &str, name: &str) -> Option<String> {
    header
        .split(';')
        .map(str::trim)
        .find_map(|entry| {
            entry
                .strip_prefix(name)
                .and_then(|rest| rest.strip_prefix('='))
        })
        .map(|value| percent_decode_str(value).decode_utf8_lossy().into_owned())
}

/// Adapter exposing a `CookieStore` to reqwest as its cookie provider.
///
/// The store belongs to one backend origin. Requests to any other origin
/// carry no cookies, and cookies they set are dropped.
pub(crate) struct HttpCookies {
    store: Arc<dyn CookieStore>,
    origin: Origin,
}

impl HttpCookies {
    pub(crate) fn new(store: Arc<dyn CookieStore>, backend: &Url) -> Self {
        Self {
            store,
            origin: backend.origin(),
        }
    }

    fn in_scope(&self, url: &Url) -> bool {
        url.origin() == self.origin
    }
}

impl reqwest::cookie::CookieStore for HttpCookies {
    fn set_cookies(&self, cookie_headers: &mut dyn Iterator<Item = &HeaderValue>, url: &Url) {
        if !self.in_scope(url) {
            debug!(%url, "Ignoring cookies from another origin");
            return;
        }
        for value in cookie_headers {
            let Ok(raw) = value.to_str() else {
                continue;
            };
            match Cookie::parse(raw.to_owned()) {
                Ok(cookie) => self.store.set(cookie),
                Err(e) => debug!(error = %e, "Ignoring malformed Set-Cookie header"),
            }
        }
    }

    fn cookies(&self, url: &Url) -> Option<HeaderValue> {
        if !self.in_scope(url) {
            return None;
        }
        self.store
            .header()
            .and_then(|header| HeaderValue::from_str(&header).ok())
    }
}
