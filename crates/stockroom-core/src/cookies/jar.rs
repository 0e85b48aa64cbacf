use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{PoisonError, RwLock};

use anyhow::{Context, Result};
use chrono::Utc;
use cookie::Cookie;
use tracing::{debug, warn};

use super::CookieStore;

/// In-memory cookie jar keyed by cookie name.
#[derive(Debug, Default)]
pub struct CookieJar {
    cookies: RwLock<BTreeMap<String, Cookie<'static>>>,
}

impl CookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load cookies from disk. A missing file yields an empty jar.
    pub fn load(path: &Path) -> Result<Self> {
        let jar = Self::new();
        if !path.exists() {
            return Ok(jar);
        }

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read cookie file: {}", path.display()))?;
        let entries: Vec<String> = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse cookie file: {}", path.display()))?;

        for entry in entries {
            match Cookie::parse(entry) {
                Ok(cookie) => jar.set(cookie),
                Err(e) => warn!(error = %e, "Skipping unreadable stored cookie"),
            }
        }
        debug!(count = jar.len(), "Loaded cookies");
        Ok(jar)
    }

    /// Save cookies to disk in `Set-Cookie` form.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let entries: Vec<String> = self
            .read()
            .values()
            .map(|cookie| cookie.to_string())
            .collect();
        let contents = serde_json::to_string_pretty(&entries)?;
        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write cookie file: {}", path.display()))?;
        Ok(())
    }

    /// Remove a cookie by name, returning whether it was present
    pub fn remove(&self, name: &str) -> bool {
        self.write().remove(name).is_some()
    }

    pub fn clear(&self) {
        self.write().clear();
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Full cookie (with attributes) for a name
    pub fn cookie(&self, name: &str) -> Option<Cookie<'static>> {
        self.read().get(name).cloned()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, BTreeMap<String, Cookie<'static>>> {
        self.cookies.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, BTreeMap<String, Cookie<'static>>> {
        self.cookies.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// A server deletes a cookie by sending it with a zero max-age or a past expiry.
    fn is_deletion(cookie: &Cookie<'_>) -> bool {
        if cookie.max_age().is_some_and(|age| age.whole_seconds() <= 0) {
            return true;
        }
        cookie
            .expires_datetime()
            .is_some_and(|expires| expires.unix_timestamp() <= Utc::now().timestamp())
    }
}

impl CookieStore for CookieJar {
    fn header(&self) -> Option<String> {
        let cookies = self.read();
        if cookies.is_empty() {
            return None;
        }
        let header = cookies
            .values()
            .map(|cookie| format!("{}={}", cookie.name(), cookie.value()))
            .collect::<Vec<_>>()
            .join("; ");
        Some(header)
    }

    fn set(&self, cookie: Cookie<'static>) {
        let name = cookie.name().to_string();
        if Self::is_deletion(&cookie) {
            debug!(cookie = %name, "Cookie removed by server");
            self.write().remove(&name);
        } else {
            self.write().insert(name, cookie);
        }
    }
}

#[cfg(test)]
mod tests {
    use cookie::SameSite;

    use super::*;
    use crate::cookies::CSRF_COOKIE;

    #[test]
    fn test_set_and_get() {
        let jar = CookieJar::new();
        assert!(jar.is_empty());
        assert_eq!(jar.header(), None);

        jar.set(Cookie::new("sessionid", "s1"));
        jar.set(Cookie::new(CSRF_COOKIE, "t1"));

        assert_eq!(jar.get(CSRF_COOKIE), Some("t1".to_string()));
        assert_eq!(jar.get("sessionid"), Some("s1".to_string()));
        assert_eq!(jar.get("missing"), None);
        assert_eq!(jar.header(), Some("csrftoken=t1; sessionid=s1".to_string()));
    }

    #[test]
    fn test_set_replaces_same_name() {
        let jar = CookieJar::new();
        jar.set(Cookie::new(CSRF_COOKIE, "old"));
        jar.set(Cookie::new(CSRF_COOKIE, "new"));
        assert_eq!(jar.len(), 1);
        assert_eq!(jar.get(CSRF_COOKIE), Some("new".to_string()));
    }

    #[test]
    fn test_server_deletion_removes_cookie() {
        let jar = CookieJar::new();
        jar.set(Cookie::new("sessionid", "s1"));

        let deletion = Cookie::parse("sessionid=\"\"; expires=Thu, 01 Jan 1970 00:00:00 GMT; Max-Age=0; Path=/")
            .expect("valid cookie");
        jar.set(deletion);

        assert_eq!(jar.get("sessionid"), None);
        assert!(jar.is_empty());
    }

    #[test]
    fn test_save_and_load_round_trip_keeps_attributes() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("nested").join("cookies.json");

        let jar = CookieJar::new();
        jar.set(
            Cookie::build((CSRF_COOKIE, "t1"))
                .path("/")
                .same_site(SameSite::Strict)
                .build(),
        );
        jar.set(Cookie::new("sessionid", "s1"));
        jar.save(&path).expect("save");

        let loaded = CookieJar::load(&path).expect("load");
        assert_eq!(loaded.len(), 2);
        let csrf = loaded.cookie(CSRF_COOKIE).expect("csrf cookie");
        assert_eq!(csrf.value(), "t1");
        assert_eq!(csrf.path(), Some("/"));
        assert_eq!(csrf.same_site(), Some(SameSite::Strict));
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = tempfile::tempdir().expect("temp dir");
        let jar = CookieJar::load(&dir.path().join("absent.json")).expect("load");
        assert!(jar.is_empty());
    }
}
