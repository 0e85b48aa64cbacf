use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use super::AuthError;
use crate::api::client::csrf_header_value;
use crate::api::{ApiClient, ApiError, RequestOptions, CSRF_HEADER};
use crate::models::User;

const CURRENT_USER_PATH: &str = "auth/current-user/";
const LOGIN_PATH: &str = "auth/login/";
const LOGOUT_PATH: &str = "auth/logout/";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStatus {
    Unauthenticated,
    /// An auth operation is in flight
    Authenticating,
    Authenticated,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionState {
    pub is_authenticated: bool,
    pub current_user: Option<User>,
    pub loading: bool,
    /// When the backend last confirmed or denied the session
    pub last_checked: Option<DateTime<Utc>>,
}

impl SessionState {
    pub fn status(&self) -> AuthStatus {
        if self.loading {
            AuthStatus::Authenticating
        } else if self.is_authenticated {
            AuthStatus::Authenticated
        } else {
            AuthStatus::Unauthenticated
        }
    }
}

#[derive(Debug, Deserialize)]
struct CurrentUserResponse {
    #[serde(default)]
    authenticated: bool,
    user: Option<User>,
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct AuthResponse {
    #[serde(default)]
    success: bool,
    user: Option<User>,
    message: Option<String>,
}

/// Owns the session state. Only `check_auth`, `login` and `logout` change it.
///
/// Overlapping calls are not serialized; whichever finishes last decides
/// the state.
pub struct SessionGuard {
    api: ApiClient,
    state: RwLock<SessionState>,
}

/// Clears `loading` when an operation finishes, however it finishes
struct LoadingGuard<'a> {
    guard: &'a SessionGuard,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.guard.update(|state| state.loading = false);
    }
}

impl SessionGuard {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            state: RwLock::new(SessionState::default()),
        }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Snapshot of the current state
    pub fn state(&self) -> SessionState {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn status(&self) -> AuthStatus {
        self.state().status()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state().is_authenticated
    }

    pub fn current_user(&self) -> Option<User> {
        self.state().current_user
    }

    pub fn is_loading(&self) -> bool {
        self.state().loading
    }

    fn update(&self, f: impl FnOnce(&mut SessionState)) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut state);
    }

    fn begin(&self) -> LoadingGuard<'_> {
        self.update(|state| state.loading = true);
        LoadingGuard { guard: self }
    }

    fn set_authenticated(&self, user: Option<User>) {
        self.update(|state| {
            state.is_authenticated = true;
            state.current_user = user;
            state.last_checked = Some(Utc::now());
        });
    }

    fn set_unauthenticated(&self) {
        self.update(|state| {
            state.is_authenticated = false;
            state.current_user = None;
            state.last_checked = Some(Utc::now());
        });
    }

    /// Ask the backend whether the session cookie is still valid.
    ///
    /// Any failure counts as unauthenticated.
    pub async fn check_auth(&self) -> AuthStatus {
        let loading = self.begin();

        match self.fetch_current_user().await {
            Ok(CurrentUserResponse {
                authenticated: true,
                user,
            }) => {
                debug!("Session is authenticated");
                self.set_authenticated(user);
            }
            Ok(_) => {
                debug!("Session is not authenticated");
                self.set_unauthenticated();
            }
            Err(e) => {
                error!(error = %e, "Error checking auth status");
                self.set_unauthenticated();
            }
        }

        drop(loading);
        self.status()
    }

    /// Log in with a username and password.
    ///
    /// State is only changed when the backend reports success.
    pub async fn login(&self, username: &str, password: &str) -> Result<Option<User>, AuthError> {
        let _loading = self.begin();

        let body = LoginRequest { username, password };
        let response = self
            .send_auth_request(LOGIN_PATH, Some(&body))
            .await
            .map_err(|e| {
                error!(error = %e, "Login error");
                AuthError::Network(e)
            })?;

        if response.success {
            info!(username = %username, "Login successful");
            self.set_authenticated(response.user.clone());
            Ok(response.user)
        } else {
            info!(username = %username, "Login rejected");
            Err(AuthError::Rejected {
                message: response.message,
            })
        }
    }

    /// End the backend session.
    ///
    /// State is only changed when the backend reports success.
    pub async fn logout(&self) -> Result<(), AuthError> {
        let _loading = self.begin();

        let response = self
            .send_auth_request(LOGOUT_PATH, None::<&LoginRequest<'_>>)
            .await
            .map_err(|e| {
                error!(error = %e, "Logout error");
                AuthError::Network(e)
            })?;

        if response.success {
            info!("Logout successful");
            self.set_unauthenticated();
            Ok(())
        } else {
            Err(AuthError::Rejected {
                message: response.message,
            })
        }
    }

    async fn fetch_current_user(&self) -> Result<CurrentUserResponse, ApiError> {
        let response = self
            .api
            .get(&self.api.endpoint(CURRENT_USER_PATH), RequestOptions::new())
            .await?;
        response.json()
    }

    /// POST to an auth endpoint with a token resolved exactly once.
    ///
    /// A token that cannot be resolved is sent as an empty header.
    async fn send_auth_request<B: Serialize>(
        &self,
        path: &str,
        body: Option<&B>,
    ) -> Result<AuthResponse, ApiError> {
        let token = self.api.csrf().resolve().await;
        let options = RequestOptions::new().header(CSRF_HEADER, csrf_header_value(token.as_deref())?);
        let url = self.api.endpoint(path);

        let response = match body {
            Some(body) => self.api.post(&url, body, options).await?,
            None => self.api.request(&url, options.method(Method::POST)).await?,
        };
        response.json()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_from_state() {
        let mut state = SessionState::default();
        assert_eq!(state.status(), AuthStatus::Unauthenticated);

        state.loading = true;
        assert_eq!(state.status(), AuthStatus::Authenticating);

        state.is_authenticated = true;
        assert_eq!(state.status(), AuthStatus::Authenticating);

        state.loading = false;
        assert_eq!(state.status(), AuthStatus::Authenticated);
    }

    #[test]
    fn test_auth_response_defaults_to_failure() {
        let response: AuthResponse = serde_json::from_str(r#"{"message": "nope"}"#).expect("parse");
        assert!(!response.success);
        assert_eq!(response.message.as_deref(), Some("nope"));

        let current: CurrentUserResponse = serde_json::from_str("{}").expect("parse");
        assert!(!current.authenticated);
        assert!(current.user.is_none());
    }
}
