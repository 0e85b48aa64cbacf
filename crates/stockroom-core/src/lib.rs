//! Core library for stockroom - a client for the inventory backend.
//!
//! Provides the CSRF-aware request wrapper, the session guard that tracks
//! whether the backend session is authenticated, and the route table with
//! its navigation guard.

pub mod api;
pub mod auth;
pub mod config;
pub mod cookies;
pub mod models;
pub mod router;

pub use api::{ApiClient, ApiError, ApiResponse, Credentials, RequestOptions, ResponseData};
pub use auth::{AuthError, AuthStatus, SessionGuard, SessionState};
pub use config::Config;
pub use cookies::{CookieJar, CookieStore};
pub use models::User;
pub use router::{Navigation, NavigationError, Route, Router, View};

pub use reqwest::{Method, StatusCode};
