//! REST API client module for the inventory backend.
//!
//! This module provides the `ApiClient` request wrapper and the
//! `CsrfResolver` it uses to obtain CSRF tokens.
//!
//! The backend authenticates with a session cookie and rejects
//! state-changing requests that lack a matching `X-CSRFToken` header.

pub mod client;
pub mod csrf;
pub mod error;

pub use client::{
    ApiClient, ApiResponse, Credentials, RequestOptions, ResponseData, CSRF_HEADER,
};
pub use csrf::CsrfResolver;
pub use error::ApiError;
