//! Authentication module for tracking the backend session.
//!
//! This module provides:
//! - `SessionGuard`: owns the session state and the three operations
//!   that change it (`check_auth`, `login`, `logout`)
//! - `SessionState` / `AuthStatus`: snapshots of that state
//! - `AuthError`: structured failures of login and logout
//!
//! Session state is never persisted; it is rebuilt by asking the backend.

pub mod error;
pub mod session;

pub use error::AuthError;
pub use session::{AuthStatus, SessionGuard, SessionState};
