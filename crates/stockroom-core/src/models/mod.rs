//! Data models shared between the API client and the session guard.

pub mod user;

pub use user::User;
