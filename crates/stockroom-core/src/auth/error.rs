use thiserror::Error;

use crate::api::ApiError;

/// Message shown when the backend could not be reached or understood
pub const NETWORK_ERROR_MESSAGE: &str = "Network error occurred";

#[derive(Error, Debug)]
pub enum AuthError {
    /// The backend answered but did not report success
    #[error("{}", .message.as_deref().unwrap_or("Request was rejected"))]
    Rejected { message: Option<String> },

    /// Transport failure or an unreadable response
    #[error("Network error occurred")]
    Network(#[source] ApiError),
}

impl AuthError {
    /// Message suitable for showing to the user
    pub fn user_message(&self) -> String {
        match self {
            AuthError::Rejected { message: Some(message) } => message.clone(),
            AuthError::Rejected { message: None } => "Request was rejected".to_string(),
            AuthError::Network(_) => NETWORK_ERROR_MESSAGE.to_string(),
        }
    }

    pub fn is_network(&self) -> bool {
        matches!(self, AuthError::Network(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message() {
        let rejected = AuthError::Rejected {
            message: Some("bad credentials".to_string()),
        };
        assert_eq!(rejected.user_message(), "bad credentials");
        assert_eq!(rejected.to_string(), "bad credentials");
        assert!(!rejected.is_network());

        let bare = AuthError::Rejected { message: None };
        assert_eq!(bare.to_string(), "Request was rejected");

        let network = AuthError::Network(ApiError::InvalidResponse("truncated".to_string()));
        assert_eq!(network.user_message(), NETWORK_ERROR_MESSAGE);
        assert!(network.is_network());
    }
}
