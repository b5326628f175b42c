use thiserror::Error;

use crate::modules::config::ConfigError;

/// Shown when a failure carries no server-authored text
pub const GENERIC_FAILURE: &str = "Something went wrong. Please try again.";

#[derive(Debug, Error)]
pub enum PortalError {
    /// Network, TLS or timeout failure; the server never answered usefully
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered and refused the request
    #[error("{}", .0.as_deref().unwrap_or(GENERIC_FAILURE))]
    Rejected(Option<String>),

    #[error("unexpected response: {0}")]
    Decode(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl PortalError {
    /// Text suitable for the user; only rejections carry server wording
    pub fn user_message(&self) -> String {
        match self {
            PortalError::Rejected(Some(text)) if !text.trim().is_empty() => text.clone(),
            _ => GENERIC_FAILURE.to_string(),
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, PortalError::Transport(_))
    }
}

/// Result of a remote call as seen by the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestOutcome {
    Success(String),
    Failure(String),
}

impl RequestOutcome {
    pub fn from_result(result: Result<String, PortalError>) -> Self {
        match result {
            Ok(message) => RequestOutcome::Success(message),
            Err(e) => RequestOutcome::Failure(e.user_message()),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, RequestOutcome::Success(_))
    }

    pub fn message(&self) -> &str {
        match self {
            RequestOutcome::Success(m) | RequestOutcome::Failure(m) => m,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_keeps_server_text() {
        let err = PortalError::Rejected(Some("Wrong OTP".to_string()));
        assert_eq!(err.user_message(), "Wrong OTP");
        assert_eq!(err.to_string(), "Wrong OTP");
    }

    #[test]
    fn test_rejection_without_text_is_generic() {
        assert_eq!(PortalError::Rejected(None).user_message(), GENERIC_FAILURE);
        assert_eq!(
            PortalError::Rejected(Some("  ".to_string())).user_message(),
            GENERIC_FAILURE
        );
        assert_eq!(PortalError::Rejected(None).to_string(), GENERIC_FAILURE);
    }

    #[test]
    fn test_outcome_from_result() {
        let ok = RequestOutcome::from_result(Ok("OTP sent".to_string()));
        assert!(ok.is_success());
        assert_eq!(ok.message(), "OTP sent");

        let failed = RequestOutcome::from_result(Err(PortalError::Decode("bad".into())));
        assert_eq!(failed, RequestOutcome::Failure(GENERIC_FAILURE.to_string()));
    }
}
