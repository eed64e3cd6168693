//! Backend seam: the admin mutation endpoint and the configuration source.
//!
//! The UI only talks to [`AdminBackend`]; [`http::HttpBackend`] is the
//! production implementation and tests substitute in-memory ones.

pub mod action;
pub mod http;

use async_trait::async_trait;

use crate::model::ConfigSnapshot;

pub use action::{ActionKey, AdminAction, GroupAction, KeyTarget};
pub use http::HttpBackend;

/// Failure of a backend call, displayed to the operator as-is.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ActionError {
    /// The server answered with a non-success status.
    #[error("{message}")]
    Rejected { status: u16, message: String },
    #[error("request failed: {0}")]
    Network(String),
    #[error("invalid response: {0}")]
    Decode(String),
}

impl ActionError {
    /// Build a rejection from a status and an optional server-provided message.
    pub fn rejected(status: u16, message: Option<String>) -> Self {
        let message = message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| format!("operation failed: {status}"));
        ActionError::Rejected { status, message }
    }
}

#[async_trait]
pub trait AdminBackend: Send + Sync {
    /// Perform one mutation. Any non-success answer is an error.
    async fn submit(&self, action: &AdminAction) -> Result<(), ActionError>;

    /// Fetch the authoritative configuration snapshot.
    async fn fetch_config(&self) -> Result<ConfigSnapshot, ActionError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_prefers_server_message() {
        let err = ActionError::rejected(409, Some("user exists".into()));
        assert_eq!(err.to_string(), "user exists");
    }

    #[test]
    fn rejection_synthesizes_from_status() {
        assert_eq!(ActionError::rejected(500, None).to_string(), "operation failed: 500");
        assert_eq!(
            ActionError::rejected(403, Some("  ".into())).to_string(),
            "operation failed: 403"
        );
    }
}
