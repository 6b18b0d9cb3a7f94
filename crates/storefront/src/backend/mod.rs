//! Client for the remote fabrication backend.
//!
//! # Architecture
//!
//! - The backend is the source of truth for the catalog, company content,
//!   accounts, and orders; the storefront holds no database.
//! - Every endpoint speaks the same `{ success, data | error }` JSON
//!   envelope; business failures surface the server's error text verbatim.
//! - Catalog and content reads are cached in-memory via `moka` (5-minute
//!   TTL). Auth and order calls always hit the network.
//! - Authenticated calls send `Authorization: Token <token>`; a 401 maps to
//!   [`BackendError::Unauthorized`], which the auth store turns into a
//!   forced logout.

mod cache;
mod client;
pub mod types;

pub use client::BackendClient;
pub use types::*;

use thiserror::Error;

/// Errors from the fabrication backend API.
#[derive(Debug, Error)]
pub enum BackendError {
    /// HTTP request failed (network, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body was not the expected envelope.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Request URL could not be built.
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Token missing, invalid, or revoked.
    #[error("authentication required")]
    Unauthorized,

    /// Resource does not exist.
    #[error("not found")]
    NotFound,

    /// The backend rejected the request; carries its error text verbatim.
    #[error("{0}")]
    Rejected(String),

    /// Unexpected HTTP status with no envelope body.
    #[error("backend returned HTTP {0}")]
    Status(reqwest::StatusCode),

    /// Successful envelope with no data payload where one was required.
    #[error("backend response contained no data")]
    Empty,
}

impl BackendError {
    /// Text suitable for an error toast. Business rejections pass through
    /// verbatim; everything else gets a generic message.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Rejected(text) => text.clone(),
            Self::Unauthorized => "Your session has expired. Please sign in again.".to_owned(),
            Self::NotFound => "The requested item could not be found.".to_owned(),
            _ => "Something went wrong. Please try again.".to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_error_passes_text_verbatim() {
        let err = BackendError::Rejected("El pedido ya fue confirmado".to_owned());
        assert_eq!(err.to_string(), "El pedido ya fue confirmado");
        assert_eq!(err.user_message(), "El pedido ya fue confirmado");
    }

    #[test]
    fn test_transport_error_gets_generic_message() {
        let err = BackendError::Empty;
        assert_eq!(err.user_message(), "Something went wrong. Please try again.");
    }
}
