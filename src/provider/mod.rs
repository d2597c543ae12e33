//! Messaging provider integration.
//!
//! The API layer talks to the provider through the [`MessagingProvider`]
//! trait; the production implementation is the Twilio client in
//! [`twilio`]. Send failures are never retried or recovered here — they
//! surface to the caller, and nothing is persisted for a failed send.

pub mod twilio;

pub use twilio::TwilioClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The provider's acknowledgement of an accepted send request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderReceipt {
    /// Provider-assigned message identifier.
    pub sid: String,
}

/// Errors from the messaging provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// HTTP transport failure before a provider response was obtained.
    #[error("HTTP request failed: {0}")]
    HttpRequest(#[from] reqwest::Error),

    /// HTTP client configuration error.
    #[error("HTTP client error: {0}")]
    HttpClient(String),

    /// The provider rejected the request (bad number, auth failure, rate
    /// limit, ...), with its status and reason.
    #[error("provider rejected request ({status}): {message}")]
    Rejected {
        /// HTTP status returned by the provider.
        status: u16,
        /// Provider-supplied error message.
        message: String,
    },

    /// Provider base URL could not be parsed.
    #[error("invalid provider base URL: {0}")]
    InvalidBaseUrl(#[from] url::ParseError),

    /// Credentials are missing from the configuration.
    #[error("provider credentials not configured")]
    NotConfigured,
}

/// Outbound send interface to the external messaging provider.
#[async_trait]
pub trait MessagingProvider: Send + Sync {
    /// Dispatch one outbound message and return the provider's receipt.
    ///
    /// # Errors
    /// Returns an error if the provider rejects the request or the transport
    /// fails; the failure is not recovered locally.
    async fn send(
        &self,
        from: &str,
        to: &str,
        body: Option<&str>,
        media_url: Option<&str>,
    ) -> Result<ProviderReceipt, ProviderError>;
}
