//! Twilio Messages API client.
//!
//! One call per outbound send: `POST
//! /2010-04-01/Accounts/{AccountSid}/Messages.json` with HTTP basic auth and
//! a form-encoded body. Media, when present, is passed as a single `MediaUrl`
//! element per provider convention.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

use crate::provider::{MessagingProvider, ProviderError, ProviderReceipt};
use crate::support::core::config::ProviderConfig;

/// Twilio REST API version path segment.
const API_VERSION: &str = "2010-04-01";

/// HTTP client timeout for send requests.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
/// Connection timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Successful send response; only the sid is of interest.
#[derive(Debug, Deserialize)]
struct SendResponse {
    sid: String,
}

/// Twilio error response body.
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    message: String,
}

/// Twilio implementation of the messaging provider.
pub struct TwilioClient {
    account_sid: String,
    auth_token: String,
    endpoint: Url,
    client: reqwest::Client,
}

impl TwilioClient {
    /// Create a Twilio client from the provider configuration.
    ///
    /// # Errors
    /// Returns an error if the base URL is invalid or the HTTP client cannot
    /// be created.
    pub fn new(config: &ProviderConfig) -> Result<Self, ProviderError> {
        let endpoint = messages_endpoint(&config.api_base, &config.account_sid)?;

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| ProviderError::HttpClient(e.to_string()))?;

        Ok(Self {
            account_sid: config.account_sid.clone(),
            auth_token: config.auth_token.clone(),
            endpoint,
            client,
        })
    }
}

#[async_trait]
impl MessagingProvider for TwilioClient {
    async fn send(
        &self,
        from: &str,
        to: &str,
        body: Option<&str>,
        media_url: Option<&str>,
    ) -> Result<ProviderReceipt, ProviderError> {
        if self.account_sid.is_empty() || self.auth_token.is_empty() {
            return Err(ProviderError::NotConfigured);
        }

        let params = build_params(from, to, body, media_url);
        let response = self
            .client
            .post(self.endpoint.clone())
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let raw = response.text().await.unwrap_or_default();
            return Err(ProviderError::Rejected {
                status,
                message: extract_error_message(&raw),
            });
        }

        let accepted: SendResponse = response.json().await?;
        Ok(ProviderReceipt { sid: accepted.sid })
    }
}

/// Build the Messages.json endpoint for an account.
fn messages_endpoint(api_base: &str, account_sid: &str) -> Result<Url, ProviderError> {
    let url = format!(
        "{}/{API_VERSION}/Accounts/{account_sid}/Messages.json",
        api_base.trim_end_matches('/')
    );
    Ok(Url::parse(&url)?)
}

/// Build form parameters for a send request.
fn build_params(
    from: &str,
    to: &str,
    body: Option<&str>,
    media_url: Option<&str>,
) -> Vec<(&'static str, String)> {
    let mut params = vec![("From", from.to_string()), ("To", to.to_string())];
    if let Some(body) = body {
        params.push(("Body", body.to_string()));
    }
    if let Some(media_url) = media_url {
        params.push(("MediaUrl", media_url.to_string()));
    }
    params
}

/// Pull the human-readable message out of a Twilio error body, falling back
/// to the raw body when it is not the expected JSON shape.
fn extract_error_message(raw: &str) -> String {
    serde_json::from_str::<ErrorResponse>(raw)
        .map(|e| e.message)
        .unwrap_or_else(|_| raw.to_string())
}
