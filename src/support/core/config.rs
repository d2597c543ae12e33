//! Configuration for storage and the messaging provider.
//!
//! Everything is loaded from the process environment once at startup and
//! carried in typed structs from there on.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Environment variable for the `SQLite` database path.
const DB_PATH_ENV: &str = "SUPPORTLINE_DB_PATH";

/// Environment variable for the Twilio account SID.
const ACCOUNT_SID_ENV: &str = "TWILIO_ACCOUNT_SID";
/// Environment variable for the Twilio auth token.
const AUTH_TOKEN_ENV: &str = "TWILIO_AUTH_TOKEN";
/// Environment variable for the WhatsApp sender address (`whatsapp:+1...`).
const SENDER_ENV: &str = "TWILIO_WHATSAPP_FROM";
/// Environment variable overriding the Twilio API base URL (tests, regional endpoints).
const API_BASE_ENV: &str = "TWILIO_API_BASE";

/// Default Twilio API base URL.
const DEFAULT_API_BASE: &str = "https://api.twilio.com";

/// Storage configuration for the conversation log.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StorageConfig {
    /// `SQLite` database path.
    pub sqlite_path: PathBuf,
    /// Conversations table name.
    pub conversations_table: String,
    /// Messages table name.
    pub messages_table: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            sqlite_path: PathBuf::from("supportline.sqlite"),
            conversations_table: "conversations".to_string(),
            messages_table: "messages".to_string(),
        }
    }
}

impl StorageConfig {
    /// Load the storage configuration from the environment.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(path) = std::env::var(DB_PATH_ENV) {
            config.sqlite_path = PathBuf::from(path);
        }
        config
    }
}

/// Messaging provider (Twilio) configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Twilio account SID.
    pub account_sid: String,
    /// Twilio auth token.
    pub auth_token: String,
    /// Sender address used as `From` for every outbound message.
    pub sender: String,
    /// Twilio API base URL.
    pub api_base: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            account_sid: String::new(),
            auth_token: String::new(),
            sender: String::new(),
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }
}

impl ProviderConfig {
    /// Load the provider configuration from the environment.
    ///
    /// Missing credentials are tolerated here; sends fail with a provider
    /// error until they are configured.
    #[must_use]
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            account_sid: std::env::var(ACCOUNT_SID_ENV).unwrap_or(default.account_sid),
            auth_token: std::env::var(AUTH_TOKEN_ENV).unwrap_or(default.auth_token),
            sender: std::env::var(SENDER_ENV).unwrap_or(default.sender),
            api_base: std::env::var(API_BASE_ENV).unwrap_or(default.api_base),
        }
    }
}
