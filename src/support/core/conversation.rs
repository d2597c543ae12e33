//! Conversation record: one row per participant.

use core::fmt;
use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::support::core::ids::ConversationId;

/// Conversation status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversationStatus {
    /// The conversation is active.
    Open,
    /// The conversation has been closed.
    Closed,
}

impl ConversationStatus {
    /// Stable string form used in storage and JSON.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for ConversationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConversationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(Self::Open),
            "closed" => Ok(Self::Closed),
            other => Err(format!("unknown conversation status: {other}")),
        }
    }
}

/// A conversation with one external participant.
///
/// The aggregate root of the log: messages reference it by id but have their
/// own lifecycle. At most one conversation exists per participant; rows are
/// created on first contact and never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    /// System-assigned identifier, immutable.
    pub id: ConversationId,
    /// External address of the other party (e.g. `whatsapp:+15551112222`).
    pub participant: String,
    /// Current status.
    pub status: ConversationStatus,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last-update time.
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trips_through_str() {
        for status in [ConversationStatus::Open, ConversationStatus::Closed] {
            assert_eq!(status.as_str().parse::<ConversationStatus>(), Ok(status));
        }
        assert!("archived".parse::<ConversationStatus>().is_err());
    }

    #[test]
    fn test_conversation_serializes_camel_case() {
        let conversation = Conversation {
            id: ConversationId::new(),
            participant: "whatsapp:+15551112222".to_string(),
            status: ConversationStatus::Open,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_value(&conversation).unwrap();
        assert_eq!(json["participant"], "whatsapp:+15551112222");
        assert_eq!(json["status"], "open");
        assert!(json.get("createdAt").is_some());
        assert!(json.get("updatedAt").is_some());
    }
}
