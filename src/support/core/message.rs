//! Message record: one row per inbound delivery or outbound send.

use core::fmt;
use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::support::core::ids::{ConversationId, MessageId};

/// Message direction relative to this system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Received from the participant via the provider webhook.
    Inbound,
    /// Sent by this system through the provider.
    Outbound,
}

impl Direction {
    /// Stable string form used in storage and JSON.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Inbound => "inbound",
            Self::Outbound => "outbound",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "inbound" => Ok(Self::Inbound),
            "outbound" => Ok(Self::Outbound),
            other => Err(format!("unknown direction: {other}")),
        }
    }
}

/// A persisted message, linked to its conversation by id.
///
/// Direction is immutable once recorded; messages are never mutated or
/// deleted. In practice at least one of {body, media URL} is populated,
/// though this is not enforced.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// System-assigned identifier, immutable.
    pub id: MessageId,
    /// The owning conversation (weak reference, no cascade).
    pub conversation_id: ConversationId,
    /// Inbound or outbound.
    pub direction: Direction,
    /// Sender address.
    #[serde(rename = "from")]
    pub sender: String,
    /// Recipient address.
    #[serde(rename = "to")]
    pub recipient: String,
    /// Optional text body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    /// Optional media reference (URL).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_url: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

/// Fields of a message about to be recorded; id and timestamp are assigned by
/// the store.
#[derive(Debug, Clone)]
pub struct NewMessage {
    /// The owning conversation.
    pub conversation_id: ConversationId,
    /// Inbound or outbound.
    pub direction: Direction,
    /// Sender address.
    pub sender: String,
    /// Recipient address.
    pub recipient: String,
    /// Optional text body.
    pub body: Option<String>,
    /// Optional media reference (URL).
    pub media_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_round_trips_through_str() {
        for direction in [Direction::Inbound, Direction::Outbound] {
            assert_eq!(direction.as_str().parse::<Direction>(), Ok(direction));
        }
        assert!("sideways".parse::<Direction>().is_err());
    }

    #[test]
    fn test_message_json_uses_wire_field_names() {
        let message = Message {
            id: MessageId::new(),
            conversation_id: ConversationId::new(),
            direction: Direction::Inbound,
            sender: "whatsapp:+15551112222".to_string(),
            recipient: "whatsapp:+15550009999".to_string(),
            body: Some("Hello".to_string()),
            media_url: None,
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["from"], "whatsapp:+15551112222");
        assert_eq!(json["to"], "whatsapp:+15550009999");
        assert_eq!(json["direction"], "inbound");
        assert!(json.get("conversationId").is_some());
        // Absent media is omitted, not null.
        assert!(json.get("mediaUrl").is_none());
    }
}
