//! Inbound events delivered by platform adapters.

use {
    chatbridge_common::{MessageHandle, Platform, UserRef},
    serde::{Deserialize, Serialize},
};

use crate::Result;

/// A new message on the source platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostedMessage {
    pub message: MessageHandle,
    pub sender: UserRef,
    pub body: String,
    #[serde(default)]
    pub timestamp: i64,
    /// Users mentioned in `body`, with display names when the adapter knows
    /// them. Used as the fallback rendering for unmapped mentions.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mentioned: Vec<UserRef>,
}

/// New body for an existing message. Some platforms omit the editor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdatedMessage {
    pub message: MessageHandle,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<UserRef>,
    pub body: String,
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mentioned: Vec<UserRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeletedMessage {
    pub message: MessageHandle,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<UserRef>,
    #[serde(default)]
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactionChange {
    pub message: MessageHandle,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<UserRef>,
    /// Platform-native symbolic name (`+1`, `👍`, ...).
    pub emoji: String,
    #[serde(default)]
    pub timestamp: i64,
}

/// Every event kind the bridge consumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InboundEvent {
    MessagePosted(PostedMessage),
    MessageUpdated(UpdatedMessage),
    MessageDeleted(DeletedMessage),
    ReactionAdded(ReactionChange),
    ReactionRemoved(ReactionChange),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    MessagePosted,
    MessageUpdated,
    MessageDeleted,
    ReactionAdded,
    ReactionRemoved,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MessagePosted => "message_posted",
            Self::MessageUpdated => "message_updated",
            Self::MessageDeleted => "message_deleted",
            Self::ReactionAdded => "reaction_added",
            Self::ReactionRemoved => "reaction_removed",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl InboundEvent {
    /// Parse one JSON-encoded event (as written by adapters and replay files).
    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn kind(&self) -> EventKind {
        match self {
            Self::MessagePosted(_) => EventKind::MessagePosted,
            Self::MessageUpdated(_) => EventKind::MessageUpdated,
            Self::MessageDeleted(_) => EventKind::MessageDeleted,
            Self::ReactionAdded(_) => EventKind::ReactionAdded,
            Self::ReactionRemoved(_) => EventKind::ReactionRemoved,
        }
    }

    /// The source message the event is about.
    pub fn message(&self) -> &MessageHandle {
        match self {
            Self::MessagePosted(e) => &e.message,
            Self::MessageUpdated(e) => &e.message,
            Self::MessageDeleted(e) => &e.message,
            Self::ReactionAdded(e) | Self::ReactionRemoved(e) => &e.message,
        }
    }

    pub fn platform(&self) -> Platform {
        self.message().platform
    }

    /// Who caused the event, when the platform reports it.
    pub fn sender(&self) -> Option<&UserRef> {
        match self {
            Self::MessagePosted(e) => Some(&e.sender),
            Self::MessageUpdated(e) => e.sender.as_ref(),
            Self::MessageDeleted(e) => e.sender.as_ref(),
            Self::ReactionAdded(e) | Self::ReactionRemoved(e) => e.sender.as_ref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use {super::*, chatbridge_common::NativeId};

    #[test]
    fn parses_posted_event() {
        let raw = r#"{
            "kind": "message_posted",
            "message": {"platform": "a", "id": "1700000000.000100", "channel": "general"},
            "sender": {"id": "U01ABCDEF", "display_name": "randy"},
            "body": "hello <@UBRIDGE01>"
        }"#;
        let event = InboundEvent::from_json(raw).unwrap();
        assert_eq!(event.kind(), EventKind::MessagePosted);
        assert_eq!(event.platform(), Platform::A);
        assert_eq!(event.message().id, NativeId::Text("1700000000.000100".into()));
        assert_eq!(
            event.sender().and_then(|s| s.display_name.as_deref()),
            Some("randy")
        );
    }

    #[test]
    fn parses_reaction_without_sender() {
        let raw = r#"{
            "kind": "reaction_removed",
            "message": {"platform": "b", "id": 42, "channel": "bot_control"},
            "emoji": "👍"
        }"#;
        let event = InboundEvent::from_json(raw).unwrap();
        assert_eq!(event.kind(), EventKind::ReactionRemoved);
        assert!(event.sender().is_none());
        assert_eq!(event.message().id, NativeId::Int(42));
    }

    #[test]
    fn rejects_unknown_kind() {
        let raw = r#"{"kind": "typing", "message": {"platform": "a", "id": "1", "channel": "c"}}"#;
        assert!(InboundEvent::from_json(raw).is_err());
    }
}
