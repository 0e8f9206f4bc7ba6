use {
    chatbridge_common::{NativeId, UserRef},
    serde::{Deserialize, Serialize},
};

use crate::markup::Markup;

/// When a new message on a platform should be relayed.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MentionMode {
    /// The bridge bot must be @mentioned.
    #[default]
    Mention,
    /// Every message in the bridged channel is relayed.
    Always,
    /// Nothing is relayed from this platform.
    None,
}

/// Whether a new message is addressed to the bridge.
pub fn is_addressed(mode: MentionMode, markup: Markup, body: &str, bot_id: &NativeId) -> bool {
    match mode {
        MentionMode::Mention => markup.mentions_user(body, bot_id),
        MentionMode::Always => true,
        MentionMode::None => false,
    }
}

/// Whether the event was caused by the bridge's own bot account.
///
/// Events without a sender are never treated as echoes.
pub fn is_own_echo(sender: Option<&UserRef>, bot_id: &NativeId) -> bool {
    sender.is_some_and(|s| s.id == *bot_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bot() -> NativeId {
        NativeId::from("UBRIDGE01")
    }

    #[test]
    fn mention_mode_requires_bot_mention() {
        assert!(is_addressed(
            MentionMode::Mention,
            Markup::Slack,
            "<@UBRIDGE01> relay this",
            &bot()
        ));
        assert!(!is_addressed(
            MentionMode::Mention,
            Markup::Slack,
            "just chatting with <@U01ABCDEF>",
            &bot()
        ));
    }

    #[test]
    fn always_and_none_ignore_body() {
        assert!(is_addressed(MentionMode::Always, Markup::Slack, "hi", &bot()));
        assert!(!is_addressed(
            MentionMode::None,
            Markup::Slack,
            "<@UBRIDGE01>",
            &bot()
        ));
    }

    #[test]
    fn own_echo_matches_bot_id_only() {
        assert!(is_own_echo(Some(&UserRef::new("UBRIDGE01")), &bot()));
        assert!(!is_own_echo(Some(&UserRef::new("U01ABCDEF")), &bot()));
        assert!(!is_own_echo(None, &bot()));
    }

    #[test]
    fn mention_mode_deserializes_lowercase() {
        let mode: MentionMode = serde_json::from_str("\"always\"").unwrap();
        assert_eq!(mode, MentionMode::Always);
    }
}
