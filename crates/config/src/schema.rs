//! Config schema types (platforms, history, dispatch, identities, emoji, metrics).
use {
    chatbridge_channels::{Markup, MentionMode},
    chatbridge_common::{NativeId, Platform},
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
};

/// Default number of correlations remembered per direction.
pub const DEFAULT_HISTORY_CAPACITY: usize = 1000;

/// Default depth of each platform's inbound event queue.
pub const DEFAULT_QUEUE_DEPTH: usize = 256;

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub a: PlatformConfig,
    pub b: PlatformConfig,
    pub history: HistoryConfig,
    pub dispatch: DispatchConfig,
    /// Static user identity table (A id ↔ B id).
    pub identities: Vec<IdentityEntry>,
    pub emoji: EmojiConfig,
    pub metrics: MetricsConfig,
}

impl BridgeConfig {
    pub fn platform(&self, platform: Platform) -> &PlatformConfig {
        match platform {
            Platform::A => &self.a,
            Platform::B => &self.b,
        }
    }
}

/// How a platform names reactions.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EmojiStyle {
    /// Short names such as `+1` or `tada` (Slack).
    #[default]
    Alias,
    /// The emoji glyph itself, such as `👍` (Discord).
    Unicode,
}

/// One side of the bridge.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    /// Human-readable platform name used in logs ("slack", "discord").
    pub name: String,

    /// Text dialect for mentions and emphasis.
    pub markup: Markup,

    /// Reaction naming scheme.
    pub emoji_style: EmojiStyle,

    /// Channel the bridge reads from and posts into.
    pub channel: String,

    /// The bridge bot's own user id; events it caused are never relayed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bot_user_id: Option<NativeId>,

    /// Bot token, handed to the platform adapter.
    #[serde(serialize_with = "serialize_secret")]
    pub token: Secret<String>,

    /// When a new message from this platform is relayed.
    pub mention_mode: MentionMode,

    /// Skip messages from any bot account, not only the bridge itself.
    pub ignore_bots: bool,
}

impl std::fmt::Debug for PlatformConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlatformConfig")
            .field("name", &self.name)
            .field("markup", &self.markup)
            .field("channel", &self.channel)
            .field("bot_user_id", &self.bot_user_id)
            .field("token", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

fn serialize_secret<S: serde::Serializer>(
    secret: &Secret<String>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            markup: Markup::default(),
            emoji_style: EmojiStyle::default(),
            channel: String::new(),
            bot_user_id: None,
            token: Secret::new(String::new()),
            mention_mode: MentionMode::default(),
            ignore_bots: false,
        }
    }
}

impl PlatformConfig {
    /// Name for log lines; falls back to the side label.
    pub fn label(&self, platform: Platform) -> String {
        if self.name.is_empty() {
            platform.to_string()
        } else {
            self.name.clone()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Correlations remembered per direction before the oldest is evicted.
    pub capacity: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Bounded depth of each platform's inbound event queue.
    pub queue_depth: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            queue_depth: DEFAULT_QUEUE_DEPTH,
        }
    }
}

/// One row of the identity table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityEntry {
    pub a: NativeId,
    pub b: NativeId,
    /// Display name used when a mention cannot be rendered natively.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmojiConfig {
    /// Load the built-in alias ↔ glyph table.
    pub builtin: bool,
    /// Extra pairs, checked before the built-in table.
    pub aliases: Vec<EmojiAlias>,
}

impl Default for EmojiConfig {
    fn default() -> Self {
        Self {
            builtin: true,
            aliases: Vec::new(),
        }
    }
}

/// Reaction name on platform A and its equivalent on platform B.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmojiAlias {
    pub a: String,
    pub b: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = BridgeConfig::default();
        assert_eq!(cfg.history.capacity, 1000);
        assert_eq!(cfg.dispatch.queue_depth, 256);
        assert!(cfg.emoji.builtin);
        assert_eq!(cfg.a.mention_mode, MentionMode::Mention);
        assert!(cfg.identities.is_empty());
    }

    #[test]
    fn deserialize_from_toml() {
        let raw = r#"
            [a]
            name = "slack"
            markup = "slack"
            channel = "general"
            bot_user_id = "UBRIDGE01"
            token = "xoxb-1"

            [b]
            name = "discord"
            markup = "discord"
            emoji_style = "unicode"
            channel = "bot_control"
            bot_user_id = 400000000000000001
            token = "discord-token"
            mention_mode = "always"

            [[identities]]
            a = "U01ABCDEF"
            b = "123456789012345678"
            name = "Randy"
        "#;
        let cfg: BridgeConfig = toml::from_str(raw).unwrap();
        assert_eq!(cfg.a.markup, Markup::Slack);
        assert_eq!(cfg.b.markup, Markup::Discord);
        assert_eq!(cfg.b.emoji_style, EmojiStyle::Unicode);
        assert_eq!(cfg.b.mention_mode, MentionMode::Always);
        assert_eq!(cfg.b.bot_user_id, Some(NativeId::Int(400_000_000_000_000_001)));
        assert_eq!(cfg.a.token.expose_secret(), "xoxb-1");
        // Quoted snowflakes normalize to integers.
        assert_eq!(cfg.identities[0].b, NativeId::Int(123_456_789_012_345_678));
        assert_eq!(cfg.history.capacity, DEFAULT_HISTORY_CAPACITY);
    }

    #[test]
    fn debug_redacts_token() {
        let cfg = PlatformConfig {
            token: Secret::new("super-secret".into()),
            ..Default::default()
        };
        let dbg = format!("{cfg:?}");
        assert!(!dbg.contains("super-secret"));
        assert!(dbg.contains("[REDACTED]"));
    }

    #[test]
    fn label_falls_back_to_side() {
        assert_eq!(PlatformConfig::default().label(Platform::B), "b");
    }
}
