//! Reaction name translation between the two platforms' emoji schemes.

use std::collections::HashMap;

use {
    chatbridge_common::Platform,
    chatbridge_config::{EmojiConfig, EmojiStyle},
    tracing::debug,
};

#[cfg(feature = "metrics")]
use chatbridge_metrics::{bridge as bridge_metrics, counter, labels};

/// Common short names and their glyphs. Where several aliases share a glyph
/// the first one listed is used in the glyph → alias direction.
const BUILTIN: &[(&str, &str)] = &[
    ("+1", "👍"),
    ("thumbsup", "👍"),
    ("-1", "👎"),
    ("thumbsdown", "👎"),
    ("heart", "❤️"),
    ("smile", "😄"),
    ("grinning", "😀"),
    ("joy", "😂"),
    ("laughing", "😆"),
    ("slightly_smiling_face", "🙂"),
    ("wink", "😉"),
    ("blush", "😊"),
    ("heart_eyes", "😍"),
    ("thinking_face", "🤔"),
    ("sunglasses", "😎"),
    ("cry", "😢"),
    ("sob", "😭"),
    ("scream", "😱"),
    ("rage", "😡"),
    ("tada", "🎉"),
    ("eyes", "👀"),
    ("fire", "🔥"),
    ("rocket", "🚀"),
    ("sparkles", "✨"),
    ("star", "⭐"),
    ("100", "💯"),
    ("clap", "👏"),
    ("wave", "👋"),
    ("pray", "🙏"),
    ("ok_hand", "👌"),
    ("raised_hands", "🙌"),
    ("muscle", "💪"),
    ("white_check_mark", "✅"),
    ("heavy_check_mark", "✔️"),
    ("x", "❌"),
    ("warning", "⚠️"),
    ("question", "❓"),
    ("exclamation", "❗"),
    ("coffee", "☕"),
    ("beer", "🍺"),
    ("pizza", "🍕"),
    ("skull", "💀"),
    ("poop", "💩"),
    ("see_no_evil", "🙈"),
    ("party_popper", "🎉"),
];

const VARIATION_SELECTOR: char = '\u{FE0F}';

/// Name-to-name reaction table.
#[derive(Debug, Default)]
pub struct EmojiTable {
    a_to_b: HashMap<String, String>,
    b_to_a: HashMap<String, String>,
}

impl EmojiTable {
    /// Build the table for the given platform styles.
    ///
    /// Configured pairs are always loaded and take precedence. The built-in
    /// alias ↔ glyph pairs are only relevant when the styles differ.
    pub fn new(a_style: EmojiStyle, b_style: EmojiStyle, config: &EmojiConfig) -> Self {
        let mut table = Self::default();
        for alias in &config.aliases {
            table.insert(&alias.a, &alias.b);
        }
        if config.builtin {
            match (a_style, b_style) {
                (EmojiStyle::Alias, EmojiStyle::Unicode) => {
                    for (alias, glyph) in BUILTIN {
                        table.insert(alias, glyph);
                    }
                },
                (EmojiStyle::Unicode, EmojiStyle::Alias) => {
                    for (alias, glyph) in BUILTIN {
                        table.insert(glyph, alias);
                    }
                },
                _ => {},
            }
        }
        debug!(pairs = table.a_to_b.len(), "emoji table loaded");
        table
    }

    /// Keeps existing entries, so earlier pairs win in both directions.
    fn insert(&mut self, a: &str, b: &str) {
        self.a_to_b
            .entry(normalize(a))
            .or_insert_with(|| b.to_string());
        self.b_to_a
            .entry(normalize(b))
            .or_insert_with(|| a.to_string());
    }

    /// The equivalent on the other platform of reaction `name` from `from`.
    pub fn lookup(&self, name: &str, from: Platform) -> Option<&str> {
        let map = match from {
            Platform::A => &self.a_to_b,
            Platform::B => &self.b_to_a,
        };
        map.get(&normalize(name)).map(String::as_str)
    }

    /// Like [`Self::lookup`], passing unknown names through unchanged.
    pub fn translate(&self, name: &str, from: Platform) -> String {
        if let Some(mapped) = self.lookup(name, from) {
            return mapped.to_string();
        }
        debug!(emoji = name, from = %from, "no emoji mapping, passing name through");
        #[cfg(feature = "metrics")]
        counter!(bridge_metrics::TRANSLATION_MISSES_TOTAL, labels::KIND => "emoji").increment(1);
        strip_skin_tone(name.trim_matches(':')).to_string()
    }
}

/// Lookup key: no surrounding colons, no skin-tone modifier, no emoji
/// presentation selector.
fn normalize(name: &str) -> String {
    strip_skin_tone(name.trim_matches(':'))
        .chars()
        .filter(|c| *c != VARIATION_SELECTOR)
        .collect()
}

/// `thumbsup::skin-tone-3` → `thumbsup`.
fn strip_skin_tone(name: &str) -> &str {
    name.split_once("::skin-tone-")
        .map_or(name, |(base, _)| base)
}

#[cfg(test)]
mod tests {
    use {super::*, chatbridge_config::EmojiAlias, rstest::rstest};

    fn slack_to_discord() -> EmojiTable {
        EmojiTable::new(EmojiStyle::Alias, EmojiStyle::Unicode, &EmojiConfig::default())
    }

    #[rstest]
    #[case("+1", "👍")]
    #[case(":tada:", "🎉")]
    #[case("thumbsup::skin-tone-4", "👍")]
    #[case("heart", "❤️")]
    fn alias_to_glyph(#[case] name: &str, #[case] expected: &str) {
        assert_eq!(slack_to_discord().translate(name, Platform::A), expected);
    }

    #[rstest]
    #[case("👍", "+1")]
    #[case("❤️", "heart")]
    #[case("❤", "heart")]
    #[case("🎉", "tada")]
    fn glyph_to_alias(#[case] glyph: &str, #[case] expected: &str) {
        assert_eq!(slack_to_discord().translate(glyph, Platform::B), expected);
    }

    #[test]
    fn unknown_names_pass_through() {
        let table = slack_to_discord();
        assert_eq!(table.translate("custom_blob", Platform::A), "custom_blob");
        assert_eq!(table.translate("wave::skin-tone-2", Platform::A), "👋");
        assert!(table.lookup("custom_blob", Platform::A).is_none());
    }

    #[test]
    fn same_style_is_identity() {
        let table = EmojiTable::new(EmojiStyle::Alias, EmojiStyle::Alias, &EmojiConfig::default());
        assert_eq!(table.translate("+1", Platform::A), "+1");
        assert_eq!(table.translate("tada", Platform::B), "tada");
    }

    #[test]
    fn configured_pairs_take_precedence() {
        let config = EmojiConfig {
            builtin: true,
            aliases: vec![
                EmojiAlias {
                    a: "party_parrot".into(),
                    b: "🦜".into(),
                },
                EmojiAlias {
                    a: "+1".into(),
                    b: "✅".into(),
                },
            ],
        };
        let table = EmojiTable::new(EmojiStyle::Alias, EmojiStyle::Unicode, &config);
        assert_eq!(table.translate("party_parrot", Platform::A), "🦜");
        assert_eq!(table.translate("🦜", Platform::B), "party_parrot");
        assert_eq!(table.translate("+1", Platform::A), "✅");
    }

    #[test]
    fn builtin_can_be_disabled() {
        let config = EmojiConfig {
            builtin: false,
            aliases: Vec::new(),
        };
        let table = EmojiTable::new(EmojiStyle::Alias, EmojiStyle::Unicode, &config);
        assert_eq!(table.translate("+1", Platform::A), "+1");
    }

    #[test]
    fn reversed_styles() {
        let table = EmojiTable::new(EmojiStyle::Unicode, EmojiStyle::Alias, &EmojiConfig::default());
        assert_eq!(table.translate("👍", Platform::A), "+1");
        assert_eq!(table.translate("+1", Platform::B), "👍");
    }
}
