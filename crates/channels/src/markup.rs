//! Markup dialects of the supported platforms.
//!
//! A [`Markup`] knows how its platform embeds user mentions in message text
//! (used when scanning a source body) and how to serialize a
//! [`TranslatedMessage`] back into that platform's text format.

use std::{borrow::Cow, ops::Range, sync::LazyLock};

use {
    chatbridge_common::NativeId,
    regex::Regex,
    serde::{Deserialize, Serialize},
};

use crate::message::{Segment, TranslatedMessage};

// Both patterns are literals covered by the tests below.

/// `<@U024BE7LH>` or `<@U024BE7LH|bob>`.
#[allow(clippy::expect_used)]
static SLACK_MENTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<@(?P<id>[A-Z0-9]+)(?:\|[^>]*)?>").expect("valid slack mention regex")
});

/// `<@80351110224678912>` or the legacy nickname form `<@!80351110224678912>`.
#[allow(clippy::expect_used)]
static DISCORD_MENTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<@!?(?P<id>\d+)>").expect("valid discord mention regex"));

/// Text dialect of a platform.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Markup {
    /// Slack mrkdwn: `*bold*`, `<@UID>`, `&`/`<`/`>` escaped as entities.
    #[default]
    Slack,
    /// Discord markdown: `**bold**`, `<@snowflake>`.
    Discord,
}

/// A user-mention token located in a message body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MentionToken<'a> {
    /// Byte range of the whole token in the scanned body.
    pub range: Range<usize>,
    /// The token text, e.g. `<@!123>`.
    pub raw: &'a str,
    /// The embedded native user id.
    pub id: &'a str,
}

impl Markup {
    fn mention_regex(self) -> &'static Regex {
        match self {
            Self::Slack => &SLACK_MENTION,
            Self::Discord => &DISCORD_MENTION,
        }
    }

    /// All user-mention tokens in `body`, in order of appearance.
    ///
    /// Ranges come from the regex engine and always fall on UTF-8 boundaries.
    pub fn mentions<'a>(self, body: &'a str) -> impl Iterator<Item = MentionToken<'a>> + 'a {
        self.mention_regex().captures_iter(body).filter_map(|caps| {
            let whole = caps.get(0)?;
            let id = caps.name("id")?;
            Some(MentionToken {
                range: whole.range(),
                raw: whole.as_str(),
                id: id.as_str(),
            })
        })
    }

    /// Whether `body` contains a mention of `user`.
    pub fn mentions_user(self, body: &str, user: &NativeId) -> bool {
        self.mentions(body)
            .any(|token| NativeId::from(token.id) == *user)
    }

    /// Literal text of a source body in plain form. Slack sends `&`, `<` and
    /// `>` as entities; Discord text is already plain.
    pub fn decode_text(self, text: &str) -> Cow<'_, str> {
        match self {
            Self::Slack if text.contains('&') => Cow::Owned(unescape_slack(text)),
            Self::Slack | Self::Discord => Cow::Borrowed(text),
        }
    }

    /// Serialize a translated message into this dialect.
    pub fn render(self, message: &TranslatedMessage) -> String {
        let mut out = String::new();
        for segment in &message.segments {
            match segment {
                Segment::Text(text) => out.push_str(&self.escape_text(text)),
                Segment::Emphasis(text) => out.push_str(&self.emphasis(text)),
                Segment::Mention(id) => out.push_str(&self.mention(id)),
            }
        }
        out
    }

    pub fn mention(self, id: &NativeId) -> String {
        format!("<@{id}>")
    }

    pub fn emphasis(self, text: &str) -> String {
        match self {
            Self::Slack => format!("*{}*", escape_slack(text)),
            Self::Discord => format!("**{}**", escape_discord_markdown(text)),
        }
    }

    fn escape_text(self, text: &str) -> String {
        match self {
            Self::Slack => escape_slack(text),
            Self::Discord => neutralize_mass_mentions(text),
        }
    }
}

/// Slack requires `&`, `<` and `>` to be sent as entities; anything left raw
/// would be parsed as a link, mention or broadcast (`<!channel>`).
fn escape_slack(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Inverse of [`escape_slack`]. `&amp;` goes last so `&amp;lt;` decodes to
/// the literal `&lt;`.
fn unescape_slack(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// Break `@everyone` / `@here` with a zero-width space so relayed text cannot
/// ping a whole Discord server.
fn neutralize_mass_mentions(text: &str) -> String {
    text.replace("@everyone", "@\u{200B}everyone")
        .replace("@here", "@\u{200B}here")
}

fn escape_discord_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(ch, '*' | '_' | '~' | '`' | '|' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    neutralize_mass_mentions(&out)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(Markup::Slack, "hi <@U01ABCDEF>", vec!["U01ABCDEF"])]
    #[case(Markup::Slack, "<@U01ABCDEF|randy> and <@W0000001>", vec!["U01ABCDEF", "W0000001"])]
    #[case(Markup::Discord, "<@123456789012345678> yo <@!99>", vec!["123456789012345678", "99"])]
    #[case(Markup::Discord, "role <@&123> is not a user", vec![])]
    #[case(Markup::Slack, "no mentions here", vec![])]
    fn finds_mentions(#[case] markup: Markup, #[case] body: &str, #[case] expected: Vec<&str>) {
        let ids: Vec<&str> = markup.mentions(body).map(|t| t.id).collect();
        assert_eq!(ids, expected);
    }

    #[test]
    fn token_ranges_cover_raw_text() {
        let body = "héllo <@!42> wörld";
        let token = Markup::Discord.mentions(body).next().unwrap();
        assert_eq!(&body[token.range.clone()], "<@!42>");
        assert_eq!(token.raw, "<@!42>");
    }

    #[test]
    fn mentions_user_compares_normalized_ids() {
        assert!(Markup::Discord.mentions_user("hey <@!400>", &NativeId::Int(400)));
        assert!(!Markup::Discord.mentions_user("hey <@401>", &NativeId::Int(400)));
        assert!(Markup::Slack.mentions_user("<@UBOT> ping", &NativeId::from("UBOT")));
    }

    #[test]
    fn render_discord() {
        let msg = TranslatedMessage {
            segments: vec![
                Segment::Emphasis("randy".into()),
                Segment::Text(": hello ".into()),
                Segment::Mention(NativeId::Int(456)),
            ],
        };
        assert_eq!(Markup::Discord.render(&msg), "**randy**: hello <@456>");
    }

    #[test]
    fn render_slack_escapes_entities() {
        let msg = TranslatedMessage {
            segments: vec![
                Segment::Emphasis("cody".into()),
                Segment::Text(": a < b && <!channel>".into()),
            ],
        };
        assert_eq!(
            Markup::Slack.render(&msg),
            "*cody*: a &lt; b &amp;&amp; &lt;!channel&gt;"
        );
    }

    #[rstest]
    #[case("@everyone look", "@\u{200B}everyone look")]
    #[case("ping @here", "ping @\u{200B}here")]
    #[case("mail me@example.com", "mail me@example.com")]
    fn discord_mass_mentions_are_neutralized(#[case] input: &str, #[case] expected: &str) {
        let msg = TranslatedMessage {
            segments: vec![Segment::Text(input.into())],
        };
        assert_eq!(Markup::Discord.render(&msg), expected);
    }

    #[test]
    fn discord_emphasis_escapes_markdown_in_names() {
        assert_eq!(Markup::Discord.emphasis("snake_case"), "**snake\\_case**");
    }

    #[rstest]
    #[case(Markup::Slack, "a &lt; b &amp; c &gt; d", "a < b & c > d")]
    #[case(Markup::Slack, "&amp;lt; stays literal", "&lt; stays literal")]
    #[case(Markup::Slack, "no entities", "no entities")]
    #[case(Markup::Discord, "a &lt; b", "a &lt; b")]
    fn decodes_source_text(#[case] markup: Markup, #[case] raw: &str, #[case] expected: &str) {
        assert_eq!(markup.decode_text(raw), expected);
    }

    #[test]
    fn slack_text_survives_decode_then_render() {
        let raw = "x &lt;y&gt; &amp;&amp; z";
        let msg = TranslatedMessage {
            segments: vec![Segment::Text(Markup::Slack.decode_text(raw).into_owned())],
        };
        assert_eq!(Markup::Slack.render(&msg), raw);
    }

    #[test]
    fn mention_patterns_compile() {
        LazyLock::force(&SLACK_MENTION);
        LazyLock::force(&DISCORD_MENTION);
    }
}
