//! Message body translation between the two platforms.

use std::sync::Arc;

use {
    chatbridge_channels::{Markup, Segment, TranslatedMessage},
    chatbridge_common::{NativeId, Platform, UserRef},
    tracing::debug,
};

#[cfg(feature = "metrics")]
use chatbridge_metrics::{bridge as bridge_metrics, counter, labels};

use crate::identity::IdentityMap;

/// Rewrites source-platform bodies into platform-neutral segments for the
/// other side.
pub struct Translator {
    identities: Arc<IdentityMap>,
    markup_a: Markup,
    markup_b: Markup,
}

impl Translator {
    pub fn new(identities: Arc<IdentityMap>, markup_a: Markup, markup_b: Markup) -> Self {
        Self {
            identities,
            markup_a,
            markup_b,
        }
    }

    fn markup(&self, platform: Platform) -> Markup {
        match platform {
            Platform::A => self.markup_a,
            Platform::B => self.markup_b,
        }
    }

    /// Translate `body` written on `from`, prefixed with the sender's name
    /// when one is given.
    pub fn translate(&self, body: &str, sender: Option<&str>, from: Platform) -> TranslatedMessage {
        self.translate_with_mentions(body, sender, from, &[])
    }

    /// Like [`Self::translate`], with the display names the adapter reported
    /// for users mentioned in `body`. Those names are the fallback for
    /// mentions that have no identity mapping.
    pub fn translate_with_mentions(
        &self,
        body: &str,
        sender: Option<&str>,
        from: Platform,
        mentioned: &[UserRef],
    ) -> TranslatedMessage {
        let mut out = TranslatedMessage::new();
        if let Some(name) = sender {
            out.push(Segment::Emphasis(name.to_string()));
            out.push_text(": ");
        }

        let markup = self.markup(from);
        let mut cursor = 0;
        for token in markup.mentions(body) {
            out.push_text(markup.decode_text(&body[cursor..token.range.start]));
            cursor = token.range.end;

            let id = NativeId::from(token.id);
            match self.identities.resolve(&id, from) {
                Some(mapped) => out.push(Segment::Mention(mapped.clone())),
                None => {
                    debug!(user = %id, from = %from, "unmapped mention, using fallback text");
                    #[cfg(feature = "metrics")]
                    counter!(bridge_metrics::TRANSLATION_MISSES_TOTAL, labels::KIND => "mention")
                        .increment(1);
                    out.push_text(self.fallback(&id, token.raw, from, mentioned));
                },
            }
        }
        out.push_text(markup.decode_text(&body[cursor..]));
        out
    }

    fn fallback(&self, id: &NativeId, raw: &str, from: Platform, mentioned: &[UserRef]) -> String {
        mentioned
            .iter()
            .find(|user| user.id == *id)
            .and_then(|user| user.display_name.as_deref())
            .or_else(|| self.identities.display_name(id, from))
            .map_or_else(|| raw.to_string(), |name| format!("@{name}"))
    }
}
