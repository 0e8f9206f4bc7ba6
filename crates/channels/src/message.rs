use {chatbridge_common::NativeId, serde::Serialize};

/// One piece of a translated message body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Segment {
    /// Literal text, rendered verbatim (escaped as the target markup requires).
    Text(String),
    /// Emphasized text; used for the sender attribution.
    Emphasis(String),
    /// A mention of a user on the destination platform.
    Mention(NativeId),
}

/// Platform-neutral message body produced by the translator and rendered
/// by the destination adapter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TranslatedMessage {
    pub segments: Vec<Segment>,
}

impl TranslatedMessage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a segment, merging adjacent literal text.
    pub fn push(&mut self, segment: Segment) {
        if let Segment::Text(ref text) = segment {
            if text.is_empty() {
                return;
            }
            if let Some(Segment::Text(last)) = self.segments.last_mut() {
                last.push_str(text);
                return;
            }
        }
        self.segments.push(segment);
    }

    pub fn push_text(&mut self, text: impl Into<String>) {
        self.push(Segment::Text(text.into()));
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn mentions(&self) -> impl Iterator<Item = &NativeId> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Mention(id) => Some(id),
            _ => None,
        })
    }

    /// Concatenated literal text, ignoring emphasis and mentions.
    pub fn plain_text(&self) -> String {
        self.segments
            .iter()
            .filter_map(|s| match s {
                Segment::Text(t) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adjacent_text_merges() {
        let mut msg = TranslatedMessage::new();
        msg.push_text("hello ");
        msg.push_text("world");
        msg.push(Segment::Mention(NativeId::Int(7)));
        msg.push_text("!");
        assert_eq!(msg.segments, vec![
            Segment::Text("hello world".into()),
            Segment::Mention(NativeId::Int(7)),
            Segment::Text("!".into()),
        ]);
    }

    #[test]
    fn empty_text_is_dropped() {
        let mut msg = TranslatedMessage::new();
        msg.push_text("");
        assert!(msg.is_empty());
    }

    #[test]
    fn emphasis_does_not_merge_with_text() {
        let mut msg = TranslatedMessage::new();
        msg.push(Segment::Emphasis("randy".into()));
        msg.push_text(": hi");
        assert_eq!(msg.segments.len(), 2);
        assert_eq!(msg.plain_text(), ": hi");
    }
}
