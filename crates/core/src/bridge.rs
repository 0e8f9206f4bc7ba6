//! The bridge core: mirrors messages, edits, deletions and reactions from
//! one platform onto the other.
//!
//! Every operation runs under the per-message lock of its source handle, from
//! the correlation lookup through the outbound call to the history write, so
//! events for the same message never interleave. History itself is only
//! locked for the instant of each read or write.

use std::{num::NonZeroUsize, sync::Arc};

use {
    chatbridge_channels::{
        DeletedMessage, InboundEvent, Markup, MentionMode, PlatformOutbound, PostedMessage,
        ReactionChange, UpdatedMessage,
        gating::{is_addressed, is_own_echo},
    },
    chatbridge_common::{ChannelRef, MessageHandle, NativeId, Platform, UserRef},
    chatbridge_config::{BridgeConfig, PlatformConfig},
    serde::Serialize,
    tracing::{debug, info, warn},
};

#[cfg(feature = "metrics")]
use chatbridge_metrics::{bridge as bridge_metrics, counter, labels};

use crate::{
    emoji::EmojiTable,
    error::{Error, Result},
    history::{Correlation, HistoryStore},
    identity::IdentityMap,
    locks::HandleLocks,
    translate::Translator,
};

/// Per-platform settings the core needs at runtime.
#[derive(Debug, Clone)]
pub struct PlatformProfile {
    pub platform: Platform,
    /// Name used in log lines.
    pub label: String,
    pub markup: Markup,
    pub channel: ChannelRef,
    pub bot_user_id: NativeId,
    pub mention_mode: MentionMode,
    pub ignore_bots: bool,
}

impl PlatformProfile {
    pub fn from_config(platform: Platform, config: &PlatformConfig) -> Result<Self> {
        let bot_user_id = config
            .bot_user_id
            .clone()
            .ok_or_else(|| Error::config(format!("{platform}.bot_user_id is not set")))?;
        if config.channel.trim().is_empty() {
            return Err(Error::config(format!("{platform}.channel is not set")));
        }
        Ok(Self {
            platform,
            label: config.label(platform),
            markup: config.markup,
            channel: ChannelRef::new(config.channel.clone()),
            bot_user_id,
            mention_mode: config.mention_mode,
            ignore_bots: config.ignore_bots,
        })
    }
}

/// Why an event did not produce an outbound call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IgnoreReason {
    /// Caused by the bridge's own bot account.
    OwnEcho,
    /// Sent by another bot while `ignore_bots` is set.
    BotSender,
    /// Posted outside the bridged channel.
    OtherChannel,
    /// The platform's mention mode does not select this message.
    NotAddressed,
    /// The message already has a live mirror (redelivered post).
    AlreadyMirrored,
    /// No live correlation for the message.
    NoCorrelation,
    /// The mirror does not carry the reaction being removed.
    ReactionAbsent,
}

impl IgnoreReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OwnEcho => "own_echo",
            Self::BotSender => "bot_sender",
            Self::OtherChannel => "other_channel",
            Self::NotAddressed => "not_addressed",
            Self::AlreadyMirrored => "already_mirrored",
            Self::NoCorrelation => "no_correlation",
            Self::ReactionAbsent => "reaction_absent",
        }
    }
}

impl std::fmt::Display for IgnoreReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of handling one event. The handle is the mirror's current handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum Outcome {
    Mirrored(MessageHandle),
    Edited(MessageHandle),
    Deleted(MessageHandle),
    Reacted(MessageHandle),
    Ignored(IgnoreReason),
}

impl Outcome {
    pub fn is_ignored(&self) -> bool {
        matches!(self, Self::Ignored(_))
    }
}

pub struct BridgeCore {
    profile_a: PlatformProfile,
    profile_b: PlatformProfile,
    outbound_a: Arc<dyn PlatformOutbound>,
    outbound_b: Arc<dyn PlatformOutbound>,
    history: HistoryStore,
    identities: Arc<IdentityMap>,
    translator: Translator,
    emoji: EmojiTable,
    locks: HandleLocks,
}

impl BridgeCore {
    /// Build the core from a config. Fails when the config lacks what the
    /// core needs to run or an adapter is wired to the wrong side.
    pub fn new(
        config: &BridgeConfig,
        outbound_a: Arc<dyn PlatformOutbound>,
        outbound_b: Arc<dyn PlatformOutbound>,
    ) -> Result<Self> {
        for (expected, outbound) in [(Platform::A, &outbound_a), (Platform::B, &outbound_b)] {
            if outbound.platform() != expected {
                return Err(Error::config(format!(
                    "adapter for platform {} was given as platform {expected}",
                    outbound.platform()
                )));
            }
        }

        let capacity = NonZeroUsize::new(config.history.capacity)
            .ok_or_else(|| Error::config("history.capacity must be at least 1"))?;
        let profile_a = PlatformProfile::from_config(Platform::A, &config.a)?;
        let profile_b = PlatformProfile::from_config(Platform::B, &config.b)?;
        let identities = Arc::new(IdentityMap::new(config.identities.iter().cloned()));
        let translator = Translator::new(Arc::clone(&identities), profile_a.markup, profile_b.markup);
        let emoji = EmojiTable::new(config.a.emoji_style, config.b.emoji_style, &config.emoji);

        info!(
            a = %profile_a.label,
            b = %profile_b.label,
            capacity = capacity.get(),
            identities = identities.len(),
            "bridge core ready"
        );

        Ok(Self {
            profile_a,
            profile_b,
            outbound_a,
            outbound_b,
            history: HistoryStore::new(capacity),
            identities,
            translator,
            emoji,
            locks: HandleLocks::new(),
        })
    }

    pub fn profile(&self, platform: Platform) -> &PlatformProfile {
        match platform {
            Platform::A => &self.profile_a,
            Platform::B => &self.profile_b,
        }
    }

    fn outbound(&self, platform: Platform) -> &dyn PlatformOutbound {
        match platform {
            Platform::A => self.outbound_a.as_ref(),
            Platform::B => self.outbound_b.as_ref(),
        }
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    /// Route an inbound event to its handler.
    pub async fn on_event(&self, event: &InboundEvent) -> Result<Outcome> {
        let platform = event.platform();
        let kind = event.kind();

        #[cfg(feature = "metrics")]
        counter!(
            bridge_metrics::EVENTS_RECEIVED_TOTAL,
            labels::PLATFORM => platform.as_str(),
            labels::KIND => kind.as_str()
        )
        .increment(1);

        let result = match event {
            InboundEvent::MessagePosted(e) => self.on_posted(e).await,
            InboundEvent::MessageUpdated(e) => self.on_updated(e).await,
            InboundEvent::MessageDeleted(e) => self.on_deleted(e).await,
            InboundEvent::ReactionAdded(e) => self.on_reaction_added(e).await,
            InboundEvent::ReactionRemoved(e) => self.on_reaction_removed(e).await,
        };

        #[cfg(feature = "metrics")]
        match &result {
            Ok(Outcome::Ignored(reason)) => {
                counter!(
                    bridge_metrics::EVENTS_IGNORED_TOTAL,
                    labels::REASON => reason.as_str()
                )
                .increment(1);
            },
            Ok(_) => {
                counter!(
                    bridge_metrics::EVENTS_RELAYED_TOTAL,
                    labels::PLATFORM => platform.as_str(),
                    labels::KIND => kind.as_str()
                )
                .increment(1);
            },
            Err(_) => {},
        }

        #[cfg(not(feature = "metrics"))]
        let _ = (platform, kind);

        result
    }

    /// Mirror a new message onto the other platform.
    pub async fn on_posted(&self, event: &PostedMessage) -> Result<Outcome> {
        let source = &event.message;
        let profile = self.profile(source.platform);

        if let Some(reason) = self.sender_gate(profile, Some(&event.sender)) {
            return Ok(self.ignored(source, reason));
        }
        if source.channel != profile.channel {
            return Ok(self.ignored(source, IgnoreReason::OtherChannel));
        }
        if !is_addressed(
            profile.mention_mode,
            profile.markup,
            &event.body,
            &profile.bot_user_id,
        ) {
            return Ok(self.ignored(source, IgnoreReason::NotAddressed));
        }

        let _guard = self.locks.lock(source.key()).await;
        if self.history.get_counterpart(source).is_some() {
            return Ok(self.ignored(source, IgnoreReason::AlreadyMirrored));
        }

        let target = self.profile(source.platform.other());
        let attribution = self.attribution(&event.sender, source.platform);
        let message = self.translator.translate_with_mentions(
            &event.body,
            Some(&attribution),
            source.platform,
            &event.mentioned,
        );

        let mirror = self
            .outbound(target.platform)
            .post_message(&target.channel, &message)
            .await
            .map_err(|e| self.adapter_failure(target.platform, "post_message", source, e))?;

        info!(
            from = %profile.label,
            to = %target.label,
            source = %source.id,
            mirror = %mirror.id,
            "mirrored message"
        );
        self.history
            .put(source.clone(), mirror.clone(), Some(attribution));
        Ok(Outcome::Mirrored(mirror))
    }

    /// Re-translate an edited message and edit its mirror.
    pub async fn on_updated(&self, event: &UpdatedMessage) -> Result<Outcome> {
        let source = &event.message;
        let profile = self.profile(source.platform);
        if let Some(reason) = self.sender_gate(profile, event.sender.as_ref()) {
            return Ok(self.ignored(source, reason));
        }

        let _guard = self.locks.lock(source.key()).await;
        let Some(correlation) = self.history.get_counterpart(source) else {
            return Ok(self.ignored(source, IgnoreReason::NoCorrelation));
        };

        let message = self.translator.translate_with_mentions(
            &event.body,
            correlation.attribution.as_deref(),
            source.platform,
            &event.mentioned,
        );
        let mirror = &correlation.mirror;
        let edited = self
            .outbound(mirror.platform)
            .edit_message(mirror, &message)
            .await
            .map_err(|e| self.adapter_failure(mirror.platform, "edit_message", source, e))?;

        if edited != *mirror && !self.history.replace_mirror(source, mirror, edited.clone()) {
            debug!(source = %source.id, "correlation changed during edit, reissued handle not stored");
        }
        info!(from = %profile.label, source = %source.id, mirror = %edited.id, "mirrored edit");
        Ok(Outcome::Edited(edited))
    }

    /// Forget the correlation and delete the mirror.
    pub async fn on_deleted(&self, event: &DeletedMessage) -> Result<Outcome> {
        let source = &event.message;
        let profile = self.profile(source.platform);
        if let Some(reason) = self.sender_gate(profile, event.sender.as_ref()) {
            return Ok(self.ignored(source, reason));
        }

        let _guard = self.locks.lock(source.key()).await;
        let Some(correlation) = self.history.remove(source) else {
            return Ok(self.ignored(source, IgnoreReason::NoCorrelation));
        };

        let mirror = correlation.mirror;
        match self.outbound(mirror.platform).delete_message(&mirror).await {
            Ok(()) => {},
            Err(e) if e.is_not_found() => {
                debug!(source = %source.id, mirror = %mirror.id, "mirror already gone");
            },
            Err(e) => return Err(self.adapter_failure(mirror.platform, "delete_message", source, e)),
        }
        info!(from = %profile.label, source = %source.id, mirror = %mirror.id, "mirrored delete");
        Ok(Outcome::Deleted(mirror))
    }

    pub async fn on_reaction_added(&self, event: &ReactionChange) -> Result<Outcome> {
        self.on_reaction(event, true).await
    }

    /// Removing a reaction the mirror does not carry is a no-op.
    pub async fn on_reaction_removed(&self, event: &ReactionChange) -> Result<Outcome> {
        self.on_reaction(event, false).await
    }

    async fn on_reaction(&self, event: &ReactionChange, added: bool) -> Result<Outcome> {
        let source = &event.message;
        let profile = self.profile(source.platform);
        if let Some(reason) = self.sender_gate(profile, event.sender.as_ref()) {
            return Ok(self.ignored(source, reason));
        }

        let _guard = self.locks.lock(source.key()).await;
        let Some(correlation) = self.history.get_counterpart(source) else {
            return Ok(self.ignored(source, IgnoreReason::NoCorrelation));
        };

        let emoji = self.emoji.translate(&event.emoji, source.platform);
        let mirror = &correlation.mirror;
        let outbound = self.outbound(mirror.platform);
        if added {
            outbound
                .add_reaction(mirror, &emoji)
                .await
                .map_err(|e| self.adapter_failure(mirror.platform, "add_reaction", source, e))?;
        } else {
            match outbound.remove_reaction(mirror, &emoji).await {
                Ok(()) => {},
                Err(e) if e.is_not_found() => {
                    return Ok(self.ignored(source, IgnoreReason::ReactionAbsent));
                },
                Err(e) => {
                    return Err(self.adapter_failure(mirror.platform, "remove_reaction", source, e));
                },
            }
        }

        let current = self.refresh_mirror(&correlation).await;
        info!(
            from = %profile.label,
            source = %source.id,
            mirror = %current.id,
            emoji = %emoji,
            added,
            "mirrored reaction"
        );
        Ok(Outcome::Reacted(current))
    }

    /// Refetch the mirror after a mutation and store the canonical handle.
    /// A failed refetch keeps the previous handle.
    async fn refresh_mirror(&self, correlation: &Correlation) -> MessageHandle {
        let mirror = &correlation.mirror;
        match self.outbound(mirror.platform).refetch_message(mirror).await {
            Ok(fresh) => {
                if fresh != *mirror
                    && !self
                        .history
                        .replace_mirror(&correlation.source, mirror, fresh.clone())
                {
                    debug!(source = %correlation.source.id, "correlation changed during refetch");
                }
                fresh
            },
            Err(e) => {
                warn!(
                    platform = %mirror.platform,
                    mirror = %mirror.id,
                    error = %e,
                    "refetch after reaction failed, keeping previous handle"
                );
                #[cfg(feature = "metrics")]
                counter!(
                    bridge_metrics::ADAPTER_FAILURES_TOTAL,
                    labels::PLATFORM => mirror.platform.as_str(),
                    labels::OPERATION => "refetch_message"
                )
                .increment(1);
                mirror.clone()
            },
        }
    }

    fn sender_gate(&self, profile: &PlatformProfile, sender: Option<&UserRef>) -> Option<IgnoreReason> {
        if is_own_echo(sender, &profile.bot_user_id) {
            return Some(IgnoreReason::OwnEcho);
        }
        if profile.ignore_bots && sender.is_some_and(|s| s.is_bot) {
            return Some(IgnoreReason::BotSender);
        }
        None
    }

    /// Display name used in the mirrored message prefix.
    fn attribution(&self, sender: &UserRef, from: Platform) -> String {
        sender
            .display_name
            .clone()
            .or_else(|| {
                self.identities
                    .display_name(&sender.id, from)
                    .map(str::to_string)
            })
            .unwrap_or_else(|| sender.id.to_string())
    }

    fn ignored(&self, source: &MessageHandle, reason: IgnoreReason) -> Outcome {
        debug!(
            platform = %self.profile(source.platform).label,
            source = %source.id,
            reason = %reason,
            "event ignored"
        );
        Outcome::Ignored(reason)
    }

    fn adapter_failure(
        &self,
        platform: Platform,
        operation: &'static str,
        source: &MessageHandle,
        error: chatbridge_channels::Error,
    ) -> Error {
        warn!(
            platform = %self.profile(platform).label,
            operation,
            source = %source.id,
            error = %error,
            "adapter call failed, event dropped"
        );
        #[cfg(feature = "metrics")]
        counter!(
            bridge_metrics::ADAPTER_FAILURES_TOTAL,
            labels::PLATFORM => platform.as_str(),
            labels::OPERATION => operation
        )
        .increment(1);
        Error::adapter(platform, operation, error)
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        chatbridge_channels::loopback::{LoopbackOutbound, Operation},
        chatbridge_config::IdentityEntry,
    };

    fn config() -> BridgeConfig {
        let mut config = BridgeConfig::default();
        config.a.channel = "general".into();
        config.a.bot_user_id = Some(NativeId::from("UBRIDGE01"));
        config.a.mention_mode = MentionMode::Always;
        config.b.markup = Markup::Discord;
        config.b.channel = "bot_control".into();
        config.b.bot_user_id = Some(NativeId::Int(400));
        config.identities.push(IdentityEntry {
            a: NativeId::from("A123"),
            b: NativeId::Int(456),
            name: None,
        });
        config
    }

    fn core_with(config: &BridgeConfig) -> (BridgeCore, Arc<LoopbackOutbound>, Arc<LoopbackOutbound>) {
        let a = Arc::new(LoopbackOutbound::new(Platform::A, Markup::Slack));
        let b = Arc::new(LoopbackOutbound::new(Platform::B, Markup::Discord));
        let core = BridgeCore::new(config, a.clone(), b.clone()).unwrap();
        (core, a, b)
    }

    fn posted(id: &str, sender: UserRef, body: &str) -> PostedMessage {
        PostedMessage {
            message: MessageHandle::new(Platform::A, id, "general"),
            sender,
            body: body.into(),
            timestamp: 0,
            mentioned: Vec::new(),
        }
    }

    #[test]
    fn rejects_swapped_adapters() {
        let a = Arc::new(LoopbackOutbound::new(Platform::A, Markup::Slack));
        let b = Arc::new(LoopbackOutbound::new(Platform::B, Markup::Discord));
        let err = BridgeCore::new(&config(), b, a).err().unwrap();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn rejects_missing_bot_identity() {
        let mut config = config();
        config.b.bot_user_id = None;
        let a = Arc::new(LoopbackOutbound::new(Platform::A, Markup::Slack));
        let b = Arc::new(LoopbackOutbound::new(Platform::B, Markup::Discord));
        assert!(BridgeCore::new(&config, a, b).is_err());
    }

    #[tokio::test]
    async fn attribution_falls_back_to_identity_name_then_id() {
        let mut config = config();
        config.identities[0].name = Some("Randy".into());
        let (core, _a, b) = core_with(&config);

        core.on_posted(&posted("1.1", UserRef::new("A123"), "hi"))
            .await
            .unwrap();
        core.on_posted(&posted("1.2", UserRef::new("A999"), "hi"))
            .await
            .unwrap();

        let texts: Vec<String> = b.calls().into_iter().filter_map(|c| c.payload).collect();
        assert_eq!(texts, vec!["**Randy**: hi", "**A999**: hi"]);
    }

    #[tokio::test]
    async fn other_channel_is_ignored() {
        let (core, _a, b) = core_with(&config());
        let mut event = posted("1.1", UserRef::new("A123"), "hi");
        event.message.channel = ChannelRef::new("random");
        let outcome = core.on_posted(&event).await.unwrap();
        assert_eq!(outcome, Outcome::Ignored(IgnoreReason::OtherChannel));
        assert!(b.calls().is_empty());
    }

    #[tokio::test]
    async fn mention_mode_requires_bot_mention() {
        let mut config = config();
        config.a.mention_mode = MentionMode::Mention;
        let (core, _a, b) = core_with(&config);

        let outcome = core
            .on_posted(&posted("1.1", UserRef::new("A123"), "just chatting"))
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::Ignored(IgnoreReason::NotAddressed));

        let outcome = core
            .on_posted(&posted("1.2", UserRef::new("A123"), "<@UBRIDGE01> relay"))
            .await
            .unwrap();
        assert!(matches!(outcome, Outcome::Mirrored(_)));
        assert_eq!(b.calls().len(), 1);
    }

    #[tokio::test]
    async fn other_bots_ignored_when_configured() {
        let mut config = config();
        config.a.ignore_bots = true;
        let (core, _a, b) = core_with(&config);
        let mut sender = UserRef::new("BOTHER");
        sender.is_bot = true;
        let outcome = core.on_posted(&posted("1.1", sender, "beep")).await.unwrap();
        assert_eq!(outcome, Outcome::Ignored(IgnoreReason::BotSender));
        assert!(b.calls().is_empty());
    }

    #[tokio::test]
    async fn redelivered_post_is_not_mirrored_twice() {
        let (core, _a, b) = core_with(&config());
        let event = posted("1.1", UserRef::new("A123"), "hi");
        core.on_posted(&event).await.unwrap();
        let outcome = core.on_posted(&event).await.unwrap();
        assert_eq!(outcome, Outcome::Ignored(IgnoreReason::AlreadyMirrored));
        assert_eq!(b.message_count(), 1);
    }

    #[tokio::test]
    async fn failed_post_records_nothing() {
        let (core, _a, b) = core_with(&config());
        b.fail_next(Operation::Post, 1);
        let err = core
            .on_posted(&posted("1.1", UserRef::new("A123"), "hi"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Adapter {
            platform: Platform::B,
            operation: "post_message",
            ..
        }));
        assert_eq!(core.history().len(Platform::A), 0);
    }

    #[tokio::test]
    async fn delete_tolerates_missing_mirror() {
        let (core, _a, b) = core_with(&config());
        let event = posted("1.1", UserRef::new("A123"), "hi");
        let Outcome::Mirrored(mirror) = core.on_posted(&event).await.unwrap() else {
            panic!("expected a mirror");
        };
        b.delete_message(&mirror).await.unwrap();

        let outcome = core
            .on_deleted(&DeletedMessage {
                message: event.message.clone(),
                sender: None,
                timestamp: 0,
            })
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::Deleted(mirror));
        assert_eq!(core.history().len(Platform::A), 0);
    }

    #[test]
    fn outcome_serializes_with_tag() {
        let json = serde_json::to_value(Outcome::Ignored(IgnoreReason::OwnEcho)).unwrap();
        assert_eq!(json, serde_json::json!({"outcome": "ignored", "detail": "own_echo"}));
    }
}
