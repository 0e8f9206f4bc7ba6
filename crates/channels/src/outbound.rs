use {
    async_trait::async_trait,
    chatbridge_common::{ChannelRef, MessageHandle, Platform},
};

use crate::{Result, message::TranslatedMessage};

/// Outbound side of a platform adapter. Each chat platform implements this.
///
/// Implementations own connection lifecycle, authentication, rate limiting
/// and any retry/timeout policy; the bridge calls each method at most once
/// per inbound event.
#[async_trait]
pub trait PlatformOutbound: Send + Sync {
    /// Which side of the bridge this adapter serves.
    fn platform(&self) -> Platform;

    /// Post a new message and return its handle.
    async fn post_message(
        &self,
        channel: &ChannelRef,
        message: &TranslatedMessage,
    ) -> Result<MessageHandle>;

    /// Replace the body of an existing message.
    ///
    /// Returns the handle of the edited message; platforms that reissue the
    /// message object on edit return the new handle, others echo `handle`.
    async fn edit_message(
        &self,
        handle: &MessageHandle,
        message: &TranslatedMessage,
    ) -> Result<MessageHandle>;

    async fn delete_message(&self, handle: &MessageHandle) -> Result<()>;

    async fn add_reaction(&self, handle: &MessageHandle, emoji: &str) -> Result<()>;

    /// Remove the bot's reaction. Returns [`crate::Error::NotFound`] when the
    /// message carries no such reaction.
    async fn remove_reaction(&self, handle: &MessageHandle, emoji: &str) -> Result<()>;

    /// Fetch the canonical current state of a message after a mutation.
    async fn refetch_message(&self, handle: &MessageHandle) -> Result<MessageHandle>;
}
