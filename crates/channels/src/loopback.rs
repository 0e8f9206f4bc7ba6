//! In-memory platform used by tests and the `simulate` command.
//!
//! Messages live in a map, every outbound call is recorded, and failures can
//! be injected per operation to exercise the bridge's error paths.

use std::{
    collections::HashMap,
    fmt,
    sync::Mutex,
};

use {
    async_trait::async_trait,
    chatbridge_common::{ChannelRef, MessageHandle, NativeId, Platform},
    serde::Serialize,
    tracing::debug,
};

use crate::{
    Error, Result, markup::Markup, message::TranslatedMessage, outbound::PlatformOutbound,
};

/// First id handed out by a snowflake-style loopback platform.
const SNOWFLAKE_BASE: u64 = 900_000_000_000_000_000;
/// Epoch seconds used for timestamp-style ids.
const TIMESTAMP_BASE: u64 = 1_700_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Post,
    Edit,
    Delete,
    AddReaction,
    RemoveReaction,
    Refetch,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Post => "post",
            Self::Edit => "edit",
            Self::Delete => "delete",
            Self::AddReaction => "add_reaction",
            Self::RemoveReaction => "remove_reaction",
            Self::Refetch => "refetch",
        })
    }
}

/// A recorded outbound call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutboundCall {
    pub operation: Operation,
    pub handle: MessageHandle,
    /// Rendered text for post/edit, emoji name for reactions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,
}

/// A message stored on the loopback platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopbackMessage {
    pub handle: MessageHandle,
    pub text: String,
    pub reactions: Vec<String>,
}

#[derive(Default)]
struct LoopbackState {
    next_seq: u64,
    messages: HashMap<NativeId, LoopbackMessage>,
    calls: Vec<OutboundCall>,
    failures: HashMap<Operation, usize>,
}

/// In-memory [`PlatformOutbound`].
pub struct LoopbackOutbound {
    platform: Platform,
    markup: Markup,
    reissue: bool,
    state: Mutex<LoopbackState>,
}

impl LoopbackOutbound {
    pub fn new(platform: Platform, markup: Markup) -> Self {
        Self {
            platform,
            markup,
            reissue: false,
            state: Mutex::new(LoopbackState::default()),
        }
    }

    /// Reissue message objects (new id) on every edit and refetch, like
    /// platforms whose message objects are immutable snapshots.
    #[must_use]
    pub fn reissuing(mut self) -> Self {
        self.reissue = true;
        self
    }

    /// Make the next `times` calls of `operation` fail.
    pub fn fail_next(&self, operation: Operation, times: usize) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        *state.failures.entry(operation).or_default() += times;
    }

    pub fn calls(&self) -> Vec<OutboundCall> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.calls.clone()
    }

    pub fn message(&self, id: &NativeId) -> Option<LoopbackMessage> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.messages.get(id).cloned()
    }

    pub fn message_count(&self) -> usize {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.messages.len()
    }

    fn next_id(&self, state: &mut LoopbackState) -> NativeId {
        state.next_seq += 1;
        match self.markup {
            Markup::Discord => NativeId::Int(SNOWFLAKE_BASE + state.next_seq),
            Markup::Slack => NativeId::Text(format!("{TIMESTAMP_BASE}.{:06}", state.next_seq)),
        }
    }

    /// Record the call, then consume an injected failure if one is pending.
    fn begin(
        &self,
        state: &mut LoopbackState,
        operation: Operation,
        handle: &MessageHandle,
        payload: Option<String>,
    ) -> Result<()> {
        state.calls.push(OutboundCall {
            operation,
            handle: handle.clone(),
            payload,
        });
        if let Some(remaining) = state.failures.get_mut(&operation)
            && *remaining > 0
        {
            *remaining -= 1;
            return Err(Error::external(
                format!("loopback {} {operation}", self.platform),
                std::io::Error::other("injected failure"),
            ));
        }
        Ok(())
    }

    fn reissue_if_needed(&self, state: &mut LoopbackState, handle: &MessageHandle) -> MessageHandle {
        if !self.reissue {
            return handle.clone();
        }
        let new_id = self.next_id(state);
        let Some(mut stored) = state.messages.remove(&handle.id) else {
            return handle.clone();
        };
        stored.handle.id = new_id.clone();
        let new_handle = stored.handle.clone();
        state.messages.insert(new_id, stored);
        new_handle
    }
}

#[async_trait]
impl PlatformOutbound for LoopbackOutbound {
    fn platform(&self) -> Platform {
        self.platform
    }

    async fn post_message(
        &self,
        channel: &ChannelRef,
        message: &TranslatedMessage,
    ) -> Result<MessageHandle> {
        let text = self.markup.render(message);
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let id = self.next_id(&mut state);
        let handle = MessageHandle {
            platform: self.platform,
            id: id.clone(),
            channel: channel.clone(),
        };
        self.begin(&mut state, Operation::Post, &handle, Some(text.clone()))?;
        debug!(platform = %self.platform, id = %id, "loopback post");
        state.messages.insert(id, LoopbackMessage {
            handle: handle.clone(),
            text,
            reactions: Vec::new(),
        });
        Ok(handle)
    }

    async fn edit_message(
        &self,
        handle: &MessageHandle,
        message: &TranslatedMessage,
    ) -> Result<MessageHandle> {
        let text = self.markup.render(message);
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        self.begin(&mut state, Operation::Edit, handle, Some(text.clone()))?;
        let stored = state
            .messages
            .get_mut(&handle.id)
            .ok_or_else(|| Error::not_found(format!("message {}", handle.id)))?;
        stored.text = text;
        Ok(self.reissue_if_needed(&mut state, handle))
    }

    async fn delete_message(&self, handle: &MessageHandle) -> Result<()> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        self.begin(&mut state, Operation::Delete, handle, None)?;
        state
            .messages
            .remove(&handle.id)
            .map(|_| ())
            .ok_or_else(|| Error::not_found(format!("message {}", handle.id)))
    }

    async fn add_reaction(&self, handle: &MessageHandle, emoji: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        self.begin(&mut state, Operation::AddReaction, handle, Some(emoji.to_string()))?;
        let stored = state
            .messages
            .get_mut(&handle.id)
            .ok_or_else(|| Error::not_found(format!("message {}", handle.id)))?;
        if !stored.reactions.iter().any(|r| r == emoji) {
            stored.reactions.push(emoji.to_string());
        }
        Ok(())
    }

    async fn remove_reaction(&self, handle: &MessageHandle, emoji: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        self.begin(
            &mut state,
            Operation::RemoveReaction,
            handle,
            Some(emoji.to_string()),
        )?;
        let stored = state
            .messages
            .get_mut(&handle.id)
            .ok_or_else(|| Error::not_found(format!("message {}", handle.id)))?;
        let before = stored.reactions.len();
        stored.reactions.retain(|r| r != emoji);
        if stored.reactions.len() == before {
            return Err(Error::not_found(format!(
                "reaction {emoji} on message {}",
                handle.id
            )));
        }
        Ok(())
    }

    async fn refetch_message(&self, handle: &MessageHandle) -> Result<MessageHandle> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        self.begin(&mut state, Operation::Refetch, handle, None)?;
        if !state.messages.contains_key(&handle.id) {
            return Err(Error::not_found(format!("message {}", handle.id)));
        }
        Ok(self.reissue_if_needed(&mut state, handle))
    }
}
