//! Platform adapter seam.
//!
//! Each chat platform (Slack, Discord, ...) pushes [`InboundEvent`]s into an
//! [`EventSink`] and implements [`PlatformOutbound`] for the calls the bridge
//! makes back. [`Markup`] covers each platform's text dialect.

pub mod error;
pub mod event;
pub mod gating;
pub mod loopback;
pub mod markup;
pub mod message;
pub mod outbound;
pub mod sink;

pub use {
    error::{Error, Result},
    event::{
        DeletedMessage, EventKind, InboundEvent, PostedMessage, ReactionChange, UpdatedMessage,
    },
    gating::MentionMode,
    markup::Markup,
    message::{Segment, TranslatedMessage},
    outbound::PlatformOutbound,
    sink::{EventReceiver, EventSink, event_channel},
};
