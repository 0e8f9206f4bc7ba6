//! Bridge core: mirrors messages between two chat platforms.
//!
//! Platform adapters push [`chatbridge_channels::InboundEvent`]s into the
//! sinks of a [`RunningBridge`]; the [`Dispatcher`] hands them to the
//! [`BridgeCore`], which translates each one and calls the other platform's
//! [`chatbridge_channels::PlatformOutbound`].

pub mod bridge;
pub mod dispatch;
pub mod emoji;
pub mod error;
pub mod history;
pub mod identity;
pub mod locks;
pub mod service;
pub mod translate;

pub use {
    bridge::{BridgeCore, IgnoreReason, Outcome, PlatformProfile},
    dispatch::Dispatcher,
    emoji::EmojiTable,
    error::{Error, Result},
    history::{Correlation, HistoryStore},
    identity::IdentityMap,
    locks::HandleLocks,
    service::{BridgeService, RunningBridge},
    translate::Translator,
};
