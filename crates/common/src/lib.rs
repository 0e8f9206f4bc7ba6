//! Shared types, error definitions, and utilities used across all chatbridge crates.

pub mod error;
pub mod types;

pub use {
    error::{Error, FromMessage, Result},
    types::{ChannelRef, HandleKey, MessageHandle, NativeId, Platform, UserRef},
};
