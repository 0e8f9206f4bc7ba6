use {chatbridge_common::Platform, tokio::sync::mpsc, tracing::debug};

use crate::{Error, Result, event::InboundEvent};

/// Receiver end of a platform's event channel; consumed by the dispatcher.
pub type EventReceiver = mpsc::Receiver<InboundEvent>;

/// Push side handed to a platform adapter.
///
/// Each platform gets exactly one ordered channel; the bridge is its sole
/// consumer, so adapters never touch shared bridge state from their callbacks.
#[derive(Debug, Clone)]
pub struct EventSink {
    platform: Platform,
    tx: mpsc::Sender<InboundEvent>,
}

/// Create the bounded event channel for one platform.
pub fn event_channel(platform: Platform, depth: usize) -> (EventSink, EventReceiver) {
    let (tx, rx) = mpsc::channel(depth.max(1));
    (EventSink { platform, tx }, rx)
}

impl EventSink {
    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// Deliver an event, waiting for queue capacity.
    pub async fn push(&self, event: InboundEvent) -> Result<()> {
        self.check_platform(&event)?;
        debug!(platform = %self.platform, kind = %event.kind(), "queueing inbound event");
        self.tx
            .send(event)
            .await
            .map_err(|_| Error::unavailable(self.platform, "bridge is no longer consuming events"))
    }

    /// Deliver an event without waiting; for adapters whose callbacks are
    /// synchronous.
    pub fn try_push(&self, event: InboundEvent) -> Result<()> {
        self.check_platform(&event)?;
        self.tx.try_send(event).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => {
                Error::unavailable(self.platform, "event queue is full")
            },
            mpsc::error::TrySendError::Closed(_) => {
                Error::unavailable(self.platform, "bridge is no longer consuming events")
            },
        })
    }

    fn check_platform(&self, event: &InboundEvent) -> Result<()> {
        if event.platform() != self.platform {
            return Err(Error::invalid_input(format!(
                "event for platform {} pushed to the {} sink",
                event.platform(),
                self.platform
            )));
        }
        Ok(())
    }
}
