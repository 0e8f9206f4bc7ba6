//! Ordered event dispatch.
//!
//! The dispatcher is the only consumer of both platforms' event queues. Events
//! for different source messages run concurrently; events for the same source
//! message form a lane and are handled one after another in arrival order.

use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex},
    time::Instant,
};

use {
    chatbridge_channels::{EventReceiver, InboundEvent},
    chatbridge_common::HandleKey,
    tokio_util::{sync::CancellationToken, task::TaskTracker},
    tracing::{debug, info, warn},
};

#[cfg(feature = "metrics")]
use chatbridge_metrics::{bridge as bridge_metrics, histogram, labels};

use crate::bridge::BridgeCore;

/// Pending events per source message. A key is present while a worker owns
/// its lane.
type Lanes = Mutex<HashMap<HandleKey, VecDeque<InboundEvent>>>;

pub struct Dispatcher {
    core: Arc<BridgeCore>,
    lanes: Arc<Lanes>,
    tracker: TaskTracker,
    cancel: CancellationToken,
}

impl Dispatcher {
    pub fn new(core: Arc<BridgeCore>, cancel: CancellationToken) -> Self {
        Self {
            core,
            lanes: Arc::new(Mutex::new(HashMap::new())),
            tracker: TaskTracker::new(),
            cancel,
        }
    }

    /// Consume both queues until both are closed or the token is cancelled,
    /// then wait for every accepted event to finish.
    pub async fn run(self, mut rx_a: EventReceiver, mut rx_b: EventReceiver) {
        let mut open_a = true;
        let mut open_b = true;

        while open_a || open_b {
            tokio::select! {
                () = self.cancel.cancelled() => {
                    info!("dispatcher cancelled, no longer accepting events");
                    break;
                },
                event = rx_a.recv(), if open_a => match event {
                    Some(event) => self.dispatch(event),
                    None => open_a = false,
                },
                event = rx_b.recv(), if open_b => match event {
                    Some(event) => self.dispatch(event),
                    None => open_b = false,
                },
            }
        }

        self.tracker.close();
        self.tracker.wait().await;
        debug!("dispatcher drained");
    }

    /// Queue `event` behind any in-flight event for the same message, or start
    /// a worker for it.
    fn dispatch(&self, event: InboundEvent) {
        let key = event.message().key();
        {
            let mut lanes = self.lanes.lock().unwrap_or_else(|e| e.into_inner());
            if let Some(pending) = lanes.get_mut(&key) {
                debug!(source = %key, queued = pending.len() + 1, "event queued behind in-flight event");
                pending.push_back(event);
                return;
            }
            lanes.insert(key.clone(), VecDeque::new());
        }

        let core = Arc::clone(&self.core);
        let lanes = Arc::clone(&self.lanes);
        self.tracker.spawn(run_lane(core, lanes, key, event));
    }
}

async fn run_lane(core: Arc<BridgeCore>, lanes: Arc<Lanes>, key: HandleKey, first: InboundEvent) {
    let mut next = Some(first);
    while let Some(event) = next {
        handle(&core, &event).await;
        let mut guard = lanes.lock().unwrap_or_else(|e| e.into_inner());
        next = guard.get_mut(&key).and_then(VecDeque::pop_front);
        if next.is_none() {
            guard.remove(&key);
        }
    }
}

async fn handle(core: &BridgeCore, event: &InboundEvent) {
    let started = Instant::now();
    let result = core.on_event(event).await;

    #[cfg(feature = "metrics")]
    histogram!(
        bridge_metrics::EVENT_DURATION_SECONDS,
        labels::KIND => event.kind().as_str()
    )
    .record(started.elapsed().as_secs_f64());

    match result {
        Ok(outcome) => debug!(
            kind = %event.kind(),
            source = %event.message().key(),
            ?outcome,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "event handled"
        ),
        Err(e) => warn!(
            kind = %event.kind(),
            source = %event.message().key(),
            error = %e,
            "event dropped"
        ),
    }
}
