//! Wiring: config + two adapters in, a running bridge out.

use std::sync::Arc;

use {
    chatbridge_channels::{EventSink, PlatformOutbound, event_channel},
    chatbridge_common::Platform,
    chatbridge_config::{BridgeConfig, Severity, check_semantics},
    tokio::task::JoinHandle,
    tokio_util::sync::CancellationToken,
    tracing::{info, warn},
};

use crate::{
    bridge::BridgeCore,
    dispatch::Dispatcher,
    error::{Error, Result},
};

pub struct BridgeService;

impl BridgeService {
    /// Validate `config`, build the core and spawn the dispatcher.
    ///
    /// Must be called from within a Tokio runtime. Any configuration error is
    /// fatal: nothing is spawned and no event is consumed.
    pub fn start(
        config: &BridgeConfig,
        outbound_a: Arc<dyn PlatformOutbound>,
        outbound_b: Arc<dyn PlatformOutbound>,
    ) -> Result<RunningBridge> {
        let errors: Vec<String> = check_semantics(config)
            .into_iter()
            .filter(|d| d.severity == Severity::Error)
            .map(|d| format!("{}: {}", d.path, d.message))
            .collect();
        if !errors.is_empty() {
            return Err(Error::config(errors.join("; ")));
        }

        let core = Arc::new(BridgeCore::new(config, outbound_a, outbound_b)?);
        let (sink_a, rx_a) = event_channel(Platform::A, config.dispatch.queue_depth);
        let (sink_b, rx_b) = event_channel(Platform::B, config.dispatch.queue_depth);

        let cancel = CancellationToken::new();
        let dispatcher = Dispatcher::new(Arc::clone(&core), cancel.clone());
        let task = tokio::spawn(dispatcher.run(rx_a, rx_b));

        info!(
            queue_depth = config.dispatch.queue_depth,
            "bridge started"
        );

        Ok(RunningBridge {
            sink_a,
            sink_b,
            core,
            cancel,
            task,
        })
    }
}

/// Handle to a started bridge.
pub struct RunningBridge {
    sink_a: EventSink,
    sink_b: EventSink,
    core: Arc<BridgeCore>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl RunningBridge {
    /// The sink the adapter for `platform` pushes its events into.
    pub fn sink(&self, platform: Platform) -> EventSink {
        match platform {
            Platform::A => self.sink_a.clone(),
            Platform::B => self.sink_b.clone(),
        }
    }

    pub fn core(&self) -> &Arc<BridgeCore> {
        &self.core
    }

    /// Token that stops the dispatcher when cancelled.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Stop accepting events and wait for in-flight ones to finish. Events
    /// still queued are dropped.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        self.join().await;
    }

    /// Close this handle's sinks and wait until every queued event has been
    /// handled. Returns once all other sink clones are dropped too.
    pub async fn finish(self) {
        let Self {
            sink_a,
            sink_b,
            task,
            ..
        } = self;
        drop(sink_a);
        drop(sink_b);
        if let Err(e) = task.await {
            warn!(error = %e, "dispatcher task failed");
        }
    }

    async fn join(self) {
        if let Err(e) = self.task.await {
            warn!(error = %e, "dispatcher task failed");
        }
    }
}
