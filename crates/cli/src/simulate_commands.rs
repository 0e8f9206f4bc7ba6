//! `simulate`: replay recorded inbound events through a bridge whose platforms
//! are in-memory loopbacks.

use std::{path::Path, sync::Arc};

use {
    anyhow::{Context, Result},
    chatbridge_channels::{
        InboundEvent,
        loopback::{LoopbackOutbound, OutboundCall},
    },
    chatbridge_common::Platform,
    chatbridge_config::{BridgeConfig, load_config, resolve_config_path},
    chatbridge_core::BridgeService,
    chatbridge_metrics::{MetricsRecorderConfig, init_metrics},
    tracing::info,
};

pub async fn simulate(config: Option<&Path>, events: &Path, show_metrics: bool) -> Result<()> {
    let config_path = resolve_config_path(config)?;
    let config = load_config(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;

    let metrics = init_metrics(MetricsRecorderConfig {
        enabled: show_metrics || config.metrics.enabled,
        ..Default::default()
    })?;

    let raw = std::fs::read_to_string(events)
        .with_context(|| format!("reading events from {}", events.display()))?;
    let events = parse_events(&raw)?;
    info!(count = events.len(), "replaying events");

    for (platform, call) in replay(&config, events).await? {
        println!("{}", format_call(&config, platform, &call));
    }

    if show_metrics {
        println!();
        print!("{}", metrics.render());
    }
    Ok(())
}

/// Parse a JSON-lines event file. Blank lines and `#` comments are skipped.
fn parse_events(raw: &str) -> Result<Vec<InboundEvent>> {
    raw.lines()
        .enumerate()
        .filter(|(_, line)| {
            let line = line.trim();
            !line.is_empty() && !line.starts_with('#')
        })
        .map(|(i, line)| {
            InboundEvent::from_json(line).with_context(|| format!("event on line {}", i + 1))
        })
        .collect()
}

/// Feed `events` through a bridge and return every outbound call, platform A's
/// first.
async fn replay(
    config: &BridgeConfig,
    events: Vec<InboundEvent>,
) -> Result<Vec<(Platform, OutboundCall)>> {
    let a = Arc::new(LoopbackOutbound::new(Platform::A, config.a.markup));
    let b = Arc::new(LoopbackOutbound::new(Platform::B, config.b.markup));
    let bridge = BridgeService::start(config, a.clone(), b.clone())?;

    for event in events {
        bridge.sink(event.platform()).push(event).await?;
    }
    bridge.finish().await;

    let calls = a
        .calls()
        .into_iter()
        .map(|call| (Platform::A, call))
        .chain(b.calls().into_iter().map(|call| (Platform::B, call)))
        .collect();
    Ok(calls)
}

fn format_call(config: &BridgeConfig, platform: Platform, call: &OutboundCall) -> String {
    let label = config.platform(platform).label(platform);
    match call.payload {
        Some(ref payload) => format!("{label} {} {} {payload}", call.operation, call.handle.id),
        None => format!("{label} {} {}", call.operation, call.handle.id),
    }
}
