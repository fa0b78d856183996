//! Dry run of the engine against the in-memory backend
//!
//! Summons a few fake groups, drives the reconciler tick by tick and prints
//! what it decided. Nothing is played; the backend only keeps books.

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;

use towntune_engine::{
    ChannelId, EngineConfig, GroupId, MemoryBackend, MemoryGateway, TickReport, TownTune,
};

/// Parameters for one simulation run
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    pub region: String,
    pub groups: usize,
    pub ticks: u32,
    pub test_hour: Option<i64>,
    /// Streams end on their own after this long; `None` plays forever
    pub track_length: Option<Duration>,
    pub engine: EngineConfig,
}

/// What happened during a run
#[derive(Debug, Clone, Default)]
pub struct SimulationSummary {
    pub reports: Vec<TickReport>,
    pub starts: usize,
    pub stops: usize,
}

pub async fn run(config: SimulationConfig) -> Result<SimulationSummary> {
    let backend = Arc::new(match config.track_length {
        Some(length) => MemoryBackend::with_track_length(length),
        None => MemoryBackend::new(),
    });
    let gateway = Arc::new(MemoryGateway::new());
    let engine = TownTune::new(config.engine.clone(), backend.clone(), gateway)
        .context("Failed to build engine")?;

    if config.test_hour.is_some() {
        engine
            .commands()
            .set_test_hour(config.test_hour)
            .map_err(|e| anyhow::anyhow!(e.reply()))?;
    }

    let groups: Vec<GroupId> = (1..=config.groups)
        .map(|i| GroupId::new(format!("sim-{}", i)))
        .collect();

    for group in &groups {
        let outcome = engine
            .commands()
            .summon(group, &config.region, Some(&ChannelId::new("sim-voice")))
            .await
            .map_err(|e| anyhow::anyhow!(e.reply()))?;
        println!("[{}] {} ({})", group, outcome, outcome.track);
    }

    let mut summary = SimulationSummary::default();
    let period = engine.reconciler().tick_interval();
    for tick in 1..=config.ticks {
        tokio::time::sleep(period).await;
        let report = engine.reconciler().tick().await;
        println!("tick {:>3}: {}", tick, report);
        summary.reports.push(report);
    }

    for group in &groups {
        let outcome = engine
            .commands()
            .stop(group)
            .await
            .map_err(|e| anyhow::anyhow!(e.reply()))?;
        tracing::debug!("[{}] {:?}", group, outcome);
    }

    summary.starts = backend.starts().len();
    summary.stops = backend.stops().len();
    Ok(summary)
}
