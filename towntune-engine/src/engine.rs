//! TownTune - main entry point for the engine
//!
//! Wires a registry, an hour schedule, a playback backend and a voice
//! gateway together and hands out the two things a bot needs: the command
//! surface and the reconciler.

use std::sync::Arc;

use towntune_clock::{Clock, HourSchedule, SystemClock};

use crate::backend::{PlaybackBackend, VoiceGateway};
use crate::commands::CommandSurface;
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::reconciler::{Reconciler, ReconcilerHandle};
use crate::registry::GroupRegistry;

/// Main engine entry point
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use towntune_engine::{ChannelId, EngineConfig, GroupId, MemoryBackend, MemoryGateway, TownTune};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let engine = TownTune::new(
///         EngineConfig::default(),
///         Arc::new(MemoryBackend::new()),
///         Arc::new(MemoryGateway::new()),
///     )?;
///     let reconciler = engine.spawn_reconciler();
///
///     let outcome = engine
///         .commands()
///         .summon(&GroupId::new("guild-1"), "us-east", Some(&ChannelId::new("lobby")))
///         .await?;
///     println!("{}", outcome);
///
///     reconciler.shutdown().await?;
///     Ok(())
/// }
/// ```
pub struct TownTune {
    config: EngineConfig,
    registry: GroupRegistry,
    schedule: Arc<HourSchedule>,
    commands: CommandSurface,
    reconciler: Reconciler,
}

impl TownTune {
    /// Create an engine driven by the system clock
    pub fn new(
        config: EngineConfig,
        backend: Arc<dyn PlaybackBackend>,
        gateway: Arc<dyn VoiceGateway>,
    ) -> Result<Self, EngineError> {
        Self::with_clock(config, backend, gateway, Arc::new(SystemClock))
    }

    /// Create an engine driven by the given clock
    pub fn with_clock(
        config: EngineConfig,
        backend: Arc<dyn PlaybackBackend>,
        gateway: Arc<dyn VoiceGateway>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, EngineError> {
        config.validate()?;

        let registry = GroupRegistry::new();
        let schedule = Arc::new(HourSchedule::new(clock));
        let tracks = config.track_library();

        let commands = CommandSurface::new(
            registry.clone(),
            Arc::clone(&schedule),
            Arc::clone(&backend),
            gateway,
            tracks.clone(),
        );
        let reconciler = Reconciler::new(
            registry.clone(),
            Arc::clone(&schedule),
            backend,
            tracks,
            config.tick_interval,
        );

        tracing::debug!("TownTune engine created with {:?}", config);

        Ok(Self {
            config,
            registry,
            schedule,
            commands,
            reconciler,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn commands(&self) -> &CommandSurface {
        &self.commands
    }

    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    /// Start the periodic tick loop on the current runtime
    pub fn spawn_reconciler(&self) -> ReconcilerHandle {
        self.reconciler.clone().spawn()
    }

    pub fn registry(&self) -> &GroupRegistry {
        &self.registry
    }

    pub fn schedule(&self) -> &Arc<HourSchedule> {
        &self.schedule
    }
}

impl std::fmt::Debug for TownTune {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TownTune")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryBackend, MemoryGateway};
    use std::time::Duration;

    #[test]
    fn test_rejects_invalid_config() {
        let config = EngineConfig::default().with_tick_interval(Duration::ZERO);
        let result = TownTune::new(
            config,
            Arc::new(MemoryBackend::new()),
            Arc::new(MemoryGateway::new()),
        );
        assert!(matches!(result, Err(EngineError::Configuration(_))));
    }

    #[test]
    fn test_parts_share_one_registry() {
        let engine = TownTune::new(
            EngineConfig::fast_ticks(),
            Arc::new(MemoryBackend::new()),
            Arc::new(MemoryGateway::new()),
        )
        .unwrap();

        assert_eq!(engine.reconciler().tick_interval(), Duration::from_millis(250));
        assert!(engine.registry().is_empty());
        engine.commands().set_test_hour(Some(3)).unwrap();
        assert_eq!(engine.schedule().override_hour().map(|h| h.get()), Some(3));
    }
}
