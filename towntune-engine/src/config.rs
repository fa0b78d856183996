//! Configuration types for the towntune-engine crate
//!
//! Controls the reconciler cadence and where hourly tracks are found.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::EngineError;
use crate::model::TrackLibrary;

/// Configuration for a [`TownTune`](crate::TownTune) engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Period between reconciliation ticks
    /// Default: 10 seconds
    pub tick_interval: Duration,

    /// Directory holding `0.<ext>` through `23.<ext>`
    /// Default: `audio`
    pub audio_dir: PathBuf,

    /// Audio file extension, without the dot
    /// Default: `mp3`
    pub track_extension: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(10),
            audio_dir: PathBuf::from("audio"),
            track_extension: "mp3".to_string(),
        }
    }
}

impl EngineConfig {
    /// Create a new EngineConfig with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Sub-second ticks for demos and simulations
    pub fn fast_ticks() -> Self {
        Self {
            tick_interval: Duration::from_millis(250),
            ..Default::default()
        }
    }

    /// Defaults overridden by `TOWNTUNE_TICK_SECS`, `TOWNTUNE_AUDIO_DIR` and
    /// `TOWNTUNE_TRACK_EXTENSION` when present
    pub fn from_env() -> Result<Self, EngineError> {
        let mut config = Self::default();

        if let Ok(secs) = std::env::var("TOWNTUNE_TICK_SECS") {
            let secs: u64 = secs.trim().parse().map_err(|_| {
                EngineError::Configuration(format!("Invalid TOWNTUNE_TICK_SECS: {}", secs))
            })?;
            config.tick_interval = Duration::from_secs(secs);
        }
        if let Ok(dir) = std::env::var("TOWNTUNE_AUDIO_DIR") {
            config.audio_dir = PathBuf::from(dir);
        }
        if let Ok(extension) = std::env::var("TOWNTUNE_TRACK_EXTENSION") {
            config.track_extension = extension;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration and return any issues
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.tick_interval == Duration::ZERO {
            return Err(EngineError::Configuration(
                "Tick interval must be greater than 0".to_string(),
            ));
        }

        if self.track_extension.trim().is_empty() {
            return Err(EngineError::Configuration(
                "Track extension must not be empty".to_string(),
            ));
        }

        if self.track_extension.starts_with('.') {
            return Err(EngineError::Configuration(
                "Track extension must not start with a dot".to_string(),
            ));
        }

        Ok(())
    }

    /// Track library described by this configuration
    pub fn track_library(&self) -> TrackLibrary {
        TrackLibrary::new(self.audio_dir.clone(), self.track_extension.clone())
    }

    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    pub fn with_audio_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.audio_dir = dir.into();
        self
    }

    pub fn with_track_extension(mut self, extension: impl Into<String>) -> Self {
        self.track_extension = extension.into();
        self
    }
}
