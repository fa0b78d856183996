//! # towntune-engine
//!
//! Keeps every summoned chat group listening to the track for its local hour.
//!
//! A group is summoned into a voice channel with a region label. From then on
//! a background [`Reconciler`] checks each group every tick: when the local
//! hour has moved on it switches tracks, and when the track has finished it
//! starts the same hour again. [`CommandSurface`] handles the user commands.
//!
//! Audio and chat transport stay behind two traits, [`PlaybackBackend`] and
//! [`VoiceGateway`]. [`MemoryBackend`] and [`MemoryGateway`] implement both
//! in-process for dry runs and tests.
//!
//! ## Architecture
//!
//! ```text
//! CommandSurface ──┐
//!                  ├── GroupRegistry (group -> Arc<Mutex<PlaybackState>>)
//! Reconciler ──────┘
//!      │
//!      ├── HourSchedule (towntune-clock)
//!      └── PlaybackBackend / VoiceGateway
//! ```

pub mod backend;
pub mod commands;
pub mod config;
pub mod engine;
pub mod error;
pub mod logging;
pub mod memory;
pub mod model;
pub mod reconciler;
pub mod registry;

pub use backend::{PlaybackBackend, StreamHandle, VoiceGateway, VoiceHandle};
pub use commands::{CommandSurface, StopOutcome, SummonOutcome};
pub use config::EngineConfig;
pub use engine::TownTune;
pub use error::{BackendError, CommandError, CommandResult, EngineError, GatewayError};
pub use logging::{init_logging, init_logging_from_env, LoggingError, LoggingMode};
pub use memory::{GatewayEvent, MemoryBackend, MemoryGateway, StartRecord};
pub use model::{
    ChannelId, GroupId, PlaybackState, PlaybackStatus, SharedPlaybackState, TrackLibrary, TrackRef,
};
pub use reconciler::{GroupOutcome, Observation, Reconciler, ReconcilerHandle, TickReport};
pub use registry::GroupRegistry;

// Clock types most callers need alongside the engine
pub use towntune_clock::{Clock, FixedClock, Hour, HourSchedule, Region, SystemClock};
