//! Model types for towntune-engine

mod id_types;
mod playback_state;
mod track;

pub use id_types::{ChannelId, GroupId};
pub use playback_state::{PlaybackState, PlaybackStatus, SharedPlaybackState};
pub use track::{TrackLibrary, TrackRef};
