//! Per-group playback record

use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;

use towntune_clock::{Hour, Region};

use super::{ChannelId, GroupId};
use crate::backend::{StreamHandle, VoiceHandle};

/// Shared, lockable playback state as stored in the registry
pub type SharedPlaybackState = Arc<Mutex<PlaybackState>>;

/// What the engine knows about one group's playback
///
/// `is_playing` is only the last observation; the backend stays authoritative
/// and is re-queried on every tick.
#[derive(Debug)]
pub struct PlaybackState {
    group_id: GroupId,
    region: Region,
    voice: Option<VoiceHandle>,
    stream: Option<StreamHandle>,
    current_track_hour: Option<Hour>,
    is_playing: bool,
    released: bool,
}

impl PlaybackState {
    /// Fresh state for a group that has not been connected yet
    pub fn new(group_id: GroupId, region: Region) -> Self {
        Self {
            group_id,
            region,
            voice: None,
            stream: None,
            current_track_hour: None,
            is_playing: false,
            released: false,
        }
    }

    pub fn group_id(&self) -> &GroupId {
        &self.group_id
    }

    pub fn region(&self) -> Region {
        self.region
    }

    pub fn voice(&self) -> Option<&VoiceHandle> {
        self.voice.as_ref()
    }

    pub fn stream(&self) -> Option<&StreamHandle> {
        self.stream.as_ref()
    }

    pub fn current_track_hour(&self) -> Option<Hour> {
        self.current_track_hour
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    /// Whether `stop` has already torn this state down
    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Connected and not released; only these groups are reconciled
    pub fn is_summoned(&self) -> bool {
        self.voice.is_some() && !self.released
    }

    /// Serializable view for logs and status output
    pub fn status(&self) -> PlaybackStatus {
        PlaybackStatus {
            group_id: self.group_id.clone(),
            region: self.region,
            channel_id: self.voice.as_ref().map(|voice| voice.channel_id().clone()),
            current_track_hour: self.current_track_hour,
            is_playing: self.is_playing,
        }
    }

    pub(crate) fn set_region(&mut self, region: Region) {
        self.region = region;
    }

    pub(crate) fn attach_voice(&mut self, voice: VoiceHandle) {
        self.voice = Some(voice);
    }

    pub(crate) fn voice_mut(&mut self) -> Option<&mut VoiceHandle> {
        self.voice.as_mut()
    }

    pub(crate) fn take_voice(&mut self) -> Option<VoiceHandle> {
        self.voice.take()
    }

    /// Detach the current stream; playback is no longer assumed
    pub(crate) fn take_stream(&mut self) -> Option<StreamHandle> {
        self.is_playing = false;
        self.stream.take()
    }

    /// A stream for `hour` was just started
    pub(crate) fn record_started(&mut self, hour: Hour, stream: StreamHandle) {
        self.current_track_hour = Some(hour);
        self.stream = Some(stream);
        self.is_playing = true;
    }

    pub(crate) fn record_observation(&mut self, playing: bool) {
        self.is_playing = playing;
    }

    pub(crate) fn mark_released(&mut self) {
        self.released = true;
    }
}

/// Snapshot of a group's playback for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlaybackStatus {
    pub group_id: GroupId,
    pub region: Region,
    pub channel_id: Option<ChannelId>,
    pub current_track_hour: Option<Hour>,
    pub is_playing: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TrackLibrary;

    #[test]
    fn test_new_state_is_empty() {
        let state = PlaybackState::new(GroupId::new("g1"), Region::UsEast);
        assert!(state.voice().is_none());
        assert!(state.stream().is_none());
        assert_eq!(state.current_track_hour(), None);
        assert!(!state.is_playing());
        assert!(!state.is_summoned());
    }

    #[test]
    fn test_record_started_and_take_stream() {
        let mut state = PlaybackState::new(GroupId::new("g1"), Region::UsEast);
        state.attach_voice(VoiceHandle::new(1, GroupId::new("g1"), ChannelId::new("lobby")));
        assert!(state.is_summoned());

        let hour = Hour::new(14).unwrap();
        let track = TrackLibrary::default().track_for(hour);
        state.record_started(hour, StreamHandle::new(3, track));
        assert_eq!(state.current_track_hour(), Some(hour));
        assert!(state.is_playing());

        let stream = state.take_stream().unwrap();
        assert_eq!(stream.id(), 3);
        assert!(!state.is_playing());
        // the hour stays until the next decision point
        assert_eq!(state.current_track_hour(), Some(hour));
    }

    #[test]
    fn test_released_state_is_not_summoned() {
        let mut state = PlaybackState::new(GroupId::new("g1"), Region::Sydney);
        state.attach_voice(VoiceHandle::new(1, GroupId::new("g1"), ChannelId::new("lobby")));
        state.mark_released();
        assert!(!state.is_summoned());
    }

    #[test]
    fn test_status() {
        let mut state = PlaybackState::new(GroupId::new("g1"), Region::Brazil);
        state.attach_voice(VoiceHandle::new(1, GroupId::new("g1"), ChannelId::new("lobby")));
        let status = state.status();
        assert_eq!(status.channel_id, Some(ChannelId::new("lobby")));
        assert_eq!(status.region, Region::Brazil);
    }
}
