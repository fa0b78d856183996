//! In-process backend and gateway
//!
//! Nothing here touches audio or the network. Streams are bookkeeping
//! entries that stay active until stopped, finished by hand, or (optionally)
//! until a fixed track length has elapsed. Entries are dropped as soon as a
//! stream is known to be over. Both types record every call and
//! can be told to fail, which makes them suitable for dry runs and tests.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tokio::time::Instant;

use crate::backend::{PlaybackBackend, StreamHandle, VoiceGateway, VoiceHandle};
use crate::error::{BackendError, GatewayError};
use crate::model::{ChannelId, GroupId, TrackRef};

/// A stream start seen by [`MemoryBackend`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartRecord {
    pub stream_id: u64,
    pub voice_id: u64,
    pub group_id: GroupId,
    pub track: TrackRef,
}

#[derive(Debug)]
struct StreamEntry {
    group_id: GroupId,
    track: TrackRef,
    started_at: Instant,
}

#[derive(Debug, Default)]
struct BackendInner {
    next_id: u64,
    streams: HashMap<u64, StreamEntry>,
    starts: Vec<StartRecord>,
    stops: Vec<u64>,
    fail_all_starts: bool,
    fail_starts_for: HashSet<GroupId>,
    fail_stops: bool,
}

/// Playback backend that only keeps books
#[derive(Debug, Default)]
pub struct MemoryBackend {
    inner: Mutex<BackendInner>,
    track_length: Option<Duration>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Streams report inactive once `length` has passed since they started
    pub fn with_track_length(length: Duration) -> Self {
        Self {
            inner: Mutex::new(BackendInner::default()),
            track_length: Some(length),
        }
    }

    /// Make every start fail (or succeed again)
    pub fn set_fail_starts(&self, fail: bool) {
        self.inner.lock().fail_all_starts = fail;
    }

    /// Make starts fail for one group only
    pub fn fail_starts_for(&self, group_id: &GroupId) {
        self.inner.lock().fail_starts_for.insert(group_id.clone());
    }

    pub fn set_fail_stops(&self, fail: bool) {
        self.inner.lock().fail_stops = fail;
    }

    /// Undo every injected failure
    pub fn clear_failures(&self) {
        let mut inner = self.inner.lock();
        inner.fail_all_starts = false;
        inner.fail_starts_for.clear();
        inner.fail_stops = false;
    }

    /// End every stream of a group as if its track ran out
    pub fn finish_group(&self, group_id: &GroupId) {
        self.inner
            .lock()
            .streams
            .retain(|_, entry| &entry.group_id != group_id);
    }

    /// Every start so far, oldest first
    pub fn starts(&self) -> Vec<StartRecord> {
        self.inner.lock().starts.clone()
    }

    /// Starts issued for one group, oldest first
    pub fn starts_for(&self, group_id: &GroupId) -> Vec<StartRecord> {
        self.inner
            .lock()
            .starts
            .iter()
            .filter(|record| &record.group_id == group_id)
            .cloned()
            .collect()
    }

    /// IDs of streams that were explicitly stopped
    pub fn stops(&self) -> Vec<u64> {
        self.inner.lock().stops.clone()
    }

    /// Tracks currently audible for a group
    pub fn active_tracks(&self, group_id: &GroupId) -> Vec<TrackRef> {
        let inner = self.inner.lock();
        let mut active: Vec<(u64, TrackRef)> = inner
            .streams
            .iter()
            .filter(|(_, entry)| &entry.group_id == group_id && self.entry_active(entry))
            .map(|(id, entry)| (*id, entry.track.clone()))
            .collect();
        active.sort_by_key(|(id, _)| *id);
        active.into_iter().map(|(_, track)| track).collect()
    }

    pub fn active_stream_count(&self) -> usize {
        let inner = self.inner.lock();
        inner
            .streams
            .values()
            .filter(|entry| self.entry_active(entry))
            .count()
    }

    /// Streams not yet known to be over, including expired ones nobody has
    /// asked about since
    pub fn tracked_stream_count(&self) -> usize {
        self.inner.lock().streams.len()
    }

    fn entry_active(&self, entry: &StreamEntry) -> bool {
        match self.track_length {
            Some(length) => entry.started_at.elapsed() < length,
            None => true,
        }
    }
}

#[async_trait]
impl PlaybackBackend for MemoryBackend {
    async fn start_stream(
        &self,
        voice: &VoiceHandle,
        track: &TrackRef,
    ) -> Result<StreamHandle, BackendError> {
        let mut inner = self.inner.lock();
        if inner.fail_all_starts || inner.fail_starts_for.contains(voice.group_id()) {
            return Err(BackendError::StartFailed {
                track: track.to_string(),
                reason: "injected start failure".to_string(),
            });
        }

        inner.next_id += 1;
        let stream_id = inner.next_id;
        inner.streams.insert(
            stream_id,
            StreamEntry {
                group_id: voice.group_id().clone(),
                track: track.clone(),
                started_at: Instant::now(),
            },
        );
        inner.starts.push(StartRecord {
            stream_id,
            voice_id: voice.id(),
            group_id: voice.group_id().clone(),
            track: track.clone(),
        });

        tracing::debug!("Memory backend started stream {} ({})", stream_id, track);
        Ok(StreamHandle::new(stream_id, track.clone()))
    }

    async fn stop_stream(&self, stream: &StreamHandle) -> Result<(), BackendError> {
        let mut inner = self.inner.lock();
        if inner.fail_stops {
            return Err(BackendError::StopFailed {
                stream: stream.id(),
                reason: "injected stop failure".to_string(),
            });
        }

        match inner.streams.remove(&stream.id()) {
            Some(_) => {
                inner.stops.push(stream.id());
                Ok(())
            }
            None => Err(BackendError::StopFailed {
                stream: stream.id(),
                reason: "unknown stream".to_string(),
            }),
        }
    }

    async fn is_active(&self, stream: &StreamHandle) -> bool {
        let mut inner = self.inner.lock();
        let active = inner
            .streams
            .get(&stream.id())
            .map(|entry| self.entry_active(entry))
            .unwrap_or(false);
        if !active {
            inner.streams.remove(&stream.id());
        }
        active
    }
}

/// A call seen by [`MemoryGateway`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayEvent {
    Joined {
        voice_id: u64,
        group_id: GroupId,
        channel_id: ChannelId,
    },
    Moved {
        voice_id: u64,
        channel_id: ChannelId,
    },
    Disconnected {
        voice_id: u64,
        group_id: GroupId,
    },
}

#[derive(Debug, Default)]
struct GatewayInner {
    next_id: u64,
    connections: HashMap<u64, (GroupId, ChannelId)>,
    events: Vec<GatewayEvent>,
    fail_joins: bool,
    fail_moves: bool,
    fail_disconnects: bool,
}

/// Voice gateway that only keeps books
#[derive(Debug, Default)]
pub struct MemoryGateway {
    inner: Mutex<GatewayInner>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_joins(&self, fail: bool) {
        self.inner.lock().fail_joins = fail;
    }

    pub fn set_fail_moves(&self, fail: bool) {
        self.inner.lock().fail_moves = fail;
    }

    pub fn set_fail_disconnects(&self, fail: bool) {
        self.inner.lock().fail_disconnects = fail;
    }

    pub fn events(&self) -> Vec<GatewayEvent> {
        self.inner.lock().events.clone()
    }

    /// Number of live connections across all groups
    pub fn connection_count(&self) -> usize {
        self.inner.lock().connections.len()
    }

    /// Live connections for one group
    pub fn connections_for(&self, group_id: &GroupId) -> Vec<ChannelId> {
        self.inner
            .lock()
            .connections
            .values()
            .filter(|(group, _)| group == group_id)
            .map(|(_, channel)| channel.clone())
            .collect()
    }

    pub fn is_connected(&self, voice_id: u64) -> bool {
        self.inner.lock().connections.contains_key(&voice_id)
    }
}

#[async_trait]
impl VoiceGateway for MemoryGateway {
    async fn join(
        &self,
        group_id: &GroupId,
        channel_id: &ChannelId,
    ) -> Result<VoiceHandle, GatewayError> {
        let mut inner = self.inner.lock();
        if inner.fail_joins {
            return Err(GatewayError::JoinFailed {
                group_id: group_id.clone(),
                channel_id: channel_id.clone(),
                reason: "injected join failure".to_string(),
            });
        }

        inner.next_id += 1;
        let voice_id = inner.next_id;
        inner
            .connections
            .insert(voice_id, (group_id.clone(), channel_id.clone()));
        inner.events.push(GatewayEvent::Joined {
            voice_id,
            group_id: group_id.clone(),
            channel_id: channel_id.clone(),
        });
        Ok(VoiceHandle::new(voice_id, group_id.clone(), channel_id.clone()))
    }

    async fn move_to(
        &self,
        voice: &mut VoiceHandle,
        channel_id: &ChannelId,
    ) -> Result<(), GatewayError> {
        let mut inner = self.inner.lock();
        if inner.fail_moves {
            return Err(GatewayError::MoveFailed {
                channel_id: channel_id.clone(),
                reason: "injected move failure".to_string(),
            });
        }

        if let Some(connection) = inner.connections.get_mut(&voice.id()) {
            connection.1 = channel_id.clone();
        }
        inner.events.push(GatewayEvent::Moved {
            voice_id: voice.id(),
            channel_id: channel_id.clone(),
        });
        voice.set_channel(channel_id.clone());
        Ok(())
    }

    async fn disconnect(&self, voice: &VoiceHandle) -> Result<(), GatewayError> {
        let mut inner = self.inner.lock();
        if inner.fail_disconnects {
            return Err(GatewayError::DisconnectFailed {
                group_id: voice.group_id().clone(),
                reason: "injected disconnect failure".to_string(),
            });
        }

        inner.connections.remove(&voice.id());
        inner.events.push(GatewayEvent::Disconnected {
            voice_id: voice.id(),
            group_id: voice.group_id().clone(),
        });
        Ok(())
    }
}
