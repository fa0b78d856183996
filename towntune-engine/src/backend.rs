//! Seams to the outside world: audio playback and voice connections
//!
//! The engine never talks to a chat platform directly. A deployment plugs a
//! [`VoiceGateway`] (join / move / disconnect) and a [`PlaybackBackend`]
//! (start / stop / is-active) in; [`crate::memory`] provides in-process
//! implementations for tests and dry runs.

use async_trait::async_trait;

use crate::error::{BackendError, GatewayError};
use crate::model::{ChannelId, GroupId, TrackRef};

/// Exclusive handle on a group's voice connection
///
/// Not `Clone`: exactly one `PlaybackState` owns it, and it is only dropped
/// once the gateway has confirmed the disconnect.
#[derive(Debug, PartialEq, Eq)]
pub struct VoiceHandle {
    id: u64,
    group_id: GroupId,
    channel_id: ChannelId,
}

impl VoiceHandle {
    pub fn new(id: u64, group_id: GroupId, channel_id: ChannelId) -> Self {
        Self {
            id,
            group_id,
            channel_id,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn group_id(&self) -> &GroupId {
        &self.group_id
    }

    pub fn channel_id(&self) -> &ChannelId {
        &self.channel_id
    }

    /// Record that the connection now lives in `channel_id`
    pub fn set_channel(&mut self, channel_id: ChannelId) {
        self.channel_id = channel_id;
    }
}

/// Handle on one started audio stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamHandle {
    id: u64,
    track: TrackRef,
}

impl StreamHandle {
    pub fn new(id: u64, track: TrackRef) -> Self {
        Self { id, track }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn track(&self) -> &TrackRef {
        &self.track
    }
}

/// Starts and stops audio streams on a voice connection
///
/// Calls are fire-and-forget: `start_stream` returns once playback has been
/// requested, not when the track finishes.
#[async_trait]
pub trait PlaybackBackend: Send + Sync {
    async fn start_stream(
        &self,
        voice: &VoiceHandle,
        track: &TrackRef,
    ) -> Result<StreamHandle, BackendError>;

    async fn stop_stream(&self, stream: &StreamHandle) -> Result<(), BackendError>;

    /// Whether the stream is still producing audio
    async fn is_active(&self, stream: &StreamHandle) -> bool;
}

/// Voice-channel connection primitives of the chat platform
#[async_trait]
pub trait VoiceGateway: Send + Sync {
    async fn join(
        &self,
        group_id: &GroupId,
        channel_id: &ChannelId,
    ) -> Result<VoiceHandle, GatewayError>;

    async fn move_to(
        &self,
        voice: &mut VoiceHandle,
        channel_id: &ChannelId,
    ) -> Result<(), GatewayError>;

    /// Leave voice; on failure the caller still owns the handle and may retry
    async fn disconnect(&self, voice: &VoiceHandle) -> Result<(), GatewayError>;
}
