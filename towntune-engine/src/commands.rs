//! User-facing commands: summon, stop, and the test-hour override
//!
//! These are the only entry points besides the reconciler that touch the
//! registry. They lock the same per-group entry the reconciler uses, so a
//! command and a tick on one group never interleave.

use std::fmt;
use std::sync::Arc;

use towntune_clock::{Hour, HourSchedule, Region};

use crate::backend::{PlaybackBackend, VoiceGateway};
use crate::error::{CommandError, CommandResult};
use crate::model::{ChannelId, GroupId, PlaybackStatus, TrackLibrary, TrackRef};
use crate::reconciler::play_hour;
use crate::registry::GroupRegistry;

/// What a successful summon did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummonOutcome {
    pub group_id: GroupId,
    pub channel_id: ChannelId,
    pub hour: Hour,
    pub track: TrackRef,
    /// `false` when an existing connection was moved instead
    pub newly_connected: bool,
}

impl fmt::Display for SummonOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Now playing the {} tune.", self.hour.twelve_hour_label())
    }
}

/// What a stop did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    Stopped,
    /// The group had no voice connection; nothing to do
    NotSummoned,
}

impl fmt::Display for StopOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopOutcome::Stopped => f.write_str("Stopped playing. Goodbye!"),
            StopOutcome::NotSummoned => f.write_str("I'm not in a voice channel."),
        }
    }
}

/// Handlers behind the chat commands
#[derive(Clone)]
pub struct CommandSurface {
    registry: GroupRegistry,
    schedule: Arc<HourSchedule>,
    backend: Arc<dyn PlaybackBackend>,
    gateway: Arc<dyn VoiceGateway>,
    tracks: TrackLibrary,
}

impl CommandSurface {
    pub fn new(
        registry: GroupRegistry,
        schedule: Arc<HourSchedule>,
        backend: Arc<dyn PlaybackBackend>,
        gateway: Arc<dyn VoiceGateway>,
        tracks: TrackLibrary,
    ) -> Self {
        Self {
            registry,
            schedule,
            backend,
            gateway,
            tracks,
        }
    }

    /// Join (or move to) the requester's voice channel and play the current hour
    ///
    /// `channel_id` is the requester's current voice channel, `None` if they
    /// are not in one. Playback starts immediately instead of waiting for the
    /// next tick.
    pub async fn summon(
        &self,
        group_id: &GroupId,
        region: &str,
        channel_id: Option<&ChannelId>,
    ) -> CommandResult<SummonOutcome> {
        let channel_id = channel_id.ok_or(CommandError::NotInVoiceChannel)?;
        let region: Region = region.parse()?;

        loop {
            let shared = self.registry.get_or_create(group_id, region);
            let mut state = shared.lock().await;
            if state.is_released() {
                // Lost a race with stop; the registry no longer holds this entry.
                continue;
            }
            state.set_region(region);

            let newly_connected = if let Some(voice) = state.voice_mut() {
                self.gateway.move_to(voice, channel_id).await?;
                false
            } else {
                match self.gateway.join(group_id, channel_id).await {
                    Ok(voice) => {
                        state.attach_voice(voice);
                        true
                    }
                    Err(e) => {
                        // Never connected: only summoned groups stay registered.
                        state.mark_released();
                        self.registry.remove_entry(group_id, &shared);
                        return Err(e.into());
                    }
                }
            };

            let hour = self.schedule.desired_hour(region);
            let track = play_hour(self.backend.as_ref(), &self.tracks, &mut state, hour).await?;

            tracing::info!(
                "Summoned to {} in group {} ({}), playing hour {}",
                channel_id,
                group_id,
                region,
                hour
            );

            return Ok(SummonOutcome {
                group_id: group_id.clone(),
                channel_id: channel_id.clone(),
                hour,
                track,
                newly_connected,
            });
        }
    }

    /// Stop playback, leave voice, and forget the group entirely
    ///
    /// The group is only forgotten once the gateway confirms the disconnect.
    /// If that fails the error is returned, the group keeps its connection
    /// handle, and `stop` can be retried.
    pub async fn stop(&self, group_id: &GroupId) -> CommandResult<StopOutcome> {
        let Some(shared) = self.registry.get(group_id) else {
            tracing::debug!("Stop for unknown group {}", group_id);
            return Ok(StopOutcome::NotSummoned);
        };

        let mut state = shared.lock().await;
        if state.is_released() {
            // A concurrent stop finished first.
            return Ok(StopOutcome::NotSummoned);
        }

        if let Some(stream) = state.take_stream() {
            if let Err(e) = self.backend.stop_stream(&stream).await {
                tracing::warn!("Failed to stop stream for group {}: {}", group_id, e);
            }
        }

        let outcome = match state.voice() {
            Some(voice) => {
                self.gateway.disconnect(voice).await?;
                StopOutcome::Stopped
            }
            None => StopOutcome::NotSummoned,
        };

        state.take_voice();
        state.mark_released();
        self.registry.remove_entry(group_id, &shared);

        if outcome == StopOutcome::Stopped {
            tracing::info!("Stopped and disconnected group {}", group_id);
        }
        Ok(outcome)
    }

    /// Pin every group to `hour`, or return to real time with `None`
    pub fn set_test_hour(&self, hour: Option<i64>) -> CommandResult<Option<Hour>> {
        let hour = hour.map(Hour::new).transpose()?;
        self.schedule.set_override(hour);
        Ok(hour)
    }

    /// Current playback status of a group, if registered
    pub async fn status(&self, group_id: &GroupId) -> Option<PlaybackStatus> {
        let shared = self.registry.get(group_id)?;
        let state = shared.lock().await;
        Some(state.status())
    }
}

impl fmt::Debug for CommandSurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandSurface")
            .field("registry", &self.registry)
            .field("tracks", &self.tracks)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryBackend, MemoryGateway};
    use chrono::{TimeZone, Utc};
    use towntune_clock::{ClockError, FixedClock};

    struct Fixture {
        commands: CommandSurface,
        registry: GroupRegistry,
        backend: Arc<MemoryBackend>,
        gateway: Arc<MemoryGateway>,
    }

    fn fixture() -> Fixture {
        // 19:00 UTC in January is 14:00 in us-east
        let clock = Arc::new(FixedClock::new(Utc.with_ymd_and_hms(2024, 1, 15, 19, 0, 0).unwrap()));
        let registry = GroupRegistry::new();
        let backend = Arc::new(MemoryBackend::new());
        let gateway = Arc::new(MemoryGateway::new());
        let commands = CommandSurface::new(
            registry.clone(),
            Arc::new(HourSchedule::new(clock)),
            backend.clone(),
            gateway.clone(),
            TrackLibrary::default(),
        );
        Fixture {
            commands,
            registry,
            backend,
            gateway,
        }
    }

    #[tokio::test]
    async fn test_summon_requires_voice_channel() {
        let f = fixture();
        let result = f.commands.summon(&GroupId::new("g1"), "us-east", None).await;
        assert_eq!(result, Err(CommandError::NotInVoiceChannel));
        assert!(f.registry.is_empty());
    }

    #[tokio::test]
    async fn test_summon_rejects_unknown_region() {
        let f = fixture();
        let result = f
            .commands
            .summon(&GroupId::new("g1"), "atlantis", Some(&ChannelId::new("lobby")))
            .await;
        assert_eq!(
            result,
            Err(CommandError::Clock(ClockError::UnknownRegion("atlantis".to_string())))
        );
    }

    #[tokio::test]
    async fn test_resummon_moves_and_restarts() {
        let f = fixture();
        let group = GroupId::new("g1");

        let first = f
            .commands
            .summon(&group, "us-east", Some(&ChannelId::new("lobby")))
            .await
            .unwrap();
        assert!(first.newly_connected);
        assert_eq!(first.to_string(), "Now playing the 2PM tune.");

        let second = f
            .commands
            .summon(&group, "us-east", Some(&ChannelId::new("music")))
            .await
            .unwrap();
        assert!(!second.newly_connected);
        assert_eq!(f.gateway.connection_count(), 1);
        assert_eq!(f.gateway.connections_for(&group), vec![ChannelId::new("music")]);

        // the first stream was stopped before the second started
        assert_eq!(f.backend.starts_for(&group).len(), 2);
        assert_eq!(f.backend.active_tracks(&group).len(), 1);
    }

    #[tokio::test]
    async fn test_stop_unknown_group_is_noop() {
        let f = fixture();
        let outcome = f.commands.stop(&GroupId::new("nobody")).await.unwrap();
        assert_eq!(outcome, StopOutcome::NotSummoned);
    }

    #[tokio::test]
    async fn test_stop_disconnects_even_when_stream_stop_fails() {
        let f = fixture();
        let group = GroupId::new("g1");
        f.commands
            .summon(&group, "us-east", Some(&ChannelId::new("lobby")))
            .await
            .unwrap();

        f.backend.set_fail_stops(true);
        let outcome = f.commands.stop(&group).await.unwrap();
        assert_eq!(outcome, StopOutcome::Stopped);
        assert_eq!(f.gateway.connection_count(), 0);
        assert!(!f.registry.contains(&group));
    }

    #[tokio::test]
    async fn test_failed_join_surfaces_error() {
        let f = fixture();
        f.gateway.set_fail_joins(true);
        let err = f
            .commands
            .summon(&GroupId::new("g1"), "us-east", Some(&ChannelId::new("lobby")))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "VoiceJoinFailure");
        assert!(err.reply().starts_with("An error occurred while processing this request"));
    }

    #[tokio::test]
    async fn test_failed_join_leaves_nothing_registered() {
        let f = fixture();
        let group = GroupId::new("g1");
        f.gateway.set_fail_joins(true);
        assert!(f
            .commands
            .summon(&group, "us-east", Some(&ChannelId::new("lobby")))
            .await
            .is_err());
        assert!(f.registry.is_empty());
        assert_eq!(f.commands.stop(&group).await.unwrap(), StopOutcome::NotSummoned);

        // a later summon starts from a fresh entry
        f.gateway.set_fail_joins(false);
        let outcome = f
            .commands
            .summon(&group, "us-east", Some(&ChannelId::new("lobby")))
            .await
            .unwrap();
        assert!(outcome.newly_connected);
        assert_eq!(f.registry.len(), 1);
        assert_eq!(f.gateway.connection_count(), 1);
    }

    #[tokio::test]
    async fn test_failed_disconnect_keeps_group_for_retry() {
        let f = fixture();
        let group = GroupId::new("g1");
        f.commands
            .summon(&group, "us-east", Some(&ChannelId::new("lobby")))
            .await
            .unwrap();

        f.gateway.set_fail_disconnects(true);
        let err = f.commands.stop(&group).await.unwrap_err();
        assert_eq!(err.kind(), "VoiceDisconnectFailure");
        assert!(f.registry.contains(&group));
        assert_eq!(f.gateway.connection_count(), 1);

        f.gateway.set_fail_disconnects(false);
        assert_eq!(f.commands.stop(&group).await.unwrap(), StopOutcome::Stopped);
        assert!(f.registry.is_empty());
        assert_eq!(f.gateway.connection_count(), 0);
    }

    #[test]
    fn test_set_test_hour_validates() {
        let f = fixture();
        assert_eq!(f.commands.set_test_hour(Some(9)).unwrap(), Some(Hour::new(9).unwrap()));
        assert_eq!(f.commands.set_test_hour(None).unwrap(), None);
        assert_eq!(
            f.commands.set_test_hour(Some(24)),
            Err(CommandError::Clock(ClockError::InvalidHour(24)))
        );
    }
}
