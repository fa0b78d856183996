//! Periodic reconciliation of every summoned group
//!
//! Each tick walks a snapshot of the registry, works out the hour each group
//! should be hearing, asks the backend whether the group's stream is still
//! running, and then keeps, changes or restarts the track.
//!
//! | Observation | Action |
//! |---|---|
//! | `Idle` | nothing |
//! | `Stale` | stop the old stream, start the desired hour, record it |
//! | `Stalled` | start the same hour again |
//! | `Synced` | nothing |
//!
//! A wrong hour always wins over a stopped stream: restarting for the new
//! hour covers both.

use futures::future::join_all;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use towntune_clock::{Hour, HourSchedule};

use crate::backend::PlaybackBackend;
use crate::error::{BackendError, EngineError};
use crate::model::{GroupId, PlaybackState, SharedPlaybackState, TrackLibrary, TrackRef};
use crate::registry::GroupRegistry;

/// What a tick observes for one group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    /// Not connected to voice; skipped
    Idle,
    /// Playing the desired hour
    Synced,
    /// Last started hour differs from the desired one (or nothing played yet)
    Stale { current: Option<Hour>, desired: Hour },
    /// Right hour, but the backend says the stream has stopped
    Stalled { hour: Hour },
}

impl Observation {
    pub fn classify(summoned: bool, current: Option<Hour>, desired: Hour, playing: bool) -> Self {
        if !summoned {
            return Observation::Idle;
        }
        match current {
            Some(hour) if hour == desired => {
                if playing {
                    Observation::Synced
                } else {
                    Observation::Stalled { hour }
                }
            }
            _ => Observation::Stale { current, desired },
        }
    }
}

/// Result of reconciling one group during a tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupOutcome {
    Idle,
    Synced,
    Changed { from: Option<Hour>, to: Hour },
    Restarted { hour: Hour },
    /// Backend refused; the group is retried next tick
    Failed,
}

/// Per-tick tally of outcomes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    pub idle: usize,
    pub synced: usize,
    pub changed: usize,
    pub restarted: usize,
    pub failed: usize,
}

impl TickReport {
    fn record(&mut self, outcome: &GroupOutcome) {
        match outcome {
            GroupOutcome::Idle => self.idle += 1,
            GroupOutcome::Synced => self.synced += 1,
            GroupOutcome::Changed { .. } => self.changed += 1,
            GroupOutcome::Restarted { .. } => self.restarted += 1,
            GroupOutcome::Failed => self.failed += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.idle + self.synced + self.changed + self.restarted + self.failed
    }
}

impl fmt::Display for TickReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} groups: {} synced, {} changed, {} restarted, {} failed, {} idle",
            self.total(),
            self.synced,
            self.changed,
            self.restarted,
            self.failed,
            self.idle
        )
    }
}

/// Stop whatever the group is playing, then start `hour`
///
/// A failed stop is ignored: the old stream may simply have ended. On a failed
/// start the group is left without a stream and its recorded hour untouched.
pub(crate) async fn play_hour(
    backend: &dyn PlaybackBackend,
    tracks: &TrackLibrary,
    state: &mut PlaybackState,
    hour: Hour,
) -> Result<TrackRef, BackendError> {
    if let Some(previous) = state.take_stream() {
        if let Err(e) = backend.stop_stream(&previous).await {
            tracing::debug!("Ignoring stop failure for group {}: {}", state.group_id(), e);
        }
    }
    start_hour(backend, tracks, state, hour).await
}

async fn start_hour(
    backend: &dyn PlaybackBackend,
    tracks: &TrackLibrary,
    state: &mut PlaybackState,
    hour: Hour,
) -> Result<TrackRef, BackendError> {
    let track = tracks.track_for(hour);
    let stream = match state.voice() {
        Some(voice) => backend.start_stream(voice, &track).await?,
        None => {
            return Err(BackendError::StartFailed {
                track: track.to_string(),
                reason: "group has no voice connection".to_string(),
            })
        }
    };
    state.record_started(hour, stream);
    Ok(track)
}

/// Drives every registered group towards the track for its current hour
#[derive(Clone)]
pub struct Reconciler {
    registry: GroupRegistry,
    schedule: Arc<HourSchedule>,
    backend: Arc<dyn PlaybackBackend>,
    tracks: TrackLibrary,
    tick_interval: Duration,
}

impl Reconciler {
    pub fn new(
        registry: GroupRegistry,
        schedule: Arc<HourSchedule>,
        backend: Arc<dyn PlaybackBackend>,
        tracks: TrackLibrary,
        tick_interval: Duration,
    ) -> Self {
        Self {
            registry,
            schedule,
            backend,
            tracks,
            tick_interval,
        }
    }

    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    /// Run one pass over a snapshot of the registry
    ///
    /// Groups are reconciled concurrently; a failure in one never affects the
    /// others.
    pub async fn tick(&self) -> TickReport {
        let snapshot = self.registry.snapshot();
        let outcomes = join_all(
            snapshot
                .iter()
                .map(|(group_id, state)| self.reconcile_group(group_id, state)),
        )
        .await;

        let mut report = TickReport::default();
        for outcome in &outcomes {
            report.record(outcome);
        }
        report
    }

    /// Reconcile a single group
    ///
    /// Holds the group's lock for the whole decision, so a concurrent summon
    /// or stop on the same group waits for it (or it waits for them). A group
    /// stopped after the snapshot was taken shows up as `Idle`.
    pub async fn reconcile_group(
        &self,
        group_id: &GroupId,
        state: &SharedPlaybackState,
    ) -> GroupOutcome {
        let mut state = state.lock().await;
        let summoned = state.is_summoned();
        let desired = self.schedule.desired_hour(state.region());
        let playing = match state.stream() {
            Some(stream) if summoned => self.backend.is_active(stream).await,
            _ => false,
        };

        match Observation::classify(summoned, state.current_track_hour(), desired, playing) {
            Observation::Idle => {
                tracing::trace!("Group {} is idle, skipping", group_id);
                GroupOutcome::Idle
            }
            Observation::Synced => {
                state.record_observation(true);
                tracing::debug!("Group {} already playing hour {}", group_id, desired);
                GroupOutcome::Synced
            }
            Observation::Stale { current, desired } => {
                match play_hour(self.backend.as_ref(), &self.tracks, &mut state, desired).await {
                    Ok(track) => {
                        tracing::info!(
                            "Group {} changed from hour {:?} to {} ({})",
                            group_id,
                            current.map(|h| h.get()),
                            desired,
                            track
                        );
                        GroupOutcome::Changed {
                            from: current,
                            to: desired,
                        }
                    }
                    Err(e) => {
                        tracing::warn!("Group {} could not change to hour {}: {}", group_id, desired, e);
                        GroupOutcome::Failed
                    }
                }
            }
            Observation::Stalled { hour } => {
                // The stalled stream is finished; drop it without a stop call.
                state.record_observation(false);
                state.take_stream();
                match start_hour(self.backend.as_ref(), &self.tracks, &mut state, hour).await {
                    Ok(track) => {
                        tracing::info!("Group {} restarted hour {} ({})", group_id, hour, track);
                        GroupOutcome::Restarted { hour }
                    }
                    Err(e) => {
                        tracing::warn!("Group {} could not restart hour {}: {}", group_id, hour, e);
                        GroupOutcome::Failed
                    }
                }
            }
        }
    }

    /// Spawn the tick loop onto the current tokio runtime
    ///
    /// The first tick fires one interval after spawning. A slow pass delays
    /// the next tick rather than overlapping or skipping it. The loop runs
    /// until [`ReconcilerHandle::shutdown`] or [`ReconcilerHandle::abort`];
    /// dropping the handle detaches it and leaves it running.
    pub fn spawn(self) -> ReconcilerHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(self.run(shutdown_rx));
        ReconcilerHandle {
            shutdown: shutdown_tx,
            task,
        }
    }

    async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let period = self.tick_interval;
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!("Reconciler started (interval: {:?})", period);

        let mut handle_alive = true;
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let report = self.tick().await;
                    tracing::debug!("Tick complete: {}", report);
                }
                changed = shutdown.changed(), if handle_alive => {
                    match changed {
                        Ok(()) if *shutdown.borrow() => break,
                        Ok(()) => {}
                        Err(_) => {
                            tracing::debug!("Reconciler handle dropped, running detached");
                            handle_alive = false;
                        }
                    }
                }
            }
        }

        tracing::info!("Reconciler stopped");
    }
}

impl fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reconciler")
            .field("registry", &self.registry)
            .field("tracks", &self.tracks)
            .field("tick_interval", &self.tick_interval)
            .finish()
    }
}

/// Handle on a running tick loop
#[derive(Debug)]
pub struct ReconcilerHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl ReconcilerHandle {
    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Cancel the loop immediately, even mid-tick
    pub fn abort(&self) {
        self.task.abort();
    }

    /// Ask the loop to stop and wait for it; an in-flight tick completes first
    pub async fn shutdown(self) -> Result<(), EngineError> {
        // A send error means the loop already exited.
        let _ = self.shutdown.send(true);
        self.task
            .await
            .map_err(|e| EngineError::Task(format!("Failed to await reconciler task: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn h(hour: i64) -> Hour {
        Hour::new(hour).unwrap()
    }

    #[rstest]
    #[case(false, Some(5), 5, true, Observation::Idle)]
    #[case(false, None, 5, false, Observation::Idle)]
    #[case(true, Some(5), 5, true, Observation::Synced)]
    #[case(true, Some(5), 5, false, Observation::Stalled { hour: h(5) })]
    #[case(true, Some(5), 7, true, Observation::Stale { current: Some(h(5)), desired: h(7) })]
    #[case(true, None, 7, false, Observation::Stale { current: None, desired: h(7) })]
    fn test_classify(
        #[case] summoned: bool,
        #[case] current: Option<i64>,
        #[case] desired: i64,
        #[case] playing: bool,
        #[case] expected: Observation,
    ) {
        let current = current.map(h);
        assert_eq!(
            Observation::classify(summoned, current, h(desired), playing),
            expected
        );
    }

    #[test]
    fn test_stale_beats_stalled() {
        // hour changed and the stream stopped: treat as an hour change
        assert_eq!(
            Observation::classify(true, Some(h(5)), h(7), false),
            Observation::Stale {
                current: Some(h(5)),
                desired: h(7)
            }
        );
    }

    #[test]
    fn test_tick_report_display() {
        let mut report = TickReport::default();
        report.record(&GroupOutcome::Synced);
        report.record(&GroupOutcome::Changed { from: None, to: h(3) });
        report.record(&GroupOutcome::Failed);
        assert_eq!(report.total(), 3);
        assert_eq!(
            report.to_string(),
            "3 groups: 1 synced, 1 changed, 0 restarted, 1 failed, 0 idle"
        );
    }
}
