//! Error types for the towntune-engine crate.

use thiserror::Error;
use towntune_clock::ClockError;

use crate::model::{ChannelId, GroupId};

/// Failures reported by a [`PlaybackBackend`](crate::PlaybackBackend).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// The backend could not start the requested track
    #[error("Failed to start {track}: {reason}")]
    StartFailed { track: String, reason: String },

    /// The backend could not stop a stream
    #[error("Failed to stop stream {stream}: {reason}")]
    StopFailed { stream: u64, reason: String },
}

/// Failures reported by a [`VoiceGateway`](crate::VoiceGateway).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("Failed to join voice channel {channel_id} in group {group_id}: {reason}")]
    JoinFailed {
        group_id: GroupId,
        channel_id: ChannelId,
        reason: String,
    },

    #[error("Failed to move to voice channel {channel_id}: {reason}")]
    MoveFailed {
        channel_id: ChannelId,
        reason: String,
    },

    #[error("Failed to disconnect from group {group_id}: {reason}")]
    DisconnectFailed { group_id: GroupId, reason: String },
}

/// Errors surfaced to whoever issued a user command.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// The requester is not sitting in a voice channel
    #[error("You must be in a voice channel to use ~towntune")]
    NotInVoiceChannel,

    #[error(transparent)]
    Clock(#[from] ClockError),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

impl CommandError {
    /// Short name of the failing kind, shown in replies
    pub fn kind(&self) -> &'static str {
        match self {
            CommandError::NotInVoiceChannel => "NotInVoiceChannel",
            CommandError::Clock(ClockError::UnknownRegion(_)) => "UnknownRegion",
            CommandError::Clock(ClockError::InvalidHour(_)) => "InvalidHour",
            CommandError::Backend(BackendError::StartFailed { .. }) => "BackendStartFailure",
            CommandError::Backend(BackendError::StopFailed { .. }) => "BackendStopFailure",
            CommandError::Gateway(GatewayError::JoinFailed { .. }) => "VoiceJoinFailure",
            CommandError::Gateway(GatewayError::MoveFailed { .. }) => "VoiceMoveFailure",
            CommandError::Gateway(GatewayError::DisconnectFailed { .. }) => "VoiceDisconnectFailure",
        }
    }

    /// Message to send back to the requester
    pub fn reply(&self) -> String {
        match self {
            CommandError::NotInVoiceChannel => self.to_string(),
            _ => format!(
                "An error occurred while processing this request: ```py\n{}: {}\n```",
                self.kind(),
                self
            ),
        }
    }
}

/// Errors building or running the engine itself.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Invalid configuration provided
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The background reconciler task panicked or was aborted
    #[error("Reconciler task failed: {0}")]
    Task(String),
}

/// Convenience type alias for command results.
pub type CommandResult<T> = std::result::Result<T, CommandError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_error_display() {
        let error = BackendError::StartFailed {
            track: "audio/14.mp3".to_string(),
            reason: "file not found".to_string(),
        };
        assert_eq!(error.to_string(), "Failed to start audio/14.mp3: file not found");

        let error = BackendError::StopFailed {
            stream: 7,
            reason: "already finished".to_string(),
        };
        assert_eq!(error.to_string(), "Failed to stop stream 7: already finished");
    }

    #[test]
    fn test_gateway_error_display() {
        let error = GatewayError::JoinFailed {
            group_id: GroupId::new("g1"),
            channel_id: ChannelId::new("lobby"),
            reason: "missing permission".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Failed to join voice channel lobby in group g1: missing permission"
        );
    }

    #[test]
    fn test_not_in_voice_channel_reply() {
        assert_eq!(
            CommandError::NotInVoiceChannel.reply(),
            "You must be in a voice channel to use ~towntune"
        );
    }

    #[test]
    fn test_formatted_reply() {
        let error: CommandError = ClockError::UnknownRegion("atlantis".to_string()).into();
        assert_eq!(
            error.reply(),
            "An error occurred while processing this request: ```py\nUnknownRegion: Unknown region: atlantis\n```"
        );

        let error: CommandError = BackendError::StartFailed {
            track: "audio/3.mp3".to_string(),
            reason: "decoder crashed".to_string(),
        }
        .into();
        assert!(error.reply().contains("BackendStartFailure: Failed to start audio/3.mp3"));
    }

    #[test]
    fn test_engine_error_display() {
        let error = EngineError::Configuration("tick interval must be greater than 0".to_string());
        assert_eq!(
            error.to_string(),
            "Configuration error: tick interval must be greater than 0"
        );
    }
}
