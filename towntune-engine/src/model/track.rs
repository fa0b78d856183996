//! Hour-indexed audio tracks

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

use towntune_clock::Hour;

/// Reference to the audio resource for one hour of the day
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct TrackRef {
    hour: Hour,
    path: PathBuf,
}

impl TrackRef {
    pub fn hour(&self) -> Hour {
        self.hour
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl fmt::Display for TrackRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

/// Resolves hours to files laid out as `<dir>/<hour>.<extension>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackLibrary {
    dir: PathBuf,
    extension: String,
}

impl Default for TrackLibrary {
    fn default() -> Self {
        Self::new("audio", "mp3")
    }
}

impl TrackLibrary {
    pub fn new(dir: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            extension: extension.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Track for `hour`, e.g. `audio/14.mp3`
    pub fn track_for(&self, hour: Hour) -> TrackRef {
        TrackRef {
            hour,
            path: self.dir.join(format!("{}.{}", hour.get(), self.extension)),
        }
    }

    /// Every hour whose audio file is missing on disk
    pub fn missing_tracks(&self) -> Vec<TrackRef> {
        (0..24)
            .map(Hour::wrapping)
            .map(|hour| self.track_for(hour))
            .filter(|track| !track.path.is_file())
            .collect()
    }
}
