//! Track identity and playback snapshot types produced by the probe.

use std::fmt;

/// The (artist, title) pair used to decide whether playback moved to a new song.
///
/// Fields are trimmed on construction; comparison is exact and case-sensitive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct TrackIdentity {
    pub artist: String,
    pub title: String,
}

impl TrackIdentity {
    pub fn new(artist: impl AsRef<str>, title: impl AsRef<str>) -> Self {
        Self {
            artist: artist.as_ref().trim().to_string(),
            title: title.as_ref().trim().to_string(),
        }
    }

    /// Space-joined search query, `"<artist> <title>"`.
    pub fn query(&self) -> String {
        format!("{} {}", self.artist, self.title)
    }
}

impl fmt::Display for TrackIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.artist, self.title)
    }
}

/// Playback status as reported by the media-control utility.
///
/// Unrecognised values are kept verbatim so they can still be displayed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PlaybackStatus {
    Playing,
    Paused,
    Stopped,
    #[default]
    Unknown,
    Other(String),
}

impl PlaybackStatus {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "Playing" => Self::Playing,
            "Paused" => Self::Paused,
            "Stopped" => Self::Stopped,
            "" => Self::Unknown,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for PlaybackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Playing => f.write_str("Playing"),
            Self::Paused => f.write_str("Paused"),
            Self::Stopped => f.write_str("Stopped"),
            Self::Unknown => Ok(()),
            Self::Other(s) => f.write_str(s),
        }
    }
}

/// One poll result. Never mutated in place, only replaced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaybackSnapshot {
    pub identity: TrackIdentity,
    pub status: PlaybackStatus,
}

impl PlaybackSnapshot {
    pub fn new(title: &str, artist: &str, status: &str) -> Self {
        Self {
            identity: TrackIdentity::new(artist, title),
            status: PlaybackStatus::parse(status),
        }
    }
}
