// state.rs: Engine state and the read-only snapshot handed to presenters

use crate::player::{PlaybackSnapshot, PlaybackStatus, TrackIdentity};
use std::fmt;
use std::sync::Arc;

/// Error taxonomy shared by the probe and the lyric providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    ProbeUnavailable,
    NoActiveSession,
    MalformedOutput,
    SearchFailed,
    PageFetchFailed,
    ParseFailed,
    NotFound,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Self::ProbeUnavailable => "can't get metadata",
            Self::NoActiveSession => "no song playing",
            Self::MalformedOutput => "unexpected metadata format",
            Self::SearchFailed => "Error fetching lyrics",
            Self::PageFetchFailed => "Error fetching lyrics page",
            Self::ParseFailed => "Error parsing lyrics",
            Self::NotFound => "No lyrics found",
        };
        f.write_str(msg)
    }
}

/// Why the lyric area shows a placeholder instead of lyrics.
///
/// A missing lyric is not a playback error, so this lives apart from
/// `last_error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LyricNotice(pub ErrorKind);

impl fmt::Display for LyricNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// State owned exclusively by the engine loop.
///
/// `fetch_in_flight` implies `fetch_track.is_some()`.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct EngineState {
    pub current_track: Option<TrackIdentity>,
    pub displayed: PlaybackSnapshot,
    pub lyrics: Option<Arc<str>>,
    pub notice: Option<LyricNotice>,
    pub fetch_in_flight: bool,
    pub fetch_track: Option<TrackIdentity>,
    pub last_error: Option<ErrorKind>,
    pub version: u64, // Incremented on any state change
}

impl EngineState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_fetch(&mut self, track: TrackIdentity) {
        self.fetch_in_flight = true;
        self.fetch_track = Some(track);
        self.lyrics = None;
        self.notice = None;
    }

    pub fn end_fetch(&mut self) {
        self.fetch_in_flight = false;
        self.fetch_track = None;
    }

    /// Read-only snapshot for one render frame.
    pub fn to_update(&self) -> Update {
        Update {
            track: self.current_track.clone(),
            status: self.displayed.status.clone(),
            lyrics: self.lyrics.clone(),
            notice: self.notice,
            fetching: self.fetch_in_flight,
            fetch_track: self.fetch_track.clone(),
            err: self.last_error,
        }
    }
}

/// Represents a UI update: everything a presenter may read.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Update {
    pub track: Option<TrackIdentity>,
    pub status: PlaybackStatus,
    pub lyrics: Option<Arc<str>>,
    pub notice: Option<LyricNotice>,
    /// A lookup is running, possibly for a track that is no longer playing.
    pub fetching: bool,
    pub fetch_track: Option<TrackIdentity>,
    pub err: Option<ErrorKind>,
}

impl Update {
    /// Whether the running lookup is for the track on screen.
    pub fn fetching_current(&self) -> bool {
        self.fetching && self.track.is_some() && self.fetch_track == self.track
    }

    /// Text for the lyric area: the lyrics, a placeholder, or nothing yet.
    pub fn lyric_text(&self) -> Option<String> {
        if self.fetching_current() {
            return Some("Fetching lyrics...".to_string());
        }
        match (&self.lyrics, self.notice) {
            (Some(l), _) => Some(l.to_string()),
            (None, Some(notice)) => Some(notice.to_string()),
            (None, None) => None,
        }
    }
}
