//! Engine events and the single update function that applies them.
//!
//! Every change to [`EngineState`] goes through [`SyncEngine::handle`], one
//! event at a time. Side effects are returned as [`Command`]s for the
//! runtime to carry out, so the transitions themselves stay synchronous.

use crate::lyrics::LyricResult;
use crate::player::{PlaybackSnapshot, ProbeError, TrackIdentity};
use crate::state::{EngineState, ErrorKind, LyricNotice};

#[derive(Debug)]
pub enum Event {
    /// Result of one poll of the playback probe.
    Tick(Result<PlaybackSnapshot, ProbeError>),
    /// User asked to re-fetch lyrics for the current track.
    ManualRefresh,
    /// A lyric fetch finished; `for_track` is the track it was started for.
    FetchCompleted {
        result: LyricResult,
        for_track: TrackIdentity,
    },
    Shutdown,
}

/// Work the runtime must start on behalf of the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Fetch(TrackIdentity),
}

/// Playback/lyric synchronization state machine.
#[derive(Debug, Default)]
pub struct SyncEngine {
    state: EngineState,
}

impl SyncEngine {
    pub fn new() -> Self {
        Self {
            state: EngineState::new(),
        }
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    pub fn handle(&mut self, event: Event) -> Option<Command> {
        let before = self.state.clone();
        let command = match event {
            Event::Tick(Ok(snapshot)) => self.on_snapshot(snapshot),
            Event::Tick(Err(err)) => {
                tracing::debug!(error = %err, "probe failed");
                self.state.last_error = Some(err.kind());
                None
            }
            Event::ManualRefresh => self.on_manual_refresh(),
            Event::FetchCompleted { result, for_track } => {
                self.on_fetch_completed(result, for_track);
                None
            }
            Event::Shutdown => None,
        };
        if self.state != before {
            self.state.version += 1;
        }
        command
    }

    fn on_snapshot(&mut self, snapshot: PlaybackSnapshot) -> Option<Command> {
        self.state.last_error = None;

        if self.state.current_track.as_ref() == Some(&snapshot.identity) {
            self.state.displayed.status = snapshot.status;
            return None;
        }

        let track = snapshot.identity.clone();
        self.state.current_track = Some(track.clone());
        self.state.displayed = snapshot;

        if self.state.fetch_in_flight {
            // One fetch at a time. The outstanding result will be discarded
            // as stale and this track waits for a manual refresh.
            tracing::info!(track = %track, "track changed while a fetch is in flight, not fetching");
            return None;
        }

        tracing::info!(track = %track, "track changed, fetching lyrics");
        self.state.begin_fetch(track.clone());
        Some(Command::Fetch(track))
    }

    fn on_manual_refresh(&mut self) -> Option<Command> {
        if self.state.fetch_in_flight {
            tracing::debug!("refresh ignored, fetch already in flight");
            return None;
        }
        let track = self.state.current_track.clone()?;
        tracing::info!(track = %track, "manual lyrics refresh");
        self.state.begin_fetch(track.clone());
        Some(Command::Fetch(track))
    }

    fn on_fetch_completed(&mut self, result: LyricResult, for_track: TrackIdentity) {
        if !self.state.fetch_in_flight || self.state.fetch_track.as_ref() != Some(&for_track) {
            tracing::debug!(track = %for_track, "ignoring completion with no matching fetch");
            return;
        }
        self.state.end_fetch();

        if self.state.current_track.as_ref() != Some(&for_track) {
            tracing::info!(track = %for_track, "discarding stale lyrics");
            return;
        }

        match result {
            LyricResult::Text(text) => {
                self.state.lyrics = Some(text.into());
                self.state.notice = None;
            }
            LyricResult::NotFound => {
                self.state.lyrics = None;
                self.state.notice = Some(LyricNotice(ErrorKind::NotFound));
            }
            LyricResult::FetchError(err) => {
                self.state.lyrics = None;
                self.state.notice = Some(LyricNotice(err.kind()));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lyrics::normalize;
    use crate::lyrics::types::{LyricsError, Stage};
    use crate::player::PlaybackStatus;

    fn snap(title: &str, artist: &str, status: &str) -> Event {
        Event::Tick(Ok(PlaybackSnapshot::new(title, artist, status)))
    }

    fn done(result: LyricResult, artist: &str, title: &str) -> Event {
        Event::FetchCompleted {
            result,
            for_track: TrackIdentity::new(artist, title),
        }
    }

    fn track_a() -> TrackIdentity {
        TrackIdentity::new("Artist X", "Song A")
    }

    #[test]
    fn starts_idle() {
        let engine = SyncEngine::new();
        let s = engine.state();
        assert_eq!(s.current_track, None);
        assert_eq!(s.lyrics, None);
        assert_eq!(s.last_error, None);
        assert!(!s.fetch_in_flight);
    }

    #[test]
    fn new_track_triggers_one_fetch() {
        let mut engine = SyncEngine::new();
        let cmd = engine.handle(snap("Song A", "Artist X", "Playing"));
        assert_eq!(cmd, Some(Command::Fetch(track_a())));
        if let Some(Command::Fetch(t)) = &cmd {
            assert_eq!(t.query(), "Artist X Song A");
        }
        assert!(engine.state().fetch_in_flight);
        assert_eq!(engine.state().fetch_track, Some(track_a()));

        let cmd = engine.handle(snap("Song A", "Artist X", "Playing"));
        assert_eq!(cmd, None);
    }

    #[test]
    fn same_track_after_fetch_does_not_refetch() {
        let mut engine = SyncEngine::new();
        engine.handle(snap("Song A", "Artist X", "Playing"));
        engine.handle(done(LyricResult::Text("la".into()), "Artist X", "Song A"));
        assert_eq!(engine.handle(snap("Song A", "Artist X", "Paused")), None);
        assert_eq!(engine.state().displayed.status, PlaybackStatus::Paused);
        assert_eq!(engine.state().lyrics.as_deref(), Some("la"));
    }

    #[test]
    fn chorus_lyrics_are_applied() {
        let mut engine = SyncEngine::new();
        engine.handle(snap("Song A", "Artist X", "Playing"));
        engine.handle(snap("Song A", "Artist X", "Playing"));
        let text = normalize("Intro line[Chorus]Sing it");
        engine.handle(done(LyricResult::Text(text), "Artist X", "Song A"));

        let s = engine.state();
        assert!(!s.fetch_in_flight);
        assert!(s.lyrics.as_deref().unwrap().contains("\n[Chorus]\n"));
        assert_eq!(s.notice, None);
    }

    #[test]
    fn track_change_during_fetch_is_back_pressured_and_stale_result_dropped() {
        let mut engine = SyncEngine::new();
        assert!(engine.handle(snap("Song A", "Artist X", "Playing")).is_some());

        // B arrives while A is still being fetched: no second fetch
        assert_eq!(engine.handle(snap("Song B", "Artist Y", "Playing")), None);
        assert_eq!(
            engine.state().current_track,
            Some(TrackIdentity::new("Artist Y", "Song B"))
        );
        assert!(engine.state().fetch_in_flight);

        engine.handle(done(LyricResult::Text("A words".into()), "Artist X", "Song A"));
        let s = engine.state();
        assert!(!s.fetch_in_flight);
        assert_eq!(s.fetch_track, None);
        assert_eq!(s.lyrics, None);

        // still no fetch for B on the next tick: known limitation
        assert_eq!(engine.handle(snap("Song B", "Artist Y", "Playing")), None);
        // a manual refresh picks it up
        assert_eq!(
            engine.handle(Event::ManualRefresh),
            Some(Command::Fetch(TrackIdentity::new("Artist Y", "Song B")))
        );
    }

    #[test]
    fn stale_completion_leaves_lyrics_untouched() {
        let mut engine = SyncEngine::new();
        engine.handle(snap("Song A", "Artist X", "Playing"));
        engine.handle(done(LyricResult::Text("A words".into()), "Artist X", "Song A"));

        engine.handle(Event::ManualRefresh);
        engine.state.lyrics = Some("kept".into());
        engine.handle(snap("Song B", "Artist Y", "Playing"));
        engine.handle(done(LyricResult::NotFound, "Artist X", "Song A"));
        assert_eq!(engine.state().lyrics.as_deref(), Some("kept"));
        assert_eq!(engine.state().notice, None);
    }

    #[test]
    fn fetch_in_flight_clears_once_per_fetch() {
        let mut engine = SyncEngine::new();
        engine.handle(snap("Song A", "Artist X", "Playing"));
        engine.handle(done(LyricResult::NotFound, "Artist X", "Song A"));
        assert!(!engine.state().fetch_in_flight);
        let version = engine.state().version;

        // duplicate delivery is ignored entirely
        engine.handle(done(LyricResult::Text("late".into()), "Artist X", "Song A"));
        assert_eq!(engine.state().version, version);
        assert_eq!(engine.state().lyrics, None);
    }

    #[test]
    fn not_found_and_errors_become_placeholders() {
        let mut engine = SyncEngine::new();
        engine.handle(snap("Song A", "Artist X", "Playing"));
        engine.handle(done(LyricResult::NotFound, "Artist X", "Song A"));
        assert_eq!(engine.state().notice, Some(LyricNotice(ErrorKind::NotFound)));
        assert_eq!(engine.state().last_error, None);

        engine.handle(Event::ManualRefresh);
        let err = LyricsError::ParseFailed(Stage::Page, "bad".into());
        engine.handle(done(LyricResult::FetchError(err), "Artist X", "Song A"));
        assert_eq!(engine.state().notice, Some(LyricNotice(ErrorKind::ParseFailed)));
        assert_eq!(engine.state().lyrics, None);
        assert_eq!(engine.state().last_error, None);
        assert_eq!(engine.state().current_track, Some(track_a()));
    }

    #[test]
    fn manual_refresh_requires_track_and_idle_fetch() {
        let mut engine = SyncEngine::new();
        assert_eq!(engine.handle(Event::ManualRefresh), None);

        engine.handle(snap("Song A", "Artist X", "Playing"));
        assert_eq!(engine.handle(Event::ManualRefresh), None);

        engine.handle(done(LyricResult::Text("la".into()), "Artist X", "Song A"));
        assert_eq!(engine.handle(Event::ManualRefresh), Some(Command::Fetch(track_a())));
        assert_eq!(engine.state().lyrics, None);
        assert!(engine.state().fetch_in_flight);
    }

    #[test]
    fn probe_failures_keep_track_and_lyrics_until_recovery() {
        let mut engine = SyncEngine::new();
        engine.handle(snap("Song A", "Artist X", "Playing"));
        engine.handle(done(LyricResult::Text("la".into()), "Artist X", "Song A"));

        let failures = [
            ProbeError::Unavailable("spawn failed".into()),
            ProbeError::NoActiveSession,
            ProbeError::MalformedOutput("x|y".into()),
        ];
        for err in failures {
            let kind = err.kind();
            assert_eq!(engine.handle(Event::Tick(Err(err))), None);
            assert_eq!(engine.state().last_error, Some(kind));
            assert_eq!(engine.state().current_track, Some(track_a()));
            assert_eq!(engine.state().lyrics.as_deref(), Some("la"));
        }

        assert_eq!(engine.handle(snap("Song A", "Artist X", "Playing")), None);
        assert_eq!(engine.state().last_error, None);
        assert_eq!(engine.state().lyrics.as_deref(), Some("la"));
    }

    #[test]
    fn version_only_moves_on_change() {
        let mut engine = SyncEngine::new();
        engine.handle(snap("Song A", "Artist X", "Playing"));
        let v = engine.state().version;
        engine.handle(snap("Song A", "Artist X", "Playing"));
        assert_eq!(engine.state().version, v);
        engine.handle(snap("Song A", "Artist X", "Paused"));
        assert_eq!(engine.state().version, v + 1);
        engine.handle(Event::Shutdown);
        assert_eq!(engine.state().version, v + 1);
    }
}
