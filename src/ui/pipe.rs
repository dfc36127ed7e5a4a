use crate::player::TrackIdentity;
use crate::pool::EngineHandle;
use crate::state::{ErrorKind, Update};

/// Line-oriented output state: what has already been printed.
#[derive(Debug, Default)]
struct PipeState {
    last_track: Option<TrackIdentity>,
    last_err: Option<ErrorKind>,
    printed_lyrics: bool,
}

impl PipeState {
    /// Lines to print for `upd`, in order.
    fn lines_for(&mut self, upd: &Update) -> Vec<String> {
        let mut out = Vec::new();

        if upd.err != self.last_err {
            if let Some(err) = upd.err {
                out.push(format!("Error: {err}"));
            }
            self.last_err = upd.err;
        }

        if upd.track != self.last_track {
            if let Some(track) = &upd.track {
                if self.last_track.is_some() {
                    out.push(String::new());
                }
                out.push(track.to_string());
            }
            self.last_track = upd.track.clone();
            self.printed_lyrics = false;
        }

        if upd.fetching {
            // a manual refresh prints the lyrics again once they arrive
            self.printed_lyrics = false;
        } else if !self.printed_lyrics
            && let Some(text) = upd.lyric_text()
        {
            out.push(text.trim_end().to_string());
            self.printed_lyrics = true;
        }
        out
    }
}

/// Display track changes and lyrics on stdout, for scripting.
pub async fn display_lyrics_pipe(mut handle: EngineHandle) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut state = PipeState::default();
    loop {
        tokio::select! {
            upd = handle.next_update() => {
                let Some(upd) = upd else { break };
                for line in state.lines_for(&upd) {
                    println!("{line}");
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }
    handle.shutdown().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::LyricNotice;

    fn upd(track: Option<(&str, &str)>) -> Update {
        Update {
            track: track.map(|(a, t)| TrackIdentity::new(a, t)),
            ..Default::default()
        }
    }

    #[test]
    fn prints_track_then_lyrics_once() {
        let mut state = PipeState::default();
        let mut u = upd(Some(("Artist X", "Song A")));
        u.fetching = true;
        assert_eq!(state.lines_for(&u), vec!["Artist X - Song A"]);

        u.fetching = false;
        u.lyrics = Some("line one\n[Chorus]\n".into());
        assert_eq!(state.lines_for(&u), vec!["line one\n[Chorus]"]);
        assert!(state.lines_for(&u).is_empty());
    }

    #[test]
    fn placeholder_and_errors_are_printed() {
        let mut state = PipeState::default();
        let mut u = upd(Some(("Artist X", "Song A")));
        u.notice = Some(LyricNotice(ErrorKind::NotFound));
        assert_eq!(state.lines_for(&u), vec!["Artist X - Song A", "No lyrics found"]);

        u.err = Some(ErrorKind::ProbeUnavailable);
        assert_eq!(state.lines_for(&u), vec!["Error: can't get metadata"]);
        // unchanged error is not repeated
        assert!(state.lines_for(&u).is_empty());
    }

    #[test]
    fn track_change_separates_with_blank_line() {
        let mut state = PipeState::default();
        state.lines_for(&upd(Some(("Artist X", "Song A"))));
        let lines = state.lines_for(&upd(Some(("Artist Y", "Song B"))));
        assert_eq!(lines, vec!["", "Artist Y - Song B"]);
    }
}
