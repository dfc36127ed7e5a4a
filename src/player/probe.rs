//! Playback probing through the `playerctl` command-line utility.

use crate::player::metadata::PlaybackSnapshot;
use crate::state::ErrorKind;
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Format handed to `playerctl metadata --format`.
pub const METADATA_FORMAT: &str = "{{title}}|{{artist}}|{{status}}";

/// Errors that can occur while sampling playback state.
#[derive(thiserror::Error, Debug)]
pub enum ProbeError {
    #[error("can't get metadata: {0}")]
    Unavailable(String),
    #[error("media-control utility did not answer within {0:?}")]
    Timeout(Duration),
    #[error("no song playing")]
    NoActiveSession,
    #[error("unexpected metadata format: {0:?}")]
    MalformedOutput(String),
}

impl ProbeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Unavailable(_) | Self::Timeout(_) => ErrorKind::ProbeUnavailable,
            Self::NoActiveSession => ErrorKind::NoActiveSession,
            Self::MalformedOutput(_) => ErrorKind::MalformedOutput,
        }
    }
}

/// Source of playback snapshots. Implementations must bound their own wait.
#[async_trait]
pub trait PlaybackProbe: Send + Sync + 'static {
    async fn probe(&self) -> Result<PlaybackSnapshot, ProbeError>;
}

/// Probe backed by `playerctl metadata`.
#[derive(Debug, Clone)]
pub struct PlayerctlProbe {
    program: String,
    program_args: Vec<String>,
    player: Option<String>,
    timeout: Duration,
}

impl PlayerctlProbe {
    pub fn new(player: Option<String>, timeout: Duration) -> Self {
        Self::with_program("playerctl", Vec::new(), player, timeout)
    }

    /// Run `program` with `program_args` ahead of the usual playerctl
    /// arguments, for wrappers such as `flatpak run` or `sh -c`.
    pub fn with_program(
        program: impl Into<String>,
        program_args: Vec<String>,
        player: Option<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            program: program.into(),
            program_args,
            player,
            timeout,
        }
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.program_args);
        if let Some(player) = &self.player {
            cmd.args(["-p", player]);
        }
        cmd.args(["metadata", "--format", METADATA_FORMAT])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl PlaybackProbe for PlayerctlProbe {
    async fn probe(&self) -> Result<PlaybackSnapshot, ProbeError> {
        let output = tokio::time::timeout(self.timeout, self.command().output())
            .await
            .map_err(|_| ProbeError::Timeout(self.timeout))?
            .map_err(|e| ProbeError::Unavailable(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            // playerctl exits non-zero when nothing is running
            if stderr.contains("No players found") {
                return Err(ProbeError::NoActiveSession);
            }
            return Err(ProbeError::Unavailable(format!(
                "{} exited with {}",
                self.program, output.status
            )));
        }

        parse_metadata_output(&String::from_utf8_lossy(&output.stdout))
    }
}

/// Parse `title|artist|status` into a snapshot.
pub fn parse_metadata_output(raw: &str) -> Result<PlaybackSnapshot, ProbeError> {
    let output = raw.trim();
    if output.is_empty() {
        return Err(ProbeError::NoActiveSession);
    }
    let parts: Vec<&str> = output.split('|').collect();
    let [title, artist, status] = parts.as_slice() else {
        return Err(ProbeError::MalformedOutput(output.to_string()));
    };
    Ok(PlaybackSnapshot::new(title, artist, status))
}
