//! Fire-and-forget playback control through `playerctl`.

use std::process::Stdio;
use tokio::process::Command;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerCommand {
    PlayPause,
    Next,
    Previous,
}

impl PlayerCommand {
    pub fn verb(self) -> &'static str {
        match self {
            Self::PlayPause => "play-pause",
            Self::Next => "next",
            Self::Previous => "previous",
        }
    }
}

/// Send `command` to the player. Failures are logged and otherwise ignored.
pub async fn send(command: PlayerCommand, player: Option<&str>) {
    let mut cmd = Command::new("playerctl");
    if let Some(player) = player {
        cmd.args(["-p", player]);
    }
    let result = cmd
        .arg(command.verb())
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await;
    match result {
        Ok(status) if status.success() => {
            tracing::debug!(verb = command.verb(), "player command sent");
        }
        Ok(status) => {
            tracing::warn!(verb = command.verb(), %status, "player command failed");
        }
        Err(e) => {
            tracing::warn!(verb = command.verb(), error = %e, "could not run playerctl");
        }
    }
}

/// Spawn [`send`] on the runtime so the caller never waits on the player.
pub fn dispatch(command: PlayerCommand, player: Option<String>) {
    tokio::spawn(async move {
        send(command, player.as_deref()).await;
    });
}
