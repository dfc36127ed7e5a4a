mod event;
mod lyrics;
mod player;
mod pool;
mod state;
mod ui;

use crate::lyrics::GeniusProvider;
use crate::lyrics::providers::genius::GENIUS_BASE_URL;
use crate::player::PlayerctlProbe;
use crate::ui::styles::DashboardStyles;
use clap::Parser;
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Application configuration from CLI
#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Show the playing track and its lyrics")]
pub struct Config {
    /// Set the desired color (name, hex or 0-255 index)
    #[arg(short, long, default_value = "2")]
    pub color: String,
    /// Only follow this player (passed to `playerctl -p`).
    /// If empty, the LYRICSCTL_PLAYER env var will be used as a fallback.
    #[arg(long)]
    pub player: Option<String>,
    /// Playback poll interval in milliseconds
    #[arg(long, default_value_t = 1000)]
    pub interval_ms: u64,
    /// How long to wait for playerctl before giving up on a poll
    #[arg(long, default_value_t = 2000)]
    pub probe_timeout_ms: u64,
    /// Timeout for each lyric request, in seconds
    #[arg(long, default_value_t = 10)]
    pub http_timeout_secs: u64,
    /// Print track changes and lyrics to stdout instead of the dashboard
    #[arg(long)]
    pub pipe: bool,
    /// Enable backend logging to stderr
    #[arg(long)]
    pub debug_log: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            color: "2".to_string(),
            player: None,
            interval_ms: 1000,
            probe_timeout_ms: 2000,
            http_timeout_secs: 10,
            pipe: false,
            debug_log: false,
        }
    }
}

impl Config {
    fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms.max(1))
    }

    fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms.max(1))
    }

    fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs.max(1))
    }
}

fn player_from_env_if_empty(cli: &mut Config) {
    if cli.player.is_none()
        && let Ok(s) = std::env::var("LYRICSCTL_PLAYER")
    {
        let s = s.trim();
        if !s.is_empty() {
            cli.player = Some(s.to_string());
        }
    }
}

fn init_logging(cfg: &Config) {
    if !cfg.debug_log {
        return;
    }
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("lyricsctl=debug"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let mut cfg = Config::parse();
    player_from_env_if_empty(&mut cfg);
    init_logging(&cfg);
    tracing::info!(?cfg, "starting");

    let probe = Arc::new(PlayerctlProbe::new(cfg.player.clone(), cfg.probe_timeout()));
    let provider = Arc::new(GeniusProvider::new(GENIUS_BASE_URL, cfg.http_timeout())?);
    let handle = pool::spawn(probe, provider, cfg.poll_interval());

    let result = if cfg.pipe {
        ui::pipe::display_lyrics_pipe(handle).await
    } else {
        let styles = DashboardStyles::from_config(&cfg.color);
        ui::modern::display_dashboard(handle, styles, cfg.player.clone()).await
    };

    // Print error if any, for better diagnostics
    if let Err(e) = result {
        eprintln!("Error: {}", e);
        return Err(e);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_defaults_match_default_config() {
        let parsed = Config::parse_from(["lyricsctl"]);
        let default = Config::default();
        assert_eq!(parsed.color, default.color);
        assert_eq!(parsed.interval_ms, default.interval_ms);
        assert_eq!(parsed.probe_timeout_ms, default.probe_timeout_ms);
        assert_eq!(parsed.http_timeout_secs, default.http_timeout_secs);
        assert!(!parsed.pipe);
        assert_eq!(parsed.player, None);
    }

    #[test]
    fn short_color_flag() {
        let parsed = Config::parse_from(["lyricsctl", "-c", "#ff00ff", "--player", "spotify"]);
        assert_eq!(parsed.color, "#ff00ff");
        assert_eq!(parsed.player.as_deref(), Some("spotify"));
    }

    #[test]
    fn zero_durations_are_clamped() {
        let cfg = Config {
            interval_ms: 0,
            probe_timeout_ms: 0,
            http_timeout_secs: 0,
            ..Config::default()
        };
        assert_eq!(cfg.poll_interval(), Duration::from_millis(1));
        assert_eq!(cfg.probe_timeout(), Duration::from_millis(1));
        assert_eq!(cfg.http_timeout(), Duration::from_secs(1));
    }
}
