use crate::state::ErrorKind;
use reqwest::Client;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) lyricsctl/0.1";

/// Which network stage of a lyric lookup failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Search,
    Page,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Search => f.write_str("search"),
            Stage::Page => f.write_str("lyrics page"),
        }
    }
}

#[derive(Error, Debug)]
pub enum LyricsError {
    #[error("Error fetching lyrics: {0}")]
    SearchFailed(#[source] reqwest::Error),
    #[error("Error fetching lyrics page: {0}")]
    PageFetchFailed(#[source] reqwest::Error),
    #[error("{stage} request returned HTTP {status}")]
    Http {
        stage: Stage,
        status: reqwest::StatusCode,
    },
    #[error("Error parsing {0}: {1}")]
    ParseFailed(Stage, String),
}

impl LyricsError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::SearchFailed(_) => ErrorKind::SearchFailed,
            Self::PageFetchFailed(_) => ErrorKind::PageFetchFailed,
            Self::Http { stage: Stage::Search, .. } => ErrorKind::SearchFailed,
            Self::Http { stage: Stage::Page, .. } => ErrorKind::PageFetchFailed,
            Self::ParseFailed(..) => ErrorKind::ParseFailed,
        }
    }

    pub fn stage(&self) -> Stage {
        match self {
            Self::SearchFailed(_) => Stage::Search,
            Self::PageFetchFailed(_) => Stage::Page,
            Self::Http { stage, .. } | Self::ParseFailed(stage, _) => *stage,
        }
    }
}

/// Outcome of one fetch attempt.
#[derive(Debug)]
pub enum LyricResult {
    Text(String),
    NotFound,
    FetchError(LyricsError),
}

impl LyricResult {
    /// Apply `f` to the text variant, leaving failures untouched.
    pub fn map_text(self, f: impl FnOnce(String) -> String) -> Self {
        match self {
            Self::Text(t) => Self::Text(f(t)),
            other => other,
        }
    }
}

/// HTTP client shared by every stage of a provider.
pub(crate) fn build_client(timeout: Duration) -> reqwest::Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
}
