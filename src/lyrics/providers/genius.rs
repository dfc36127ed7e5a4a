use async_trait::async_trait;
use reqwest::{Client, Url};
use std::time::Duration;

use crate::lyrics::parse::{div_blocks_with_class_prefix, first_link_with_class_prefix, html_to_text};
use crate::lyrics::providers::LyricProvider;
use crate::lyrics::types::{LyricResult, LyricsError, Stage, build_client};
use crate::player::TrackIdentity;

pub const GENIUS_BASE_URL: &str = "https://genius.com";

const SEARCH_RESULT_CLASS: &str = "SearchResultSong";
const LYRICS_CONTAINER_CLASS: &str = "Lyrics__Container";

/// Scrapes lyrics from a Genius-style site: one search page, then the first
/// song result.
#[derive(Debug, Clone)]
pub struct GeniusProvider {
    client: Client,
    base_url: Url,
}

impl GeniusProvider {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, LyricsError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| LyricsError::ParseFailed(Stage::Search, format!("invalid base URL {base_url:?}: {e}")))?;
        let client = build_client(timeout).map_err(LyricsError::SearchFailed)?;
        Ok(Self { client, base_url })
    }

    fn search_url(&self, query: &TrackIdentity) -> Result<Url, LyricsError> {
        let raw = format!(
            "{}/search?q={}",
            self.base_url.as_str().trim_end_matches('/'),
            urlencoding::encode(&query.query())
        );
        Url::parse(&raw).map_err(|e| LyricsError::ParseFailed(Stage::Search, e.to_string()))
    }

    /// Resolve a result link the way a browser would from the search page.
    fn resolve_link(search_url: &Url, href: &str) -> Result<Url, LyricsError> {
        search_url
            .join(href)
            .map_err(|e| LyricsError::ParseFailed(Stage::Search, format!("bad result link {href:?}: {e}")))
    }

    async fn get_html(&self, url: &Url, stage: Stage) -> Result<String, LyricsError> {
        let transport = |e: reqwest::Error| match stage {
            Stage::Search => LyricsError::SearchFailed(e),
            Stage::Page => LyricsError::PageFetchFailed(e),
        };
        let resp = self.client.get(url.clone()).send().await.map_err(transport)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(LyricsError::Http { stage, status });
        }
        let body = resp.text().await.map_err(transport)?;
        if !body.contains('<') {
            return Err(LyricsError::ParseFailed(stage, "response is not HTML".into()));
        }
        Ok(body)
    }

    async fn try_fetch(&self, query: &TrackIdentity) -> Result<Option<String>, LyricsError> {
        let search_url = self.search_url(query)?;
        tracing::debug!(url = %search_url, "searching lyrics");
        let search_html = self.get_html(&search_url, Stage::Search).await?;

        let Some(href) = parse_search_results(&search_html) else {
            tracing::debug!(track = %query, "no search result");
            return Ok(None);
        };
        let page_url = Self::resolve_link(&search_url, &href)?;
        tracing::debug!(url = %page_url, "fetching lyrics page");
        let page_html = self.get_html(&page_url, Stage::Page).await?;

        Ok(extract_lyrics(&page_html))
    }
}

#[async_trait]
impl LyricProvider for GeniusProvider {
    async fn fetch(&self, query: &TrackIdentity) -> LyricResult {
        match self.try_fetch(query).await {
            Ok(Some(text)) => LyricResult::Text(text),
            Ok(None) => LyricResult::NotFound,
            Err(e) => {
                tracing::warn!(track = %query, stage = %e.stage(), error = %e, "lyrics lookup failed");
                LyricResult::FetchError(e)
            }
        }
    }
}

/// Link of the first song result on a search page.
pub fn parse_search_results(html: &str) -> Option<String> {
    first_link_with_class_prefix(html, SEARCH_RESULT_CLASS)
}

/// Text of every lyric container in document order, each followed by a
/// newline. `None` when the page has no lyric containers.
pub fn extract_lyrics(html: &str) -> Option<String> {
    let blocks = div_blocks_with_class_prefix(html, LYRICS_CONTAINER_CLASS);
    let mut lyrics = String::new();
    for block in blocks {
        lyrics.push_str(&html_to_text(block));
        lyrics.push('\n');
    }
    if lyrics.trim().is_empty() { None } else { Some(lyrics) }
}
