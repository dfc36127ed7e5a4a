pub mod genius;

use crate::lyrics::types::LyricResult;
use crate::player::TrackIdentity;
use async_trait::async_trait;

pub use genius::GeniusProvider;

/// A source of lyrics for a track.
///
/// Implementations return raw lyric text; normalization happens in the
/// runtime so every provider yields the same display format.
#[async_trait]
pub trait LyricProvider: Send + Sync + 'static {
    async fn fetch(&self, query: &TrackIdentity) -> LyricResult;
}
