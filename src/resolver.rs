use async_trait::async_trait;

use crate::track::Track;

/// Why a free-text query could not be turned into a playable track.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("Nothing found by your query.")]
    NothingFound,
    #[error("The result did not include a streamable URL.")]
    NoPlayableSource,
    #[error("Resolver backend error: {0}")]
    Backend(String),
}

/// Adapter over the media-resolution backend (search engine, extractor).
///
/// Resolution is a blocking, possibly slow network operation and is invoked
/// by the command layer before touching the orchestrator, so one slow
/// resolve never blocks a room's queue or other rooms.
#[async_trait]
pub trait TrackResolver: Send + Sync {
    /// Resolve a free-text query into a single playable track.
    async fn resolve(&self, query: &str, requested_by: &str) -> Result<Track, ResolveError>;
}
