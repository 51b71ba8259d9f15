//! Candidate resolution against the source catalog.
//!
//! One candidate in, at most one confirmed hit out. The resolver queries the
//! source provider with `"{title} {artist}"`, walks the results in the order
//! the provider ranked them, and stops at the first one the matcher accepts.
//! There is no re-ranking and no best-of-N selection; provider order is
//! trusted.
//!
//! "No match" is an expected outcome, not an error - recommendation feeds
//! regularly suggest tracks the catalog simply does not carry.

use crate::config::Pacing;
use crate::matching;
use crate::providers::AudioSourceApi;
use crate::providers::domain::{Candidate, ProviderError, TrackHit};

/// Outcome of one resolution attempt.
#[derive(Debug, Clone)]
pub enum Resolution {
    /// The first search result the matcher accepted, in provider order
    Matched(TrackHit),
    /// The provider returned results, but none matched (or none at all)
    NoMatch,
}

/// Resolve one candidate against the source catalog.
///
/// The per-result pacing delay runs before every match evaluation; the
/// caller is responsible for pacing between successive `resolve` calls.
pub async fn resolve(
    candidate: &Candidate,
    source: &dyn AudioSourceApi,
    pacing: &Pacing,
) -> Result<Resolution, ProviderError> {
    let query = format!("{} {}", candidate.title, candidate.artist);
    let hits = source.search_track(&query).await?;

    for hit in hits {
        tokio::time::sleep(pacing.result()).await;

        tracing::debug!(
            candidate_title = %candidate.title,
            candidate_artist = %candidate.artist,
            hit_title = %hit.title,
            hit_artist = %hit.artist.name,
            featured = ?hit.artists.iter().map(|a| a.name.as_str()).collect::<Vec<_>>(),
            "checking search result"
        );

        if matching::matches(candidate, &hit) {
            tracing::info!(
                title = %hit.title,
                artist = %hit.artist.name,
                "matched candidate"
            );
            return Ok(Resolution::Matched(hit));
        }
    }

    Ok(Resolution::NoMatch)
}
