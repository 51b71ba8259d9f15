//! Convert ListenBrainz DTOs to domain candidates.

use super::dto;
use crate::providers::domain::Candidate;

/// Flatten the JSPF payload into the candidate list, in feed order.
pub fn to_candidates(response: dto::RadioResponse) -> Vec<Candidate> {
    response
        .payload
        .jspf
        .playlist
        .track
        .into_iter()
        .map(|track| Candidate {
            title: track.title,
            artist: track.creator,
            source_id: track.identifier.into_iter().next(),
        })
        .collect()
}
