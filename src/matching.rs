//! Candidate-to-search-result matching.
//!
//! Recommendation feeds and source catalogs disagree on punctuation and on
//! version suffixes like "(Remastered)", so titles are normalized and then
//! compared by bidirectional containment rather than equality. The same
//! normalization rule is used for filesystem path components so that
//! matching and path sanitization never drift apart.

use crate::providers::domain::{Candidate, TrackHit};

/// Strip every character that is not alphanumeric or one of `. _ - ` (space
/// included). Case is preserved; callers case-fold separately.
pub fn normalize(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, '.' | '_' | '-' | ' '))
        .collect()
}

/// Decide whether a search result is the track a candidate refers to.
///
/// Title: normalized, case-folded, and accepted if either title contains the
/// other. Artist: the candidate's artist string must contain or be contained
/// in the result's primary-artist name, or case-fold-equal one of the
/// featured-artist names.
///
/// A candidate artist credited as "A, B" is compared as a single opaque
/// string, so it will not match a result whose primary artist is only "A"
/// and whose featured list holds "B" separately. Pinned by
/// `collaborator_string_is_opaque` below; do not change without revisiting
/// run reproducibility.
pub fn matches(candidate: &Candidate, hit: &TrackHit) -> bool {
    let hit_title = normalize(&hit.title).to_lowercase();
    let want_title = normalize(&candidate.title).to_lowercase();

    let title_overlap = hit_title.contains(&want_title) || want_title.contains(&hit_title);
    if !title_overlap {
        return false;
    }

    let want_artist = candidate.artist.to_lowercase();
    let primary = hit.artist.name.to_lowercase();

    primary.contains(&want_artist)
        || want_artist.contains(&primary)
        || hit
            .artists
            .iter()
            .any(|a| a.name.to_lowercase() == want_artist)
}
