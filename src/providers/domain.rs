//! Internal domain models for candidates, search results, and albums.
//!
//! These types are OUR types - they don't change when provider APIs change.
//! All provider responses get converted into these types via adapters.

/// A recommended track from the metadata provider, before resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Track title as the recommendation feed spells it
    pub title: String,
    /// Artist credit as one free-text string (may name several collaborators)
    pub artist: String,
    /// Provider-side identifier, when the feed supplies one
    pub source_id: Option<String>,
}

/// An artist reference inside a search result or album.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtistRef {
    pub id: u64,
    pub name: String,
}

/// The compact album reference attached to a search result.
///
/// Replaced with a full [`AlbumInfo`] once a hit is confirmed as a match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlbumRef {
    pub id: u64,
    pub title: String,
    /// Artwork reference (provider-specific cover id)
    pub cover: Option<String>,
}

/// One track description returned by the source provider for a query.
///
/// Ephemeral: lives only for the duration of one resolution attempt.
#[derive(Debug, Clone)]
pub struct TrackHit {
    pub id: u64,
    pub title: String,
    /// Primary artist credit
    pub artist: ArtistRef,
    /// Featured / additional artist credits
    pub artists: Vec<ArtistRef>,
    pub album: AlbumRef,
    pub duration_secs: Option<u64>,
    pub replay_gain: Option<f64>,
    pub track_number: Option<u32>,
    pub volume_number: Option<u32>,
    pub audio_quality: Option<String>,
    pub isrc: Option<String>,
    pub copyright: Option<String>,
    pub explicit: bool,
    pub popularity: Option<u32>,
    pub url: Option<String>,
}

/// Full album metadata fetched after a hit is confirmed.
#[derive(Debug, Clone)]
pub struct AlbumInfo {
    pub id: u64,
    pub title: String,
    pub cover: Option<String>,
    /// Release date string as the provider reports it (YYYY-MM-DD)
    pub release_date: Option<String>,
    pub number_of_tracks: Option<u32>,
    pub number_of_volumes: Option<u32>,
    pub upc: Option<String>,
    pub copyright: Option<String>,
    pub artist: ArtistRef,
    pub artists: Vec<ArtistRef>,
    pub duration_secs: Option<u64>,
    pub audio_quality: Option<String>,
    pub url: Option<String>,
    pub explicit: bool,
    pub popularity: Option<u32>,
}

/// A search hit confirmed to match a candidate, enriched with full album
/// metadata. Owned by the builder's resolved list for one run.
#[derive(Debug, Clone)]
pub struct ResolvedTrack {
    /// The candidate this track was resolved from
    pub candidate: Candidate,
    pub hit: TrackHit,
    pub album: AlbumInfo,
}

/// Codec and stream location for one track's audio, decoded from the
/// provider's manifest blob.
#[derive(Debug, Clone)]
pub struct TrackManifest {
    pub track_id: u64,
    pub url: String,
    /// File extension for the downloaded audio ("flac", "mp3", ...)
    pub codec: String,
    pub track_gain: Option<f64>,
    pub album_gain: Option<f64>,
    pub bit_depth: Option<u32>,
    pub sample_rate: Option<u32>,
}

/// Errors surfaced by provider clients.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ProviderError {
    #[error("network error: {0}")]
    Network(String),

    #[error("API request failed: {0}")]
    Api(String),

    #[error("failed to parse response: {0}")]
    Parse(String),

    /// The provider asked us to back off. `retry_after` carries the
    /// provider's wait hint in seconds when one was given.
    #[error("rate limited by provider")]
    RateLimited { retry_after: Option<u64> },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("unsupported provider selector: {0}")]
    Unsupported(String),
}

#[cfg(test)]
impl TrackHit {
    /// Minimal hit for tests; override fields with struct-update syntax.
    pub fn stub(id: u64, title: &str) -> Self {
        Self {
            id,
            title: title.to_string(),
            artist: ArtistRef {
                id: 1,
                name: "Test Artist".to_string(),
            },
            artists: Vec::new(),
            album: AlbumRef {
                id: 100,
                title: "Test Album".to_string(),
                cover: Some("00000000-0000-0000-0000-000000000000".to_string()),
            },
            duration_secs: Some(180),
            replay_gain: None,
            track_number: Some(1),
            volume_number: Some(1),
            audio_quality: Some("LOSSLESS".to_string()),
            isrc: None,
            copyright: None,
            explicit: false,
            popularity: None,
            url: None,
        }
    }
}

#[cfg(test)]
impl AlbumInfo {
    /// Full album record matching a stub hit's album reference.
    pub fn stub_for(album: &AlbumRef) -> Self {
        Self {
            id: album.id,
            title: album.title.clone(),
            cover: album.cover.clone(),
            release_date: Some("2020-01-01".to_string()),
            number_of_tracks: Some(10),
            number_of_volumes: Some(1),
            upc: Some("123456789012".to_string()),
            copyright: None,
            artist: ArtistRef {
                id: 1,
                name: "Test Artist".to_string(),
            },
            artists: Vec::new(),
            duration_secs: Some(2400),
            audio_quality: Some("LOSSLESS".to_string()),
            url: None,
            explicit: false,
            popularity: None,
        }
    }
}
