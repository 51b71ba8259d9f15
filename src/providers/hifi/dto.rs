//! Tidal-mirror API Data Transfer Objects
//!
//! These types match EXACTLY what the mirror API returns.
//! DO NOT add fields that aren't in the API response.
//! DO NOT use these types outside the hifi module - convert to domain types.
//!
//! Every endpoint wraps its result in a `data` envelope. The track endpoint
//! additionally hides codec and stream URL inside a base64-encoded JSON
//! manifest blob.

use serde::{Deserialize, Serialize};

/// Search response: `{"data": {"items": [...]}}`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchResponse {
    pub data: SearchData,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchData {
    #[serde(default)]
    pub items: Vec<TrackItem>,
}

/// One track in a search result
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackItem {
    pub id: u64,
    pub title: String,
    pub duration: Option<u64>,
    pub replay_gain: Option<f64>,
    pub track_number: Option<u32>,
    pub volume_number: Option<u32>,
    pub popularity: Option<u32>,
    pub copyright: Option<String>,
    pub url: Option<String>,
    pub isrc: Option<String>,
    #[serde(default)]
    pub explicit: bool,
    pub audio_quality: Option<String>,
    pub artist: ArtistItem,
    #[serde(default)]
    pub artists: Vec<ArtistItem>,
    pub album: AlbumStub,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ArtistItem {
    pub id: u64,
    pub name: String,
    pub picture: Option<String>,
}

/// Compact album reference inside a track item
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AlbumStub {
    pub id: u64,
    pub title: String,
    pub cover: Option<String>,
}

/// Album endpoint response: `{"data": {...}}`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AlbumResponse {
    pub data: AlbumItem,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlbumItem {
    pub id: u64,
    pub title: String,
    pub duration: Option<u64>,
    pub cover: Option<String>,
    pub release_date: Option<String>,
    pub number_of_tracks: Option<u32>,
    pub number_of_volumes: Option<u32>,
    pub popularity: Option<u32>,
    pub copyright: Option<String>,
    pub url: Option<String>,
    pub upc: Option<String>,
    #[serde(default)]
    pub explicit: bool,
    pub audio_quality: Option<String>,
    pub artist: ArtistItem,
    #[serde(default)]
    pub artists: Vec<ArtistItem>,
}

/// Track endpoint response: `{"data": {...}}`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TrackResponse {
    pub data: TrackInfo,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackInfo {
    pub track_id: u64,
    pub track_replay_gain: Option<f64>,
    pub album_replay_gain: Option<f64>,
    pub bit_depth: Option<u32>,
    pub sample_rate: Option<u32>,
    /// Base64-encoded JSON; decodes to [`ManifestBlob`]
    pub manifest: String,
}

/// Decoded content of the manifest blob
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ManifestBlob {
    /// Codec string used as the file extension ("flac", "mp4a.40.2", ...)
    pub codecs: String,
    #[serde(default)]
    pub urls: Vec<String>,
}

// ============================================================================
// CONTRACT TESTS
// These verify our DTOs match what the real API returns.
// If these fail, the API has changed and we need to update our DTOs.
// ============================================================================
