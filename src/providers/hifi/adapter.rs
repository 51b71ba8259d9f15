//! Convert Tidal-mirror DTOs to domain types.

use base64::Engine;

use super::dto;
use crate::providers::domain::{
    AlbumInfo, AlbumRef, ArtistRef, ProviderError, TrackHit, TrackManifest,
};

fn to_artist(item: dto::ArtistItem) -> ArtistRef {
    ArtistRef {
        id: item.id,
        name: item.name,
    }
}

pub fn to_hit(item: dto::TrackItem) -> TrackHit {
    TrackHit {
        id: item.id,
        title: item.title,
        artist: to_artist(item.artist),
        artists: item.artists.into_iter().map(to_artist).collect(),
        album: AlbumRef {
            id: item.album.id,
            title: item.album.title,
            cover: item.album.cover,
        },
        duration_secs: item.duration,
        replay_gain: item.replay_gain,
        track_number: item.track_number,
        volume_number: item.volume_number,
        audio_quality: item.audio_quality,
        isrc: item.isrc,
        copyright: item.copyright,
        explicit: item.explicit,
        popularity: item.popularity,
        url: item.url,
    }
}

pub fn to_album(item: dto::AlbumItem) -> AlbumInfo {
    AlbumInfo {
        id: item.id,
        title: item.title,
        cover: item.cover,
        release_date: item.release_date,
        number_of_tracks: item.number_of_tracks,
        number_of_volumes: item.number_of_volumes,
        upc: item.upc,
        copyright: item.copyright,
        artist: to_artist(item.artist),
        artists: item.artists.into_iter().map(to_artist).collect(),
        duration_secs: item.duration,
        audio_quality: item.audio_quality,
        url: item.url,
        explicit: item.explicit,
        popularity: item.popularity,
    }
}

/// Decode the base64 manifest blob and flatten it with the track info.
///
/// The blob's first URL is the stream location; an empty URL list means the
/// provider has no playable stream for this track.
pub fn to_manifest(info: dto::TrackInfo) -> Result<TrackManifest, ProviderError> {
    let decoded = base64::engine::general_purpose::STANDARD
        .decode(&info.manifest)
        .map_err(|e| ProviderError::Parse(format!("manifest blob: {e}")))?;
    let blob: dto::ManifestBlob = serde_json::from_slice(&decoded)
        .map_err(|e| ProviderError::Parse(format!("manifest blob: {e}")))?;

    let url = blob
        .urls
        .into_iter()
        .find(|u| !u.is_empty())
        .ok_or_else(|| ProviderError::NotFound(format!("no stream URL for track {}", info.track_id)))?;

    Ok(TrackManifest {
        track_id: info.track_id,
        url,
        codec: blob.codecs,
        track_gain: info.track_replay_gain,
        album_gain: info.album_replay_gain,
        bit_depth: info.bit_depth,
        sample_rate: info.sample_rate,
    })
}
