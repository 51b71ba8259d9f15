//! Provider trait definitions and the configuration-driven factory.
//!
//! These traits enable dependency injection and mocking for tests.
//! Production code uses the real client implementations, while tests
//! substitute mock implementations.
//!
//! Blueprint files select providers by short name (`metaApi` / `audioApi`);
//! the factory maps those selectors to one implementation of the shared
//! trait instead of branching on strings at call sites.

pub mod domain;
pub mod hifi;
pub mod listenbrainz;

use async_trait::async_trait;

use crate::blueprint::Blueprint;
use domain::{AlbumInfo, Candidate, ProviderError, TrackHit, TrackManifest};

/// A recommendation feed: turns a blueprint's prompt into candidate tracks.
#[async_trait]
pub trait MetadataApi: Send + Sync {
    /// Fetch the candidate list for one playlist run.
    async fn get_candidates(&self, blueprint: &Blueprint)
    -> Result<Vec<Candidate>, ProviderError>;
}

/// A music-source catalog: search, album metadata, and file/artwork bytes.
#[async_trait]
pub trait AudioSourceApi: Send + Sync {
    /// Free-text track search, results in provider relevance order.
    async fn search_track(&self, query: &str) -> Result<Vec<TrackHit>, ProviderError>;

    /// Codec + stream URL for one track at the requested quality.
    async fn get_track_manifest(
        &self,
        track_id: u64,
        quality: &str,
    ) -> Result<TrackManifest, ProviderError>;

    /// Full album metadata for a confirmed match.
    async fn get_album_info(&self, album_id: u64) -> Result<AlbumInfo, ProviderError>;

    /// Raw audio bytes from a manifest URL.
    async fn get_track_file(&self, url: &str) -> Result<Vec<u8>, ProviderError>;

    /// Artwork bytes for an album cover reference.
    async fn get_album_art(&self, cover: &str) -> Result<Vec<u8>, ProviderError>;
}

/// Build the metadata provider named by a blueprint's `metaApi` selector.
pub fn metadata_provider(
    selector: &str,
    token: Option<&str>,
) -> Result<Box<dyn MetadataApi>, ProviderError> {
    match selector {
        "lbz" | "listenbrainz" => Ok(Box::new(listenbrainz::ListenBrainzClient::new(token))),
        other => Err(ProviderError::Unsupported(other.to_string())),
    }
}

/// Build the audio provider named by a blueprint's `audioApi` selector.
///
/// The original deployment also offered an "scl" (yt-dlp) backend; it does
/// not go through search/match/resolve at all, so it is rejected here.
pub fn audio_provider(selector: &str) -> Result<Box<dyn AudioSourceApi>, ProviderError> {
    match selector {
        "hifi" => Ok(Box::new(hifi::HifiClient::new())),
        other => Err(ProviderError::Unsupported(other.to_string())),
    }
}

/// Mock providers returning configurable canned responses.
#[cfg(test)]
pub mod mocks {
    use super::*;
    use domain::{AlbumRef, ArtistRef};
    use std::collections::HashMap;

    /// Metadata provider that returns a fixed candidate list or error.
    pub struct StaticMetadata {
        pub candidates: Vec<Candidate>,
        pub error: Option<ProviderError>,
    }

    impl StaticMetadata {
        pub fn with_candidates(candidates: Vec<Candidate>) -> Self {
            Self {
                candidates,
                error: None,
            }
        }

        pub fn with_error(error: ProviderError) -> Self {
            Self {
                candidates: vec![],
                error: Some(error),
            }
        }
    }

    #[async_trait]
    impl MetadataApi for StaticMetadata {
        async fn get_candidates(
            &self,
            _blueprint: &Blueprint,
        ) -> Result<Vec<Candidate>, ProviderError> {
            if let Some(ref err) = self.error {
                return Err(err.clone());
            }
            Ok(self.candidates.clone())
        }
    }

    /// Audio provider scripted per query / id.
    ///
    /// Lookups not present in the maps return `NotFound`, which doubles as
    /// the connectivity-failure case in builder tests.
    #[derive(Default)]
    pub struct ScriptedAudio {
        /// Search results keyed by the exact query string
        pub searches: HashMap<String, Vec<TrackHit>>,
        /// Album lookups keyed by album id
        pub albums: HashMap<u64, Result<AlbumInfo, ProviderError>>,
        /// Track manifests keyed by track id
        pub manifests: HashMap<u64, TrackManifest>,
        /// Error returned by every search call when set
        pub search_error: Option<ProviderError>,
        /// Quality hints received by `get_track_manifest`, in call order
        pub manifest_qualities: std::sync::Mutex<Vec<String>>,
        pub audio_bytes: Vec<u8>,
        pub art_bytes: Vec<u8>,
    }

    impl ScriptedAudio {
        pub fn new() -> Self {
            Self {
                audio_bytes: b"not really audio".to_vec(),
                art_bytes: b"not really a jpeg".to_vec(),
                ..Default::default()
            }
        }

        /// Register a hit as the sole search result for a candidate's
        /// query, with a matching album record and manifest.
        pub fn script_match(&mut self, candidate: &Candidate, hit: TrackHit, codec: &str) {
            let album = AlbumInfo::stub_for(&hit.album);
            self.albums.insert(hit.album.id, Ok(album));
            self.manifests.insert(
                hit.id,
                TrackManifest {
                    track_id: hit.id,
                    url: format!("https://cdn.example/{}.{}", hit.id, codec),
                    codec: codec.to_string(),
                    track_gain: None,
                    album_gain: None,
                    bit_depth: Some(16),
                    sample_rate: Some(44100),
                },
            );
            self.searches
                .entry(format!("{} {}", candidate.title, candidate.artist))
                .or_default()
                .push(hit);
        }
    }

    #[async_trait]
    impl AudioSourceApi for ScriptedAudio {
        async fn search_track(&self, query: &str) -> Result<Vec<TrackHit>, ProviderError> {
            if let Some(ref err) = self.search_error {
                return Err(err.clone());
            }
            Ok(self.searches.get(query).cloned().unwrap_or_default())
        }

        async fn get_track_manifest(
            &self,
            track_id: u64,
            quality: &str,
        ) -> Result<TrackManifest, ProviderError> {
            self.manifest_qualities
                .lock()
                .expect("mock state poisoned")
                .push(quality.to_string());
            self.manifests
                .get(&track_id)
                .cloned()
                .ok_or_else(|| ProviderError::NotFound(format!("track {track_id}")))
        }

        async fn get_album_info(&self, album_id: u64) -> Result<AlbumInfo, ProviderError> {
            self.albums
                .get(&album_id)
                .cloned()
                .unwrap_or_else(|| Err(ProviderError::NotFound(format!("album {album_id}"))))
        }

        async fn get_track_file(&self, _url: &str) -> Result<Vec<u8>, ProviderError> {
            Ok(self.audio_bytes.clone())
        }

        async fn get_album_art(&self, _cover: &str) -> Result<Vec<u8>, ProviderError> {
            Ok(self.art_bytes.clone())
        }
    }

    /// Candidate + matching hit pair for orchestration tests.
    pub fn matched_pair(n: u64, title: &str, artist: &str) -> (Candidate, TrackHit) {
        let candidate = Candidate {
            title: title.to_string(),
            artist: artist.to_string(),
            source_id: None,
        };
        let hit = TrackHit {
            artist: ArtistRef {
                id: n,
                name: artist.to_string(),
            },
            album: AlbumRef {
                id: 1000 + n,
                title: format!("Album {n}"),
                cover: Some("00000000-0000-0000-0000-000000000000".to_string()),
            },
            ..TrackHit::stub(n, title)
        };
        (candidate, hit)
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::blueprint::Blueprint;

        #[tokio::test]
        async fn static_metadata_returns_candidates() {
            let (candidate, _) = matched_pair(1, "Song", "Artist");
            let mock = StaticMetadata::with_candidates(vec![candidate.clone()]);
            let got = mock.get_candidates(&Blueprint::stub("test")).await.unwrap();
            assert_eq!(got, vec![candidate]);
        }

        #[tokio::test]
        async fn static_metadata_returns_error() {
            let mock = StaticMetadata::with_error(ProviderError::RateLimited {
                retry_after: Some(10),
            });
            let result = mock.get_candidates(&Blueprint::stub("test")).await;
            assert!(matches!(result, Err(ProviderError::RateLimited { .. })));
        }

        #[tokio::test]
        async fn scripted_audio_search_and_lookups() {
            let (candidate, hit) = matched_pair(1, "Song", "Artist");
            let mut mock = ScriptedAudio::new();
            mock.script_match(&candidate, hit.clone(), "flac");

            let hits = mock.search_track("Song Artist").await.unwrap();
            assert_eq!(hits.len(), 1);

            let manifest = mock.get_track_manifest(hit.id, "LOSSLESS").await.unwrap();
            assert_eq!(manifest.codec, "flac");

            let album = mock.get_album_info(hit.album.id).await.unwrap();
            assert_eq!(album.id, hit.album.id);

            assert!(mock.get_track_manifest(999, "LOSSLESS").await.is_err());
        }
    }
}
