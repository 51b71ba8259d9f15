//! The playlist build pipeline.
//!
//! One run per blueprint: fetch candidates from the metadata provider,
//! resolve each against the source catalog, download and tag the matches,
//! then write the M3U manifest. A run always produces a manifest and an
//! outcome; per-track problems become failure records instead of aborting
//! the run, so one missing track never costs the playlist.

use std::path::{Path, PathBuf};

use crate::blueprint::Blueprint;
use crate::config::{Pacing, PathsConfig, RetryConfig};
use crate::error::{Error, Result, ResultExt};
use crate::matching;
use crate::playlist;
use crate::providers::domain::{Candidate, ProviderError, ResolvedTrack};
use crate::providers::{AudioSourceApi, MetadataApi};
use crate::resolver::{self, Resolution};
use crate::tagger::{self, TrackTags};

/// Quality requested when a matched hit does not carry its own hint.
const FALLBACK_QUALITY: &str = "LOSSLESS";

/// Run state, logged on every transition. RESOLVING, DOWNLOADING, and
/// TAGGING loop per track; only a fatal candidate-fetch failure aborts a
/// run before DONE.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunPhase {
    FetchingCandidates,
    Resolving,
    Downloading,
    Tagging,
    Finalizing,
    Done,
}

impl std::fmt::Display for RunPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::FetchingCandidates => "FETCHING_CANDIDATES",
            Self::Resolving => "RESOLVING",
            Self::Downloading => "DOWNLOADING",
            Self::Tagging => "TAGGING",
            Self::Finalizing => "FINALIZING",
            Self::Done => "DONE",
        };
        f.write_str(s)
    }
}

/// Where in the pipeline a candidate was lost.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureStage {
    /// No search result matched the candidate
    NoMatch,
    /// A result matched but its album record could not be fetched
    AlbumFetch,
    /// A provider call failed (search, manifest, audio, or artwork)
    Download,
    /// The file downloaded but tags could not be written
    Tag,
    /// The target file already existed on disk
    DuplicateSkipped,
}

impl std::fmt::Display for FailureStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::NoMatch => "NO_MATCH",
            Self::AlbumFetch => "ALBUM_FETCH_FAILED",
            Self::Download => "DOWNLOAD_FAILED",
            Self::Tag => "TAG_FAILED",
            Self::DuplicateSkipped => "DUPLICATE_SKIPPED",
        };
        f.write_str(s)
    }
}

/// One candidate that did not make it into the playlist, and why.
#[derive(Debug, Clone)]
pub struct FailureRecord {
    pub candidate: Candidate,
    pub stage: FailureStage,
    pub detail: String,
}

impl FailureRecord {
    fn new(candidate: &Candidate, stage: FailureStage, detail: impl Into<String>) -> Self {
        Self {
            candidate: candidate.clone(),
            stage,
            detail: detail.into(),
        }
    }
}

/// What one build run produced.
#[derive(Debug)]
pub struct RunOutcome {
    pub name: String,
    pub manifest_path: PathBuf,
    /// Manifest entries, relative to the playlists directory
    pub entries: Vec<String>,
    pub failures: Vec<FailureRecord>,
}

/// Sanitize one path component the same way the matcher normalizes text.
///
/// Sharing the character class with the matcher keeps on-disk names
/// predictable from the metadata that produced them.
fn sanitize(component: &str) -> String {
    matching::normalize(component)
}

/// Builds one playlist per call from injected providers.
pub struct PlaylistBuilder<'a> {
    metadata: &'a dyn MetadataApi,
    source: &'a dyn AudioSourceApi,
    paths: PathsConfig,
    pacing: Pacing,
    retry: RetryConfig,
}

impl<'a> PlaylistBuilder<'a> {
    pub fn new(
        metadata: &'a dyn MetadataApi,
        source: &'a dyn AudioSourceApi,
        paths: PathsConfig,
        pacing: Pacing,
        retry: RetryConfig,
    ) -> Self {
        Self {
            metadata,
            source,
            paths,
            pacing,
            retry,
        }
    }

    /// Run the full pipeline for one blueprint.
    ///
    /// Fatal errors (candidate fetch exhausted its retries, manifest write
    /// failed) abort the run; everything per-track lands in
    /// [`RunOutcome::failures`].
    pub async fn build(&self, blueprint: &Blueprint) -> Result<RunOutcome> {
        tracing::info!(playlist = %blueprint.name, phase = %RunPhase::FetchingCandidates, "starting run");
        let candidates = self.fetch_candidates(blueprint).await?;
        tracing::info!(playlist = %blueprint.name, candidates = candidates.len(), "candidates fetched");

        tracing::info!(playlist = %blueprint.name, phase = %RunPhase::Resolving, "resolving candidates");
        let mut failures = Vec::new();
        let resolved = self
            .resolve_candidates(blueprint, &candidates, &mut failures)
            .await;
        tracing::info!(playlist = %blueprint.name, resolved = resolved.len(), "resolution finished");

        tracing::info!(playlist = %blueprint.name, phase = %RunPhase::Downloading, "downloading tracks");
        let entries = self.download_tracks(&resolved, &mut failures).await;

        tracing::info!(playlist = %blueprint.name, phase = %RunPhase::Finalizing, "writing manifest");
        let manifest_path =
            playlist::write_manifest(&self.paths.playlists_dir(), &blueprint.name, &entries)?;

        tracing::info!(
            playlist = %blueprint.name,
            phase = %RunPhase::Done,
            tracks = entries.len(),
            failures = failures.len(),
            "run finished"
        );

        Ok(RunOutcome {
            name: blueprint.name.clone(),
            manifest_path,
            entries,
            failures,
        })
    }

    /// Candidate fetch with bounded retry on provider rate limiting.
    ///
    /// Honors the provider's Retry-After hint when one was given; any other
    /// provider error is fatal immediately.
    async fn fetch_candidates(&self, blueprint: &Blueprint) -> Result<Vec<Candidate>> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.metadata.get_candidates(blueprint).await {
                Ok(candidates) => return Ok(candidates),
                Err(ProviderError::RateLimited { retry_after }) if attempt < self.retry.max_attempts => {
                    let wait = retry_after.unwrap_or(self.retry.default_wait_secs);
                    tracing::warn!(
                        attempt,
                        wait_secs = wait,
                        "metadata provider rate limited, backing off"
                    );
                    tokio::time::sleep(std::time::Duration::from_secs(wait)).await;
                }
                Err(e) => {
                    return Err(Error::Provider(e))
                        .with_context(format!("fetching candidates for {}", blueprint.name));
                }
            }
        }
    }

    /// Resolve candidates in feed order until the blueprint's quantity is
    /// reached. A candidate only counts once its album record is in hand.
    async fn resolve_candidates(
        &self,
        blueprint: &Blueprint,
        candidates: &[Candidate],
        failures: &mut Vec<FailureRecord>,
    ) -> Vec<ResolvedTrack> {
        let mut resolved = Vec::new();

        for candidate in candidates {
            if resolved.len() >= blueprint.quantity as usize {
                break;
            }

            tokio::time::sleep(self.pacing.search()).await;

            let hit = match resolver::resolve(candidate, self.source, &self.pacing).await {
                Ok(Resolution::Matched(hit)) => hit,
                Ok(Resolution::NoMatch) => {
                    tracing::info!(
                        title = %candidate.title,
                        artist = %candidate.artist,
                        "no match in catalog"
                    );
                    failures.push(FailureRecord::new(
                        candidate,
                        FailureStage::NoMatch,
                        "no search result matched",
                    ));
                    continue;
                }
                // A search call that failed is not the same outcome as a
                // search that returned no matching result; keep NO_MATCH
                // for the latter only.
                Err(e) => {
                    tracing::warn!(
                        title = %candidate.title,
                        artist = %candidate.artist,
                        error = %e,
                        "search failed"
                    );
                    failures.push(FailureRecord::new(
                        candidate,
                        FailureStage::Download,
                        format!("search: {e}"),
                    ));
                    continue;
                }
            };

            match self.source.get_album_info(hit.album.id).await {
                Ok(album) => resolved.push(ResolvedTrack {
                    candidate: candidate.clone(),
                    hit,
                    album,
                }),
                Err(e) => {
                    tracing::warn!(
                        title = %candidate.title,
                        album_id = hit.album.id,
                        error = %e,
                        "album lookup failed, skipping candidate"
                    );
                    failures.push(FailureRecord::new(
                        candidate,
                        FailureStage::AlbumFetch,
                        e.to_string(),
                    ));
                }
            }
        }

        resolved
    }

    /// Download, write, and tag every resolved track.
    ///
    /// Hitting a file that already exists on disk stops the whole download
    /// loop, not just that track. Re-running a blueprint therefore only adds
    /// tracks up to the first one it has downloaded before.
    async fn download_tracks(
        &self,
        resolved: &[ResolvedTrack],
        failures: &mut Vec<FailureRecord>,
    ) -> Vec<String> {
        let mut entries = Vec::new();

        for track in resolved {
            tokio::time::sleep(self.pacing.track()).await;

            // Ask for the quality the catalog reported for this hit;
            // requesting more than the track has makes the provider refuse
            let quality = track.hit.audio_quality.as_deref().unwrap_or(FALLBACK_QUALITY);
            let manifest = match self.source.get_track_manifest(track.hit.id, quality).await {
                Ok(m) => m,
                Err(e) => {
                    failures.push(FailureRecord::new(
                        &track.candidate,
                        FailureStage::Download,
                        format!("manifest: {e}"),
                    ));
                    continue;
                }
            };

            let artist = sanitize(&track.hit.artist.name);
            let album = sanitize(&track.album.title);
            let file_name = format!(
                "{} - {}.{}",
                sanitize(&track.hit.title),
                artist,
                manifest.codec
            );
            let dest = self
                .paths
                .music_dir()
                .join(&artist)
                .join(&album)
                .join(&file_name);

            if dest.exists() {
                tracing::info!(path = %dest.display(), "file already on disk, stopping downloads");
                failures.push(FailureRecord::new(
                    &track.candidate,
                    FailureStage::DuplicateSkipped,
                    dest.display().to_string(),
                ));
                break;
            }

            tokio::time::sleep(self.pacing.download()).await;
            let audio = match self.source.get_track_file(&manifest.url).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    failures.push(FailureRecord::new(
                        &track.candidate,
                        FailureStage::Download,
                        format!("audio: {e}"),
                    ));
                    continue;
                }
            };

            let art = match track.album.cover.as_deref() {
                Some(cover) => {
                    tokio::time::sleep(self.pacing.artwork()).await;
                    match self.source.get_album_art(cover).await {
                        Ok(bytes) => Some(bytes),
                        Err(e) => {
                            failures.push(FailureRecord::new(
                                &track.candidate,
                                FailureStage::Download,
                                format!("artwork: {e}"),
                            ));
                            continue;
                        }
                    }
                }
                None => None,
            };

            tokio::time::sleep(self.pacing.write()).await;
            if let Err(e) = self.write_audio(&dest, &audio) {
                failures.push(FailureRecord::new(
                    &track.candidate,
                    FailureStage::Download,
                    e.to_string(),
                ));
                continue;
            }
            tracing::info!(path = %dest.display(), "wrote track");

            entries.push(format!("../music/{artist}/{album}/{file_name}"));

            tracing::debug!(path = %dest.display(), phase = %RunPhase::Tagging, "tagging track");
            if let Err(e) = self.tag_track(&dest, track, &manifest, art) {
                tracing::warn!(path = %dest.display(), error = %e, "tagging failed");
                failures.push(FailureRecord::new(
                    &track.candidate,
                    FailureStage::Tag,
                    e.to_string(),
                ));
            }
        }

        entries
    }

    fn write_audio(&self, dest: &Path, audio: &[u8]) -> Result<()> {
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)
                .with_context(format!("creating track dir {}", parent.display()))?;
        }
        std::fs::write(dest, audio).with_context(format!("writing track {}", dest.display()))
    }

    fn tag_track(
        &self,
        dest: &Path,
        track: &ResolvedTrack,
        manifest: &crate::providers::domain::TrackManifest,
        art: Option<Vec<u8>>,
    ) -> Result<()> {
        let tags = TrackTags::from_resolved(track, manifest);
        tagger::write_tags(dest, &tags)?;
        if let Some(art) = art {
            tagger::embed_artwork(dest, art)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::domain::TrackHit;
    use crate::providers::mocks::{ScriptedAudio, StaticMetadata, matched_pair};
    use tempfile::tempdir;

    fn paths_in(dir: &Path) -> PathsConfig {
        PathsConfig {
            blueprints: dir.join("blueprints"),
            output: dir.join("output"),
        }
    }

    fn blueprint_with_quantity(quantity: u32) -> Blueprint {
        Blueprint {
            quantity,
            ..Blueprint::stub("test-mix")
        }
    }

    fn builder<'a>(
        metadata: &'a StaticMetadata,
        source: &'a ScriptedAudio,
        paths: PathsConfig,
    ) -> PlaylistBuilder<'a> {
        PlaylistBuilder::new(
            metadata,
            source,
            paths,
            Pacing::none(),
            RetryConfig {
                max_attempts: 2,
                default_wait_secs: 0,
            },
        )
    }

    /// Dest path the builder computes for one of [`matched_pair`]'s tracks.
    fn expected_dest(paths: &PathsConfig, n: u64, title: &str, artist: &str) -> PathBuf {
        paths
            .music_dir()
            .join(sanitize(artist))
            .join(sanitize(&format!("Album {n}")))
            .join(format!(
                "{} - {}.flac",
                sanitize(title),
                sanitize(artist)
            ))
    }

    #[tokio::test]
    async fn unmatched_candidate_becomes_no_match_record() {
        let dir = tempdir().unwrap();
        let (candidate, _) = matched_pair(1, "Ghost Song", "Nobody");
        let metadata = StaticMetadata::with_candidates(vec![candidate]);
        let source = ScriptedAudio::new();

        let outcome = builder(&metadata, &source, paths_in(dir.path()))
            .build(&blueprint_with_quantity(10))
            .await
            .unwrap();

        assert!(outcome.entries.is_empty());
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].stage, FailureStage::NoMatch);

        // Manifest still written, header only
        let manifest = playlist::read_manifest(&outcome.manifest_path).unwrap();
        assert_eq!(manifest.name, "test-mix");
        assert!(manifest.entries.is_empty());
    }

    #[tokio::test]
    async fn resolution_stops_at_exactly_quantity() {
        let dir = tempdir().unwrap();
        let mut source = ScriptedAudio::new();
        let mut candidates = Vec::new();
        for n in 1..=4 {
            let (candidate, hit) = matched_pair(n, &format!("Song {n}"), &format!("Artist {n}"));
            source.script_match(&candidate, hit, "flac");
            candidates.push(candidate);
        }
        let metadata = StaticMetadata::with_candidates(candidates);
        let paths = paths_in(dir.path());

        let outcome = builder(&metadata, &source, paths.clone())
            .build(&blueprint_with_quantity(2))
            .await
            .unwrap();

        assert_eq!(outcome.entries.len(), 2);
        // Tagging mock bytes fails, but no candidate was lost before the
        // download stage
        assert!(
            outcome
                .failures
                .iter()
                .all(|f| f.stage == FailureStage::Tag)
        );
        assert!(expected_dest(&paths, 1, "Song 1", "Artist 1").exists());
        assert!(expected_dest(&paths, 2, "Song 2", "Artist 2").exists());
        assert!(!expected_dest(&paths, 3, "Song 3", "Artist 3").exists());
    }

    #[tokio::test]
    async fn existing_file_stops_the_download_loop() {
        let dir = tempdir().unwrap();
        let mut source = ScriptedAudio::new();
        let mut candidates = Vec::new();
        for n in 1..=3 {
            let (candidate, hit) = matched_pair(n, &format!("Song {n}"), &format!("Artist {n}"));
            source.script_match(&candidate, hit, "flac");
            candidates.push(candidate);
        }
        let metadata = StaticMetadata::with_candidates(candidates);
        let paths = paths_in(dir.path());

        // Pre-create the second track's file
        let second = expected_dest(&paths, 2, "Song 2", "Artist 2");
        std::fs::create_dir_all(second.parent().unwrap()).unwrap();
        std::fs::write(&second, b"left over from a previous run").unwrap();

        let outcome = builder(&metadata, &source, paths.clone())
            .build(&blueprint_with_quantity(10))
            .await
            .unwrap();

        // Only the first track made it in; the third was never attempted
        assert_eq!(outcome.entries.len(), 1);
        assert!(outcome.entries[0].contains("Song 1"));
        assert!(
            outcome
                .failures
                .iter()
                .any(|f| f.stage == FailureStage::DuplicateSkipped)
        );
        assert!(!expected_dest(&paths, 3, "Song 3", "Artist 3").exists());
    }

    #[tokio::test]
    async fn album_lookup_failure_skips_candidate() {
        let dir = tempdir().unwrap();
        let mut source = ScriptedAudio::new();
        let (candidate, hit) = matched_pair(1, "Song", "Artist");
        let album_id = hit.album.id;
        source.script_match(&candidate, hit, "flac");
        source
            .albums
            .insert(album_id, Err(ProviderError::Api("HTTP 500".to_string())));
        let metadata = StaticMetadata::with_candidates(vec![candidate]);

        let outcome = builder(&metadata, &source, paths_in(dir.path()))
            .build(&blueprint_with_quantity(10))
            .await
            .unwrap();

        assert!(outcome.entries.is_empty());
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].stage, FailureStage::AlbumFetch);
    }

    #[tokio::test]
    async fn manifest_fetch_failure_skips_track_but_continues() {
        let dir = tempdir().unwrap();
        let mut source = ScriptedAudio::new();
        let mut candidates = Vec::new();
        for n in 1..=2 {
            let (candidate, hit) = matched_pair(n, &format!("Song {n}"), &format!("Artist {n}"));
            source.script_match(&candidate, hit, "flac");
            candidates.push(candidate);
        }
        // First track loses its manifest: the download fails, the second
        // track still proceeds
        source.manifests.remove(&1);
        let metadata = StaticMetadata::with_candidates(candidates);

        let outcome = builder(&metadata, &source, paths_in(dir.path()))
            .build(&blueprint_with_quantity(10))
            .await
            .unwrap();

        assert_eq!(outcome.entries.len(), 1);
        assert!(outcome.entries[0].contains("Song 2"));
        assert!(
            outcome
                .failures
                .iter()
                .any(|f| f.stage == FailureStage::Download)
        );
    }

    #[tokio::test]
    async fn manifest_request_carries_the_hit_quality() {
        let dir = tempdir().unwrap();
        let mut source = ScriptedAudio::new();
        let (candidate_a, hit_a) = matched_pair(1, "Song 1", "Artist 1");
        let hit_a = TrackHit {
            audio_quality: Some("HIGH".to_string()),
            ..hit_a
        };
        source.script_match(&candidate_a, hit_a, "flac");
        let (candidate_b, hit_b) = matched_pair(2, "Song 2", "Artist 2");
        let hit_b = TrackHit {
            audio_quality: None,
            ..hit_b
        };
        source.script_match(&candidate_b, hit_b, "flac");
        let metadata = StaticMetadata::with_candidates(vec![candidate_a, candidate_b]);

        builder(&metadata, &source, paths_in(dir.path()))
            .build(&blueprint_with_quantity(10))
            .await
            .unwrap();

        // A hit that reports its own quality is requested at that quality;
        // only a hit without one falls back to the default
        let qualities = source.manifest_qualities.lock().unwrap();
        assert_eq!(
            *qualities,
            vec!["HIGH".to_string(), "LOSSLESS".to_string()]
        );
    }

    #[tokio::test]
    async fn search_failure_is_not_recorded_as_no_match() {
        let dir = tempdir().unwrap();
        let (candidate, _) = matched_pair(1, "Song", "Artist");
        let mut source = ScriptedAudio::new();
        source.search_error = Some(ProviderError::Api("HTTP 502".to_string()));
        let metadata = StaticMetadata::with_candidates(vec![candidate]);

        let outcome = builder(&metadata, &source, paths_in(dir.path()))
            .build(&blueprint_with_quantity(10))
            .await
            .unwrap();

        assert!(outcome.entries.is_empty());
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].stage, FailureStage::Download);
        assert!(outcome.failures[0].detail.contains("search"));
    }

    #[tokio::test]
    async fn downloaded_track_lands_in_manifest_even_if_tagging_fails() {
        let dir = tempdir().unwrap();
        let mut source = ScriptedAudio::new();
        let (candidate, hit) = matched_pair(1, "Song", "Artist");
        source.script_match(&candidate, hit, "flac");
        let metadata = StaticMetadata::with_candidates(vec![candidate]);
        let paths = paths_in(dir.path());

        let outcome = builder(&metadata, &source, paths.clone())
            .build(&blueprint_with_quantity(10))
            .await
            .unwrap();

        // Mock bytes aren't valid FLAC, so tagging fails, but the file and
        // its manifest entry survive
        assert_eq!(outcome.entries.len(), 1);
        assert_eq!(
            outcome.entries[0],
            "../music/Artist/Album 1/Song - Artist.flac"
        );
        assert!(
            outcome
                .failures
                .iter()
                .any(|f| f.stage == FailureStage::Tag)
        );
        assert!(expected_dest(&paths, 1, "Song", "Artist").exists());

        let manifest = playlist::read_manifest(&outcome.manifest_path).unwrap();
        assert_eq!(manifest.entries, outcome.entries);
    }

    #[tokio::test]
    async fn rate_limited_metadata_fetch_gives_up_after_max_attempts() {
        let dir = tempdir().unwrap();
        let metadata = StaticMetadata::with_error(ProviderError::RateLimited {
            retry_after: Some(0),
        });
        let source = ScriptedAudio::new();

        let result = builder(&metadata, &source, paths_in(dir.path()))
            .build(&blueprint_with_quantity(10))
            .await;

        assert!(result.is_err());
    }

    #[test]
    fn failure_stages_render_stable_tokens() {
        assert_eq!(FailureStage::NoMatch.to_string(), "NO_MATCH");
        assert_eq!(FailureStage::DuplicateSkipped.to_string(), "DUPLICATE_SKIPPED");
        assert_eq!(FailureStage::AlbumFetch.to_string(), "ALBUM_FETCH_FAILED");
    }
}
