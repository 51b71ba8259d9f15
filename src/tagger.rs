//! Audio file tag writing and verification reads.
//!
//! Uses the lofty crate for format-independent metadata access. Tags are
//! written once, right after the audio file lands on disk, from the album
//! and track metadata gathered during resolution. The report generator
//! later reads them back with [`read_summary`] to describe what is really
//! in the output tree.

use base64::Engine;
use lofty::config::WriteOptions;
use lofty::file::{AudioFile, TaggedFileExt};
use lofty::picture::{MimeType, Picture, PictureType};
use lofty::probe::Probe;
use lofty::tag::{Accessor, ItemKey, Tag, TagExt};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};
use crate::providers::domain::{ResolvedTrack, TrackManifest};

/// Complete tag set for one downloaded track.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackTags {
    pub title: String,
    pub album: String,
    pub album_artist: String,
    /// Release date as reported by the provider (YYYY-MM-DD)
    pub date: Option<String>,
    /// Primary artist credit
    pub artist: String,
    /// All artist credits, primary included
    pub artists: Vec<String>,
    pub track_number: Option<u32>,
    pub disc_number: Option<u32>,
    pub track_total: Option<u32>,
    pub disc_total: Option<u32>,
    pub isrc: Option<String>,
    /// Album UPC
    pub barcode: Option<String>,
    pub replay_gain: Option<f64>,
    pub copyright: Option<String>,
}

impl TrackTags {
    /// Assemble the tag set from a resolved track and its stream manifest.
    ///
    /// Track-level fields come from the search hit, album-level fields from
    /// the full album record, and replay gain prefers the manifest's value
    /// over the search hit's.
    pub fn from_resolved(resolved: &ResolvedTrack, manifest: &TrackManifest) -> Self {
        let hit = &resolved.hit;
        let album = &resolved.album;

        let mut artists: Vec<String> = vec![hit.artist.name.clone()];
        for artist in &hit.artists {
            if !artists.contains(&artist.name) {
                artists.push(artist.name.clone());
            }
        }

        Self {
            title: hit.title.clone(),
            album: album.title.clone(),
            album_artist: album.artist.name.clone(),
            date: album.release_date.clone(),
            artist: hit.artist.name.clone(),
            artists,
            track_number: hit.track_number,
            disc_number: hit.volume_number,
            track_total: album.number_of_tracks,
            disc_total: album.number_of_volumes,
            isrc: hit.isrc.clone(),
            barcode: album.upc.clone(),
            replay_gain: manifest.track_gain.or(hit.replay_gain),
            copyright: hit.copyright.clone().or_else(|| album.copyright.clone()),
        }
    }
}

/// Write the full tag set to an audio file.
pub fn write_tags(path: &Path, tags: &TrackTags) -> Result<()> {
    let mut tagged_file = Probe::open(path)
        .map_err(|e| Error::tag(path, format!("open for probing: {e}")))?
        .read()
        .map_err(|e| Error::tag(path, format!("read container: {e}")))?;

    let tag_type = tagged_file.primary_tag_type();
    let tag = if let Some(tag) = tagged_file.tag_mut(tag_type) {
        tag
    } else {
        tagged_file.insert_tag(Tag::new(tag_type));
        tagged_file.tag_mut(tag_type).expect("Just inserted tag")
    };

    tag.set_title(tags.title.clone());
    tag.set_album(tags.album.clone());
    tag.set_artist(tags.artist.clone());
    tag.insert_text(ItemKey::AlbumArtist, tags.album_artist.clone());

    if tags.artists.len() > 1 {
        tag.insert_text(ItemKey::TrackArtists, tags.artists.join("; "));
    }
    if let Some(ref date) = tags.date {
        tag.insert_text(ItemKey::RecordingDate, date.clone());
    }
    if let Some(n) = tags.track_number {
        tag.set_track(n);
    }
    if let Some(n) = tags.track_total {
        tag.set_track_total(n);
    }
    if let Some(n) = tags.disc_number {
        tag.set_disk(n);
    }
    if let Some(n) = tags.disc_total {
        tag.set_disk_total(n);
    }
    if let Some(ref isrc) = tags.isrc {
        tag.insert_text(ItemKey::Isrc, isrc.clone());
    }
    if let Some(ref barcode) = tags.barcode {
        tag.insert_text(ItemKey::Barcode, barcode.clone());
    }
    if let Some(gain) = tags.replay_gain {
        tag.insert_text(ItemKey::ReplayGainTrackGain, format!("{gain:.2} dB"));
    }
    if let Some(ref copyright) = tags.copyright {
        tag.insert_text(ItemKey::CopyrightMessage, copyright.clone());
    }

    tag.save_to_path(path, WriteOptions::default())
        .map_err(|e| Error::tag(path, format!("save tags: {e}")))?;

    Ok(())
}

/// Embed artwork bytes as the front cover.
///
/// The artwork CDN serves JPEG at every size variant, so the MIME type is
/// fixed rather than sniffed.
pub fn embed_artwork(path: &Path, art: Vec<u8>) -> Result<()> {
    let mut tagged_file = Probe::open(path)
        .map_err(|e| Error::tag(path, format!("open for probing: {e}")))?
        .read()
        .map_err(|e| Error::tag(path, format!("read container: {e}")))?;

    let tag_type = tagged_file.primary_tag_type();
    let tag = if let Some(tag) = tagged_file.tag_mut(tag_type) {
        tag
    } else {
        tagged_file.insert_tag(Tag::new(tag_type));
        tagged_file.tag_mut(tag_type).expect("Just inserted tag")
    };

    let picture = Picture::new_unchecked(PictureType::CoverFront, Some(MimeType::Jpeg), None, art);
    tag.set_picture(0, picture);

    tag.save_to_path(path, WriteOptions::default())
        .map_err(|e| Error::tag(path, format!("save artwork: {e}")))?;

    Ok(())
}

/// What a verification read found in one output file.
///
/// Serialized into the run report, so field names stay camelCase like the
/// rest of the report JSON.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagSummary {
    /// Path relative to the output root
    pub path: String,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub album_artist: Option<String>,
    pub date: Option<String>,
    pub track_number: Option<u32>,
    pub disc_number: Option<u32>,
    pub isrc: Option<String>,
    pub length_secs: Option<u64>,
    /// Embedded front cover as base64, when one is present
    pub artwork: Option<String>,
}

/// Read tags back from an output file for the run report.
///
/// Never fails: a file that cannot be probed (missing, truncated download,
/// unsupported container) still yields a summary carrying just the path, so
/// the report's track count always matches the manifest.
pub fn read_summary(path: &Path, relative: &str) -> TagSummary {
    let mut summary = TagSummary {
        path: relative.to_string(),
        ..TagSummary::default()
    };

    let tagged_file = match Probe::open(path).and_then(|p| p.read()) {
        Ok(f) => f,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "could not read tags for report");
            return summary;
        }
    };

    summary.length_secs = Some(tagged_file.properties().duration().as_secs());

    let Some(tag) = tagged_file.primary_tag().or_else(|| tagged_file.first_tag()) else {
        return summary;
    };

    summary.title = tag.title().map(|s| s.to_string());
    summary.artist = tag.artist().map(|s| s.to_string());
    summary.album = tag.album().map(|s| s.to_string());
    summary.album_artist = tag.get_string(&ItemKey::AlbumArtist).map(|s| s.to_string());
    summary.date = tag.get_string(&ItemKey::RecordingDate).map(|s| s.to_string());
    summary.track_number = tag.track();
    summary.disc_number = tag.disk();
    summary.isrc = tag.get_string(&ItemKey::Isrc).map(|s| s.to_string());
    summary.artwork = tag
        .pictures()
        .iter()
        .find(|p| p.pic_type() == PictureType::CoverFront)
        .map(|p| base64::engine::general_purpose::STANDARD.encode(p.data()));

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::domain::{AlbumInfo, ArtistRef, Candidate, TrackHit};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn resolved_stub() -> ResolvedTrack {
        let hit = TrackHit {
            artists: vec![
                ArtistRef {
                    id: 1,
                    name: "Test Artist".to_string(),
                },
                ArtistRef {
                    id: 2,
                    name: "Featured One".to_string(),
                },
            ],
            isrc: Some("USUM70746088".to_string()),
            replay_gain: Some(-7.5),
            ..TrackHit::stub(9, "Song")
        };
        let album = AlbumInfo::stub_for(&hit.album);
        ResolvedTrack {
            candidate: Candidate {
                title: "Song".to_string(),
                artist: "Test Artist".to_string(),
                source_id: None,
            },
            hit,
            album,
        }
    }

    fn manifest_stub(gain: Option<f64>) -> TrackManifest {
        TrackManifest {
            track_id: 9,
            url: "https://cdn.example/9.flac".to_string(),
            codec: "flac".to_string(),
            track_gain: gain,
            album_gain: None,
            bit_depth: Some(16),
            sample_rate: Some(44100),
        }
    }

    #[test]
    fn tags_assemble_from_hit_and_album() {
        let tags = TrackTags::from_resolved(&resolved_stub(), &manifest_stub(Some(-8.1)));
        assert_eq!(tags.title, "Song");
        assert_eq!(tags.album, "Test Album");
        assert_eq!(tags.album_artist, "Test Artist");
        assert_eq!(tags.artists, vec!["Test Artist", "Featured One"]);
        assert_eq!(tags.barcode.as_deref(), Some("123456789012"));
        assert_eq!(tags.track_total, Some(10));
    }

    #[test]
    fn manifest_gain_wins_over_search_gain() {
        let tags = TrackTags::from_resolved(&resolved_stub(), &manifest_stub(Some(-8.1)));
        assert_eq!(tags.replay_gain, Some(-8.1));

        let tags = TrackTags::from_resolved(&resolved_stub(), &manifest_stub(None));
        assert_eq!(tags.replay_gain, Some(-7.5));
    }

    #[test]
    fn write_tags_on_non_audio_file_is_tag_error() {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        writeln!(file, "This is just some text, not music.").expect("Failed to write");

        let tags = TrackTags::from_resolved(&resolved_stub(), &manifest_stub(None));
        let result = write_tags(file.path(), &tags);
        assert!(matches!(result, Err(Error::Tag { .. })));
    }

    #[test]
    fn embed_artwork_on_non_audio_file_is_tag_error() {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        writeln!(file, "Still not music.").expect("Failed to write");

        let result = embed_artwork(file.path(), b"fake jpeg".to_vec());
        assert!(matches!(result, Err(Error::Tag { .. })));
    }

    #[test]
    fn summary_of_unreadable_file_keeps_path() {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        writeln!(file, "garbage").expect("Failed to write");

        let summary = read_summary(file.path(), "music/A/B/C - A.flac");
        assert_eq!(summary.path, "music/A/B/C - A.flac");
        assert!(summary.title.is_none());
    }

    #[test]
    fn summary_of_missing_file_keeps_path() {
        let summary = read_summary(Path::new("does/not/exist.flac"), "music/x.flac");
        assert_eq!(summary.path, "music/x.flac");
        assert!(summary.artwork.is_none());
    }

    #[test]
    fn summary_serializes_camel_case() {
        let summary = TagSummary {
            path: "music/x.flac".to_string(),
            album_artist: Some("Someone".to_string()),
            track_number: Some(3),
            ..TagSummary::default()
        };
        let json = serde_json::to_string(&summary).unwrap();
        assert!(json.contains("\"albumArtist\""));
        assert!(json.contains("\"trackNumber\""));
    }
}
