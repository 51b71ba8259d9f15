//! ListenBrainz API Data Transfer Objects
//!
//! These types match EXACTLY what the LB-radio endpoint returns.
//! DO NOT add fields that aren't in the API response.
//! DO NOT use these types outside the listenbrainz module - convert to
//! domain types.
//!
//! API Reference: https://listenbrainz.readthedocs.io/
//!
//! The radio endpoint wraps a JSPF playlist: the tracks we care about live
//! at `payload.jspf.playlist.track`.

use serde::{Deserialize, Serialize};

/// Top-level radio response
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RadioResponse {
    pub payload: RadioPayload,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RadioPayload {
    pub jspf: Jspf,
}

/// JSPF wrapper object
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Jspf {
    pub playlist: JspfPlaylist,
}

/// JSPF playlist body
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JspfPlaylist {
    /// Playlist title assigned by the radio generator
    pub title: Option<String>,
    #[serde(default)]
    pub track: Vec<JspfTrack>,
}

/// One recommended track
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JspfTrack {
    pub title: String,
    /// Artist credit string (may join several collaborators)
    pub creator: String,
    /// MusicBrainz recording URLs, when known
    #[serde(default)]
    pub identifier: Vec<String>,
    pub album: Option<String>,
}

/// Error response body
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiError {
    pub error: String,
    pub code: Option<u32>,
}

// ============================================================================
// CONTRACT TESTS
// These verify our DTOs match what the real API returns.
// If these fail, the API has changed and we need to update our DTOs.
// ============================================================================

#[cfg(test)]
mod contract_tests {
    use super::*;

    #[test]
    fn test_parse_radio_response() {
        let json = r#"{
            "payload": {
                "jspf": {
                    "playlist": {
                        "title": "Radio for artist:(nine inch nails)",
                        "track": [
                            {
                                "title": "Hurt",
                                "creator": "Nine Inch Nails",
                                "identifier": ["https://musicbrainz.org/recording/abc-123"],
                                "album": "The Downward Spiral"
                            },
                            {
                                "title": "Closer",
                                "creator": "Nine Inch Nails"
                            }
                        ]
                    }
                }
            }
        }"#;

        let response: RadioResponse =
            serde_json::from_str(json).expect("Should parse radio response");

        let tracks = &response.payload.jspf.playlist.track;
        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].title, "Hurt");
        assert_eq!(tracks[0].creator, "Nine Inch Nails");
        assert_eq!(tracks[0].identifier.len(), 1);
        assert!(tracks[1].identifier.is_empty());
        assert!(tracks[1].album.is_none());
    }

    #[test]
    fn test_parse_empty_playlist() {
        let json = r#"{"payload":{"jspf":{"playlist":{"title":null,"track":[]}}}}"#;
        let response: RadioResponse =
            serde_json::from_str(json).expect("Should parse empty playlist");
        assert!(response.payload.jspf.playlist.track.is_empty());
    }

    #[test]
    fn test_parse_error_response() {
        let json = r#"{"error": "Rate limit exceeded", "code": 429}"#;
        let error: ApiError = serde_json::from_str(json).expect("Should parse error");
        assert_eq!(error.error, "Rate limit exceeded");
        assert_eq!(error.code, Some(429));
    }
}
