//! Typed manifest model: player response, streaming data, formats.
//!
//! Only the keys the pipeline needs are modelled. Every other key in the
//! upstream document is ignored, because the schema is undocumented and
//! changes without notice.

use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::ManifestError;
use super::itag;

/// One streaming variant of a video.
///
/// Equality and hashing are keyed on `itag`, which identifies a variant within
/// one catalog. Use [`Format::same_content`] to compare every field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Format {
    /// Upstream format code.
    pub itag: u32,
    /// Direct media location. Time-limited by upstream.
    pub url: String,
    /// Quality label, e.g. `medium` or `hd720`.
    pub quality: String,
    /// Raw MIME type including codec parameters.
    #[serde(rename = "mimeType")]
    pub mime_type_raw: String,
}

impl Format {
    /// MIME type without parameters: everything before the first `;`.
    #[must_use]
    pub fn mime_type(&self) -> &str {
        self.mime_type_raw
            .split_once(';')
            .map_or(self.mime_type_raw.as_str(), |(essence, _)| essence)
    }

    /// Human description from the static itag table.
    #[must_use]
    pub fn description(&self) -> String {
        itag::describe(self.itag)
    }

    /// Compares all fields, not just the itag.
    #[must_use]
    pub fn same_content(&self, other: &Self) -> bool {
        self.itag == other.itag
            && self.url == other.url
            && self.quality == other.quality
            && self.mime_type_raw == other.mime_type_raw
    }
}

impl PartialEq for Format {
    fn eq(&self, other: &Self) -> bool {
        self.itag == other.itag
    }
}

impl Eq for Format {}

impl Hash for Format {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.itag.hash(state);
    }
}

/// Video metadata shown above the format list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoDetails {
    /// Upstream video id.
    pub video_id: String,
    /// Video title.
    pub title: String,
    /// Duration in seconds, as sent by upstream (not parsed).
    pub length_seconds: String,
    /// Channel name.
    pub author: String,
}

/// Muxed and adaptive format lists.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamingData {
    /// Formats carrying both audio and video.
    pub formats: Vec<Format>,
    /// Video-only or audio-only formats.
    pub adaptive_formats: Vec<Format>,
}

impl StreamingData {
    /// All formats, muxed first, then adaptive, each in upstream order.
    #[must_use]
    pub fn all_formats(&self) -> Vec<Format> {
        self.formats
            .iter()
            .chain(&self.adaptive_formats)
            .cloned()
            .collect()
    }

    /// Finds a format by itag, searching muxed formats first.
    #[must_use]
    pub fn find(&self, itag: u32) -> Option<&Format> {
        self.formats
            .iter()
            .chain(&self.adaptive_formats)
            .find(|format| format.itag == itag)
    }
}

/// Top-level manifest for one video.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerResponse {
    /// Available formats.
    pub streaming_data: StreamingData,
    /// Video metadata.
    pub video_details: VideoDetails,
}

impl PlayerResponse {
    /// Decodes a manifest from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::Malformed`] when required fields are missing
    /// or have the wrong shape.
    pub fn from_json(json: &str) -> Result<Self, ManifestError> {
        Self::from_slice(json.as_bytes())
    }

    /// Decodes a manifest from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::Malformed`] when required fields are missing
    /// or have the wrong shape.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ManifestError> {
        let response: Self = serde_json::from_slice(bytes).map_err(ManifestError::malformed)?;
        debug!(
            video_id = %response.video_details.video_id,
            formats = response.streaming_data.formats.len(),
            adaptive_formats = response.streaming_data.adaptive_formats.len(),
            "decoded manifest"
        );
        Ok(response)
    }

    /// All formats in display order.
    #[must_use]
    pub fn all_formats(&self) -> Vec<Format> {
        self.streaming_data.all_formats()
    }
}
