//! A unit of download work.

use super::constants::DEFAULT_MIME_TYPE;
use super::filename::{title_stem, url_digest_name, with_extension};

/// What to download and how to name it.
///
/// The task is owned by the engine for the duration of the transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTask {
    source_url: String,
    title: Option<String>,
    mime_type: Option<String>,
}

impl DownloadTask {
    /// Creates a task for `source_url` with no title and the default MIME type.
    pub fn new(source_url: impl Into<String>) -> Self {
        Self {
            source_url: source_url.into(),
            title: None,
            mime_type: None,
        }
    }

    /// Sets the title used for the output name.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets the MIME type of the media.
    #[must_use]
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    /// Media URL.
    #[must_use]
    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    /// Output filename without extension.
    ///
    /// The sanitized title capped at [`MAX_STEM_BYTES`](super::MAX_STEM_BYTES)
    /// bytes, or a digest of the source URL when the title is absent or has no
    /// filename-safe characters.
    #[must_use]
    pub fn target_filename(&self) -> String {
        self.title
            .as_deref()
            .map(title_stem)
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| url_digest_name(&self.source_url))
    }

    /// MIME type of the output, `video/mp4` when unset or blank.
    #[must_use]
    pub fn target_mime_type(&self) -> &str {
        self.mime_type
            .as_deref()
            .map(str::trim)
            .filter(|mime| !mime.is_empty())
            .unwrap_or(DEFAULT_MIME_TYPE)
    }

    /// Name handed to the output store: filename plus MIME extension.
    #[must_use]
    pub fn display_name(&self) -> String {
        with_extension(&self.target_filename(), self.target_mime_type())
    }
}
