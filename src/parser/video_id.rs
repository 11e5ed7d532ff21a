//! Video id extraction from pasted link text.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, trace};

use super::error::ResolutionError;

/// Recognised link shapes: short link, `/v/`, `/u/<c>/`, `/embed/`, `watch?v=`
/// and a trailing `&v=` parameter.
///
/// The id runs up to the first `#`, `&` or `?`. Only a tail introduced by one
/// of those characters may follow it, and `.` does not cross newlines, so the
/// pattern must consume the whole single-line input.
#[allow(clippy::expect_used)]
static LINK_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^.*(?:youtu\.be/|v/|u/\w/|embed/|watch\?v=|&v=)([^#&?]*)(?:[#&?].*)?$")
        .expect("link regex is valid") // Static pattern, safe to panic
});

#[allow(clippy::expect_used)]
static ID_GRAMMAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("id regex is valid"));

/// Opaque upstream video identifier.
///
/// Always non-empty and restricted to `[A-Za-z0-9_-]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VideoId(String);

impl VideoId {
    /// Validates a bare identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ResolutionError::NoMatch`] when `raw` is empty or contains
    /// characters outside the identifier grammar.
    pub fn parse(raw: &str) -> Result<Self, ResolutionError> {
        if ID_GRAMMAR.is_match(raw) {
            Ok(Self(raw.to_string()))
        } else {
            Err(ResolutionError::no_match(raw))
        }
    }

    /// Returns the identifier text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for VideoId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Extracts the video id from a pasted link.
///
/// Surrounding whitespace is ignored. When several markers appear the last one
/// wins, so `watch?v=a&v=b` resolves to `b`.
///
/// # Errors
///
/// Returns [`ResolutionError::NoMatch`] when the input is not a full match of
/// a supported link shape or the captured id is empty or malformed.
///
/// # Examples
///
/// ```
/// use nezumi_core::parser::resolve;
///
/// let id = resolve("https://youtu.be/dQw4w9WgXcQ?t=42").unwrap();
/// assert_eq!(id.as_str(), "dQw4w9WgXcQ");
/// assert!(resolve("not a link").is_err());
/// ```
#[tracing::instrument(skip(raw_input), fields(input_len = raw_input.len()))]
pub fn resolve(raw_input: &str) -> Result<VideoId, ResolutionError> {
    let input = raw_input.trim();

    let Some(captures) = LINK_PATTERN.captures(input) else {
        debug!("input is not a supported link shape");
        return Err(ResolutionError::no_match(input));
    };

    let candidate = captures.get(1).map_or("", |m| m.as_str());
    trace!(candidate, "captured id candidate");

    let id = VideoId::parse(candidate).map_err(|_| ResolutionError::no_match(input))?;
    debug!(video_id = %id, "resolved video id");
    Ok(id)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const ID: &str = "dQw4w9WgXcQ";

    #[test]
    fn test_resolve_short_link() {
        assert_eq!(resolve("https://youtu.be/dQw4w9WgXcQ").unwrap().as_str(), ID);
    }

    #[test]
    fn test_resolve_watch_link() {
        let id = resolve("https://www.youtube.com/watch?v=dQw4w9WgXcQ").unwrap();
        assert_eq!(id.as_str(), ID);
    }

    #[test]
    fn test_resolve_embed_link() {
        let id = resolve("https://www.youtube.com/embed/dQw4w9WgXcQ").unwrap();
        assert_eq!(id.as_str(), ID);
    }

    #[test]
    fn test_resolve_v_path_link() {
        let id = resolve("https://www.youtube.com/v/dQw4w9WgXcQ").unwrap();
        assert_eq!(id.as_str(), ID);
    }

    #[test]
    fn test_resolve_user_path_link() {
        let id = resolve("https://www.youtube.com/u/1/dQw4w9WgXcQ").unwrap();
        assert_eq!(id.as_str(), ID);
    }

    #[test]
    fn test_resolve_trailing_v_parameter() {
        let id = resolve("https://www.youtube.com/watch?feature=share&v=dQw4w9WgXcQ").unwrap();
        assert_eq!(id.as_str(), ID);
    }

    #[test]
    fn test_resolve_stops_at_first_delimiter() {
        for input in [
            "https://youtu.be/dQw4w9WgXcQ?t=42",
            "https://youtu.be/dQw4w9WgXcQ#comments",
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ&list=PL123&index=2",
        ] {
            assert_eq!(resolve(input).unwrap().as_str(), ID, "input: {input}");
        }
    }

    #[test]
    fn test_resolve_last_marker_wins() {
        let id = resolve("https://www.youtube.com/watch?v=first&v=second").unwrap();
        assert_eq!(id.as_str(), "second");
    }

    #[test]
    fn test_resolve_ignores_surrounding_whitespace() {
        let id = resolve("  https://youtu.be/dQw4w9WgXcQ\n").unwrap();
        assert_eq!(id.as_str(), ID);
    }

    #[test]
    fn test_resolve_rejects_empty_capture() {
        assert!(matches!(
            resolve("https://www.youtube.com/watch?v="),
            Err(ResolutionError::NoMatch { .. })
        ));
        assert!(resolve("https://youtu.be/?t=3").is_err());
    }

    #[test]
    fn test_resolve_rejects_trailing_garbage() {
        assert!(resolve("https://youtu.be/dQw4w9WgXcQ and some words").is_err());
    }

    #[test]
    fn test_resolve_rejects_link_inside_multiline_text() {
        assert!(resolve("watch this\nhttps://youtu.be/dQw4w9WgXcQ\nthanks").is_err());
    }

    #[test]
    fn test_resolve_rejects_unrelated_input() {
        assert!(resolve("").is_err());
        assert!(resolve("hello world").is_err());
        assert!(resolve("https://example.com/video.mp4").is_err());
    }

    #[test]
    fn test_video_id_parse_validates_grammar() {
        assert!(VideoId::parse("abc_DEF-123").is_ok());
        assert!(VideoId::parse("").is_err());
        assert!(VideoId::parse("has space").is_err());
        assert!(VideoId::parse("slash/id").is_err());
    }

    #[test]
    fn test_video_id_display_matches_as_str() {
        let id = VideoId::parse(ID).unwrap();
        assert_eq!(id.to_string(), ID);
        assert_eq!(id.as_ref(), ID);
    }
}
