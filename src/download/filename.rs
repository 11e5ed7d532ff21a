//! Output naming: title sanitizing, URL-digest fallback, MIME extensions and
//! collision candidates.

use std::path::{Component, Path, PathBuf};

use sha2::{Digest, Sha256};

use super::constants::{MAX_FILENAME_BYTES, MAX_STEM_BYTES, URL_DIGEST_CHARS};

const MAX_COLLISION_SUFFIX: usize = 1000;

/// MIME type → most common file extension for the formats upstream serves.
const MIME_EXTENSIONS: &[(&str, &str)] = &[
    ("video/mp4", "mp4"),
    ("video/webm", "webm"),
    ("audio/mp4", "m4a"),
    ("audio/webm", "weba"),
];

/// Returns the extension for a MIME type, or `""` when unknown.
///
/// Parameters after `;` are ignored and matching is case-insensitive.
#[must_use]
pub fn extension_for_mime(mime_type: &str) -> &'static str {
    let essence = mime_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();
    MIME_EXTENSIONS
        .iter()
        .find(|(mime, _)| *mime == essence)
        .map_or("", |(_, ext)| ext)
}

/// Appends the extension for `mime_type` to `stem`, if there is one.
#[must_use]
pub fn with_extension(stem: &str, mime_type: &str) -> String {
    match extension_for_mime(mime_type) {
        "" => stem.to_string(),
        ext => format!("{stem}.{ext}"),
    }
}

/// Short stable name derived from a URL: leading hex chars of its SHA-256.
#[must_use]
pub fn url_digest_name(url: &str) -> String {
    let digest = format!("{:x}", Sha256::digest(url.as_bytes()));
    digest[..URL_DIGEST_CHARS].to_string()
}

/// Collapses a free-text title into a filename-safe component.
///
/// Path separators, reserved characters and whitespace become `_`; runs of
/// separators collapse; leading/trailing separators are trimmed.
pub(crate) fn sanitize_filename_component(value: &str) -> String {
    let mut out = String::new();
    let mut prev_sep = false;
    for ch in value.chars() {
        let mapped = match ch {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\'' => '_',
            c if c.is_whitespace() || c.is_control() => '_',
            c if c.is_alphanumeric() || matches!(c, '-' | '_' | '.') => c,
            _ => '_',
        };
        if mapped == '_' {
            if !prev_sep {
                out.push('_');
                prev_sep = true;
            }
        } else {
            out.push(mapped);
            prev_sep = false;
        }
    }
    out.trim_matches(|c| c == '_' || c == '.').to_string()
}

/// Title → filename stem: sanitized and cut to [`MAX_STEM_BYTES`].
///
/// Empty when the title has no filename-safe characters.
pub(crate) fn title_stem(title: &str) -> String {
    let sanitized = sanitize_filename_component(title);
    truncate_at_char_boundary(&sanitized, MAX_STEM_BYTES)
        .trim_end_matches(['_', '.'])
        .to_string()
}

/// Longest prefix of `value` that fits in `max_bytes` without splitting a char.
pub(crate) fn truncate_at_char_boundary(value: &str, max_bytes: usize) -> &str {
    if value.len() <= max_bytes {
        return value;
    }
    let mut end = max_bytes;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    &value[..end]
}

/// Makes a store-supplied name usable as a single path segment.
///
/// Traversal and empty names become `download.bin`; names over
/// [`MAX_FILENAME_BYTES`] lose the tail of their stem, keeping the extension.
pub(crate) fn fit_filename(filename: &str) -> String {
    if filename.is_empty() || !is_safe_filename_segment(filename) {
        return "download.bin".to_string();
    }
    if filename.len() <= MAX_FILENAME_BYTES {
        return filename.to_string();
    }
    let (stem, ext) = split_extension(filename);
    let budget = MAX_FILENAME_BYTES.saturating_sub(ext.len());
    let stem = truncate_at_char_boundary(stem, budget);
    if stem.is_empty() {
        truncate_at_char_boundary(filename, MAX_FILENAME_BYTES).to_string()
    } else {
        format!("{stem}{ext}")
    }
}

/// Publish locations to try in order: `name.ext`, `name_1.ext`, `name_2.ext`, ...
pub(crate) fn candidate_paths(dir: &Path, filename: &str) -> impl Iterator<Item = PathBuf> {
    let first = dir.join(filename);
    let (stem, ext) = split_extension(filename);
    let (stem, ext) = (stem.to_string(), ext.to_string());
    let dir = dir.to_path_buf();
    std::iter::once(first).chain(
        (1..MAX_COLLISION_SUFFIX).map(move |i| dir.join(format!("{stem}_{i}{ext}"))),
    )
}

fn split_extension(filename: &str) -> (&str, &str) {
    match filename.rfind('.') {
        Some(pos) if pos > 0 => (&filename[..pos], &filename[pos..]),
        _ => (filename, ""),
    }
}

fn is_safe_filename_segment(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_extension_for_known_mime_types() {
        assert_eq!(extension_for_mime("video/mp4"), "mp4");
        assert_eq!(extension_for_mime("video/webm"), "webm");
        assert_eq!(extension_for_mime("audio/mp4"), "m4a");
        assert_eq!(extension_for_mime("audio/webm"), "weba");
    }

    #[test]
    fn test_extension_ignores_parameters_and_case() {
        assert_eq!(extension_for_mime("Video/MP4; codecs=\"avc1\""), "mp4");
    }

    #[test]
    fn test_extension_for_unknown_mime_is_empty() {
        assert_eq!(extension_for_mime("video/3gpp"), "");
        assert_eq!(with_extension("clip", "video/3gpp"), "clip");
        assert_eq!(with_extension("clip", "audio/webm"), "clip.weba");
    }

    #[test]
    fn test_url_digest_name_is_stable_and_short() {
        let a = url_digest_name("https://media.example.com/a");
        let b = url_digest_name("https://media.example.com/b");
        assert_eq!(a.len(), URL_DIGEST_CHARS);
        assert_eq!(a, url_digest_name("https://media.example.com/a"));
        assert_ne!(a, b);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_sanitize_component_replaces_reserved_chars() {
        assert_eq!(sanitize_filename_component("AC/DC: Live?"), "AC_DC_Live");
        assert_eq!(sanitize_filename_component("  spaced   out  "), "spaced_out");
        assert_eq!(sanitize_filename_component("../etc/passwd"), "etc_passwd");
    }

    #[test]
    fn test_sanitize_component_can_be_empty() {
        assert_eq!(sanitize_filename_component("???"), "");
        assert_eq!(sanitize_filename_component(".."), "");
    }

    #[test]
    fn test_title_stem_caps_multibyte_title_on_char_boundary() {
        let title = "字".repeat(100);
        let stem = title_stem(&title);
        assert!(stem.len() <= MAX_STEM_BYTES);
        assert_eq!(stem.len() % "字".len(), 0);
        assert!(stem.chars().all(|c| c == '字'));
    }

    #[test]
    fn test_title_stem_drops_trailing_separator_after_cut() {
        let title = format!("{} tail", "a".repeat(MAX_STEM_BYTES - 1));
        let stem = title_stem(&title);
        assert_eq!(stem, "a".repeat(MAX_STEM_BYTES - 1));
    }

    #[test]
    fn test_truncate_at_char_boundary() {
        assert_eq!(truncate_at_char_boundary("héllo", 2), "h");
        assert_eq!(truncate_at_char_boundary("héllo", 3), "hé");
        assert_eq!(truncate_at_char_boundary("short", 50), "short");
    }

    #[test]
    fn test_fit_filename_keeps_extension_of_long_name() {
        let name = format!("{}.mp4", "字".repeat(100));
        let fitted = fit_filename(&name);
        assert!(fitted.len() <= MAX_FILENAME_BYTES);
        assert!(fitted.ends_with(".mp4"));
        assert_eq!(fit_filename("clip.mp4"), "clip.mp4");
    }

    #[test]
    fn test_fit_filename_rejects_traversal_and_empty() {
        assert_eq!(fit_filename("../escape.mp4"), "download.bin");
        assert_eq!(fit_filename("a/b.mp4"), "download.bin");
        assert_eq!(fit_filename(""), "download.bin");
    }

    #[test]
    fn test_candidate_paths_order() {
        let dir = TempDir::new().unwrap();
        let candidates: Vec<PathBuf> = candidate_paths(dir.path(), "clip.mp4").take(3).collect();
        assert_eq!(
            candidates,
            vec![
                dir.path().join("clip.mp4"),
                dir.path().join("clip_1.mp4"),
                dir.path().join("clip_2.mp4"),
            ]
        );
        let bare: Vec<PathBuf> = candidate_paths(dir.path(), "clip").skip(1).take(1).collect();
        assert_eq!(bare, vec![dir.path().join("clip_1")]);
    }
}
