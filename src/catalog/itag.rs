//! Static itag → human description table.

use std::collections::HashMap;
use std::sync::LazyLock;

/// Known upstream format codes.
const ITAG_TABLE: &[(u32, &str)] = &[
    // Muxed audio + video
    (5, "240p FLV (H.263, MP3)"),
    (6, "270p FLV (H.263, MP3)"),
    (13, "144p 3GP (MPEG-4, AAC)"),
    (17, "144p 3GP (MPEG-4, AAC)"),
    (18, "360p MP4 (H.264, AAC)"),
    (22, "720p MP4 (H.264, AAC)"),
    (34, "360p FLV (H.264, AAC)"),
    (35, "480p FLV (H.264, AAC)"),
    (36, "240p 3GP (MPEG-4, AAC)"),
    (37, "1080p MP4 (H.264, AAC)"),
    (38, "3072p MP4 (H.264, AAC)"),
    (43, "360p WebM (VP8, Vorbis)"),
    (44, "480p WebM (VP8, Vorbis)"),
    (45, "720p WebM (VP8, Vorbis)"),
    (46, "1080p WebM (VP8, Vorbis)"),
    (59, "480p MP4 (H.264, AAC)"),
    (78, "480p MP4 (H.264, AAC)"),
    // Video only, H.264
    (133, "240p MP4 video only (H.264)"),
    (134, "360p MP4 video only (H.264)"),
    (135, "480p MP4 video only (H.264)"),
    (136, "720p MP4 video only (H.264)"),
    (137, "1080p MP4 video only (H.264)"),
    (138, "2160p MP4 video only (H.264)"),
    (160, "144p MP4 video only (H.264)"),
    (212, "480p MP4 video only (H.264)"),
    (264, "1440p MP4 video only (H.264)"),
    (266, "2160p MP4 video only (H.264)"),
    (298, "720p60 MP4 video only (H.264)"),
    (299, "1080p60 MP4 video only (H.264)"),
    // Audio only
    (139, "48k MP4 audio only (AAC)"),
    (140, "128k MP4 audio only (AAC)"),
    (141, "256k MP4 audio only (AAC)"),
    (171, "128k WebM audio only (Vorbis)"),
    (172, "192k WebM audio only (Vorbis)"),
    (249, "50k WebM audio only (Opus)"),
    (250, "70k WebM audio only (Opus)"),
    (251, "160k WebM audio only (Opus)"),
    // Video only, VP8
    (167, "360p WebM video only (VP8)"),
    (168, "480p WebM video only (VP8)"),
    (169, "720p WebM video only (VP8)"),
    (170, "1080p WebM video only (VP8)"),
    (218, "480p WebM video only (VP8)"),
    (219, "480p WebM video only (VP8)"),
    // Video only, VP9
    (242, "240p WebM video only (VP9)"),
    (243, "360p WebM video only (VP9)"),
    (244, "480p WebM video only (VP9)"),
    (247, "720p WebM video only (VP9)"),
    (248, "1080p WebM video only (VP9)"),
    (271, "1440p WebM video only (VP9)"),
    (272, "2160p WebM video only (VP9)"),
    (278, "144p WebM video only (VP9)"),
    (302, "720p60 WebM video only (VP9)"),
    (303, "1080p60 WebM video only (VP9)"),
    (308, "1440p60 WebM video only (VP9)"),
    (313, "2160p WebM video only (VP9)"),
    (315, "2160p60 WebM video only (VP9)"),
    // Video only, AV1
    (394, "144p MP4 video only (AV1)"),
    (395, "240p MP4 video only (AV1)"),
    (396, "360p MP4 video only (AV1)"),
    (397, "480p MP4 video only (AV1)"),
    (398, "720p MP4 video only (AV1)"),
    (399, "1080p MP4 video only (AV1)"),
    (400, "1440p MP4 video only (AV1)"),
    (401, "2160p MP4 video only (AV1)"),
];

static ITAG_DESCRIPTIONS: LazyLock<HashMap<u32, &'static str>> =
    LazyLock::new(|| ITAG_TABLE.iter().copied().collect());

/// Looks up the table entry for an itag.
#[must_use]
pub fn lookup(itag: u32) -> Option<&'static str> {
    ITAG_DESCRIPTIONS.get(&itag).copied()
}

/// Returns the table entry for an itag, or `Unknown (<itag>)`.
#[must_use]
pub fn describe(itag: u32) -> String {
    lookup(itag).map_or_else(|| format!("Unknown ({itag})"), str::to_string)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_describe_known_itag() {
        assert_eq!(describe(18), "360p MP4 (H.264, AAC)");
        assert_eq!(describe(251), "160k WebM audio only (Opus)");
    }

    #[test]
    fn test_describe_unknown_itag() {
        assert_eq!(describe(99999), "Unknown (99999)");
        assert_eq!(lookup(99999), None);
    }

    #[test]
    fn test_webm_video_only_codecs() {
        for itag in [167, 168, 169, 170, 218, 219] {
            assert!(describe(itag).ends_with("(VP8)"), "itag {itag}");
        }
        for itag in [242, 243, 244, 247, 248, 271, 272, 278, 302, 303, 308, 313, 315] {
            assert!(describe(itag).ends_with("(VP9)"), "itag {itag}");
        }
    }

    #[test]
    fn test_table_has_no_duplicate_codes() {
        let unique: HashSet<u32> = ITAG_TABLE.iter().map(|(code, _)| *code).collect();
        assert_eq!(unique.len(), ITAG_TABLE.len());
    }
}
