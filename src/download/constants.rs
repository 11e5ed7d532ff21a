//! Constants for the download module (timeouts, chunking, defaults).

/// Default media connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default media idle timeout between body reads (5 minutes).
pub const READ_TIMEOUT_SECS: u64 = 300;

/// Default copy-loop chunk size (8 KiB).
pub const DEFAULT_CHUNK_SIZE: usize = 8 * 1024;

/// Largest accepted chunk size (4 MiB).
pub const MAX_CHUNK_SIZE: usize = 4 * 1024 * 1024;

/// MIME type assumed when a task does not name one.
pub const DEFAULT_MIME_TYPE: &str = "video/mp4";

/// Default number of downloads allowed to run at once.
pub const DEFAULT_CONCURRENCY: usize = 3;

/// Maximum number of downloads allowed to run at once.
pub const MAX_CONCURRENCY: usize = 16;

/// Hex characters of the URL digest used for untitled downloads.
pub const URL_DIGEST_CHARS: usize = 16;

/// Longest title-derived stem, in bytes.
///
/// Leaves room under the usual 255-byte name limit for a collision suffix,
/// the extension and the hidden pending-file decoration.
pub const MAX_STEM_BYTES: usize = 120;

/// Longer names handed to the file store are cut back to this many bytes.
pub const MAX_FILENAME_BYTES: usize = 200;
