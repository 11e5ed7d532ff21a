//! Human-readable byte counts for progress display.
//!
//! Scaling is decimal (SI, powers of 1000) to match how `Content-Length`
//! sizes are usually presented.

/// Unit prefixes walked while scaling.
const SI_PREFIXES: [char; 6] = ['k', 'M', 'G', 'T', 'P', 'E'];

/// Magnitude at which the next prefix is used, so values never round up to
/// `1000.0` of the current one.
const SCALE_THRESHOLD: i64 = 999_950;

/// Formats a byte count with SI units, e.g. `1.5 MB`.
///
/// Values in `(-1000, 1000)` are printed as plain bytes. Negative values use
/// the same thresholds as positive ones.
///
/// # Examples
///
/// ```
/// use nezumi_core::humanize::human_readable;
///
/// assert_eq!(human_readable(999), "999 B");
/// assert_eq!(human_readable(1_500_000), "1.5 MB");
/// ```
#[must_use]
pub fn human_readable(bytes: i64) -> String {
    if -1000 < bytes && bytes < 1000 {
        return format!("{bytes} B");
    }

    let mut value = bytes;
    let mut prefix = 0;
    while (value <= -SCALE_THRESHOLD || value >= SCALE_THRESHOLD) && prefix + 1 < SI_PREFIXES.len()
    {
        value /= 1000;
        prefix += 1;
    }

    #[allow(clippy::cast_precision_loss)]
    let scaled = value as f64 / 1000.0;
    format!("{scaled:.1} {}B", SI_PREFIXES[prefix])
}

/// Formats an unsigned byte count, saturating at `i64::MAX`.
#[must_use]
pub fn human_readable_u64(bytes: u64) -> String {
    human_readable(i64::try_from(bytes).unwrap_or(i64::MAX))
}
