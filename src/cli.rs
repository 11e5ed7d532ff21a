//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

use nezumi_core::download::MAX_CHUNK_SIZE;

/// Resolve a video link, list its formats and download one.
///
/// Without `--itag` the formats are listed and nothing is downloaded.
#[derive(Parser, Debug)]
#[command(name = "nezumi")]
#[command(author, version, about)]
pub struct Args {
    /// Video link (short link, watch, embed or /v/ URL)
    pub url: String,

    /// Format to download, by itag
    #[arg(short = 'f', long)]
    pub itag: Option<u32>,

    /// Directory the download is written to
    #[arg(short = 'o', long)]
    pub output_dir: Option<PathBuf>,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// Retries for failed manifest fetches (0-10)
    #[arg(short = 'r', long, value_parser = clap::value_parser!(u8).range(0..=10))]
    pub max_retries: Option<u8>,

    /// Copy-loop chunk size in bytes
    #[arg(long, value_parser = parse_chunk_size)]
    pub chunk_size: Option<usize>,

    /// Client version sent with manifest requests
    #[arg(long)]
    pub client_version: Option<String>,

    /// Manifest endpoint URL
    #[arg(long)]
    pub endpoint: Option<String>,

    /// API key for the manifest endpoint (falls back to the config file, then NEZUMI_API_KEY)
    #[arg(long)]
    pub api_key: Option<String>,
}

fn parse_chunk_size(raw: &str) -> Result<usize, String> {
    let value: usize = raw
        .parse()
        .map_err(|_| format!("'{raw}' is not a byte count"))?;
    if (1..=MAX_CHUNK_SIZE).contains(&value) {
        Ok(value)
    } else {
        Err(format!("chunk size must be between 1 and {MAX_CHUNK_SIZE}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "https://youtu.be/dQw4w9WgXcQ";

    #[test]
    fn test_cli_url_only_parses_successfully() {
        let args = Args::try_parse_from(["nezumi", URL]).unwrap();
        assert_eq!(args.url, URL);
        assert_eq!(args.verbose, 0);
        assert!(!args.quiet);
        assert!(args.itag.is_none());
        assert!(args.max_retries.is_none());
        assert!(args.chunk_size.is_none());
    }

    #[test]
    fn test_cli_url_is_required() {
        let result = Args::try_parse_from(["nezumi"]);
        let err = result.unwrap_err();
        assert_eq!(
            err.kind(),
            clap::error::ErrorKind::MissingRequiredArgument
        );
    }

    #[test]
    fn test_cli_verbose_flag_increments_count() {
        let args = Args::try_parse_from(["nezumi", "-v", URL]).unwrap();
        assert_eq!(args.verbose, 1);

        let args = Args::try_parse_from(["nezumi", "-vv", URL]).unwrap();
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn test_cli_quiet_flag_sets_quiet() {
        let args = Args::try_parse_from(["nezumi", "--quiet", URL]).unwrap();
        assert!(args.quiet);
    }

    #[test]
    fn test_cli_help_flag_shows_usage() {
        let err = Args::try_parse_from(["nezumi", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_cli_version_flag_shows_version() {
        let err = Args::try_parse_from(["nezumi", "--version"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }

    #[test]
    fn test_cli_itag_and_output_dir() {
        let args =
            Args::try_parse_from(["nezumi", URL, "--itag", "18", "-o", "/tmp/out"]).unwrap();
        assert_eq!(args.itag, Some(18));
        assert_eq!(args.output_dir, Some(PathBuf::from("/tmp/out")));
    }

    #[test]
    fn test_cli_max_retries_over_max_rejected() {
        let err = Args::try_parse_from(["nezumi", URL, "-r", "11"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn test_cli_chunk_size_bounds() {
        let args = Args::try_parse_from(["nezumi", URL, "--chunk-size", "1"]).unwrap();
        assert_eq!(args.chunk_size, Some(1));

        let err = Args::try_parse_from(["nezumi", URL, "--chunk-size", "0"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);

        let err = Args::try_parse_from(["nezumi", URL, "--chunk-size", "lots"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn test_cli_manifest_overrides() {
        let args = Args::try_parse_from([
            "nezumi",
            URL,
            "--client-version",
            "2.20240101.00.00",
            "--endpoint",
            "http://127.0.0.1:9/player",
        ])
        .unwrap();
        assert_eq!(args.client_version.as_deref(), Some("2.20240101.00.00"));
        assert_eq!(args.endpoint.as_deref(), Some("http://127.0.0.1:9/player"));
    }
}
