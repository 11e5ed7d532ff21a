//! Optional config file supplying CLI defaults.
//!
//! The file is a flat list of `key = value` lines. Strings are double-quoted,
//! numbers are bare non-negative integers, and `#` starts a comment outside
//! quotes.

use std::env;
use std::fs;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use nezumi_core::download::MAX_CHUNK_SIZE;

const MAX_RETRIES_RANGE: RangeInclusive<u64> = 0..=10;
const TIMEOUT_SECS_RANGE: RangeInclusive<u64> = 1..=3600;

/// Values read from the config file. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileConfig {
    /// Directory downloads are written to.
    pub output_dir: Option<PathBuf>,
    /// Manifest endpoint URL.
    pub endpoint: Option<String>,
    /// API key appended to manifest requests.
    pub api_key: Option<String>,
    /// `clientName` sent with manifest requests.
    pub client_name: Option<String>,
    /// `clientVersion` sent with manifest requests.
    pub client_version: Option<String>,
    /// `hl` locale sent with manifest requests.
    pub locale: Option<String>,
    /// Copy-loop chunk size in bytes.
    pub chunk_size: Option<usize>,
    /// Retries for failed manifest fetches.
    pub max_retries: Option<u8>,
    pub manifest_connect_timeout_secs: Option<u64>,
    pub manifest_read_timeout_secs: Option<u64>,
    pub download_connect_timeout_secs: Option<u64>,
    pub download_read_timeout_secs: Option<u64>,
}

/// Result of looking for the config file.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// Where the file was looked for, when a base directory is known.
    pub path: Option<PathBuf>,
    /// Parsed contents, when the file exists.
    pub config: Option<FileConfig>,
}

/// Default config location.
///
/// `$XDG_CONFIG_HOME/nezumi/config.toml`, else
/// `$HOME/.config/nezumi/config.toml`.
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    let base = non_empty_env("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| non_empty_env("HOME").map(|home| PathBuf::from(home).join(".config")))?;
    Some(base.join("nezumi").join("config.toml"))
}

fn non_empty_env(name: &str) -> Option<std::ffi::OsString> {
    env::var_os(name).filter(|value| !value.is_empty())
}

/// Loads the config file from its default location, if it exists.
///
/// # Errors
///
/// Fails when the file exists but cannot be read, parsed or validated.
pub fn load_default_file_config() -> Result<LoadedConfig> {
    let path = resolve_default_config_path();
    let config = match path.as_deref() {
        Some(file) if file.exists() => Some(load_file_config(file)?),
        _ => None,
    };
    Ok(LoadedConfig { path, config })
}

fn load_file_config(path: &Path) -> Result<FileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    parse_config_str(&raw)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))
}

/// A value token from the right-hand side of a line.
#[derive(Debug, PartialEq, Eq)]
enum Token {
    Text(String),
    Number(u64),
}

impl Token {
    fn parse(raw: &str) -> Result<Self> {
        if let Some(inner) = raw
            .strip_prefix('"')
            .and_then(|rest| rest.strip_suffix('"'))
        {
            return Ok(Self::Text(inner.to_string()));
        }
        if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
            bail!("expected a double-quoted string or a non-negative integer, found '{raw}'");
        }
        raw.parse()
            .map(Self::Number)
            .map_err(|_| anyhow!("integer '{raw}' is too large"))
    }

    fn text(self) -> Result<String> {
        match self {
            Self::Text(value) => Ok(value),
            Self::Number(_) => bail!("expected a double-quoted string"),
        }
    }

    fn number_in(self, range: &RangeInclusive<u64>) -> Result<u64> {
        match self {
            Self::Number(value) if range.contains(&value) => Ok(value),
            Self::Number(value) => bail!(
                "{value} is outside {}..={}",
                range.start(),
                range.end()
            ),
            Self::Text(_) => bail!("expected an integer"),
        }
    }
}

fn parse_config_str(raw: &str) -> Result<FileConfig> {
    let mut cfg = FileConfig::default();
    for (index, raw_line) in raw.lines().enumerate() {
        let line_no = index + 1;
        let line = strip_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            bail!("Invalid config syntax on line {line_no}: expected key = value");
        };
        let key = key.trim();
        let invalid = || format!("Invalid `{key}` value on line {line_no}");
        let token = Token::parse(value.trim()).with_context(invalid)?;
        apply(&mut cfg, key, token).with_context(invalid)?;
    }
    Ok(cfg)
}

fn apply(cfg: &mut FileConfig, key: &str, token: Token) -> Result<()> {
    match key {
        "output_dir" => cfg.output_dir = Some(PathBuf::from(token.text()?)),
        "endpoint" => {
            let endpoint = token.text()?;
            if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
                bail!("endpoint '{endpoint}' is not an http(s) URL");
            }
            cfg.endpoint = Some(endpoint);
        }
        "api_key" => cfg.api_key = Some(token.text()?),
        "client_name" => cfg.client_name = Some(token.text()?),
        "client_version" => cfg.client_version = Some(token.text()?),
        "locale" => cfg.locale = Some(token.text()?),
        "chunk_size" => {
            let max = u64::try_from(MAX_CHUNK_SIZE).unwrap_or(u64::MAX);
            let size = token.number_in(&(1..=max))?;
            cfg.chunk_size = Some(usize::try_from(size)?);
        }
        "max_retries" => {
            let retries = token.number_in(&MAX_RETRIES_RANGE)?;
            cfg.max_retries = Some(u8::try_from(retries)?);
        }
        "manifest_connect_timeout_secs" => {
            cfg.manifest_connect_timeout_secs = Some(token.number_in(&TIMEOUT_SECS_RANGE)?);
        }
        "manifest_read_timeout_secs" => {
            cfg.manifest_read_timeout_secs = Some(token.number_in(&TIMEOUT_SECS_RANGE)?);
        }
        "download_connect_timeout_secs" => {
            cfg.download_connect_timeout_secs = Some(token.number_in(&TIMEOUT_SECS_RANGE)?);
        }
        "download_read_timeout_secs" => {
            cfg.download_read_timeout_secs = Some(token.number_in(&TIMEOUT_SECS_RANGE)?);
        }
        unknown => bail!("Unknown configuration key: '{unknown}'"),
    }
    Ok(())
}

fn strip_comment(line: &str) -> &str {
    let mut quoted = false;
    for (index, ch) in line.char_indices() {
        match ch {
            '"' => quoted = !quoted,
            '#' if !quoted => return &line[..index],
            _ => {}
        }
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    fn error_chain(err: &anyhow::Error) -> String {
        format!("{err:#}")
    }

    #[test]
    fn test_parse_partial_config() {
        let cfg = parse_config_str(
            r#"
chunk_size = 16384
client_version = "2.20240101.00.00"
"#,
        )
        .unwrap();
        assert_eq!(cfg.chunk_size, Some(16_384));
        assert_eq!(cfg.client_version.as_deref(), Some("2.20240101.00.00"));
        assert!(cfg.output_dir.is_none());
        assert!(cfg.api_key.is_none());
    }

    #[test]
    fn test_parse_string_fields() {
        let cfg = parse_config_str(
            r#"
output_dir = "/tmp/videos"
endpoint = "https://api.example.com/player"
api_key = "secret"
client_name = "WEB"
locale = "de"
"#,
        )
        .unwrap();
        assert_eq!(cfg.output_dir, Some(PathBuf::from("/tmp/videos")));
        assert_eq!(cfg.endpoint.as_deref(), Some("https://api.example.com/player"));
        assert_eq!(cfg.api_key.as_deref(), Some("secret"));
        assert_eq!(cfg.client_name.as_deref(), Some("WEB"));
        assert_eq!(cfg.locale.as_deref(), Some("de"));
    }

    #[test]
    fn test_parse_timeouts() {
        let cfg = parse_config_str(
            "manifest_connect_timeout_secs = 5\nmanifest_read_timeout_secs = 20\n\
             download_connect_timeout_secs = 15\ndownload_read_timeout_secs = 120\n",
        )
        .unwrap();
        assert_eq!(cfg.manifest_connect_timeout_secs, Some(5));
        assert_eq!(cfg.manifest_read_timeout_secs, Some(20));
        assert_eq!(cfg.download_connect_timeout_secs, Some(15));
        assert_eq!(cfg.download_read_timeout_secs, Some(120));
    }

    #[test]
    fn test_out_of_range_numbers_rejected() {
        for (line, key) in [
            ("chunk_size = 0", "chunk_size"),
            ("max_retries = 11", "max_retries"),
            ("download_connect_timeout_secs = 0", "download_connect_timeout_secs"),
            ("manifest_read_timeout_secs = 3601", "manifest_read_timeout_secs"),
        ] {
            let err = parse_config_str(line).unwrap_err();
            assert!(error_chain(&err).contains(key), "{line}: {err:#}");
            assert!(error_chain(&err).contains("outside"), "{line}: {err:#}");
        }
    }

    #[test]
    fn test_non_http_endpoint_rejected() {
        let err = parse_config_str(r#"endpoint = "ftp://example.com""#).unwrap_err();
        assert!(error_chain(&err).contains("not an http(s) URL"));
    }

    #[test]
    fn test_wrong_token_types_rejected() {
        let err = parse_config_str("chunk_size = 4 trailing").unwrap_err();
        assert!(error_chain(&err).contains("chunk_size"));

        let err = parse_config_str("locale = en").unwrap_err();
        assert!(error_chain(&err).contains("locale"));

        let err = parse_config_str("locale = 7").unwrap_err();
        assert!(error_chain(&err).contains("double-quoted"));

        let err = parse_config_str(r#"max_retries = "2""#).unwrap_err();
        assert!(error_chain(&err).contains("expected an integer"));
    }

    #[test]
    fn test_inline_comments() {
        let cfg = parse_config_str(
            r#"
# whole-line comment
max_retries = 2 # manifest only
api_key = "abc#def" # hash inside quotes is kept
"#,
        )
        .unwrap();
        assert_eq!(cfg.max_retries, Some(2));
        assert_eq!(cfg.api_key.as_deref(), Some("abc#def"));
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = parse_config_str("concurrency = 4").unwrap_err();
        assert!(error_chain(&err).contains("Unknown configuration key: 'concurrency'"));
    }

    #[test]
    fn test_missing_equals_reports_line() {
        let err = parse_config_str("\noutput_dir").unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_token_parse() {
        assert_eq!(Token::parse("\"x\"").unwrap(), Token::Text("x".to_string()));
        assert_eq!(Token::parse("42").unwrap(), Token::Number(42));
        assert!(Token::parse("-1").is_err());
        assert!(Token::parse("\"").is_err());
        assert!(Token::parse("99999999999999999999999").is_err());
    }
}
