//! CLI entry point for nezumi.

use std::io::{self, IsTerminal};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Parser;
use nezumi_core::download::{DownloadEngine, DownloadOutcome, FileOutputStore};
use nezumi_core::manifest::ManifestClient;
use nezumi_core::pipeline::{CatalogState, Pipeline};
use nezumi_core::humanize::human_readable_u64;
use nezumi_core::{Format, PlayerResponse, resolve};
use tracing::{debug, info, warn};

mod app_config;
mod cli;
mod config_runtime;
mod progress_ui;

use cli::Args;
use config_runtime::{api_key_from_env, resolve_settings};
use progress_ui::BarObserver;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    debug!(?args, "CLI arguments parsed");

    let loaded = app_config::load_default_file_config()?;
    if let Some(path) = loaded.path.as_deref() {
        debug!(path = %path.display(), found = loaded.config.is_some(), "config file");
    }
    let settings = resolve_settings(&args, loaded.config.as_ref(), api_key_from_env());

    let video_id = match resolve(&args.url) {
        Ok(video_id) => video_id,
        Err(error) => {
            debug!(error = %error, "link rejected");
            bail!("{}", error.user_message());
        }
    };
    info!(video_id = %video_id, "resolved link");

    let source = Arc::new(
        ManifestClient::new(settings.manifest)
            .context("Failed to build manifest client")?,
    );
    let engine = Arc::new(
        DownloadEngine::with_store(
            Arc::new(FileOutputStore::new(&settings.output_dir)),
            settings.engine,
        )
        .context("Invalid download settings")?,
    );
    let pipeline = Pipeline::new(source, engine, settings.pipeline);

    pipeline.set_video_id(video_id);
    let mut state = pipeline.subscribe();
    let settled = state
        .wait_for(CatalogState::is_settled)
        .await
        .context("Catalog fetch stopped unexpectedly")?
        .clone();

    let catalog = match settled {
        CatalogState::Ready(catalog) => catalog,
        CatalogState::Unavailable { video_id, reason } => {
            bail!("Could not load formats for {video_id}: {reason}");
        }
        CatalogState::Idle | CatalogState::Loading { .. } => {
            bail!("Catalog fetch stopped unexpectedly");
        }
    };

    print_catalog(&catalog);

    let Some(itag) = args.itag else {
        info!("pass --itag to download one of the formats above");
        return Ok(());
    };
    let Some(format) = catalog.streaming_data.find(itag).cloned() else {
        bail!("No format with itag {itag} for this video");
    };

    let show_bar = !args.quiet && io::stderr().is_terminal();
    let observer = Arc::new(BarObserver::new(&format.description(), show_bar));
    let handle = pipeline.download(&format, observer);

    let cancel = handle.cancel_token();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received; cancelling download");
            cancel.cancel();
        }
    });

    let outcome = handle.outcome().await;
    interrupt.abort();

    match outcome {
        DownloadOutcome::Completed(published) => {
            println!(
                "Saved {} ({})",
                published.location.display(),
                human_readable_u64(published.size_bytes)
            );
            Ok(())
        }
        DownloadOutcome::Cancelled => bail!("Download cancelled"),
        DownloadOutcome::Failed(error) => {
            Err(anyhow::Error::new(error).context("Download failed"))
        }
    }
}

fn print_catalog(catalog: &PlayerResponse) {
    let details = &catalog.video_details;
    println!("{} by {}", details.title, details.author);
    println!("Length: {}s", details.length_seconds);
    println!();
    println!("{:>6}  {:<32}  {:<10}  MIME", "ITAG", "DESCRIPTION", "QUALITY");
    for format in catalog.all_formats() {
        println!("{}", format_row(&format));
    }
}

fn format_row(format: &Format) -> String {
    format!(
        "{:>6}  {:<32}  {:<10}  {}",
        format.itag,
        format.description(),
        format.quality,
        format.mime_type()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_row_columns() {
        let format = Format {
            itag: 18,
            url: "https://media.example/18".to_string(),
            quality: "medium".to_string(),
            mime_type_raw: "video/mp4; codecs=\"avc1.42001E, mp4a.40.2\"".to_string(),
        };
        let row = format_row(&format);
        assert!(row.starts_with("    18  "));
        assert!(row.contains("medium"));
        assert!(row.ends_with("video/mp4"));
    }
}
