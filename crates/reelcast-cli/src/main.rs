//! Reelcast CLI: upload videos to the ingestion service and follow their processing.
//!
//! Configured through REELCAST_* environment variables (or a `.env` file).

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use reelcast_api_client::{
    ApiClient, MediaFile, PartUploader, UploadOptions, UploadOrchestrator, UploadRequest,
};
use reelcast_cli::{init_tracing, truncate_string, SessionPrinter};
use reelcast_core::models::manifest_url;
use reelcast_core::{chunk_size_from_mb, ClientConfig, ErrorMetadata};
use reelcast_events::{EventSubscriber, SseBrokerTransport};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "reelcast", about = "Reelcast video upload CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload a video file in parts
    Upload {
        /// Path to the video file
        file: PathBuf,
        /// Title shown in the video list
        #[arg(long)]
        title: String,
        /// Override the content type inferred from the extension
        #[arg(long)]
        content_type: Option<String>,
        /// Part size in MiB (minimum 5)
        #[arg(long)]
        chunk_size_mb: Option<u64>,
        /// Maximum simultaneous part transfers
        #[arg(long)]
        concurrency: Option<usize>,
        /// Follow the transcoding job after the upload
        #[arg(long)]
        watch: bool,
    },
    /// Follow the notifications of an existing job
    Watch {
        /// Job (video) ID
        job_id: String,
    },
    /// List uploaded videos
    List,
    /// Print the HLS playlist URL of a video
    Manifest {
        /// Video ID
        video_id: String,
    },
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize response")?;
    println!("{}", out);
    Ok(())
}

/// Token cancelled on the first Ctrl-C.
fn cancel_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted");
            trigger.cancel();
        }
    });
    token
}

/// Print job notifications until the job finishes or `cancel` fires.
async fn follow(
    subscriber: &EventSubscriber<SseBrokerTransport>,
    cancel: &CancellationToken,
) -> anyhow::Result<()> {
    let mut updates = subscriber.watch();
    let mut printer = SessionPrinter::default();

    loop {
        let snapshot = updates.borrow_and_update().clone();
        for line in printer.render(&snapshot) {
            println!("{}", line);
        }
        if snapshot.is_finished() {
            break;
        }

        tokio::select! {
            _ = cancel.cancelled() => break,
            changed = updates.changed() => changed.context("Notification channel closed")?,
        }
    }

    subscriber.unsubscribe();
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let mut config = ClientConfig::from_env().context("Failed to load configuration")?;

    match cli.command {
        Commands::Upload {
            file,
            title,
            content_type,
            chunk_size_mb,
            concurrency,
            watch,
        } => {
            if let Some(mb) = chunk_size_mb {
                config.chunk_size_bytes = chunk_size_from_mb(mb)?;
            }
            if let Some(parts) = concurrency {
                config.max_concurrent_parts = parts;
            }
            config.validate()?;

            let mut media = MediaFile::open(&file).await?;
            if let Some(content_type) = content_type {
                media = media.with_content_type(content_type);
            }

            let api = Arc::new(
                ApiClient::from_config(&config).context("Failed to create API client")?,
            );
            let uploader = Arc::new(PartUploader::new(Duration::from_secs(
                config.http_timeout_secs,
            ))?);
            let subscriber = Arc::new(EventSubscriber::new(Arc::new(
                SseBrokerTransport::from_config(&config),
            )));

            let mut orchestrator =
                UploadOrchestrator::new(api, uploader, UploadOptions::from_config(&config));
            if watch {
                orchestrator = orchestrator.with_observer(subscriber.clone());
            }

            let cancel = cancel_on_ctrl_c();
            let report = match orchestrator
                .run(UploadRequest::new(title, media), cancel.clone())
                .await
            {
                Ok(report) => report,
                Err(err) => {
                    if let Some(action) = err.suggested_action() {
                        eprintln!("{}", action);
                    }
                    return Err(err.into());
                }
            };
            print_json(&report)?;

            if watch {
                follow(&subscriber, &cancel).await?;
            }
        }
        Commands::Watch { job_id } => {
            let subscriber =
                EventSubscriber::new(Arc::new(SseBrokerTransport::from_config(&config)));
            subscriber.subscribe(&job_id);
            follow(&subscriber, &cancel_on_ctrl_c()).await?;
        }
        Commands::List => {
            let client =
                ApiClient::from_config(&config).context("Failed to create API client")?;
            let videos = client.list_videos().await?;
            if videos.is_empty() {
                println!("No videos uploaded yet");
            }
            for video in videos {
                println!("{:<10} {}", video.id, truncate_string(&video.title, 60));
            }
        }
        Commands::Manifest { video_id } => {
            let base = config
                .playback_base_url
                .as_deref()
                .context("Set REELCAST_PLAYBACK_BASE_URL to resolve playlists")?;
            println!("{}", manifest_url(base, &video_id));
        }
    }

    Ok(())
}
