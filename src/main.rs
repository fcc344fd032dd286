//! # bili-audio-dl CLI
//!
//! Command-line interface for the bili-audio-dl library.
//! Downloads the audio track of Bilibili videos, optionally as MP3.

use std::path::PathBuf;
use std::time::Duration;

use bili_audio_dl::{
    split_batch_list, ApiConfig, AudioDownloader, Credential, DownloadConfig, OverwriteBehavior,
    PostProcessor,
};
use clap::Parser;
use log::{error, LevelFilter};

mod cli;

/// Command-line interface for bili-audio-dl
#[derive(Parser)]
#[command(name = "bili-audio-dl")]
#[command(about = "Download the audio track of Bilibili videos")]
#[command(long_about = "Downloads the audio track of Bilibili videos:
  bili-audio-dl BV1xx411c7mD                                # Save as '<title>.mp3'
  bili-audio-dl https://www.bilibili.com/video/BV1xx411c7mD # Id taken from the URL
  bili-audio-dl BV1xx411c7mD,BV1r7411p7R4                   # Several, one after another
  bili-audio-dl --batch \"BV1xx411c7mD, BV1r7411p7R4\"         # Same, as a quoted list
  bili-audio-dl                                             # Interactive menu

Login cookies (only for member-only videos) can be passed as flags or through
BILI_SESSDATA, BILI_JCT and BILI_BUVID3.")]
#[command(version = env!("BILI_AUDIO_VERSION"))]
struct Cli {
    /// BV ids or video URLs; comma-separated lists are accepted
    inputs: Vec<String>,

    /// Comma-separated list of BV ids, downloaded one after another
    #[arg(short, long)]
    batch: Option<String>,

    /// Directory to save audio files in
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Timeout in seconds for API requests and for connecting to the CDN
    #[arg(long, default_value_t = 30)]
    timeout: u64,

    /// Keep the downloaded .m4a instead of converting to MP3
    #[arg(long)]
    no_convert: bool,

    /// Never overwrite existing files (fail if destination exists)
    #[arg(long)]
    no_clobber: bool,

    /// Transcoder used for MP3 conversion
    #[arg(long, default_value = "ffmpeg")]
    ffmpeg: PathBuf,

    /// Resolve the audio stream and print it without downloading
    #[arg(long)]
    dry_run: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// SESSDATA login cookie
    #[arg(long, env = "BILI_SESSDATA", hide_env_values = true)]
    sessdata: Option<String>,

    /// bili_jct (CSRF) cookie
    #[arg(long, env = "BILI_JCT", hide_env_values = true)]
    bili_jct: Option<String>,

    /// buvid3 device cookie
    #[arg(long, env = "BILI_BUVID3", hide_env_values = true)]
    buvid3: Option<String>,

    /// Override the API host (testing and mirrors)
    #[arg(long, hide = true, default_value = "https://api.bilibili.com")]
    api_base: String,
}

impl Cli {
    fn download_config(&self) -> DownloadConfig {
        DownloadConfig {
            credential: Credential::from_parts(
                self.sessdata.clone(),
                self.bili_jct.clone(),
                self.buvid3.clone(),
            ),
            timeout: Duration::from_secs(self.timeout.max(1)),
            output_dir: self.output_dir.clone(),
            api: ApiConfig::default().with_api_base_url(self.api_base.as_str()),
            convert: !self.no_convert,
            overwrite: if self.no_clobber {
                OverwriteBehavior::NeverOverwrite
            } else {
                OverwriteBehavior::Overwrite
            },
            ..Default::default()
        }
    }

    fn identifiers(&self) -> Vec<String> {
        self.inputs
            .iter()
            .chain(self.batch.as_ref())
            .flat_map(|input| split_batch_list(input))
            .collect()
    }
}

#[tokio::main]
async fn main() {
    match run().await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            error!("❌ Error: {e:#}");
            std::process::exit(1);
        }
    }
}

async fn run() -> anyhow::Result<bool> {
    let cli = Cli::parse();

    // Initialize logging to stdout
    let default_level = if cli.verbose { LevelFilter::Debug } else { LevelFilter::Info };
    env_logger::Builder::new()
        .filter_level(default_level)
        .parse_default_env()
        .format_timestamp(None)
        .format_target(false)
        .target(env_logger::Target::Stdout)
        .init();

    if cli.verbose {
        log::debug!("bili-audio-dl v{} starting...", env!("BILI_AUDIO_VERSION"));
    }

    let config = cli.download_config();
    let postprocessor = PostProcessor::default().with_transcoder(cli.ffmpeg.clone());
    let identifiers = cli.identifiers();

    if identifiers.is_empty() {
        if cli.dry_run {
            anyhow::bail!("--dry-run needs at least one BV id");
        }
        return cli::menu::run(config, postprocessor).await;
    }

    let downloader = AudioDownloader::new(config)?.with_postprocessor(postprocessor);

    if cli.dry_run {
        return Ok(dry_run(&downloader, &identifiers).await);
    }

    if let [single] = identifiers.as_slice() {
        let progress = cli::ProgressManager::new();
        return Ok(downloader.download_one(single, Some(progress.callback())).await);
    }

    let summary = downloader
        .download_batch(&identifiers, || Some(cli::ProgressManager::new().callback()))
        .await;
    println!(
        "Batch finished: {} succeeded, {} failed",
        summary.succeeded.len(),
        summary.failed.len()
    );
    Ok(summary.all_succeeded())
}

/// Resolve every identifier and print the plan
async fn dry_run(downloader: &AudioDownloader, identifiers: &[String]) -> bool {
    let mut all_ok = true;
    for input in identifiers {
        match downloader.plan(input).await {
            Ok(plan) => {
                println!("🔍 [DRY RUN] {} \"{}\" (cid {})", plan.id, plan.metadata.title, plan.cid);
                println!("    audio: {}", plan.audio_url);
                println!("    would save to: {}", plan.output_path.display());
            }
            Err(e) => {
                error!("❌ [DRY RUN] {input}: {e}");
                all_ok = false;
            }
        }
    }
    all_ok
}
