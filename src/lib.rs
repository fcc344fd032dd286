//! # bili-audio-dl
//!
//! Downloads the audio track of Bilibili videos and repackages it as MP3.
//!
//! A download runs four steps in order: resolve the BV id to a playable stream
//! (signed play-url API first, raw play-url API as fallback), pick the best
//! audio URL, stream it to `<title>.m4a`, then post-process to `.mp3`.
//!
//! ```no_run
//! # async fn demo() -> bili_audio_dl::Result<()> {
//! use bili_audio_dl::{AudioDownloader, DownloadConfig};
//!
//! let downloader = AudioDownloader::new(DownloadConfig::default())?;
//! let report = downloader.download_audio("BV1xx411c7mD", None).await?;
//! println!("saved {}", report.path.display());
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;
use std::time::Duration;

use log::{error, info, warn};

pub mod core;

pub use crate::core::credential::Credential;
pub use crate::core::error::{Error, Result};
pub use crate::core::identifier::{split_batch_list, VideoId};
pub use crate::core::models::{StreamDescriptor, VideoMetadata};
pub use crate::core::postprocess::{PostProcessAction, PostProcessOutcome, PostProcessWarning, PostProcessor};
pub use crate::core::source::ApiConfig;
pub use crate::core::stream::{DownloadOptions, OverwriteBehavior, ProgressCallback, DEFAULT_TIMEOUT};

use crate::core::selector::select_audio_url;
use crate::core::{resolve_output_filename, BiliClient, Downloader, StreamResolver};

/// Everything one download run needs to know
#[derive(Debug, Clone)]
pub struct DownloadConfig {
    /// Login cookies; `None` means anonymous requests
    pub credential: Option<Credential>,

    /// Bound for API requests and for connecting to the audio CDN
    pub timeout: Duration,

    /// Directory the audio files are written to
    pub output_dir: PathBuf,

    pub api: ApiConfig,

    /// Run the MP3 post-processing step
    pub convert: bool,

    pub overwrite: OverwriteBehavior,

    /// Chunk size for the body transfer
    pub buffer_size: usize,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            credential: None,
            timeout: DEFAULT_TIMEOUT,
            output_dir: PathBuf::from("."),
            api: ApiConfig::default(),
            convert: true,
            overwrite: OverwriteBehavior::default(),
            buffer_size: DownloadOptions::default().buffer_size,
        }
    }
}

/// A resolved download, before any bytes are transferred
#[derive(Debug, Clone)]
pub struct DownloadPlan {
    pub id: VideoId,
    pub metadata: VideoMetadata,
    pub cid: u64,
    pub audio_url: String,
    /// Stream strategy that produced `audio_url`
    pub strategy: &'static str,
    pub output_path: PathBuf,
}

/// Result of a completed download
#[derive(Debug, Clone)]
pub struct DownloadReport {
    pub plan: DownloadPlan,
    pub bytes: u64,
    /// Final location of the audio, after post-processing
    pub path: PathBuf,
    pub postprocess: Option<PostProcessOutcome>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub succeeded: Vec<String>,
    pub failed: Vec<String>,
}

impl BatchSummary {
    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Sequences resolution, selection, transfer and post-processing
pub struct AudioDownloader {
    config: DownloadConfig,
    api: BiliClient,
    resolver: StreamResolver,
    downloader: Downloader,
    postprocessor: PostProcessor,
}

impl AudioDownloader {
    pub fn new(config: DownloadConfig) -> Result<Self> {
        let api = BiliClient::new(config.api.clone(), config.credential.clone(), config.timeout)?;
        let downloader = Downloader::new(config.api.clone(), config.timeout)?;

        Ok(Self {
            config,
            api,
            resolver: StreamResolver::default(),
            downloader,
            postprocessor: PostProcessor::default(),
        })
    }

    pub fn with_postprocessor(mut self, postprocessor: PostProcessor) -> Self {
        self.postprocessor = postprocessor;
        self
    }

    pub fn with_resolver(mut self, resolver: StreamResolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn config(&self) -> &DownloadConfig {
        &self.config
    }

    /// Resolve `input` down to an audio URL and an output path
    pub async fn plan(&self, input: &str) -> Result<DownloadPlan> {
        let id = VideoId::parse(input)?;
        let resolved = self.resolver.resolve(&self.api, &id).await?;
        let audio_url = select_audio_url(&resolved.descriptor)?;
        info!("Found audio stream via {}", resolved.strategy);

        let output_path = self
            .config
            .output_dir
            .join(resolve_output_filename(&resolved.metadata.title));

        Ok(DownloadPlan {
            id,
            metadata: resolved.metadata,
            cid: resolved.cid,
            audio_url,
            strategy: resolved.strategy,
            output_path,
        })
    }

    /// Download one video's audio track
    pub async fn download_audio(
        &self,
        input: &str,
        progress: Option<ProgressCallback>,
    ) -> Result<DownloadReport> {
        let plan = self.plan(input).await?;

        tokio::fs::create_dir_all(&self.config.output_dir).await?;
        info!("📁 Downloading to: {}", plan.output_path.display());

        let options = DownloadOptions {
            progress,
            buffer_size: self.config.buffer_size,
            overwrite: self.config.overwrite,
        };
        let bytes = self
            .downloader
            .download_to_file(&plan.audio_url, &plan.output_path, &options)
            .await?;
        info!("✅ Audio saved to: {} ({bytes} bytes)", plan.output_path.display());

        let (path, postprocess) = if self.config.convert {
            let outcome = self.postprocessor.normalize(&plan.output_path).await;
            (outcome.path.clone(), Some(outcome))
        } else {
            (plan.output_path.clone(), None)
        };

        Ok(DownloadReport {
            plan,
            bytes,
            path,
            postprocess,
        })
    }

    /// [`download_audio`](Self::download_audio) with errors logged and turned into `false`
    pub async fn download_one(&self, input: &str, progress: Option<ProgressCallback>) -> bool {
        match self.download_audio(input, progress).await {
            Ok(_) => true,
            Err(e) => {
                error!("❌ {input}: {e}");
                false
            }
        }
    }

    /// Download each entry in turn; one failure never stops the rest
    pub async fn download_batch<F>(&self, inputs: &[String], mut progress: F) -> BatchSummary
    where
        F: FnMut() -> Option<ProgressCallback>,
    {
        let mut summary = BatchSummary::default();

        for input in inputs {
            if let Err(e) = VideoId::parse(input) {
                warn!("Skipping invalid entry: {e}");
                summary.failed.push(input.clone());
                continue;
            }

            info!("{}", "=".repeat(50));
            info!("Starting {input}");
            info!("{}", "=".repeat(50));

            if self.download_one(input, progress()).await {
                info!("Finished: {input}");
                summary.succeeded.push(input.clone());
            } else {
                error!("Failed: {input}");
                summary.failed.push(input.clone());
            }
        }

        summary
    }
}

/// Download one video with the default configuration
pub async fn download(input: &str) -> Result<DownloadReport> {
    AudioDownloader::new(DownloadConfig::default())?
        .download_audio(input, None)
        .await
}
