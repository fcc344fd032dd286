//! MP3 post-processing
//!
//! Best effort: every failure degrades to a rename or to leaving the file
//! alone, and is reported as a [`PostProcessWarning`] rather than an error.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use log::{info, warn};
use tokio::process::Command;

/// Extensions that may be relabelled when transcoding is impossible
const RENAMEABLE_EXTENSIONS: [&str; 2] = ["m4a", "aac"];

/// Extension of the platform's native audio container
const NATIVE_EXTENSION: &str = "m4a";

/// Why post-processing did not fully transcode
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostProcessWarning {
    /// Input file does not exist
    FileMissing(PathBuf),
    /// `-version` probe failed, file was renamed instead
    TranscoderUnavailable(String),
    /// Transcoder ran and failed; carries its stderr
    TranscodeFailed(String),
    /// Rename (or removing the original) failed
    FileOperationFailed(String),
}

impl fmt::Display for PostProcessWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FileMissing(path) => write!(f, "file does not exist: {}", path.display()),
            Self::TranscoderUnavailable(name) => write!(f, "{name} not available, renamed instead"),
            Self::TranscodeFailed(stderr) => write!(f, "transcoding failed: {}", stderr.trim()),
            Self::FileOperationFailed(msg) => write!(f, "file operation failed: {msg}"),
        }
    }
}

/// What happened to the file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostProcessAction {
    Unchanged,
    Renamed,
    Transcoded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostProcessOutcome {
    /// Where the audio lives now
    pub path: PathBuf,
    pub action: PostProcessAction,
    pub warning: Option<PostProcessWarning>,
}

impl PostProcessOutcome {
    fn new(path: PathBuf, action: PostProcessAction, warning: Option<PostProcessWarning>) -> Self {
        Self { path, action, warning }
    }
}

/// Normalizes downloaded audio into the target container
#[derive(Debug, Clone)]
pub struct PostProcessor {
    /// Transcoder executable
    pub transcoder: PathBuf,
    pub codec: String,
    pub bitrate: String,
    pub target_extension: String,
}

impl Default for PostProcessor {
    fn default() -> Self {
        Self {
            transcoder: PathBuf::from("ffmpeg"),
            codec: "libmp3lame".to_string(),
            bitrate: "192k".to_string(),
            target_extension: "mp3".to_string(),
        }
    }
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default()
}

impl PostProcessor {
    pub fn with_transcoder(mut self, transcoder: impl Into<PathBuf>) -> Self {
        self.transcoder = transcoder.into();
        self
    }

    /// Convert `file` to the target container; never fails
    pub async fn normalize(&self, file: &Path) -> PostProcessOutcome {
        if !file.exists() {
            let warning = PostProcessWarning::FileMissing(file.to_path_buf());
            warn!("⚠️  {warning}");
            return PostProcessOutcome::new(file.to_path_buf(), PostProcessAction::Unchanged, Some(warning));
        }

        let extension = extension_of(file);
        if extension == self.target_extension.to_ascii_lowercase() {
            return PostProcessOutcome::new(file.to_path_buf(), PostProcessAction::Unchanged, None);
        }

        let target = file.with_extension(&self.target_extension);

        if extension == NATIVE_EXTENSION {
            return self.rename(file, &target, None).await;
        }

        if !self.transcoder_available().await {
            let warning = PostProcessWarning::TranscoderUnavailable(self.transcoder.display().to_string());
            warn!("⚠️  {warning}");
            return self.rename(file, &target, Some(warning)).await;
        }

        info!("Converting to {}...", self.target_extension.to_uppercase());
        let output = Command::new(&self.transcoder)
            .arg("-i")
            .arg(file)
            .args(["-acodec", self.codec.as_str(), "-ab", self.bitrate.as_str(), "-vn", "-y"])
            .arg(&target)
            .stdin(Stdio::null())
            .output()
            .await;

        let stderr = match output {
            Ok(output) if output.status.success() => {
                info!("Converted to: {}", target.display());
                let warning = match tokio::fs::remove_file(file).await {
                    Ok(()) => None,
                    Err(e) => Some(PostProcessWarning::FileOperationFailed(format!(
                        "could not remove {}: {e}",
                        file.display()
                    ))),
                };
                return PostProcessOutcome::new(target, PostProcessAction::Transcoded, warning);
            }
            Ok(output) => String::from_utf8_lossy(&output.stderr).into_owned(),
            Err(e) => e.to_string(),
        };

        let warning = PostProcessWarning::TranscodeFailed(stderr);
        warn!("⚠️  {warning}");
        if RENAMEABLE_EXTENSIONS.contains(&extension.as_str()) {
            self.rename(file, &target, Some(warning)).await
        } else {
            PostProcessOutcome::new(file.to_path_buf(), PostProcessAction::Unchanged, Some(warning))
        }
    }

    /// Zero exit status from `<transcoder> -version`
    pub async fn transcoder_available(&self) -> bool {
        Command::new(&self.transcoder)
            .arg("-version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|status| status.success())
            .unwrap_or(false)
    }

    async fn rename(&self, from: &Path, to: &Path, warning: Option<PostProcessWarning>) -> PostProcessOutcome {
        match tokio::fs::rename(from, to).await {
            Ok(()) => {
                info!("Renamed to: {}", to.display());
                PostProcessOutcome::new(to.to_path_buf(), PostProcessAction::Renamed, warning)
            }
            Err(e) => {
                let failure = PostProcessWarning::FileOperationFailed(format!(
                    "could not rename {}: {e}",
                    from.display()
                ));
                warn!("⚠️  {failure}");
                PostProcessOutcome::new(from.to_path_buf(), PostProcessAction::Unchanged, Some(failure))
            }
        }
    }
}
