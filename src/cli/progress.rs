//! CLI-specific progress handling for bili-audio-dl
//!
//! Provides the progress bar shown while an audio file is transferred.

use std::sync::Arc;

use bili_audio_dl::ProgressCallback;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Creates a progress bar for CLI display
pub fn create_progress_bar(total_size: u64) -> ProgressBar {
    let pb = ProgressBar::with_draw_target(Some(total_size), ProgressDrawTarget::hidden());
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {bytes}/{total_bytes} ({percent}%) {bytes_per_sec} ETA: {eta}")
            .expect("Failed to create progress style")
            .progress_chars("#>-")
    );
    pb
}

/// Progress bar for one audio transfer.
///
/// The bar stays hidden until the first progress report, so transfers without
/// a declared length print nothing.
pub struct ProgressManager {
    pub pb: ProgressBar,
}

impl Default for ProgressManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressManager {
    pub fn new() -> Self {
        Self {
            pb: create_progress_bar(0),
        }
    }

    /// Callback that drives this bar
    pub fn callback(&self) -> ProgressCallback {
        let pb = self.pb.clone();
        Arc::new(move |downloaded, total| {
            if pb.length() != Some(total) {
                pb.set_length(total);
                pb.set_draw_target(ProgressDrawTarget::stdout());
            }
            pb.set_position(downloaded);
            if downloaded >= total {
                pb.finish_and_clear();
            }
        })
    }
}
