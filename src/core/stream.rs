//! Streaming primitives for bili-audio-dl
//!
//! Wraps an HTTP response body as `AsyncRead` and carries the per-download
//! options.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use futures::TryStreamExt;
use tokio::io::{AsyncRead, ReadBuf};

/// Response body of an audio transfer
pub enum DownloadStream {
    /// HTTP stream using reqwest
    Http(Box<dyn AsyncRead + Send + Unpin>),
}

impl AsyncRead for DownloadStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        match &mut *self {
            DownloadStream::Http(stream) => Pin::new(stream).poll_read(cx, buf),
        }
    }
}

/// Progress callback: `(downloaded, total)` in bytes.
///
/// Only invoked when the server declared a content length.
pub type ProgressCallback = Arc<dyn Fn(u64, u64) + Send + Sync>;

/// What to do when the destination file already exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverwriteBehavior {
    /// Replace the existing file
    #[default]
    Overwrite,
    /// Fail before any request is made
    NeverOverwrite,
}

/// Options for a single download
#[derive(Clone)]
pub struct DownloadOptions {
    /// Optional progress callback
    pub progress: Option<ProgressCallback>,

    /// Size of each read/write chunk
    pub buffer_size: usize,

    /// Behavior when destination file already exists
    pub overwrite: OverwriteBehavior,
}

impl Default for DownloadOptions {
    fn default() -> Self {
        Self {
            progress: None,
            buffer_size: 8 * 1024, // 8KB
            overwrite: OverwriteBehavior::default(),
        }
    }
}

/// Default bound on connection setup and API requests
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Percentage complete, or `None` when the total is unknown
pub fn percent(downloaded: u64, total: Option<u64>) -> Option<f64> {
    match total {
        Some(total) if total > 0 => Some(downloaded as f64 / total as f64 * 100.0),
        _ => None,
    }
}

/// Creates a DownloadStream from an HTTP response
pub fn create_http_stream(response: reqwest::Response) -> DownloadStream {
    let stream = Box::new(tokio_util::io::StreamReader::new(
        response.bytes_stream().map_err(std::io::Error::other),
    ));
    DownloadStream::Http(stream)
}
