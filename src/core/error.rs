//! Error types for bili-audio-dl
//!
//! Every failure below the orchestrator is expressed as one of these variants.
//! Post-processing problems are not errors; see
//! [`PostProcessWarning`](crate::core::postprocess::PostProcessWarning).

use std::fmt;

/// Main error type for bili-audio-dl operations
#[derive(Debug)]
pub enum Error {
    /// Input is neither a BV id nor a URL containing one
    InvalidIdentifier(String),

    /// Video metadata could not be fetched or decoded
    MetadataError(String),

    /// Metadata carried neither pages nor a top-level cid (holds the bvid)
    MissingContentId(String),

    /// Every stream-info strategy failed
    ResolutionError(String),

    /// A descriptor was returned but no usable audio URL could be selected
    NoAudioStream(String),

    /// The audio transfer itself failed (status or broken body)
    TransferError(String),

    /// Local file I/O error
    IoError(std::io::Error),

    /// Non-success HTTP status from an API endpoint
    HttpError(String),

    /// Connection or timeout failure
    NetworkError(String),

    /// The platform answered with a non-zero `code`
    ApiError { code: i64, message: String },
}

impl Error {
    /// Whether the stream-resolution chain may move on to the next strategy.
    ///
    /// Remote failures and malformed payloads qualify; local problems do not.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::HttpError(_)
                | Error::NetworkError(_)
                | Error::ApiError { .. }
                | Error::ResolutionError(_)
                | Error::NoAudioStream(_)
        )
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidIdentifier(input) => {
                write!(f, "'{input}' is not a BV id (expected BV followed by 10 letters or digits)")
            }
            Error::MetadataError(msg) => {
                write!(f, "Failed to fetch video info: {msg}")
            }
            Error::MissingContentId(bvid) => {
                write!(f, "No content id (cid) found for {bvid}")
            }
            Error::ResolutionError(msg) => {
                write!(f, "Failed to resolve play url: {msg}")
            }
            Error::NoAudioStream(msg) => {
                write!(f, "No audio stream found: {msg}")
            }
            Error::TransferError(msg) => {
                write!(f, "Download failed: {msg}")
            }
            Error::IoError(err) => {
                write!(f, "I/O error: {err}")
            }
            Error::HttpError(msg) => {
                write!(f, "HTTP error: {msg}")
            }
            Error::NetworkError(msg) => {
                write!(f, "Network error: {msg}")
            }
            Error::ApiError { code, message } => {
                write!(f, "API returned code {code}: {message}")
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::IoError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::IoError(err)
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            Error::NetworkError(err.to_string())
        } else if err.is_decode() {
            Error::HttpError(format!("malformed response body: {err}"))
        } else {
            Error::HttpError(err.to_string())
        }
    }
}

/// Convenience result type for bili-audio-dl operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_classification() {
        assert!(Error::HttpError("500".to_string()).is_recoverable());
        assert!(Error::NetworkError("timed out".to_string()).is_recoverable());
        assert!(Error::ApiError { code: -404, message: "啥都木有".to_string() }.is_recoverable());
        assert!(Error::NoAudioStream("unknown shape".to_string()).is_recoverable());

        assert!(!Error::MissingContentId("BV1xx411c7mD".to_string()).is_recoverable());
        assert!(!Error::InvalidIdentifier("abc".to_string()).is_recoverable());
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope");
        assert!(!Error::IoError(io).is_recoverable());
    }

    #[test]
    fn test_display_messages() {
        let err = Error::ApiError { code: -400, message: "请求错误".to_string() };
        assert_eq!(err.to_string(), "API returned code -400: 请求错误");

        let err = Error::MissingContentId("BV1xx411c7mD".to_string());
        assert!(err.to_string().contains("BV1xx411c7mD"));
    }

    #[test]
    fn test_io_error_source() {
        use std::error::Error as _;

        let err: Error = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert!(err.source().is_some());
        assert!(Error::TransferError("403".to_string()).source().is_none());
    }
}
