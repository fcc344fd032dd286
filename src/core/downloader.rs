//! Audio transfer for bili-audio-dl
//!
//! Single-connection streaming GET straight to disk. The CDN refuses requests
//! that do not look like they come from the site, so Referer and Origin are
//! always sent.

use std::path::Path;
use std::time::Duration;

use log::{debug, warn};
use reqwest::header::{ORIGIN, REFERER};
use reqwest::{Client, ClientBuilder};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use crate::core::error::{Error, Result};
use crate::core::source::ApiConfig;
use crate::core::stream::{create_http_stream, percent, DownloadOptions, OverwriteBehavior};

/// Check if destination file exists and apply the overwrite behavior
fn check_overwrite_permission(file_path: &Path, behavior: OverwriteBehavior) -> Result<()> {
    if !file_path.exists() {
        return Ok(());
    }

    match behavior {
        OverwriteBehavior::Overwrite => {
            warn!("⚠️  Overwriting existing file: {}", file_path.display());
            Ok(())
        }
        OverwriteBehavior::NeverOverwrite => Err(Error::IoError(std::io::Error::new(
            std::io::ErrorKind::AlreadyExists,
            format!("File already exists: {} (drop --no-clobber to overwrite)", file_path.display()),
        ))),
    }
}

/// Downloads resolved audio URLs to local files
pub struct Downloader {
    client: Client,
    config: ApiConfig,
}

impl Downloader {
    /// `connect_timeout` bounds connection setup only, never the body transfer
    pub fn new(config: ApiConfig, connect_timeout: Duration) -> Result<Self> {
        let client = ClientBuilder::new()
            .connect_timeout(connect_timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| Error::NetworkError(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    /// Download `url` into `file_path`, returning the number of bytes written.
    ///
    /// On error the file may be left partially written.
    pub async fn download_to_file(
        &self,
        url: &str,
        file_path: &Path,
        options: &DownloadOptions,
    ) -> Result<u64> {
        check_overwrite_permission(file_path, options.overwrite)?;

        let response = self
            .client
            .get(url)
            .header(REFERER, &self.config.site_origin)
            .header(ORIGIN, &self.config.site_origin)
            .send()
            .await
            .map_err(|e| Error::TransferError(format!("request to audio CDN failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::TransferError(format!("audio CDN answered {status}")));
        }

        let total_size = response.content_length().filter(|&len| len > 0);
        debug!("Content length: {total_size:?}");

        let mut file = tokio::fs::File::create(file_path).await?;
        let mut stream = create_http_stream(response);
        let mut buffer = vec![0u8; options.buffer_size.max(1)];
        let mut downloaded = 0u64;

        loop {
            let bytes_read = stream
                .read(&mut buffer)
                .await
                .map_err(|e| Error::TransferError(format!("stream read error: {e}")))?;

            if bytes_read == 0 {
                break;
            }

            file.write_all(&buffer[..bytes_read]).await?;
            downloaded += bytes_read as u64;

            if let (Some(total), Some(progress)) = (total_size, options.progress.as_ref()) {
                progress(downloaded, total);
            }
            if let Some(pct) = percent(downloaded, total_size) {
                debug!("Progress: {pct:.1}% ({downloaded}/{} bytes)", total_size.unwrap_or_default());
            }
        }

        file.flush().await?;
        Ok(downloaded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tempfile::tempdir;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn downloader() -> Downloader {
        Downloader::new(ApiConfig::default(), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_download_writes_file_and_reports_progress() {
        let mock_server = MockServer::start().await;
        let test_data = b"A".repeat(20 * 1024);
        let total_size = test_data.len() as u64;

        Mock::given(method("GET"))
            .and(path("/upgcxcode/a.m4s"))
            .and(header("referer", "https://www.bilibili.com"))
            .and(header("origin", "https://www.bilibili.com"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-length", total_size.to_string().as_str())
                    .set_body_raw(test_data.clone(), "audio/mp4"),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let dir = tempdir().unwrap();
        let file_path = dir.path().join("out.m4a");

        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);
        let options = DownloadOptions {
            progress: Some(Arc::new(move |downloaded, total| {
                seen_clone.lock().unwrap().push((downloaded, total));
            })),
            ..Default::default()
        };

        let url = format!("{}/upgcxcode/a.m4s", mock_server.uri());
        let written = downloader().download_to_file(&url, &file_path, &options).await.unwrap();

        assert_eq!(written, total_size);
        assert_eq!(std::fs::read(&file_path).unwrap(), test_data);

        let seen = seen.lock().unwrap();
        assert!(!seen.is_empty(), "progress should be reported when length is known");
        assert!(seen.windows(2).all(|w| w[0].0 < w[1].0), "progress must be monotonic");
        assert_eq!(*seen.last().unwrap(), (total_size, total_size));
    }

    /// Serve one response without Content-Length, closing the connection to end the body
    async fn serve_without_length(body: Vec<u8>) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        use tokio::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut chunk = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&chunk[..n]);
            }
            socket
                .write_all(b"HTTP/1.1 200 OK\r\nContent-Type: audio/mp4\r\nConnection: close\r\n\r\n")
                .await
                .unwrap();
            socket.write_all(&body).await.unwrap();
            socket.shutdown().await.unwrap();
        });
        format!("http://{addr}/a.m4s")
    }

    #[tokio::test]
    async fn test_unknown_length_skips_progress() {
        let test_data = b"B".repeat(20 * 1024);
        let url = serve_without_length(test_data.clone()).await;

        let dir = tempdir().unwrap();
        let file_path = dir.path().join("out.m4a");

        let calls = Arc::new(Mutex::new(0usize));
        let calls_clone = Arc::clone(&calls);
        let options = DownloadOptions {
            progress: Some(Arc::new(move |_, _| {
                *calls_clone.lock().unwrap() += 1;
            })),
            ..Default::default()
        };

        let written = downloader().download_to_file(&url, &file_path, &options).await.unwrap();

        assert_eq!(written, test_data.len() as u64);
        assert_eq!(std::fs::read(&file_path).unwrap(), test_data);
        assert_eq!(*calls.lock().unwrap(), 0, "no progress without a declared length");
    }

    #[tokio::test]
    async fn test_non_success_status_is_transfer_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&mock_server)
            .await;

        let dir = tempdir().unwrap();
        let file_path = dir.path().join("out.m4a");
        let url = format!("{}/forbidden.m4s", mock_server.uri());
        let result = downloader().download_to_file(&url, &file_path, &DownloadOptions::default()).await;

        match result {
            Err(Error::TransferError(msg)) => assert!(msg.contains("403")),
            other => panic!("Expected TransferError, got {other:?}"),
        }
        assert!(!file_path.exists(), "no file is created before a successful status");
    }

    #[tokio::test]
    async fn test_unwritable_destination_is_io_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(b"data".to_vec(), "audio/mp4"))
            .mount(&mock_server)
            .await;

        let dir = tempdir().unwrap();
        let file_path = dir.path().join("missing-dir").join("out.m4a");
        let url = format!("{}/a.m4s", mock_server.uri());
        let result = downloader().download_to_file(&url, &file_path, &DownloadOptions::default()).await;

        assert!(matches!(result, Err(Error::IoError(_))));
    }

    #[test]
    fn test_overwrite_allowed_by_default() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("existing.m4a");
        std::fs::write(&file_path, "existing content").unwrap();

        assert!(check_overwrite_permission(&file_path, OverwriteBehavior::Overwrite).is_ok());
    }

    #[test]
    fn test_never_overwrite_existing_file() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("existing.m4a");
        std::fs::write(&file_path, "existing content").unwrap();

        match check_overwrite_permission(&file_path, OverwriteBehavior::NeverOverwrite) {
            Err(Error::IoError(io_err)) => {
                assert_eq!(io_err.kind(), std::io::ErrorKind::AlreadyExists);
                assert!(io_err.to_string().contains("--no-clobber"));
            }
            other => panic!("Expected IoError with AlreadyExists kind, got {other:?}"),
        }

        let fresh = dir.path().join("fresh.m4a");
        assert!(check_overwrite_permission(&fresh, OverwriteBehavior::NeverOverwrite).is_ok());
    }
}
