//! Integration tests for bili-audio-dl
//!
//! Every test runs against a local wiremock server standing in for both the
//! Bilibili API and the audio CDN, so no network access is needed.

use std::path::Path;
use std::time::Duration;

use bili_audio_dl::{
    ApiConfig, AudioDownloader, DownloadConfig, Error, OverwriteBehavior, PostProcessAction,
    PostProcessor,
};
use serde_json::json;
use tempfile::tempdir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const BVID: &str = "BV1xx411c7mD";
const AUDIO_BYTES: &[u8] = b"\x00\x00\x00\x18ftypM4A fake audio payload";

/// Mount metadata, a failing signed endpoint, a working raw endpoint and the CDN file
async fn mount_platform(server: &MockServer, play_data: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/x/web-interface/view"))
        .and(query_param("bvid", BVID))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 0,
            "message": "0",
            "data": {
                "bvid": BVID,
                "title": "Test Video",
                "owner": {"mid": 1, "name": "uploader"},
                "duration": 61,
                "pages": [{"cid": 12345, "page": 1, "part": "P1"}]
            }
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/x/web-interface/nav"))
        .respond_with(ResponseTemplate::new(500))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/x/player/playurl"))
        .and(query_param("bvid", BVID))
        .and(query_param("cid", "12345"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"code": 0, "data": play_data})))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/cdn/a.m4a"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(AUDIO_BYTES.to_vec(), "audio/mp4"))
        .mount(server)
        .await;
}

fn dash_payload(server: &MockServer) -> serde_json::Value {
    json!({"dash": {"audio": [{"bandwidth": 128000, "baseUrl": format!("{}/cdn/a.m4a", server.uri())}]}})
}

fn config_for(server: &MockServer, output_dir: &Path) -> DownloadConfig {
    DownloadConfig {
        output_dir: output_dir.to_path_buf(),
        api: ApiConfig::default().with_api_base_url(server.uri()),
        timeout: Duration::from_secs(5),
        ..Default::default()
    }
}

fn downloader_for(config: DownloadConfig) -> AudioDownloader {
    // The m4a path must never reach the transcoder; a bogus binary proves it
    AudioDownloader::new(config)
        .unwrap()
        .with_postprocessor(PostProcessor::default().with_transcoder("/nonexistent/bin/ffmpeg"))
}

#[tokio::test]
async fn test_fallback_download_and_rename() {
    let server = MockServer::start().await;
    mount_platform(&server, dash_payload(&server)).await;
    let dir = tempdir().unwrap();

    let downloader = downloader_for(config_for(&server, dir.path()));
    let report = downloader.download_audio(BVID, None).await.unwrap();

    assert_eq!(report.plan.cid, 12345);
    assert_eq!(report.plan.strategy, "raw play url");
    assert_eq!(report.plan.audio_url, format!("{}/cdn/a.m4a", server.uri()));
    assert_eq!(report.plan.output_path, dir.path().join("Test Video.m4a"));
    assert_eq!(report.bytes, AUDIO_BYTES.len() as u64);

    let outcome = report.postprocess.unwrap();
    assert_eq!(outcome.action, PostProcessAction::Renamed);
    assert_eq!(report.path, dir.path().join("Test Video.mp3"));
    assert!(!dir.path().join("Test Video.m4a").exists());
    assert_eq!(std::fs::read(&report.path).unwrap(), AUDIO_BYTES);
}

#[tokio::test]
async fn test_legacy_stream_download() {
    let server = MockServer::start().await;
    let play_data = json!({"durl": [{"order": 1, "url": format!("{}/cdn/a.m4a", server.uri())}]});
    mount_platform(&server, play_data).await;
    let dir = tempdir().unwrap();

    let config = DownloadConfig {
        convert: false,
        ..config_for(&server, dir.path())
    };
    let report = downloader_for(config).download_audio(BVID, None).await.unwrap();

    assert!(report.postprocess.is_none());
    assert_eq!(report.path, dir.path().join("Test Video.m4a"));
    assert!(report.path.exists());
}

#[tokio::test]
async fn test_empty_stream_descriptor_fails_without_download() {
    let server = MockServer::start().await;
    mount_platform(&server, json!({"dash": {"audio": []}})).await;
    let dir = tempdir().unwrap();

    let result = downloader_for(config_for(&server, dir.path())).download_audio(BVID, None).await;

    assert!(matches!(result, Err(Error::NoAudioStream(_))), "got {result:?}");
    assert!(!dir.path().join("Test Video.m4a").exists());
}

#[tokio::test]
async fn test_no_clobber_keeps_existing_file() {
    let server = MockServer::start().await;
    mount_platform(&server, dash_payload(&server)).await;
    let dir = tempdir().unwrap();
    let existing = dir.path().join("Test Video.m4a");
    std::fs::write(&existing, "keep me").unwrap();

    let config = DownloadConfig {
        overwrite: OverwriteBehavior::NeverOverwrite,
        ..config_for(&server, dir.path())
    };
    let ok = downloader_for(config).download_one(BVID, None).await;

    assert!(!ok);
    assert_eq!(std::fs::read_to_string(&existing).unwrap(), "keep me");
}

#[tokio::test]
async fn test_cli_dry_run_prints_plan() {
    let server = MockServer::start().await;
    mount_platform(&server, dash_payload(&server)).await;
    let dir = tempdir().unwrap();

    let output = tokio::process::Command::new(env!("CARGO_BIN_EXE_bili-audio-dl"))
        .arg(format!("https://www.bilibili.com/video/{BVID}/"))
        .arg("--dry-run")
        .arg("--api-base")
        .arg(server.uri())
        .arg("--output-dir")
        .arg(dir.path())
        .output()
        .await
        .expect("Failed to run dry-run command");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "dry run should succeed: {stdout}");
    assert!(stdout.contains("DRY RUN"), "Expected DRY RUN indicator: {stdout}");
    assert!(stdout.contains("Test Video"), "Expected title in output: {stdout}");
    assert!(stdout.contains("/cdn/a.m4a"), "Expected audio url in output: {stdout}");
    assert!(!dir.path().join("Test Video.m4a").exists(), "dry run must not download");
}

#[tokio::test]
async fn test_cli_invalid_identifier_fails() {
    let dir = tempdir().unwrap();

    let output = tokio::process::Command::new(env!("CARGO_BIN_EXE_bili-audio-dl"))
        .arg("not-a-video")
        .arg("--api-base")
        .arg("http://127.0.0.1:9")
        .arg("--output-dir")
        .arg(dir.path())
        .output()
        .await
        .expect("Failed to run command");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(!output.status.success());
    assert!(stdout.contains("not a BV id"), "Expected identifier diagnostic: {stdout}");
}
