//! Endpoint configuration and output naming for bili-audio-dl
//!
//! Holds the platform base URLs, the browser-like headers the platform insists
//! on, and the title-to-filename rules.

use once_cell::sync::Lazy;
use regex::Regex;

/// Desktop browser user agent; the platform rejects obvious bots
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Site origin sent as Referer/Origin on API and CDN requests
pub const SITE_ORIGIN: &str = "https://www.bilibili.com";

/// Maximum title length (in characters) kept in the output filename
pub const MAX_TITLE_CHARS: usize = 100;

/// Extension of the downloaded, not yet post-processed file
pub const DOWNLOAD_EXTENSION: &str = "m4a";

/// File stem used when nothing of the title survives sanitizing
pub const FALLBACK_STEM: &str = "audio";

static ILLEGAL_FILENAME_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[\\/*?:"<>|]"#).expect("valid filename pattern"));

/// Configuration for the platform endpoints
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL of the JSON API
    pub api_base_url: String,

    /// Value used for both `Referer` and `Origin`
    pub site_origin: String,

    /// `User-Agent` header value
    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.bilibili.com".to_string(),
            site_origin: SITE_ORIGIN.to_string(),
            user_agent: USER_AGENT.to_string(),
        }
    }
}

impl ApiConfig {
    /// Point every API call at another host, e.g. a mock server
    pub fn with_api_base_url(mut self, base: impl Into<String>) -> Self {
        self.api_base_url = base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn view_url(&self) -> String {
        format!("{}/x/web-interface/view", self.api_base_url)
    }

    pub fn nav_url(&self) -> String {
        format!("{}/x/web-interface/nav", self.api_base_url)
    }

    pub fn wbi_playurl_url(&self) -> String {
        format!("{}/x/player/wbi/playurl", self.api_base_url)
    }

    pub fn playurl_url(&self) -> String {
        format!("{}/x/player/playurl", self.api_base_url)
    }
}

/// Strip characters that are illegal in filenames and cap the length
pub fn sanitize_title(title: &str) -> String {
    let cleaned = ILLEGAL_FILENAME_CHARS.replace_all(title, "");
    cleaned.chars().take(MAX_TITLE_CHARS).collect()
}

/// Generates the download filename for a video title
pub fn resolve_output_filename(title: &str) -> String {
    let stem = sanitize_title(title);
    let stem = if stem.trim().is_empty() { FALLBACK_STEM } else { stem.as_str() };
    format!("{stem}.{DOWNLOAD_EXTENSION}")
}
