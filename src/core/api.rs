//! Bilibili JSON API client
//!
//! Thin wrapper over `reqwest` that adds the platform headers, the optional
//! login cookie and a per-request timeout to every call.

use std::time::Duration;

use log::debug;
use reqwest::header::{COOKIE, ORIGIN, REFERER};
use reqwest::{Client, ClientBuilder, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::core::credential::Credential;
use crate::core::error::{Error, Result};
use crate::core::identifier::VideoId;
use crate::core::models::{ApiResponse, PlayInfo, VideoMetadata};
use crate::core::source::ApiConfig;
use crate::core::wbi;

#[derive(Debug, Deserialize)]
struct NavData {
    wbi_img: WbiImg,
}

#[derive(Debug, Deserialize)]
struct WbiImg {
    img_url: String,
    sub_url: String,
}

/// Client for the metadata and play-url endpoints
pub struct BiliClient {
    client: Client,
    config: ApiConfig,
    credential: Option<Credential>,
    timeout: Duration,
}

impl BiliClient {
    /// Create a client; `timeout` bounds each API request end to end
    pub fn new(config: ApiConfig, credential: Option<Credential>, timeout: Duration) -> Result<Self> {
        let client = ClientBuilder::new()
            .connect_timeout(timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| Error::NetworkError(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            config,
            credential,
            timeout,
        })
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    pub fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }

    fn get(&self, url: &str) -> RequestBuilder {
        let request = self
            .client
            .get(url)
            .timeout(self.timeout)
            .header(REFERER, &self.config.site_origin)
            .header(ORIGIN, &self.config.site_origin);

        match &self.credential {
            Some(credential) => request.header(COOKIE, credential.cookie_header()),
            None => request,
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<ApiResponse<T>> {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::HttpError(format!("{status} from {}", response.url().path())));
        }
        Ok(response.json().await?)
    }

    /// Fetch title, uploader, duration and pages for a video
    pub async fn video_metadata(&self, id: &VideoId) -> Result<VideoMetadata> {
        let request = self.get(&self.config.view_url()).query(&[("bvid", id.as_str())]);
        self.get_json::<VideoMetadata>(request).await?.into_data()
    }

    /// Fetch the current WBI mixin key
    pub async fn wbi_mixin_key(&self) -> Result<String> {
        // nav reports -101 to anonymous callers but still publishes the keys
        let response: ApiResponse<NavData> = self.get_json(self.get(&self.config.nav_url())).await?;
        let code = response.code;
        let nav = response.data.ok_or_else(|| Error::ApiError {
            code,
            message: format!("nav carried no wbi keys: {}", response.message),
        })?;

        let key = wbi::mixin_key(
            wbi::key_from_url(&nav.wbi_img.img_url),
            wbi::key_from_url(&nav.wbi_img.sub_url),
        );
        if key.len() < 32 {
            return Err(Error::ApiError {
                code,
                message: "nav returned malformed wbi keys".to_string(),
            });
        }
        Ok(key)
    }

    /// Signed stream-info request, as the web player makes it
    pub async fn play_info_signed(&self, id: &VideoId, cid: u64) -> Result<PlayInfo> {
        let mixin_key = self.wbi_mixin_key().await?;
        let params = [
            ("bvid", id.to_string()),
            ("cid", cid.to_string()),
            ("qn", "127".to_string()),
            ("fnval", "4048".to_string()),
            ("fnver", "0".to_string()),
            ("fourk", "1".to_string()),
        ];
        let query = wbi::sign_query(&params, &mixin_key, wbi::now_wts());
        let url = format!("{}?{query}", self.config.wbi_playurl_url());
        debug!("Signed play url request for {id} cid={cid}");

        self.get_json::<PlayInfo>(self.get(&url)).await?.into_data()
    }

    /// Unsigned legacy stream-info request
    pub async fn play_info_raw(&self, id: &VideoId, cid: u64) -> Result<PlayInfo> {
        let cid = cid.to_string();
        let request = self.get(&self.config.playurl_url()).query(&[
            ("bvid", id.as_str()),
            ("cid", cid.as_str()),
            ("qn", "0"),
            ("fnval", "16"),
            ("fourk", "1"),
        ]);

        self.get_json::<PlayInfo>(request).await?.into_data()
    }
}
