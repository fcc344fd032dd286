//! Stream resolution: BV id → cid → playable stream descriptor
//!
//! Resolution walks an ordered chain of [`StreamStrategy`] implementations and
//! stops at the first one that produces a descriptor. The default chain is the
//! signed play-url endpoint followed by the raw one.

use async_trait::async_trait;
use log::{debug, info, warn};

use crate::core::api::BiliClient;
use crate::core::error::{Error, Result};
use crate::core::identifier::VideoId;
use crate::core::models::{StreamDescriptor, VideoMetadata};

/// One way of turning a (bvid, cid) pair into a stream descriptor
#[async_trait]
pub trait StreamStrategy: Send + Sync {
    /// Name of the strategy (for logging)
    fn name(&self) -> &'static str;

    async fn fetch(&self, api: &BiliClient, id: &VideoId, cid: u64) -> Result<StreamDescriptor>;
}

/// Signed `wbi/playurl` request with high-quality DASH flags
pub struct SignedPlayUrl;

#[async_trait]
impl StreamStrategy for SignedPlayUrl {
    fn name(&self) -> &'static str {
        "signed play url"
    }

    async fn fetch(&self, api: &BiliClient, id: &VideoId, cid: u64) -> Result<StreamDescriptor> {
        let info = api.play_info_signed(id, cid).await?;
        StreamDescriptor::try_from(info)
    }
}

/// Unsigned `playurl` request, used when the signed endpoint misbehaves
pub struct RawPlayUrl;

#[async_trait]
impl StreamStrategy for RawPlayUrl {
    fn name(&self) -> &'static str {
        "raw play url"
    }

    async fn fetch(&self, api: &BiliClient, id: &VideoId, cid: u64) -> Result<StreamDescriptor> {
        let info = api.play_info_raw(id, cid).await?;
        StreamDescriptor::try_from(info)
    }
}

/// Everything learned while resolving one video
#[derive(Debug, Clone)]
pub struct ResolvedStream {
    pub metadata: VideoMetadata,
    pub cid: u64,
    pub descriptor: StreamDescriptor,
    /// Name of the strategy that produced `descriptor`
    pub strategy: &'static str,
}

/// Pick the cid to download: first page, then the top-level field.
///
/// A cid of 0 counts as missing wherever it comes from.
pub fn content_id(metadata: &VideoMetadata) -> Result<u64> {
    let cid = match metadata.pages.first() {
        Some(page) => Some(page.cid),
        None => metadata.cid,
    };
    cid.filter(|&cid| cid != 0)
        .ok_or_else(|| Error::MissingContentId(metadata.bvid.clone()))
}

pub struct StreamResolver {
    strategies: Vec<Box<dyn StreamStrategy>>,
}

impl Default for StreamResolver {
    fn default() -> Self {
        Self::with_strategies(vec![Box::new(SignedPlayUrl), Box::new(RawPlayUrl)])
    }
}

impl StreamResolver {
    pub fn with_strategies(strategies: Vec<Box<dyn StreamStrategy>>) -> Self {
        Self { strategies }
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Fetch metadata, choose the cid and run the strategy chain
    pub async fn resolve(&self, api: &BiliClient, id: &VideoId) -> Result<ResolvedStream> {
        let metadata = api
            .video_metadata(id)
            .await
            .map_err(|e| Error::MetadataError(e.to_string()))?;

        info!("Title: {}", metadata.title);
        info!("Author: {}", metadata.owner.name);
        info!("Duration: {}s", metadata.duration);

        let cid = content_id(&metadata)?;
        info!("Video CID: {cid}");

        let (descriptor, strategy) = self.resolve_descriptor(api, id, cid).await?;
        Ok(ResolvedStream {
            metadata,
            cid,
            descriptor,
            strategy,
        })
    }

    /// Try each strategy in order; the first descriptor wins
    pub async fn resolve_descriptor(
        &self,
        api: &BiliClient,
        id: &VideoId,
        cid: u64,
    ) -> Result<(StreamDescriptor, &'static str)> {
        let mut last_error = None;

        for strategy in &self.strategies {
            match strategy.fetch(api, id, cid).await {
                Ok(descriptor) => {
                    debug!("{} resolved {id} cid={cid}", strategy.name());
                    return Ok((descriptor, strategy.name()));
                }
                Err(e) if e.is_recoverable() => {
                    warn!("⚠️  {} failed for {id}: {e}", strategy.name());
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(match last_error {
            Some(Error::NoAudioStream(msg)) => Error::NoAudioStream(msg),
            Some(e) => Error::ResolutionError(e.to_string()),
            None => Error::ResolutionError("no stream strategies configured".to_string()),
        })
    }
}
