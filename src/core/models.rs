//! Wire and domain types
//!
//! The `Deserialize` structs mirror the JSON the platform returns;
//! [`StreamDescriptor`] is the normalized form the selector works on.

use serde::Deserialize;

use crate::core::error::{Error, Result};

/// Standard envelope around every API payload
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub code: i64,

    #[serde(default)]
    pub message: String,

    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// Unwrap `data` when `code == 0`, otherwise surface the platform message
    pub fn into_data(self) -> Result<T> {
        if self.code != 0 {
            return Err(Error::ApiError {
                code: self.code,
                message: self.message,
            });
        }
        self.data.ok_or_else(|| Error::ApiError {
            code: self.code,
            message: "response carried no data".to_string(),
        })
    }
}

/// Uploader of a video
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Owner {
    #[serde(default)]
    pub mid: u64,
    pub name: String,
}

/// One playable part of a (possibly multi-part) video
#[derive(Debug, Clone, Deserialize)]
pub struct Page {
    pub cid: u64,

    #[serde(default)]
    pub page: u32,

    #[serde(default)]
    pub part: String,

    #[serde(default)]
    pub duration: u64,
}

/// Descriptive metadata from the `view` endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct VideoMetadata {
    pub bvid: String,
    pub title: String,

    #[serde(default)]
    pub owner: Owner,

    /// Total length in seconds
    #[serde(default)]
    pub duration: u64,

    /// cid of the default part; older payloads only carry this one
    #[serde(default)]
    pub cid: Option<u64>,

    #[serde(default)]
    pub pages: Vec<Page>,
}

/// One audio-only DASH representation
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AudioVariant {
    #[serde(default)]
    pub id: u32,

    /// Reported bitrate in bits per second
    #[serde(default)]
    pub bandwidth: u64,

    #[serde(rename = "baseUrl", alias = "base_url")]
    pub base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DashInfo {
    /// `null` on videos without a separate audio track
    #[serde(default)]
    pub audio: Option<Vec<AudioVariant>>,
}

/// One combined audio/video segment of the legacy (FLV/MP4) format
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LegacyEntry {
    pub url: String,

    #[serde(default)]
    pub order: u32,

    #[serde(default)]
    pub size: u64,
}

/// Raw `data` payload of both play-url endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct PlayInfo {
    #[serde(default)]
    pub dash: Option<DashInfo>,

    #[serde(default)]
    pub durl: Option<Vec<LegacyEntry>>,
}

/// Playable-stream descriptor in one of the two shapes the platform uses
#[derive(Debug, Clone, PartialEq)]
pub enum StreamDescriptor {
    /// Separate audio tracks at several bitrates
    Dash { audio: Vec<AudioVariant> },

    /// Combined audio/video files only
    Legacy { entries: Vec<LegacyEntry> },
}

impl TryFrom<PlayInfo> for StreamDescriptor {
    type Error = Error;

    fn try_from(info: PlayInfo) -> Result<Self> {
        let dash_audio = info.dash.map(|dash| dash.audio.unwrap_or_default());

        match (dash_audio, info.durl) {
            (Some(audio), _) if !audio.is_empty() => Ok(StreamDescriptor::Dash { audio }),
            (_, Some(entries)) if !entries.is_empty() => Ok(StreamDescriptor::Legacy { entries }),
            (Some(audio), _) => Ok(StreamDescriptor::Dash { audio }),
            (None, Some(entries)) => Ok(StreamDescriptor::Legacy { entries }),
            (None, None) => Err(Error::NoAudioStream(
                "play info has neither a dash nor a durl section".to_string(),
            )),
        }
    }
}
