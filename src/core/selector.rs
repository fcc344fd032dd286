//! Audio URL selection
//!
//! DASH audio tracks win over legacy combined streams; among DASH tracks the
//! highest reported bandwidth wins, ties keeping payload order.

use crate::core::error::{Error, Result};
use crate::core::models::{AudioVariant, StreamDescriptor};

/// Pick exactly one audio URL from a descriptor
pub fn select_audio_url(descriptor: &StreamDescriptor) -> Result<String> {
    match descriptor {
        StreamDescriptor::Dash { audio } => best_variant(audio)
            .map(|variant| variant.base_url.clone())
            .ok_or_else(|| Error::NoAudioStream("dash section lists no audio tracks".to_string())),
        StreamDescriptor::Legacy { entries } => entries
            .first()
            .map(|entry| entry.url.clone())
            .ok_or_else(|| Error::NoAudioStream("durl section is empty".to_string())),
    }
}

fn best_variant(audio: &[AudioVariant]) -> Option<&AudioVariant> {
    let mut ranked: Vec<&AudioVariant> = audio.iter().collect();
    // sort_by is stable, so equal bandwidths keep their original order
    ranked.sort_by(|a, b| b.bandwidth.cmp(&a.bandwidth));
    ranked.first().copied()
}
