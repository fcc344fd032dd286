//! BV id parsing
//!
//! Accepts a bare BV id or any URL containing one, and splits batch input.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::core::error::{Error, Result};

static BVID_EXACT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^BV[0-9A-Za-z]{10}$").expect("valid BV id pattern"));

static BVID_EMBEDDED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"BV[0-9A-Za-z]{10}").expect("valid BV id pattern"));

/// Public identifier of a Bilibili video, e.g. `BV1xx411c7mD`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VideoId(String);

impl VideoId {
    /// Parse user input.
    ///
    /// Anything that starts with `http` is treated as a URL and searched for an
    /// embedded id; everything else must be an exact BV id.
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();

        if input.starts_with("http") {
            return BVID_EMBEDDED
                .find(input)
                .map(|m| VideoId(m.as_str().to_string()))
                .ok_or_else(|| Error::InvalidIdentifier(input.to_string()));
        }

        if BVID_EXACT.is_match(input) {
            Ok(VideoId(input.to_string()))
        } else {
            Err(Error::InvalidIdentifier(input.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Split a comma-separated batch list, dropping blank entries.
///
/// Entries are returned raw so each one can fail validation on its own.
pub fn split_batch_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}
