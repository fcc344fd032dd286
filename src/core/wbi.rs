//! WBI request signing
//!
//! The signed play-url endpoint requires `wts` (unix seconds) and `w_rid`
//! (md5 over the sorted query plus a mixin key derived from two key strings
//! published by the `nav` endpoint).

use md5::{Digest, Md5};

const MIXIN_KEY_ENC_TAB: [usize; 64] = [
    46, 47, 18, 2, 53, 8, 23, 32, 15, 50, 10, 31, 58, 3, 45, 35, 27, 43, 5, 49, 33, 9, 42, 19, 29,
    28, 14, 39, 12, 38, 41, 13, 37, 48, 7, 16, 24, 55, 40, 61, 26, 17, 0, 1, 60, 51, 30, 4, 22, 25,
    54, 21, 56, 59, 6, 63, 57, 62, 11, 36, 20, 34, 44, 52,
];

/// Key name from a `wbi_img` URL: last path segment without its extension
pub fn key_from_url(url: &str) -> &str {
    let file = url.rsplit('/').next().unwrap_or("");
    file.split('.').next().unwrap_or("")
}

/// Shuffle `img_key + sub_key` through the encoding table and keep 32 chars
pub fn mixin_key(img_key: &str, sub_key: &str) -> String {
    let raw: Vec<char> = format!("{img_key}{sub_key}").chars().collect();
    MIXIN_KEY_ENC_TAB
        .iter()
        .filter_map(|&index| raw.get(index))
        .take(32)
        .collect()
}

/// Sign `params` at time `wts` and return the full query string
pub fn sign_query(params: &[(&str, String)], mixin_key: &str, wts: u64) -> String {
    let mut params: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect();
    params.push(("wts".to_string(), wts.to_string()));
    params.sort_by(|a, b| a.0.cmp(&b.0));

    let query = params
        .iter()
        .map(|(k, v)| {
            let v_clean = v.replace(|c: char| "!'()*".contains(c), "");
            format!("{}={}", urlencoding::encode(k), urlencoding::encode(&v_clean))
        })
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Md5::new();
    hasher.update(format!("{query}{mixin_key}").as_bytes());
    let w_rid = format!("{:x}", hasher.finalize());

    format!("{query}&w_rid={w_rid}")
}

/// Current unix time in seconds
pub fn now_wts() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
