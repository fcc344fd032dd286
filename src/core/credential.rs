//! Login cookies attached to outbound requests

/// Browser cookie tokens for a logged-in session.
///
/// Only needed for member-only or login-gated videos.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub sessdata: String,
    pub bili_jct: String,
    pub buvid3: String,
}

impl Credential {
    /// Build a credential, or `None` when every token is empty.
    pub fn from_parts(
        sessdata: Option<String>,
        bili_jct: Option<String>,
        buvid3: Option<String>,
    ) -> Option<Self> {
        let clean = |token: Option<String>| token.map(|t| t.trim().to_string()).unwrap_or_default();
        let credential = Self {
            sessdata: clean(sessdata),
            bili_jct: clean(bili_jct),
            buvid3: clean(buvid3),
        };

        if credential.sessdata.is_empty() && credential.bili_jct.is_empty() && credential.buvid3.is_empty() {
            None
        } else {
            Some(credential)
        }
    }

    /// `Cookie` header value; empty tokens are left out
    pub fn cookie_header(&self) -> String {
        [
            ("SESSDATA", &self.sessdata),
            ("bili_jct", &self.bili_jct),
            ("buvid3", &self.buvid3),
        ]
        .iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(name, value)| format!("{name}={value}"))
        .collect::<Vec<_>>()
        .join("; ")
    }
}
