use arsenal_core::{Platform, ProfileSnapshot};
use async_trait::async_trait;
use thiserror::Error;

/// Why a profile could not be fetched. Every variant aborts reconciliation
/// before anything is written.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("the profile service is rate limiting requests; try again in a few minutes")]
    RateLimited,

    #[error("profile is private or inaccessible; make it public in-game and retry")]
    ProfilePrivate,

    #[error("invalid profile service URL: {0}")]
    InvalidUrl(String),

    #[error("profile service returned {status}: {body}")]
    Server { status: u16, body: String },

    #[cfg(feature = "http")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FetchError {
    /// Stable failure kind: `rate-limited`, `profile-private`, or `transport`.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RateLimited => "rate-limited",
            Self::ProfilePrivate => "profile-private",
            _ => "transport",
        }
    }
}

/// Where account snapshots come from.
#[async_trait]
pub trait ProfileSource: Send + Sync {
    async fn fetch(
        &self,
        natural_id: &str,
        platform: Platform,
    ) -> Result<ProfileSnapshot, FetchError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds() {
        assert_eq!(FetchError::RateLimited.kind(), "rate-limited");
        assert_eq!(FetchError::ProfilePrivate.kind(), "profile-private");
        let server = FetchError::Server {
            status: 502,
            body: "bad gateway".into(),
        };
        assert_eq!(server.kind(), "transport");
        assert!(server.to_string().contains("502"));
    }
}
