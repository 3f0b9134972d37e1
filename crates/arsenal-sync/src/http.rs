//! HTTP profile source for the public player profile API.

use std::time::Duration;

use arsenal_core::{Platform, ProfileSnapshot};
use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use tracing::info;

use crate::source::{FetchError, ProfileSource};

/// Fetches snapshots from `{base_url}/profile/{platform}/{natural_id}`.
pub struct HttpProfileSource {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpProfileSource {
    /// Create a source for the given base URL, e.g. `https://api.example.net`.
    ///
    /// `timeout` bounds each whole request; the engine itself imposes none.
    pub fn new(base_url: String, timeout: Duration) -> Result<Self, FetchError> {
        let base_url = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|e| FetchError::InvalidUrl(format!("{base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(FetchError::InvalidUrl(base_url.into()));
        }
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base_url })
    }

    /// Each part is pushed as its own path segment, so ids containing
    /// `/`, `?` or spaces are percent-encoded.
    fn profile_url(&self, natural_id: &str, platform: Platform) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["profile", platform.as_str(), natural_id]);
        }
        url
    }
}

fn status_error(status: StatusCode, body: String) -> FetchError {
    match status {
        StatusCode::TOO_MANY_REQUESTS => FetchError::RateLimited,
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => FetchError::ProfilePrivate,
        _ => FetchError::Server {
            status: status.as_u16(),
            body,
        },
    }
}

#[async_trait]
impl ProfileSource for HttpProfileSource {
    async fn fetch(
        &self,
        natural_id: &str,
        platform: Platform,
    ) -> Result<ProfileSnapshot, FetchError> {
        let url = self.profile_url(natural_id, platform);

        info!(url = %url, "fetching player profile");
        let resp = self.client.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(status_error(status, body));
        }

        let text = resp.text().await?;
        let snapshot: ProfileSnapshot = serde_json::from_str(&text)?;
        info!(
            items = snapshot.xp.len(),
            missions = snapshot.missions.len(),
            "fetched player profile"
        );
        Ok(snapshot)
    }
}
