//! HTTP retrieval with proxy fallback.
//!
//! The shared policy for listing and article fetches: try once through a
//! randomly chosen proxy from the pool (when proxying is enabled for the
//! source), then once directly. Certificate validation is relaxed on the
//! proxy leg only; several sources sit behind interception-happy CDNs. Both
//! attempts failing means "no result", never an error the caller has to
//! handle.

use std::time::Duration;

use rand::seq::IndexedRandom;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use tracing::{debug, instrument, warn};

use crate::error::Result;

const BROWSER_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36";

fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_UA));
    headers.insert(
        ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
        ),
    );
    headers.insert(
        ACCEPT_LANGUAGE,
        HeaderValue::from_static("fa,en-US;q=0.9,en;q=0.8"),
    );
    headers
}

#[derive(Clone)]
pub struct HttpClient {
    direct: reqwest::Client,
    proxies: Vec<String>,
    proxy_enabled: bool,
    timeout: Duration,
}

impl HttpClient {
    pub fn new(timeout_secs: u64, proxy_enabled: bool, proxies: Vec<String>) -> Result<Self> {
        let timeout = Duration::from_secs(timeout_secs);
        let direct = reqwest::Client::builder()
            .default_headers(default_headers())
            .timeout(timeout)
            .build()?;
        Ok(Self {
            direct,
            proxies,
            proxy_enabled,
            timeout,
        })
    }

    /// Fetch a URL's body, proxy first when requested, direct as fallback.
    /// `None` means both attempts failed; the caller treats that as "zero
    /// items", never as fatal.
    #[instrument(level = "debug", skip(self))]
    pub async fn get_text(&self, url: &str, use_proxy: bool) -> Option<String> {
        if use_proxy && self.proxy_enabled {
            if let Some(proxy_url) = self.proxies.choose(&mut rand::rng()) {
                match self.proxy_request(url, proxy_url).await {
                    Ok(text) => {
                        debug!(%url, "Fetched via proxy");
                        return Some(text);
                    }
                    Err(e) => {
                        warn!(%url, error = %e, "Proxy request failed; retrying direct");
                    }
                }
            }
        }

        match self.direct_request(url).await {
            Ok(text) => Some(text),
            Err(e) => {
                warn!(%url, error = %e, "Direct request failed");
                None
            }
        }
    }

    async fn direct_request(&self, url: &str) -> reqwest::Result<String> {
        let response = self.direct.get(url).send().await?.error_for_status()?;
        response.text().await
    }

    async fn proxy_request(&self, url: &str, proxy_url: &str) -> reqwest::Result<String> {
        // A fresh client per request so each request can pick a different
        // pool entry. Cheap at this volume.
        let client = reqwest::Client::builder()
            .default_headers(default_headers())
            .timeout(self.timeout)
            .proxy(reqwest::Proxy::all(proxy_url)?)
            .danger_accept_invalid_certs(true)
            .build()?;
        let response = client.get(url).send().await?.error_for_status()?;
        response.text().await
    }
}
