//! Cookie-aware HTTP fetcher using `reqwest`.

use std::time::Duration;

use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderName, HeaderValue};

use crate::{Fetcher, Method, PageRequest, TransportError};

/// Where and how to reach the account portal.
#[derive(Debug, Clone)]
pub struct PortalConfig {
    /// Scheme and host, without a trailing path (e.g. `https://www.tibia.com`).
    pub base_url: String,
    /// Sent on every request. The portal serves different markup to
    /// unknown agents, so this mimics a mobile browser.
    pub user_agent: String,
    pub accept_language: String,
    /// Whole-request timeout.
    pub timeout: Duration,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.tibia.com".to_string(),
            user_agent: "Mozilla/5.0 (Linux; Android 6.0; Nexus 5 Build/MRA58N) \
                         AppleWebKit/537.36 (KHTML, like Gecko) \
                         Chrome/139.0.0.0 Mobile Safari/537.36"
                .to_string(),
            accept_language: "pt-BR,pt;q=0.5".to_string(),
            timeout: Duration::from_secs(15),
        }
    }
}

impl PortalConfig {
    /// Config pointing at another base URL, keeping the other defaults.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Absolute URL for a request path.
    pub fn url_for(&self, path: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        if path.starts_with('/') {
            format!("{base}{path}")
        } else {
            format!("{base}/{path}")
        }
    }
}

const ACCEPT_HTML: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8";

/// A [`Fetcher`] backed by one `reqwest::Client` whose cookie store
/// persists for the fetcher's lifetime.
pub struct HttpFetcher {
    client: reqwest::Client,
    config: PortalConfig,
}

impl HttpFetcher {
    /// Builds the client. Fails only if the TLS backend cannot initialise.
    pub fn new(config: PortalConfig) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout)
            .build()
            .map_err(TransportError::Client)?;
        tracing::debug!(base_url = %config.base_url, "http fetcher ready");
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &PortalConfig {
        &self.config
    }
}

impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: &PageRequest) -> Result<String, TransportError> {
        let url = self.config.url_for(&request.path);
        let mut builder = match request.method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
        };

        builder = builder
            .header(ACCEPT, ACCEPT_HTML)
            .header(ACCEPT_LANGUAGE, self.config.accept_language.as_str());
        for (name, value) in &request.headers {
            // Skip headers that are not valid HTTP tokens rather than failing the page.
            match (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                (Ok(name), Ok(value)) => builder = builder.header(name, value),
                _ => tracing::warn!(header = %name, "skipping malformed request header"),
            }
        }
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if request.method == Method::Post {
            builder = builder.form(&request.form);
        }

        tracing::debug!(%request, %url, "fetching page");

        let response = builder.send().await.map_err(|source| TransportError::Request {
            label: request.label.clone(),
            source,
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                label: request.label.clone(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|source| TransportError::Body {
            label: request.label.clone(),
            source,
        })?;
        tracing::debug!(label = %request.label, bytes = body.len(), "page fetched");
        Ok(body)
    }
}
