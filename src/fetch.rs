// src/fetch.rs
use async_trait::async_trait;
use metrics::counter;
use reqwest::Client;
use std::time::Duration;

use crate::config::WatcherConfig;
use crate::error::FetchError;

/// Where the listing markup comes from.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch_page(&self) -> Result<String, FetchError>;
    fn url(&self) -> &str;
}

/// Single GET with a fixed user agent and timeout. No retries.
#[derive(Clone)]
pub struct HttpPageSource {
    url: String,
    client: Client,
    timeout: Duration,
}

impl HttpPageSource {
    pub fn new(cfg: &WatcherConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(cfg.user_agent.clone())
            .timeout(cfg.timeout())
            .build()
            .map_err(FetchError::Client)?;
        Ok(Self {
            url: cfg.page_url.clone(),
            client,
            timeout: cfg.timeout(),
        })
    }

    fn transport_error(&self, e: reqwest::Error) -> FetchError {
        if e.is_timeout() {
            FetchError::Timeout {
                url: self.url.clone(),
                secs: self.timeout.as_secs(),
            }
        } else {
            FetchError::Transport {
                url: self.url.clone(),
                source: e,
            }
        }
    }
}

#[async_trait]
impl PageSource for HttpPageSource {
    async fn fetch_page(&self) -> Result<String, FetchError> {
        let result: Result<String, FetchError> = async {
            let resp = self
                .client
                .get(&self.url)
                .send()
                .await
                .map_err(|e| self.transport_error(e))?;

            let status = resp.status();
            if !status.is_success() {
                return Err(FetchError::Status {
                    url: self.url.clone(),
                    status: status.as_u16(),
                });
            }

            let body = resp.text().await.map_err(|e| self.transport_error(e))?;
            tracing::debug!(url = %self.url, status = status.as_u16(), bytes = body.len(), "page fetched");
            Ok(body)
        }
        .await;

        if let Err(e) = &result {
            tracing::warn!(error = %e, url = %self.url, "page fetch failed");
            counter!("watch_fetch_errors_total").increment(1);
        }
        result
    }

    fn url(&self) -> &str {
        &self.url
    }
}

/// Serves markup held in memory; used for tests and offline runs.
pub struct FixturePageSource {
    url: String,
    html: String,
}

impl FixturePageSource {
    pub fn from_fixture_str(url: &str, html: &str) -> Self {
        Self {
            url: url.to_string(),
            html: html.to_string(),
        }
    }
}

#[async_trait]
impl PageSource for FixturePageSource {
    async fn fetch_page(&self) -> Result<String, FetchError> {
        Ok(self.html.clone())
    }

    fn url(&self) -> &str {
        &self.url
    }
}
