use std::thread;
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use tracing::{debug, warn};

use crate::config::FeedUrls;
use crate::domain::Metric;
use crate::error::DashboardError;

/// Boundary to the remote CSV feeds. The dataset loader only sees this
/// trait; tests substitute an in-memory implementation.
pub trait FeedClient: Send + Sync {
    fn fetch_table(&self, metric: Metric) -> Result<String, DashboardError>;
    fn fetch_lookup(&self) -> Result<String, DashboardError>;
}

#[derive(Clone)]
pub struct HttpFeedClient {
    client: Client,
    urls: FeedUrls,
}

impl HttpFeedClient {
    pub fn new(urls: FeedUrls, timeout: Duration) -> Result<Self, DashboardError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("covidview/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| DashboardError::FeedHttp(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|err| DashboardError::FeedHttp(err.to_string()))?;
        Ok(Self { client, urls })
    }

    fn fetch_text(&self, url: &str) -> Result<String, DashboardError> {
        const MAX_RETRIES: usize = 3;
        const BASE_DELAY_MS: u64 = 200;

        let mut attempt = 0usize;
        loop {
            attempt += 1;
            debug!(url, attempt, "feed request");
            let outcome = self.client.get(url).send();
            match outcome {
                Ok(response) if response.status().is_success() => {
                    return response
                        .text()
                        .map_err(|err| DashboardError::FeedHttp(err.to_string()));
                }
                Ok(response) => {
                    let status = response.status();
                    if attempt < MAX_RETRIES && retryable(status) {
                        warn!(url, status = status.as_u16(), attempt, "retrying feed request");
                        thread::sleep(Duration::from_millis(
                            BASE_DELAY_MS << (attempt - 1) as u64,
                        ));
                        continue;
                    }
                    let message = response
                        .text()
                        .unwrap_or_else(|_| "feed request failed".to_string());
                    return Err(DashboardError::FeedStatus {
                        status: status.as_u16(),
                        message,
                    });
                }
                Err(err) => {
                    if attempt < MAX_RETRIES {
                        warn!(url, attempt, error = %err, "retrying feed request");
                        thread::sleep(Duration::from_millis(
                            BASE_DELAY_MS << (attempt - 1) as u64,
                        ));
                        continue;
                    }
                    return Err(DashboardError::FeedHttp(err.to_string()));
                }
            }
        }
    }
}

fn retryable(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
}

impl FeedClient for HttpFeedClient {
    fn fetch_table(&self, metric: Metric) -> Result<String, DashboardError> {
        self.fetch_text(self.urls.for_metric(metric))
    }

    fn fetch_lookup(&self) -> Result<String, DashboardError> {
        self.fetch_text(&self.urls.lookup)
    }
}
