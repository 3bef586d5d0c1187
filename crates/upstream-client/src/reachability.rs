use async_trait::async_trait;
use market_core::ReachabilityChecker;
use reqwest::{Client, StatusCode};

/// Probes a URL with a plain GET; only a final HTTP 200 counts.
#[derive(Clone)]
pub struct HttpReachability {
    client: Client,
}

impl HttpReachability {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ReachabilityChecker for HttpReachability {
    async fn is_reachable(&self, url: &str) -> bool {
        match self.client.get(url).send().await {
            Ok(response) if response.status() == StatusCode::OK => true,
            Ok(response) => {
                tracing::debug!("Status is {} for {}", response.status(), url);
                false
            }
            Err(e) => {
                tracing::debug!("Error while probing {}: {}", url, e);
                false
            }
        }
    }
}
