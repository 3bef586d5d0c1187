mod fetch;
mod reachability;

pub use fetch::{build_url, fetch_upstream, mask_secret, redact_url};
pub use reachability::HttpReachability;

use market_core::{
    normalize, AssumeReachable, CompanyOutlook, Envelope, HistoricalSeries, NewsFeed,
    NewsNormalizer, Pure, ReachabilityChecker, SearchSuggestions, StockSummary, SummaryList,
};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

pub const TIINGO_BASE_URL: &str = "https://api.tiingo.com";
pub const NEWS_API_BASE_URL: &str = "https://newsapi.org";

const OUTLOOK: Pure<CompanyOutlook> = Pure::new(normalize::company_outlook);
const SUMMARY: Pure<StockSummary> = Pure::new(normalize::stock_summary);
const SUMMARY_LIST: Pure<SummaryList> = Pure::new(normalize::stock_summaries);
const HISTORICAL: Pure<HistoricalSeries> = Pure::new(normalize::historical_series);
const SEARCH: Pure<SearchSuggestions> = Pure::new(normalize::search_suggestions);

/// Credentials and endpoints for the two upstream providers.
#[derive(Clone)]
pub struct UpstreamConfig {
    pub tiingo_token: String,
    pub news_api_token: String,
    pub tiingo_base_url: String,
    pub news_api_base_url: String,
    /// `None` leaves requests without a deadline.
    pub timeout: Option<Duration>,
    /// Probe article and image URLs before returning news.
    pub check_article_urls: bool,
}

impl UpstreamConfig {
    pub fn new(tiingo_token: impl Into<String>, news_api_token: impl Into<String>) -> Self {
        Self {
            tiingo_token: tiingo_token.into(),
            news_api_token: news_api_token.into(),
            tiingo_base_url: TIINGO_BASE_URL.to_string(),
            news_api_base_url: NEWS_API_BASE_URL.to_string(),
            timeout: None,
            check_article_urls: true,
        }
    }
}

impl std::fmt::Debug for UpstreamConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpstreamConfig")
            .field("tiingo_token", &mask_secret(&self.tiingo_token))
            .field("news_api_token", &mask_secret(&self.news_api_token))
            .field("tiingo_base_url", &self.tiingo_base_url)
            .field("news_api_base_url", &self.news_api_base_url)
            .field("timeout", &self.timeout)
            .field("check_article_urls", &self.check_article_urls)
            .finish()
    }
}

/// Tiingo + NewsAPI facade. Each method is one [`fetch_upstream`] call
/// paired with the matching normalizer.
#[derive(Clone)]
pub struct UpstreamClient {
    client: Client,
    config: Arc<UpstreamConfig>,
    news: NewsNormalizer,
}

impl UpstreamClient {
    pub fn new(config: UpstreamConfig) -> Self {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().unwrap_or_else(|e| {
            tracing::warn!(
                "Failed to build configured HTTP client ({}), falling back to defaults without timeout",
                e
            );
            Client::new()
        });

        let checker: Arc<dyn ReachabilityChecker> = if config.check_article_urls {
            Arc::new(HttpReachability::new(client.clone()))
        } else {
            Arc::new(AssumeReachable)
        };

        Self {
            client,
            config: Arc::new(config),
            news: NewsNormalizer::new(checker),
        }
    }

    /// Replace the article reachability check.
    pub fn with_reachability(mut self, checker: Arc<dyn ReachabilityChecker>) -> Self {
        self.news = NewsNormalizer::new(checker);
        self
    }

    pub fn config(&self) -> &UpstreamConfig {
        &self.config
    }

    fn tiingo_url(&self, path: &str) -> String {
        format!("{}{}", self.config.tiingo_base_url.trim_end_matches('/'), path)
    }

    fn news_url(&self, path: &str) -> String {
        format!("{}{}", self.config.news_api_base_url.trim_end_matches('/'), path)
    }

    /// Company profile (`/tiingo/daily/{ticker}`)
    pub async fn company_outlook(&self, ticker: &str) -> Envelope<CompanyOutlook> {
        let url = self.tiingo_url(&format!("/tiingo/daily/{}", ticker));
        fetch_upstream(
            &self.client,
            &url,
            &[("token", self.config.tiingo_token.as_str())],
            &OUTLOOK,
        )
        .await
    }

    /// Latest IEX quote (`/iex/{ticker}`)
    pub async fn stock_summary(&self, ticker: &str) -> Envelope<StockSummary> {
        let url = self.tiingo_url(&format!("/iex/{}", ticker));
        fetch_upstream(
            &self.client,
            &url,
            &[("token", self.config.tiingo_token.as_str())],
            &SUMMARY,
        )
        .await
    }

    /// Latest IEX quotes for several tickers in one call (`/iex?tickers=`)
    pub async fn stock_summaries(&self, tickers: &[String]) -> Envelope<SummaryList> {
        let url = self.tiingo_url("/iex");
        let joined = tickers.join(",");
        fetch_upstream(
            &self.client,
            &url,
            &[("tickers", joined.as_str()), ("token", self.config.tiingo_token.as_str())],
            &SUMMARY_LIST,
        )
        .await
    }

    /// Daily bars from `start_date` (`YYYY-MM-DD`) onwards
    pub async fn historical(&self, ticker: &str, start_date: &str) -> Envelope<HistoricalSeries> {
        let url = self.tiingo_url(&format!("/tiingo/daily/{}/prices", ticker));
        fetch_upstream(
            &self.client,
            &url,
            &[("startDate", start_date), ("token", self.config.tiingo_token.as_str())],
            &HISTORICAL,
        )
        .await
    }

    /// Ticker autocomplete
    pub async fn search(&self, query: &str) -> Envelope<SearchSuggestions> {
        let url = self.tiingo_url("/tiingo/utilities/search");
        fetch_upstream(
            &self.client,
            &url,
            &[("query", query), ("token", self.config.tiingo_token.as_str())],
            &SEARCH,
        )
        .await
    }

    /// NewsAPI articles mentioning `ticker`, filtered through the article gate
    pub async fn news(&self, ticker: &str) -> Envelope<NewsFeed> {
        let url = self.news_url("/v2/everything");
        fetch_upstream(
            &self.client,
            &url,
            &[("apiKey", self.config.news_api_token.as_str()), ("q", ticker)],
            &self.news,
        )
        .await
    }
}
