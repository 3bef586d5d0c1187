//! Stock API Routes
//!
//! `/stock/api/v1.0/...` endpoints. Each handler validates its input, makes
//! one upstream call through `UpstreamClient` (three for `details`) and
//! answers with the normalized payload plus the sample endpoint map.

use axum::{
    async_trait,
    extract::{FromRequestParts, Path, Query, State},
    http::request::Parts,
    routing::get,
    Json, Router,
};
use chrono::{Months, Utc};
use market_core::{
    CompanyOutlook, Envelope, HistoricalSeries, NewsFeed, Normalized, SearchSuggestions,
    StockSummary, SummaryList,
};
use serde::Serialize;

use crate::validation::{
    invalid_start_date_message, invalid_ticker_list_message, invalid_ticker_message,
    is_valid_ticker, missing_query_message, parse_start_date, parse_ticker_list,
};
use crate::{ApiError, AppState};

/// Example requests, echoed in every successful response.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SampleEndpoints {
    pub outlook: &'static str,
    pub summary: &'static str,
    pub summary_list: &'static str,
    pub historical: &'static str,
    pub autocomplete: &'static str,
    pub news: &'static str,
    pub details: &'static str,
}

pub const SAMPLE_ENDPOINTS: SampleEndpoints = SampleEndpoints {
    outlook: "/stock/api/v1.0/outlook/aapl",
    summary: "/stock/api/v1.0/summary/aapl",
    summary_list: "/stock/api/v1.0/summary?tickers=aapl,msft",
    historical: "/stock/api/v1.0/historical/aapl",
    autocomplete: "/stock/api/v1.0/search?query=a",
    news: "/stock/api/v1.0/news/aapl",
    details: "/stock/api/v1.0/details/aapl",
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WithSamples<T> {
    #[serde(flatten)]
    pub body: T,
    pub sample_endpoints: SampleEndpoints,
}

impl<T> WithSamples<T> {
    fn new(body: T) -> Self {
        Self {
            body,
            sample_endpoints: SAMPLE_ENDPOINTS,
        }
    }
}

type StockResponse<T> = Result<Json<WithSamples<Normalized<T>>>, ApiError>;

/// Merged view of one ticker. A sub-call that failed is left out.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailsResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outlook_model: Option<Normalized<CompanyOutlook>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary_model: Option<Normalized<StockSummary>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub news_model: Option<Normalized<NewsFeed>>,
    pub sample_endpoints: SampleEndpoints,
}

/// A `:ticker` path segment that passed [`is_valid_ticker`]. A segment that
/// does not even decode is reported through the same 404.
pub struct Ticker(pub String);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Ticker {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let ticker = match Path::<String>::from_request_parts(parts, state).await {
            Ok(Path(ticker)) => ticker,
            Err(rejection) => {
                tracing::debug!("Undecodable ticker segment: {}", rejection.body_text());
                parts
                    .uri
                    .path()
                    .rsplit('/')
                    .next()
                    .unwrap_or_default()
                    .to_string()
            }
        };
        check_ticker(&ticker)?;
        Ok(Ticker(ticker))
    }
}

/// Raw query pairs. Repeated keys are kept and lookups take the first one.
pub struct QueryParams(Vec<(String, String)>);

impl QueryParams {
    pub fn first(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    fn required(&self, name: &str) -> Result<&str, ApiError> {
        self.first(name)
            .ok_or_else(|| ApiError::NotFound(missing_query_message(name)))
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for QueryParams {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match Query::<Vec<(String, String)>>::try_from_uri(&parts.uri) {
            Ok(Query(pairs)) => Ok(QueryParams(pairs)),
            Err(rejection) => Err(ApiError::NotFound(format!(
                "invalid query string: {}",
                rejection.body_text()
            ))),
        }
    }
}

pub fn stock_routes() -> Router<AppState> {
    Router::new()
        .route("/stock/api/v1.0/outlook/:ticker", get(get_outlook))
        .route("/stock/api/v1.0/summary/:ticker", get(get_summary))
        .route("/stock/api/v1.0/summary", get(get_summary_list))
        .route("/stock/api/v1.0/historical/:ticker", get(get_historical))
        .route("/stock/api/v1.0/search", get(search))
        .route("/stock/api/v1.0/news/:ticker", get(get_news))
        .route("/stock/api/v1.0/details/:ticker", get(get_details))
}

fn check_ticker(ticker: &str) -> Result<(), ApiError> {
    if is_valid_ticker(ticker) {
        Ok(())
    } else {
        tracing::debug!("Rejected ticker {:?}", ticker);
        Err(ApiError::NotFound(invalid_ticker_message(ticker)))
    }
}

fn respond<T>(envelope: Envelope<T>) -> StockResponse<T> {
    match envelope {
        Envelope::Success(record) => Ok(Json(WithSamples::new(Normalized::new(record)))),
        Envelope::Failure(message) => Err(ApiError::Upstream(message)),
    }
}

/// Two years before today (UTC), as `YYYY-MM-DD`.
fn default_start_date() -> String {
    let today = Utc::now().date_naive();
    today
        .checked_sub_months(Months::new(24))
        .unwrap_or(today)
        .format("%Y-%m-%d")
        .to_string()
}

async fn get_outlook(
    State(state): State<AppState>,
    Ticker(ticker): Ticker,
) -> StockResponse<CompanyOutlook> {
    respond(state.upstream.company_outlook(&ticker).await)
}

async fn get_summary(
    State(state): State<AppState>,
    Ticker(ticker): Ticker,
) -> StockResponse<StockSummary> {
    respond(state.upstream.stock_summary(&ticker).await)
}

async fn get_summary_list(
    State(state): State<AppState>,
    query: QueryParams,
) -> StockResponse<SummaryList> {
    let raw = query.required("tickers")?;
    let tickers = parse_ticker_list(raw)
        .ok_or_else(|| ApiError::NotFound(invalid_ticker_list_message(raw)))?;

    respond(state.upstream.stock_summaries(&tickers).await)
}

async fn get_historical(
    State(state): State<AppState>,
    Ticker(ticker): Ticker,
    query: QueryParams,
) -> StockResponse<HistoricalSeries> {
    let start_date = match query.first("startDate") {
        Some(raw) => {
            if parse_start_date(raw).is_none() {
                return Err(ApiError::NotFound(invalid_start_date_message(raw)));
            }
            raw.to_string()
        }
        None => default_start_date(),
    };

    respond(state.upstream.historical(&ticker, &start_date).await)
}

async fn search(
    State(state): State<AppState>,
    query: QueryParams,
) -> StockResponse<SearchSuggestions> {
    let query = query.required("query")?;
    respond(state.upstream.search(query).await)
}

async fn get_news(
    State(state): State<AppState>,
    Ticker(ticker): Ticker,
) -> StockResponse<NewsFeed> {
    respond(state.upstream.news(&ticker).await)
}

async fn get_details(
    State(state): State<AppState>,
    Ticker(ticker): Ticker,
) -> Result<Json<DetailsResponse>, ApiError> {
    let (outlook, summary, news) = tokio::join!(
        state.upstream.company_outlook(&ticker),
        state.upstream.stock_summary(&ticker),
        state.upstream.news(&ticker),
    );

    for (part, message) in [
        ("outlook", outlook.failure_message()),
        ("summary", summary.failure_message()),
        ("news", news.failure_message()),
    ] {
        if let Some(message) = message {
            tracing::info!("details/{}: omitting {}: {}", ticker, part, message);
        }
    }

    Ok(Json(DetailsResponse {
        outlook_model: outlook.ok().map(Normalized::new),
        summary_model: summary.ok().map(Normalized::new),
        news_model: news.ok().map(Normalized::new),
        sample_endpoints: SAMPLE_ENDPOINTS,
    }))
}

#[cfg(test)]
#[path = "stock_routes_tests.rs"]
mod stock_routes_tests;
