use super::*;
use crate::build_router;
use async_trait::async_trait;
use axum::{
    body::Body,
    extract::Query,
    http::{Request, StatusCode},
    response::IntoResponse,
};
use market_core::ReachabilityChecker;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tower::ServiceExt;
use upstream_client::{UpstreamClient, UpstreamConfig};

const TIINGO_TOKEN: &str = "tiingo-route-token";
const NEWS_TOKEN: &str = "news-route-token";

/// Every request either fake upstream receives.
type Hits = Arc<AtomicUsize>;

/// Rejects any URL containing "broken".
struct FakeReachability;

#[async_trait]
impl ReachabilityChecker for FakeReachability {
    async fn is_reachable(&self, url: &str) -> bool {
        !url.contains("broken")
    }
}

async fn serve(router: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

fn quote(ticker: &str) -> Value {
    json!({
        "ticker": ticker.to_uppercase(),
        "timestamp": "2024-03-01T20:00:00+00:00",
        "last": 179.66,
        "prevClose": 180.75,
        "open": 179.55,
        "high": 180.53,
        "low": 177.38,
        "mid": null,
        "volume": 73488997,
        "bidSize": 0,
        "bidPrice": 0.0,
        "askSize": 100,
        "askPrice": 179.7
    })
}

fn article(n: usize, url: &str) -> Value {
    json!({
        "source": {"id": null, "name": "Reuters"},
        "title": format!("Headline {}", n),
        "description": "Something happened",
        "url": url,
        "urlToImage": format!("https://img.example.com/{}.jpg", n),
        "publishedAt": "2024-03-01T12:00:00Z"
    })
}

/// Tiingo stand-in. The ticker "down" answers 503 everywhere, and the IEX
/// quote list for "scalar" starts with a bare number.
fn fake_tiingo(hits: Hits) -> axum::Router {
    use axum::extract::Path as UrlPath;

    axum::Router::new()
        .route(
            "/tiingo/daily/:ticker",
            axum::routing::get(|UrlPath(ticker): UrlPath<String>| async move {
                if ticker == "down" {
                    return StatusCode::SERVICE_UNAVAILABLE.into_response();
                }
                axum::Json(json!({
                    "name": "Apple Inc.",
                    "ticker": ticker.to_uppercase(),
                    "exchangeCode": "NASDAQ",
                    "startDate": "1980-12-12",
                    "endDate": "2024-03-01",
                    "description": "Apple designs phones."
                }))
                .into_response()
            }),
        )
        .route(
            "/tiingo/daily/:ticker/prices",
            axum::routing::get(|Query(q): Query<HashMap<String, String>>| async move {
                let start = q.get("startDate").cloned().unwrap_or_default();
                axum::Json(json!([
                    {"date": format!("{}T00:00:00.000Z", start), "open": 1, "high": 2, "low": 0.5, "close": 1.5, "volume": 100},
                    {"date": null, "close": 9.9},
                    {"date": "2024-01-03T00:00:00.000Z", "open": 2, "high": 3, "low": 1, "close": 2.5, "volume": 200}
                ]))
            }),
        )
        .route(
            "/iex/:ticker",
            axum::routing::get(|UrlPath(ticker): UrlPath<String>| async move {
                match ticker.as_str() {
                    "down" => StatusCode::SERVICE_UNAVAILABLE.into_response(),
                    "scalar" => axum::Json(json!([42, quote("aapl")])).into_response(),
                    _ => axum::Json(json!([quote(&ticker)])).into_response(),
                }
            }),
        )
        .route(
            "/iex",
            axum::routing::get(|Query(q): Query<HashMap<String, String>>| async move {
                let quotes: Vec<Value> = q
                    .get("tickers")
                    .map(|t| t.split(',').map(quote).collect())
                    .unwrap_or_default();
                axum::Json(Value::Array(quotes))
            }),
        )
        .route(
            "/tiingo/utilities/search",
            axum::routing::get(|Query(q): Query<HashMap<String, String>>| async move {
                let query = q.get("query").cloned().unwrap_or_default();
                axum::Json(json!([
                    {"ticker": query.to_uppercase(), "name": "Echo Corp"},
                    {"ticker": "NONAME", "name": null}
                ]))
            }),
        )
        .layer(axum::middleware::from_fn(
            move |request: Request<Body>, next: axum::middleware::Next| {
                let hits = hits.clone();
                async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    next.run(request).await
                }
            },
        ))
}

/// NewsAPI stand-in. The query "quiet" answers 429 and "empty" has no
/// articles array to speak of.
fn fake_news(hits: Hits) -> axum::Router {
    axum::Router::new()
        .route(
            "/v2/everything",
            axum::routing::get(|Query(q): Query<HashMap<String, String>>| async move {
                match q.get("q").map(String::as_str) {
                    Some("quiet") => return StatusCode::TOO_MANY_REQUESTS.into_response(),
                    Some("empty") => return axum::Json(json!({"articles": []})).into_response(),
                    _ => {}
                }
                axum::Json(json!({
                    "status": "ok",
                    "totalResults": 3,
                    "articles": [
                        article(1, "https://news.example.com/1"),
                        article(2, "https://broken.example.com/2"),
                        article(3, "https://news.example.com/3")
                    ]
                }))
                .into_response()
            }),
        )
        .layer(axum::middleware::from_fn(
            move |request: Request<Body>, next: axum::middleware::Next| {
                let hits = hits.clone();
                async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    next.run(request).await
                }
            },
        ))
}

struct Harness {
    app: axum::Router,
    hits: Hits,
}

async fn harness() -> Harness {
    let hits = Hits::default();
    let mut config = UpstreamConfig::new(TIINGO_TOKEN, NEWS_TOKEN);
    config.tiingo_base_url = serve(fake_tiingo(hits.clone())).await;
    config.news_api_base_url = serve(fake_news(hits.clone())).await;

    let upstream = UpstreamClient::new(config).with_reachability(Arc::new(FakeReachability));
    Harness {
        app: build_router(AppState { upstream }),
        hits,
    }
}

async fn get_json(app: &axum::Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_outlook() {
    let h = harness().await;
    let (status, body) = get_json(&h.app, "/stock/api/v1.0/outlook/AAPL").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["companyName"], json!("Apple Inc."));
    assert_eq!(body["stockTickerSymbol"], json!("AAPL"));
    assert_eq!(body["stockExchangeCode"], json!("NASDAQ"));
    assert_eq!(body["companyStartDate"], json!("1980-12-12"));
    assert!(body.get("endDate").is_none());
    assert_eq!(
        body["sampleEndpoints"]["outlook"],
        json!("/stock/api/v1.0/outlook/aapl")
    );
}

#[tokio::test]
async fn test_invalid_ticker_never_reaches_upstream() {
    let h = harness().await;

    for uri in [
        "/stock/api/v1.0/outlook/$$$",
        "/stock/api/v1.0/summary/BRK.B",
        "/stock/api/v1.0/historical/a-b",
        "/stock/api/v1.0/news/$$$",
        "/stock/api/v1.0/details/$$$",
    ] {
        let (status, body) = get_json(&h.app, uri).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{}", uri);
        assert!(body["message"].as_str().unwrap().contains("is invalid"), "{}", uri);
    }

    let (_, body) = get_json(&h.app, "/stock/api/v1.0/outlook/$$$").await;
    assert_eq!(
        body,
        json!({"message": "ticker: $$$ is invalid, please provide a valid ticker. Example: GOOG, AMZN, etc"})
    );
    assert_eq!(h.hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_summary() {
    let h = harness().await;
    let (status, body) = get_json(&h.app, "/stock/api/v1.0/summary/aapl").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["stockTickerSymbol"], json!("AAPL"));
    assert_eq!(body["lastPrice"], json!(179.66));
    assert_eq!(body["previousClosingPrice"], json!(180.75));
    assert_eq!(body["volume"], json!(73488997));
    assert_eq!(body["bidSize"], json!(null));
    assert_eq!(body["midPrice"], json!(null));
    assert_eq!(body["askSize"], json!(100));
}

#[tokio::test]
async fn test_upstream_failure_is_500_with_url_and_status() {
    let h = harness().await;
    let (status, body) = get_json(&h.app, "/stock/api/v1.0/summary/down").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let message = body["message"].as_str().unwrap();
    assert!(message.starts_with("GET request http://"));
    assert!(message.contains("/iex/down"));
    assert!(message.contains("503"));
    assert!(!message.contains(TIINGO_TOKEN));
    assert!(body.get("sampleEndpoints").is_none());
}

#[tokio::test]
async fn test_summary_list() {
    let h = harness().await;
    let (status, body) = get_json(&h.app, "/stock/api/v1.0/summary?tickers=aapl,msft").await;

    assert_eq!(status, StatusCode::OK);
    let tickers: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["stockTickerSymbol"].as_str().unwrap())
        .collect();
    assert_eq!(tickers, vec!["AAPL", "MSFT"]);
}

#[tokio::test]
async fn test_summary_list_rejects_bad_input() {
    let h = harness().await;

    let (status, body) = get_json(&h.app, "/stock/api/v1.0/summary?tickers=aapl,$$$").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["message"].as_str().unwrap().contains("aapl,$$$"));

    let (status, body) = get_json(&h.app, "/stock/api/v1.0/summary").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], json!("expected \"tickers\" query parameter"));

    assert_eq!(h.hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_historical_with_start_date() {
    let h = harness().await;
    let (status, body) = get_json(
        &h.app,
        "/stock/api/v1.0/historical/aapl?startDate=2024-01-02",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 2);
    assert_eq!(data[0]["date"], json!(1_704_153_600_000_i64));
    assert_eq!(data[0]["close"], json!(1.5));
    assert_eq!(data[1]["date"], json!(1_704_240_000_000_i64));
    assert_eq!(data[1]["volume"], json!(200));
}

#[tokio::test]
async fn test_historical_defaults_to_two_years_back() {
    let h = harness().await;
    let (status, body) = get_json(&h.app, "/stock/api/v1.0/historical/aapl").await;
    assert_eq!(status, StatusCode::OK);

    let expected = Utc::now()
        .date_naive()
        .checked_sub_months(Months::new(24))
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        .and_utc()
        .timestamp_millis();
    assert_eq!(body["data"][0]["date"], json!(expected));
}

#[tokio::test]
async fn test_historical_rejects_malformed_start_date() {
    let h = harness().await;
    let (status, body) = get_json(
        &h.app,
        "/stock/api/v1.0/historical/aapl?startDate=01/02/2024",
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["message"].as_str().unwrap().contains("01/02/2024"));
    assert_eq!(h.hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_search() {
    let h = harness().await;
    let (status, body) = get_json(&h.app, "/stock/api/v1.0/search?query=goo").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["data"],
        json!([{"success": true, "ticker": "GOO", "name": "Echo Corp"}])
    );
}

#[tokio::test]
async fn test_search_requires_query() {
    let h = harness().await;
    let (status, body) = get_json(&h.app, "/stock/api/v1.0/search").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"message": "expected \"query\" query parameter"}));
    assert_eq!(h.hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_news_drops_unreachable_articles() {
    let h = harness().await;
    let (status, body) = get_json(&h.app, "/stock/api/v1.0/news/aapl").await;

    assert_eq!(status, StatusCode::OK);
    let titles: Vec<&str> = body["articles"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Headline 1", "Headline 3"]);
    assert_eq!(
        body["articles"][0]["articleUrl"],
        json!("https://news.example.com/1")
    );
    assert_eq!(body["articles"][0]["source"], json!("Reuters"));
}

#[tokio::test]
async fn test_details_merges_all_parts() {
    let h = harness().await;
    let (status, body) = get_json(&h.app, "/stock/api/v1.0/details/aapl").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outlookModel"]["companyName"], json!("Apple Inc."));
    assert_eq!(body["summaryModel"]["lastPrice"], json!(179.66));
    assert_eq!(body["newsModel"]["articles"].as_array().unwrap().len(), 2);
    assert!(body.get("sampleEndpoints").is_some());
}

#[tokio::test]
async fn test_details_omits_failed_parts() {
    let h = harness().await;

    let (status, body) = get_json(&h.app, "/stock/api/v1.0/details/quiet").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.get("outlookModel").is_some());
    assert!(body.get("summaryModel").is_some());
    assert!(body.get("newsModel").is_none());

    let (status, body) = get_json(&h.app, "/stock/api/v1.0/details/down").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.get("outlookModel").is_none());
    assert!(body.get("summaryModel").is_none());
    assert!(body.get("newsModel").is_some());
}

#[tokio::test]
async fn test_index_and_health() {
    let h = harness().await;

    let (status, body) = get_json(&h.app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok"}));

    let (status, body) = get_json(&h.app, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["sampleEndpoints"]["autocomplete"],
        json!("/stock/api/v1.0/search?query=a")
    );
    assert_eq!(
        body["sampleEndpoints"]["summaryList"],
        json!("/stock/api/v1.0/summary?tickers=aapl,msft")
    );
}

#[tokio::test]
async fn test_cors_allows_any_origin() {
    let h = harness().await;
    let response = h
        .app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("Origin", "https://client.example.com")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        response.headers()["access-control-allow-origin"],
        "*"
    );
}

#[tokio::test]
async fn test_list_elements_carry_success_flag() {
    let h = harness().await;

    let (_, body) = get_json(&h.app, "/stock/api/v1.0/historical/aapl?startDate=2024-01-02").await;
    assert_eq!(body["data"][0]["success"], json!(true));

    let (_, body) = get_json(&h.app, "/stock/api/v1.0/summary?tickers=aapl,msft").await;
    assert_eq!(body["data"][0]["success"], json!(true));
    assert_eq!(body["data"][1]["success"], json!(true));

    let (_, body) = get_json(&h.app, "/stock/api/v1.0/search?query=goo").await;
    assert_eq!(
        body["data"][0],
        json!({"success": true, "ticker": "GOO", "name": "Echo Corp"})
    );

    let (_, body) = get_json(&h.app, "/stock/api/v1.0/news/aapl").await;
    assert_eq!(body["success"], json!(true));
    assert!(body["articles"][0].get("success").is_none());
}

#[tokio::test]
async fn test_repeated_query_keys_use_first_value() {
    let h = harness().await;

    let (status, body) = get_json(&h.app, "/stock/api/v1.0/search?query=a&query=b").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["ticker"], json!("A"));

    let (status, body) = get_json(&h.app, "/stock/api/v1.0/summary?tickers=aapl&tickers=msft").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["stockTickerSymbol"], json!("AAPL"));

    let (status, _) = get_json(
        &h.app,
        "/stock/api/v1.0/historical/aapl?startDate=2024-01-02&startDate=bogus",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_undecodable_ticker_is_json_404() {
    let h = harness().await;
    let response = h
        .app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/stock/api/v1.0/outlook/%FF")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(response.headers()["content-type"], "application/json");
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(
        body,
        json!({"message": "ticker: %FF is invalid, please provide a valid ticker. Example: GOOG, AMZN, etc"})
    );
    assert_eq!(h.hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_news_without_articles_is_500() {
    let h = harness().await;
    let (status, body) = get_json(&h.app, "/stock/api/v1.0/news/empty").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body,
        json!({"message": "Expected an array (of size > 0) in server response"})
    );
}

#[tokio::test]
async fn test_summary_with_non_object_first_quote_is_500() {
    let h = harness().await;
    let (status, body) = get_json(&h.app, "/stock/api/v1.0/summary/scalar").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body,
        json!({"message": "Expected a json object from the server response"})
    );
}
