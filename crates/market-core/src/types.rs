use serde::{Deserialize, Serialize};
use serde_json::Number;

/// Outcome of one upstream round trip.
///
/// `Success` maps to HTTP 200 and always carries a payload that matches the
/// target shape. `Failure` maps to HTTP 500 and only ever carries a
/// human-readable diagnostic.
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope<T> {
    Success(T),
    Failure(String),
}

impl<T> Envelope<T> {
    pub fn status(&self) -> u16 {
        match self {
            Envelope::Success(_) => 200,
            Envelope::Failure(_) => 500,
        }
    }

    /// Payload of a successful call, dropping the diagnostic otherwise.
    pub fn ok(self) -> Option<T> {
        match self {
            Envelope::Success(payload) => Some(payload),
            Envelope::Failure(_) => None,
        }
    }

    pub fn failure_message(&self) -> Option<&str> {
        match self {
            Envelope::Success(_) => None,
            Envelope::Failure(message) => Some(message),
        }
    }
}

/// A normalized record as it goes out on the wire: the record's own keys plus
/// `success: true`. Derefs to the record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Normalized<T> {
    pub success: bool,
    #[serde(flatten)]
    pub record: T,
}

impl<T> Normalized<T> {
    pub fn new(record: T) -> Self {
        Self {
            success: true,
            record,
        }
    }
}

impl<T> std::ops::Deref for Normalized<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.record
    }
}

/// Company profile from the daily metadata endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyOutlook {
    pub company_name: Option<String>,
    pub stock_ticker_symbol: Option<String>,
    pub stock_exchange_code: Option<String>,
    pub company_start_date: Option<String>,
    pub description: Option<String>,
}

/// Latest IEX top-of-book snapshot for one ticker.
///
/// Numeric fields keep the upstream number representation so integral
/// volumes are not rendered as floats.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockSummary {
    pub stock_ticker_symbol: Option<String>,
    pub timestamp: Option<String>,
    pub last_price: Option<Number>,
    pub previous_closing_price: Option<Number>,
    pub opening_price: Option<Number>,
    pub high_price: Option<Number>,
    pub low_price: Option<Number>,
    pub volume: Option<Number>,
    pub bid_size: Option<Number>,
    pub bid_price: Option<Number>,
    pub ask_size: Option<Number>,
    pub ask_price: Option<Number>,
    pub mid_price: Option<Number>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryList {
    pub data: Vec<Normalized<StockSummary>>,
}

/// One daily bar. `date` is milliseconds since the Unix epoch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalBar {
    pub date: i64,
    pub open: Option<Number>,
    pub high: Option<Number>,
    pub low: Option<Number>,
    pub close: Option<Number>,
    pub volume: Option<Number>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoricalSeries {
    pub data: Vec<Normalized<HistoricalBar>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickerSuggestion {
    pub ticker: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchSuggestions {
    pub data: Vec<Normalized<TickerSuggestion>>,
}

/// A news item that passed the article validity gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub title: String,
    pub article_url: String,
    pub image_url: String,
    pub description: String,
    pub date: String,
    pub source: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsFeed {
    pub articles: Vec<Article>,
}
