//! Pure normalizers for the Tiingo-shaped endpoints.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::{Number, Value};

use crate::schema::{expect_non_empty_array, expect_object, is_truthy, resolve_path};
use crate::{
    CompanyOutlook, HistoricalBar, HistoricalSeries, NormalizeError, Normalized,
    SearchSuggestions, StockSummary, SummaryList, TickerSuggestion,
};

fn text(source: &Value, path: &str) -> Option<String> {
    resolve_path(source, path).map(display_text)
}

/// Only JSON numbers count; a quoted number is treated as absent.
fn number(source: &Value, path: &str) -> Option<Number> {
    match resolve_path(source, path) {
        Some(Value::Number(n)) => Some(n.clone()),
        _ => None,
    }
}

fn display_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// `/tiingo/daily/{ticker}` metadata -> company outlook.
pub fn company_outlook(body: &Value) -> Result<CompanyOutlook, NormalizeError> {
    expect_object(body)?;

    Ok(CompanyOutlook {
        company_name: text(body, "name"),
        stock_ticker_symbol: text(body, "ticker"),
        stock_exchange_code: text(body, "exchangeCode"),
        company_start_date: text(body, "startDate"),
        description: text(body, "description"),
    })
}

/// `/iex/{ticker}` -> summary of the first quote. Any further elements are
/// ignored.
pub fn stock_summary(body: &Value) -> Result<StockSummary, NormalizeError> {
    let quotes = expect_non_empty_array(body)?;
    summarize_quote(&quotes[0])
}

fn summarize_quote(quote: &Value) -> Result<StockSummary, NormalizeError> {
    expect_object(quote)?;

    Ok(StockSummary {
        stock_ticker_symbol: text(quote, "ticker"),
        timestamp: text(quote, "timestamp"),
        last_price: number(quote, "last"),
        previous_closing_price: number(quote, "prevClose"),
        opening_price: number(quote, "open"),
        high_price: number(quote, "high"),
        low_price: number(quote, "low"),
        volume: number(quote, "volume"),
        bid_size: number(quote, "bidSize"),
        bid_price: number(quote, "bidPrice"),
        ask_size: number(quote, "askSize"),
        ask_price: number(quote, "askPrice"),
        mid_price: number(quote, "mid"),
    })
}

/// `/iex?tickers=a,b` -> one summary per quote, in upstream order.
///
/// Each quote goes through the single-ticker path on its own; quotes that
/// are not objects are skipped.
pub fn stock_summaries(body: &Value) -> Result<SummaryList, NormalizeError> {
    let quotes = expect_non_empty_array(body)?;

    let data = quotes
        .iter()
        .filter_map(|quote| stock_summary(&Value::Array(vec![quote.clone()])).ok())
        .map(Normalized::new)
        .collect();

    Ok(SummaryList { data })
}

/// `/tiingo/daily/{ticker}/prices` -> bars keyed by epoch milliseconds.
///
/// Bars without a usable date are dropped.
pub fn historical_series(body: &Value) -> Result<HistoricalSeries, NormalizeError> {
    let bars = expect_non_empty_array(body)?;

    let data = bars
        .iter()
        .filter(|bar| bar.is_object())
        .filter_map(|bar| {
            let date = resolve_path(bar, "date").and_then(epoch_millis)?;
            Some(Normalized::new(HistoricalBar {
                date,
                open: number(bar, "open"),
                high: number(bar, "high"),
                low: number(bar, "low"),
                close: number(bar, "close"),
                volume: number(bar, "volume"),
            }))
        })
        .collect();

    Ok(HistoricalSeries { data })
}

/// Converts an upstream date (RFC 3339, naive datetime, plain `YYYY-MM-DD`
/// or an epoch-millisecond number) to epoch milliseconds. Naive values are
/// read as UTC.
pub fn epoch_millis(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => {
            let s = s.trim();
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                return Some(dt.timestamp_millis());
            }
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
                return Some(dt.and_utc().timestamp_millis());
            }
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|dt| dt.and_utc().timestamp_millis())
        }
        _ => None,
    }
}

/// `/tiingo/utilities/search` -> `{ticker, name}` pairs for entries that
/// carry both.
pub fn search_suggestions(body: &Value) -> Result<SearchSuggestions, NormalizeError> {
    let entries = expect_non_empty_array(body)?;

    let data = entries
        .iter()
        .filter_map(|entry| {
            let ticker = entry.get("ticker").filter(|v| is_truthy(v))?;
            let name = entry.get("name").filter(|v| is_truthy(v))?;
            Some(Normalized::new(TickerSuggestion {
                ticker: display_text(ticker),
                name: display_text(name),
            }))
        })
        .collect();

    Ok(SearchSuggestions { data })
}
