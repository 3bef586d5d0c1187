//! Syntactic checks on path and query input. Nothing here touches the
//! network; a request that fails these checks never reaches an upstream.

use chrono::NaiveDate;

/// `^[a-z0-9]+$`, case-insensitive.
pub fn is_valid_ticker(ticker: &str) -> bool {
    !ticker.is_empty() && ticker.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Splits a comma-separated ticker list. `None` if any element (including
/// an empty one) is not a valid ticker.
pub fn parse_ticker_list(raw: &str) -> Option<Vec<String>> {
    raw.split(',')
        .map(|ticker| is_valid_ticker(ticker).then(|| ticker.to_string()))
        .collect()
}

/// Accepts `YYYY-MM-DD` only.
pub fn parse_start_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

pub fn invalid_ticker_message(ticker: &str) -> String {
    format!(
        "ticker: {} is invalid, please provide a valid ticker. Example: GOOG, AMZN, etc",
        ticker
    )
}

pub fn invalid_ticker_list_message(tickers: &str) -> String {
    format!(
        "tickers: {} is invalid, please provide a comma separated list of valid tickers. Example: GOOG,AMZN",
        tickers
    )
}

pub fn invalid_start_date_message(start_date: &str) -> String {
    format!(
        "startDate: {} is invalid, expected a date formatted as YYYY-MM-DD",
        start_date
    )
}

pub fn missing_query_message(name: &str) -> String {
    format!("expected \"{}\" query parameter", name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_tickers() {
        for ticker in ["AAPL", "aapl", "GooG", "brk1", "7203"] {
            assert!(is_valid_ticker(ticker), "{} should be valid", ticker);
        }
    }

    #[test]
    fn test_invalid_tickers() {
        for ticker in ["", "$$$", "BRK.B", "BF-B", "aapl ", "ÄPL", "a/b"] {
            assert!(!is_valid_ticker(ticker), "{:?} should be invalid", ticker);
        }
    }

    #[test]
    fn test_ticker_list() {
        assert_eq!(
            parse_ticker_list("aapl,MSFT,goog"),
            Some(vec!["aapl".to_string(), "MSFT".to_string(), "goog".to_string()])
        );
        assert_eq!(parse_ticker_list("aapl"), Some(vec!["aapl".to_string()]));
    }

    #[test]
    fn test_ticker_list_rejects_any_bad_element() {
        assert_eq!(parse_ticker_list("aapl,$$$"), None);
        assert_eq!(parse_ticker_list("aapl,,msft"), None);
        assert_eq!(parse_ticker_list("aapl, msft"), None);
        assert_eq!(parse_ticker_list(""), None);
    }

    #[test]
    fn test_start_date() {
        assert_eq!(
            parse_start_date("2022-03-01"),
            NaiveDate::from_ymd_opt(2022, 3, 1)
        );
        assert_eq!(parse_start_date("03/01/2022"), None);
        assert_eq!(parse_start_date("2022-02-30"), None);
    }

    #[test]
    fn test_messages_name_the_input() {
        assert!(invalid_ticker_message("$$$").contains("ticker: $$$ is invalid"));
        assert_eq!(missing_query_message("query"), "expected \"query\" query parameter");
    }
}
