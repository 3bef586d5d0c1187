use market_core::{Envelope, Normalizer};
use reqwest::{Client, StatusCode, Url};
use serde_json::Value;

/// Query parameters that carry upstream credentials.
const CREDENTIAL_PARAMS: [&str; 2] = ["token", "apiKey"];

/// Mask a secret for logging (show first 4 and last 4 characters)
pub fn mask_secret(secret: &str) -> String {
    if secret.len() <= 8 || !secret.is_ascii() {
        return "****".to_string();
    }
    format!("{}...{}", &secret[..4], &secret[secret.len() - 4..])
}

/// Appends `params` as a query string. No `?` is added when `params` is
/// empty.
pub fn build_url(base_url: &str, params: &[(&str, &str)]) -> Result<Url, String> {
    let mut url = Url::parse(base_url).map_err(|e| e.to_string())?;
    if !params.is_empty() {
        url.query_pairs_mut().extend_pairs(params.iter());
    }
    Ok(url)
}

/// Renders `url` with credential parameters masked.
pub fn redact_url(url: &Url) -> String {
    if url.query().is_none() {
        return url.to_string();
    }

    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(key, value)| {
            let value = if CREDENTIAL_PARAMS.contains(&&*key) {
                mask_secret(&value)
            } else {
                value.into_owned()
            };
            (key.into_owned(), value)
        })
        .collect();

    let mut shown = url.clone();
    shown.query_pairs_mut().clear().extend_pairs(pairs);
    shown.to_string()
}

fn request_failed<T>(shown_url: &str, reason: impl std::fmt::Display) -> Envelope<T> {
    let message = format!("GET request {} failed. Reason: {}", shown_url, reason);
    tracing::warn!("{}", message);
    Envelope::Failure(message)
}

/// One GET against `base_url`, decoded as JSON and handed to `normalizer`.
///
/// Every failure (bad URL, transport error, non-200 status, undecodable
/// body, shape mismatch) comes back as [`Envelope::Failure`]; this function
/// never errors out to its caller.
pub async fn fetch_upstream<N: Normalizer>(
    client: &Client,
    base_url: &str,
    params: &[(&str, &str)],
    normalizer: &N,
) -> Envelope<N::Output> {
    let url = match build_url(base_url, params) {
        Ok(url) => url,
        Err(e) => return request_failed(base_url, e),
    };
    let shown_url = redact_url(&url);
    tracing::debug!(url = %shown_url, "Upstream GET");

    let response = match client.get(url).send().await {
        Ok(response) => response,
        Err(e) => return request_failed(&shown_url, e.without_url()),
    };

    let status = response.status();
    if status != StatusCode::OK {
        return request_failed(&shown_url, status);
    }

    let body = match response.bytes().await {
        Ok(bytes) => bytes,
        Err(e) => return request_failed(&shown_url, e.without_url()),
    };

    let json: Value = match serde_json::from_slice(&body) {
        Ok(json) => json,
        Err(e) => {
            tracing::warn!(url = %shown_url, error = %e, "Upstream body is not JSON");
            return Envelope::Failure(format!(
                "Parsing of the response from: {} failed.",
                base_url
            ));
        }
    };

    match normalizer.normalize(json).await {
        Ok(payload) => Envelope::Success(payload),
        Err(e) => {
            tracing::warn!(url = %shown_url, error = %e, "Upstream body has unexpected shape");
            Envelope::Failure(e.to_string())
        }
    }
}
