//! News feed normalization and the article validity gate.
//!
//! An article is kept only when every display field is a non-empty string
//! and, through the injected [`ReachabilityChecker`], both its page and its
//! image answer with HTTP 200. Articles are checked concurrently and the
//! survivors keep their upstream order.

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::{join, join_all};
use serde_json::Value;

use crate::schema::expect_non_empty_array;
use crate::{Article, NewsFeed, NormalizeError, Normalizer, ReachabilityChecker};

const REQUIRED_TEXT_FIELDS: [&str; 5] = ["title", "url", "urlToImage", "publishedAt", "description"];

fn non_empty_str<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value.get(key)?.as_str().filter(|s| !s.is_empty())
}

/// Field-level half of the gate; no I/O.
pub fn has_required_fields(article: &Value) -> bool {
    REQUIRED_TEXT_FIELDS
        .iter()
        .all(|key| non_empty_str(article, key).is_some())
        && article
            .get("source")
            .filter(|source| source.is_object())
            .and_then(|source| non_empty_str(source, "name"))
            .is_some()
}

/// Builds the client-facing article. Returns `None` when the field gate
/// fails.
pub fn article_record(article: &Value) -> Option<Article> {
    if !has_required_fields(article) {
        return None;
    }

    Some(Article {
        title: non_empty_str(article, "title")?.to_string(),
        article_url: non_empty_str(article, "url")?.to_string(),
        image_url: non_empty_str(article, "urlToImage")?.to_string(),
        description: non_empty_str(article, "description")?.to_string(),
        date: non_empty_str(article, "publishedAt")?.to_string(),
        source: non_empty_str(article.get("source")?, "name")?.to_string(),
    })
}

/// Runs the full gate (fields, then both URLs in parallel) for one article.
pub async fn validate_article(
    article: &Value,
    checker: &dyn ReachabilityChecker,
) -> Option<Article> {
    let record = article_record(article)?;

    let (page_ok, image_ok) = join(
        checker.is_reachable(&record.article_url),
        checker.is_reachable(&record.image_url),
    )
    .await;

    if page_ok && image_ok {
        Some(record)
    } else {
        tracing::debug!(
            url = %record.article_url,
            image_url = %record.image_url,
            page_ok,
            image_ok,
            "Dropping unreachable article"
        );
        None
    }
}

/// NewsAPI `/v2/everything` body -> validated articles.
///
/// An empty result after filtering is still a success.
pub async fn normalize_news(
    body: &Value,
    checker: &dyn ReachabilityChecker,
) -> Result<NewsFeed, NormalizeError> {
    if !body.is_object() {
        return Err(NormalizeError::ExpectedResponseObject);
    }
    let raw_articles = body
        .get("articles")
        .map(expect_non_empty_array)
        .unwrap_or(Err(NormalizeError::ExpectedNonEmptyArray))?;

    let checked = join_all(
        raw_articles
            .iter()
            .map(|article| validate_article(article, checker)),
    )
    .await;

    let articles: Vec<Article> = checked.into_iter().flatten().collect();
    tracing::debug!(
        received = raw_articles.len(),
        kept = articles.len(),
        "Normalized news feed"
    );

    Ok(NewsFeed { articles })
}

/// [`Normalizer`] wrapper that owns its reachability checker.
#[derive(Clone)]
pub struct NewsNormalizer {
    checker: Arc<dyn ReachabilityChecker>,
}

impl NewsNormalizer {
    pub fn new(checker: Arc<dyn ReachabilityChecker>) -> Self {
        Self { checker }
    }
}

#[async_trait]
impl Normalizer for NewsNormalizer {
    type Output = NewsFeed;

    async fn normalize(&self, body: Value) -> Result<NewsFeed, NormalizeError> {
        normalize_news(&body, self.checker.as_ref()).await
    }
}
