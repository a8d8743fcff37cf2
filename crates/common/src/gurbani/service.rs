use super::client::{GurbaniSource, SearchVariant};
use super::query::{is_latin_script, SearchQuery};
use crate::errors::Result;
use crate::metrics;
use serde_json::Value;
use std::sync::Arc;

/// Result of a search or Ang lookup
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    /// Search index that produced `body`; `None` for an Ang lookup
    pub variant: Option<SearchVariant>,
    /// Upstream body, unmodified
    pub body: Value,
    /// Match count read from the body, when it carries one
    pub matches: Option<usize>,
}

impl SearchOutcome {
    fn new(variant: Option<SearchVariant>, body: Value) -> Self {
        let matches = match_count(&body);
        Self {
            variant,
            body,
            matches,
        }
    }

    /// `ang` for page lookups, otherwise the search variant
    pub fn label(&self) -> &'static str {
        self.variant.map_or("ang", SearchVariant::as_str)
    }

    /// Upstream answered successfully with zero matches
    pub fn is_empty(&self) -> bool {
        self.matches == Some(0)
    }
}

/// Read the match count from a GurbaniNow body.
///
/// Prefers an explicit `count` (number or numeric string), then the length
/// of a `shabads` or `results` array.
pub fn match_count(body: &Value) -> Option<usize> {
    match body.get("count") {
        Some(Value::Number(n)) => return n.as_u64().map(|n| n as usize),
        Some(Value::String(s)) => {
            if let Ok(n) = s.trim().parse::<usize>() {
                return Some(n);
            }
        }
        _ => {}
    }

    ["shabads", "results"]
        .iter()
        .find_map(|key| body.get(*key).and_then(Value::as_array))
        .map(Vec::len)
}

/// Ang lookup and text search over a [`GurbaniSource`]
pub struct SearchService {
    source: Arc<dyn GurbaniSource>,
}

impl SearchService {
    pub fn new(source: Arc<dyn GurbaniSource>) -> Self {
        Self { source }
    }

    /// Run a classified query.
    ///
    /// Ang lookups make exactly one call. Latin-script text tries the
    /// transliteration index and, only when that comes back empty, the
    /// translation index once. Other text makes one default search.
    pub async fn lookup(&self, query: &SearchQuery) -> Result<SearchOutcome> {
        let (outcome, fell_back) = match query {
            SearchQuery::Ang(ang) => {
                let body = self.source.ang(*ang).await?;
                (SearchOutcome::new(None, body), false)
            }
            SearchQuery::FreeText(text) if is_latin_script(text) => {
                self.search_with_fallback(text).await?
            }
            SearchQuery::FreeText(text) => {
                let body = self.source.search(text, SearchVariant::Default).await?;
                (SearchOutcome::new(Some(SearchVariant::Default), body), false)
            }
        };

        metrics::record_search(query.path(), outcome.label(), fell_back);
        Ok(outcome)
    }

    async fn search_with_fallback(&self, text: &str) -> Result<(SearchOutcome, bool)> {
        let body = self
            .source
            .search(text, SearchVariant::Transliteration)
            .await?;
        let first = SearchOutcome::new(Some(SearchVariant::Transliteration), body);
        if !first.is_empty() {
            return Ok((first, false));
        }

        tracing::info!(
            query = text,
            "Transliteration search empty, falling back to translation"
        );
        let body = self.source.search(text, SearchVariant::Translation).await?;
        Ok((SearchOutcome::new(Some(SearchVariant::Translation), body), true))
    }

    /// Today's hukamnama, unmodified
    pub async fn hukamnama_today(&self) -> Result<Value> {
        self.source.hukamnama_today().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AppError;
    use crate::gurbani::client::{GurbaniCall, MockGurbaniSource};
    use serde_json::json;

    fn service(mock: &Arc<MockGurbaniSource>) -> SearchService {
        SearchService::new(mock.clone())
    }

    #[test]
    fn test_match_count() {
        assert_eq!(match_count(&json!({"count": 3})), Some(3));
        assert_eq!(match_count(&json!({"count": "0"})), Some(0));
        assert_eq!(match_count(&json!({"shabads": [1, 2]})), Some(2));
        assert_eq!(match_count(&json!({"page": {}})), None);
    }

    #[tokio::test]
    async fn test_numeric_query_only_calls_ang() {
        let mock = Arc::new(MockGurbaniSource::new().with_ang(json!({"page": [1]})));
        let query = SearchQuery::classify("245", None).unwrap();

        let outcome = service(&mock).lookup(&query).await.unwrap();
        assert_eq!(outcome.body, json!({"page": [1]}));
        assert_eq!(outcome.variant, None);
        assert_eq!(outcome.label(), "ang");
        assert_eq!(mock.calls(), vec![GurbaniCall::Ang(245)]);
    }

    #[tokio::test]
    async fn test_ang_error_does_not_fall_back() {
        let mock = Arc::new(MockGurbaniSource::new().with_ang_status(503));
        let query = SearchQuery::classify("12", None).unwrap();

        let err = service(&mock).lookup(&query).await.unwrap_err();
        assert!(matches!(err, AppError::Upstream { status: 503, .. }));
        assert_eq!(mock.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_latin_hit_stops_at_transliteration() {
        let mock = Arc::new(
            MockGurbaniSource::new()
                .with_search(SearchVariant::Transliteration, json!({"count": 4})),
        );
        let query = SearchQuery::classify("waheguru", None).unwrap();

        let outcome = service(&mock).lookup(&query).await.unwrap();
        assert_eq!(outcome.variant, Some(SearchVariant::Transliteration));
        assert_eq!(mock.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_latin_empty_falls_back_once() {
        let mock = Arc::new(
            MockGurbaniSource::new()
                .with_search(SearchVariant::Transliteration, json!({"count": 0}))
                .with_search(SearchVariant::Translation, json!({"count": 0, "shabads": []})),
        );
        let query = SearchQuery::classify("selfless service", None).unwrap();

        let outcome = service(&mock).lookup(&query).await.unwrap();
        assert_eq!(outcome.variant, Some(SearchVariant::Translation));
        assert_eq!(outcome.label(), "translation");
        assert!(outcome.is_empty());
        assert_eq!(
            mock.calls(),
            vec![
                GurbaniCall::Search {
                    query: "selfless service".into(),
                    variant: SearchVariant::Transliteration
                },
                GurbaniCall::Search {
                    query: "selfless service".into(),
                    variant: SearchVariant::Translation
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_transliteration_error_is_not_a_fallback() {
        let mock = Arc::new(
            MockGurbaniSource::new().with_search_status(SearchVariant::Transliteration, 500),
        );
        let query = SearchQuery::classify("naam", None).unwrap();

        assert!(service(&mock).lookup(&query).await.is_err());
        assert_eq!(mock.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_non_latin_makes_single_default_call() {
        let mock = Arc::new(
            MockGurbaniSource::new().with_search(SearchVariant::Default, json!({"count": 0})),
        );
        let query = SearchQuery::classify("ਵਾਹਿਗੁਰੂ", None).unwrap();

        let outcome = service(&mock).lookup(&query).await.unwrap();
        assert_eq!(outcome.variant, Some(SearchVariant::Default));
        assert_eq!(outcome.label(), "default");
        assert_eq!(
            mock.calls(),
            vec![GurbaniCall::Search {
                query: "ਵਾਹਿਗੁਰੂ".into(),
                variant: SearchVariant::Default
            }]
        );
    }
}
