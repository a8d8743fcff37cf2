//! Gurbani text API abstraction
//!
//! Provides a unified interface over the religious-text API:
//! - GurbaniNow v2 (Ang lookup, search variants, daily hukamnama)
//! - A scripted mock source for tests

use super::query::AngNumber;
use crate::errors::{AppError, Result};
use crate::metrics::UpstreamTimer;
use async_trait::async_trait;
use reqwest::Url;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// Service label used in errors and metrics
pub const GURBANI_SERVICE: &str = "gurbani";

/// Default GurbaniNow API base
pub const DEFAULT_GURBANI_BASE: &str = "https://api.gurbaninow.com/v2";

/// Which upstream search index to query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchVariant {
    /// Default phonetic Gurmukhi search
    Default,
    /// Romanized Gurmukhi ("sound-alike")
    Transliteration,
    /// English translation (meaning)
    Translation,
}

impl SearchVariant {
    /// GurbaniNow `searchtype` parameter; the default search sends none
    pub fn search_type(self) -> Option<&'static str> {
        match self {
            SearchVariant::Default => None,
            SearchVariant::Transliteration => Some("4"),
            SearchVariant::Translation => Some("3"),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SearchVariant::Default => "default",
            SearchVariant::Transliteration => "transliteration",
            SearchVariant::Translation => "translation",
        }
    }
}

/// Trait for Gurbani text sources
#[async_trait]
pub trait GurbaniSource: Send + Sync {
    /// Fetch every verse on one Ang
    async fn ang(&self, ang: AngNumber) -> Result<Value>;

    /// Run a text search against one index
    async fn search(&self, query: &str, variant: SearchVariant) -> Result<Value>;

    /// Today's hukamnama
    async fn hukamnama_today(&self) -> Result<Value>;
}

/// GurbaniNow v2 HTTP client
pub struct GurbaniNowClient {
    client: reqwest::Client,
    base_url: Url,
}

impl GurbaniNowClient {
    /// Create a new client
    pub fn new(base_url: Option<&str>, timeout: Duration) -> Result<Self> {
        let raw = base_url.unwrap_or(DEFAULT_GURBANI_BASE);
        let base_url = Url::parse(raw.trim_end_matches('/')).map_err(|e| AppError::Configuration {
            message: format!("Invalid Gurbani API base '{}': {}", raw, e),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(AppError::Configuration {
                message: format!("Gurbani API base '{}' cannot carry a path", raw),
            });
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self { client, base_url })
    }

    /// Base URL with extra path segments appended (each one percent-encoded)
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn ang_url(&self, ang: AngNumber) -> Url {
        self.endpoint(&["ang", &ang.to_string()])
    }

    fn search_url(&self, query: &str, variant: SearchVariant) -> Url {
        let mut url = self.endpoint(&["search", query]);
        if let Some(search_type) = variant.search_type() {
            url.query_pairs_mut().append_pair("searchtype", search_type);
        }
        url
    }

    fn hukamnama_url(&self) -> Url {
        self.endpoint(&["hukamnama", "today"])
    }

    async fn get_json(&self, url: Url, endpoint: &'static str, label: &str) -> Result<Value> {
        let timer = UpstreamTimer::start(GURBANI_SERVICE, endpoint);
        tracing::debug!(%url, "Fetching from Gurbani API");

        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                timer.finish(false);
                return Err(e.into());
            }
        };

        let status = response.status();
        if !status.is_success() {
            timer.finish(false);
            return Err(AppError::Upstream {
                service: GURBANI_SERVICE.to_string(),
                status: status.as_u16(),
                message: format!("{} API returned {}", label, status.as_u16()),
            });
        }

        let body = response.json::<Value>().await.map_err(|e| {
            AppError::InvalidUpstreamResponse {
                service: GURBANI_SERVICE.to_string(),
                message: format!("{} API sent invalid JSON: {}", label, e),
            }
        });
        timer.finish(body.is_ok());
        body
    }
}

#[async_trait]
impl GurbaniSource for GurbaniNowClient {
    async fn ang(&self, ang: AngNumber) -> Result<Value> {
        self.get_json(self.ang_url(ang), "ang", "Ang").await
    }

    async fn search(&self, query: &str, variant: SearchVariant) -> Result<Value> {
        self.get_json(self.search_url(query, variant), "search", "Search")
            .await
    }

    async fn hukamnama_today(&self) -> Result<Value> {
        self.get_json(self.hukamnama_url(), "hukamnama", "Hukamnama")
            .await
    }
}

/// A request seen by [`MockGurbaniSource`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GurbaniCall {
    Ang(u16),
    Search { query: String, variant: SearchVariant },
    Hukamnama,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum CallKey {
    Ang,
    Search(SearchVariant),
    Hukamnama,
}

#[derive(Debug, Clone)]
enum Scripted {
    Body(Value),
    Status(u16),
}

/// Scripted source for tests
///
/// Answers each kind of request with a configured body or status and records
/// every call. Unscripted searches answer with an empty result set;
/// unscripted Ang and hukamnama requests answer 404.
#[derive(Default)]
pub struct MockGurbaniSource {
    responses: HashMap<CallKey, Scripted>,
    calls: Mutex<Vec<GurbaniCall>>,
}

impl MockGurbaniSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ang(mut self, body: Value) -> Self {
        self.responses.insert(CallKey::Ang, Scripted::Body(body));
        self
    }

    pub fn with_ang_status(mut self, status: u16) -> Self {
        self.responses.insert(CallKey::Ang, Scripted::Status(status));
        self
    }

    pub fn with_search(mut self, variant: SearchVariant, body: Value) -> Self {
        self.responses
            .insert(CallKey::Search(variant), Scripted::Body(body));
        self
    }

    pub fn with_search_status(mut self, variant: SearchVariant, status: u16) -> Self {
        self.responses
            .insert(CallKey::Search(variant), Scripted::Status(status));
        self
    }

    pub fn with_hukamnama(mut self, body: Value) -> Self {
        self.responses.insert(CallKey::Hukamnama, Scripted::Body(body));
        self
    }

    /// Calls received so far, oldest first
    pub fn calls(&self) -> Vec<GurbaniCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn answer(&self, key: CallKey, call: GurbaniCall, label: &str) -> Result<Value> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
        match self.responses.get(&key) {
            Some(Scripted::Body(body)) => Ok(body.clone()),
            Some(Scripted::Status(status)) => Err(AppError::Upstream {
                service: GURBANI_SERVICE.to_string(),
                status: *status,
                message: format!("{} API returned {}", label, status),
            }),
            None if matches!(key, CallKey::Search(_)) => {
                Ok(serde_json::json!({ "count": 0, "shabads": [] }))
            }
            None => Err(AppError::Upstream {
                service: GURBANI_SERVICE.to_string(),
                status: 404,
                message: format!("{} API returned 404", label),
            }),
        }
    }
}

#[async_trait]
impl GurbaniSource for MockGurbaniSource {
    async fn ang(&self, ang: AngNumber) -> Result<Value> {
        self.answer(CallKey::Ang, GurbaniCall::Ang(ang.get()), "Ang")
    }

    async fn search(&self, query: &str, variant: SearchVariant) -> Result<Value> {
        self.answer(
            CallKey::Search(variant),
            GurbaniCall::Search {
                query: query.to_string(),
                variant,
            },
            "Search",
        )
    }

    async fn hukamnama_today(&self) -> Result<Value> {
        self.answer(CallKey::Hukamnama, GurbaniCall::Hukamnama, "Hukamnama")
    }
}
