//! Ang lookup and Gurbani search handler

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::{HeaderName, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use tracing::instrument;

use crate::AppState;
use sangat_common::{
    errors::Result,
    gurbani::{QueryKind, SearchQuery},
};

/// Response header naming what answered: `ang`, or the search variant
pub const SEARCH_VARIANT_HEADER: &str = "x-search-variant";

#[derive(Debug, Deserialize)]
pub struct ShabadParams {
    pub query: Option<String>,

    /// `ang` or `search`; auto-detected when absent
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

/// Classify the query, then run the Ang lookup or the search with fallback
#[instrument(skip(state, params))]
pub async fn shabad(
    State(state): State<AppState>,
    params: std::result::Result<Query<ShabadParams>, QueryRejection>,
) -> Result<Response> {
    let Query(params) = params?;

    let kind = params
        .kind
        .as_deref()
        .filter(|k| !k.trim().is_empty())
        .map(QueryKind::parse)
        .transpose()?;
    let query = SearchQuery::classify(params.query.as_deref().unwrap_or_default(), kind)?;

    let outcome = state.search.lookup(&query).await?;
    tracing::debug!(
        path = query.path(),
        variant = outcome.label(),
        matches = ?outcome.matches,
        "Search answered"
    );

    Ok((
        [(
            HeaderName::from_static(SEARCH_VARIANT_HEADER),
            HeaderValue::from_static(outcome.label()),
        )],
        Json(outcome.body),
    )
        .into_response())
}
