use axum::{extract::State, Json};
use serde_json::Value;
use tracing::instrument;

use crate::AppState;
use sangat_common::errors::Result;

/// Today's hukamnama from the Gurbani API
#[instrument(skip(state))]
pub async fn hukamnama(State(state): State<AppState>) -> Result<Json<Value>> {
    state.search.hukamnama_today().await.map(Json)
}
