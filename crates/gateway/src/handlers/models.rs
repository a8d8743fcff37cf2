//! Model catalog handler

use axum::{extract::State, Json};
use serde_json::Value;
use tracing::instrument;

use crate::AppState;
use sangat_common::errors::Result;

/// Upstream model catalog, unmodified
#[instrument(skip(state))]
pub async fn list_models(State(state): State<AppState>) -> Result<Json<Value>> {
    state.chat.model_catalog().await.map(Json)
}
