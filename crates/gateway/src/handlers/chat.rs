//! Chat proxy handler

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::AppState;
use sangat_common::{chat::ChatTurn, errors::Result};

/// Chat request
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,

    /// Prior turns as the client shows them, oldest first
    #[serde(default)]
    pub history: Vec<ChatTurn>,
}

/// Chat response
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub text: String,
}

/// Forward one message plus bounded history to the generative backend
#[instrument(skip(state, payload))]
pub async fn chat(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>> {
    let Json(request) = payload?;
    let text = state.chat.send(&request.message, &request.history).await?;
    Ok(Json(ChatResponse { text }))
}
