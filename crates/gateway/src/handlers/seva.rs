//! Seva board handlers

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    Json,
};
use tracing::instrument;
use uuid::Uuid;

use crate::AppState;
use sangat_common::{
    auth::UserContext,
    errors::Result,
    seva::{CreateSevaEventRequest, JoinResponse, SevaEventView},
};

/// Every event, soonest first
pub async fn list_events(State(state): State<AppState>) -> Result<Json<Vec<SevaEventView>>> {
    let events = state.seva.list().await?;
    Ok(Json(events.iter().map(|e| e.view()).collect()))
}

#[instrument(skip(state, user, payload), fields(user_id = %user.user_id))]
pub async fn create_event(
    State(state): State<AppState>,
    user: UserContext,
    payload: std::result::Result<Json<CreateSevaEventRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SevaEventView>)> {
    let Json(request) = payload?;
    let event = state.seva.create(request, &user).await?;
    Ok((StatusCode::CREATED, Json(event.view())))
}

/// Join as the signed-in user; joining twice is a no-op
#[instrument(skip(state, user, id), fields(user_id = %user.user_id))]
pub async fn join_event(
    State(state): State<AppState>,
    user: UserContext,
    id: std::result::Result<Path<Uuid>, PathRejection>,
) -> Result<Json<JoinResponse>> {
    let Path(id) = id?;
    let outcome = state.seva.join(id, &user.user_id).await?;

    Ok(Json(JoinResponse {
        joined: outcome.joined(),
        event: outcome.event().view(),
    }))
}
