//! Guest sign-in handler

use axum::{body::Bytes, extract::State, Json};
use serde::Deserialize;
use tracing::instrument;
use validator::Validate;

use crate::AppState;
use sangat_common::{
    auth::IssuedToken,
    errors::{AppError, Result},
};

/// Optional body of `POST /api/auth/guest`
#[derive(Debug, Default, Deserialize, Validate)]
pub struct GuestSignInRequest {
    #[validate(length(min = 1, max = 80, message = "display_name must be 1-80 characters"))]
    pub display_name: Option<String>,
}

/// Issue a token for a fresh anonymous user
#[instrument(skip(state, body))]
pub async fn guest_sign_in(State(state): State<AppState>, body: Bytes) -> Result<Json<IssuedToken>> {
    let manager = state.auth.manager()?;

    let request = if body.iter().all(u8::is_ascii_whitespace) {
        GuestSignInRequest::default()
    } else {
        serde_json::from_slice::<GuestSignInRequest>(&body)
            .map_err(|e| AppError::validation("body", format!("Invalid sign-in request: {}", e)))?
    };
    let display_name = request
        .display_name
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty());
    GuestSignInRequest {
        display_name: display_name.clone(),
    }
    .validate()?;

    let issued = manager.issue_guest(display_name)?;
    tracing::info!(user_id = %issued.user_id, "Guest signed in");
    Ok(Json(issued))
}
