//! Sangat API Gateway
//!
//! HTTP surface for the devotional content service:
//! - Persona chat and the model catalog
//! - Ang lookup, Gurbani search and the daily hukamnama
//! - Guest sign-in and the seva board
//! - Health and readiness probes

pub mod handlers;
pub mod middleware;
pub mod telemetry;

use axum::{
    extract::FromRef,
    routing::{get, post},
    Router,
};
use sangat_common::{
    auth::AuthState,
    chat::{create_backend, ChatService},
    config::AppConfig,
    errors::Result,
    gurbani::{GurbaniNowClient, SearchService},
    seva::{InMemorySevaStore, PgSevaStore, SevaService, SevaStore},
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::info;

use crate::middleware::rate_limit::{rate_limit, RateLimitState};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub chat: Arc<ChatService>,
    pub search: Arc<SearchService>,
    pub seva: Arc<SevaService>,
    pub auth: AuthState,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        state.auth.clone()
    }
}

impl AppState {
    /// Wire every service from configuration.
    ///
    /// The seva board uses PostgreSQL when `database.url` is set and an
    /// in-process store otherwise.
    pub async fn from_config(config: AppConfig) -> Result<Self> {
        let backend = create_backend(&config.generative)?;
        let chat = ChatService::new(backend, config.generative.history_window);

        let gurbani = GurbaniNowClient::new(
            Some(config.gurbani.api_base.as_str()),
            config.gurbani_timeout(),
        )?;
        let search = SearchService::new(Arc::new(gurbani));

        let store: Arc<dyn SevaStore> = match config.database.url {
            Some(_) => Arc::new(PgSevaStore::connect(&config.database).await?),
            None => {
                info!("No database configured, keeping seva events in memory");
                Arc::new(InMemorySevaStore::new())
            }
        };

        let auth = AuthState::from_secret(
            config.auth.jwt_secret.as_deref(),
            config.auth.jwt_expiration_secs,
        );
        if !auth.is_enabled() {
            tracing::warn!("auth.jwt_secret is not set; sign-in and seva writes are disabled");
        }

        Ok(Self {
            config: Arc::new(config),
            chat: Arc::new(chat),
            search: Arc::new(search),
            seva: Arc::new(SevaService::new(store)),
            auth,
        })
    }
}

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let request_id = SetRequestIdLayer::x_request_id(MakeRequestUuid);
    let propagate_id = PropagateRequestIdLayer::x_request_id();

    // Routes that spend generative quota
    let mut generative_routes = Router::new()
        .route("/chat", post(handlers::chat::chat))
        .route("/models", get(handlers::models::list_models));

    let limits = &state.config.rate_limit;
    if limits.enabled {
        let limiter = RateLimitState::new(limits.requests_per_second, limits.burst);
        generative_routes = generative_routes
            .route_layer(axum::middleware::from_fn_with_state(limiter, rate_limit));
    }

    let api_routes = Router::new()
        .merge(generative_routes)
        // Gurbani
        .route("/shabad", get(handlers::shabad::shabad))
        .route("/hukamnama", get(handlers::hukamnama::hukamnama))
        // Sign-in
        .route("/auth/guest", post(handlers::auth::guest_sign_in))
        // Seva board
        .route(
            "/seva/events",
            get(handlers::seva::list_events).post(handlers::seva::create_event),
        )
        .route("/seva/events/{id}/join", post(handlers::seva::join_event));

    let body_limit = state.config.server.body_limit_bytes;

    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/ready", get(handlers::health::ready))
        .nest("/api", api_routes)
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(request_id)
        .layer(propagate_id)
        .with_state(state)
}
