//! REST API Routes Module
//!
//! Includes:
//! - Auth routes (register, login, logout) under /api/auth
//! - Inventory item CRUD under /api/inventron/items
//! - Health check endpoints (Kubernetes-compatible)
//! - Prometheus metrics and the OpenAPI document
//! - CORS support for browser-based clients

pub mod auth;
pub mod health;
pub mod item;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::{header, HeaderValue, Method, StatusCode},
    middleware::{from_fn, from_fn_with_state},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use inventron_storage::{ItemRepository, ReadThroughCache, UserStore};
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use crate::auth::TokenIssuer;
use crate::config::ApiConfig;
use crate::middleware::{session_gateway, SessionGatewayState};
use crate::openapi::ApiDoc;
use crate::services::ItemService;
use crate::telemetry::{metrics_handler, observability_middleware};

/// Shared handles the router is built from.
#[derive(Clone)]
pub struct AppContext {
    pub items: Arc<dyn ItemRepository>,
    pub users: Arc<dyn UserStore>,
    pub cache: ReadThroughCache,
    pub issuer: Arc<TokenIssuer>,
}

impl AppContext {
    pub fn item_service(&self) -> ItemService {
        ItemService::new(self.items.clone(), self.cache.clone())
    }
}

/// Handler for /openapi.json endpoint.
async fn openapi_json() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}

// ============================================================================
// CORS LAYER
// ============================================================================

/// Build the CORS layer from ApiConfig.
///
/// Credentialed CORS needs explicit origins, so the allow-all development
/// mode never sends `Access-Control-Allow-Credentials`.
fn build_cors_layer(config: &ApiConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .max_age(Duration::from_secs(config.cors_max_age_secs));

    if !config.is_production() {
        tracing::info!("CORS: Development mode - allowing all origins");
        cors.allow_origin(Any)
    } else {
        tracing::info!(
            "CORS: Production mode - allowing origins: {:?}",
            config.cors_origins
        );
        let origins: Vec<HeaderValue> = config
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();

        if config.cors_allow_credentials {
            cors.allow_origin(origins).allow_credentials(true)
        } else {
            cors.allow_origin(origins)
        }
    }
}

// ============================================================================
// ROUTER
// ============================================================================

/// Create the complete API router.
///
/// Layer order, outermost first: CORS, request tracing, metrics, timeout,
/// session gateway. The gateway never rejects; item handlers demand an
/// identity through `AuthenticatedUser`.
pub fn create_api_router(api_config: &ApiConfig, app: AppContext) -> Router {
    let gateway_state = SessionGatewayState::new(app.issuer.clone());

    let api_routes = Router::new()
        .nest(
            "/auth",
            auth::create_router(auth::AuthState::new(app.users.clone(), app.issuer.clone())),
        )
        .nest("/inventron/items", item::create_router(app.item_service()));

    Router::new()
        .nest("/api", api_routes)
        .nest(
            "/health",
            health::create_router(app.items.clone(), app.cache.clone()),
        )
        .route("/metrics", get(metrics_handler))
        .route("/openapi.json", get(openapi_json))
        .layer(from_fn_with_state(gateway_state, session_gateway))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            api_config.request_timeout,
        ))
        .layer(from_fn(observability_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer(api_config))
}
