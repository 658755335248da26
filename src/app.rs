use axum::{
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware,
    routing::get,
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::audit::AuditRecorder;
use crate::auth::TokenVerifier;
use crate::config::SecurityConfig;
use crate::database::{AuditSink, MemoryStore, Store};
use crate::handlers::{protected, public};
use crate::middleware::jwt_auth_middleware;

/// Everything a handler may touch, constructed once at startup.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub audit: AuditRecorder,
    pub verifier: Arc<TokenVerifier>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, audit_sink: Arc<dyn AuditSink>, jwt_secret: &str) -> Self {
        Self {
            store,
            audit: AuditRecorder::new(audit_sink),
            verifier: Arc::new(TokenVerifier::new(jwt_secret)),
        }
    }

    /// State backed by a single [`MemoryStore`] for both resources and audit.
    pub fn in_memory(jwt_secret: &str) -> (Self, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let state = Self::new(store.clone(), store.clone(), jwt_secret);
        (state, store)
    }
}

pub fn router(state: AppState, security: &SecurityConfig) -> Router {
    let app = Router::new()
        // Public
        .route("/", get(public::root))
        .route("/health", get(public::health))
        // Protected API
        .merge(api_routes(state.clone()))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if security.enable_cors {
        app.layer(cors_layer(&security.cors_origins))
    } else {
        app
    }
}

fn api_routes(state: AppState) -> Router<AppState> {
    use protected::{admin, dashboard, groups, loans, persons};

    Router::new()
        .route("/api/persons", get(persons::list).post(persons::create))
        .route(
            "/api/persons/:id",
            get(persons::show).put(persons::update).delete(persons::delete),
        )
        .route("/api/groups", get(groups::list).post(groups::create))
        .route(
            "/api/groups/:id",
            get(groups::show).put(groups::update).delete(groups::delete),
        )
        .route("/api/loans", get(loans::list).post(loans::create))
        .route(
            "/api/loans/:id",
            get(loans::show).put(loans::update).delete(loans::delete),
        )
        .route("/api/dashboard/summary", get(dashboard::summary))
        .route("/api/admin/audit-logs", get(admin::audit_logs))
        // Token verification for every matched /api route
        .route_layer(middleware::from_fn_with_state(state, jwt_auth_middleware))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
}
