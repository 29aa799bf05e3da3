// HTTP service: upload customers and orders into a session, reconcile, download

pub mod error;
pub mod routes;
pub mod state;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    classify::{ServerErrorsAsFailures, SharedClassifier},
    limit::RequestBodyLimitLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

pub use error::ApiError;
pub use state::{AppState, Session, SessionStore};

/// Build the router. Request bodies above `max_upload_bytes` get 413.
pub fn app(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        .route("/sessions", post(routes::create_session))
        .route("/sessions/:id", delete(routes::delete_session))
        .route("/sessions/:id/customers", post(routes::upload_customers))
        .route("/sessions/:id/orders", post(routes::upload_orders))
        .route("/sessions/:id/reconcile", get(routes::reconcile_session))
        .route("/sessions/:id/combined", get(routes::combined))
        .route("/sessions/:id/download/:dataset", get(routes::download))
        .with_state(state)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_upload_bytes))
        .layer(tracing_layer())
}

pub fn tracing_layer() -> TraceLayer<SharedClassifier<ServerErrorsAsFailures>> {
    TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(
            DefaultOnResponse::new()
                .level(Level::INFO)
                .latency_unit(tower_http::LatencyUnit::Micros),
        )
}
