//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router with all handlers
//! - Wire up middleware (request ID, tracing, instrumentation, panic guard)
//! - Serve on a bound listener until the shutdown future resolves

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{middleware, routing::get, Router};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};

use crate::http::handlers;
use crate::http::middleware::instrument;
use crate::http::request::{propagate_request_id_layer, set_request_id_layer};
use crate::http::response::{not_found, panic_response};
use crate::observability::Metrics;
use crate::simulation::LeakStore;

/// Process-wide state shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub metrics: Metrics,
    pub leaks: Arc<LeakStore>,
    started_at: Instant,
}

impl AppState {
    pub fn new(metrics: Metrics) -> Self {
        Self {
            metrics,
            leaks: Arc::new(LeakStore::new()),
            started_at: Instant::now(),
        }
    }

    /// Time since this state was created.
    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }
}

/// Routes without layers. Handlers still need `AppState`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::root))
        .route("/api/fast", get(handlers::fast))
        .route("/api/slow", get(handlers::slow))
        .route("/api/faulty", get(handlers::faulty))
        .route("/api/memory-leak", get(handlers::memory_leak))
        .route("/api/cpu-intensive", get(handlers::cpu_intensive))
        .route("/metrics", get(handlers::metrics))
        .route("/health", get(handlers::health))
        .fallback(not_found)
}

/// Apply the middleware stack to a set of routes, outermost first.
///
/// Instrumentation sits outside the panic guard so a panicking handler is
/// still counted, with its final 500 status.
pub fn with_layers(routes: Router<AppState>, state: AppState) -> Router {
    routes
        .layer(
            ServiceBuilder::new()
                .layer(set_request_id_layer())
                .layer(propagate_request_id_layer())
                .layer(TraceLayer::new_for_http())
                .layer(middleware::from_fn_with_state(state.clone(), instrument))
                .layer(CatchPanicLayer::custom(panic_response)),
        )
        .with_state(state)
}

/// The full application router.
pub fn build_router(state: AppState) -> Router {
    with_layers(routes(), state)
}

/// HTTP server for the service.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    pub fn new(state: AppState) -> Self {
        Self {
            router: build_router(state),
        }
    }

    /// Serve on `listener` until `shutdown` resolves, then finish in-flight requests.
    pub async fn run<F>(self, listener: TcpListener, shutdown: F) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
