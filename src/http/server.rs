//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with all handlers
//! - Wire up middleware (tracing, request id, bearer auth)
//! - Serve on a bound listener until shutdown

use std::future::Future;
use std::sync::Arc;

use axum::{
    http::HeaderName,
    middleware,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::context::BridgeContext;
use crate::http::auth::bearer_auth_middleware;
use crate::http::handlers;

pub const X_REQUEST_ID: &str = "x-request-id";

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub context: Arc<BridgeContext>,
    pub access_token: Arc<str>,
}

/// HTTP surface over one [`BridgeContext`].
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    pub fn new(context: Arc<BridgeContext>) -> Self {
        let state = AppState {
            access_token: Arc::from(context.config().listener.access_token.as_str()),
            context,
        };
        Self {
            router: Self::build_router(state),
        }
    }

    /// Build the Axum router with all middleware layers.
    pub fn build_router(state: AppState) -> Router {
        let request_id = HeaderName::from_static(X_REQUEST_ID);

        let protected = Router::new()
            .route("/ask", post(handlers::ask))
            .route("/queue", post(handlers::queue))
            .route("/runqueue", post(handlers::run_queue))
            .route("/status", get(handlers::status))
            .route_layer(middleware::from_fn_with_state(state.clone(), bearer_auth_middleware));

        Router::new()
            .route("/ping", get(handlers::ping))
            .merge(protected)
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::new(request_id)),
            )
    }

    /// Serve on `listener` until `shutdown` resolves.
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
