//! Read-only status API.
//!
//! # Responsibilities
//! - Expose the transaction store to a presentation layer
//! - Wire up middleware (tracing, request timeout)
//! - Stop with the rest of the process

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{routing::get, Router};
use tokio::net::TcpListener;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::StatusApiConfig;
use crate::http::handlers;
use crate::store::TransactionStore;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: TransactionStore,
    pub started: Arc<Instant>,
}

/// HTTP server for the status API.
pub struct StatusServer {
    router: Router,
}

impl StatusServer {
    pub fn new(config: &StatusApiConfig, store: TransactionStore) -> Self {
        let state = AppState {
            store,
            started: Arc::new(Instant::now()),
        };
        Self {
            router: Self::build_router(config, state),
        }
    }

    #[allow(deprecated)]
    fn build_router(config: &StatusApiConfig, state: AppState) -> Router {
        Router::new()
            .route("/status", get(handlers::get_status))
            .route("/transactions", get(handlers::list_transactions))
            .route("/transactions/{key}", get(handlers::list_event_transactions))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.request_timeout_secs)))
            .layer(TraceLayer::new_for_http())
    }

    /// The router, for serving elsewhere or driving in tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve on `listener` until `shutdown` resolves.
    pub async fn run<F>(self, listener: TcpListener, shutdown: F) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "Status API starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("Status API stopped");
        Ok(())
    }
}
