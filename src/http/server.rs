//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the save, health and preflight handlers
//! - Wire up middleware (request ID, tracing, metrics, CORS, timeout)
//! - Apply rate limiting to write routes
//! - Bind server to listener and stop on the shutdown signal

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    http::Request,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{catch_panic::CatchPanicLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::SaverConfig;
use crate::http::handlers::{health_handler, save_handler};
use crate::http::request::{propagate_request_id_layer, set_request_id_layer};
use crate::http::response::SaveError;
use crate::observability::{metrics, spans::make_request_span};
use crate::remote::{GitHubClient, RemoteError, RemoteRepository};
use crate::resilience::{Delay, TokioDelay};
use crate::save::{CommitOrchestrator, CommitPolicy, ContentValidator};
use crate::security::cors::{cors_middleware, preflight_handler};
use crate::security::rate_limit::rate_limit_middleware;
use crate::security::RateLimiter;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<SaverConfig>,
    pub limiter: Arc<RateLimiter>,
    pub validator: ContentValidator,
    /// `None` when the repository or token is not configured.
    pub orchestrator: Option<CommitOrchestrator>,
}

impl AppState {
    pub fn new(
        config: SaverConfig,
        remote: Option<Arc<dyn RemoteRepository>>,
        delay: Arc<dyn Delay>,
    ) -> Self {
        let limiter = Arc::new(RateLimiter::new(&config.rate_limit));
        let validator = ContentValidator::new(config.limits.max_content_size);
        let policy = CommitPolicy::from_config(&config.retries, &config.remote);
        let orchestrator = remote.map(|remote| CommitOrchestrator::new(remote, delay, policy));

        Self {
            config: Arc::new(config),
            limiter,
            validator,
            orchestrator,
        }
    }
}

/// HTTP server for the save handler.
pub struct HttpServer {
    router: Router,
    state: AppState,
}

impl HttpServer {
    /// Create a server talking to GitHub with the configured credentials.
    pub fn new(config: SaverConfig) -> Result<Self, RemoteError> {
        let remote = GitHubClient::from_config(&config.remote)?
            .map(|client| Arc::new(client) as Arc<dyn RemoteRepository>);

        if remote.is_none() {
            tracing::warn!("GitHub token or repository missing; saves will be refused");
        }

        Ok(Self::with_repository(config, remote))
    }

    /// Create a server over an arbitrary repository implementation.
    pub fn with_repository(config: SaverConfig, remote: Option<Arc<dyn RemoteRepository>>) -> Self {
        Self::with_parts(config, remote, Arc::new(TokioDelay))
    }

    pub fn with_parts(
        config: SaverConfig,
        remote: Option<Arc<dyn RemoteRepository>>,
        delay: Arc<dyn Delay>,
    ) -> Self {
        let state = AppState::new(config, remote, delay);
        let router = Self::build_router(state.clone());
        Self { router, state }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(state: AppState) -> Router {
        let request_timeout = Duration::from_secs(state.config.timeouts.request_secs);

        let stack = ServiceBuilder::new()
            .layer(set_request_id_layer())
            .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
            .layer(propagate_request_id_layer())
            .layer(middleware::from_fn(track_requests))
            .layer(middleware::from_fn_with_state(state.clone(), cors_middleware))
            .layer(CatchPanicLayer::custom(panic_response))
            .layer(TimeoutLayer::new(request_timeout));

        Router::new()
            .route(
                "/",
                get(health_handler).post(save_handler).options(preflight_handler),
            )
            .route(
                "/save",
                get(health_handler).post(save_handler).options(preflight_handler),
            )
            .route_layer(middleware::from_fn_with_state(
                state.clone(),
                rate_limit_middleware,
            ))
            .layer(stack)
            .with_state(state)
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            file_path = %self.state.config.remote.file_path,
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// A panicking handler still answers, with a generic 500.
fn panic_response(_panic: Box<dyn std::any::Any + Send + 'static>) -> Response {
    tracing::error!("Handler panicked");
    SaveError::Internal.into_response()
}

/// Record method, status and latency of every request.
async fn track_requests(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();

    let response = next.run(request).await;

    metrics::record_request(&method, response.status().as_u16(), start);
    response
}
