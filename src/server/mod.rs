//! HTTP surface: router, shared state and middleware.

pub mod rate_limit;
mod routes;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use axum::extract::Request;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::get;
use log::info;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

use crate::config::AnalyticsConfig;
use crate::source::DocumentSource;
use rate_limit::RateLimiter;

/// Arrival time of a request, stamped before any handler runs.
#[derive(Debug, Clone, Copy)]
pub struct RequestStart(pub Instant);

/// State shared by all handlers. Nothing in it changes per analysis.
pub struct AppState {
    pub config: AnalyticsConfig,
    pub source: Arc<dyn DocumentSource>,
    pub limiter: RateLimiter,
    pub cors_enabled: bool,
}

impl AppState {
    pub fn new(config: AnalyticsConfig, source: Arc<dyn DocumentSource>) -> Self {
        let limiter = RateLimiter::new(&config.rate_limit);
        Self {
            config,
            source,
            limiter,
            cors_enabled: true,
        }
    }

    pub fn with_cors(mut self, enabled: bool) -> Self {
        self.cors_enabled = enabled;
        self
    }
}

async fn stamp_request_start(mut req: Request, next: Next) -> Response {
    req.extensions_mut().insert(RequestStart(Instant::now()));
    next.run(req).await
}

pub fn build_router(state: Arc<AppState>) -> Router {
    let review_routes = Router::new()
        .route(
            "/top-20-common-words",
            get(routes::common_words).layer(middleware::from_fn_with_state(
                state.clone(),
                rate_limit::enforce,
            )),
        )
        .route("/top-10-positive-words", get(routes::positive_words))
        .route("/top-10-negative-words", get(routes::negative_words))
        .route("/word-cloud-analysis", get(routes::word_cloud))
        .route("/word-association-graph", get(routes::word_associations));

    let mut router = Router::new()
        .route("/", get(routes::index))
        .nest("/api/review", review_routes)
        .with_state(state.clone())
        .layer(middleware::from_fn(stamp_request_start));

    if state.cors_enabled {
        router = router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );
    }

    router
}

pub struct AnalyticsServer {
    router: Router,
}

impl AnalyticsServer {
    pub fn new(state: AppState) -> Self {
        Self {
            router: build_router(Arc::new(state)),
        }
    }

    pub async fn run(self, addr: SocketAddr) -> std::io::Result<()> {
        let listener = TcpListener::bind(addr).await?;
        info!("Review analytics server listening on {}", listener.local_addr()?);
        axum::serve(
            listener,
            self.router
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
    }
}
