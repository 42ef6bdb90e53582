//! ReadUp API Gateway
//!
//! The main entry point for all external API requests.
//! Handles:
//! - Session verification
//! - Request routing
//! - Observability (logging, metrics, tracing)

mod handlers;

use axum::{
    extract::{FromRef, MatchedPath, Request},
    middleware::{self, Next},
    response::Response,
    routing::{get, post, put},
    Router,
};
use metrics_exporter_prometheus::PrometheusBuilder;
use readup_common::{
    auth::SessionVerifier,
    cache::TtlCache,
    catalog::CatalogClient,
    config::AppConfig,
    db::{ContentStore, DbPool, Repository},
    identity::IdentityClient,
    lists::ListService,
    metrics,
    reviews::ReviewService,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::{info, Level};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: DbPool,
    pub reviews: ReviewService,
    pub lists: ListService,
    pub catalog: CatalogClient,
    pub feed_cache: Arc<TtlCache<serde_json::Value>>,
    pub verifier: SessionVerifier,
}

impl FromRef<AppState> for SessionVerifier {
    fn from_ref(state: &AppState) -> Self {
        state.verifier.clone()
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load()?;
    let config = Arc::new(config);

    // Initialize tracing
    let level = config
        .observability
        .log_level
        .parse::<Level>()
        .unwrap_or(Level::INFO);
    if config.observability.json_logging {
        tracing_subscriber::fmt()
            .with_max_level(level)
            .with_target(true)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_max_level(level)
            .with_target(true)
            .init();
    }

    info!("Starting ReadUp API Gateway v{}", readup_common::VERSION);

    // Initialize metrics
    metrics::register_metrics();
    if config.observability.metrics_port != 0 {
        let metrics_addr =
            SocketAddr::from(([0, 0, 0, 0], config.observability.metrics_port));
        PrometheusBuilder::new()
            .with_http_listener(metrics_addr)
            .set_buckets(metrics::LATENCY_BUCKETS)?
            .install()?;
        info!("Metrics exporter listening on {}", metrics_addr);
    }

    // Initialize database connection
    info!("Connecting to database...");
    let db = DbPool::new(&config.database).await?;
    let store: Arc<dyn ContentStore> = Arc::new(Repository::new(db.clone()));

    // External clients
    let identity = Arc::new(IdentityClient::new(&config.identity)?);
    let catalog = CatalogClient::new(&config.catalog)?;

    // Session verification
    let session_secret = config
        .identity
        .session_secret
        .as_deref()
        .ok_or("identity.session_secret is required")?;
    let verifier = SessionVerifier::new(session_secret);

    // Create app state
    let state = AppState {
        config: config.clone(),
        db,
        reviews: ReviewService::new(store.clone(), identity),
        lists: ListService::new(store),
        catalog,
        feed_cache: Arc::new(TtlCache::new("feed", config.feed_ttl())),
        verifier,
    };

    // Build the router
    let app = create_router(state);

    // Start the server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Create the main application router
fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Request ID propagation
    let request_id = SetRequestIdLayer::x_request_id(MakeRequestUuid);
    let propagate_id = PropagateRequestIdLayer::x_request_id();

    // API routes
    let api_routes = Router::new()
        // Review endpoints. GET takes a book ISBN; DELETE takes a review id.
        .route("/reviews", post(handlers::reviews::create_review))
        .route(
            "/reviews/{id}",
            get(handlers::reviews::reviews_for_book).delete(handlers::reviews::delete_review),
        )
        .route(
            "/reviews/user/{user_id}",
            get(handlers::reviews::reviews_for_user),
        )
        .route(
            "/reviews/review/{review_id}",
            get(handlers::reviews::get_review).put(handlers::reviews::update_review),
        )
        .route("/reviews/{id}/upvote", post(handlers::reviews::toggle_upvote))
        // Reading-list endpoints
        .route(
            "/lists",
            get(handlers::lists::get_lists).post(handlers::lists::create_list),
        )
        .route("/lists/{list_id}/items", post(handlers::lists::add_book))
        .route(
            "/lists/{list_id}/items/{book_isbn}",
            axum::routing::delete(handlers::lists::remove_book),
        )
        .route(
            "/lists/{list_id}/items/{book_isbn}/move/{target_list_id}",
            put(handlers::lists::move_book),
        )
        // Book catalog endpoints
        .route("/books/feed", get(handlers::books::feed))
        .route("/books/search", get(handlers::books::search))
        // Admin endpoints
        .route("/admin/reset", post(handlers::admin::reset));

    // Compose the app
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/ready", get(handlers::health::ready))
        .nest("/api", api_routes)
        .route_layer(middleware::from_fn(track_metrics))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(request_id)
        .layer(propagate_id)
        .with_state(state)
}

/// Low-cardinality metrics label: the matched route template when the
/// router has one, the raw path otherwise
fn route_label(req: &Request) -> String {
    req.extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| req.uri().path().to_owned())
}

/// Record count and latency for every routed request
async fn track_metrics(req: Request, next: Next) -> Response {
    let tracker = metrics::RequestMetrics::start(req.method().as_str(), &route_label(&req));
    let response = next.run(req).await;
    tracker.finish(response.status().as_u16());
    response
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => tracing::error!(error = %e, "Failed to install signal handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, starting shutdown..."),
        _ = terminate => info!("Received SIGTERM, starting shutdown..."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    #[test]
    fn test_route_label_falls_back_to_raw_path() {
        let req = Request::builder()
            .uri("/api/books/feed")
            .body(Body::empty())
            .unwrap();
        assert_eq!(route_label(&req), "/api/books/feed");
    }
}
