//! # Rank Permission HTTP Server
//!
//! Reference hosting environment for the rank permission engine. Exposes
//! the permission check and rank mutation procedures over REST.
//!
//! ## Endpoints
//!
//! - `POST /v1/check` - Tri-state permission check
//! - `POST /v1/ranks/grant` - Grant a permanent or session rank
//! - `POST /v1/ranks/revoke` - Revoke a permanent or session rank
//! - `GET /v1/ranks/:principal` - List a principal's ranks
//! - `GET /v1/ranks` - List all configured ranks
//! - `POST /v1/reload` - Reload catalog and persisted grants
//! - `GET /health` - Health check
//!
//! ## Configuration
//!
//! Environment variables:
//! - `PORT` - HTTP server port (default: 8080)
//! - `RANKPERMS_CONFIG` - Catalog file (default: config.yml)
//! - `RANKPERMS_DATA` - Principal rank file (default: principal_ranks.yml)
//! - `RUST_LOG` - Log level (default: info)

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    serve, Router,
};
use rankperms::{
    config::FileConfigSource,
    display::{AlwaysOnlineDirectory, LoggingPresentationSink},
    persist::YamlFileSink,
    PermissionCheck, RankError, RankService,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{error, info, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Shared application state
#[derive(Clone)]
struct AppState {
    service: Arc<RankService>,
    start_time: std::time::Instant,
}

/// Error response body
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

/// Application error type
#[derive(Debug)]
enum AppError {
    UnknownRank(String),
    Config(String),
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            AppError::UnknownRank(msg) => (StatusCode::NOT_FOUND, "unknown_rank", msg),
            AppError::Config(msg) => (StatusCode::UNPROCESSABLE_ENTITY, "config_error", msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg),
        };

        let body = Json(ErrorResponse {
            error: error.to_string(),
            message,
        });

        (status, body).into_response()
    }
}

impl From<RankError> for AppError {
    fn from(err: RankError) -> Self {
        match err {
            RankError::UnknownRank(rank) => AppError::UnknownRank(rank),
            RankError::Config(msg) => AppError::Config(msg),
            other => AppError::Internal(other.to_string()),
        }
    }
}

/// Permission check request
#[derive(Debug, Deserialize)]
struct CheckRequest {
    principal: String,
    permission: String,
}

/// Permission check response
#[derive(Debug, Serialize)]
struct CheckResponse {
    result: PermissionCheck,
    allowed: bool,
}

/// Rank mutation request
#[derive(Debug, Deserialize)]
struct MutateRequest {
    principal: String,
    rank: String,
    /// Session-only mutation, not persisted
    #[serde(default)]
    session: bool,
}

/// Rank mutation response
#[derive(Debug, Serialize)]
struct MutateResponse {
    changed: bool,
}

/// Principal rank listing
#[derive(Debug, Serialize)]
struct PrincipalRanksResponse {
    permanent: BTreeSet<String>,
    session: BTreeSet<String>,
    effective: BTreeSet<String>,
}

/// Catalog rank listing, priority order
#[derive(Debug, Serialize)]
struct RankListResponse {
    ranks: Vec<String>,
}

/// Health check response
#[derive(Debug, Serialize)]
struct HealthResponse {
    status: String,
    uptime_seconds: u64,
    version: String,
}

/// POST /v1/check - Tri-state permission check
async fn check_permission(
    State(state): State<AppState>,
    Json(req): Json<CheckRequest>,
) -> Json<CheckResponse> {
    let result = state
        .service
        .check_permission(&req.principal, &req.permission)
        .await;

    info!(
        "Check: principal={}, permission={}, result={:?}",
        req.principal, req.permission, result
    );

    Json(CheckResponse {
        result,
        allowed: result.is_allowed(),
    })
}

/// POST /v1/ranks/grant - Grant a rank
async fn grant_rank(
    State(state): State<AppState>,
    Json(req): Json<MutateRequest>,
) -> Result<Json<MutateResponse>, AppError> {
    if req.session {
        state.service.grant_session(&req.principal, &req.rank).await?;
    } else {
        state.service.grant_permanent(&req.principal, &req.rank).await?;
    }
    Ok(Json(MutateResponse { changed: true }))
}

/// POST /v1/ranks/revoke - Revoke a rank
async fn revoke_rank(
    State(state): State<AppState>,
    Json(req): Json<MutateRequest>,
) -> Result<Json<MutateResponse>, AppError> {
    let changed = if req.session {
        state.service.revoke_session(&req.principal, &req.rank).await
    } else {
        state.service.revoke_permanent(&req.principal, &req.rank).await?
    };
    Ok(Json(MutateResponse { changed }))
}

/// GET /v1/ranks/:principal - List a principal's ranks
async fn principal_ranks(
    State(state): State<AppState>,
    Path(principal): Path<String>,
) -> Json<PrincipalRanksResponse> {
    let (permanent, session) = state.service.ranks_of(&principal).await;
    let effective = state.service.effective_ranks(&principal).await;

    Json(PrincipalRanksResponse {
        permanent,
        session,
        effective,
    })
}

/// GET /v1/ranks - List all configured ranks
async fn list_ranks(State(state): State<AppState>) -> Json<RankListResponse> {
    Json(RankListResponse {
        ranks: state.service.list_ranks().await,
    })
}

/// POST /v1/reload - Reload catalog and grants
async fn reload(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    state.service.reload().await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /health - Health check endpoint
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        version: rankperms::VERSION.to_string(),
    })
}

/// Create the HTTP router with all endpoints
fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let trace = TraceLayer::new_for_http().on_response(DefaultOnResponse::new().level(Level::INFO));

    Router::new()
        .route("/v1/check", post(check_permission))
        .route("/v1/ranks/grant", post(grant_rank))
        .route("/v1/ranks/revoke", post(revoke_rank))
        .route("/v1/ranks/:principal", get(principal_ranks))
        .route("/v1/ranks", get(list_ranks))
        .route("/v1/reload", post(reload))
        .route("/health", get(health_check))
        .layer(ServiceBuilder::new().layer(trace).layer(cors))
        .with_state(state)
}

/// Graceful shutdown handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            info!("Received SIGTERM signal");
        }
    }

    info!("Starting graceful shutdown");
}

/// Main server entrypoint
#[tokio::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting rank permission server v{}", rankperms::VERSION);

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(8080);

    let catalog_path =
        std::env::var("RANKPERMS_CONFIG").unwrap_or_else(|_| "config.yml".to_string());
    let data_path =
        std::env::var("RANKPERMS_DATA").unwrap_or_else(|_| "principal_ranks.yml".to_string());

    info!("Configuration:");
    info!("  Port: {}", port);
    info!("  Catalog: {}", catalog_path);
    info!("  Principal ranks: {}", data_path);

    let config_source = Arc::new(FileConfigSource::new(&catalog_path, &data_path));
    if let Err(e) = config_source.ensure_catalog_exists().await {
        error!("Failed to write default catalog: {}", e);
        return Err(std::io::Error::new(std::io::ErrorKind::Other, e.to_string()));
    }

    info!("Loading rank service...");
    let service = match RankService::load(
        config_source,
        Arc::new(YamlFileSink::new(&data_path)),
        Arc::new(AlwaysOnlineDirectory),
        Arc::new(LoggingPresentationSink),
    )
    .await
    {
        Ok(s) => Arc::new(s),
        Err(e) => {
            error!("Failed to load rank service: {}", e);
            return Err(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("Rank service load failed: {}", e),
            ));
        }
    };

    info!("Rank service loaded successfully");

    let state = AppState {
        service: Arc::clone(&service),
        start_time: std::time::Instant::now(),
    };

    let app = create_router(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    info!("Starting HTTP server on {}", addr);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            error!("Failed to bind HTTP server: {}", e);
            return Err(e);
        }
    };

    let result = serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await;

    // Final persist before exit, regardless of how the server stopped.
    if let Err(e) = service.shutdown().await {
        error!("Final persist failed: {}", e);
    }

    match result {
        Ok(()) => {
            info!("Server shut down gracefully");
            Ok(())
        }
        Err(e) => {
            error!("Server error: {}", e);
            Err(e)
        }
    }
}
