//! HTTP surface for the negotiation intelligence engine.

pub mod negotiation_routes;
pub mod request_id;
pub mod stream_routes;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use llm_client::{provider_from_config, LlmConfig, LlmProvider};
use negotiation_core::NegotiationError;
use negotiation_orchestrator::{AINegotiationPartner, HttpMarketDataClient, UnavailableMarketData};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::Span;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "api_server=info,negotiation_orchestrator=info,tower_http=info";
const CLEANUP_INTERVAL: Duration = Duration::from_secs(3600);

#[derive(Clone)]
pub struct AppState {
    pub partner: Arc<AINegotiationPartner>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(partner: Arc<AINegotiationPartner>, config: ServerConfig) -> Self {
        Self {
            partner,
            config: Arc::new(config),
        }
    }
}

/// Runtime settings read from the environment
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub sse_interval: Duration,
    pub ws_heartbeat: Duration,
    pub retention_hours: i64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".to_string(),
            sse_interval: Duration::from_secs(15),
            ws_heartbeat: Duration::from_secs(30),
            retention_hours: 24,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or(defaults.bind_addr),
            sse_interval: env_secs("SSE_INTERVAL_SECS").unwrap_or(defaults.sse_interval),
            ws_heartbeat: env_secs("WS_HEARTBEAT_SECS").unwrap_or(defaults.ws_heartbeat),
            retention_hours: std::env::var("NEGOTIATION_RETENTION_HOURS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|h: &i64| *h > 0)
                .unwrap_or(defaults.retention_hours),
        }
    }
}

fn env_secs(key: &str) -> Option<Duration> {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
}

// ---------------------------------------------------------------------------
// Response envelope and errors
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Error returned by handlers; renders as an `ApiResponse` with the status
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    error: anyhow::Error,
}

impl AppError {
    pub fn with_status(status: StatusCode, error: impl Into<anyhow::Error>) -> Self {
        Self {
            status,
            error: error.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!("Request failed: {:#}", self.error);
        } else {
            tracing::debug!("Request rejected ({}): {}", self.status, self.error);
        }
        let body = ApiResponse::<()>::error(self.error.to_string());
        (self.status, Json(body)).into_response()
    }
}

impl From<NegotiationError> for AppError {
    fn from(e: NegotiationError) -> Self {
        let status = match &e {
            NegotiationError::NotFound(_) => StatusCode::NOT_FOUND,
            NegotiationError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::with_status(status, e)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(e: anyhow::Error) -> Self {
        Self::with_status(StatusCode::INTERNAL_SERVER_ERROR, e)
    }
}

// ---------------------------------------------------------------------------
// Router and server
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "negotiation-intelligence",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Request span with an empty `request_id` filled in by the request id middleware
fn http_span(request: &Request<Body>) -> Span {
    tracing::info_span!(
        "http_request",
        method = %request.method(),
        uri = %request.uri(),
        request_id = tracing::field::Empty,
    )
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(negotiation_routes::negotiation_routes())
        .merge(stream_routes::stream_routes())
        .layer(middleware::from_fn(request_id::request_id_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(http_span))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

/// Partner backed by the data service at `MARKET_DATA_URL` for market data,
/// property records and lead profiles, or neutral defaults without it
fn build_partner(llm: Arc<dyn LlmProvider>) -> AINegotiationPartner {
    match HttpMarketDataClient::from_env() {
        Some(client) => {
            tracing::info!("Market data provider configured");
            let client = Arc::new(client);
            AINegotiationPartner::new(llm, client.clone())
                .with_property_source(client.clone())
                .with_lead_source(client)
        }
        None => {
            tracing::warn!("MARKET_DATA_URL not set; leverage analysis will use neutral market defaults");
            AINegotiationPartner::new(llm, Arc::new(UnavailableMarketData))
        }
    }
}

/// Hourly sweep of negotiations idle past the retention window
pub fn spawn_cleanup_task(partner: Arc<AINegotiationPartner>, retention_hours: i64) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(CLEANUP_INTERVAL);
        // first tick fires immediately
        interval.tick().await;
        loop {
            interval.tick().await;
            let removed = partner.cleanup_inactive_negotiations(retention_hours);
            if removed > 0 {
                tracing::info!("Retention sweep removed {} negotiations", removed);
            }
        }
    })
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

pub async fn run_server() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_logging();

    let config = ServerConfig::from_env();
    let llm = provider_from_config(LlmConfig::default());
    let partner = Arc::new(build_partner(llm));

    let _cleanup = spawn_cleanup_task(partner.clone(), config.retention_hours);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Negotiation intelligence API listening on {}", config.bind_addr);

    let state = AppState::new(partner, config);
    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tower::ServiceExt;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr, "0.0.0.0:3000");
        assert_eq!(config.sse_interval, Duration::from_secs(15));
        assert_eq!(config.ws_heartbeat, Duration::from_secs(30));
        assert_eq!(config.retention_hours, 24);
    }

    #[tokio::test]
    async fn test_error_status_mapping() {
        let response = AppError::from(NegotiationError::NotFound("x".into())).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let response = AppError::from(NegotiationError::InvalidInput("x".into())).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let response = AppError::from(NegotiationError::Llm("x".into())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_health() {
        let state = negotiation_routes::tests::test_state();
        let response = app(state)
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn test_incoming_request_id_is_echoed() {
        let state = negotiation_routes::tests::test_state();
        let response = app(state)
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .header("x-request-id", "req-42")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.headers()["x-request-id"], "req-42");
    }

    #[test]
    fn test_http_span_declares_request_id() {
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        tracing::subscriber::with_default(tracing_subscriber::registry(), || {
            let span = http_span(&request);
            assert!(span.field("request_id").is_some());
            assert!(span.field("method").is_some());
        });
    }
}
