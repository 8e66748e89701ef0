//! REST endpoints under `/api/v1/negotiation`.

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Extension, Json, Router,
};
use negotiation_core::NegotiationIntelligence;
use negotiation_orchestrator::{
    CounterOffer, CounterOfferRequest, NegotiationAnalysisRequest, PerformanceSnapshot,
    RealTimeCoachingRequest, RealTimeCoachingResponse, ScenarioAnalysis, StrategyUpdateRequest,
    WebhookEvent, WebhookOutcome,
};
use serde::Serialize;

use crate::request_id::RequestId;
use crate::{ApiResponse, AppError, AppState};

#[derive(Debug, Serialize)]
pub struct ActiveNegotiations {
    pub negotiation_ids: Vec<String>,
    pub count: usize,
}

pub fn negotiation_routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/negotiation/analyze", post(analyze))
        .route("/api/v1/negotiation/coaching", post(coaching))
        .route("/api/v1/negotiation/update-strategy", post(update_strategy))
        .route("/api/v1/negotiation/active", get(list_active))
        .route(
            "/api/v1/negotiation/active/:property_id",
            get(get_active).delete(end_negotiation),
        )
        .route("/api/v1/negotiation/scenarios/:property_id", get(scenarios))
        .route("/api/v1/negotiation/counter-offer", post(counter_offer))
        .route("/api/v1/negotiation/webhook", post(webhook))
        .route("/api/v1/negotiation/metrics", get(metrics))
}

async fn analyze(
    State(state): State<AppState>,
    Extension(RequestId(request_id)): Extension<RequestId>,
    Json(request): Json<NegotiationAnalysisRequest>,
) -> Result<Json<ApiResponse<NegotiationIntelligence>>, AppError> {
    tracing::info!(request_id = %request_id, "Analyze request for property {}", request.property_id);
    let intelligence = state.partner.analyze_negotiation_intelligence(request).await?;
    Ok(Json(ApiResponse::success(intelligence)))
}

async fn coaching(
    State(state): State<AppState>,
    Json(request): Json<RealTimeCoachingRequest>,
) -> Result<Json<ApiResponse<RealTimeCoachingResponse>>, AppError> {
    let response = state.partner.provide_realtime_coaching(request).await?;
    Ok(Json(ApiResponse::success(response)))
}

async fn update_strategy(
    State(state): State<AppState>,
    Json(request): Json<StrategyUpdateRequest>,
) -> Result<Json<ApiResponse<NegotiationIntelligence>>, AppError> {
    let updated = state.partner.update_negotiation_strategy(request).await?;
    Ok(Json(ApiResponse::success(updated)))
}

async fn list_active(State(state): State<AppState>) -> Json<ApiResponse<ActiveNegotiations>> {
    let negotiation_ids = state.partner.list_active_negotiations();
    let count = negotiation_ids.len();
    Json(ApiResponse::success(ActiveNegotiations {
        negotiation_ids,
        count,
    }))
}

/// `data` is null when no negotiation is active for the property
async fn get_active(
    State(state): State<AppState>,
    Path(property_id): Path<String>,
) -> Json<ApiResponse<Option<NegotiationIntelligence>>> {
    Json(ApiResponse::success(state.partner.get_active_negotiation(&property_id)))
}

async fn end_negotiation(
    State(state): State<AppState>,
    Path(property_id): Path<String>,
) -> Result<Json<ApiResponse<NegotiationIntelligence>>, AppError> {
    let ended = state.partner.end_negotiation(&property_id)?;
    Ok(Json(ApiResponse::success(ended)))
}

async fn scenarios(
    State(state): State<AppState>,
    Path(property_id): Path<String>,
) -> Result<Json<ApiResponse<ScenarioAnalysis>>, AppError> {
    let analysis = state.partner.scenario_analysis(&property_id)?;
    Ok(Json(ApiResponse::success(analysis)))
}

async fn counter_offer(
    State(state): State<AppState>,
    Json(request): Json<CounterOfferRequest>,
) -> Result<Json<ApiResponse<CounterOffer>>, AppError> {
    let counter = state.partner.generate_counter_offer(&request).await?;
    Ok(Json(ApiResponse::success(counter)))
}

async fn webhook(
    State(state): State<AppState>,
    Json(event): Json<WebhookEvent>,
) -> Json<ApiResponse<WebhookOutcome>> {
    Json(ApiResponse::success(state.partner.handle_webhook(event)))
}

async fn metrics(State(state): State<AppState>) -> Json<ApiResponse<PerformanceSnapshot>> {
    Json(ApiResponse::success(state.partner.get_performance_metrics()))
}
