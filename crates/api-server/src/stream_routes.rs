use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse,
    },
    routing::get,
    Router,
};
use chrono::Utc;
use futures_util::{stream::Stream, SinkExt, StreamExt};
use negotiation_core::NegotiationIntelligence;
use negotiation_orchestrator::AINegotiationPartner;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;

use crate::AppState;

/// Compact view of an active negotiation pushed to stream clients
#[derive(Debug, Clone, Serialize)]
pub struct NegotiationSnapshot {
    pub property_id: String,
    pub active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub win_probability: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommended_offer_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_tactic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub urgency_level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leverage_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis_version: Option<String>,
    pub timestamp: String,
}

impl NegotiationSnapshot {
    fn of(property_id: &str, intelligence: Option<NegotiationIntelligence>) -> Self {
        let timestamp = Utc::now().to_rfc3339();
        match intelligence {
            Some(intel) => Self {
                property_id: property_id.to_string(),
                active: true,
                win_probability: Some(intel.win_probability.win_probability),
                recommended_offer_price: Some(intel.negotiation_strategy.recommended_offer_price),
                primary_tactic: Some(intel.negotiation_strategy.primary_tactic.to_string()),
                urgency_level: Some(intel.seller_psychology.urgency_level.to_string()),
                leverage_score: Some(intel.market_leverage.overall_leverage_score),
                analysis_version: Some(intel.analysis_version),
                timestamp,
            },
            None => Self {
                property_id: property_id.to_string(),
                active: false,
                win_probability: None,
                recommended_offer_price: None,
                primary_tactic: None,
                urgency_level: None,
                leverage_score: None,
                analysis_version: None,
                timestamp,
            },
        }
    }

    fn capture(partner: &AINegotiationPartner, property_id: &str) -> Self {
        Self::of(property_id, partner.get_active_negotiation(property_id))
    }
}

pub fn stream_routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/negotiation/stream/:property_id", get(negotiation_stream))
        .route("/ws/negotiation", get(ws_negotiation_handler))
}

// ---------------------------------------------------------------------------
// SSE: /api/v1/negotiation/stream/:property_id
// ---------------------------------------------------------------------------

async fn negotiation_stream(
    State(state): State<AppState>,
    Path(property_id): Path<String>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    tracing::info!("SSE client subscribed to negotiation {}", property_id);
    let interval = state.config.sse_interval;
    let partner = state.partner.clone();

    let stream = async_stream::stream! {
        loop {
            let snapshot = NegotiationSnapshot::capture(&partner, &property_id);
            match serde_json::to_string(&snapshot) {
                Ok(json) => {
                    yield Ok(Event::default().event("negotiation_update").data(json));
                }
                Err(e) => tracing::warn!("Failed to serialize snapshot for {}: {}", property_id, e),
            }
            tokio::time::sleep(interval).await;
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::new().interval(interval).text("heartbeat"))
}

// ---------------------------------------------------------------------------
// WebSocket: /ws/negotiation
// ---------------------------------------------------------------------------

/// Client request for a snapshot of one negotiation
#[derive(Debug, Deserialize)]
struct SnapshotRequest {
    property_id: String,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ServerMessage {
    Connected { active_negotiations: usize },
    Heartbeat { active_negotiations: usize, timestamp: String },
    Snapshot(NegotiationSnapshot),
    Error { message: String },
}

impl ServerMessage {
    fn into_message(self) -> Option<Message> {
        serde_json::to_string(&self).ok().map(Message::Text)
    }
}

async fn ws_negotiation_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_negotiation_socket(socket, state))
}

async fn handle_negotiation_socket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();
    let (reply_tx, mut reply_rx) = tokio::sync::mpsc::channel::<ServerMessage>(32);
    let heartbeat = state.config.ws_heartbeat;

    let connected = ServerMessage::Connected {
        active_negotiations: state.partner.list_active_negotiations().len(),
    };
    if let Some(msg) = connected.into_message() {
        if sender.send(msg).await.is_err() {
            return;
        }
    }

    // Heartbeats and snapshot replies share the sink
    let partner = state.partner.clone();
    let mut send_task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(heartbeat);
        ticker.tick().await;
        loop {
            let outgoing = tokio::select! {
                _ = ticker.tick() => ServerMessage::Heartbeat {
                    active_negotiations: partner.list_active_negotiations().len(),
                    timestamp: Utc::now().to_rfc3339(),
                },
                reply = reply_rx.recv() => match reply {
                    Some(reply) => reply,
                    None => break,
                },
            };
            if let Some(msg) = outgoing.into_message() {
                if sender.send(msg).await.is_err() {
                    break;
                }
            }
        }
    });

    let partner = state.partner.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Close(_) => break,
                Message::Text(text) => {
                    let reply = match serde_json::from_str::<SnapshotRequest>(&text) {
                        Ok(req) => ServerMessage::Snapshot(NegotiationSnapshot::capture(&partner, &req.property_id)),
                        Err(_) => ServerMessage::Error {
                            message: "expected {\"property_id\": \"...\"}".to_string(),
                        },
                    };
                    if reply_tx.send(reply).await.is_err() {
                        break;
                    }
                }
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }
    tracing::debug!("Negotiation WebSocket closed");
}
