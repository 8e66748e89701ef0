use chrono::{DateTime, Utc};
use market_leverage::ComparableSale;
use negotiation_core::{
    BuyerProfile, CommunicationData, ListingHistory, MarketContext, NegotiationIntelligence,
    PropertyData,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::drift::DriftAnalysis;

/// Buyer-side overrides sent with an analysis request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuyerPreferences {
    #[serde(default)]
    pub cash_offer: Option<bool>,
    #[serde(default)]
    pub max_budget: Option<f64>,
    #[serde(default)]
    pub quick_close_days: Option<u32>,
}

impl BuyerPreferences {
    pub fn apply(&self, buyer: &mut BuyerProfile) {
        if let Some(cash) = self.cash_offer {
            buyer.cash_offer = cash;
        }
        if self.max_budget.is_some() {
            buyer.max_budget = self.max_budget;
        }
        if self.quick_close_days.is_some() {
            buyer.quick_close_days = self.quick_close_days;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NegotiationAnalysisRequest {
    pub property_id: String,
    pub lead_id: String,
    #[serde(default)]
    pub tenant_id: Option<String>,
    /// Inline property record; looked up from the property source when absent
    #[serde(default)]
    pub property_data: Option<PropertyData>,
    #[serde(default)]
    pub buyer_profile: Option<BuyerProfile>,
    #[serde(default)]
    pub buyer_preferences: Option<BuyerPreferences>,
    #[serde(default)]
    pub communication_data: Option<CommunicationData>,
    #[serde(default)]
    pub market_context: Option<MarketContext>,
}

impl NegotiationAnalysisRequest {
    pub fn new(property_id: impl Into<String>, lead_id: impl Into<String>) -> Self {
        Self {
            property_id: property_id.into(),
            lead_id: lead_id.into(),
            tenant_id: None,
            property_data: None,
            buyer_profile: None,
            buyer_preferences: None,
            communication_data: None,
            market_context: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealTimeCoachingRequest {
    /// Property id of the active negotiation
    pub negotiation_id: String,
    pub conversation_context: String,
    #[serde(default)]
    pub current_situation: String,
    #[serde(default)]
    pub buyer_feedback: Option<String>,
    #[serde(default)]
    pub seller_response: Option<String>,
    #[serde(default)]
    pub response_latency_seconds: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RealTimeCoachingResponse {
    pub negotiation_id: String,
    pub immediate_guidance: String,
    pub tactical_adjustments: Vec<String>,
    pub next_steps: Vec<String>,
    pub conversation_suggestions: BTreeMap<String, String>,
    pub risk_alerts: Vec<String>,
    pub seller_emotional_state: String,
    pub strategy_effectiveness: String,
    pub drift_analysis: DriftAnalysis,
}

/// Keys in `new_information` that trigger a psychology re-run
pub const PSYCHOLOGY_TRIGGERS: [&str; 3] = ["seller_response", "communication_change", "urgency_update"];
/// Keys in `new_information` that trigger a leverage re-run
pub const MARKET_TRIGGERS: [&str; 3] = ["market_change", "competitive_activity", "inventory_update"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyUpdateRequest {
    pub negotiation_id: String,
    #[serde(default)]
    pub new_information: BTreeMap<String, serde_json::Value>,
}

impl StrategyUpdateRequest {
    pub fn touches_psychology(&self) -> bool {
        PSYCHOLOGY_TRIGGERS.iter().any(|k| self.new_information.contains_key(*k))
    }

    pub fn touches_market(&self) -> bool {
        MARKET_TRIGGERS.iter().any(|k| self.new_information.contains_key(*k))
    }

    /// Typed value under `key`, ignored when it does not parse
    pub fn typed<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.new_information
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }
}

/// Everything kept for an active negotiation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveNegotiation {
    pub intelligence: NegotiationIntelligence,
    pub property: PropertyData,
    pub buyer: BuyerProfile,
    pub listing: ListingHistory,
    pub communication: Option<CommunicationData>,
    pub market_context: Option<MarketContext>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookEvent {
    pub event_type: String,
    pub property_id: String,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookOutcome {
    pub event_type: String,
    pub property_id: String,
    pub acknowledged: bool,
    /// True when the event closed out an active negotiation
    pub removed: bool,
}

/// An offer on the table that needs a counter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfferDetails {
    pub price: f64,
    #[serde(default)]
    pub list_price: Option<f64>,
    #[serde(default)]
    pub terms: Option<String>,
    #[serde(default)]
    pub contingencies: Option<String>,
    #[serde(default)]
    pub cash_offer: bool,
    #[serde(default)]
    pub close_days: Option<u32>,
}

impl OfferDetails {
    /// List price when known, otherwise the offer price
    pub fn reference_price(&self) -> f64 {
        self.list_price.filter(|p| *p > 0.0).unwrap_or(self.price)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CounterOfferRequest {
    pub offer: OfferDetails,
    #[serde(default)]
    pub market_comps: Vec<ComparableSale>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CounterOffer {
    pub counter_price: f64,
    pub counter_rationale: String,
    pub talking_points: Vec<String>,
    pub risk_assessment: String,
    pub confidence_score: f64,
    pub recommended_concessions: Vec<String>,
    pub walk_away_price: f64,
}

/// Win probability per offer structure for one negotiation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioAnalysis {
    pub property_id: String,
    pub win_probability: f64,
    pub recommended_offer_price: f64,
    pub offer_range: (f64, f64),
    pub scenarios: BTreeMap<String, f64>,
}

/// Point-in-time view of the orchestrator's counters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSnapshot {
    pub total_analyses: u64,
    pub avg_processing_time_ms: f64,
    pub active_negotiations: usize,
    /// Mean predicted win probability per primary tactic
    pub strategy_averages: BTreeMap<String, f64>,
    pub prediction_history_count: usize,
}
