use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A single list-price reduction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceDrop {
    pub date: DateTime<Utc>,
    pub previous_price: f64,
    pub new_price: f64,
}

impl PriceDrop {
    /// Size of the reduction as a percentage of the previous price
    pub fn pct(&self) -> f64 {
        if self.previous_price <= 0.0 {
            return 0.0;
        }
        ((self.previous_price - self.new_price) / self.previous_price * 100.0).max(0.0)
    }
}

/// Listing snapshot fetched once per analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingHistory {
    pub original_list_price: f64,
    pub current_price: f64,
    #[serde(default)]
    pub price_drops: Vec<PriceDrop>,
    pub days_on_market: u32,
    #[serde(default)]
    pub listing_views: Option<u32>,
    #[serde(default)]
    pub showing_requests: Option<u32>,
    #[serde(default)]
    pub offers_received: Option<u32>,
    #[serde(default)]
    pub previous_listing_attempts: Option<u32>,
}

impl ListingHistory {
    /// Cumulative reduction from the original list price, in percent
    pub fn total_reduction_pct(&self) -> f64 {
        if self.original_list_price <= 0.0 {
            return 0.0;
        }
        ((self.original_list_price - self.current_price) / self.original_list_price * 100.0).max(0.0)
    }

    pub fn average_drop_pct(&self) -> f64 {
        if self.price_drops.is_empty() {
            return 0.0;
        }
        self.price_drops.iter().map(PriceDrop::pct).sum::<f64>() / self.price_drops.len() as f64
    }

    /// Reductions per 30 days on market
    pub fn drops_per_month(&self) -> f64 {
        let months = (self.days_on_market as f64 / 30.0).max(1.0);
        self.price_drops.len() as f64 / months
    }

    pub fn has_recent_drop(&self, now: DateTime<Utc>, window_days: i64) -> bool {
        let cutoff = now - Duration::days(window_days);
        self.price_drops.iter().any(|d| d.date >= cutoff)
    }

    pub fn previous_attempts(&self) -> u32 {
        self.previous_listing_attempts.unwrap_or(0)
    }

    /// Listing history implied by a property record. Uses the embedded
    /// history when present, otherwise synthesizes one from list/original price.
    pub fn from_property(property: &PropertyData) -> Self {
        if let Some(history) = &property.listing_history {
            return history.clone();
        }
        ListingHistory {
            original_list_price: property.original_price.unwrap_or(property.list_price),
            current_price: property.list_price,
            price_drops: Vec::new(),
            days_on_market: property.days_on_market,
            listing_views: None,
            showing_requests: None,
            offers_received: None,
            previous_listing_attempts: None,
        }
    }
}

/// Life events that shift seller motivation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifeEvent {
    Relocation,
    Divorce,
    Estate,
    FinancialHardship,
    Downsizing,
    Upsizing,
    Retirement,
}

/// Metadata about how the seller communicates
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommunicationData {
    #[serde(default)]
    pub avg_response_time_hours: Option<f64>,
    /// Fraction of messages answered (0.0 to 1.0)
    #[serde(default)]
    pub response_rate: Option<f64>,
    #[serde(default)]
    pub message_count: u32,
    /// Notable words or phrases pulled from seller messages
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub life_event: Option<LifeEvent>,
    #[serde(default)]
    pub years_owned: Option<u32>,
    #[serde(default)]
    pub is_investor: bool,
    #[serde(default)]
    pub communication_style: Option<String>,
}

impl CommunicationData {
    /// Seller answers within four hours on average
    pub fn replies_fast(&self) -> bool {
        self.avg_response_time_hours.map(|h| h < 4.0).unwrap_or(false)
    }
}

/// Optional market backdrop handed to the psychology analyzer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketContext {
    #[serde(default)]
    pub market_condition: Option<MarketCondition>,
    #[serde(default)]
    pub avg_days_on_market: Option<f64>,
}

/// Property record as supplied by the caller or the property data source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyData {
    pub property_id: String,
    pub list_price: f64,
    #[serde(default)]
    pub original_price: Option<f64>,
    #[serde(default)]
    pub sqft: Option<f64>,
    #[serde(default)]
    pub bedrooms: Option<u32>,
    #[serde(default)]
    pub bathrooms: Option<f64>,
    #[serde(default = "default_property_type")]
    pub property_type: String,
    #[serde(default)]
    pub zip_code: Option<String>,
    #[serde(default)]
    pub days_on_market: u32,
    #[serde(default)]
    pub year_built: Option<u32>,
    /// How unusual the property is (0 = cookie-cutter, 100 = one of a kind)
    #[serde(default)]
    pub uniqueness_score: Option<f64>,
    #[serde(default)]
    pub listing_history: Option<ListingHistory>,
}

fn default_property_type() -> String {
    "single_family".to_string()
}

impl PropertyData {
    pub fn price_per_sqft(&self) -> Option<f64> {
        match self.sqft {
            Some(sqft) if sqft > 0.0 => Some(self.list_price / sqft),
            _ => None,
        }
    }
}

/// Buyer (lead) profile driving leverage and tactic selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuyerProfile {
    pub lead_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub pre_approved: bool,
    #[serde(default)]
    pub cash_offer: bool,
    #[serde(default)]
    pub flexible_timeline: bool,
    #[serde(default)]
    pub quick_close_days: Option<u32>,
    /// Down payment as a fraction of price (0.2 = 20%)
    #[serde(default)]
    pub down_payment_pct: Option<f64>,
    #[serde(default)]
    pub max_budget: Option<f64>,
    /// How much the buyer values a good relationship with the seller (0.0 to 1.0)
    #[serde(default)]
    pub relationship_importance: f64,
    #[serde(default)]
    pub first_time_buyer: bool,
}

impl BuyerProfile {
    pub fn new(lead_id: impl Into<String>) -> Self {
        Self {
            lead_id: lead_id.into(),
            name: None,
            pre_approved: false,
            cash_offer: false,
            flexible_timeline: false,
            quick_close_days: None,
            down_payment_pct: None,
            max_budget: None,
            relationship_importance: 0.0,
            first_time_buyer: false,
        }
    }
}

/// What fundamentally drives the seller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotivationType {
    Emotional,
    Financial,
    Strategic,
    Distressed,
}

impl MotivationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MotivationType::Emotional => "emotional",
            MotivationType::Financial => "financial",
            MotivationType::Strategic => "strategic",
            MotivationType::Distressed => "distressed",
        }
    }
}

/// Urgency bucket derived from the 0-100 urgency score
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UrgencyLevel {
    Low,
    Moderate,
    High,
    Critical,
}

impl UrgencyLevel {
    /// Fixed thresholds: 70 critical, 45 high, 20 moderate
    pub fn from_score(score: f64) -> Self {
        match score {
            s if s >= 70.0 => UrgencyLevel::Critical,
            s if s >= 45.0 => UrgencyLevel::High,
            s if s >= 20.0 => UrgencyLevel::Moderate,
            _ => UrgencyLevel::Low,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UrgencyLevel::Low => "low",
            UrgencyLevel::Moderate => "moderate",
            UrgencyLevel::High => "high",
            UrgencyLevel::Critical => "critical",
        }
    }
}

/// How the seller has been cutting the price
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BehavioralPattern {
    AggressiveReducer,
    IncrementalReducer,
    PanicReducer,
    StrategicReducer,
    /// No reductions yet
    PriceHolder,
}

impl BehavioralPattern {
    pub fn as_str(&self) -> &'static str {
        match self {
            BehavioralPattern::AggressiveReducer => "aggressive_reducer",
            BehavioralPattern::IncrementalReducer => "incremental_reducer",
            BehavioralPattern::PanicReducer => "panic_reducer",
            BehavioralPattern::StrategicReducer => "strategic_reducer",
            BehavioralPattern::PriceHolder => "price_holder",
        }
    }
}

/// Quality of buyer response to the listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketResponse {
    Strong,
    Moderate,
    Weak,
    Unknown,
}

impl MarketResponse {
    pub fn score(&self) -> f64 {
        match self {
            MarketResponse::Strong => 80.0,
            MarketResponse::Moderate => 50.0,
            MarketResponse::Weak => 20.0,
            MarketResponse::Unknown => 50.0,
        }
    }
}

/// Communication traits carried on the psychology profile
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommunicationProfile {
    pub avg_response_time_hours: Option<f64>,
    pub response_rate: Option<f64>,
    pub style: String,
    pub message_count: u32,
}

/// Seller psychology profile, recomputed wholesale on every update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SellerPsychologyProfile {
    pub property_id: String,
    pub motivation_type: MotivationType,
    pub urgency_level: UrgencyLevel,
    pub urgency_score: f64,
    pub behavioral_pattern: BehavioralPattern,
    pub market_response: MarketResponse,
    pub flexibility_score: f64,
    pub financial_pressure_score: f64,
    pub emotional_attachment_score: f64,
    /// Raw motivation accumulators, keyed by motivation name
    pub motivation_scores: BTreeMap<String, f64>,
    pub primary_concerns: Vec<String>,
    pub hot_buttons: Vec<String>,
    pub emotional_assessment: String,
    pub communication: CommunicationProfile,
    pub analyzed_at: DateTime<Utc>,
}

/// Overall market regime from the buyer's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketCondition {
    BuyersMarket,
    Balanced,
    SellersMarket,
}

impl MarketCondition {
    pub fn as_str(&self) -> &'static str {
        match self {
            MarketCondition::BuyersMarket => "buyers_market",
            MarketCondition::Balanced => "balanced",
            MarketCondition::SellersMarket => "sellers_market",
        }
    }
}

/// List price relative to comparable sales
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PricePositioning {
    Overpriced,
    AboveMarket,
    AtMarket,
    BelowMarket,
    Underpriced,
}

impl PricePositioning {
    pub fn as_str(&self) -> &'static str {
        match self {
            PricePositioning::Overpriced => "overpriced",
            PricePositioning::AboveMarket => "above_market",
            PricePositioning::AtMarket => "at_market",
            PricePositioning::BelowMarket => "below_market",
            PricePositioning::Underpriced => "underpriced",
        }
    }
}

/// Buyer leverage (0 = seller holds every card, 100 = buyer does)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketLeverage {
    pub property_id: String,
    pub overall_leverage_score: f64,
    pub market_condition: MarketCondition,
    pub market_condition_score: f64,
    pub inventory_score: f64,
    pub months_of_supply: f64,
    pub competition_score: f64,
    /// Pressure on the buyer from scarce alternatives (100 - competition score)
    pub competitive_pressure: f64,
    pub price_positioning: PricePositioning,
    pub price_positioning_score: f64,
    pub buyer_advantage_score: f64,
    pub seasonal_score: f64,
    pub cash_offer_boost: f64,
    pub quick_close_advantage: f64,
    pub uniqueness_adjustment: f64,
    pub market_trend_pct: f64,
    pub comparable_count: usize,
    pub inventory_by_price_range: BTreeMap<String, u32>,
    pub calculated_at: DateTime<Utc>,
}

/// Primary negotiation approach
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NegotiationTactic {
    Collaborative,
    Aggressive,
    TimeSensitive,
    ValueFocused,
    RelationshipBuilding,
}

impl NegotiationTactic {
    /// Every tactic, in tie-break order
    pub const ALL: [NegotiationTactic; 5] = [
        NegotiationTactic::Collaborative,
        NegotiationTactic::Aggressive,
        NegotiationTactic::TimeSensitive,
        NegotiationTactic::ValueFocused,
        NegotiationTactic::RelationshipBuilding,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NegotiationTactic::Collaborative => "collaborative",
            NegotiationTactic::Aggressive => "aggressive",
            NegotiationTactic::TimeSensitive => "time_sensitive",
            NegotiationTactic::ValueFocused => "value_focused",
            NegotiationTactic::RelationshipBuilding => "relationship_building",
        }
    }
}

macro_rules! display_via_as_str {
    ($($ty:ty),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        })*
    };
}

display_via_as_str!(
    MotivationType,
    UrgencyLevel,
    BehavioralPattern,
    MarketCondition,
    PricePositioning,
    NegotiationTactic
);

/// Complete negotiation strategy for one property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NegotiationStrategy {
    pub property_id: String,
    pub primary_tactic: NegotiationTactic,
    pub secondary_tactic: NegotiationTactic,
    pub tactic_scores: BTreeMap<String, f64>,
    pub recommended_offer_price: f64,
    /// Offer as a fraction of list price, within [0.80, 1.05]
    pub offer_ratio: f64,
    pub offer_range_low: f64,
    pub offer_range_high: f64,
    pub walkaway_price: f64,
    pub terms_to_emphasize: Vec<String>,
    pub concessions_to_offer: Vec<String>,
    pub primary_script: String,
    pub talking_points: Vec<String>,
    pub objection_responses: BTreeMap<String, String>,
    pub optimal_bid_sequence: Vec<f64>,
    pub strategy_blend: String,
    pub confidence_score: f64,
    pub generated_at: DateTime<Utc>,
}

/// Likelihood that the recommended offer gets accepted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WinProbabilityAnalysis {
    pub property_id: String,
    pub win_probability: f64,
    pub confidence_interval: (f64, f64),
    pub scenarios: BTreeMap<String, f64>,
    pub key_factors: Vec<String>,
    pub risk_factors: Vec<String>,
    pub predicted_at: DateTime<Utc>,
}

/// Aggregate intelligence package for an active negotiation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NegotiationIntelligence {
    pub property_id: String,
    pub lead_id: String,
    #[serde(default)]
    pub tenant_id: Option<String>,
    pub analysis_timestamp: DateTime<Utc>,
    pub seller_psychology: SellerPsychologyProfile,
    pub market_leverage: MarketLeverage,
    pub negotiation_strategy: NegotiationStrategy,
    pub win_probability: WinProbabilityAnalysis,
    pub executive_summary: String,
    pub key_insights: Vec<String>,
    pub action_items: Vec<String>,
    pub processing_time_ms: u64,
    pub analysis_version: String,
}
