use async_trait::async_trait;
use chrono::{DateTime, Utc};
use negotiation_core::{NegotiationError, PropertyData};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Area-level supply and pricing snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketConditions {
    #[serde(default)]
    pub zip_code: Option<String>,
    pub months_of_supply: f64,
    /// Median price change over the trailing year, in percent
    #[serde(default)]
    pub median_price_trend_pct: f64,
    /// Average sale price over list price (0.98 = sold 2% under list)
    pub avg_sale_to_list: f64,
    #[serde(default)]
    pub avg_days_on_market: Option<f64>,
    #[serde(default)]
    pub inventory_by_price_range: BTreeMap<String, u32>,
}

impl MarketConditions {
    /// Neutral backdrop used when market data is unavailable
    pub fn neutral(zip_code: Option<String>) -> Self {
        Self {
            zip_code,
            months_of_supply: 5.0,
            median_price_trend_pct: 0.0,
            avg_sale_to_list: 0.98,
            avg_days_on_market: None,
            inventory_by_price_range: BTreeMap::new(),
        }
    }
}

/// Active listing competing for the same buyers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompetingListing {
    pub property_id: String,
    pub list_price: f64,
    pub distance_miles: f64,
    #[serde(default)]
    pub days_on_market: u32,
}

/// Recently closed sale near the subject property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparableSale {
    #[serde(default)]
    pub address: Option<String>,
    pub sale_price: f64,
    #[serde(default)]
    pub sqft: Option<f64>,
    #[serde(default)]
    pub sold_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub distance_miles: Option<f64>,
}

impl ComparableSale {
    pub fn price_per_sqft(&self) -> Option<f64> {
        match self.sqft {
            Some(sqft) if sqft > 0.0 && self.sale_price > 0.0 => Some(self.sale_price / sqft),
            _ => None,
        }
    }
}

/// Source of market conditions, competition and comparable sales
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    async fn market_conditions(&self, zip_code: Option<&str>) -> Result<MarketConditions, NegotiationError>;

    async fn competing_listings(&self, property: &PropertyData) -> Result<Vec<CompetingListing>, NegotiationError>;

    async fn comparable_sales(&self, property: &PropertyData) -> Result<Vec<ComparableSale>, NegotiationError>;

    fn provider_name(&self) -> &'static str;
}

/// Provider used when no market data service is configured. Every call
/// errors, so the calculator runs on neutral defaults.
pub struct UnavailableMarketData;

#[async_trait]
impl MarketDataProvider for UnavailableMarketData {
    async fn market_conditions(&self, _zip_code: Option<&str>) -> Result<MarketConditions, NegotiationError> {
        Err(NegotiationError::MarketData("market data service not configured".into()))
    }

    async fn competing_listings(&self, _property: &PropertyData) -> Result<Vec<CompetingListing>, NegotiationError> {
        Err(NegotiationError::MarketData("market data service not configured".into()))
    }

    async fn comparable_sales(&self, _property: &PropertyData) -> Result<Vec<ComparableSale>, NegotiationError> {
        Err(NegotiationError::MarketData("market data service not configured".into()))
    }

    fn provider_name(&self) -> &'static str {
        "unavailable"
    }
}
