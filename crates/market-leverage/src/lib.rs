pub mod http;
pub mod provider;
pub mod scoring;

pub use http::HttpMarketDataClient;
pub use provider::{
    ComparableSale, CompetingListing, MarketConditions, MarketDataProvider, UnavailableMarketData,
};

use chrono::{Datelike, Duration, Utc};
use negotiation_core::score::{clamp_score, weighted_sum};
use negotiation_core::{
    fingerprint, BuyerProfile, ListingHistory, MarketLeverage, NegotiationError, NegotiationResult,
    PropertyData, TtlCache,
};
use std::sync::Arc;

use scoring::*;

const CACHE_PREFIX: &str = "market_leverage";

/// Weights for the six sub-scores, in order: market condition, inventory,
/// competition, positioning, buyer advantage, seasonality.
const WEIGHTS: [f64; 6] = [0.25, 0.20, 0.20, 0.15, 0.10, 0.10];

/// Scores how much negotiating power the buyer holds on a property
pub struct MarketLeverageCalculator {
    market_data: Arc<dyn MarketDataProvider>,
    cache: TtlCache<MarketLeverage>,
    cache_ttl: Duration,
}

impl MarketLeverageCalculator {
    pub fn new(market_data: Arc<dyn MarketDataProvider>) -> Self {
        Self {
            market_data,
            cache: TtlCache::new(),
            cache_ttl: Duration::hours(1),
        }
    }

    pub async fn calculate_market_leverage(
        &self,
        property_id: &str,
        property: &PropertyData,
        buyer: &BuyerProfile,
        listing: &ListingHistory,
    ) -> NegotiationResult<MarketLeverage> {
        if property.list_price <= 0.0 {
            return Err(NegotiationError::InvalidInput(format!(
                "property {} has no list price",
                property_id
            )));
        }

        let cache_key = format!(
            "{}:{}:{}",
            CACHE_PREFIX,
            property_id,
            fingerprint(&(property, buyer, listing))
        );
        if let Some(cached) = self.cache.get(&cache_key) {
            tracing::debug!("Market leverage cache hit for {}", property_id);
            return Ok(cached);
        }

        let (conditions, listings, comps) = tokio::join!(
            self.market_data.market_conditions(property.zip_code.as_deref()),
            self.market_data.competing_listings(property),
            self.market_data.comparable_sales(property),
        );

        let conditions = conditions.unwrap_or_else(|e| {
            tracing::warn!("Market conditions unavailable for {} ({}): {}", property_id, self.market_data.provider_name(), e);
            MarketConditions::neutral(property.zip_code.clone())
        });
        let listings = listings.unwrap_or_else(|e| {
            tracing::warn!("Competing listings unavailable for {}: {}", property_id, e);
            Vec::new()
        });
        let comps = comps.unwrap_or_else(|e| {
            tracing::warn!("Comparable sales unavailable for {}: {}", property_id, e);
            Vec::new()
        });

        let now = Utc::now();
        let (market_condition, market_condition_score) = score_market_condition(&conditions);
        let inventory_score = score_inventory(conditions.months_of_supply);
        let competitors = direct_competitors(property, &listings);
        let competition_score = score_competition(competitors.len());
        let (price_positioning, price_positioning_score) =
            score_price_positioning(property, &comps, listing.days_on_market);
        let buyer_advantage_score = score_buyer_advantage(buyer);
        let seasonal = seasonal_score(now.month());

        let cash_boost = cash_offer_boost(buyer);
        let quick_close = quick_close_advantage(buyer);
        let uniqueness = uniqueness_adjustment(property);

        let base = weighted_sum(&[
            (market_condition_score, WEIGHTS[0]),
            (inventory_score, WEIGHTS[1]),
            (competition_score, WEIGHTS[2]),
            (price_positioning_score, WEIGHTS[3]),
            (buyer_advantage_score, WEIGHTS[4]),
            (seasonal, WEIGHTS[5]),
        ]);
        let overall = clamp_score(base + cash_boost + quick_close + uniqueness);

        let leverage = MarketLeverage {
            property_id: property_id.to_string(),
            overall_leverage_score: overall,
            market_condition,
            market_condition_score,
            inventory_score,
            months_of_supply: conditions.months_of_supply,
            competition_score,
            competitive_pressure: 100.0 - competition_score,
            price_positioning,
            price_positioning_score,
            buyer_advantage_score,
            seasonal_score: seasonal,
            cash_offer_boost: cash_boost,
            quick_close_advantage: quick_close,
            uniqueness_adjustment: uniqueness,
            market_trend_pct: conditions.median_price_trend_pct,
            comparable_count: comps.len(),
            inventory_by_price_range: conditions.inventory_by_price_range,
            calculated_at: now,
        };

        tracing::info!(
            "Market leverage for {}: {:.1} ({}, {}, {} competitors, {} comps)",
            property_id,
            overall,
            market_condition,
            price_positioning,
            competitors.len(),
            leverage.comparable_count
        );

        self.cache.set(cache_key, leverage.clone(), self.cache_ttl);
        Ok(leverage)
    }

    pub fn invalidate(&self, property_id: &str) -> usize {
        self.cache
            .invalidate_prefix(&format!("{}:{}:", CACHE_PREFIX, property_id))
    }

    pub fn purge_expired(&self) -> usize {
        self.cache.purge_expired()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use negotiation_core::{MarketCondition, PricePositioning};
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StaticMarketData {
        conditions: MarketConditions,
        listings: Vec<CompetingListing>,
        comps: Vec<ComparableSale>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl MarketDataProvider for StaticMarketData {
        async fn market_conditions(&self, _zip: Option<&str>) -> Result<MarketConditions, NegotiationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.conditions.clone())
        }

        async fn competing_listings(&self, _p: &PropertyData) -> Result<Vec<CompetingListing>, NegotiationError> {
            Ok(self.listings.clone())
        }

        async fn comparable_sales(&self, _p: &PropertyData) -> Result<Vec<ComparableSale>, NegotiationError> {
            Ok(self.comps.clone())
        }

        fn provider_name(&self) -> &'static str {
            "static"
        }
    }

    fn property() -> PropertyData {
        PropertyData {
            property_id: "p1".into(),
            list_price: 600_000.0,
            original_price: None,
            sqft: Some(2000.0),
            bedrooms: Some(3),
            bathrooms: Some(2.0),
            property_type: "single_family".into(),
            zip_code: Some("91730".into()),
            days_on_market: 100,
            year_built: Some(1995),
            uniqueness_score: None,
            listing_history: None,
        }
    }

    fn buyers_market() -> StaticMarketData {
        let comps = (0..6)
            .map(|i| ComparableSale {
                address: Some(format!("{} Oak St", 100 + i)),
                sale_price: 500_000.0,
                sqft: Some(2000.0),
                sold_date: None,
                distance_miles: Some(0.5),
            })
            .collect();
        let listings = (0..5)
            .map(|i| CompetingListing {
                property_id: format!("c{}", i),
                list_price: 590_000.0,
                distance_miles: 0.5,
                days_on_market: 40,
            })
            .collect();
        StaticMarketData {
            conditions: MarketConditions {
                zip_code: Some("91730".into()),
                months_of_supply: 7.0,
                median_price_trend_pct: -1.5,
                avg_sale_to_list: 0.96,
                avg_days_on_market: Some(55.0),
                inventory_by_price_range: BTreeMap::from([("500k-750k".to_string(), 42)]),
            },
            listings,
            comps,
            calls: AtomicUsize::new(0),
        }
    }

    #[tokio::test]
    async fn test_buyers_market_leverage() {
        let calc = MarketLeverageCalculator::new(Arc::new(buyers_market()));
        let property = property();
        let listing = ListingHistory::from_property(&property);
        let leverage = calc
            .calculate_market_leverage("p1", &property, &BuyerProfile::new("lead"), &listing)
            .await
            .unwrap();

        assert_eq!(leverage.market_condition, MarketCondition::BuyersMarket);
        assert_eq!(leverage.price_positioning, PricePositioning::Overpriced);
        assert_eq!(leverage.competition_score, 70.0);
        assert_eq!(leverage.competitive_pressure, 30.0);
        assert_eq!(leverage.comparable_count, 6);
        assert_eq!(leverage.inventory_by_price_range.get("500k-750k"), Some(&42));
        assert!(leverage.overall_leverage_score > 60.0);
        assert!(leverage.overall_leverage_score <= 100.0);
    }

    #[tokio::test]
    async fn test_cash_offer_boost() {
        let calc = MarketLeverageCalculator::new(Arc::new(UnavailableMarketData));
        let property = property();
        let listing = ListingHistory::from_property(&property);
        let mut buyer = BuyerProfile::new("lead");
        buyer.cash_offer = true;
        buyer.quick_close_days = Some(14);

        let leverage = calc
            .calculate_market_leverage("p1", &property, &buyer, &listing)
            .await
            .unwrap();
        assert_eq!(leverage.cash_offer_boost, 25.0);
        assert_eq!(leverage.quick_close_advantage, 10.0);
        assert!((0.0..=100.0).contains(&leverage.overall_leverage_score));
    }

    #[tokio::test]
    async fn test_unavailable_data_falls_back_to_neutral() {
        let calc = MarketLeverageCalculator::new(Arc::new(UnavailableMarketData));
        let property = property();
        let listing = ListingHistory::from_property(&property);
        let leverage = calc
            .calculate_market_leverage("p1", &property, &BuyerProfile::new("lead"), &listing)
            .await
            .unwrap();

        assert_eq!(leverage.market_condition, MarketCondition::Balanced);
        assert_eq!(leverage.months_of_supply, 5.0);
        assert_eq!(leverage.inventory_score, 50.0);
        assert_eq!(leverage.competition_score, 25.0);
        assert_eq!(leverage.price_positioning, PricePositioning::AtMarket);
        // 50 base plus the long-DOM bonus
        assert_eq!(leverage.price_positioning_score, 60.0);
        assert_eq!(leverage.comparable_count, 0);
    }

    #[tokio::test]
    async fn test_cached_within_ttl() {
        let data = Arc::new(buyers_market());
        let calc = MarketLeverageCalculator::new(data.clone());
        let property = property();
        let listing = ListingHistory::from_property(&property);
        let buyer = BuyerProfile::new("lead");

        calc.calculate_market_leverage("p1", &property, &buyer, &listing).await.unwrap();
        calc.calculate_market_leverage("p1", &property, &buyer, &listing).await.unwrap();
        assert_eq!(data.calls.load(Ordering::SeqCst), 1);

        assert_eq!(calc.invalidate("p1"), 1);
        calc.calculate_market_leverage("p1", &property, &buyer, &listing).await.unwrap();
        assert_eq!(data.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_rejects_zero_price() {
        let calc = MarketLeverageCalculator::new(Arc::new(UnavailableMarketData));
        let mut property = property();
        property.list_price = 0.0;
        let listing = ListingHistory::from_property(&property);
        let result = calc
            .calculate_market_leverage("p1", &property, &BuyerProfile::new("lead"), &listing)
            .await;
        assert!(matches!(result, Err(NegotiationError::InvalidInput(_))));
    }
}
