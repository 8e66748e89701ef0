//! Offer pricing and strategy confidence.

use negotiation_core::score::{clamp_score, is_extreme};
use negotiation_core::{
    BuyerProfile, MarketCondition, MarketLeverage, MotivationType, PricePositioning,
    SellerPsychologyProfile, UrgencyLevel,
};

pub const BASE_OFFER_RATIO: f64 = 0.95;
pub const MIN_OFFER_RATIO: f64 = 0.80;
pub const MAX_OFFER_RATIO: f64 = 1.05;
/// Walkaway never exceeds this multiple of list
pub const MAX_WALKAWAY_RATIO: f64 = 1.10;

/// Offer price, range and walkaway for one property
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OfferPricing {
    pub offer_ratio: f64,
    pub recommended_offer: f64,
    pub range_low: f64,
    pub range_high: f64,
    pub walkaway: f64,
}

/// Seller-side adjustment to the base ratio, within [-0.15, +0.05]
pub fn psychology_delta(psychology: &SellerPsychologyProfile) -> f64 {
    let mut delta: f64 = match psychology.urgency_level {
        UrgencyLevel::Critical => -0.10,
        UrgencyLevel::High => -0.06,
        UrgencyLevel::Moderate => -0.02,
        UrgencyLevel::Low => 0.02,
    };

    if psychology.flexibility_score > 70.0 {
        delta -= 0.05;
    } else if psychology.flexibility_score < 30.0 {
        delta += 0.03;
    }
    if psychology.motivation_type == MotivationType::Distressed {
        delta -= 0.05;
    }
    if psychology.emotional_attachment_score > 75.0 {
        delta += 0.03;
    }

    delta.clamp(-0.15, 0.05)
}

/// Market-side adjustment to the base ratio, within [-0.12, +0.08]
pub fn market_delta(leverage: &MarketLeverage) -> f64 {
    let score = leverage.overall_leverage_score;
    let mut delta: f64 = if score > 75.0 {
        -0.08
    } else if score > 60.0 {
        -0.04
    } else if score < 25.0 {
        0.05
    } else if score < 40.0 {
        0.02
    } else {
        0.0
    };

    delta += match leverage.price_positioning {
        PricePositioning::Overpriced => -0.04,
        PricePositioning::AboveMarket => -0.02,
        PricePositioning::AtMarket => 0.0,
        PricePositioning::BelowMarket => 0.02,
        PricePositioning::Underpriced => 0.03,
    };

    delta += match leverage.market_condition {
        MarketCondition::SellersMarket => 0.02,
        MarketCondition::BuyersMarket => -0.02,
        MarketCondition::Balanced => 0.0,
    };

    delta.clamp(-0.12, 0.08)
}

pub fn price_offer(
    list_price: f64,
    psychology: &SellerPsychologyProfile,
    leverage: &MarketLeverage,
    buyer: &BuyerProfile,
) -> OfferPricing {
    let offer_ratio = (BASE_OFFER_RATIO + psychology_delta(psychology) + market_delta(leverage))
        .clamp(MIN_OFFER_RATIO, MAX_OFFER_RATIO);

    let ceiling = list_price * (offer_ratio + 0.06).min(MAX_WALKAWAY_RATIO);
    let walkaway = match buyer.max_budget {
        Some(budget) if budget > 0.0 => budget.min(ceiling),
        _ => ceiling,
    };

    OfferPricing {
        offer_ratio,
        recommended_offer: bounded_offer(list_price, offer_ratio),
        range_low: (list_price * (offer_ratio - 0.02)).round(),
        range_high: (list_price * (offer_ratio + 0.03)).round(),
        walkaway: walkaway.round(),
    }
}

/// Rounds to whole dollars without leaving `[MIN_OFFER_RATIO, MAX_OFFER_RATIO] * list`
fn bounded_offer(list_price: f64, offer_ratio: f64) -> f64 {
    let floor = (list_price * MIN_OFFER_RATIO).ceil();
    let ceiling = (list_price * MAX_OFFER_RATIO).floor();
    let exact = list_price * offer_ratio;
    if floor > ceiling {
        // No whole dollar fits, keep the exact figure
        return exact;
    }
    exact.round().clamp(floor, ceiling)
}

/// How sure the engine is, from how decisive each input signal is
pub fn strategy_confidence(psychology: &SellerPsychologyProfile, leverage: &MarketLeverage) -> f64 {
    let mut confidence: f64 = 50.0;

    if is_extreme(psychology.urgency_score, 20.0, 70.0) {
        confidence += 15.0;
    }
    if is_extreme(psychology.flexibility_score, 25.0, 75.0) {
        confidence += 10.0;
    }
    if is_extreme(leverage.overall_leverage_score, 25.0, 75.0) {
        confidence += 15.0;
    }
    if leverage.price_positioning != PricePositioning::AtMarket {
        confidence += 10.0;
    }
    if leverage.market_trend_pct.abs() >= 3.0 {
        confidence += 10.0;
    }
    if leverage.comparable_count >= 5 {
        confidence += 10.0;
    } else if leverage.comparable_count < 2 {
        confidence -= 10.0;
    }

    clamp_score(confidence)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::Utc;
    use negotiation_core::*;
    use std::collections::BTreeMap;

    pub fn psychology(urgency: f64, flexibility: f64, attachment: f64) -> SellerPsychologyProfile {
        SellerPsychologyProfile {
            property_id: "p1".into(),
            motivation_type: MotivationType::Financial,
            urgency_level: UrgencyLevel::from_score(urgency),
            urgency_score: urgency,
            behavioral_pattern: BehavioralPattern::StrategicReducer,
            market_response: MarketResponse::Moderate,
            flexibility_score: flexibility,
            financial_pressure_score: 50.0,
            emotional_attachment_score: attachment,
            motivation_scores: BTreeMap::new(),
            primary_concerns: vec!["timeline".into()],
            hot_buttons: vec![],
            emotional_assessment: "steady".into(),
            communication: CommunicationProfile::default(),
            analyzed_at: Utc::now(),
        }
    }

    pub fn leverage(score: f64, positioning: PricePositioning, condition: MarketCondition) -> MarketLeverage {
        MarketLeverage {
            property_id: "p1".into(),
            overall_leverage_score: score,
            market_condition: condition,
            market_condition_score: 50.0,
            inventory_score: 50.0,
            months_of_supply: 5.0,
            competition_score: 50.0,
            competitive_pressure: 50.0,
            price_positioning: positioning,
            price_positioning_score: 50.0,
            buyer_advantage_score: 30.0,
            seasonal_score: 50.0,
            cash_offer_boost: 0.0,
            quick_close_advantage: 0.0,
            uniqueness_adjustment: 0.0,
            market_trend_pct: 0.0,
            comparable_count: 3,
            inventory_by_price_range: BTreeMap::new(),
            calculated_at: Utc::now(),
        }
    }

    pub fn property(list_price: f64) -> PropertyData {
        PropertyData {
            property_id: "p1".into(),
            list_price,
            original_price: None,
            sqft: Some(2200.0),
            bedrooms: Some(4),
            bathrooms: Some(2.5),
            property_type: "single_family".into(),
            zip_code: Some("91730".into()),
            days_on_market: 45,
            year_built: Some(2004),
            uniqueness_score: None,
            listing_history: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_neutral_inputs_keep_base_ratio() {
        let psych = psychology(30.0, 50.0, 50.0); // moderate: -0.02
        let lev = leverage(50.0, PricePositioning::AtMarket, MarketCondition::Balanced);
        let pricing = price_offer(500_000.0, &psych, &lev, &BuyerProfile::new("lead"));
        assert_relative_eq!(pricing.offer_ratio, 0.93, epsilon = 1e-9);
        assert_eq!(pricing.recommended_offer, 465_000.0);
        assert_eq!(pricing.range_low, 455_000.0);
        assert_eq!(pricing.range_high, 480_000.0);
        assert_eq!(pricing.walkaway, 495_000.0);
    }

    #[test]
    fn test_ratio_is_clamped_low() {
        let mut psych = psychology(90.0, 85.0, 20.0);
        psych.motivation_type = MotivationType::Distressed;
        let lev = leverage(90.0, PricePositioning::Overpriced, MarketCondition::BuyersMarket);
        assert_relative_eq!(psychology_delta(&psych), -0.15);
        assert_relative_eq!(market_delta(&lev), -0.12);
        let pricing = price_offer(800_000.0, &psych, &lev, &BuyerProfile::new("lead"));
        assert_relative_eq!(pricing.offer_ratio, 0.80, epsilon = 1e-9);
        assert_eq!(pricing.recommended_offer, 640_000.0);
    }

    #[test]
    fn test_rounding_stays_above_floor() {
        let mut psych = psychology(90.0, 85.0, 20.0);
        psych.motivation_type = MotivationType::Distressed;
        let lev = leverage(90.0, PricePositioning::Overpriced, MarketCondition::BuyersMarket);
        // 0.80 * 500_003 = 400_002.4 rounds down below the bound
        let pricing = price_offer(500_003.0, &psych, &lev, &BuyerProfile::new("lead"));
        assert!(pricing.recommended_offer >= MIN_OFFER_RATIO * 500_003.0);
        assert_eq!(pricing.recommended_offer, 400_003.0);
    }

    #[test]
    fn test_rounding_stays_below_ceiling() {
        let psych = psychology(5.0, 20.0, 90.0);
        let lev = leverage(10.0, PricePositioning::Underpriced, MarketCondition::SellersMarket);
        // 1.05 * 100_010 = 105_010.5 rounds up past the bound
        let pricing = price_offer(100_010.0, &psych, &lev, &BuyerProfile::new("lead"));
        assert!(pricing.recommended_offer <= MAX_OFFER_RATIO * 100_010.0);
        assert_eq!(pricing.recommended_offer, 105_010.0);
    }

    #[test]
    fn test_tiny_list_price_keeps_exact_offer() {
        let psych = psychology(30.0, 50.0, 50.0);
        let lev = leverage(50.0, PricePositioning::AtMarket, MarketCondition::Balanced);
        let pricing = price_offer(1.5, &psych, &lev, &BuyerProfile::new("lead"));
        assert!(pricing.recommended_offer >= MIN_OFFER_RATIO * 1.5);
        assert!(pricing.recommended_offer <= MAX_OFFER_RATIO * 1.5);
    }

    #[test]
    fn test_ratio_is_clamped_high() {
        let psych = psychology(5.0, 20.0, 90.0);
        let lev = leverage(10.0, PricePositioning::Underpriced, MarketCondition::SellersMarket);
        let pricing = price_offer(800_000.0, &psych, &lev, &BuyerProfile::new("lead"));
        // 0.95 + 0.05 + 0.08
        assert_relative_eq!(pricing.offer_ratio, 1.05, epsilon = 1e-9);
        assert_eq!(pricing.walkaway, 880_000.0);
    }

    #[test]
    fn test_walkaway_respects_budget() {
        let psych = psychology(30.0, 50.0, 50.0);
        let lev = leverage(50.0, PricePositioning::AtMarket, MarketCondition::Balanced);
        let mut buyer = BuyerProfile::new("lead");
        buyer.max_budget = Some(470_000.0);
        assert_eq!(price_offer(500_000.0, &psych, &lev, &buyer).walkaway, 470_000.0);
    }

    #[test]
    fn test_confidence_bounds() {
        let psych = psychology(50.0, 50.0, 50.0);
        let mut lev = leverage(50.0, PricePositioning::AtMarket, MarketCondition::Balanced);
        lev.comparable_count = 0;
        assert_eq!(strategy_confidence(&psych, &lev), 40.0);

        let psych = psychology(90.0, 90.0, 50.0);
        let mut lev = leverage(90.0, PricePositioning::Overpriced, MarketCondition::BuyersMarket);
        lev.market_trend_pct = -4.0;
        lev.comparable_count = 8;
        assert_eq!(strategy_confidence(&psych, &lev), 100.0);
    }
}
