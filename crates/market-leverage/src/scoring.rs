//! Leverage sub-scores. Every score is 0-100 and higher favors the buyer.

use negotiation_core::score::{clamp_score, median};
use negotiation_core::{BuyerProfile, MarketCondition, PricePositioning, PropertyData};

use crate::provider::{ComparableSale, CompetingListing, MarketConditions};

/// Competitors must sit within this radius...
pub const COMPETITION_RADIUS_MILES: f64 = 1.0;
/// ...and within this fraction of the subject's list price
pub const COMPETITION_PRICE_BAND: f64 = 0.15;

pub fn score_market_condition(conditions: &MarketConditions) -> (MarketCondition, f64) {
    let (condition, mut score) = if conditions.months_of_supply >= 6.0 {
        (MarketCondition::BuyersMarket, 75.0)
    } else if conditions.months_of_supply >= 4.0 {
        (MarketCondition::Balanced, 50.0)
    } else {
        (MarketCondition::SellersMarket, 25.0)
    };

    if conditions.median_price_trend_pct < 0.0 {
        score += 10.0;
    } else if conditions.median_price_trend_pct > 5.0 {
        score -= 10.0;
    }

    if conditions.avg_sale_to_list < 0.97 {
        score += 10.0;
    } else if conditions.avg_sale_to_list > 1.0 {
        score -= 10.0;
    }

    (condition, clamp_score(score))
}

pub fn score_inventory(months_of_supply: f64) -> f64 {
    match months_of_supply {
        m if m >= 8.0 => 90.0,
        m if m >= 6.0 => 75.0,
        m if m >= 4.0 => 50.0,
        m if m >= 2.0 => 30.0,
        _ => 15.0,
    }
}

/// Listings close enough in distance and price to split the buyer pool
pub fn direct_competitors<'a>(
    property: &PropertyData,
    listings: &'a [CompetingListing],
) -> Vec<&'a CompetingListing> {
    let low = property.list_price * (1.0 - COMPETITION_PRICE_BAND);
    let high = property.list_price * (1.0 + COMPETITION_PRICE_BAND);
    listings
        .iter()
        .filter(|l| l.property_id != property.property_id)
        .filter(|l| l.distance_miles <= COMPETITION_RADIUS_MILES)
        .filter(|l| l.list_price >= low && l.list_price <= high)
        .collect()
}

pub fn score_competition(competitors: usize) -> f64 {
    match competitors {
        n if n >= 10 => 85.0,
        n if n >= 5 => 70.0,
        n if n >= 2 => 50.0,
        1 => 40.0,
        _ => 25.0,
    }
}

/// List $/sqft against the median comparable $/sqft
pub fn score_price_positioning(
    property: &PropertyData,
    comps: &[ComparableSale],
    days_on_market: u32,
) -> (PricePositioning, f64) {
    let comp_ppsf: Vec<f64> = comps.iter().filter_map(ComparableSale::price_per_sqft).collect();

    let (positioning, score) = match (property.price_per_sqft(), median(&comp_ppsf)) {
        (Some(subject), Some(market)) if market > 0.0 => {
            let ratio = subject / market;
            if ratio > 1.10 {
                (PricePositioning::Overpriced, 85.0)
            } else if ratio > 1.03 {
                (PricePositioning::AboveMarket, 65.0)
            } else if ratio >= 0.97 {
                (PricePositioning::AtMarket, 45.0)
            } else if ratio >= 0.90 {
                (PricePositioning::BelowMarket, 25.0)
            } else {
                (PricePositioning::Underpriced, 10.0)
            }
        }
        _ => (PricePositioning::AtMarket, 50.0),
    };

    let stale_bonus = if days_on_market > 90 { 10.0 } else { 0.0 };
    (positioning, clamp_score(score + stale_bonus))
}

pub fn score_buyer_advantage(buyer: &BuyerProfile) -> f64 {
    let mut score = 30.0;
    if buyer.pre_approved {
        score += 20.0;
    }
    if buyer.cash_offer {
        score += 30.0;
    }
    if buyer.down_payment_pct.map(|d| d >= 0.20).unwrap_or(false) {
        score += 10.0;
    }
    if buyer.flexible_timeline {
        score += 10.0;
    }
    clamp_score(score)
}

/// Buyer leverage by calendar month (1 = January); winter favors buyers
pub fn seasonal_score(month: u32) -> f64 {
    match month {
        1 => 80.0,
        2 => 70.0,
        3 => 55.0,
        4 => 40.0,
        5 => 35.0,
        6 => 35.0,
        7 => 45.0,
        8 => 50.0,
        9 => 60.0,
        10 => 65.0,
        11 => 75.0,
        12 => 85.0,
        _ => 50.0,
    }
}

pub fn cash_offer_boost(buyer: &BuyerProfile) -> f64 {
    if buyer.cash_offer {
        25.0
    } else {
        0.0
    }
}

pub fn quick_close_advantage(buyer: &BuyerProfile) -> f64 {
    match buyer.quick_close_days {
        Some(days) if days <= 21 => 10.0,
        Some(days) if days <= 30 => 5.0,
        _ => 0.0,
    }
}

/// Unique homes have fewer substitutes, cookie-cutter ones more
pub fn uniqueness_adjustment(property: &PropertyData) -> f64 {
    match property.uniqueness_score {
        Some(u) if u >= 80.0 => -10.0,
        Some(u) if u <= 20.0 => 5.0,
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn property(list_price: f64, sqft: Option<f64>) -> PropertyData {
        PropertyData {
            property_id: "subject".into(),
            list_price,
            original_price: None,
            sqft,
            bedrooms: Some(3),
            bathrooms: Some(2.0),
            property_type: "single_family".into(),
            zip_code: Some("91730".into()),
            days_on_market: 30,
            year_built: None,
            uniqueness_score: None,
            listing_history: None,
        }
    }

    fn comp(price: f64, sqft: f64) -> ComparableSale {
        ComparableSale {
            address: None,
            sale_price: price,
            sqft: Some(sqft),
            sold_date: None,
            distance_miles: Some(0.5),
        }
    }

    #[test]
    fn test_market_condition_buckets() {
        let mut c = MarketConditions::neutral(None);
        assert_eq!(score_market_condition(&c), (MarketCondition::Balanced, 50.0));

        c.months_of_supply = 7.0;
        c.median_price_trend_pct = -2.0;
        c.avg_sale_to_list = 0.95;
        assert_eq!(score_market_condition(&c), (MarketCondition::BuyersMarket, 95.0));

        c.months_of_supply = 1.5;
        c.median_price_trend_pct = 8.0;
        c.avg_sale_to_list = 1.04;
        assert_eq!(score_market_condition(&c), (MarketCondition::SellersMarket, 5.0));
    }

    #[test]
    fn test_inventory_buckets() {
        assert_eq!(score_inventory(9.0), 90.0);
        assert_eq!(score_inventory(6.0), 75.0);
        assert_eq!(score_inventory(5.0), 50.0);
        assert_eq!(score_inventory(2.5), 30.0);
        assert_eq!(score_inventory(1.0), 15.0);
    }

    #[test]
    fn test_competitor_filter() {
        let subject = property(500_000.0, Some(2000.0));
        let listings = vec![
            CompetingListing { property_id: "a".into(), list_price: 520_000.0, distance_miles: 0.4, days_on_market: 10 },
            CompetingListing { property_id: "b".into(), list_price: 620_000.0, distance_miles: 0.2, days_on_market: 10 },
            CompetingListing { property_id: "c".into(), list_price: 480_000.0, distance_miles: 2.5, days_on_market: 10 },
            CompetingListing { property_id: "subject".into(), list_price: 500_000.0, distance_miles: 0.0, days_on_market: 30 },
        ];
        let found = direct_competitors(&subject, &listings);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].property_id, "a");
        assert_eq!(score_competition(found.len()), 40.0);
        assert_eq!(score_competition(0), 25.0);
        assert_eq!(score_competition(12), 85.0);
    }

    #[test]
    fn test_price_positioning() {
        let subject = property(600_000.0, Some(2000.0)); // $300/sqft
        let comps = vec![comp(520_000.0, 2000.0), comp(500_000.0, 2000.0), comp(540_000.0, 2000.0)];
        // median $260/sqft, ratio 1.15
        assert_eq!(
            score_price_positioning(&subject, &comps, 30),
            (PricePositioning::Overpriced, 85.0)
        );
        assert_eq!(
            score_price_positioning(&subject, &comps, 120),
            (PricePositioning::Overpriced, 95.0)
        );
        assert_eq!(
            score_price_positioning(&subject, &[], 30),
            (PricePositioning::AtMarket, 50.0)
        );
        assert_eq!(
            score_price_positioning(&property(600_000.0, None), &comps, 30),
            (PricePositioning::AtMarket, 50.0)
        );
    }

    #[test]
    fn test_buyer_advantage() {
        let mut buyer = BuyerProfile::new("lead");
        assert_eq!(score_buyer_advantage(&buyer), 30.0);
        buyer.pre_approved = true;
        buyer.cash_offer = true;
        buyer.down_payment_pct = Some(0.25);
        buyer.flexible_timeline = true;
        assert_eq!(score_buyer_advantage(&buyer), 100.0);
    }

    #[test]
    fn test_seasonal_table() {
        assert_eq!(seasonal_score(1), 80.0);
        assert_eq!(seasonal_score(5), 35.0);
        assert_eq!(seasonal_score(12), 85.0);
    }

    #[test]
    fn test_adjustments() {
        let mut buyer = BuyerProfile::new("lead");
        buyer.quick_close_days = Some(14);
        assert_eq!(quick_close_advantage(&buyer), 10.0);
        buyer.quick_close_days = Some(30);
        assert_eq!(quick_close_advantage(&buyer), 5.0);
        buyer.quick_close_days = Some(45);
        assert_eq!(quick_close_advantage(&buyer), 0.0);

        let mut p = property(500_000.0, None);
        p.uniqueness_score = Some(90.0);
        assert_eq!(uniqueness_adjustment(&p), -10.0);
        p.uniqueness_score = Some(10.0);
        assert_eq!(uniqueness_adjustment(&p), 5.0);
    }
}
