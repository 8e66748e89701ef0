//! Rule-based sub-analyses of a seller's listing behavior.
//!
//! Each function is pure: same listing, same communication data, same clock,
//! same answer. The point values are tuned constants and are kept as-is.

use chrono::{DateTime, Utc};
use negotiation_core::score::clamp_score;
use negotiation_core::{
    BehavioralPattern, CommunicationData, LifeEvent, ListingHistory, MarketContext, MarketResponse,
    MotivationType,
};

/// Urgency point table
pub const DOM_OVER_120_POINTS: f64 = 30.0;
pub const DOM_OVER_60_POINTS: f64 = 15.0;
pub const RECENT_DROP_POINTS: f64 = 25.0;
pub const MULTIPLE_DROPS_POINTS: f64 = 10.0;
pub const FAST_REPLY_POINTS: f64 = 20.0;
pub const REPEAT_LISTING_POINTS: f64 = 35.0;
pub const LIFE_EVENT_POINTS: f64 = 15.0;
pub const STALE_VS_MARKET_POINTS: f64 = 10.0;

/// A drop within this many days counts as recent
pub const RECENT_DROP_WINDOW_DAYS: i64 = 45;

const EMOTIONAL_KEYWORDS: &[&str] = &[
    "home", "memories", "family", "raised", "love", "neighborhood", "garden", "kids",
    "grandkids", "sentimental",
];

const FINANCIAL_KEYWORDS: &[&str] = &[
    "mortgage", "payment", "debt", "bills", "afford", "equity", "cash", "budget", "loan",
    "bank",
];

/// Classify how the seller has been reducing the price
pub fn classify_price_drops(listing: &ListingHistory) -> BehavioralPattern {
    let drops = listing.price_drops.len();
    if drops == 0 {
        return BehavioralPattern::PriceHolder;
    }

    let total = listing.total_reduction_pct();
    let average = listing.average_drop_pct();
    let per_month = listing.drops_per_month();

    if total >= 10.0 && drops >= 3 && per_month >= 1.0 {
        BehavioralPattern::PanicReducer
    } else if average >= 4.0 || total >= 8.0 {
        BehavioralPattern::AggressiveReducer
    } else if drops >= 3 && average < 3.0 {
        BehavioralPattern::IncrementalReducer
    } else {
        BehavioralPattern::StrategicReducer
    }
}

/// Funnel quality: views -> showings -> offers
pub fn assess_market_response(listing: &ListingHistory) -> MarketResponse {
    let (views, showings) = match (listing.listing_views, listing.showing_requests) {
        (Some(v), Some(s)) if v > 0 => (v as f64, s as f64),
        _ => return MarketResponse::Unknown,
    };
    let offers = listing.offers_received.unwrap_or(0) as f64;

    let showing_rate = showings / views;
    let offer_rate = if showings > 0.0 { offers / showings } else { 0.0 };

    if showing_rate >= 0.05 && offer_rate >= 0.10 {
        MarketResponse::Strong
    } else if showing_rate >= 0.02 || offers > 0.0 {
        MarketResponse::Moderate
    } else {
        MarketResponse::Weak
    }
}

/// Additive urgency score, clamped to [0, 100]
pub fn score_urgency(
    listing: &ListingHistory,
    communication: Option<&CommunicationData>,
    market: Option<&MarketContext>,
    now: DateTime<Utc>,
) -> f64 {
    let mut points = 0.0;

    if listing.days_on_market > 120 {
        points += DOM_OVER_120_POINTS;
    } else if listing.days_on_market > 60 {
        points += DOM_OVER_60_POINTS;
    }

    if listing.has_recent_drop(now, RECENT_DROP_WINDOW_DAYS) {
        points += RECENT_DROP_POINTS;
    }
    if listing.price_drops.len() >= 2 {
        points += MULTIPLE_DROPS_POINTS;
    }
    if listing.previous_attempts() >= 1 {
        points += REPEAT_LISTING_POINTS;
    }

    if let Some(comm) = communication {
        if comm.replies_fast() {
            points += FAST_REPLY_POINTS;
        }
        if matches!(
            comm.life_event,
            Some(LifeEvent::Relocation | LifeEvent::Divorce | LifeEvent::FinancialHardship | LifeEvent::Estate)
        ) {
            points += LIFE_EVENT_POINTS;
        }
    }

    if let Some(avg_dom) = market.and_then(|m| m.avg_days_on_market) {
        if avg_dom > 0.0 && listing.days_on_market as f64 > avg_dom * 1.5 {
            points += STALE_VS_MARKET_POINTS;
        }
    }

    clamp_score(points)
}

/// Raw motivation accumulators
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MotivationScores {
    pub emotional: f64,
    pub financial: f64,
    pub strategic: f64,
    pub distressed: f64,
}

impl MotivationScores {
    /// Argmax; ties go Financial, Distressed, Emotional, Strategic
    pub fn dominant(&self) -> MotivationType {
        let ranked = [
            (MotivationType::Financial, self.financial),
            (MotivationType::Distressed, self.distressed),
            (MotivationType::Emotional, self.emotional),
            (MotivationType::Strategic, self.strategic),
        ];
        let scores: Vec<f64> = ranked.iter().map(|(_, s)| *s).collect();
        let idx = negotiation_core::score::argmax(&scores).unwrap_or(0);
        ranked[idx].0
    }
}

fn keyword_hits(keywords: &[String], vocabulary: &[&str]) -> usize {
    keywords
        .iter()
        .map(|k| k.to_lowercase())
        .filter(|k| vocabulary.iter().any(|v| k.contains(v)))
        .count()
}

pub fn score_motivation(
    listing: &ListingHistory,
    communication: Option<&CommunicationData>,
) -> MotivationScores {
    let mut scores = MotivationScores::default();
    let drops = listing.price_drops.len();
    let total_reduction = listing.total_reduction_pct();
    let dom = listing.days_on_market;

    // Emotional
    if dom > 90 && drops == 0 {
        scores.emotional += 15.0;
    }
    // Financial
    if drops >= 2 {
        scores.financial += 25.0;
    }
    if total_reduction > 5.0 {
        scores.financial += 20.0;
    }
    // Strategic
    if dom < 30 {
        scores.strategic += 15.0;
    }
    if drops == 0 {
        scores.strategic += 15.0;
    }
    // Distressed
    if listing.previous_attempts() >= 1 {
        scores.distressed += 30.0;
    }
    if total_reduction > 10.0 {
        scores.distressed += 30.0;
    }
    if dom > 120 {
        scores.distressed += 20.0;
    }

    if let Some(comm) = communication {
        if comm.years_owned.map(|y| y > 10).unwrap_or(false) {
            scores.emotional += 25.0;
        }
        scores.emotional += (keyword_hits(&comm.keywords, EMOTIONAL_KEYWORDS) as f64 * 10.0).min(30.0);
        scores.financial += (keyword_hits(&comm.keywords, FINANCIAL_KEYWORDS) as f64 * 10.0).min(30.0);
        if comm.replies_fast() {
            scores.financial += 10.0;
        }
        if comm.is_investor {
            scores.strategic += 35.0;
        }

        match comm.life_event {
            Some(LifeEvent::Estate | LifeEvent::Retirement | LifeEvent::Downsizing) => {
                scores.emotional += 20.0
            }
            Some(LifeEvent::FinancialHardship) => {
                scores.financial += 30.0;
                scores.distressed += 25.0;
            }
            Some(LifeEvent::Divorce) => scores.distressed += 25.0,
            Some(LifeEvent::Upsizing | LifeEvent::Relocation) => scores.strategic += 10.0,
            None => {}
        }
    }

    scores
}

/// How firmly the seller is holding on, per drop pattern
pub fn holding_strength(pattern: BehavioralPattern) -> f64 {
    match pattern {
        BehavioralPattern::PriceHolder => 80.0,
        BehavioralPattern::StrategicReducer => 60.0,
        BehavioralPattern::IncrementalReducer => 45.0,
        BehavioralPattern::AggressiveReducer => 25.0,
        BehavioralPattern::PanicReducer => 15.0,
    }
}

/// Financial pressure implied by the drop pattern
pub fn drop_pressure(pattern: BehavioralPattern) -> f64 {
    match pattern {
        BehavioralPattern::PanicReducer => 90.0,
        BehavioralPattern::AggressiveReducer => 75.0,
        BehavioralPattern::IncrementalReducer => 55.0,
        BehavioralPattern::StrategicReducer => 35.0,
        BehavioralPattern::PriceHolder => 15.0,
    }
}
