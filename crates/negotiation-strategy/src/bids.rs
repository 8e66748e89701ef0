use negotiation_core::score::clamp_score;
use serde::{Deserialize, Serialize};

/// Planned sequence of bids from the opening offer toward the ceiling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BidPlan {
    pub seller_low: f64,
    pub seller_high: f64,
    pub ceiling: f64,
    pub time_pressure: f64,
    pub rounds: usize,
    pub bids: Vec<f64>,
}

/// Plans how the buyer should walk up from the opening offer.
///
/// The seller's acceptable range is estimated as list price at the top and
/// up to 10% under list at the bottom, depending on how flexible the seller
/// is. Higher urgency means fewer, larger steps.
#[derive(Debug, Clone, Copy, Default)]
pub struct BidSequenceOptimizer;

impl BidSequenceOptimizer {
    pub fn new() -> Self {
        Self
    }

    pub fn estimate_seller_range(&self, list_price: f64, flexibility_score: f64) -> (f64, f64) {
        let flexibility = clamp_score(flexibility_score) / 100.0;
        (list_price * (1.0 - 0.10 * flexibility), list_price)
    }

    pub fn rounds_for(&self, time_pressure: f64) -> usize {
        if time_pressure > 0.7 {
            3
        } else if time_pressure > 0.4 {
            4
        } else {
            5
        }
    }

    pub fn plan(
        &self,
        opening_offer: f64,
        walkaway: f64,
        list_price: f64,
        flexibility_score: f64,
        urgency_score: f64,
    ) -> BidPlan {
        let (seller_low, seller_high) = self.estimate_seller_range(list_price, flexibility_score);
        let ceiling = walkaway.min(seller_high);
        let time_pressure = clamp_score(urgency_score) / 100.0;
        let rounds = self.rounds_for(time_pressure);
        let step = 0.35 + 0.3 * time_pressure;

        let cap = ceiling.floor();
        let mut bid = opening_offer.min(ceiling);
        let mut bids = Vec::with_capacity(rounds);
        bids.push(bid.round().min(cap));
        for _ in 1..rounds {
            bid += (ceiling - bid) * step;
            bids.push(bid.round().min(cap));
        }

        BidPlan {
            seller_low,
            seller_high,
            ceiling,
            time_pressure,
            rounds,
            bids,
        }
    }
}

/// Tone of the overall approach from warmth and dominance, both in [0, 1]
pub fn strategy_blend(warmth: f64, dominance: f64) -> &'static str {
    match (warmth >= 0.6, dominance >= 0.6) {
        (true, true) => "firm_but_warm",
        (true, false) => "warm_collaborative",
        (false, true) => "assertive_anchor",
        (false, false) => "measured_neutral",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_is_non_decreasing_and_capped() {
        let optimizer = BidSequenceOptimizer::new();
        let plan = optimizer.plan(450_000.0, 490_000.0, 500_000.0, 60.0, 30.0);

        assert_eq!(plan.rounds, 5);
        assert_eq!(plan.bids.len(), 5);
        assert_eq!(plan.bids[0], 450_000.0);
        assert!(plan.bids.windows(2).all(|w| w[0] <= w[1]));
        assert!(plan.bids.iter().all(|b| *b <= 490_000.0));
    }

    #[test]
    fn test_high_urgency_uses_fewer_rounds() {
        let optimizer = BidSequenceOptimizer::new();
        assert_eq!(optimizer.plan(400_000.0, 480_000.0, 500_000.0, 50.0, 85.0).rounds, 3);
        assert_eq!(optimizer.plan(400_000.0, 480_000.0, 500_000.0, 50.0, 55.0).rounds, 4);
    }

    #[test]
    fn test_walkaway_above_list_is_capped_at_list() {
        let optimizer = BidSequenceOptimizer::new();
        let plan = optimizer.plan(510_000.0, 540_000.0, 500_000.0, 50.0, 50.0);
        assert_eq!(plan.ceiling, 500_000.0);
        assert!(plan.bids.iter().all(|b| *b <= 500_000.0));
    }

    #[test]
    fn test_seller_range_scales_with_flexibility() {
        let optimizer = BidSequenceOptimizer::new();
        assert_eq!(optimizer.estimate_seller_range(500_000.0, 100.0), (450_000.0, 500_000.0));
        assert_eq!(optimizer.estimate_seller_range(500_000.0, 0.0), (500_000.0, 500_000.0));
    }

    #[test]
    fn test_blend() {
        assert_eq!(strategy_blend(0.8, 0.7), "firm_but_warm");
        assert_eq!(strategy_blend(0.8, 0.2), "warm_collaborative");
        assert_eq!(strategy_blend(0.1, 0.9), "assertive_anchor");
        assert_eq!(strategy_blend(0.3, 0.3), "measured_neutral");
    }
}
