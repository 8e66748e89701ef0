use chrono::Utc;
use negotiation_core::score::clamp_score;
use negotiation_core::{
    BuyerProfile, MarketLeverage, NegotiationError, NegotiationResult, NegotiationStrategy,
    PropertyData, SellerPsychologyProfile, UrgencyLevel, WinProbabilityAnalysis,
};
use std::collections::BTreeMap;

/// Inputs that do not change between scenarios
struct Baseline<'a> {
    psychology: &'a SellerPsychologyProfile,
    leverage: &'a MarketLeverage,
    strategy: &'a NegotiationStrategy,
    buyer: &'a BuyerProfile,
}

impl Baseline<'_> {
    /// Acceptance probability (0-100) for an offer at `ratio` of list
    fn probability(&self, ratio: f64) -> f64 {
        let urgency_bonus = match self.psychology.urgency_level {
            UrgencyLevel::Critical => 10.0,
            UrgencyLevel::High => 6.0,
            UrgencyLevel::Moderate => 2.0,
            UrgencyLevel::Low => -4.0,
        };

        let mut p = 50.0
            + (ratio - 0.95) * 300.0
            + (self.psychology.flexibility_score - 50.0) * 0.2
            + (self.leverage.overall_leverage_score - 50.0) * 0.25
            + urgency_bonus;

        if self.buyer.cash_offer {
            p += 8.0;
        }
        if self.buyer.pre_approved {
            p += 4.0;
        }
        if self.buyer.flexible_timeline {
            p += 3.0;
        }
        if self.psychology.emotional_attachment_score > 70.0 {
            p -= 6.0;
        }
        if self.strategy.confidence_score > 70.0 {
            p += 5.0;
        }

        clamp_score(p)
    }
}

/// Estimates how likely the recommended offer is to be accepted, and how
/// alternative offer structures compare.
#[derive(Debug, Clone, Copy, Default)]
pub struct WinProbabilityPredictor;

impl WinProbabilityPredictor {
    pub fn new() -> Self {
        Self
    }

    pub async fn predict_win_probability(
        &self,
        property_id: &str,
        psychology: &SellerPsychologyProfile,
        leverage: &MarketLeverage,
        strategy: &NegotiationStrategy,
        property: &PropertyData,
        buyer: &BuyerProfile,
    ) -> NegotiationResult<WinProbabilityAnalysis> {
        if property.list_price <= 0.0 {
            return Err(NegotiationError::InvalidInput(format!(
                "property {} has no list price",
                property_id
            )));
        }

        let baseline = Baseline {
            psychology,
            leverage,
            strategy,
            buyer,
        };
        let list = property.list_price;
        let win_probability = baseline.probability(strategy.offer_ratio);

        let half_width = (20.0 - 0.1 * strategy.confidence_score).max(0.0);
        let confidence_interval = (
            clamp_score(win_probability - half_width),
            clamp_score(win_probability + half_width),
        );

        let quick_close_bonus = if buyer.cash_offer {
            25.0
        } else if buyer.quick_close_days.map(|d| d <= 30).unwrap_or(false) {
            10.0
        } else {
            5.0
        };
        let escalation_bonus = if leverage.competitive_pressure > 50.0 { 12.0 } else { 6.0 };

        let scenarios = BTreeMap::from([
            ("recommended_offer".to_string(), win_probability),
            ("offer_at_list".to_string(), baseline.probability(1.0)),
            ("offer_low_end".to_string(), baseline.probability(strategy.offer_range_low / list)),
            ("offer_high_end".to_string(), baseline.probability(strategy.offer_range_high / list)),
            ("quick_close".to_string(), clamp_score(win_probability + quick_close_bonus)),
            ("escalation_clause".to_string(), clamp_score(win_probability + escalation_bonus)),
        ]);

        let analysis = WinProbabilityAnalysis {
            property_id: property_id.to_string(),
            win_probability,
            confidence_interval,
            scenarios,
            key_factors: key_factors(psychology, leverage, buyer),
            risk_factors: risk_factors(psychology, leverage, strategy),
            predicted_at: Utc::now(),
        };

        tracing::info!(
            "Win probability for {}: {:.1}% ({:.1}-{:.1})",
            property_id,
            analysis.win_probability,
            analysis.confidence_interval.0,
            analysis.confidence_interval.1
        );

        Ok(analysis)
    }
}

fn key_factors(
    psychology: &SellerPsychologyProfile,
    leverage: &MarketLeverage,
    buyer: &BuyerProfile,
) -> Vec<String> {
    let mut factors = Vec::new();
    if psychology.urgency_level >= UrgencyLevel::High {
        factors.push(format!("Seller urgency is {}", psychology.urgency_level));
    }
    if psychology.flexibility_score >= 60.0 {
        factors.push(format!("Seller flexibility {:.0}/100", psychology.flexibility_score));
    }
    if leverage.overall_leverage_score >= 60.0 {
        factors.push(format!("Strong buyer leverage ({:.0}/100)", leverage.overall_leverage_score));
    }
    if buyer.cash_offer {
        factors.push("Cash offer removes financing risk".to_string());
    } else if buyer.pre_approved {
        factors.push("Buyer is pre-approved".to_string());
    }
    if buyer.flexible_timeline {
        factors.push("Flexible closing timeline".to_string());
    }
    if factors.is_empty() {
        factors.push("No single dominant factor; outcome depends on execution".to_string());
    }
    factors
}

fn risk_factors(
    psychology: &SellerPsychologyProfile,
    leverage: &MarketLeverage,
    strategy: &NegotiationStrategy,
) -> Vec<String> {
    let mut risks = Vec::new();
    if psychology.emotional_attachment_score > 70.0 {
        risks.push("High emotional attachment may make the seller resist a low offer".to_string());
    }
    if leverage.competitive_pressure > 60.0 {
        risks.push("Few comparable alternatives; other buyers may compete".to_string());
    }
    if strategy.offer_ratio < 0.90 {
        risks.push(format!(
            "Offer at {:.0}% of list risks offending the seller",
            strategy.offer_ratio * 100.0
        ));
    }
    if leverage.overall_leverage_score < 40.0 {
        risks.push("Market conditions favor the seller".to_string());
    }
    if strategy.confidence_score < 50.0 {
        risks.push("Limited data behind this strategy".to_string());
    }
    risks
}
