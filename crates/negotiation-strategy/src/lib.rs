pub mod bids;
pub mod pricing;
pub mod tactics;

pub use bids::{strategy_blend, BidPlan, BidSequenceOptimizer};
pub use pricing::{price_offer, strategy_confidence, OfferPricing};
pub use tactics::{score_tactics, TacticScores};

use chrono::{Duration, Utc};
use llm_client::prompts::{bullets, with_persona};
use llm_client::{request_structured, LlmProvider, StrategyTalkingPoints};
use negotiation_core::{
    fingerprint, BuyerProfile, MarketLeverage, NegotiationError, NegotiationResult,
    NegotiationStrategy, NegotiationTactic, PropertyData, SellerPsychologyProfile, TtlCache,
};
use std::sync::Arc;

use tactics::{default_objections, playbook};

const CACHE_PREFIX: &str = "negotiation_strategy";

/// Turns a seller profile and market leverage into a concrete offer plan
pub struct NegotiationStrategyEngine {
    llm: Arc<dyn LlmProvider>,
    bid_optimizer: BidSequenceOptimizer,
    cache: TtlCache<NegotiationStrategy>,
    cache_ttl: Duration,
}

impl NegotiationStrategyEngine {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self {
            llm,
            bid_optimizer: BidSequenceOptimizer::new(),
            cache: TtlCache::new(),
            cache_ttl: Duration::hours(2),
        }
    }

    pub async fn generate_negotiation_strategy(
        &self,
        property_id: &str,
        psychology: &SellerPsychologyProfile,
        leverage: &MarketLeverage,
        property: &PropertyData,
        buyer: &BuyerProfile,
    ) -> NegotiationResult<NegotiationStrategy> {
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
            fingerprint(&(psychology, leverage, property, buyer))
        );
        if let Some(cached) = self.cache.get(&cache_key) {
            tracing::debug!("Strategy cache hit for {}", property_id);
            return Ok(cached);
        }

        let pricing = price_offer(property.list_price, psychology, leverage, buyer);
        let tactic_scores = score_tactics(psychology, leverage, buyer);
        let (primary_tactic, secondary_tactic) = tactic_scores.ranked();
        let book = playbook(primary_tactic);

        let bid_plan = self.bid_optimizer.plan(
            pricing.range_low,
            pricing.walkaway,
            property.list_price,
            psychology.flexibility_score,
            psychology.urgency_score,
        );

        let warmth = buyer
            .relationship_importance
            .max(psychology.emotional_attachment_score / 100.0);
        let dominance = leverage.overall_leverage_score / 100.0;

        let talking = self
            .talking_points(property_id, primary_tactic, psychology, leverage, &pricing)
            .await;
        let talking_points = if talking.talking_points.is_empty() {
            book.talking_points.iter().map(|s| s.to_string()).collect()
        } else {
            talking.talking_points
        };
        let objection_responses = if talking.objection_responses.is_empty() {
            default_objections(primary_tactic)
        } else {
            talking.objection_responses
        };
        let primary_script = talking
            .primary_script
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| book.opening_script.to_string());

        let strategy = NegotiationStrategy {
            property_id: property_id.to_string(),
            primary_tactic,
            secondary_tactic,
            tactic_scores: tactic_scores.to_map(),
            recommended_offer_price: pricing.recommended_offer,
            offer_ratio: pricing.offer_ratio,
            offer_range_low: pricing.range_low,
            offer_range_high: pricing.range_high,
            walkaway_price: pricing.walkaway,
            terms_to_emphasize: book.terms.iter().map(|s| s.to_string()).collect(),
            concessions_to_offer: book.concessions.iter().map(|s| s.to_string()).collect(),
            primary_script,
            talking_points,
            objection_responses,
            optimal_bid_sequence: bid_plan.bids,
            strategy_blend: strategy_blend(warmth, dominance).to_string(),
            confidence_score: strategy_confidence(psychology, leverage),
            generated_at: Utc::now(),
        };

        tracing::info!(
            "Strategy for {}: {} / {} at {:.1}% of list (${:.0}), confidence {:.0}",
            property_id,
            strategy.primary_tactic,
            strategy.secondary_tactic,
            strategy.offer_ratio * 100.0,
            strategy.recommended_offer_price,
            strategy.confidence_score
        );

        self.cache.set(cache_key, strategy.clone(), self.cache_ttl);
        Ok(strategy)
    }

    pub fn invalidate(&self, property_id: &str) -> usize {
        self.cache
            .invalidate_prefix(&format!("{}:{}:", CACHE_PREFIX, property_id))
    }

    pub fn purge_expired(&self) -> usize {
        self.cache.purge_expired()
    }

    async fn talking_points(
        &self,
        property_id: &str,
        tactic: NegotiationTactic,
        psychology: &SellerPsychologyProfile,
        leverage: &MarketLeverage,
        pricing: &OfferPricing,
    ) -> StrategyTalkingPoints {
        let task = format!(
            "Write negotiation talking points for a buyer's offer.\n\n\
TACTIC: {}\n\
OFFER: ${:.0} ({:.1}% of list), walkaway ${:.0}\n\
SELLER: {} motivation, {} urgency, flexibility {:.0}/100, emotional attachment {:.0}/100\n\
SELLER CONCERNS:\n{}\n\
MARKET: {}, price {}, buyer leverage {:.0}/100\n\n\
Return keys: talking_points (list of 3-5 strings), objection_responses (object mapping \
objection to response), primary_script (string, optional).",
            tactic,
            pricing.recommended_offer,
            pricing.offer_ratio * 100.0,
            pricing.walkaway,
            psychology.motivation_type,
            psychology.urgency_level,
            psychology.flexibility_score,
            psychology.emotional_attachment_score,
            bullets(&psychology.primary_concerns),
            leverage.market_condition,
            leverage.price_positioning,
            leverage.overall_leverage_score,
        );

        match request_structured::<StrategyTalkingPoints>(self.llm.as_ref(), &with_persona(&task)).await {
            Ok(points) => points,
            Err(e) => {
                tracing::warn!("Talking points unavailable for {}: {}", property_id, e);
                StrategyTalkingPoints::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use llm_client::testing::{FailingProvider, ScriptedProvider};
    use negotiation_core::{MarketCondition, MotivationType, PricePositioning};
    use crate::pricing::fixtures::{leverage, property, psychology};
    use serde_json::json;

    #[tokio::test]
    async fn test_offer_within_bounds_of_list() {
        let engine = NegotiationStrategyEngine::new(Arc::new(FailingProvider::new()));
        let cases = [
            (95.0, 90.0, 10.0, 95.0, PricePositioning::Overpriced, MarketCondition::BuyersMarket),
            (5.0, 10.0, 95.0, 5.0, PricePositioning::Underpriced, MarketCondition::SellersMarket),
            (50.0, 50.0, 50.0, 50.0, PricePositioning::AtMarket, MarketCondition::Balanced),
        ];
        for (urgency, flex, attachment, lev, positioning, condition) in cases {
            let psych = psychology(urgency, flex, attachment);
            let lev = leverage(lev, positioning, condition);
            let property = property(700_000.0);
            let strategy = engine
                .generate_negotiation_strategy("p1", &psych, &lev, &property, &BuyerProfile::new("lead"))
                .await
                .unwrap();

            assert!(strategy.recommended_offer_price >= 0.80 * 700_000.0);
            assert!(strategy.recommended_offer_price <= 1.05 * 700_000.0);
            assert!((0.0..=100.0).contains(&strategy.confidence_score));
            assert!(strategy.offer_range_low <= strategy.recommended_offer_price);
            assert!(strategy.recommended_offer_price <= strategy.offer_range_high);
            assert!(strategy
                .optimal_bid_sequence
                .iter()
                .all(|b| *b <= strategy.walkaway_price));
        }
    }

    #[tokio::test]
    async fn test_llm_points_replace_fallbacks() {
        let llm = Arc::new(ScriptedProvider::new(json!({
            "talking_points": ["Your home has sat 90 days"],
            "objection_responses": {"too_low": "Comps say otherwise"},
            "primary_script": "Let's talk numbers."
        })));
        let engine = NegotiationStrategyEngine::new(llm.clone());
        let strategy = engine
            .generate_negotiation_strategy(
                "p1",
                &psychology(60.0, 60.0, 40.0),
                &leverage(55.0, PricePositioning::AboveMarket, MarketCondition::Balanced),
                &property(650_000.0),
                &BuyerProfile::new("lead"),
            )
            .await
            .unwrap();

        assert_eq!(strategy.talking_points, vec!["Your home has sat 90 days".to_string()]);
        assert_eq!(strategy.primary_script, "Let's talk numbers.");
        assert!(llm.prompts()[0].contains("TACTIC:"));
    }

    #[tokio::test]
    async fn test_fallbacks_and_cache() {
        let llm = Arc::new(FailingProvider::new());
        let engine = NegotiationStrategyEngine::new(llm.clone());
        let mut psych = psychology(85.0, 80.0, 20.0);
        psych.motivation_type = MotivationType::Distressed;
        let lev = leverage(80.0, PricePositioning::Overpriced, MarketCondition::BuyersMarket);
        let property = property(600_000.0);
        let buyer = BuyerProfile::new("lead");

        let first = engine
            .generate_negotiation_strategy("p1", &psych, &lev, &property, &buyer)
            .await
            .unwrap();
        let second = engine
            .generate_negotiation_strategy("p1", &psych, &lev, &property, &buyer)
            .await
            .unwrap();

        assert_eq!(llm.calls(), 1);
        assert_eq!(first, second);
        assert_eq!(first.primary_tactic, NegotiationTactic::Aggressive);
        assert_eq!(first.talking_points.len(), 3);
        assert_eq!(first.objection_responses.len(), 3);
        assert_eq!(first.strategy_blend, "assertive_anchor");
        assert_eq!(engine.invalidate("p1"), 1);
    }
}
