pub mod rules;

use chrono::{Duration, Utc};
use llm_client::prompts::{bullets, with_persona};
use llm_client::{request_structured, LlmProvider, PsychologyInsights};
use negotiation_core::score::{clamp_score, weighted_sum};
use negotiation_core::{
    fingerprint, CommunicationData, CommunicationProfile, ListingHistory, MarketContext,
    NegotiationError, NegotiationResult, SellerPsychologyProfile, TtlCache, UrgencyLevel,
};
use std::collections::BTreeMap;
use std::sync::Arc;

use rules::{
    assess_market_response, classify_price_drops, drop_pressure, holding_strength,
    score_motivation, score_urgency, MotivationScores,
};

const CACHE_PREFIX: &str = "seller_psychology";

/// Profiles a seller from listing behavior, communication metadata and one
/// qualitative LLM read.
pub struct SellerPsychologyAnalyzer {
    llm: Arc<dyn LlmProvider>,
    cache: TtlCache<SellerPsychologyProfile>,
    cache_ttl: Duration,
}

impl SellerPsychologyAnalyzer {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self {
            llm,
            cache: TtlCache::new(),
            cache_ttl: Duration::hours(4),
        }
    }

    pub async fn analyze_seller_psychology(
        &self,
        property_id: &str,
        listing: &ListingHistory,
        communication: Option<&CommunicationData>,
        market: Option<&MarketContext>,
    ) -> NegotiationResult<SellerPsychologyProfile> {
        if listing.current_price <= 0.0 {
            return Err(NegotiationError::InvalidInput(format!(
                "listing for {} has no current price",
                property_id
            )));
        }

        let cache_key = format!(
            "{}:{}:{}",
            CACHE_PREFIX,
            property_id,
            fingerprint(&(listing, communication, market))
        );
        if let Some(cached) = self.cache.get(&cache_key) {
            tracing::debug!("Seller psychology cache hit for {}", property_id);
            return Ok(cached);
        }

        let now = Utc::now();
        let pattern = classify_price_drops(listing);
        let market_response = assess_market_response(listing);
        let urgency_score = score_urgency(listing, communication, market, now);
        let urgency_level = UrgencyLevel::from_score(urgency_score);
        let motivation = score_motivation(listing, communication);
        let motivation_type = motivation.dominant();

        let insights = self
            .qualitative_insights(property_id, listing, communication, &motivation, urgency_score)
            .await;

        let market_score = market_response.score();
        let emotional_attachment_score = clamp_score(weighted_sum(&[
            (motivation.emotional, 0.30),
            (100.0 - urgency_score, 0.20),
            (holding_strength(pattern), 0.20),
            (100.0 - market_score, 0.10),
            (clamp_score(insights.emotional_intensity), 0.20),
        ]));
        let financial_pressure_score = clamp_score(weighted_sum(&[
            (urgency_score, 0.35),
            (drop_pressure(pattern), 0.25),
            (100.0 - market_score, 0.15),
            (motivation.financial.max(motivation.distressed), 0.10),
            (clamp_score(insights.financial_stress), 0.15),
        ]));
        let flexibility_score = clamp_score(weighted_sum(&[
            (financial_pressure_score, 0.40),
            (100.0 - emotional_attachment_score, 0.30),
            (urgency_score, 0.30),
        ]));

        let profile = SellerPsychologyProfile {
            property_id: property_id.to_string(),
            motivation_type,
            urgency_level,
            urgency_score,
            behavioral_pattern: pattern,
            market_response,
            flexibility_score,
            financial_pressure_score,
            emotional_attachment_score,
            motivation_scores: motivation_map(&motivation),
            primary_concerns: insights.primary_concerns,
            hot_buttons: insights.hot_buttons,
            emotional_assessment: insights.emotional_assessment,
            communication: communication_profile(communication),
            analyzed_at: now,
        };

        tracing::info!(
            "Seller psychology for {}: {} motivation, {} urgency ({:.0}), flexibility {:.0}",
            property_id,
            profile.motivation_type,
            profile.urgency_level,
            profile.urgency_score,
            profile.flexibility_score
        );

        self.cache.set(cache_key, profile.clone(), self.cache_ttl);
        Ok(profile)
    }

    /// Drop every cached profile for a property
    pub fn invalidate(&self, property_id: &str) -> usize {
        self.cache
            .invalidate_prefix(&format!("{}:{}:", CACHE_PREFIX, property_id))
    }

    pub fn purge_expired(&self) -> usize {
        self.cache.purge_expired()
    }

    async fn qualitative_insights(
        &self,
        property_id: &str,
        listing: &ListingHistory,
        communication: Option<&CommunicationData>,
        motivation: &MotivationScores,
        urgency_score: f64,
    ) -> PsychologyInsights {
        let prompt = build_prompt(listing, communication, motivation, urgency_score);
        match request_structured::<PsychologyInsights>(self.llm.as_ref(), &prompt).await {
            Ok(insights) => insights,
            Err(e) => {
                tracing::warn!(
                    "Psychology insights unavailable for {} via {}: {}",
                    property_id,
                    self.llm.backend_name(),
                    e
                );
                PsychologyInsights::default()
            }
        }
    }
}

fn motivation_map(scores: &MotivationScores) -> BTreeMap<String, f64> {
    BTreeMap::from([
        ("emotional".to_string(), scores.emotional),
        ("financial".to_string(), scores.financial),
        ("strategic".to_string(), scores.strategic),
        ("distressed".to_string(), scores.distressed),
    ])
}

fn communication_profile(communication: Option<&CommunicationData>) -> CommunicationProfile {
    match communication {
        Some(comm) => CommunicationProfile {
            avg_response_time_hours: comm.avg_response_time_hours,
            response_rate: comm.response_rate,
            style: comm
                .communication_style
                .clone()
                .unwrap_or_else(|| "unknown".to_string()),
            message_count: comm.message_count,
        },
        None => CommunicationProfile {
            style: "unknown".to_string(),
            ..Default::default()
        },
    }
}

fn build_prompt(
    listing: &ListingHistory,
    communication: Option<&CommunicationData>,
    motivation: &MotivationScores,
    urgency_score: f64,
) -> String {
    let drops: Vec<String> = listing
        .price_drops
        .iter()
        .map(|d| {
            format!(
                "{}: ${:.0} -> ${:.0} ({:.1}%)",
                d.date.format("%Y-%m-%d"),
                d.previous_price,
                d.new_price,
                d.pct()
            )
        })
        .collect();
    let keywords: Vec<String> = communication.map(|c| c.keywords.clone()).unwrap_or_default();
    let life_event = communication
        .and_then(|c| c.life_event)
        .map(|e| format!("{:?}", e))
        .unwrap_or_else(|| "none reported".to_string());

    let task = format!(
        "Analyze this home seller's psychology.\n\n\
LISTING:\n- original price: ${:.0}\n- current price: ${:.0}\n- days on market: {}\n- previous listing attempts: {}\n\
PRICE DROPS (average {:.1}%):\n{}\n\
SELLER LANGUAGE:\n{}\n\
LIFE EVENT: {}\n\
RULE SCORES: emotional {:.0}, financial {:.0}, strategic {:.0}, distressed {:.0}, urgency {:.0}\n\n\
Return keys: primary_concerns (list), hot_buttons (list), emotional_assessment (string), \
emotional_intensity (0-100), financial_stress (0-100).",
        listing.original_list_price,
        listing.current_price,
        listing.days_on_market,
        listing.previous_attempts(),
        listing.average_drop_pct(),
        bullets(&drops),
        bullets(&keywords),
        life_event,
        motivation.emotional,
        motivation.financial,
        motivation.strategic,
        motivation.distressed,
        urgency_score,
    );
    with_persona(&task)
}

#[cfg(test)]
mod tests {
    use super::*;
    use llm_client::testing::{FailingProvider, ScriptedProvider};
    use negotiation_core::{BehavioralPattern, MotivationType, PriceDrop};
    use serde_json::json;

    fn listing(dom: u32) -> ListingHistory {
        ListingHistory {
            original_list_price: 650_000.0,
            current_price: 650_000.0,
            price_drops: Vec::new(),
            days_on_market: dom,
            listing_views: None,
            showing_requests: None,
            offers_received: None,
            previous_listing_attempts: None,
        }
    }

    fn insights() -> serde_json::Value {
        json!({
            "primary_concerns": ["timing of next purchase"],
            "hot_buttons": ["closing certainty"],
            "emotional_assessment": "Tired of showings",
            "emotional_intensity": 40,
            "financial_stress": 70
        })
    }

    #[tokio::test]
    async fn test_stale_listing_without_drops() {
        let llm = Arc::new(ScriptedProvider::new(insights()));
        let analyzer = SellerPsychologyAnalyzer::new(llm);
        let profile = analyzer
            .analyze_seller_psychology("p1", &listing(130), None, None)
            .await
            .unwrap();

        assert!(profile.urgency_score >= 30.0);
        assert_ne!(profile.urgency_level, UrgencyLevel::Low);
        assert_eq!(profile.behavioral_pattern, BehavioralPattern::PriceHolder);
        assert_eq!(profile.hot_buttons, vec!["closing certainty".to_string()]);
    }

    #[tokio::test]
    async fn test_repeat_listing_is_critical() {
        let now = Utc::now();
        let mut l = listing(125);
        l.current_price = 620_000.0;
        l.previous_listing_attempts = Some(2);
        l.price_drops = vec![
            PriceDrop {
                date: now - Duration::days(90),
                previous_price: 650_000.0,
                new_price: 635_000.0,
            },
            PriceDrop {
                date: now - Duration::days(60),
                previous_price: 635_000.0,
                new_price: 620_000.0,
            },
        ];

        let analyzer = SellerPsychologyAnalyzer::new(Arc::new(ScriptedProvider::new(insights())));
        let profile = analyzer
            .analyze_seller_psychology("p2", &l, None, None)
            .await
            .unwrap();
        assert_eq!(profile.urgency_level, UrgencyLevel::Critical);
        assert_eq!(profile.motivation_type, MotivationType::Distressed);
    }

    #[tokio::test]
    async fn test_second_call_hits_cache() {
        let llm = Arc::new(ScriptedProvider::new(insights()));
        let analyzer = SellerPsychologyAnalyzer::new(llm.clone());
        let l = listing(70);

        let first = analyzer.analyze_seller_psychology("p3", &l, None, None).await.unwrap();
        let second = analyzer.analyze_seller_psychology("p3", &l, None, None).await.unwrap();

        assert_eq!(llm.calls(), 1);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_invalidate_forces_recompute() {
        let llm = Arc::new(ScriptedProvider::new(insights()));
        let analyzer = SellerPsychologyAnalyzer::new(llm.clone());
        let l = listing(70);

        analyzer.analyze_seller_psychology("p4", &l, None, None).await.unwrap();
        assert_eq!(analyzer.invalidate("p4"), 1);
        analyzer.analyze_seller_psychology("p4", &l, None, None).await.unwrap();
        assert_eq!(llm.calls(), 2);
    }

    #[tokio::test]
    async fn test_llm_failure_uses_defaults() {
        let llm = Arc::new(FailingProvider::new());
        let analyzer = SellerPsychologyAnalyzer::new(llm.clone());
        let profile = analyzer
            .analyze_seller_psychology("p5", &listing(20), None, None)
            .await
            .unwrap();

        assert_eq!(llm.calls(), 1);
        assert!(profile.primary_concerns.is_empty());
        assert_eq!(profile.communication.style, "unknown");
        for score in [
            profile.flexibility_score,
            profile.financial_pressure_score,
            profile.emotional_attachment_score,
        ] {
            assert!((0.0..=100.0).contains(&score));
        }
    }

    #[tokio::test]
    async fn test_rejects_missing_price() {
        let analyzer = SellerPsychologyAnalyzer::new(Arc::new(FailingProvider::new()));
        let mut l = listing(10);
        l.current_price = 0.0;
        let result = analyzer.analyze_seller_psychology("p6", &l, None, None).await;
        assert!(matches!(result, Err(NegotiationError::InvalidInput(_))));
    }

    #[test]
    fn test_prompt_mentions_drops_and_keywords() {
        let comm = CommunicationData {
            keywords: vec!["need to sell before school starts".into()],
            ..Default::default()
        };
        let prompt = build_prompt(&listing(40), Some(&comm), &MotivationScores::default(), 15.0);
        assert!(prompt.contains("days on market: 40"));
        assert!(prompt.contains("need to sell before school starts"));
        assert!(prompt.contains("financial_stress"));
    }
}
