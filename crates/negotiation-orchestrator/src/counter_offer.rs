use llm_client::prompts::{bullets, with_persona};
use llm_client::{request_structured, CounterOfferDraft, LlmProvider};
use market_leverage::ComparableSale;
use negotiation_core::{NegotiationError, NegotiationResult};

use crate::models::{CounterOffer, OfferDetails};

const COUNTER_RATIO: f64 = 0.97;
const WALK_AWAY_RATIO: f64 = 0.90;
const MAX_COMPS_IN_PROMPT: usize = 5;

/// Draft a counter to an incoming offer. Missing fields in the model's draft
/// default to 97% / 90% of list; a failed call returns the standard counter.
pub async fn generate_counter_offer(
    llm: &dyn LlmProvider,
    offer: &OfferDetails,
    comps: &[ComparableSale],
) -> NegotiationResult<CounterOffer> {
    let reference = offer.reference_price();
    if reference <= 0.0 {
        return Err(NegotiationError::InvalidInput(
            "offer needs a positive price or list price".into(),
        ));
    }

    let prompt = build_prompt(offer, comps);
    let counter = match request_structured::<CounterOfferDraft>(llm, &prompt).await {
        Ok(draft) => CounterOffer {
            counter_price: draft.counter_price.unwrap_or((reference * COUNTER_RATIO).round()),
            counter_rationale: draft
                .counter_rationale
                .unwrap_or_else(|| "Based on market analysis".to_string()),
            talking_points: draft.talking_points,
            risk_assessment: draft.risk_assessment.unwrap_or_else(|| "medium".to_string()),
            confidence_score: draft.confidence_score.unwrap_or(65.0).clamp(0.0, 100.0),
            recommended_concessions: draft.recommended_concessions,
            walk_away_price: draft.walk_away_price.unwrap_or((reference * WALK_AWAY_RATIO).round()),
        },
        Err(e) => {
            tracing::error!("Counter-offer generation failed: {}", e);
            standard_counter(reference)
        }
    };

    tracing::info!(
        "Generated counter-offer: ${:.0} (confidence: {:.0}%)",
        counter.counter_price,
        counter.confidence_score
    );
    Ok(counter)
}

fn standard_counter(reference: f64) -> CounterOffer {
    CounterOffer {
        counter_price: (reference * COUNTER_RATIO).round(),
        counter_rationale: "Standard 3% below list based on market norms".to_string(),
        talking_points: vec!["Recent comps support this price range".to_string()],
        risk_assessment: "medium".to_string(),
        confidence_score: 40.0,
        recommended_concessions: Vec::new(),
        walk_away_price: (reference * WALK_AWAY_RATIO).round(),
    }
}

fn build_prompt(offer: &OfferDetails, comps: &[ComparableSale]) -> String {
    let comp_lines: Vec<String> = comps
        .iter()
        .take(MAX_COMPS_IN_PROMPT)
        .map(|c| {
            format!(
                "{}: ${:.0}, {} sqft",
                c.address.as_deref().unwrap_or("N/A"),
                c.sale_price,
                c.sqft.map(|s| format!("{:.0}", s)).unwrap_or_else(|| "?".to_string())
            )
        })
        .collect();

    let task = format!(
        "Analyze this offer and draft a counter-offer. Think step by step: offer-to-list ratio, \
what the comps say, leverage in terms and timeline, then the counter price.\n\n\
CURRENT OFFER:\n- price: ${:.0}\n- list price: ${:.0}\n- terms: {}\n- contingencies: {}\n- cash: {}\n- close: {} days\n\
COMPARABLE SALES:\n{}\n\n\
Return keys: counter_price (number), counter_rationale (string), talking_points (list), \
risk_assessment (low|medium|high), confidence_score (0-100), recommended_concessions (list), \
walk_away_price (number).",
        offer.price,
        offer.reference_price(),
        offer.terms.as_deref().unwrap_or("Standard"),
        offer.contingencies.as_deref().unwrap_or("Inspection, Financing"),
        offer.cash_offer,
        offer.close_days.unwrap_or(30),
        bullets(&comp_lines),
    );
    with_persona(&task)
}

#[cfg(test)]
mod tests {
    use super::*;
    use llm_client::testing::{FailingProvider, ScriptedProvider};
    use serde_json::json;

    fn offer() -> OfferDetails {
        OfferDetails {
            price: 680_000.0,
            list_price: Some(720_000.0),
            terms: None,
            contingencies: None,
            cash_offer: false,
            close_days: Some(45),
        }
    }

    #[tokio::test]
    async fn test_failure_returns_standard_counter() {
        let counter = generate_counter_offer(&FailingProvider::new(), &offer(), &[]).await.unwrap();
        assert_eq!(counter.counter_price, 698_400.0);
        assert_eq!(counter.walk_away_price, 648_000.0);
        assert_eq!(counter.confidence_score, 40.0);
        assert_eq!(counter.risk_assessment, "medium");
    }

    #[tokio::test]
    async fn test_partial_draft_gets_defaults() {
        let llm = ScriptedProvider::new(json!({"counter_price": 705000, "risk_assessment": "low"}));
        let counter = generate_counter_offer(&llm, &offer(), &[]).await.unwrap();
        assert_eq!(counter.counter_price, 705_000.0);
        assert_eq!(counter.risk_assessment, "low");
        assert_eq!(counter.confidence_score, 65.0);
        assert_eq!(counter.walk_away_price, 648_000.0);
        assert_eq!(counter.counter_rationale, "Based on market analysis");
    }

    #[tokio::test]
    async fn test_prompt_lists_comps() {
        let llm = ScriptedProvider::new(json!({}));
        let comps = vec![ComparableSale {
            address: Some("12 Elm Ct".into()),
            sale_price: 701_000.0,
            sqft: Some(2400.0),
            sold_date: None,
            distance_miles: None,
        }];
        generate_counter_offer(&llm, &offer(), &comps).await.unwrap();
        let prompt = &llm.prompts()[0];
        assert!(prompt.contains("12 Elm Ct: $701000, 2400 sqft"));
        assert!(prompt.contains("close: 45 days"));
    }

    #[tokio::test]
    async fn test_rejects_zero_price() {
        let mut bad = offer();
        bad.price = 0.0;
        bad.list_price = None;
        let result = generate_counter_offer(&FailingProvider::new(), &bad, &[]).await;
        assert!(matches!(result, Err(NegotiationError::InvalidInput(_))));
    }
}
