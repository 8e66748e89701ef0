use llm_client::prompts::with_persona;
use llm_client::{request_structured, LlmProvider, StrategicSummary};
use negotiation_core::{
    MarketLeverage, NegotiationStrategy, SellerPsychologyProfile, WinProbabilityAnalysis,
};

const MAX_ITEMS: usize = 5;

/// Executive summary, key insights and action items
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryParts {
    pub executive_summary: String,
    pub key_insights: Vec<String>,
    pub action_items: Vec<String>,
}

pub async fn strategic_summary(
    llm: &dyn LlmProvider,
    psychology: &SellerPsychologyProfile,
    leverage: &MarketLeverage,
    strategy: &NegotiationStrategy,
    win: &WinProbabilityAnalysis,
) -> SummaryParts {
    let task = format!(
        "Write an executive summary for this negotiation.\n\n\
SELLER: {} motivation, {} urgency ({:.0}/100), flexibility {:.0}/100\n\
MARKET: leverage {:.0}/100, {}, priced {}\n\
STRATEGY: {} tactic, recommended offer ${:.0}, confidence {:.0}/100\n\
WIN PROBABILITY: {:.1}%\n\n\
Return keys: executive_summary (2-3 sentences), key_insights (5 strings), action_items (5 strings).",
        psychology.motivation_type,
        psychology.urgency_level,
        psychology.urgency_score,
        psychology.flexibility_score,
        leverage.overall_leverage_score,
        leverage.market_condition,
        leverage.price_positioning,
        strategy.primary_tactic,
        strategy.recommended_offer_price,
        strategy.confidence_score,
        win.win_probability,
    );

    match request_structured::<StrategicSummary>(llm, &with_persona(&task)).await {
        Ok(summary) => merge_with_fallback(summary, psychology, leverage, strategy, win),
        Err(e) => {
            tracing::warn!("Strategic summary generation failed, using rule-based summary: {}", e);
            fallback_summary(psychology, leverage, strategy, win)
        }
    }
}

/// Fill whatever the model left out from the rule-based summary
fn merge_with_fallback(
    summary: StrategicSummary,
    psychology: &SellerPsychologyProfile,
    leverage: &MarketLeverage,
    strategy: &NegotiationStrategy,
    win: &WinProbabilityAnalysis,
) -> SummaryParts {
    let fallback = fallback_summary(psychology, leverage, strategy, win);

    let mut key_insights = if summary.key_insights.is_empty() {
        fallback.key_insights
    } else {
        summary.key_insights
    };
    let mut action_items = if summary.action_items.is_empty() {
        fallback.action_items
    } else {
        summary.action_items
    };
    key_insights.truncate(MAX_ITEMS);
    action_items.truncate(MAX_ITEMS);

    SummaryParts {
        executive_summary: summary
            .executive_summary
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(fallback.executive_summary),
        key_insights,
        action_items,
    }
}

pub fn fallback_summary(
    psychology: &SellerPsychologyProfile,
    leverage: &MarketLeverage,
    strategy: &NegotiationStrategy,
    win: &WinProbabilityAnalysis,
) -> SummaryParts {
    let executive_summary = format!(
        "Seller demonstrates {} motivation with {} urgency. Market leverage score of {:.0}/100 \
supports a {} strategy. Recommended offer has {:.1}% win probability.",
        psychology.motivation_type,
        psychology.urgency_level,
        leverage.overall_leverage_score,
        strategy.primary_tactic,
        win.win_probability
    );

    let key_insights = vec![
        format!(
            "Seller urgency level: {} ({:.0}/100)",
            psychology.urgency_level, psychology.urgency_score
        ),
        format!(
            "Market leverage: {:.0}/100 in a {} market",
            leverage.overall_leverage_score, leverage.market_condition
        ),
        format!("Optimal strategy: {}", strategy.primary_tactic),
        format!("Win probability: {:.1}%", win.win_probability),
        format!("Property pricing: {}", leverage.price_positioning),
    ];

    let action_items = vec![
        format!("Execute {} strategy", strategy.primary_tactic),
        format!("Offer ${:.0}", strategy.recommended_offer_price),
        "Monitor seller response".to_string(),
        "Prepare counter-strategy".to_string(),
        "Track market changes".to_string(),
    ];

    SummaryParts {
        executive_summary,
        key_insights,
        action_items,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::partner::fixtures::analyzed;
    use llm_client::testing::{FailingProvider, ScriptedProvider};
    use serde_json::json;

    #[tokio::test]
    async fn test_partial_model_output_is_filled_and_truncated() {
        let intel = analyzed("s1").await;
        let (psych, lev, strategy, win) = (
            &intel.seller_psychology,
            &intel.market_leverage,
            &intel.negotiation_strategy,
            &intel.win_probability,
        );
        let fallback = fallback_summary(psych, lev, strategy, win);

        let summary = StrategicSummary {
            executive_summary: Some("   ".into()),
            key_insights: (1..=7).map(|i| format!("insight {i}")).collect(),
            action_items: Vec::new(),
        };
        let merged = merge_with_fallback(summary, psych, lev, strategy, win);

        assert_eq!(merged.executive_summary, fallback.executive_summary);
        assert_eq!(merged.key_insights.len(), MAX_ITEMS);
        assert_eq!(merged.key_insights[4], "insight 5");
        assert_eq!(merged.action_items, fallback.action_items);
    }

    #[tokio::test]
    async fn test_model_summary_is_used_when_complete() {
        let intel = analyzed("s2").await;
        let llm = ScriptedProvider::new(json!({
            "executive_summary": "Motivated seller, strong position.",
            "key_insights": ["one", "two"],
            "action_items": ["call today"]
        }));
        let parts = strategic_summary(
            &llm,
            &intel.seller_psychology,
            &intel.market_leverage,
            &intel.negotiation_strategy,
            &intel.win_probability,
        )
        .await;
        assert_eq!(parts.executive_summary, "Motivated seller, strong position.");
        assert_eq!(parts.key_insights, vec!["one", "two"]);
        assert_eq!(parts.action_items, vec!["call today"]);
    }

    #[tokio::test]
    async fn test_failed_model_uses_rule_based_summary() {
        let intel = analyzed("s3").await;
        let llm = FailingProvider::new();
        let parts = strategic_summary(
            &llm,
            &intel.seller_psychology,
            &intel.market_leverage,
            &intel.negotiation_strategy,
            &intel.win_probability,
        )
        .await;
        assert_eq!(llm.calls(), 1);
        assert_eq!(parts.key_insights.len(), 5);
        assert_eq!(parts.action_items.len(), 5);
        assert!(parts.executive_summary.starts_with("Seller demonstrates"));
        assert!(parts.action_items[1].starts_with("Offer $"));
    }
}
