//! Rule-based coaching layered on top of the stored intelligence.

use llm_client::ConversationInsights;
use negotiation_core::{NegotiationIntelligence, UrgencyLevel};
use std::collections::BTreeMap;

use crate::drift::DriftAnalysis;

pub const MAX_NEXT_STEPS: usize = 5;

pub fn immediate_guidance(
    intelligence: &NegotiationIntelligence,
    buyer_feedback: Option<&str>,
    seller_response: Option<&str>,
    drift: &DriftAnalysis,
) -> String {
    let tactic = intelligence.negotiation_strategy.primary_tactic;
    let psychology = &intelligence.seller_psychology;

    let mut guidance = if seller_response
        .map(|r| r.to_lowercase().contains("counter"))
        .unwrap_or(false)
    {
        format!(
            "Seller countered. Evaluate it against the {} strategy and answer to their {} motivation.",
            tactic, psychology.motivation_type
        )
    } else if buyer_feedback
        .map(|f| f.to_lowercase().contains("concerned"))
        .unwrap_or(false)
    {
        format!(
            "Buyer concerns detected. Reassure them using the {} approach; the offer carries a {:.1}% win probability.",
            tactic, intelligence.win_probability.win_probability
        )
    } else {
        format!(
            "Continue the {} strategy. Seller {} urgency supports the current approach.",
            tactic, psychology.urgency_level
        )
    };

    if drift.is_drifting {
        guidance.push(' ');
        guidance.push_str(&drift.recommendation);
    }
    guidance
}

pub fn tactical_adjustments(
    insights: &ConversationInsights,
    intelligence: &NegotiationIntelligence,
    current_situation: &str,
) -> Vec<String> {
    let mut adjustments = Vec::new();

    if insights.strategy_effectiveness.eq_ignore_ascii_case("low") {
        adjustments.push("Consider shifting tactical approach".to_string());
    }
    if intelligence.seller_psychology.urgency_level >= UrgencyLevel::High
        && !current_situation.to_lowercase().contains("timeline")
    {
        adjustments.push("Emphasize timeline advantages".to_string());
    }
    if intelligence.market_leverage.overall_leverage_score > 80.0 {
        adjustments.push("Leverage strong market position more assertively".to_string());
    }
    adjustments.extend(insights.adjustment_recommendations.iter().take(2).cloned());

    adjustments
}

pub fn next_steps(adjustments: &[String], intelligence: &NegotiationIntelligence) -> Vec<String> {
    let mut steps = vec![format!(
        "Execute {} approach",
        intelligence.negotiation_strategy.primary_tactic
    )];
    steps.extend(adjustments.iter().take(2).cloned());
    steps.push("Monitor seller response patterns".to_string());
    steps.push("Prepare for potential counter-offer".to_string());
    steps.truncate(MAX_NEXT_STEPS);
    steps
}

pub fn conversation_suggestions(intelligence: &NegotiationIntelligence) -> BTreeMap<String, String> {
    let strategy = &intelligence.negotiation_strategy;
    BTreeMap::from([
        (
            "opening".to_string(),
            format!("Lead with {} emphasis: {}", strategy.primary_tactic, strategy.primary_script),
        ),
        (
            "objection_handling".to_string(),
            format!(
                "Address concerns using {} motivation insights",
                intelligence.seller_psychology.motivation_type
            ),
        ),
        (
            "closing".to_string(),
            format!(
                "Reinforce the {:.1}% win probability advantages",
                intelligence.win_probability.win_probability
            ),
        ),
    ])
}

pub fn risk_alerts(
    insights: &ConversationInsights,
    intelligence: &NegotiationIntelligence,
    seller_response: Option<&str>,
    drift: &DriftAnalysis,
) -> Vec<String> {
    let mut alerts = Vec::new();

    if intelligence.win_probability.win_probability < 30.0 {
        alerts.push("Low win probability - consider strategy adjustment".to_string());
    }
    if let Some(response) = seller_response.map(str::to_lowercase) {
        if response.contains("not interested") {
            alerts.push("Seller rejection signal - immediate strategy review needed".to_string());
        } else if response.contains("other offers") {
            alerts.push("Competitive pressure increased - expedite decision timeline".to_string());
        }
    }
    if drift.is_drifting {
        alerts.push(format!("Behavioral drift detected (score {:.2})", drift.drift_score));
    }
    alerts.extend(insights.risk_factors.iter().take(3).cloned());

    alerts
}
