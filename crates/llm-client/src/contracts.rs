//! Typed shapes of the JSON objects the engines ask the model for.
//!
//! Every field defaults, so a partial reply still deserializes and the
//! missing parts fall back to neutral values.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

fn neutral() -> f64 {
    50.0
}

/// Qualitative read of the seller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PsychologyInsights {
    pub primary_concerns: Vec<String>,
    pub hot_buttons: Vec<String>,
    pub emotional_assessment: String,
    /// 0-100
    #[serde(default = "neutral")]
    pub emotional_intensity: f64,
    /// 0-100
    #[serde(default = "neutral")]
    pub financial_stress: f64,
}

impl Default for PsychologyInsights {
    fn default() -> Self {
        Self {
            primary_concerns: Vec::new(),
            hot_buttons: Vec::new(),
            emotional_assessment: "No qualitative assessment available".to_string(),
            emotional_intensity: neutral(),
            financial_stress: neutral(),
        }
    }
}

/// Talking points and objection handling for a chosen tactic
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyTalkingPoints {
    pub talking_points: Vec<String>,
    pub objection_responses: BTreeMap<String, String>,
    pub primary_script: Option<String>,
}

/// Executive summary of a finished analysis
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategicSummary {
    pub executive_summary: Option<String>,
    pub key_insights: Vec<String>,
    pub action_items: Vec<String>,
}

/// Coaching read of a live conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversationInsights {
    pub seller_emotional_state: String,
    pub strategy_effectiveness: String,
    pub adjustment_recommendations: Vec<String>,
    pub risk_factors: Vec<String>,
}

impl Default for ConversationInsights {
    fn default() -> Self {
        Self {
            seller_emotional_state: "neutral".to_string(),
            strategy_effectiveness: "moderate".to_string(),
            adjustment_recommendations: Vec::new(),
            risk_factors: Vec::new(),
        }
    }
}

/// Counter-offer draft
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CounterOfferDraft {
    pub counter_price: Option<f64>,
    pub counter_rationale: Option<String>,
    pub talking_points: Vec<String>,
    pub risk_assessment: Option<String>,
    pub confidence_score: Option<f64>,
    pub recommended_concessions: Vec<String>,
    pub walk_away_price: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_object_gives_neutral_insights() {
        let insights: PsychologyInsights = serde_json::from_value(json!({})).unwrap();
        assert_eq!(insights.emotional_intensity, 50.0);
        assert_eq!(insights.financial_stress, 50.0);
        assert!(insights.primary_concerns.is_empty());
    }

    #[test]
    fn test_integer_scores_deserialize() {
        let draft: CounterOfferDraft =
            serde_json::from_value(json!({"counter_price": 712500, "confidence_score": 72})).unwrap();
        assert_eq!(draft.counter_price, Some(712_500.0));
        assert_eq!(draft.confidence_score, Some(72.0));
    }

    #[test]
    fn test_conversation_defaults() {
        let insights: ConversationInsights =
            serde_json::from_value(json!({"risk_factors": ["seller mentioned other offers"]})).unwrap();
        assert_eq!(insights.strategy_effectiveness, "moderate");
        assert_eq!(insights.risk_factors.len(), 1);
    }
}
