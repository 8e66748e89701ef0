//! Tactic selection and the per-tactic playbook.

use negotiation_core::score::argmax;
use negotiation_core::{
    BuyerProfile, MarketLeverage, MotivationType, NegotiationTactic, SellerPsychologyProfile,
    UrgencyLevel,
};
use std::collections::BTreeMap;

use NegotiationTactic::*;

/// Per-tactic point totals, indexed in `NegotiationTactic::ALL` order
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TacticScores([f64; 5]);

impl TacticScores {
    fn add(&mut self, tactic: NegotiationTactic, points: f64) {
        self.0[index_of(tactic)] += points;
    }

    pub fn get(&self, tactic: NegotiationTactic) -> f64 {
        self.0[index_of(tactic)]
    }

    /// Winner and runner-up; ties go to the earlier tactic
    pub fn ranked(&self) -> (NegotiationTactic, NegotiationTactic) {
        let primary_idx = argmax(&self.0).unwrap_or(0);
        let mut rest = self.0;
        rest[primary_idx] = f64::NEG_INFINITY;
        let secondary_idx = argmax(&rest).unwrap_or(0);
        (NegotiationTactic::ALL[primary_idx], NegotiationTactic::ALL[secondary_idx])
    }

    pub fn to_map(&self) -> BTreeMap<String, f64> {
        NegotiationTactic::ALL
            .iter()
            .map(|t| (t.as_str().to_string(), self.get(*t)))
            .collect()
    }
}

fn index_of(tactic: NegotiationTactic) -> usize {
    NegotiationTactic::ALL
        .iter()
        .position(|t| *t == tactic)
        .unwrap_or(0)
}

pub fn score_tactics(
    psychology: &SellerPsychologyProfile,
    leverage: &MarketLeverage,
    buyer: &BuyerProfile,
) -> TacticScores {
    let mut scores = TacticScores::default();

    match psychology.motivation_type {
        MotivationType::Financial => {
            scores.add(TimeSensitive, 20.0);
            scores.add(Aggressive, 10.0);
        }
        MotivationType::Distressed => {
            scores.add(Aggressive, 25.0);
            scores.add(TimeSensitive, 20.0);
        }
        MotivationType::Emotional => {
            scores.add(RelationshipBuilding, 25.0);
            scores.add(Collaborative, 15.0);
        }
        MotivationType::Strategic => {
            scores.add(ValueFocused, 25.0);
            scores.add(Collaborative, 10.0);
        }
    }

    match psychology.urgency_level {
        UrgencyLevel::Critical => {
            scores.add(TimeSensitive, 25.0);
            scores.add(Aggressive, 15.0);
        }
        UrgencyLevel::High => {
            scores.add(TimeSensitive, 15.0);
            scores.add(Aggressive, 10.0);
        }
        UrgencyLevel::Moderate => {
            scores.add(Collaborative, 10.0);
            scores.add(ValueFocused, 5.0);
        }
        UrgencyLevel::Low => {
            scores.add(ValueFocused, 15.0);
            scores.add(RelationshipBuilding, 10.0);
        }
    }

    if buyer.relationship_importance > 0.7 {
        scores.add(RelationshipBuilding, 20.0);
        scores.add(Collaborative, 15.0);
    }

    let lev = leverage.overall_leverage_score;
    if lev > 70.0 {
        scores.add(Aggressive, 20.0);
    } else if lev >= 40.0 {
        scores.add(Collaborative, 10.0);
        scores.add(ValueFocused, 10.0);
    } else {
        scores.add(RelationshipBuilding, 10.0);
        scores.add(Collaborative, 15.0);
    }

    if leverage.competitive_pressure > 60.0 {
        scores.add(Collaborative, 10.0);
        scores.add(RelationshipBuilding, 10.0);
        scores.add(Aggressive, -10.0);
    } else if leverage.competitive_pressure < 30.0 {
        scores.add(Aggressive, 10.0);
    }

    if buyer.cash_offer {
        scores.add(TimeSensitive, 15.0);
        scores.add(Aggressive, 5.0);
    }
    if buyer.flexible_timeline {
        scores.add(Collaborative, 10.0);
    }
    if buyer.first_time_buyer {
        scores.add(ValueFocused, 10.0);
        scores.add(RelationshipBuilding, 5.0);
    }
    if buyer.quick_close_days.is_some() {
        scores.add(TimeSensitive, 10.0);
    }

    if psychology.emotional_attachment_score > 70.0 {
        scores.add(RelationshipBuilding, 15.0);
    }

    scores
}

/// Fixed playbook entries for a tactic
pub struct TacticPlaybook {
    pub terms: &'static [&'static str],
    pub concessions: &'static [&'static str],
    pub opening_script: &'static str,
    pub talking_points: &'static [&'static str],
}

pub fn playbook(tactic: NegotiationTactic) -> TacticPlaybook {
    match tactic {
        Collaborative => TacticPlaybook {
            terms: &["Mutually convenient closing date", "Shared inspection findings", "Clear communication cadence"],
            concessions: &["Flexible move-out date", "Split minor repair costs"],
            opening_script: "We love the home and want to find terms that work for both of us. Here's where we're starting, and we're open to hearing what matters most to you.",
            talking_points: &[
                "We want this to work for both sides",
                "Our offer reflects what comparable homes have sold for",
                "We can be flexible on timing if it helps you",
            ],
        },
        Aggressive => TacticPlaybook {
            terms: &["Short inspection window", "Price reflects time on market", "Offer expires in 24 hours"],
            concessions: &["Waive minor cosmetic repairs"],
            opening_script: "The market data supports this number. The home has been sitting, and this is a clean offer that gets you to the closing table.",
            talking_points: &[
                "The listing has been on the market longer than comparable homes",
                "Comparable sales support our number",
                "This offer has a firm deadline",
            ],
        },
        TimeSensitive => TacticPlaybook {
            terms: &["Fast close", "Minimal contingencies", "Proof of funds with the offer"],
            concessions: &["Rent-back period for the seller", "Close on the seller's timeline"],
            opening_script: "We can close quickly and with certainty. If speed matters to you, this offer takes the waiting out of the equation.",
            talking_points: &[
                "We can close on your schedule",
                "Every month on market carries holding costs",
                "Certainty of closing is worth something",
            ],
        },
        ValueFocused => TacticPlaybook {
            terms: &["Price anchored to comparable sales", "Appraisal contingency", "Repair credits over price cuts"],
            concessions: &["Accept the home as-is on cosmetic items", "Flexible on included fixtures"],
            opening_script: "We did our homework on recent sales. Our number is grounded in what the market has actually paid for similar homes.",
            talking_points: &[
                "Here's what similar homes actually sold for",
                "Price per square foot is above the neighborhood median",
                "We're pricing in the repairs the home needs",
            ],
        },
        RelationshipBuilding => TacticPlaybook {
            terms: &["Respect for the home's history", "Seller-friendly move-out", "Personal letter with the offer"],
            concessions: &["Extended move-out window", "Keep sentimental fixtures with the seller"],
            opening_script: "We can tell this home has been loved. We'd be proud to be its next owners, and we want the process to be easy on you.",
            talking_points: &[
                "We'll take care of the home you built memories in",
                "We want the transition to be easy on your family",
                "We're committed buyers, not investors flipping the home",
            ],
        },
    }
}

/// Objection handling used when the model has nothing to add
pub fn default_objections(tactic: NegotiationTactic) -> BTreeMap<String, String> {
    let price = match tactic {
        Aggressive | ValueFocused => "Recent comparable sales support our number; we're happy to walk through them together.",
        TimeSensitive => "Our number comes with a fast, certain close, which has real value compared to another month on market.",
        Collaborative | RelationshipBuilding => "We hear you. Let's look at which terms matter most to you and see if we can bridge the gap there.",
    };
    BTreeMap::from([
        ("price_too_low".to_string(), price.to_string()),
        (
            "other_offers".to_string(),
            "We respect that. Our offer stands on its certainty and terms; we'd ask for a chance to respond.".to_string(),
        ),
        (
            "not_in_a_hurry".to_string(),
            "Understood. We can match your timeline, and our offer stays strong either way.".to_string(),
        ),
    ])
}
