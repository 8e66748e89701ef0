//! Behavioral drift in a live conversation: the seller hedging, pulling
//! back, or going quiet.

use serde::{Deserialize, Serialize};

const HEDGING_PHRASES: &[&str] = &[
    "maybe",
    "not sure",
    "let me think",
    "we'll see",
    "possibly",
    "i guess",
    "might",
    "depends",
];

const WITHDRAWAL_PHRASES: &[&str] = &[
    "not interested",
    "other offers",
    "take it off the market",
    "pull the listing",
    "talk to my",
    "no rush",
    "wait until",
    "not ready",
];

const HEDGE_WEIGHT: f64 = 0.15;
const WITHDRAWAL_WEIGHT: f64 = 0.25;
const SLOW_REPLY_SECS: f64 = 2.0 * 3600.0;
const STALLED_REPLY_SECS: f64 = 6.0 * 3600.0;

pub const DRIFT_THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriftAnalysis {
    /// 0.0 (engaged) to 1.0 (gone)
    pub drift_score: f64,
    pub is_drifting: bool,
    pub hedging_signals: usize,
    pub withdrawal_signals: usize,
    pub response_latency_seconds: f64,
    pub recommendation: String,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DriftDetector;

impl DriftDetector {
    pub fn new() -> Self {
        Self
    }

    pub fn analyze_drift(&self, message: &str, response_latency_seconds: f64) -> DriftAnalysis {
        let text = message.to_lowercase().replace('\u{2019}', "'");
        let words = words(&text);
        let hedging = count_phrases(&words, HEDGING_PHRASES);
        let withdrawal = count_phrases(&words, WITHDRAWAL_PHRASES);
        let latency = response_latency_seconds.max(0.0);

        let latency_component = if latency >= STALLED_REPLY_SECS {
            0.3
        } else if latency >= SLOW_REPLY_SECS {
            0.1
        } else {
            0.0
        };

        let drift_score = (hedging as f64 * HEDGE_WEIGHT
            + withdrawal as f64 * WITHDRAWAL_WEIGHT
            + latency_component)
            .clamp(0.0, 1.0);
        let is_drifting = drift_score >= DRIFT_THRESHOLD;

        let recommendation = if !is_drifting {
            "Seller engagement is stable; stay on plan.".to_string()
        } else if withdrawal > 0 {
            "Seller is pulling back. Re-anchor on their stated goals and ask what would make this work for them.".to_string()
        } else if hedging > 0 {
            "Seller is hedging. Ease the pressure and surface the concern behind the hesitation.".to_string()
        } else {
            "Seller has gone quiet. Re-engage with a short, low-pressure check-in.".to_string()
        };

        DriftAnalysis {
            drift_score,
            is_drifting,
            hedging_signals: hedging,
            withdrawal_signals: withdrawal,
            response_latency_seconds: latency,
            recommendation,
        }
    }
}

/// Alphanumeric runs, keeping apostrophes so "we'll" stays one word
fn words(text: &str) -> Vec<&str> {
    text.split(|c: char| !c.is_alphanumeric() && c != '\'')
        .map(|w| w.trim_matches('\''))
        .filter(|w| !w.is_empty())
        .collect()
}

/// Occurrences of each phrase as a whole-word sequence
fn count_phrases(words: &[&str], phrases: &[&str]) -> usize {
    phrases
        .iter()
        .map(|phrase| {
            let needle: Vec<&str> = phrase.split(' ').collect();
            words.windows(needle.len()).filter(|w| *w == needle.as_slice()).count()
        })
        .sum()
}
