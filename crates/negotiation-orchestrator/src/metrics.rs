use chrono::{DateTime, Utc};
use negotiation_core::NegotiationIntelligence;
use std::collections::{BTreeMap, VecDeque};

use crate::models::PerformanceSnapshot;

/// Oldest predictions are dropped past this many
const MAX_PREDICTION_HISTORY: usize = 1000;

#[derive(Debug, Clone)]
pub struct PredictionRecord {
    pub property_id: String,
    pub predicted_probability: f64,
    pub strategy: String,
    pub timestamp: DateTime<Utc>,
}

/// Running counters over completed analyses. Strategy averages cover the
/// retained prediction window only.
#[derive(Debug, Default)]
pub struct PerformanceMetrics {
    total_analyses: u64,
    avg_processing_time_ms: f64,
    predictions: VecDeque<PredictionRecord>,
}

impl PerformanceMetrics {
    pub fn record(&mut self, processing_time_ms: u64, intelligence: &NegotiationIntelligence) {
        self.record_timing(processing_time_ms);
        self.push_prediction(PredictionRecord {
            property_id: intelligence.property_id.clone(),
            predicted_probability: intelligence.win_probability.win_probability,
            strategy: intelligence.negotiation_strategy.primary_tactic.as_str().to_string(),
            timestamp: intelligence.analysis_timestamp,
        });
    }

    fn record_timing(&mut self, processing_time_ms: u64) {
        self.total_analyses += 1;
        let n = self.total_analyses as f64;
        self.avg_processing_time_ms =
            (self.avg_processing_time_ms * (n - 1.0) + processing_time_ms as f64) / n;
    }

    fn push_prediction(&mut self, record: PredictionRecord) {
        self.predictions.push_back(record);
        while self.predictions.len() > MAX_PREDICTION_HISTORY {
            self.predictions.pop_front();
        }
    }

    /// Mean predicted win probability per primary tactic
    pub fn strategy_averages(&self) -> BTreeMap<String, f64> {
        let mut tallies: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
        for prediction in &self.predictions {
            let tally = tallies.entry(prediction.strategy.as_str()).or_default();
            tally.0 += prediction.predicted_probability;
            tally.1 += 1;
        }
        tallies
            .into_iter()
            .map(|(strategy, (total, count))| (strategy.to_string(), total / count as f64))
            .collect()
    }

    pub fn snapshot(&self, active_negotiations: usize) -> PerformanceSnapshot {
        PerformanceSnapshot {
            total_analyses: self.total_analyses,
            avg_processing_time_ms: (self.avg_processing_time_ms * 10.0).round() / 10.0,
            active_negotiations,
            strategy_averages: self.strategy_averages(),
            prediction_history_count: self.predictions.len(),
        }
    }
}
