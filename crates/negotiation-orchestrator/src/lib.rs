//! Negotiation orchestration: runs the psychology, leverage, strategy and
//! win-probability engines as one pipeline and tracks active negotiations.

pub mod coaching;
pub mod counter_offer;
pub mod drift;
pub mod metrics;
pub mod models;
pub mod partner;
pub mod summary;

pub use drift::{DriftAnalysis, DriftDetector, DRIFT_THRESHOLD};
pub use metrics::PerformanceMetrics;
pub use models::*;
pub use partner::{AINegotiationPartner, ANALYSIS_VERSION, UPDATED_ANALYSIS_VERSION};
pub use summary::{fallback_summary, SummaryParts};

pub use market_leverage::{
    ComparableSale, HttpMarketDataClient, MarketDataProvider, UnavailableMarketData,
};
