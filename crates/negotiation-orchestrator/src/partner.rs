use chrono::{Duration, Utc};
use dashmap::DashMap;
use llm_client::prompts::with_persona;
use llm_client::{request_structured, ConversationInsights, LlmProvider};
use market_leverage::{MarketDataProvider, MarketLeverageCalculator};
use negotiation_core::{
    BuyerProfile, CommunicationData, LeadProfileSource, ListingHistory, MarketContext,
    MarketLeverage, NegotiationError, NegotiationIntelligence, NegotiationResult, PropertyData,
    PropertyDataSource, SellerPsychologyProfile,
};
use negotiation_strategy::NegotiationStrategyEngine;
use seller_psychology::SellerPsychologyAnalyzer;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;
use win_probability::WinProbabilityPredictor;

use crate::coaching;
use crate::counter_offer;
use crate::drift::DriftDetector;
use crate::metrics::PerformanceMetrics;
use crate::models::*;
use crate::summary::strategic_summary;

pub const ANALYSIS_VERSION: &str = "1.0";
pub const UPDATED_ANALYSIS_VERSION: &str = "1.1";

/// Webhook events that close out a negotiation
const CLOSING_EVENTS: [&str; 2] = ["offer_accepted", "negotiation_closed"];

/// Identity of the negotiation being assembled
struct AnalysisTarget<'a> {
    property_id: &'a str,
    lead_id: &'a str,
    tenant_id: Option<String>,
}

/// Coordinates the four engines and keeps the active negotiations in memory
pub struct AINegotiationPartner {
    llm: Arc<dyn LlmProvider>,
    psychology_analyzer: SellerPsychologyAnalyzer,
    leverage_calculator: MarketLeverageCalculator,
    strategy_engine: NegotiationStrategyEngine,
    win_predictor: WinProbabilityPredictor,
    drift_detector: DriftDetector,
    property_source: Option<Arc<dyn PropertyDataSource>>,
    lead_source: Option<Arc<dyn LeadProfileSource>>,
    /// Keyed by property id
    active_negotiations: DashMap<String, ActiveNegotiation>,
    metrics: Mutex<PerformanceMetrics>,
}

impl AINegotiationPartner {
    pub fn new(llm: Arc<dyn LlmProvider>, market_data: Arc<dyn MarketDataProvider>) -> Self {
        Self {
            psychology_analyzer: SellerPsychologyAnalyzer::new(llm.clone()),
            leverage_calculator: MarketLeverageCalculator::new(market_data),
            strategy_engine: NegotiationStrategyEngine::new(llm.clone()),
            win_predictor: WinProbabilityPredictor::new(),
            drift_detector: DriftDetector::new(),
            llm,
            property_source: None,
            lead_source: None,
            active_negotiations: DashMap::new(),
            metrics: Mutex::new(PerformanceMetrics::default()),
        }
    }

    /// Look up properties not supplied inline with the request
    pub fn with_property_source(mut self, source: Arc<dyn PropertyDataSource>) -> Self {
        self.property_source = Some(source);
        self
    }

    /// Look up buyer profiles not supplied inline with the request
    pub fn with_lead_source(mut self, source: Arc<dyn LeadProfileSource>) -> Self {
        self.lead_source = Some(source);
        self
    }

    /// Full pipeline: psychology and leverage in parallel, then strategy,
    /// win probability and the summary. The result becomes the active
    /// negotiation for the property.
    pub async fn analyze_negotiation_intelligence(
        &self,
        request: NegotiationAnalysisRequest,
    ) -> NegotiationResult<NegotiationIntelligence> {
        let started = Instant::now();
        tracing::info!(
            "Starting negotiation intelligence analysis for property {}",
            request.property_id
        );

        match self.run_analysis(&request, started).await {
            Ok(intelligence) => Ok(intelligence),
            Err(e) => {
                tracing::error!(
                    "Negotiation analysis for {} failed after {}ms: {}",
                    request.property_id,
                    started.elapsed().as_millis(),
                    e
                );
                Err(e)
            }
        }
    }

    async fn run_analysis(
        &self,
        request: &NegotiationAnalysisRequest,
        started: Instant,
    ) -> NegotiationResult<NegotiationIntelligence> {
        let (property, buyer) = self.gather_analysis_data(request).await;
        let listing = ListingHistory::from_property(&property);
        let communication = request.communication_data.clone();
        let market_context = request.market_context.clone();

        let (psychology, leverage) = tokio::join!(
            self.psychology_analyzer.analyze_seller_psychology(
                &request.property_id,
                &listing,
                communication.as_ref(),
                market_context.as_ref(),
            ),
            self.leverage_calculator.calculate_market_leverage(
                &request.property_id,
                &property,
                &buyer,
                &listing,
            ),
        );
        let psychology = psychology.map_err(|e| {
            tracing::error!("Psychology analysis failed: {}", e);
            e
        })?;
        let leverage = leverage.map_err(|e| {
            tracing::error!("Market leverage analysis failed: {}", e);
            e
        })?;

        let target = AnalysisTarget {
            property_id: &request.property_id,
            lead_id: &request.lead_id,
            tenant_id: request.tenant_id.clone(),
        };
        let intelligence = self
            .assemble(target, psychology, leverage, &property, &buyer, ANALYSIS_VERSION, started)
            .await?;

        let now = Utc::now();
        self.active_negotiations.insert(
            request.property_id.clone(),
            ActiveNegotiation {
                intelligence: intelligence.clone(),
                property,
                buyer,
                listing,
                communication,
                market_context,
                created_at: now,
                updated_at: now,
            },
        );
        self.lock_metrics()
            .record(intelligence.processing_time_ms, &intelligence);

        tracing::info!(
            "Negotiation intelligence complete in {}ms. Strategy: {}, win probability: {:.1}%",
            intelligence.processing_time_ms,
            intelligence.negotiation_strategy.primary_tactic,
            intelligence.win_probability.win_probability
        );
        Ok(intelligence)
    }

    /// Strategy, win probability and summary on top of finished
    /// psychology and leverage analyses
    #[allow(clippy::too_many_arguments)]
    async fn assemble(
        &self,
        target: AnalysisTarget<'_>,
        psychology: SellerPsychologyProfile,
        leverage: MarketLeverage,
        property: &PropertyData,
        buyer: &BuyerProfile,
        version: &str,
        started: Instant,
    ) -> NegotiationResult<NegotiationIntelligence> {
        let strategy = self
            .strategy_engine
            .generate_negotiation_strategy(target.property_id, &psychology, &leverage, property, buyer)
            .await?;
        let win_probability = self
            .win_predictor
            .predict_win_probability(target.property_id, &psychology, &leverage, &strategy, property, buyer)
            .await?;
        let summary =
            strategic_summary(self.llm.as_ref(), &psychology, &leverage, &strategy, &win_probability).await;

        Ok(NegotiationIntelligence {
            property_id: target.property_id.to_string(),
            lead_id: target.lead_id.to_string(),
            tenant_id: target.tenant_id,
            analysis_timestamp: Utc::now(),
            seller_psychology: psychology,
            market_leverage: leverage,
            negotiation_strategy: strategy,
            win_probability,
            executive_summary: summary.executive_summary,
            key_insights: summary.key_insights,
            action_items: summary.action_items,
            processing_time_ms: started.elapsed().as_millis() as u64,
            analysis_version: version.to_string(),
        })
    }

    /// Property and buyer for a request: inline payload first, then the
    /// configured sources, then built-in defaults.
    async fn gather_analysis_data(&self, request: &NegotiationAnalysisRequest) -> (PropertyData, BuyerProfile) {
        let mut property = match &request.property_data {
            Some(property) => property.clone(),
            None => self.lookup_property(&request.property_id).await,
        };
        property.property_id = request.property_id.clone();

        let mut buyer = match &request.buyer_profile {
            Some(buyer) => buyer.clone(),
            None => self.lookup_buyer(&request.lead_id).await,
        };
        buyer.lead_id = request.lead_id.clone();
        if let Some(preferences) = &request.buyer_preferences {
            preferences.apply(&mut buyer);
        }

        (property, buyer)
    }

    async fn lookup_property(&self, property_id: &str) -> PropertyData {
        if let Some(source) = &self.property_source {
            match source.get_property_details(property_id).await {
                Ok(Some(property)) if property.list_price > 0.0 => return property,
                Ok(_) => tracing::warn!("No usable property record for {}, using defaults", property_id),
                Err(e) => tracing::warn!("Error fetching property {}, using defaults: {}", property_id, e),
            }
        }
        default_property(property_id)
    }

    async fn lookup_buyer(&self, lead_id: &str) -> BuyerProfile {
        if let Some(source) = &self.lead_source {
            match source.get_lead_profile(lead_id).await {
                Ok(Some(buyer)) => return buyer,
                Ok(None) => tracing::warn!("No lead profile for {}, using defaults", lead_id),
                Err(e) => tracing::warn!("Error fetching lead {}, using defaults: {}", lead_id, e),
            }
        }
        default_buyer(lead_id)
    }

    /// Situational guidance for a live conversation. Reads the stored
    /// intelligence and never modifies it.
    pub async fn provide_realtime_coaching(
        &self,
        request: RealTimeCoachingRequest,
    ) -> NegotiationResult<RealTimeCoachingResponse> {
        tracing::info!("Providing real-time coaching for negotiation {}", request.negotiation_id);

        let intelligence = self
            .active_negotiations
            .get(&request.negotiation_id)
            .map(|record| record.intelligence.clone())
            .ok_or_else(|| {
                NegotiationError::NotFound(format!("Active negotiation not found: {}", request.negotiation_id))
            })?;

        let drift = self.drift_detector.analyze_drift(
            &request.conversation_context,
            request.response_latency_seconds.unwrap_or(0.0),
        );
        let insights = self.conversation_insights(&request, &intelligence).await;

        let seller_response = request.seller_response.as_deref();
        let tactical_adjustments =
            coaching::tactical_adjustments(&insights, &intelligence, &request.current_situation);
        let response = RealTimeCoachingResponse {
            negotiation_id: request.negotiation_id.clone(),
            immediate_guidance: coaching::immediate_guidance(
                &intelligence,
                request.buyer_feedback.as_deref(),
                seller_response,
                &drift,
            ),
            next_steps: coaching::next_steps(&tactical_adjustments, &intelligence),
            tactical_adjustments,
            conversation_suggestions: coaching::conversation_suggestions(&intelligence),
            risk_alerts: coaching::risk_alerts(&insights, &intelligence, seller_response, &drift),
            seller_emotional_state: insights.seller_emotional_state,
            strategy_effectiveness: insights.strategy_effectiveness,
            drift_analysis: drift,
        };

        tracing::info!(
            "Real-time coaching provided with {} risk alerts. Drift: {:.2}",
            response.risk_alerts.len(),
            response.drift_analysis.drift_score
        );
        Ok(response)
    }

    async fn conversation_insights(
        &self,
        request: &RealTimeCoachingRequest,
        intelligence: &NegotiationIntelligence,
    ) -> ConversationInsights {
        let task = format!(
            "Analyze this live negotiation conversation for coaching.\n\n\
CONVERSATION:\n{}\n\
CURRENT SITUATION: {}\n\
ORIGINAL STRATEGY: {}\n\
SELLER: {} motivation, {} urgency\n\n\
Return keys: seller_emotional_state (string), strategy_effectiveness (low|moderate|high), \
adjustment_recommendations (list), risk_factors (list).",
            request.conversation_context,
            request.current_situation,
            intelligence.negotiation_strategy.primary_tactic,
            intelligence.seller_psychology.motivation_type,
            intelligence.seller_psychology.urgency_level,
        );

        match request_structured::<ConversationInsights>(self.llm.as_ref(), &with_persona(&task)).await {
            Ok(insights) => insights,
            Err(e) => {
                tracing::warn!("Conversation analysis failed: {}", e);
                ConversationInsights::default()
            }
        }
    }

    /// Re-run only the engines implicated by `new_information`, then
    /// regenerate strategy and win probability. Replacement listing,
    /// communication or market context data counts as a psychology trigger.
    pub async fn update_negotiation_strategy(
        &self,
        request: StrategyUpdateRequest,
    ) -> NegotiationResult<NegotiationIntelligence> {
        let started = Instant::now();
        let id = request.negotiation_id.as_str();
        tracing::info!("Updating negotiation strategy for {}", id);

        let record = self
            .active_negotiations
            .get(id)
            .map(|r| r.clone())
            .ok_or_else(|| NegotiationError::NotFound(format!("Active negotiation not found: {}", id)))?;

        let new_listing = request.typed::<ListingHistory>("listing_history");
        let new_communication = request.typed::<CommunicationData>("communication_data");
        let new_market_context = request.typed::<MarketContext>("market_context");
        let rerun_psychology = request.touches_psychology()
            || new_listing.is_some()
            || new_communication.is_some()
            || new_market_context.is_some();
        let rerun_leverage = request.touches_market() || new_listing.is_some();

        let listing = new_listing.unwrap_or_else(|| record.listing.clone());
        let communication = new_communication.or_else(|| record.communication.clone());
        let market_context = new_market_context.or_else(|| record.market_context.clone());

        let current = &record.intelligence;
        let psychology = if rerun_psychology {
            self.psychology_analyzer.invalidate(id);
            self.psychology_analyzer
                .analyze_seller_psychology(id, &listing, communication.as_ref(), market_context.as_ref())
                .await?
        } else {
            current.seller_psychology.clone()
        };
        let leverage = if rerun_leverage {
            self.leverage_calculator.invalidate(id);
            self.leverage_calculator
                .calculate_market_leverage(id, &record.property, &record.buyer, &listing)
                .await?
        } else {
            current.market_leverage.clone()
        };
        self.strategy_engine.invalidate(id);

        let target = AnalysisTarget {
            property_id: id,
            lead_id: &current.lead_id,
            tenant_id: current.tenant_id.clone(),
        };
        let updated = self
            .assemble(
                target,
                psychology,
                leverage,
                &record.property,
                &record.buyer,
                UPDATED_ANALYSIS_VERSION,
                started,
            )
            .await?;

        match self.active_negotiations.get_mut(id) {
            Some(mut entry) => {
                entry.intelligence = updated.clone();
                entry.listing = listing;
                entry.communication = communication;
                entry.market_context = market_context;
                entry.updated_at = Utc::now();
            }
            None => tracing::warn!("Negotiation {} ended during update; result not stored", id),
        }

        tracing::info!(
            "Strategy updated for {}. New win probability: {:.1}%",
            id,
            updated.win_probability.win_probability
        );
        Ok(updated)
    }

    pub fn get_active_negotiation(&self, property_id: &str) -> Option<NegotiationIntelligence> {
        self.active_negotiations
            .get(property_id)
            .map(|record| record.intelligence.clone())
    }

    /// Property ids of every active negotiation, sorted
    pub fn list_active_negotiations(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .active_negotiations
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        ids.sort();
        ids
    }

    /// Remove a negotiation and return its last intelligence
    pub fn end_negotiation(&self, property_id: &str) -> NegotiationResult<NegotiationIntelligence> {
        let (_, record) = self
            .active_negotiations
            .remove(property_id)
            .ok_or_else(|| NegotiationError::NotFound(format!("Active negotiation not found: {}", property_id)))?;
        self.invalidate_caches(property_id);
        tracing::info!("Ended negotiation {}", property_id);
        Ok(record.intelligence)
    }

    pub fn handle_webhook(&self, event: WebhookEvent) -> WebhookOutcome {
        let closes = CLOSING_EVENTS.contains(&event.event_type.as_str());
        let removed = closes && self.end_negotiation(&event.property_id).is_ok();
        tracing::info!(
            "Webhook {} for {} (removed: {})",
            event.event_type,
            event.property_id,
            removed
        );
        WebhookOutcome {
            event_type: event.event_type,
            property_id: event.property_id,
            acknowledged: true,
            removed,
        }
    }

    pub async fn generate_counter_offer(&self, request: &CounterOfferRequest) -> NegotiationResult<CounterOffer> {
        counter_offer::generate_counter_offer(self.llm.as_ref(), &request.offer, &request.market_comps).await
    }

    pub fn scenario_analysis(&self, property_id: &str) -> NegotiationResult<ScenarioAnalysis> {
        let record = self
            .active_negotiations
            .get(property_id)
            .ok_or_else(|| NegotiationError::NotFound(format!("Active negotiation not found: {}", property_id)))?;
        let intelligence = &record.intelligence;
        Ok(ScenarioAnalysis {
            property_id: property_id.to_string(),
            win_probability: intelligence.win_probability.win_probability,
            recommended_offer_price: intelligence.negotiation_strategy.recommended_offer_price,
            offer_range: (
                intelligence.negotiation_strategy.offer_range_low,
                intelligence.negotiation_strategy.offer_range_high,
            ),
            scenarios: intelligence.win_probability.scenarios.clone(),
        })
    }

    pub fn get_performance_metrics(&self) -> PerformanceSnapshot {
        self.lock_metrics().snapshot(self.active_negotiations.len())
    }

    /// Drop negotiations with no activity in the last `hours_threshold`
    /// hours, plus any expired engine cache entries. Returns how many
    /// negotiations were removed.
    pub fn cleanup_inactive_negotiations(&self, hours_threshold: i64) -> usize {
        let cutoff = Utc::now() - Duration::hours(hours_threshold);
        let stale: Vec<String> = self
            .active_negotiations
            .iter()
            .filter(|entry| entry.updated_at < cutoff)
            .map(|entry| entry.key().clone())
            .collect();

        for id in &stale {
            self.active_negotiations.remove(id);
            self.invalidate_caches(id);
        }
        self.psychology_analyzer.purge_expired();
        self.leverage_calculator.purge_expired();
        self.strategy_engine.purge_expired();

        tracing::info!("Cleaned up {} inactive negotiations", stale.len());
        stale.len()
    }

    fn invalidate_caches(&self, property_id: &str) {
        self.psychology_analyzer.invalidate(property_id);
        self.leverage_calculator.invalidate(property_id);
        self.strategy_engine.invalidate(property_id);
    }

    fn lock_metrics(&self) -> MutexGuard<'_, PerformanceMetrics> {
        self.metrics.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn default_property(property_id: &str) -> PropertyData {
    PropertyData {
        property_id: property_id.to_string(),
        list_price: 750_000.0,
        original_price: None,
        sqft: Some(2500.0),
        bedrooms: Some(4),
        bathrooms: Some(3.0),
        property_type: "single_family".to_string(),
        zip_code: Some("91730".to_string()),
        days_on_market: 45,
        year_built: Some(2010),
        uniqueness_score: None,
        listing_history: None,
    }
}

fn default_buyer(lead_id: &str) -> BuyerProfile {
    BuyerProfile {
        pre_approved: true,
        flexible_timeline: true,
        ..BuyerProfile::new(lead_id)
    }
}
