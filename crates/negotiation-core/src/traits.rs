use async_trait::async_trait;
use crate::{BuyerProfile, NegotiationError, PropertyData};

/// Source of property records (listing feed, property-DNA service, cache)
#[async_trait]
pub trait PropertyDataSource: Send + Sync {
    async fn get_property_details(&self, property_id: &str) -> Result<Option<PropertyData>, NegotiationError>;
}

/// Source of buyer/lead profiles (lead intelligence service)
#[async_trait]
pub trait LeadProfileSource: Send + Sync {
    async fn get_lead_profile(&self, lead_id: &str) -> Result<Option<BuyerProfile>, NegotiationError>;
}
