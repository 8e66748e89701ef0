use async_trait::async_trait;
use negotiation_core::{
    BuyerProfile, LeadProfileSource, NegotiationError, PropertyData, PropertyDataSource,
};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

use crate::provider::{ComparableSale, CompetingListing, MarketConditions, MarketDataProvider};

#[derive(Debug, Deserialize)]
struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    results: Vec<T>,
}

/// REST client for the market data service at `MARKET_DATA_URL`. The same
/// service also serves property and lead records.
#[derive(Clone)]
pub struct HttpMarketDataClient {
    base_url: String,
    client: Client,
}

impl HttpMarketDataClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let timeout_secs: u64 = std::env::var("MARKET_DATA_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(10);

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Client for `MARKET_DATA_URL`, `None` when the variable is unset
    pub fn from_env() -> Option<Self> {
        std::env::var("MARKET_DATA_URL")
            .ok()
            .filter(|url| !url.trim().is_empty())
            .map(Self::new)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, NegotiationError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| NegotiationError::MarketData(e.to_string()))?;

        if !response.status().is_success() {
            return Err(NegotiationError::MarketData(format!(
                "HTTP {}: {}",
                response.status(),
                response.text().await.unwrap_or_default()
            )));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| NegotiationError::MarketData(e.to_string()))
    }

    /// Like `get_json`, but a 404 is `Ok(None)`
    async fn get_record<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, NegotiationError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| NegotiationError::MarketData(e.to_string()))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(NegotiationError::MarketData(format!(
                "HTTP {}: {}",
                response.status(),
                response.text().await.unwrap_or_default()
            )));
        }

        response
            .json::<T>()
            .await
            .map(Some)
            .map_err(|e| NegotiationError::MarketData(e.to_string()))
    }
}

#[async_trait]
impl MarketDataProvider for HttpMarketDataClient {
    async fn market_conditions(&self, zip_code: Option<&str>) -> Result<MarketConditions, NegotiationError> {
        let zip = zip_code
            .ok_or_else(|| NegotiationError::MarketData("property has no zip code".into()))?;
        self.get_json(&format!("/markets/{}/conditions", zip), &[]).await
    }

    async fn competing_listings(&self, property: &PropertyData) -> Result<Vec<CompetingListing>, NegotiationError> {
        let mut query = vec![("price", format!("{:.0}", property.list_price))];
        if let Some(zip) = &property.zip_code {
            query.push(("zip", zip.clone()));
        }
        let response: ListResponse<CompetingListing> = self
            .get_json(&format!("/properties/{}/competition", property.property_id), &query)
            .await?;
        Ok(response.results)
    }

    async fn comparable_sales(&self, property: &PropertyData) -> Result<Vec<ComparableSale>, NegotiationError> {
        let mut query = vec![("property_type", property.property_type.clone())];
        if let Some(beds) = property.bedrooms {
            query.push(("bedrooms", beds.to_string()));
        }
        let response: ListResponse<ComparableSale> = self
            .get_json(&format!("/properties/{}/comparables", property.property_id), &query)
            .await?;
        Ok(response.results)
    }

    fn provider_name(&self) -> &'static str {
        "http"
    }
}

#[async_trait]
impl PropertyDataSource for HttpMarketDataClient {
    async fn get_property_details(&self, property_id: &str) -> Result<Option<PropertyData>, NegotiationError> {
        self.get_record(&format!("/properties/{}", property_id)).await
    }
}

#[async_trait]
impl LeadProfileSource for HttpMarketDataClient {
    async fn get_lead_profile(&self, lead_id: &str) -> Result<Option<BuyerProfile>, NegotiationError> {
        self.get_record(&format!("/leads/{}", lead_id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_is_trimmed() {
        let client = HttpMarketDataClient::new("http://localhost:8090/");
        assert_eq!(client.base_url, "http://localhost:8090");
    }

    #[tokio::test]
    async fn test_missing_zip_is_an_error() {
        let client = HttpMarketDataClient::new("http://127.0.0.1:9");
        let result = client.market_conditions(None).await;
        assert!(matches!(result, Err(NegotiationError::MarketData(_))));
    }

    #[tokio::test]
    async fn test_unreachable_lead_service_is_an_error() {
        let client = HttpMarketDataClient::new("http://127.0.0.1:9");
        let result = client.get_lead_profile("lead-1").await;
        assert!(matches!(result, Err(NegotiationError::MarketData(_))));
    }

    #[test]
    fn test_list_response_defaults_to_empty() {
        let parsed: ListResponse<ComparableSale> = serde_json::from_str("{}").unwrap();
        assert!(parsed.results.is_empty());
    }
}
