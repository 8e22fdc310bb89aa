//! Hosted search backend speaking the Algolia REST API

use super::client::HttpClient;
use super::types::{Hit, QuerySuggestion, SearchParams, SearchResponse};
use super::SearchBackend;
use crate::config::BackendSettings;
use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::debug;

/// Search backend querying `{base_url}/1/indexes/{index}/query`
#[derive(Clone)]
pub struct AlgoliaBackend {
    client: HttpClient,
    base_url: String,
}

impl AlgoliaBackend {
    pub fn new(client: HttpClient, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Build a backend from settings
    pub fn with_settings(settings: &BackendSettings) -> Result<Self> {
        Ok(Self::new(
            HttpClient::with_settings(settings)?,
            settings.base_url(),
        ))
    }

    fn query_url(&self, index: &str) -> String {
        format!(
            "{}/1/indexes/{}/query",
            self.base_url,
            urlencoding::encode(index)
        )
    }

    async fn query<T: DeserializeOwned>(
        &self,
        index: &str,
        query: &str,
        params: &SearchParams,
    ) -> Result<SearchResponse<T>> {
        params.validate()?;

        let body = serde_json::json!({ "params": params.to_query_string(query)? });
        let url = self.query_url(index);
        debug!("Querying {} for '{}'", index, query);

        let response = self.client.post_json(&url, &body).await?;
        if !response.is_success() {
            return Err(Error::Backend {
                index: index.to_string(),
                status: response.status,
                message: response.message(),
            });
        }

        response.json()
    }
}

#[async_trait]
impl SearchBackend for AlgoliaBackend {
    fn name(&self) -> &str {
        "algolia"
    }

    async fn fetch_suggestions(
        &self,
        index: &str,
        query: &str,
        params: &SearchParams,
    ) -> Result<Vec<QuerySuggestion>> {
        let response: SearchResponse<QuerySuggestion> = self.query(index, query, params).await?;
        Ok(response.hits)
    }

    async fn fetch_results(
        &self,
        index: &str,
        query: &str,
        params: &SearchParams,
    ) -> Result<SearchResponse<Hit>> {
        self.query(index, query, params).await
    }
}
