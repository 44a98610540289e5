//! OpenSearch client implementation.
//!
//! This module provides the concrete implementation of `SearchEngineClient`
//! using the OpenSearch Rust client.

use std::time::Duration;

use async_trait::async_trait;
use opensearch::{
    cluster::ClusterHealthParts,
    http::request::JsonBody,
    http::transport::{SingleNodeConnectionPool, TransportBuilder},
    indices::{
        IndicesCreateParts, IndicesDeleteParts, IndicesExistsParts, IndicesGetAliasParts,
        IndicesPutMappingParts,
    },
    BulkParts, OpenSearch,
};
use serde_json::{json, Value};
use tracing::{debug, error, info};
use url::Url;

use crate::errors::SearchError;
use crate::interfaces::{BulkItemFailure, BulkReport, SearchEngineClient};
use reindexer_shared::PersonDocument;

/// OpenSearch client implementation.
///
/// Provides the administrative and bulk-write operations the reindex
/// pipeline needs, using OpenSearch as the backend.
///
/// # Example
///
/// ```ignore
/// let client = OpenSearchClient::new("http://localhost:9200")?;
/// client.create_index("people_v0", &default_index_settings()).await?;
/// ```
pub struct OpenSearchClient {
    client: OpenSearch,
}

impl OpenSearchClient {
    /// Create a new OpenSearch client connected to the specified URL.
    ///
    /// # Arguments
    ///
    /// * `url` - The OpenSearch server URL (e.g., "http://localhost:9200")
    ///
    /// # Returns
    ///
    /// * `Ok(OpenSearchClient)` - A new client instance
    /// * `Err(SearchError)` - If connection setup fails
    pub fn new(url: &str) -> Result<Self, SearchError> {
        let parsed_url = Url::parse(url).map_err(|e| SearchError::connection(e.to_string()))?;

        let conn_pool = SingleNodeConnectionPool::new(parsed_url);
        let transport = TransportBuilder::new(conn_pool)
            .disable_proxy()
            .build()
            .map_err(|e| SearchError::connection(e.to_string()))?;

        let client = OpenSearch::new(transport);

        info!(url = %url, "Created OpenSearch client");

        Ok(Self { client })
    }

    /// Parse the per-item section of a bulk response into a report.
    ///
    /// The response enumerates one item per document, in request order; a
    /// rejected document carries an `error` object under its action key.
    fn parse_bulk_response(total: usize, body: &Value) -> Result<BulkReport, SearchError> {
        let has_errors = body["errors"].as_bool().unwrap_or(false);
        if !has_errors {
            return Ok(BulkReport::success(total));
        }

        let items = body["items"]
            .as_array()
            .ok_or_else(|| SearchError::parse("bulk response missing items array"))?;

        let mut failures = Vec::new();
        for item in items {
            let action = &item["index"];
            if action["error"].is_object() {
                let id = action["_id"].as_str().unwrap_or("<missing id>").to_string();
                let reason = action["error"]["reason"]
                    .as_str()
                    .or_else(|| action["error"]["type"].as_str())
                    .unwrap_or("unknown rejection")
                    .to_string();
                failures.push(BulkItemFailure { id, reason });
            }
        }

        if failures.is_empty() {
            return Err(SearchError::parse(
                "bulk response flagged errors but enumerated none",
            ));
        }

        Ok(BulkReport { total, failures })
    }
}

#[async_trait]
impl SearchEngineClient for OpenSearchClient {
    async fn index_exists(&self, index: &str) -> Result<bool, SearchError> {
        let response = self
            .client
            .indices()
            .exists(IndicesExistsParts::Index(&[index]))
            .send()
            .await
            .map_err(|e| SearchError::connection(e.to_string()))?;

        Ok(response.status_code().is_success())
    }

    async fn create_index(&self, index: &str, settings: &Value) -> Result<(), SearchError> {
        let response = self
            .client
            .indices()
            .create(IndicesCreateParts::Index(index))
            .body(settings)
            .send()
            .await
            .map_err(|e| SearchError::connection(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            if error_body.contains("resource_already_exists_exception") {
                return Err(SearchError::index_already_exists(index));
            }
            error!(status = %status, body = %error_body, "Create index request failed");
            return Err(SearchError::admin(format!(
                "Create index {} failed with status {}: {}",
                index, status, error_body
            )));
        }

        info!(index = %index, "Created index");
        Ok(())
    }

    async fn delete_index(&self, index: &str) -> Result<(), SearchError> {
        let response = self
            .client
            .indices()
            .delete(IndicesDeleteParts::Index(&[index]))
            .send()
            .await
            .map_err(|e| SearchError::connection(e.to_string()))?;

        let status = response.status_code();
        if status.as_u16() == 404 {
            return Err(SearchError::index_not_found(index));
        }
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %error_body, "Delete index request failed");
            return Err(SearchError::admin(format!(
                "Delete index {} failed with status {}: {}",
                index, status, error_body
            )));
        }

        info!(index = %index, "Deleted index");
        Ok(())
    }

    async fn put_mapping(&self, index: &str, mapping: &Value) -> Result<(), SearchError> {
        let response = self
            .client
            .indices()
            .put_mapping(IndicesPutMappingParts::Index(&[index]))
            .body(mapping)
            .send()
            .await
            .map_err(|e| SearchError::connection(e.to_string()))?;

        let status = response.status_code();
        if status.as_u16() == 404 {
            return Err(SearchError::index_not_found(index));
        }
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %error_body, "Put mapping request failed");
            return Err(SearchError::invalid_mapping(index, error_body));
        }

        debug!(index = %index, "Applied mapping");
        Ok(())
    }

    async fn indices_for_alias(&self, alias: &str) -> Result<Vec<String>, SearchError> {
        let response = self
            .client
            .indices()
            .get_alias(IndicesGetAliasParts::Name(&[alias]))
            .send()
            .await
            .map_err(|e| SearchError::connection(e.to_string()))?;

        let status = response.status_code();
        // An absent alias resolves to no indices.
        if status.as_u16() == 404 {
            return Ok(Vec::new());
        }
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(SearchError::admin(format!(
                "Get alias {} failed with status {}: {}",
                alias, status, error_body
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| SearchError::parse(e.to_string()))?;

        let indices = body
            .as_object()
            .map(|map| map.keys().cloned().collect())
            .unwrap_or_default();

        Ok(indices)
    }

    async fn swap_alias(&self, alias: &str, index: &str) -> Result<(), SearchError> {
        // Build remove+add actions for one `_aliases` call; the engine
        // applies the whole action list atomically, so a reader resolving
        // the alias never observes it absent.
        let bound = self.indices_for_alias(alias).await?;

        let mut actions: Vec<Value> = bound
            .iter()
            .filter(|existing| existing.as_str() != index)
            .map(|existing| json!({ "remove": { "index": existing, "alias": alias } }))
            .collect();
        actions.push(json!({ "add": { "index": index, "alias": alias } }));

        let response = self
            .client
            .indices()
            .update_aliases()
            .body(json!({ "actions": actions }))
            .send()
            .await
            .map_err(|e| SearchError::connection(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %error_body, "Alias update request failed");
            return Err(SearchError::admin(format!(
                "Swap alias {} -> {} failed with status {}: {}",
                alias, index, status, error_body
            )));
        }

        info!(alias = %alias, index = %index, "Alias now points at index");
        Ok(())
    }

    async fn bulk_write(
        &self,
        index: &str,
        documents: &[PersonDocument],
        timeout: Duration,
    ) -> Result<BulkReport, SearchError> {
        let mut body: Vec<JsonBody<Value>> = Vec::with_capacity(documents.len() * 2);
        for doc in documents {
            body.push(json!({ "index": { "_id": doc.id } }).into());
            let source = serde_json::to_value(doc)
                .map_err(|e| SearchError::SerializationError(e.to_string()))?;
            body.push(source.into());
        }

        let timeout_param = format!("{}ms", timeout.as_millis());
        let request = self
            .client
            .bulk(BulkParts::Index(index))
            .timeout(&timeout_param)
            .body(body)
            .send();

        // Bound the whole call, not just the engine-side processing: a hung
        // transport must surface as a transient timeout too.
        let response = tokio::time::timeout(timeout, request)
            .await
            .map_err(|_| SearchError::timeout(timeout_param.clone()))?
            .map_err(|e| {
                if e.is_timeout() {
                    SearchError::timeout(timeout_param.clone())
                } else {
                    SearchError::connection(e.to_string())
                }
            })?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %error_body, "Bulk request failed");
            return Err(SearchError::admin(format!(
                "Bulk write to {} failed with status {}: {}",
                index, status, error_body
            )));
        }

        let response_body: Value = response
            .json()
            .await
            .map_err(|e| SearchError::parse(e.to_string()))?;

        let report = Self::parse_bulk_response(documents.len(), &response_body)?;
        debug!(
            index = %index,
            total = report.total,
            failed = report.failures.len(),
            "Bulk request completed"
        );
        Ok(report)
    }

    async fn health_check(&self) -> Result<bool, SearchError> {
        let response = self
            .client
            .cluster()
            .health(ClusterHealthParts::None)
            .send()
            .await
            .map_err(|e| SearchError::connection(e.to_string()))?;

        if !response.status_code().is_success() {
            return Ok(false);
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| SearchError::parse(e.to_string()))?;

        Ok(body["status"].as_str() != Some("red"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bulk_response_success() {
        let body = json!({
            "took": 3,
            "errors": false,
            "items": [
                { "index": { "_id": "1", "status": 201 } },
                { "index": { "_id": "2", "status": 201 } }
            ]
        });

        let report = OpenSearchClient::parse_bulk_response(2, &body).unwrap();
        assert!(report.is_success());
        assert_eq!(report.total, 2);
    }

    #[test]
    fn test_parse_bulk_response_with_rejection() {
        let body = json!({
            "took": 5,
            "errors": true,
            "items": [
                { "index": { "_id": "1", "status": 201 } },
                { "index": {
                    "_id": "2",
                    "status": 400,
                    "error": {
                        "type": "mapper_parsing_exception",
                        "reason": "failed to parse field [indexed_at]"
                    }
                } }
            ]
        });

        let report = OpenSearchClient::parse_bulk_response(2, &body).unwrap();
        assert!(!report.is_success());
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].id, "2");
        assert!(report.failures[0].reason.contains("indexed_at"));
    }

    #[test]
    fn test_parse_bulk_response_errors_without_items() {
        let body = json!({ "errors": true });

        let result = OpenSearchClient::parse_bulk_response(1, &body);
        assert!(matches!(result, Err(SearchError::ParseError(_))));
    }
}
