// Copyright (C) 2024 Quickwit, Inc.
//
// Quickwit is offered under the AGPL v3.0 and as commercial software.
// For commercial licensing, contact us at hello@quickwit.io.
//
// AGPL:
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as
// published by the Free Software Foundation, either version 3 of the
// License, or (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <http://www.gnu.org/licenses/>.

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, ClientBuilder, Method, StatusCode, Url};
use serde::Serialize;

use super::error::ClusterClientError;
use super::models::{AliasesResponse, ApiResponse, DocumentResponse, DocumentSource, Timeout};
use crate::mappings::FieldMappingsResponse;

/// Default connect timeout of the cluster client.
pub const DEFAULT_CLIENT_CONNECT_TIMEOUT: Timeout = Timeout::from_secs(5);
/// Default request timeout of the cluster client.
pub const DEFAULT_CLIENT_TIMEOUT: Timeout = Timeout::from_secs(10);

const DEFAULT_CONTENT_TYPE: &str = "application/json";

struct Transport {
    base_url: Url,
    client: Client,
}

impl Transport {
    fn new(endpoint: Url, connect_timeout: Timeout) -> Self {
        let mut client_builder = ClientBuilder::new();
        if let Some(duration) = connect_timeout.as_duration_opt() {
            client_builder = client_builder.connect_timeout(duration);
        }
        Self {
            base_url: endpoint,
            client: client_builder.build().expect("client should be built"),
        }
    }

    async fn send<Q: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        query_string: Option<&Q>,
        timeout: Timeout,
    ) -> Result<ApiResponse, ClusterClientError> {
        let url = self
            .base_url
            .join(path)
            .map_err(|error| ClusterClientError::UrlParse(error.to_string()))?;
        let mut request_builder = self.client.request(method, url);
        if let Some(duration) = timeout.as_duration_opt() {
            request_builder = request_builder.timeout(duration);
        }
        let mut request_headers = HeaderMap::new();
        request_headers.insert(CONTENT_TYPE, HeaderValue::from_static(DEFAULT_CONTENT_TYPE));
        request_builder = request_builder.headers(request_headers);
        if let Some(query) = query_string {
            request_builder = request_builder.query(query);
        }
        let response = request_builder.send().await?;
        Ok(ApiResponse::new(response))
    }
}

/// Builder for [`ClusterClient`].
pub struct ClusterClientBuilder {
    base_url: Url,
    connect_timeout: Timeout,
    timeout: Timeout,
}

impl ClusterClientBuilder {
    /// Starts a builder for the given cluster endpoint.
    pub fn new(endpoint: Url) -> Self {
        ClusterClientBuilder {
            base_url: endpoint,
            connect_timeout: DEFAULT_CLIENT_CONNECT_TIMEOUT,
            timeout: DEFAULT_CLIENT_TIMEOUT,
        }
    }

    /// Sets the connect timeout.
    pub fn connect_timeout(mut self, connect_timeout: Timeout) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }

    /// Sets the per-request timeout.
    pub fn timeout(mut self, timeout: Timeout) -> Self {
        self.timeout = timeout;
        self
    }

    /// Builds the client.
    pub fn build(self) -> ClusterClient {
        ClusterClient {
            transport: Transport::new(self.base_url, self.connect_timeout),
            timeout: self.timeout,
        }
    }
}

#[derive(Serialize)]
struct FieldMappingsQueryParams {
    ignore_unavailable: bool,
    allow_no_indices: bool,
    include_defaults: bool,
}

#[derive(Serialize)]
struct DocumentQueryParams<'a> {
    #[serde(rename = "_source_include")]
    source_include: &'a str,
}

/// HTTP client for the search cluster, exposing the three operations the
/// resolver consumes.
pub struct ClusterClient {
    transport: Transport,
    timeout: Timeout,
}

impl ClusterClient {
    /// Creates a client for the given endpoint with default timeouts.
    pub fn new(endpoint: Url) -> Self {
        ClusterClientBuilder::new(endpoint).build()
    }

    /// Lists the indices matching `index_expression` (a name, wildcard, or
    /// comma list) along with the aliases pointing at each of them.
    pub async fn list_aliases(
        &self,
        index_expression: &str,
    ) -> Result<AliasesResponse, ClusterClientError> {
        let path = format!("{index_expression}/_aliases");
        let response = self
            .transport
            .send::<()>(Method::GET, &path, None, self.timeout)
            .await?;
        response.deserialize().await
    }

    /// Fetches the field mappings of every field of the indices matching
    /// `index_expression`.
    ///
    /// `ignore_unavailable` tolerates individual listed indices having
    /// vanished; `allow_no_indices=false` makes the cluster fail loudly when
    /// the entire expression matches nothing.
    pub async fn field_mappings(
        &self,
        index_expression: &str,
        ignore_unavailable: bool,
        allow_no_indices: bool,
        include_defaults: bool,
    ) -> Result<FieldMappingsResponse, ClusterClientError> {
        let path = format!("{index_expression}/_mapping/field/*");
        let query_params = FieldMappingsQueryParams {
            ignore_unavailable,
            allow_no_indices,
            include_defaults,
        };
        let response = self
            .transport
            .send(Method::GET, &path, Some(&query_params), self.timeout)
            .await?;
        response.deserialize().await
    }

    /// Reads one persisted document, restricted to its `fields` source
    /// member. A missing document (HTTP 404 or `found=false`) reads as
    /// `None`, not as an error.
    pub async fn get_document(
        &self,
        store_index: &str,
        doc_type: &str,
        id: &str,
    ) -> Result<Option<DocumentSource>, ClusterClientError> {
        let path = format!("{store_index}/{doc_type}/{id}");
        let query_params = DocumentQueryParams {
            source_include: "fields",
        };
        let response = self
            .transport
            .send(Method::GET, &path, Some(&query_params), self.timeout)
            .await?;
        if response.status_code() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let document: DocumentResponse = response.deserialize().await?;
        if !document.found {
            return Ok(None);
        }
        Ok(document.source)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    async fn client_for(mock_server: &MockServer) -> ClusterClient {
        let endpoint = Url::parse(&mock_server.uri()).unwrap();
        ClusterClient::new(endpoint)
    }

    #[tokio::test]
    async fn test_list_aliases() {
        let mock_server = MockServer::start().await;
        let client = client_for(&mock_server).await;
        Mock::given(method("GET"))
            .and(path("/logs-*/_aliases"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "logs-2023.01.05": {"aliases": {"logs-current": {}}},
                "logs-2023.01.04": {"aliases": {}},
            })))
            .expect(1)
            .mount(&mock_server)
            .await;
        let aliases = client.list_aliases("logs-*").await.unwrap();
        assert_eq!(aliases.len(), 2);
        assert!(aliases["logs-2023.01.05"].aliases.contains_key("logs-current"));
        assert!(aliases["logs-2023.01.04"].aliases.is_empty());
    }

    #[tokio::test]
    async fn test_list_aliases_missing_index_reports_status_code() {
        let mock_server = MockServer::start().await;
        let client = client_for(&mock_server).await;
        Mock::given(method("GET"))
            .and(path("/none-*/_aliases"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "error": "IndexMissingException[[none-*] missing]",
                "status": 404,
            })))
            .mount(&mock_server)
            .await;
        let error = client.list_aliases("none-*").await.unwrap_err();
        assert_eq!(error.status_code(), Some(StatusCode::NOT_FOUND));
        assert!(error.to_string().contains("IndexMissingException"));
    }

    #[tokio::test]
    async fn test_field_mappings_sends_flags() {
        let mock_server = MockServer::start().await;
        let client = client_for(&mock_server).await;
        Mock::given(method("GET"))
            .and(path("/logs-2023.01.05/_mapping/field/*"))
            .and(query_param("ignore_unavailable", "true"))
            .and(query_param("allow_no_indices", "false"))
            .and(query_param("include_defaults", "true"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "logs-2023.01.05": {"mappings": {"logs": {}}},
            })))
            .expect(1)
            .mount(&mock_server)
            .await;
        let mappings = client
            .field_mappings("logs-2023.01.05", true, false, true)
            .await
            .unwrap();
        assert!(mappings.contains_key("logs-2023.01.05"));
    }

    #[tokio::test]
    async fn test_get_document() {
        let mock_server = MockServer::start().await;
        let client = client_for(&mock_server).await;
        Mock::given(method("GET"))
            .and(path("/.fieldmap/index-pattern/p1"))
            .and(query_param("_source_include", "fields"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "found": true,
                "_source": {"fields": "[{\"name\":\"a\",\"type\":\"string\"}]"},
            })))
            .mount(&mock_server)
            .await;
        let source = client
            .get_document(".fieldmap", "index-pattern", "p1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            source.fields.as_deref(),
            Some("[{\"name\":\"a\",\"type\":\"string\"}]")
        );
    }

    #[tokio::test]
    async fn test_get_document_absent_is_not_an_error() {
        let mock_server = MockServer::start().await;
        let client = client_for(&mock_server).await;
        Mock::given(method("GET"))
            .and(path("/.fieldmap/index-pattern/p404"))
            .respond_with(
                ResponseTemplate::new(404).set_body_json(json!({"found": false})),
            )
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/.fieldmap/index-pattern/p-not-found"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"found": false})),
            )
            .mount(&mock_server)
            .await;
        let source = client
            .get_document(".fieldmap", "index-pattern", "p404")
            .await
            .unwrap();
        assert!(source.is_none());
        let source = client
            .get_document(".fieldmap", "index-pattern", "p-not-found")
            .await
            .unwrap();
        assert!(source.is_none());
    }
}
