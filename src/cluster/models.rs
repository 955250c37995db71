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

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::error::{ApiError, ClusterClientError, ErrorResponsePayload};

/// Timeout applied to a single cluster request.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Timeout {
    /// No timeout: the request hangs until the cluster responds.
    None,
    /// Timeout after the given duration.
    Duration(Duration),
}

impl Timeout {
    /// A timeout of `secs` seconds.
    pub const fn from_secs(secs: u64) -> Self {
        Timeout::Duration(Duration::from_secs(secs))
    }

    /// A timeout of `mins` minutes.
    pub const fn from_mins(mins: u64) -> Self {
        Timeout::Duration(Duration::from_secs(mins * 60))
    }

    /// The timeout as an optional duration.
    pub fn as_duration_opt(&self) -> Option<Duration> {
        match self {
            Timeout::None => None,
            Timeout::Duration(duration) => Some(*duration),
        }
    }
}

/// Response envelope checking the HTTP status before handing out the typed
/// payload.
pub(crate) struct ApiResponse {
    inner: reqwest::Response,
}

impl ApiResponse {
    pub fn new(inner: reqwest::Response) -> Self {
        Self { inner }
    }

    /// The HTTP status code of the response.
    pub fn status_code(&self) -> StatusCode {
        self.inner.status()
    }

    async fn api_error(self) -> ClusterClientError {
        let code = self.inner.status();
        if let Ok(error_payload) = self.inner.json::<ErrorResponsePayload>().await {
            let message = match error_payload.error {
                serde_json::Value::String(message) => message,
                other => other.to_string(),
            };
            ClusterClientError::from(ApiError {
                message: Some(message),
                code,
            })
        } else {
            ClusterClientError::from(ApiError {
                message: None,
                code,
            })
        }
    }

    /// Deserializes the body into `T`, or turns an error status into an
    /// [`ApiError`].
    pub async fn deserialize<T: DeserializeOwned>(self) -> Result<T, ClusterClientError> {
        if self.inner.status().is_client_error() || self.inner.status().is_server_error() {
            Err(self.api_error().await)
        } else {
            let object = self.inner.json::<T>().await?;
            Ok(object)
        }
    }
}

/// Alias-listing response: per-index alias sets, in lexical index order.
pub type AliasesResponse = BTreeMap<String, IndexAliases>;

/// The aliases pointing at one index. The alias metadata (filters, routing)
/// is irrelevant to resolution and left opaque.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct IndexAliases {
    /// Alias name to opaque alias metadata.
    #[serde(default)]
    pub aliases: HashMap<String, serde_json::Value>,
}

/// A document-get response from the metadata store index.
#[derive(Clone, Debug, Deserialize)]
pub struct DocumentResponse {
    /// Whether the document exists.
    pub found: bool,
    /// The requested source fields, present when found.
    #[serde(rename = "_source", default)]
    pub source: Option<DocumentSource>,
}

/// The `_source` of a persisted index-pattern document, restricted to the
/// `fields` member.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct DocumentSource {
    /// The persisted field list, serialized as a JSON string.
    #[serde(default)]
    pub fields: Option<String>,
}
