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

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// Error returned by the cluster client.
#[derive(Debug, Error)]
pub enum ClusterClientError {
    /// Error response returned by the cluster.
    #[error("API error: {0}")]
    Api(#[from] ApiError),
    /// Transport-level error reported by reqwest.
    #[error("client error: {0:?}")]
    Client(#[from] reqwest::Error),
    /// Error building a request URL.
    #[error("URL parsing error: {0}")]
    UrlParse(String),
}

impl ClusterClientError {
    /// The HTTP status code associated with the error, when one applies.
    pub fn status_code(&self) -> Option<StatusCode> {
        match self {
            Self::Api(error) => Some(error.code),
            Self::Client(error) => error.status(),
            Self::UrlParse(_) => Some(StatusCode::BAD_REQUEST),
        }
    }
}

/// An error response body returned by the cluster, together with its HTTP
/// status code.
#[derive(Debug, Error)]
pub struct ApiError {
    /// Error message extracted from the response body, if one could be.
    pub message: Option<String>,
    /// HTTP status code of the response.
    pub code: StatusCode,
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        if let Some(error) = &self.message {
            write!(f, "(code={}, message={})", self.code, error)
        } else {
            write!(f, "(code={})", self.code)
        }
    }
}

#[derive(Deserialize)]
pub(crate) struct ErrorResponsePayload {
    pub error: serde_json::Value,
}
