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

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

/// Resolution error kind.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ResolveErrorKind {
    /// The cluster has no index or alias matching the pattern. Recoverable:
    /// callers typically surface it as "no data for this pattern", not as a
    /// system failure.
    MissingIndices,
    /// Any other cluster failure: 5xx response, transport error, malformed
    /// payload. Fatal for the resolution attempt.
    Cluster,
}

impl ResolveErrorKind {
    /// The metric label of the error kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolveErrorKind::MissingIndices => "missing_indices",
            ResolveErrorKind::Cluster => "cluster",
        }
    }

    /// Creates a ResolveError.
    pub fn with_error(self, source: impl Into<anyhow::Error>) -> ResolveError {
        ResolveError {
            kind: self,
            source: Arc::new(source.into()),
        }
    }
}

/// Error returned by a pattern resolution.
///
/// Concurrent resolutions of the same pattern id are coalesced and every
/// caller receives the outcome, so the error must be cloneable: the source is
/// shared behind an `Arc`.
#[derive(Clone, Debug, Error)]
#[error("ResolveError(kind={kind:?}, source={source})")]
pub struct ResolveError {
    kind: ResolveErrorKind,
    #[source]
    source: Arc<anyhow::Error>,
}

/// Generic Result type for resolution operations.
pub type ResolveResult<T> = Result<T, ResolveError>;

impl ResolveError {
    /// Add some context to the wrapped error.
    pub fn add_context<C>(self, ctx: C) -> Self
    where C: fmt::Display + Send + Sync + 'static {
        ResolveError {
            kind: self.kind,
            source: Arc::new(anyhow::anyhow!("{ctx}").context(self.source)),
        }
    }

    /// Returns the corresponding `ResolveErrorKind` for this error.
    pub fn kind(&self) -> ResolveErrorKind {
        self.kind
    }
}
