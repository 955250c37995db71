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

#![warn(missing_docs)]

//! `fieldmap` resolves a logical index pattern (a name, a wildcard, or a
//! date-format template such as `logs-[YYYY.MM.DD]`) into the concrete set
//! of indices and aliases present in a search cluster, fetches their field
//! mappings, and caches the derived flat field list per pattern.
//!
//! The entry point is [`PatternResolver::get_fields`]: it serves from the
//! [`FieldCache`] when possible, hydrates the cache from a persisted
//! snapshot on cold start, and otherwise runs a live resolution (alias
//! expansion, date round-trip matching and lookback truncation for interval
//! patterns) before fetching and normalizing the field mappings. Concurrent
//! resolutions of the same pattern coalesce into a single cluster
//! round-trip.

mod cache;
mod cluster;
mod config;
mod error;
mod fields;
mod intervals;
mod mappings;
pub mod metrics;
mod pattern;
mod resolver;
mod template;

pub use cache::FieldCache;
pub use cluster::{
    AliasesResponse, ApiError, ClusterClient, ClusterClientBuilder, ClusterClientError,
    DocumentResponse, DocumentSource, IndexAliases, Timeout, DEFAULT_CLIENT_CONNECT_TIMEOUT,
    DEFAULT_CLIENT_TIMEOUT,
};
pub use config::ResolverConfig;
pub use error::{ResolveError, ResolveErrorKind, ResolveResult};
pub use fields::{Field, FieldType};
pub use intervals::{candidate_indices, CandidateIndex, Interval};
pub use mappings::{
    fields_from_mappings, FieldMappingEntry, FieldMappingLeaf, FieldMappingsResponse,
    IndexFieldMappings, IndexMode,
};
pub use pattern::IndexPattern;
pub use resolver::{PatternResolver, ResolvedIndices};
pub use template::DateTemplate;
