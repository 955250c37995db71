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

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use itertools::Itertools;
use time::{Duration, OffsetDateTime};
use tracing::{debug, warn};

use crate::cache::FieldCache;
use crate::cluster::{AliasesResponse, ClusterClient, ClusterClientError};
use crate::config::ResolverConfig;
use crate::error::{ResolveError, ResolveErrorKind, ResolveResult};
use crate::fields::Field;
use crate::intervals::candidate_indices;
use crate::mappings::fields_from_mappings;
use crate::metrics::FIELDMAP_METRICS;
use crate::pattern::IndexPattern;
use crate::template::DateTemplate;

/// Document type of persisted pattern snapshots in the metadata store index.
const SNAPSHOT_DOC_TYPE: &str = "index-pattern";

/// Trailing window over which candidate names are generated for a
/// non-interval dated pattern.
const NON_INTERVAL_WINDOW_DAYS: i64 = 30;

type SharedResolution = Shared<BoxFuture<'static, ResolveResult<Vec<Field>>>>;

/// The indices an interval pattern's wildcard form expands to.
///
/// `all` is the full deduplicated set of index and alias names; `matches` is
/// the subset whose names round-trip through the pattern's date template, in
/// chronological order.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ResolvedIndices {
    /// Every index and alias name matching the wildcard form.
    pub all: Vec<String>,
    /// The round-trip-matching subset, chronologically ordered.
    pub matches: Vec<String>,
}

/// Resolves index patterns against the cluster and caches the derived field
/// lists.
///
/// Concurrent resolutions of the same pattern id on a cache miss coalesce
/// into a single in-flight cluster round-trip; every coalesced caller
/// receives the outcome. A shared resolution runs to completion even if
/// every caller abandons it, so the cache is populated for whoever arrives
/// next.
pub struct PatternResolver {
    client: Arc<ClusterClient>,
    cache: Arc<FieldCache>,
    config: ResolverConfig,
    inflight: Arc<Mutex<HashMap<String, SharedResolution>>>,
}

impl PatternResolver {
    /// Creates a resolver with its own (empty) field cache.
    pub fn new(client: ClusterClient, config: ResolverConfig) -> Self {
        PatternResolver {
            client: Arc::new(client),
            cache: Arc::new(FieldCache::new()),
            config,
            inflight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// The resolver's field cache.
    pub fn cache(&self) -> &FieldCache {
        &self.cache
    }

    /// Returns the field list of the pattern, from the cache when possible.
    ///
    /// On a cache miss, the cache is first seeded from the pattern's
    /// persisted snapshot (unless `skip_snapshot_hydration` is set), and a
    /// live resolution runs otherwise: alias expansion, date matching and
    /// lookback truncation for interval patterns, a trailing
    /// 30-day candidate window for the others, then a field-mapping fetch.
    /// A failed resolution leaves the cache untouched.
    ///
    /// Concurrent calls for the same pattern id coalesce onto the first
    /// caller's in-flight resolution, `skip_snapshot_hydration` flag
    /// included: a later caller passing a different flag receives the
    /// outcome of the resolution already under way.
    pub async fn get_fields(
        &self,
        pattern: &IndexPattern,
        skip_snapshot_hydration: bool,
    ) -> ResolveResult<Vec<Field>> {
        if let Some(fields) = self.cache.get(pattern.id()) {
            return Ok(fields);
        }
        let resolution = {
            let mut inflight = self.inflight.lock().unwrap();
            if let Some(resolution) = inflight.get(pattern.id()) {
                resolution.clone()
            } else {
                let client = self.client.clone();
                let cache = self.cache.clone();
                let config = self.config.clone();
                let inflight_registry = self.inflight.clone();
                let owned_pattern = pattern.clone();
                let pattern_id = pattern.id().to_string();
                let now = OffsetDateTime::now_utc();
                // The resolution is spawned so that a caller abandoning it
                // cannot cancel work shared with coalesced callers.
                let join_handle = tokio::spawn(async move {
                    let result = resolve_pattern(
                        &client,
                        &config,
                        &cache,
                        &owned_pattern,
                        skip_snapshot_hydration,
                        now,
                    )
                    .await;
                    if let Err(error) = &result {
                        FIELDMAP_METRICS
                            .resolution_errors_total
                            .with_label_values([error.kind().as_str()])
                            .inc();
                    }
                    // The task removes its own registry entry, so abandoned
                    // resolutions never linger.
                    inflight_registry.lock().unwrap().remove(&pattern_id);
                    result
                });
                let resolution: SharedResolution = async move {
                    match join_handle.await {
                        Ok(result) => result,
                        Err(join_error) => Err(ResolveErrorKind::Cluster
                            .with_error(anyhow::anyhow!("resolution task failed: {join_error}"))),
                    }
                }
                .boxed()
                .shared();
                inflight.insert(pattern.id().to_string(), resolution.clone());
                resolution
            }
        };
        resolution.await
    }

    /// Expands the wildcard form of the pattern and reports both the full
    /// name set and the round-trip-matching subset. Used by management
    /// surfaces to preview what a pattern matches.
    pub async fn list_indices(&self, pattern: &IndexPattern) -> ResolveResult<ResolvedIndices> {
        let aliases = self
            .client
            .list_aliases(pattern.template().wildcard_form())
            .await
            .map_err(translate_cluster_error)?;
        let all = flatten_aliases(&aliases);
        let matches = match_dated_indices(pattern.template(), &all);
        Ok(ResolvedIndices { all, matches })
    }

    /// Invalidates the cache entry of one pattern.
    pub fn clear_cache(&self, pattern: &IndexPattern) {
        self.cache.clear(pattern.id());
    }

    /// Invalidates every cache entry.
    pub fn clear_all_caches(&self) {
        self.cache.clear_all();
    }
}

async fn resolve_pattern(
    client: &ClusterClient,
    config: &ResolverConfig,
    cache: &FieldCache,
    pattern: &IndexPattern,
    skip_snapshot_hydration: bool,
    now: OffsetDateTime,
) -> ResolveResult<Vec<Field>> {
    if !skip_snapshot_hydration {
        if let Some(fields) = hydrate_snapshot(client, config, pattern).await? {
            // An empty snapshot does not seed the cache: the resolution
            // proceeds live instead of freezing an empty field list.
            if !fields.is_empty() {
                debug!(
                    pattern_id = pattern.id(),
                    num_fields = fields.len(),
                    "seeding field cache from persisted snapshot"
                );
                cache.set(pattern.id(), fields.clone());
                return Ok(fields);
            }
        }
    }
    FIELDMAP_METRICS.resolutions_total.inc();
    let index_expression = resolve_index_expression(client, config, pattern, now).await?;
    let mappings = client
        .field_mappings(&index_expression, true, false, true)
        .await
        .map_err(translate_cluster_error)?;
    let fields = fields_from_mappings(&mappings);
    debug!(
        pattern_id = pattern.id(),
        num_fields = fields.len(),
        "resolved field mappings"
    );
    cache.set(pattern.id(), fields.clone());
    Ok(fields)
}

async fn hydrate_snapshot(
    client: &ClusterClient,
    config: &ResolverConfig,
    pattern: &IndexPattern,
) -> ResolveResult<Option<Vec<Field>>> {
    let source_opt = client
        .get_document(&config.metadata_index, SNAPSHOT_DOC_TYPE, pattern.id())
        .await
        .map_err(|error| ResolveErrorKind::Cluster.with_error(error))?;
    let Some(fields_json) = source_opt.and_then(|source| source.fields) else {
        return Ok(None);
    };
    let fields: Vec<Field> = serde_json::from_str(&fields_json).map_err(|error| {
        ResolveErrorKind::Cluster
            .with_error(error)
            .add_context(format!(
                "failed to parse the persisted field snapshot of pattern `{}`",
                pattern.id()
            ))
    })?;
    Ok(Some(fields))
}

async fn resolve_index_expression(
    client: &ClusterClient,
    config: &ResolverConfig,
    pattern: &IndexPattern,
    now: OffsetDateTime,
) -> ResolveResult<String> {
    if pattern.interval().is_none() {
        let expression = non_interval_expression(pattern, now);
        let aliases = client
            .list_aliases(&expression)
            .await
            .map_err(translate_cluster_error)?;
        let resolved = flatten_aliases(&aliases);
        if resolved.is_empty() {
            // Last resort: let the cluster's own wildcard semantics apply at
            // mapping-fetch time.
            warn!(
                pattern_id = pattern.id(),
                "alias resolution returned no index, falling back to the raw pattern expression"
            );
            return Ok(pattern.id().to_string());
        }
        return Ok(resolved.join(","));
    }
    let wildcard = pattern.template().wildcard_form();
    let aliases = client
        .list_aliases(wildcard)
        .await
        .map_err(translate_cluster_error)?;
    let all_names = flatten_aliases(&aliases);
    let matches = match_dated_indices(pattern.template(), &all_names);
    if matches.is_empty() {
        return Err(
            ResolveErrorKind::MissingIndices.with_error(anyhow::anyhow!(
                "no dated index matches pattern `{}`",
                pattern.id()
            )),
        );
    }
    // Truncation keeps the chronologically latest matches, discarding older
    // ones first.
    let num_skipped = matches.len().saturating_sub(config.lookback);
    if num_skipped > 0 {
        debug!(
            pattern_id = pattern.id(),
            num_matches = matches.len(),
            lookback = config.lookback,
            "truncating matched indices to the lookback count"
        );
    }
    Ok(matches[num_skipped..].join(","))
}

/// Flattens an alias-listing response into a sorted, deduplicated name set:
/// every index contributes its own name plus every alias pointing at it.
fn flatten_aliases(response: &AliasesResponse) -> Vec<String> {
    response
        .iter()
        .flat_map(|(index_name, index_aliases)| {
            std::iter::once(index_name.clone()).chain(index_aliases.aliases.keys().cloned())
        })
        .sorted()
        .dedup()
        .collect()
}

/// Keeps the candidate names that round-trip through the date template, in
/// the chronological order of their parsed dates (stable on ties).
fn match_dated_indices(template: &DateTemplate, candidate_names: &[String]) -> Vec<String> {
    let mut matches: Vec<(OffsetDateTime, &String)> = candidate_names
        .iter()
        .filter_map(|name| {
            template
                .round_trip(name)
                .map(|date_time| (date_time, name))
        })
        .collect();
    matches.sort_by_key(|(date_time, _)| *date_time);
    matches
        .into_iter()
        .map(|(_, name)| name.clone())
        .collect()
}

/// Joins the candidate names of the trailing window into a comma list, or
/// falls back to the raw pattern string when the template yields no
/// candidate.
fn non_interval_expression(pattern: &IndexPattern, now: OffsetDateTime) -> String {
    let window_start = now - Duration::days(NON_INTERVAL_WINDOW_DAYS);
    let candidates = candidate_indices(pattern.template(), window_start, now);
    if candidates.is_empty() {
        return pattern.id().to_string();
    }
    candidates
        .iter()
        .map(|candidate| candidate.index.as_str())
        .join(",")
}

/// A client error (status >= 400) reported by the cluster means it could not
/// resolve the name; everything else, including failures that never reached
/// the cluster, is fatal for the resolution attempt.
fn translate_cluster_error(error: ClusterClientError) -> ResolveError {
    if matches!(error, ClusterClientError::UrlParse(_)) {
        // A local URL-construction failure is not a cluster verdict on the
        // pattern.
        return ResolveErrorKind::Cluster.with_error(error);
    }
    match error.status_code() {
        Some(code) if code.is_client_error() => {
            ResolveErrorKind::MissingIndices.with_error(error)
        }
        _ => ResolveErrorKind::Cluster.with_error(error),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration as StdDuration;

    use reqwest::Url;
    use serde_json::json;
    use time::macros::datetime;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::fields::FieldType;
    use crate::intervals::Interval;

    fn resolver_for(mock_server: &MockServer, config: ResolverConfig) -> PatternResolver {
        let endpoint = Url::parse(&mock_server.uri()).unwrap();
        PatternResolver::new(ClusterClient::new(endpoint), config)
    }

    fn daily_pattern(id: &str) -> IndexPattern {
        IndexPattern::new(id, Some("timestamp".to_string()), Some(Interval::Daily)).unwrap()
    }

    fn alias_entry(aliases: &[&str]) -> serde_json::Value {
        let alias_map: serde_json::Map<String, serde_json::Value> = aliases
            .iter()
            .map(|alias| (alias.to_string(), json!({})))
            .collect();
        json!({ "aliases": alias_map })
    }

    fn mapping_entry(field_name: &str, mapping_type: &str) -> serde_json::Value {
        json!({
            field_name: {
                "full_name": field_name,
                "mapping": {
                    field_name: {"type": mapping_type, "index": "not_analyzed"}
                }
            }
        })
    }

    #[test]
    fn test_match_dated_indices_round_trip() {
        let template = DateTemplate::parse("events-[YYYY.MM.DD]").unwrap();
        let candidates = vec![
            "events-2023.01.05".to_string(),
            "events-2023.01.05-backup".to_string(),
            "eventsfoo".to_string(),
        ];
        assert_eq!(
            match_dated_indices(&template, &candidates),
            ["events-2023.01.05"]
        );
    }

    #[test]
    fn test_match_dated_indices_chronological_order() {
        let template = DateTemplate::parse("logs-[YYYY.MM.DD]").unwrap();
        let candidates = vec![
            "logs-2023.02.01".to_string(),
            "logs-2022.12.31".to_string(),
            "logs-2023.01.15".to_string(),
        ];
        assert_eq!(
            match_dated_indices(&template, &candidates),
            ["logs-2022.12.31", "logs-2023.01.15", "logs-2023.02.01"]
        );
    }

    #[test]
    fn test_url_construction_failure_is_a_cluster_error() {
        let error = ClusterClientError::UrlParse("relative URL without a base".to_string());
        assert_eq!(
            translate_cluster_error(error).kind(),
            ResolveErrorKind::Cluster
        );
    }

    #[test]
    fn test_non_interval_expression() {
        let pattern = IndexPattern::new("logs-[YYYY.MM.DD]", None, None).unwrap();
        let expression = non_interval_expression(&pattern, datetime!(2023-01-31 12:00:00 UTC));
        let names: Vec<&str> = expression.split(',').collect();
        assert_eq!(names.len(), 31);
        assert_eq!(names[0], "logs-2023.01.01");
        assert_eq!(names[30], "logs-2023.01.31");

        let pattern = IndexPattern::new("logs-*", None, None).unwrap();
        let expression = non_interval_expression(&pattern, datetime!(2023-01-31 12:00:00 UTC));
        assert_eq!(expression, "logs-*");
    }

    #[tokio::test]
    async fn test_get_fields_is_idempotent_and_served_from_cache() {
        let mock_server = MockServer::start().await;
        let resolver = resolver_for(&mock_server, ResolverConfig::default());
        let pattern = daily_pattern("logs-[YYYY.MM.DD]");

        Mock::given(method("GET"))
            .and(path("/logs-*/_aliases"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "logs-2023.01.04": alias_entry(&[]),
                "logs-2023.01.05": alias_entry(&["logs-current"]),
            })))
            .expect(1)
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/logs-2023.01.04,logs-2023.01.05/_mapping/field/*"))
            .and(query_param("ignore_unavailable", "true"))
            .and(query_param("allow_no_indices", "false"))
            .and(query_param("include_defaults", "true"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "logs-2023.01.04": {"mappings": {"logs": mapping_entry("status", "string")}},
                "logs-2023.01.05": {"mappings": {"logs": mapping_entry("status", "long")}},
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let fields = resolver.get_fields(&pattern, true).await.unwrap();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].name, "status");
        // The later index wins the metadata conflict.
        assert_eq!(fields[0].field_type, FieldType::Number);

        // Second call: zero cluster calls, identical result.
        let fields_again = resolver.get_fields(&pattern, true).await.unwrap();
        assert_eq!(fields_again, fields);
    }

    #[tokio::test]
    async fn test_lookback_bounds_the_mapping_fetch() {
        let mock_server = MockServer::start().await;
        let config = ResolverConfig {
            lookback: 2,
            ..Default::default()
        };
        let resolver = resolver_for(&mock_server, config);
        let pattern = daily_pattern("logs-[YYYY.MM.DD]");

        Mock::given(method("GET"))
            .and(path("/logs-*/_aliases"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "logs-2023.01.02": alias_entry(&[]),
                "logs-2023.01.03": alias_entry(&[]),
                "logs-2023.01.04": alias_entry(&[]),
                "logs-2023.01.05": alias_entry(&[]),
            })))
            .expect(1)
            .mount(&mock_server)
            .await;
        // Only the 2 chronologically latest matches are fetched.
        Mock::given(method("GET"))
            .and(path("/logs-2023.01.04,logs-2023.01.05/_mapping/field/*"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "logs-2023.01.05": {"mappings": {"logs": mapping_entry("message", "string")}},
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let fields = resolver.get_fields(&pattern, true).await.unwrap();
        assert_eq!(fields.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_resolution_fails_without_caching() {
        let mock_server = MockServer::start().await;
        let resolver = resolver_for(&mock_server, ResolverConfig::default());
        let pattern = daily_pattern("logs-[YYYY.MM.DD]");

        // The wildcard matches something, but nothing round-trips through
        // the date template.
        Mock::given(method("GET"))
            .and(path("/logs-*/_aliases"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "logs-2023.01.05-backup": alias_entry(&[]),
                "logsfoo": alias_entry(&[]),
            })))
            .mount(&mock_server)
            .await;

        let error = resolver.get_fields(&pattern, true).await.unwrap_err();
        assert_eq!(error.kind(), ResolveErrorKind::MissingIndices);
        assert_eq!(resolver.cache().get(pattern.id()), None);
    }

    #[tokio::test]
    async fn test_cold_start_hydration_skips_cluster_calls() {
        let mock_server = MockServer::start().await;
        let resolver = resolver_for(&mock_server, ResolverConfig::default());
        let pattern = IndexPattern::new("p1", None, None).unwrap();

        // Only the snapshot read is mounted: any alias or mapping request
        // would fail the resolution.
        Mock::given(method("GET"))
            .and(path("/.fieldmap/index-pattern/p1"))
            .and(query_param("_source_include", "fields"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "found": true,
                "_source": {"fields": "[{\"name\":\"a\",\"type\":\"string\"}]"},
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let fields = resolver.get_fields(&pattern, false).await.unwrap();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].name, "a");
        assert_eq!(fields[0].field_type, FieldType::String);
        // The cache is seeded from the snapshot.
        assert_eq!(resolver.cache().get("p1").unwrap(), fields);
    }

    #[tokio::test]
    async fn test_absent_snapshot_falls_through_to_live_resolution() {
        let mock_server = MockServer::start().await;
        let resolver = resolver_for(&mock_server, ResolverConfig::default());
        let pattern = IndexPattern::new("logs-*", None, None).unwrap();

        Mock::given(method("GET"))
            .and(path("/.fieldmap/index-pattern/logs-*"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({"found": false})))
            .expect(1)
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/logs-*/_aliases"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "logs-2023.01.05": alias_entry(&[]),
            })))
            .expect(1)
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/logs-2023.01.05/_mapping/field/*"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "logs-2023.01.05": {"mappings": {"logs": mapping_entry("message", "string")}},
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let fields = resolver.get_fields(&pattern, false).await.unwrap();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].name, "message");
    }

    #[tokio::test]
    async fn test_concurrent_resolutions_coalesce() {
        let mock_server = MockServer::start().await;
        let resolver = resolver_for(&mock_server, ResolverConfig::default());
        let pattern = daily_pattern("logs-[YYYY.MM.DD]");

        Mock::given(method("GET"))
            .and(path("/logs-*/_aliases"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_delay(StdDuration::from_millis(50))
                    .set_body_json(json!({
                        "logs-2023.01.05": alias_entry(&[]),
                    })),
            )
            .expect(1)
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/logs-2023.01.05/_mapping/field/*"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "logs-2023.01.05": {"mappings": {"logs": mapping_entry("message", "string")}},
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let calls = (0..8).map(|_| resolver.get_fields(&pattern, true));
        let results = futures::future::join_all(calls).await;
        for result in results {
            let fields = result.unwrap();
            assert_eq!(fields.len(), 1);
        }
    }

    #[tokio::test]
    async fn test_coalescing_adopts_the_first_caller_hydration_flag() {
        let mock_server = MockServer::start().await;
        let resolver = resolver_for(&mock_server, ResolverConfig::default());
        let pattern = daily_pattern("logs-[YYYY.MM.DD]");

        // No snapshot mock is mounted: a hydrating caller starting its own
        // resolution would read the snapshot, miss, and issue a second
        // alias request, breaking the expected call counts.
        Mock::given(method("GET"))
            .and(path("/logs-*/_aliases"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_delay(StdDuration::from_millis(50))
                    .set_body_json(json!({
                        "logs-2023.01.05": alias_entry(&[]),
                    })),
            )
            .expect(1)
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/logs-2023.01.05/_mapping/field/*"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "logs-2023.01.05": {"mappings": {"logs": mapping_entry("message", "string")}},
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let skipping = resolver.get_fields(&pattern, true);
        let hydrating = resolver.get_fields(&pattern, false);
        let (first, second) = futures::future::join(skipping, hydrating).await;
        assert_eq!(first.unwrap(), second.unwrap());
    }

    #[tokio::test]
    async fn test_clear_cache_forces_a_full_resolution() {
        let mock_server = MockServer::start().await;
        let resolver = resolver_for(&mock_server, ResolverConfig::default());
        let pattern = daily_pattern("logs-[YYYY.MM.DD]");

        Mock::given(method("GET"))
            .and(path("/logs-*/_aliases"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "logs-2023.01.05": alias_entry(&[]),
            })))
            .expect(2)
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/logs-2023.01.05/_mapping/field/*"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "logs-2023.01.05": {"mappings": {"logs": mapping_entry("message", "string")}},
            })))
            .expect(2)
            .mount(&mock_server)
            .await;

        resolver.get_fields(&pattern, true).await.unwrap();
        resolver.clear_cache(&pattern);
        resolver.get_fields(&pattern, true).await.unwrap();
    }

    #[tokio::test]
    async fn test_cache_returns_to_empty_under_pattern_churn() {
        let mock_server = MockServer::start().await;
        let resolver = resolver_for(&mock_server, ResolverConfig::default());
        let patterns = [daily_pattern("a-[YYYY.MM.DD]"), daily_pattern("b-[YYYY.MM.DD]")];

        for prefix in ["a", "b"] {
            Mock::given(method("GET"))
                .and(path(format!("/{prefix}-*/_aliases")))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    (format!("{prefix}-2023.01.05")): alias_entry(&[]),
                })))
                .mount(&mock_server)
                .await;
            Mock::given(method("GET"))
                .and(path(format!("/{prefix}-2023.01.05/_mapping/field/*")))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    (format!("{prefix}-2023.01.05")): {
                        "mappings": {"logs": mapping_entry("message", "string")}
                    },
                })))
                .mount(&mock_server)
                .await;
        }

        for pattern in &patterns {
            resolver.get_fields(pattern, true).await.unwrap();
        }
        assert_eq!(resolver.cache().len(), 2);
        for pattern in &patterns {
            resolver.clear_cache(pattern);
        }
        assert!(resolver.cache().is_empty());
    }

    #[tokio::test]
    async fn test_error_taxonomy() {
        let mock_server = MockServer::start().await;
        let resolver = resolver_for(&mock_server, ResolverConfig::default());
        let pattern = daily_pattern("gone-[YYYY.MM.DD]");

        Mock::given(method("GET"))
            .and(path("/gone-*/_aliases"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "error": "IndexMissingException[[gone-*] missing]",
                "status": 404,
            })))
            .up_to_n_times(1)
            .mount(&mock_server)
            .await;
        let error = resolver.get_fields(&pattern, true).await.unwrap_err();
        assert_eq!(error.kind(), ResolveErrorKind::MissingIndices);

        Mock::given(method("GET"))
            .and(path("/gone-*/_aliases"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({
                "error": "unavailable",
            })))
            .mount(&mock_server)
            .await;
        let error = resolver.get_fields(&pattern, true).await.unwrap_err();
        assert_eq!(error.kind(), ResolveErrorKind::Cluster);
        assert_eq!(resolver.cache().get(pattern.id()), None);
    }

    #[tokio::test]
    async fn test_malformed_mapping_payload_is_a_cluster_error() {
        let mock_server = MockServer::start().await;
        let resolver = resolver_for(&mock_server, ResolverConfig::default());
        let pattern = daily_pattern("logs-[YYYY.MM.DD]");

        Mock::given(method("GET"))
            .and(path("/logs-*/_aliases"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "logs-2023.01.05": alias_entry(&[]),
            })))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/logs-2023.01.05/_mapping/field/*"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!("garbage")))
            .mount(&mock_server)
            .await;

        let error = resolver.get_fields(&pattern, true).await.unwrap_err();
        assert_eq!(error.kind(), ResolveErrorKind::Cluster);
    }

    #[tokio::test]
    async fn test_non_interval_fallback_to_raw_pattern_expression() {
        let mock_server = MockServer::start().await;
        let resolver = resolver_for(&mock_server, ResolverConfig::default());
        let pattern = IndexPattern::new("logs-*", None, None).unwrap();

        Mock::given(method("GET"))
            .and(path("/logs-*/_aliases"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&mock_server)
            .await;
        // The mapping fetch falls back to the raw pattern expression.
        Mock::given(method("GET"))
            .and(path("/logs-*/_mapping/field/*"))
            .and(query_param("allow_no_indices", "false"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "logs-2023.01.05": {"mappings": {"logs": mapping_entry("message", "string")}},
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let fields = resolver.get_fields(&pattern, true).await.unwrap();
        assert_eq!(fields.len(), 1);
    }

    #[tokio::test]
    async fn test_list_indices_reports_all_names_and_matches() {
        let mock_server = MockServer::start().await;
        let resolver = resolver_for(&mock_server, ResolverConfig::default());
        let pattern = daily_pattern("logs-[YYYY.MM.DD]");

        Mock::given(method("GET"))
            .and(path("/logs-*/_aliases"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "logs-2023.01.04": alias_entry(&[]),
                "logs-2023.01.05": alias_entry(&["logs-current"]),
                "logs-archive": alias_entry(&[]),
            })))
            .mount(&mock_server)
            .await;

        let resolved = resolver.list_indices(&pattern).await.unwrap();
        assert_eq!(
            resolved.all,
            [
                "logs-2023.01.04",
                "logs-2023.01.05",
                "logs-archive",
                "logs-current"
            ]
        );
        assert_eq!(resolved.matches, ["logs-2023.01.04", "logs-2023.01.05"]);
    }
}
