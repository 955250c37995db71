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

//! Prometheus metrics of the resolver, exposed through the registry default
//! to whatever endpoint the embedding application serves.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use prometheus::Opts;
pub use prometheus::{IntCounter, IntCounterVec as PrometheusIntCounterVec, IntGauge};

/// A counter vec whose label arity is checked at compile time.
#[derive(Clone)]
pub struct IntCounterVec<const N: usize> {
    underlying: PrometheusIntCounterVec,
}

impl<const N: usize> IntCounterVec<N> {
    /// Returns the counter for the given label values.
    pub fn with_label_values(&self, label_values: [&str; N]) -> IntCounter {
        self.underlying.with_label_values(&label_values)
    }
}

/// Creates and registers a counter in the `fieldmap` namespace.
pub fn new_counter(name: &str, help: &str, subsystem: &str) -> IntCounter {
    let counter_opts = Opts::new(name, help)
        .namespace("fieldmap")
        .subsystem(subsystem);
    let counter = IntCounter::with_opts(counter_opts).expect("failed to create counter");
    prometheus::register(Box::new(counter.clone())).expect("failed to register counter");
    counter
}

/// Creates and registers a counter vec in the `fieldmap` namespace.
pub fn new_counter_vec<const N: usize>(
    name: &str,
    help: &str,
    subsystem: &str,
    const_labels: &[(&str, &str)],
    label_names: [&str; N],
) -> IntCounterVec<N> {
    let owned_const_labels: HashMap<String, String> = const_labels
        .iter()
        .map(|(label_name, label_value)| (label_name.to_string(), label_value.to_string()))
        .collect();
    let counter_opts = Opts::new(name, help)
        .namespace("fieldmap")
        .subsystem(subsystem)
        .const_labels(owned_const_labels);
    let underlying = PrometheusIntCounterVec::new(counter_opts, &label_names)
        .expect("failed to create counter vec");
    prometheus::register(Box::new(underlying.clone())).expect("failed to register counter vec");
    IntCounterVec { underlying }
}

/// Creates and registers a gauge in the `fieldmap` namespace.
pub fn new_gauge(name: &str, help: &str, subsystem: &str) -> IntGauge {
    let gauge_opts = Opts::new(name, help)
        .namespace("fieldmap")
        .subsystem(subsystem);
    let gauge = IntGauge::with_opts(gauge_opts).expect("failed to create gauge");
    prometheus::register(Box::new(gauge.clone())).expect("failed to register gauge");
    gauge
}

/// Counters and gauges of the field cache.
pub struct CacheMetrics {
    /// Number of cache lookups served from the cache.
    pub hits_total: IntCounter,
    /// Number of cache lookups that missed.
    pub misses_total: IntCounter,
    /// Number of pattern entries currently cached.
    pub in_cache_count: IntGauge,
}

impl Default for CacheMetrics {
    fn default() -> Self {
        CacheMetrics {
            hits_total: new_counter("hits_total", "Number of field cache hits", "cache"),
            misses_total: new_counter("misses_total", "Number of field cache misses", "cache"),
            in_cache_count: new_gauge(
                "in_cache_count",
                "Number of index patterns in the field cache",
                "cache",
            ),
        }
    }
}

/// All metrics of the crate.
pub struct FieldmapMetrics {
    /// Field cache metrics.
    pub cache: CacheMetrics,
    /// Number of live resolutions performed (cache hits excluded).
    pub resolutions_total: IntCounter,
    /// Number of failed resolutions, by error kind.
    pub resolution_errors_total: IntCounterVec<1>,
}

impl Default for FieldmapMetrics {
    fn default() -> Self {
        FieldmapMetrics {
            cache: CacheMetrics::default(),
            resolutions_total: new_counter(
                "resolutions_total",
                "Number of live pattern resolutions",
                "resolver",
            ),
            resolution_errors_total: new_counter_vec(
                "resolution_errors_total",
                "Number of failed pattern resolutions",
                "resolver",
                &[],
                ["kind"],
            ),
        }
    }
}

/// `FIELDMAP_METRICS` exposes the crate's metrics through a Prometheus
/// endpoint.
pub static FIELDMAP_METRICS: Lazy<FieldmapMetrics> = Lazy::new(FieldmapMetrics::default);
