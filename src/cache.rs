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
use std::sync::Mutex;

use crate::fields::Field;
use crate::metrics::FIELDMAP_METRICS;

struct NeedMutFieldCache {
    entries: HashMap<String, Vec<Field>>,
}

impl NeedMutFieldCache {
    fn get(&mut self, pattern_id: &str) -> Option<Vec<Field>> {
        let fields_opt = self.entries.get(pattern_id).cloned();
        if fields_opt.is_some() {
            FIELDMAP_METRICS.cache.hits_total.inc();
        } else {
            FIELDMAP_METRICS.cache.misses_total.inc();
        }
        fields_opt
    }

    fn set(&mut self, pattern_id: String, fields: Vec<Field>) {
        self.entries.insert(pattern_id, fields);
        FIELDMAP_METRICS
            .cache
            .in_cache_count
            .set(self.entries.len() as i64);
    }

    fn clear(&mut self, pattern_id: &str) {
        self.entries.remove(pattern_id);
        FIELDMAP_METRICS
            .cache
            .in_cache_count
            .set(self.entries.len() as i64);
    }

    fn clear_all(&mut self) {
        self.entries.clear();
        FIELDMAP_METRICS.cache.in_cache_count.set(0);
    }
}

/// In-process field cache keyed by index-pattern identifier.
///
/// A present entry is always a complete field list as of the last successful
/// resolution; partial entries are never stored. There is no expiry beyond
/// explicit invalidation: entries are keyed by the bounded set of known
/// pattern ids, so the cache tracks live patterns rather than growing with
/// query shapes. Safe for concurrent use; every mutation is a full-entry
/// replace.
pub struct FieldCache {
    inner: Mutex<NeedMutFieldCache>,
}

impl Default for FieldCache {
    fn default() -> Self {
        FieldCache {
            inner: Mutex::new(NeedMutFieldCache {
                entries: HashMap::new(),
            }),
        }
    }
}

impl FieldCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        FieldCache::default()
    }

    /// Returns a copy of the cached field list for the pattern, if present.
    /// Callers receive their own copy and can never mutate cached state.
    pub fn get(&self, pattern_id: &str) -> Option<Vec<Field>> {
        self.inner.lock().unwrap().get(pattern_id)
    }

    /// Replaces the entry for the pattern wholesale.
    pub fn set(&self, pattern_id: impl Into<String>, fields: Vec<Field>) {
        self.inner.lock().unwrap().set(pattern_id.into(), fields);
    }

    /// Removes one entry. No-op if absent.
    pub fn clear(&self, pattern_id: &str) {
        self.inner.lock().unwrap().clear(pattern_id);
    }

    /// Removes every entry.
    pub fn clear_all(&self) {
        self.inner.lock().unwrap().clear_all();
    }

    /// Number of patterns currently cached.
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().entries.len()
    }

    /// Whether the cache holds no entry.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
