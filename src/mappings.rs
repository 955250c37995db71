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

use serde::Deserialize;

use crate::fields::{Field, FieldType};

/// Raw field-mapping response: per-index, per-doc-type, per-field.
///
/// A `BTreeMap` keeps indices in lexical order, which equals chronological
/// order for zero-padded dated names: iterating in order makes the
/// last-write-wins rule of [`fields_from_mappings`] deterministic.
pub type FieldMappingsResponse = BTreeMap<String, IndexFieldMappings>;

/// Field mappings reported for one index.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct IndexFieldMappings {
    /// Per-doc-type, per-field mapping entries.
    #[serde(default)]
    pub mappings: HashMap<String, HashMap<String, FieldMappingEntry>>,
}

/// The mapping entry the cluster reports for one field of one index.
#[derive(Clone, Debug, Deserialize)]
pub struct FieldMappingEntry {
    /// Fully qualified field name; the map key is used when absent.
    #[serde(default)]
    pub full_name: Option<String>,
    /// Leaf mapping definitions, keyed by the leaf field name.
    #[serde(default)]
    pub mapping: HashMap<String, FieldMappingLeaf>,
}

/// The leaf mapping definition of a field.
#[derive(Clone, Debug, Deserialize)]
pub struct FieldMappingLeaf {
    /// Cluster mapping type, e.g. `"string"`, `"long"`, `"date"`.
    #[serde(rename = "type", default)]
    pub mapping_type: Option<String>,
    /// Index mode: either a boolean or one of `"analyzed"`, `"not_analyzed"`,
    /// `"no"`.
    #[serde(default)]
    pub index: Option<IndexMode>,
    /// Whether doc values are stored for the field.
    #[serde(default)]
    pub doc_values: Option<bool>,
    /// Format hint declared in the mapping, if any.
    #[serde(default)]
    pub format: Option<String>,
}

/// Index mode of a field. Older clusters report the tri-state string form,
/// newer ones a plain boolean.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum IndexMode {
    /// `true`/`false` form.
    Enabled(bool),
    /// `"analyzed"` / `"not_analyzed"` / `"no"` form.
    Mode(String),
}

impl FieldMappingLeaf {
    fn is_searchable(&self) -> bool {
        match &self.index {
            Some(IndexMode::Enabled(enabled)) => *enabled,
            Some(IndexMode::Mode(mode)) => mode != "no",
            None => true,
        }
    }

    fn is_analyzed(&self) -> bool {
        matches!(&self.index, Some(IndexMode::Mode(mode)) if mode == "analyzed")
    }

    fn is_aggregatable(&self) -> bool {
        match self.doc_values {
            Some(doc_values) => doc_values,
            None => self.is_searchable() && !self.is_analyzed(),
        }
    }
}

/// Flattens the nested per-index/per-field mapping response into the flat
/// field list, deduplicating by field name across the index list.
///
/// Cluster-internal fields (name starting with `_`) and entries with an empty
/// mapping object are skipped. Indices are visited in lexical order, so for a
/// field reported by several indices with conflicting metadata, the last
/// index wins.
pub fn fields_from_mappings(response: &FieldMappingsResponse) -> Vec<Field> {
    let mut fields: BTreeMap<String, Field> = BTreeMap::new();
    for index_mappings in response.values() {
        for type_mappings in index_mappings.mappings.values() {
            for (field_key, entry) in type_mappings {
                let name = entry.full_name.as_deref().unwrap_or(field_key);
                if name.starts_with('_') {
                    continue;
                }
                let Some(leaf) = entry.mapping.values().next() else {
                    continue;
                };
                let field_type = leaf
                    .mapping_type
                    .as_deref()
                    .map(FieldType::from_mapping_type)
                    .unwrap_or(FieldType::Unknown);
                fields.insert(
                    name.to_string(),
                    Field {
                        name: name.to_string(),
                        field_type,
                        searchable: leaf.is_searchable(),
                        aggregatable: leaf.is_aggregatable(),
                        format: leaf.format.clone(),
                    },
                );
            }
        }
    }
    fields.into_values().collect()
}
