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

use serde::{Deserialize, Serialize};

/// Primitive type tag of a resolved field, collapsed from the cluster's
/// mapping types.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    /// Text and keyword mapping types.
    String,
    /// All integer and floating point mapping types.
    Number,
    /// Date mapping types.
    Date,
    /// Boolean mapping type.
    Boolean,
    /// Geo point and geo shape mapping types.
    Geo,
    /// IP address mapping type.
    Ip,
    /// Object and nested mapping types.
    Object,
    /// Any mapping type not covered by the table above.
    Unknown,
}

impl FieldType {
    /// Casts a cluster mapping type into the flat taxonomy.
    pub fn from_mapping_type(mapping_type: &str) -> FieldType {
        match mapping_type {
            "string" | "text" | "keyword" => FieldType::String,
            "long" | "integer" | "short" | "byte" | "double" | "float" | "half_float"
            | "scaled_float" => FieldType::Number,
            "date" | "date_nanos" => FieldType::Date,
            "boolean" => FieldType::Boolean,
            "geo_point" | "geo_shape" => FieldType::Geo,
            "ip" => FieldType::Ip,
            "object" | "nested" => FieldType::Object,
            _ => FieldType::Unknown,
        }
    }
}

/// A flat field descriptor derived from the cluster's field mappings.
///
/// The field list of a pattern is a set keyed by `name`; when several indices
/// report the same field with conflicting metadata, the later index in the
/// resolved list wins. The serde shape is also the persisted snapshot format.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Field {
    /// Field name, unique within a pattern's field list.
    pub name: String,
    /// Primitive type tag.
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Whether the field is indexed for search.
    #[serde(default)]
    pub searchable: bool,
    /// Whether the field can feed aggregations.
    #[serde(default)]
    pub aggregatable: bool,
    /// Format hint declared in the mapping, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}
