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

use anyhow::ensure;
use serde::{Deserialize, Serialize};

fn default_lookback() -> usize {
    5
}

fn default_metadata_index() -> String {
    ".fieldmap".to_string()
}

/// Tunables of the pattern resolver.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResolverConfig {
    /// How many of the most recent matched interval indices are used for
    /// field-mapping retrieval. Older matches beyond this count are
    /// discarded.
    #[serde(default = "default_lookback")]
    pub lookback: usize,
    /// Name of the store index holding persisted pattern snapshots.
    #[serde(default = "default_metadata_index")]
    pub metadata_index: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        ResolverConfig {
            lookback: default_lookback(),
            metadata_index: default_metadata_index(),
        }
    }
}

impl ResolverConfig {
    /// Checks the config invariants.
    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(
            self.lookback >= 1,
            "`lookback` must be at least 1, got {}",
            self.lookback
        );
        ensure!(
            !self.metadata_index.is_empty(),
            "`metadata_index` must not be empty"
        );
        Ok(())
    }
}
