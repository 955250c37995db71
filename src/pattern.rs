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

use anyhow::{bail, Context};

use crate::intervals::Interval;
use crate::template::DateTemplate;

/// A logical index pattern as declared by a caller: its identifier doubles as
/// the pattern string, e.g. `"logs-[YYYY.MM.DD]"` or a plain wildcard such as
/// `"logs-*"`.
///
/// A pattern declaring an [`Interval`] is resolved through wildcard expansion
/// plus date round-trip matching; a pattern without one is resolved over a
/// trailing window of candidate names. Immutable for the duration of a
/// resolution.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct IndexPattern {
    id: String,
    time_field_name: Option<String>,
    interval: Option<Interval>,
    template: DateTemplate,
}

impl IndexPattern {
    /// Validates the pattern string and builds the pattern descriptor.
    ///
    /// The pattern string must parse as a date template; a pattern declaring
    /// an interval must actually contain date tokens, since its resolution
    /// relies on round-trip parsing the names it matches.
    pub fn new(
        id: impl Into<String>,
        time_field_name: Option<String>,
        interval: Option<Interval>,
    ) -> anyhow::Result<Self> {
        let id = id.into();
        if id.is_empty() {
            bail!("index pattern id must not be empty");
        }
        let template = DateTemplate::parse(&id)
            .map_err(|error| anyhow::anyhow!(error))
            .with_context(|| format!("invalid index pattern `{id}`"))?;
        if interval.is_some() && !template.is_dated() {
            bail!("index pattern `{id}` declares an interval but contains no date token");
        }
        Ok(IndexPattern {
            id,
            time_field_name,
            interval,
            template,
        })
    }

    /// The pattern identifier, equal to the pattern string.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The name of the time field the pattern is tied to, if any.
    pub fn time_field_name(&self) -> Option<&str> {
        self.time_field_name.as_deref()
    }

    /// The declared rolling interval. `None` means the pattern is not
    /// time-based.
    pub fn interval(&self) -> Option<Interval> {
        self.interval
    }

    /// The compiled date template backing the pattern string.
    pub fn template(&self) -> &DateTemplate {
        &self.template
    }
}
