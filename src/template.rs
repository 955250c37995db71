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

use std::num::NonZeroU8;

use time::format_description::modifier as modifiers;
use time::format_description::{Component, OwnedFormatItem};
use time::parsing::Parsed;
use time::{Month, OffsetDateTime, PrimitiveDateTime, UtcOffset, Weekday};

use crate::intervals::Interval;

/// Date tokens supported inside a bracketed group. All tokens are fixed width
/// and zero padded.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum DateToken {
    /// `YYYY`: calendar year.
    CalendarYear,
    /// `GGGG`: ISO week-based year.
    IsoYear,
    /// `MM`: month of year.
    Month,
    /// `DD`: day of month.
    Day,
    /// `HH`: hour of day (24h).
    Hour,
    /// `WW`: ISO week number.
    IsoWeek,
}

/// A date-rolled index-name template such as `logs-[YYYY.MM.DD]`.
///
/// Literal text lives outside brackets; date tokens live inside one or more
/// bracketed groups. A template holds the compiled `time` format items so the
/// same description drives rendering and parsing, which makes the round-trip
/// check of [`DateTemplate::round_trip`] a byte-for-byte comparison.
#[derive(Clone, Debug)]
pub struct DateTemplate {
    template: String,
    items: Vec<OwnedFormatItem>,
    tokens: Vec<DateToken>,
    wildcard: String,
}

impl PartialEq for DateTemplate {
    fn eq(&self, other: &Self) -> bool {
        self.template == other.template
    }
}

impl Eq for DateTemplate {}

impl DateTemplate {
    /// Parses a template string. Returns an error message on an unknown date
    /// token, a nested or unbalanced `[`, or a stray `]`.
    pub fn parse(template: &str) -> Result<Self, String> {
        let mut items = Vec::new();
        let mut tokens = Vec::new();
        let mut wildcard = String::new();
        let mut pending_literal = String::new();
        let mut in_group = false;

        let mut chars = template.chars().peekable();
        while let Some(ch) = chars.next() {
            if !in_group {
                match ch {
                    '[' => {
                        in_group = true;
                        wildcard.push('*');
                    }
                    ']' => {
                        return Err(format!("stray `]` in date template `{template}`"));
                    }
                    _ => {
                        pending_literal.push(ch);
                        wildcard.push(ch);
                    }
                }
                continue;
            }
            match ch {
                ']' => in_group = false,
                '[' => {
                    return Err(format!("nested `[` in date template `{template}`"));
                }
                ch if ch.is_ascii_alphabetic() => {
                    let mut len = 1;
                    while chars.peek() == Some(&ch) {
                        chars.next();
                        len += 1;
                    }
                    let token = match (ch, len) {
                        ('Y', 4) => DateToken::CalendarYear,
                        ('G', 4) => DateToken::IsoYear,
                        ('M', 2) => DateToken::Month,
                        ('D', 2) => DateToken::Day,
                        ('H', 2) => DateToken::Hour,
                        ('W', 2) => DateToken::IsoWeek,
                        _ => {
                            let run: String = std::iter::repeat(ch).take(len).collect();
                            return Err(format!(
                                "unknown date token `{run}` in template `{template}`"
                            ));
                        }
                    };
                    if !pending_literal.is_empty() {
                        items.push(literal_item(&pending_literal));
                        pending_literal.clear();
                    }
                    items.push(OwnedFormatItem::Component(token.component()));
                    tokens.push(token);
                }
                // Non-alphabetic characters inside a group are literals.
                _ => pending_literal.push(ch),
            }
        }
        if in_group {
            return Err(format!("unbalanced `[` in date template `{template}`"));
        }
        if !pending_literal.is_empty() {
            items.push(literal_item(&pending_literal));
        }
        Ok(DateTemplate {
            template: template.to_string(),
            items,
            tokens,
            wildcard,
        })
    }

    /// The original template string.
    pub fn as_str(&self) -> &str {
        &self.template
    }

    /// Whether the template contains at least one date token.
    pub fn is_dated(&self) -> bool {
        !self.tokens.is_empty()
    }

    /// The wildcard form of the template: every bracketed group replaced by
    /// `*`. A template with no group is returned unchanged.
    pub fn wildcard_form(&self) -> &str {
        &self.wildcard
    }

    /// The rolling interval implied by the finest date token present, if any.
    pub fn interval(&self) -> Option<Interval> {
        let mut finest: Option<Interval> = None;
        for token in &self.tokens {
            let interval = match token {
                DateToken::Hour => Interval::Hourly,
                DateToken::Day => Interval::Daily,
                DateToken::IsoWeek => Interval::Weekly,
                DateToken::Month => Interval::Monthly,
                DateToken::CalendarYear | DateToken::IsoYear => Interval::Yearly,
            };
            finest = Some(match finest {
                Some(current) if current <= interval => current,
                _ => interval,
            });
        }
        finest
    }

    /// Renders the template for the given timestamp (UTC).
    pub fn render(&self, date_time: OffsetDateTime) -> Result<String, time::error::Format> {
        date_time
            .to_offset(UtcOffset::UTC)
            .format(self.items.as_slice())
    }

    /// Parses an index name against the template. Missing components default
    /// to the start of their range (midnight, January, first day of month,
    /// first ISO week, Monday), so `logs-[YYYY.MM]` parses to the first
    /// instant of the month.
    pub fn parse_date_time(&self, name: &str) -> Result<OffsetDateTime, String> {
        let mut parsed = Parsed::new();
        let remaining = parsed
            .parse_items(name.as_bytes(), self.items.as_slice())
            .map_err(|error| error.to_string())?;
        if !remaining.is_empty() {
            return Err(format!(
                "index name `{name}` has trailing characters after template `{}`",
                self.template
            ));
        }
        if self.is_week_based() {
            if parsed.iso_week_number().is_none() {
                parsed.set_iso_week_number(NonZeroU8::MIN);
            }
            if parsed.weekday().is_none() {
                parsed.set_weekday(Weekday::Monday);
            }
        } else {
            if parsed.month().is_none() {
                parsed.set_month(Month::January);
            }
            if parsed.day().is_none() {
                parsed.set_day(NonZeroU8::MIN);
            }
        }
        if parsed.hour_24().is_none() {
            parsed.set_hour_24(0);
            parsed.set_minute(0);
            parsed.set_second(0);
        }
        let date_time: PrimitiveDateTime = parsed
            .try_into()
            .map_err(|error: time::error::TryFromParsed| error.to_string())?;
        Ok(date_time.assume_utc())
    }

    /// Parses `name` against the template and keeps it only if re-formatting
    /// the parsed date reproduces the exact input. This guards against a
    /// wildcard coincidentally matching an unrelated index name.
    pub fn round_trip(&self, name: &str) -> Option<OffsetDateTime> {
        let date_time = self.parse_date_time(name).ok()?;
        let rendered = self.render(date_time).ok()?;
        (rendered == name).then_some(date_time)
    }

    fn is_week_based(&self) -> bool {
        self.tokens
            .iter()
            .any(|token| matches!(token, DateToken::IsoYear | DateToken::IsoWeek))
    }
}

impl DateToken {
    fn component(&self) -> Component {
        match self {
            DateToken::CalendarYear => {
                let mut modifier = modifiers::Year::default();
                modifier.padding = modifiers::Padding::Zero;
                modifier.repr = modifiers::YearRepr::Full;
                modifier.iso_week_based = false;
                Component::Year(modifier)
            }
            DateToken::IsoYear => {
                let mut modifier = modifiers::Year::default();
                modifier.padding = modifiers::Padding::Zero;
                modifier.repr = modifiers::YearRepr::Full;
                modifier.iso_week_based = true;
                Component::Year(modifier)
            }
            DateToken::Month => {
                let mut modifier = modifiers::Month::default();
                modifier.padding = modifiers::Padding::Zero;
                modifier.repr = modifiers::MonthRepr::Numerical;
                Component::Month(modifier)
            }
            DateToken::Day => {
                let mut modifier = modifiers::Day::default();
                modifier.padding = modifiers::Padding::Zero;
                Component::Day(modifier)
            }
            DateToken::Hour => {
                let mut modifier = modifiers::Hour::default();
                modifier.padding = modifiers::Padding::Zero;
                modifier.is_12_hour_clock = false;
                Component::Hour(modifier)
            }
            DateToken::IsoWeek => {
                let mut modifier = modifiers::WeekNumber::default();
                modifier.padding = modifiers::Padding::Zero;
                modifier.repr = modifiers::WeekNumberRepr::Iso;
                Component::WeekNumber(modifier)
            }
        }
    }
}

fn literal_item(literal: &str) -> OwnedFormatItem {
    OwnedFormatItem::Literal(literal.as_bytes().to_vec().into_boxed_slice())
}
