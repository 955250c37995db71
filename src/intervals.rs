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
use time::{Date, Duration, Month, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset};

use crate::template::DateTemplate;

/// The time-rolling granularity of a dated index pattern, from finest to
/// coarsest. Buckets are aligned on UTC; weeks are ISO weeks starting on
/// Monday.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interval {
    /// One index per hour.
    Hourly,
    /// One index per day.
    Daily,
    /// One index per ISO week.
    Weekly,
    /// One index per month.
    Monthly,
    /// One index per year.
    Yearly,
}

impl Interval {
    /// Truncates a timestamp down to the start of its bucket (UTC).
    pub fn truncate(&self, timestamp: OffsetDateTime) -> OffsetDateTime {
        let timestamp = timestamp.to_offset(UtcOffset::UTC);
        let date = timestamp.date();
        match self {
            Interval::Hourly => {
                let time = Time::from_hms(timestamp.hour(), 0, 0)
                    .expect("truncated time components are in range");
                PrimitiveDateTime::new(date, time).assume_utc()
            }
            Interval::Daily => midnight(date),
            Interval::Weekly => {
                let days_from_monday = date.weekday().number_days_from_monday();
                midnight(date - Duration::days(days_from_monday as i64))
            }
            Interval::Monthly => midnight(first_of_month(date.year(), date.month())),
            Interval::Yearly => midnight(first_of_month(date.year(), Month::January)),
        }
    }

    /// Returns the start of the bucket following the one containing
    /// `timestamp`.
    pub fn advance(&self, timestamp: OffsetDateTime) -> OffsetDateTime {
        let bucket_start = self.truncate(timestamp);
        match self {
            Interval::Hourly => bucket_start + Duration::hours(1),
            Interval::Daily => bucket_start + Duration::days(1),
            Interval::Weekly => bucket_start + Duration::days(7),
            Interval::Monthly => {
                let date = bucket_start.date();
                let (year, month) = match date.month() {
                    Month::December => (date.year() + 1, Month::January),
                    month => (date.year(), month.next()),
                };
                midnight(first_of_month(year, month))
            }
            Interval::Yearly => midnight(first_of_month(bucket_start.year() + 1, Month::January)),
        }
    }
}

fn midnight(date: Date) -> OffsetDateTime {
    PrimitiveDateTime::new(date, Time::MIDNIGHT).assume_utc()
}

fn first_of_month(year: i32, month: Month) -> Date {
    Date::from_calendar_date(year, month, 1).expect("first of month is a valid date")
}

/// One candidate index name covering one interval bucket.
///
/// Candidates are names that *would* exist if data were spread evenly across
/// the requested range. Callers must verify existence against the cluster,
/// never assume it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CandidateIndex {
    /// The rendered index name.
    pub index: String,
    /// Inclusive start of the bucket.
    pub bucket_start: OffsetDateTime,
    /// Exclusive end of the bucket (start of the next one).
    pub bucket_end: OffsetDateTime,
}

/// Generates one candidate index name per interval bucket covering
/// `[range_start, range_end]`, rendered through the template.
///
/// Pure function of its inputs: "now" is never read internally. An empty or
/// inverted range yields an empty sequence, and so does a template with no
/// date tokens.
pub fn candidate_indices(
    template: &DateTemplate,
    range_start: OffsetDateTime,
    range_end: OffsetDateTime,
) -> Vec<CandidateIndex> {
    let Some(interval) = template.interval() else {
        return Vec::new();
    };
    if range_start > range_end {
        return Vec::new();
    }
    let mut candidates = Vec::new();
    let mut bucket_start = interval.truncate(range_start);
    while bucket_start <= range_end {
        let bucket_end = interval.advance(bucket_start);
        let index = template
            .render(bucket_start)
            .expect("rendering a complete datetime should not fail");
        candidates.push(CandidateIndex {
            index,
            bucket_start,
            bucket_end,
        });
        bucket_start = bucket_end;
    }
    candidates
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    #[test]
    fn test_truncate() {
        let timestamp = datetime!(2023-03-15 13:37:42 UTC);
        assert_eq!(
            Interval::Hourly.truncate(timestamp),
            datetime!(2023-03-15 13:00:00 UTC)
        );
        assert_eq!(
            Interval::Daily.truncate(timestamp),
            datetime!(2023-03-15 00:00:00 UTC)
        );
        // 2023-03-15 is a Wednesday.
        assert_eq!(
            Interval::Weekly.truncate(timestamp),
            datetime!(2023-03-13 00:00:00 UTC)
        );
        assert_eq!(
            Interval::Monthly.truncate(timestamp),
            datetime!(2023-03-01 00:00:00 UTC)
        );
        assert_eq!(
            Interval::Yearly.truncate(timestamp),
            datetime!(2023-01-01 00:00:00 UTC)
        );
    }

    #[test]
    fn test_advance_carries_over_month_and_year() {
        assert_eq!(
            Interval::Monthly.advance(datetime!(2022-12-25 08:00:00 UTC)),
            datetime!(2023-01-01 00:00:00 UTC)
        );
        assert_eq!(
            Interval::Yearly.advance(datetime!(2022-06-01 00:00:00 UTC)),
            datetime!(2023-01-01 00:00:00 UTC)
        );
        assert_eq!(
            Interval::Daily.advance(datetime!(2023-02-28 23:59:59 UTC)),
            datetime!(2023-03-01 00:00:00 UTC)
        );
    }

    #[test]
    fn test_candidate_indices_daily() {
        let template = DateTemplate::parse("logs-[YYYY.MM.DD]").unwrap();
        let candidates = candidate_indices(
            &template,
            datetime!(2023-01-30 10:00:00 UTC),
            datetime!(2023-02-01 02:00:00 UTC),
        );
        let names: Vec<&str> = candidates
            .iter()
            .map(|candidate| candidate.index.as_str())
            .collect();
        assert_eq!(
            names,
            ["logs-2023.01.30", "logs-2023.01.31", "logs-2023.02.01"]
        );
        assert_eq!(
            candidates[0].bucket_start,
            datetime!(2023-01-30 00:00:00 UTC)
        );
        assert_eq!(candidates[0].bucket_end, datetime!(2023-01-31 00:00:00 UTC));
    }

    #[test]
    fn test_candidate_indices_empty_cases() {
        let template = DateTemplate::parse("logs-[YYYY.MM.DD]").unwrap();
        let candidates = candidate_indices(
            &template,
            datetime!(2023-02-01 00:00:00 UTC),
            datetime!(2023-01-01 00:00:00 UTC),
        );
        assert!(candidates.is_empty());

        let undated = DateTemplate::parse("logs-*").unwrap();
        let candidates = candidate_indices(
            &undated,
            datetime!(2023-01-01 00:00:00 UTC),
            datetime!(2023-02-01 00:00:00 UTC),
        );
        assert!(candidates.is_empty());
    }

    #[test]
    fn test_interval_serde_names() {
        let interval: Interval = serde_json::from_str("\"weekly\"").unwrap();
        assert_eq!(interval, Interval::Weekly);
        assert_eq!(serde_json::to_string(&Interval::Hourly).unwrap(), "\"hourly\"");
    }
}
