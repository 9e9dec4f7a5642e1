// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::fmt::Display;
use std::fmt::Formatter;

use chrono::Days;
use chrono::FixedOffset;
use chrono::NaiveDate;
use chrono::NaiveTime;
use chrono::TimeZone;
use chrono::Utc;
use serde::Serialize;

use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::types::timestamp::Timestamp;

/// A calendar date, with no time zone attached.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Date(NaiveDate);

impl Date {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    pub fn parse(s: &str) -> Fallible<Self> {
        let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map_err(|_| ErrorReport::new(format!("invalid date: {s}")))?;
        Ok(Self(date))
    }

    pub fn minus_days(self, days: u32) -> Self {
        Self(
            self.0
                .checked_sub_days(Days::new(days.into()))
                .unwrap_or(NaiveDate::MIN),
        )
    }

    /// The first instant of this date in the given offset.
    pub fn start_at(self, offset: FixedOffset) -> Timestamp {
        self.instant_at(NaiveTime::MIN, offset)
    }

    /// The last representable instant of this date in the given offset.
    pub fn end_at(self, offset: FixedOffset) -> Timestamp {
        let time = NaiveTime::from_hms_nano_opt(23, 59, 59, 999_999_999).unwrap_or(NaiveTime::MIN);
        self.instant_at(time, offset)
    }

    fn instant_at(self, time: NaiveTime, offset: FixedOffset) -> Timestamp {
        let local = self.0.and_time(time);
        // A fixed offset maps every local time to exactly one instant.
        let ts = offset
            .from_local_datetime(&local)
            .single()
            .map(|ts| ts.with_timezone(&Utc))
            .unwrap_or_else(|| local.and_utc());
        Timestamp::new(ts)
    }
}

impl Display for Date {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl Serialize for Date {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() -> Fallible<()> {
        let date = Date::parse("2025-07-04")?;
        assert_eq!(date.to_string(), "2025-07-04");
        assert!(Date::parse("07/04/2025").is_err());
        Ok(())
    }

    #[test]
    fn test_day_bounds() -> Fallible<()> {
        let date = Date::parse("2025-07-04")?;
        let offset = FixedOffset::west_opt(5 * 3600).unwrap();
        assert_eq!(
            date.start_at(offset),
            Timestamp::parse("2025-07-04T05:00:00Z")?
        );
        assert_eq!(
            date.end_at(offset),
            Timestamp::parse("2025-07-05T04:59:59.999999999Z")?
        );
        Ok(())
    }

    #[test]
    fn test_minus_days() -> Fallible<()> {
        let date = Date::parse("2025-03-02")?;
        assert_eq!(date.minus_days(7), Date::parse("2025-02-23")?);
        Ok(())
    }
}
