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

//! The statistics aggregator: summarizes a learner's progress records.

use std::collections::BTreeMap;

use chrono::FixedOffset;
use serde::Serialize;

use crate::types::date::Date;
use crate::types::progress::ProgressRecord;
use crate::types::status::Status;
use crate::types::timestamp::Timestamp;

/// The default length, in days, of the activity window.
pub const DEFAULT_WINDOW_DAYS: u32 = 7;

#[derive(Clone, PartialEq, Debug, Serialize)]
pub struct StatsSummary {
    pub new_count: usize,
    pub learning_count: usize,
    pub review_count: usize,
    /// Records due on or before the end of today.
    pub due_today: usize,
    /// Sum of review counts.
    pub total_reviewed: u64,
    /// Sum of correct counts.
    pub total_correct: u64,
    /// Percentage of reviews that passed, or zero if there were none.
    pub accuracy: f64,
    /// Days with at least one review, ascending.
    pub daily_activity: Vec<DailyActivity>,
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize)]
pub struct DailyActivity {
    pub date: Date,
    /// Records whose last review fell on this date.
    pub reviews: usize,
}

/// Summarize the given records.
///
/// Calendar days are computed in `offset`. The activity window runs from the
/// start of the day `window_days` days before today up to `now`.
pub fn aggregate(
    records: &[ProgressRecord],
    now: Timestamp,
    window_days: u32,
    offset: FixedOffset,
) -> StatsSummary {
    let today = now.date_at(offset);
    let end_of_today = today.end_at(offset);
    let window_start = today.minus_days(window_days).start_at(offset);

    let mut new_count = 0;
    let mut learning_count = 0;
    let mut review_count = 0;
    let mut due_today = 0;
    let mut total_reviewed: u64 = 0;
    let mut total_correct: u64 = 0;
    let mut activity: BTreeMap<Date, usize> = BTreeMap::new();

    for record in records {
        match record.status {
            Status::New => new_count += 1,
            Status::Learning => learning_count += 1,
            Status::Review => review_count += 1,
        }
        total_reviewed += u64::from(record.review_count);
        total_correct += u64::from(record.correct_count);
        if record.next_review_date <= end_of_today {
            due_today += 1;
        }
        let reviewed_at = record.last_reviewed_at;
        if window_start <= reviewed_at && reviewed_at <= now {
            *activity.entry(reviewed_at.date_at(offset)).or_insert(0) += 1;
        }
    }

    let accuracy = if total_reviewed == 0 {
        0.0
    } else {
        total_correct as f64 / total_reviewed as f64 * 100.0
    };

    let daily_activity = activity
        .into_iter()
        .map(|(date, reviews)| DailyActivity { date, reviews })
        .collect();

    StatsSummary {
        new_count,
        learning_count,
        review_count,
        due_today,
        total_reviewed,
        total_correct,
        accuracy,
        daily_activity,
    }
}
