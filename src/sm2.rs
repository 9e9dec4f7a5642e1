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

//! The progress state machine: a simplified SM-2 update applied once per
//! grading event.

use crate::types::ids::CardId;
use crate::types::ids::UserId;
use crate::types::performance::Performance;
use crate::types::progress::ProgressRecord;
use crate::types::status::Status;
use crate::types::timestamp::Timestamp;

/// The ease factor of a card that has never been graded.
pub const INITIAL_EASE_FACTOR: f64 = 2.5;

/// The ease factor never drops below this.
pub const MIN_EASE_FACTOR: f64 = 1.3;

/// Intervals longer than this many days promote a card to review.
pub const REVIEW_THRESHOLD_DAYS: u32 = 21;

/// The longest interval ever scheduled, in days.
pub const MAX_INTERVAL_DAYS: u32 = 36500;

/// Compute the record that results from grading a card.
///
/// `existing` is the user's current record for the card, or `None` if they
/// have never graded it. The result is ready to be upserted.
pub fn advance(
    user_id: UserId,
    card_id: CardId,
    existing: Option<&ProgressRecord>,
    performance: Performance,
    now: Timestamp,
) -> ProgressRecord {
    let (ease_factor, interval, review_count, correct_count, status) = match existing {
        Some(record) => {
            debug_assert!(record.user_id == user_id && record.card_id == card_id);
            (
                record.ease_factor,
                record.interval,
                record.review_count,
                record.correct_count,
                record.status,
            )
        }
        None => (INITIAL_EASE_FACTOR, 0, 0, 0, Status::New),
    };

    let review_count = review_count + 1;
    let correct_count = if performance.is_correct() {
        correct_count + 1
    } else {
        correct_count
    };
    let ease_factor = new_ease_factor(ease_factor, performance);
    let (interval, status) = if performance.is_correct() {
        let next = match interval {
            0 => 1,
            1 => 6,
            prior => ((prior as f64 * ease_factor).floor() as u32).min(MAX_INTERVAL_DAYS),
        };
        let status = if status == Status::New {
            Status::Learning
        } else if next > REVIEW_THRESHOLD_DAYS {
            Status::Review
        } else {
            status
        };
        (next, status)
    } else {
        // Failure restarts the schedule.
        (1, Status::Learning)
    };

    log::debug!(
        "Card {card_id} for user {user_id}: graded {performance}, interval {interval}d, ease {ease_factor:.2}, {status}."
    );

    ProgressRecord {
        user_id,
        card_id,
        ease_factor,
        interval,
        next_review_date: now.plus_days(interval),
        review_count,
        correct_count,
        last_reviewed_at: now,
        status,
    }
}

/// SM-2 ease update, floored at [`MIN_EASE_FACTOR`].
pub fn new_ease_factor(ease_factor: f64, performance: Performance) -> f64 {
    let q = 5.0 - f64::from(performance.value());
    let ef = ease_factor + (0.1 - q * (0.08 + q * 0.02));
    ef.max(MIN_EASE_FACTOR)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grade(value: u8) -> Performance {
        Performance::try_from(value).unwrap()
    }

    fn ts(s: &str) -> Timestamp {
        Timestamp::parse(s).unwrap()
    }

    fn record(ease_factor: f64, interval: u32, status: Status) -> ProgressRecord {
        ProgressRecord {
            user_id: UserId::new(1),
            card_id: CardId::new(10),
            ease_factor,
            interval,
            next_review_date: ts("2025-01-01T00:00:00Z"),
            review_count: 3,
            correct_count: 2,
            last_reviewed_at: ts("2024-12-26T00:00:00Z"),
            status,
        }
    }

    fn apply(existing: Option<&ProgressRecord>, value: u8) -> ProgressRecord {
        advance(
            UserId::new(1),
            CardId::new(10),
            existing,
            grade(value),
            ts("2025-01-02T09:00:00Z"),
        )
    }

    #[test]
    fn test_ease_factor_deltas() {
        let deltas = [(5, 0.1), (4, 0.0), (3, -0.14), (2, -0.32), (1, -0.54)];
        for (value, delta) in deltas {
            let ef = new_ease_factor(2.5, grade(value));
            assert!((ef - (2.5 + delta)).abs() < 1e-9, "grade {value}: {ef}");
        }
    }

    #[test]
    fn test_ease_factor_floor() {
        assert_eq!(new_ease_factor(1.3, grade(1)), MIN_EASE_FACTOR);
        assert_eq!(new_ease_factor(1.4, grade(3)), MIN_EASE_FACTOR);
    }

    #[test]
    fn test_first_success() {
        let result = apply(None, 4);
        assert_eq!(result.interval, 1);
        assert_eq!(result.status, Status::Learning);
        assert_eq!(result.review_count, 1);
        assert_eq!(result.correct_count, 1);
        assert!((result.ease_factor - 2.5).abs() < 1e-9);
        assert_eq!(result.last_reviewed_at, ts("2025-01-02T09:00:00Z"));
        assert_eq!(result.next_review_date, ts("2025-01-03T09:00:00Z"));
    }

    #[test]
    fn test_first_failure() {
        let result = apply(None, 1);
        assert_eq!(result.interval, 1);
        assert_eq!(result.status, Status::Learning);
        assert_eq!(result.review_count, 1);
        assert_eq!(result.correct_count, 0);
    }

    #[test]
    fn test_second_success() {
        let first = apply(None, 3);
        let second = apply(Some(&first), 3);
        assert_eq!(second.interval, 6);
        assert_eq!(second.review_count, 2);
        assert_eq!(second.correct_count, 2);
        assert_eq!(second.next_review_date, ts("2025-01-08T09:00:00Z"));
    }

    #[test]
    fn test_growth_stays_learning() {
        let prior = record(2.5, 6, Status::Learning);
        let result = apply(Some(&prior), 5);
        assert!((result.ease_factor - 2.6).abs() < 1e-9);
        assert_eq!(result.interval, 15);
        assert_eq!(result.status, Status::Learning);
    }

    #[test]
    fn test_promotion_to_review() {
        let prior = record(2.5, 15, Status::Learning);
        let result = apply(Some(&prior), 4);
        assert_eq!(result.interval, 37);
        assert_eq!(result.status, Status::Review);
    }

    #[test]
    fn test_review_short_interval_keeps_status() {
        // Status only regresses on failure.
        let prior = record(1.3, 10, Status::Review);
        let result = apply(Some(&prior), 3);
        assert_eq!(result.interval, 13);
        assert_eq!(result.status, Status::Review);
    }

    #[test]
    fn test_failure_regresses_review() {
        let prior = record(2.5, 30, Status::Review);
        let result = apply(Some(&prior), 2);
        assert_eq!(result.interval, 1);
        assert_eq!(result.status, Status::Learning);
        assert_eq!(result.review_count, 4);
        assert_eq!(result.correct_count, 2);
        assert!((result.ease_factor - 2.18).abs() < 1e-9);
    }

    #[test]
    fn test_ease_never_below_floor() {
        let mut current: Option<ProgressRecord> = None;
        for value in [1, 2, 1, 3, 1, 1, 2, 5, 1, 1, 1, 4, 2, 1] {
            let next = apply(current.as_ref(), value);
            assert!(next.ease_factor >= MIN_EASE_FACTOR);
            assert_ne!(next.status, Status::New);
            current = Some(next);
        }
    }

    #[test]
    fn test_interval_is_capped() {
        let mut current: Option<ProgressRecord> = None;
        for _ in 0..25 {
            current = Some(apply(current.as_ref(), 5));
        }
        let last = current.unwrap();
        assert_eq!(last.interval, MAX_INTERVAL_DAYS);
        assert_eq!(last.status, Status::Review);
        assert_eq!(
            last.next_review_date,
            ts("2025-01-02T09:00:00Z").plus_days(MAX_INTERVAL_DAYS)
        );
    }

    #[test]
    fn test_new_status_only_before_first_review() {
        let prior = record(2.5, 0, Status::New);
        let result = apply(Some(&prior), 5);
        assert_eq!(result.status, Status::Learning);
        assert_eq!(result.interval, 1);
    }
}
