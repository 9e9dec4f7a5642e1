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

//! The due-card selector: decides which cards a learner studies next.

use std::collections::HashMap;

use serde::Serialize;

use crate::types::ids::CardId;
use crate::types::progress::Progress;
use crate::types::progress::ProgressRecord;
use crate::types::timestamp::Timestamp;

/// The batch size used when the caller asks for zero or fewer cards.
pub const DEFAULT_LIMIT: usize = 20;

pub const NO_CARDS_MESSAGE: &str = "No cards in this deck";

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    /// Already graded, and the scheduled review date has passed.
    Due,
    /// Never graded.
    New,
    /// Already graded, not yet due.
    Learning,
}

/// A card selected for study.
#[derive(Clone, PartialEq, Debug, Serialize)]
pub struct BatchEntry {
    pub card_id: CardId,
    pub progress: Progress,
    #[serde(rename = "status")]
    pub bucket: Bucket,
}

#[derive(Clone, Copy, PartialEq, Eq, Default, Debug, Serialize)]
pub struct BucketCounts {
    #[serde(rename = "due_count")]
    pub due: usize,
    #[serde(rename = "new_count")]
    pub new: usize,
    #[serde(rename = "learning_count")]
    pub learning: usize,
}

#[derive(Clone, PartialEq, Debug)]
pub enum Batch {
    /// The deck has no cards at all.
    EmptyDeck,
    /// Due cards first, then new cards, at most `limit` in total.
    Cards {
        entries: Vec<BatchEntry>,
        counts: BucketCounts,
    },
}

impl Batch {
    pub fn entries(&self) -> &[BatchEntry] {
        match self {
            Batch::EmptyDeck => &[],
            Batch::Cards { entries, .. } => entries,
        }
    }

    pub fn counts(&self) -> BucketCounts {
        match self {
            Batch::EmptyDeck => BucketCounts::default(),
            Batch::Cards { counts, .. } => *counts,
        }
    }
}

/// Classify a single card.
pub fn classify(progress: Option<&ProgressRecord>, now: Timestamp) -> Bucket {
    match progress {
        None => Bucket::New,
        Some(record) if record.next_review_date <= now => Bucket::Due,
        Some(_) => Bucket::Learning,
    }
}

/// Choose the next cards to study from a deck.
///
/// Cards are taken in the order of `deck_cards` within each bucket. Learning
/// cards are counted but never selected. A `limit` of zero or less means
/// [`DEFAULT_LIMIT`].
pub fn select_batch(
    deck_cards: &[CardId],
    progress_by_card: &HashMap<CardId, ProgressRecord>,
    now: Timestamp,
    limit: i64,
) -> Batch {
    if deck_cards.is_empty() {
        return Batch::EmptyDeck;
    }
    let limit = if limit <= 0 {
        DEFAULT_LIMIT
    } else {
        usize::try_from(limit).unwrap_or(usize::MAX)
    };

    let mut due: Vec<BatchEntry> = Vec::new();
    let mut new: Vec<BatchEntry> = Vec::new();
    let mut counts = BucketCounts::default();
    for card_id in deck_cards {
        let record = progress_by_card.get(card_id);
        let bucket = classify(record, now);
        match bucket {
            Bucket::Due => {
                counts.due += 1;
                due.push(BatchEntry {
                    card_id: *card_id,
                    progress: Progress::from(record.cloned()),
                    bucket,
                });
            }
            Bucket::New => {
                counts.new += 1;
                new.push(BatchEntry {
                    card_id: *card_id,
                    progress: Progress::Unseen,
                    bucket,
                });
            }
            Bucket::Learning => {
                counts.learning += 1;
            }
        }
    }
    log::debug!(
        "Deck of {} cards: {} due, {} new, {} learning.",
        deck_cards.len(),
        counts.due,
        counts.new,
        counts.learning
    );

    let entries: Vec<BatchEntry> = due.into_iter().chain(new).take(limit).collect();
    Batch::Cards { entries, counts }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ids::UserId;
    use crate::types::status::Status;

    fn ts(s: &str) -> Timestamp {
        Timestamp::parse(s).unwrap()
    }

    fn now() -> Timestamp {
        ts("2025-05-10T12:00:00Z")
    }

    fn record(card: i64, next_review_date: &str) -> ProgressRecord {
        ProgressRecord {
            user_id: UserId::new(1),
            card_id: CardId::new(card),
            ease_factor: 2.5,
            interval: 1,
            next_review_date: ts(next_review_date),
            review_count: 1,
            correct_count: 1,
            last_reviewed_at: ts("2025-05-01T12:00:00Z"),
            status: Status::Learning,
        }
    }

    fn cards(ids: &[i64]) -> Vec<CardId> {
        ids.iter().copied().map(CardId::new).collect()
    }

    fn progress(records: Vec<ProgressRecord>) -> HashMap<CardId, ProgressRecord> {
        records.into_iter().map(|r| (r.card_id, r)).collect()
    }

    #[test]
    fn test_all_new() {
        let batch = select_batch(&cards(&[1, 2, 3]), &HashMap::new(), now(), 20);
        assert_eq!(batch.entries().len(), 3);
        assert!(batch.entries().iter().all(|e| e.bucket == Bucket::New));
        assert!(batch.entries().iter().all(|e| e.progress == Progress::Unseen));
        assert_eq!(
            batch.counts(),
            BucketCounts {
                due: 0,
                new: 3,
                learning: 0
            }
        );
    }

    #[test]
    fn test_empty_deck() {
        let batch = select_batch(&[], &HashMap::new(), now(), 20);
        assert_eq!(batch, Batch::EmptyDeck);
        assert!(batch.entries().is_empty());
    }

    #[test]
    fn test_classify_boundary() {
        let at_now = record(1, "2025-05-10T12:00:00Z");
        let later = record(2, "2025-05-10T12:00:01Z");
        assert_eq!(classify(Some(&at_now), now()), Bucket::Due);
        assert_eq!(classify(Some(&later), now()), Bucket::Learning);
        assert_eq!(classify(None, now()), Bucket::New);
    }

    #[test]
    fn test_due_before_new() {
        let deck = cards(&[1, 2, 3, 4, 5]);
        let progress = progress(vec![
            record(2, "2025-05-09T00:00:00Z"),
            record(4, "2025-05-01T00:00:00Z"),
            record(5, "2025-06-01T00:00:00Z"),
        ]);
        let batch = select_batch(&deck, &progress, now(), 20);
        let ids: Vec<i64> = batch.entries().iter().map(|e| e.card_id.get()).collect();
        assert_eq!(ids, vec![2, 4, 1, 3]);
        let buckets: Vec<Bucket> = batch.entries().iter().map(|e| e.bucket).collect();
        assert_eq!(
            buckets,
            vec![Bucket::Due, Bucket::Due, Bucket::New, Bucket::New]
        );
        assert_eq!(
            batch.counts(),
            BucketCounts {
                due: 2,
                new: 2,
                learning: 1
            }
        );
        assert!(matches!(batch.entries()[0].progress, Progress::Seen(_)));
    }

    #[test]
    fn test_limit() {
        let deck = cards(&[1, 2, 3, 4]);
        let progress = progress(vec![record(3, "2025-05-01T00:00:00Z")]);
        let batch = select_batch(&deck, &progress, now(), 2);
        let ids: Vec<i64> = batch.entries().iter().map(|e| e.card_id.get()).collect();
        assert_eq!(ids, vec![3, 1]);
        // Counts cover the whole deck, not just the batch.
        assert_eq!(batch.counts().new, 3);
    }

    #[test]
    fn test_non_positive_limit_uses_default() {
        let deck: Vec<CardId> = (1..=30).map(CardId::new).collect();
        let zero = select_batch(&deck, &HashMap::new(), now(), 0);
        let negative = select_batch(&deck, &HashMap::new(), now(), -5);
        assert_eq!(zero.entries().len(), DEFAULT_LIMIT);
        assert_eq!(negative.entries().len(), DEFAULT_LIMIT);
    }

    #[test]
    fn test_only_learning() {
        let deck = cards(&[1]);
        let progress = progress(vec![record(1, "2025-05-20T00:00:00Z")]);
        let batch = select_batch(&deck, &progress, now(), 20);
        assert_ne!(batch, Batch::EmptyDeck);
        assert!(batch.entries().is_empty());
        assert_eq!(batch.counts().learning, 1);
    }
}
