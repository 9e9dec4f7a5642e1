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

//! The study service. Callers pass an authenticated user explicitly; this
//! layer validates input, reads from the stores, runs the scheduler, and
//! writes the result back.

use chrono::FixedOffset;
use serde::Serialize;

use crate::config::Config;
use crate::error::Fallible;
use crate::error::fail;
use crate::select::Batch;
use crate::select::select_batch;
use crate::sm2::advance;
use crate::stats::StatsSummary;
use crate::stats::aggregate;
use crate::store::CardProvider;
use crate::store::ProgressStore;
use crate::types::ids::CardId;
use crate::types::ids::DeckId;
use crate::types::ids::UserId;
use crate::types::performance::Performance;
use crate::types::progress::ProgressRecord;
use crate::types::timestamp::Timestamp;

/// The result of grading a card.
#[derive(Clone, PartialEq, Debug, Serialize)]
pub struct GradeOutcome {
    pub progress: ProgressRecord,
    pub next_review_date: Timestamp,
    pub interval_days: u32,
}

pub struct StudyService<S> {
    store: S,
    batch_limit: usize,
    window_days: u32,
    utc_offset: FixedOffset,
}

impl<S: CardProvider + ProgressStore> StudyService<S> {
    pub fn new(store: S, config: &Config) -> Self {
        Self {
            store,
            batch_limit: config.batch_limit,
            window_days: config.window_days,
            utc_offset: config.utc_offset,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// The next batch of cards for the user to study in a deck.
    pub fn next_cards(
        &self,
        user_id: UserId,
        deck_id: DeckId,
        limit: Option<i64>,
        now: Timestamp,
    ) -> Fallible<Batch> {
        let limit = match limit {
            Some(limit) if limit < 0 => return fail("limit must not be negative."),
            Some(0) | None => self.batch_limit as i64,
            Some(limit) => limit,
        };
        let cards = self.store.deck_cards(deck_id)?;
        if cards.is_empty() {
            log::info!("Deck {deck_id} has no cards.");
            return Ok(Batch::EmptyDeck);
        }
        let progress = self.store.progress_for(user_id, &cards)?;
        Ok(select_batch(&cards, &progress, now, limit))
    }

    /// Record a grading event and persist the updated schedule.
    pub fn grade_card(
        &self,
        user_id: UserId,
        card_id: CardId,
        performance: i64,
        time_spent: Option<u32>,
        now: Timestamp,
    ) -> Fallible<GradeOutcome> {
        let performance = Performance::try_from(performance)?;
        if self.store.card_deck(card_id)?.is_none() {
            return fail(format!("card {card_id} not found."));
        }
        let existing = self.store.get_progress(user_id, card_id)?;
        if let Some(seconds) = time_spent {
            log::debug!("User {user_id} spent {seconds}s on card {card_id}.");
        }
        let progress = advance(user_id, card_id, existing.as_ref(), performance, now);
        self.store.upsert_progress(&progress)?;
        log::info!(
            "Card {card_id} for user {user_id} is next due {}.",
            progress.next_review_date.to_rfc3339()
        );
        Ok(GradeOutcome {
            next_review_date: progress.next_review_date,
            interval_days: progress.interval,
            progress,
        })
    }

    /// Summary statistics for the user, optionally limited to one deck. An
    /// unknown deck counts as no filter.
    pub fn study_stats(
        &self,
        user_id: UserId,
        deck_id: Option<DeckId>,
        window_days: Option<u32>,
        now: Timestamp,
    ) -> Fallible<StatsSummary> {
        let deck_id = match deck_id {
            Some(deck_id) if !self.store.deck_exists(deck_id)? => {
                log::warn!("Deck {deck_id} not found, using all of user {user_id}'s cards.");
                None
            }
            deck_id => deck_id,
        };
        let records: Vec<ProgressRecord> = match deck_id {
            Some(deck_id) => {
                let cards = self.store.deck_cards(deck_id)?;
                let mut records: Vec<ProgressRecord> = self
                    .store
                    .progress_for(user_id, &cards)?
                    .into_values()
                    .collect();
                records.sort_by_key(|record| record.card_id);
                records
            }
            None => self.store.progress_for_user(user_id)?,
        };
        let window_days = window_days.unwrap_or(self.window_days);
        Ok(aggregate(&records, now, window_days, self.utc_offset))
    }
}
