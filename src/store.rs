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

//! Interfaces to the storage the scheduler reads from and writes to.

use std::collections::HashMap;
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use crate::error::Fallible;
use crate::types::ids::CardId;
use crate::types::ids::DeckId;
use crate::types::ids::UserId;
use crate::types::progress::ProgressRecord;

/// Knows which cards belong to which deck.
pub trait CardProvider {
    /// Whether the deck exists, whether or not it has cards.
    fn deck_exists(&self, deck_id: DeckId) -> Fallible<bool>;

    /// The cards in a deck, in a stable order. Unknown decks are empty.
    fn deck_cards(&self, deck_id: DeckId) -> Fallible<Vec<CardId>>;

    /// The deck a card belongs to, if the card exists.
    fn card_deck(&self, card_id: CardId) -> Fallible<Option<DeckId>>;
}

/// Holds one progress record per (user, card) pair.
pub trait ProgressStore {
    fn get_progress(&self, user_id: UserId, card_id: CardId) -> Fallible<Option<ProgressRecord>>;

    /// The user's records for the given cards. Cards the user has never
    /// graded are absent from the map.
    fn progress_for(
        &self,
        user_id: UserId,
        card_ids: &[CardId],
    ) -> Fallible<HashMap<CardId, ProgressRecord>>;

    /// All of the user's records.
    fn progress_for_user(&self, user_id: UserId) -> Fallible<Vec<ProgressRecord>>;

    /// Insert or replace the record for its (user, card) pair. The last
    /// write wins.
    fn upsert_progress(&self, record: &ProgressRecord) -> Fallible<()>;
}

/// A store that lives entirely in memory.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryState>>,
}

#[derive(Default)]
struct MemoryState {
    decks: HashSet<DeckId>,
    cards: Vec<(DeckId, CardId)>,
    progress: HashMap<(UserId, CardId), ProgressRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_deck(&self, deck_id: DeckId) {
        self.acquire().decks.insert(deck_id);
    }

    /// Add a card to a deck, creating the deck if needed.
    pub fn add_card(&self, deck_id: DeckId, card_id: CardId) {
        let mut state = self.acquire();
        state.decks.insert(deck_id);
        state.cards.retain(|(_, c)| *c != card_id);
        state.cards.push((deck_id, card_id));
    }

    fn acquire(&self) -> MutexGuard<'_, MemoryState> {
        // A poisoned lock only means another test thread panicked.
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl CardProvider for MemoryStore {
    fn deck_exists(&self, deck_id: DeckId) -> Fallible<bool> {
        Ok(self.acquire().decks.contains(&deck_id))
    }

    fn deck_cards(&self, deck_id: DeckId) -> Fallible<Vec<CardId>> {
        let state = self.acquire();
        Ok(state
            .cards
            .iter()
            .filter(|(d, _)| *d == deck_id)
            .map(|(_, c)| *c)
            .collect())
    }

    fn card_deck(&self, card_id: CardId) -> Fallible<Option<DeckId>> {
        let state = self.acquire();
        Ok(state
            .cards
            .iter()
            .find(|(_, c)| *c == card_id)
            .map(|(d, _)| *d))
    }
}

impl ProgressStore for MemoryStore {
    fn get_progress(&self, user_id: UserId, card_id: CardId) -> Fallible<Option<ProgressRecord>> {
        Ok(self.acquire().progress.get(&(user_id, card_id)).cloned())
    }

    fn progress_for(
        &self,
        user_id: UserId,
        card_ids: &[CardId],
    ) -> Fallible<HashMap<CardId, ProgressRecord>> {
        let state = self.acquire();
        Ok(card_ids
            .iter()
            .filter_map(|card_id| {
                state
                    .progress
                    .get(&(user_id, *card_id))
                    .map(|record| (*card_id, record.clone()))
            })
            .collect())
    }

    fn progress_for_user(&self, user_id: UserId) -> Fallible<Vec<ProgressRecord>> {
        let state = self.acquire();
        let mut records: Vec<ProgressRecord> = state
            .progress
            .values()
            .filter(|record| record.user_id == user_id)
            .cloned()
            .collect();
        records.sort_by_key(|record| record.card_id);
        Ok(records)
    }

    fn upsert_progress(&self, record: &ProgressRecord) -> Fallible<()> {
        let mut state = self.acquire();
        state
            .progress
            .insert((record.user_id, record.card_id), record.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::status::Status;
    use crate::types::timestamp::Timestamp;

    fn record(user: i64, card: i64, interval: u32) -> ProgressRecord {
        let now = Timestamp::parse("2025-05-10T12:00:00Z").unwrap();
        ProgressRecord {
            user_id: UserId::new(user),
            card_id: CardId::new(card),
            ease_factor: 2.5,
            interval,
            next_review_date: now.plus_days(interval),
            review_count: 1,
            correct_count: 1,
            last_reviewed_at: now,
            status: Status::Learning,
        }
    }

    #[test]
    fn test_decks() -> Fallible<()> {
        let store = MemoryStore::new();
        store.add_card(DeckId::new(1), CardId::new(10));
        store.add_card(DeckId::new(1), CardId::new(11));
        store.add_card(DeckId::new(2), CardId::new(20));
        assert_eq!(
            store.deck_cards(DeckId::new(1))?,
            vec![CardId::new(10), CardId::new(11)]
        );
        assert!(store.deck_cards(DeckId::new(3))?.is_empty());
        store.add_deck(DeckId::new(4));
        assert!(store.deck_exists(DeckId::new(4))?);
        assert!(store.deck_exists(DeckId::new(2))?);
        assert!(!store.deck_exists(DeckId::new(3))?);
        assert_eq!(store.card_deck(CardId::new(20))?, Some(DeckId::new(2)));
        assert_eq!(store.card_deck(CardId::new(99))?, None);
        Ok(())
    }

    #[test]
    fn test_last_write_wins() -> Fallible<()> {
        let store = MemoryStore::new();
        store.upsert_progress(&record(1, 10, 1))?;
        store.upsert_progress(&record(1, 10, 6))?;
        store.upsert_progress(&record(2, 10, 15))?;
        let stored = store.get_progress(UserId::new(1), CardId::new(10))?;
        assert_eq!(stored.map(|r| r.interval), Some(6));
        assert_eq!(store.progress_for_user(UserId::new(1))?.len(), 1);
        let map = store.progress_for(UserId::new(2), &[CardId::new(10), CardId::new(11)])?;
        assert_eq!(map.len(), 1);
        Ok(())
    }
}
