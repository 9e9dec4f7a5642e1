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

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use rusqlite::Connection;
use rusqlite::Row;
use rusqlite::Transaction;
use rusqlite::config::DbConfig;
use rusqlite::params_from_iter;

use crate::error::Fallible;
use crate::store::CardProvider;
use crate::store::ProgressStore;
use crate::types::ids::CardId;
use crate::types::ids::DeckId;
use crate::types::ids::UserId;
use crate::types::progress::ProgressRecord;

const PROGRESS_COLUMNS: &str = "user_id, card_id, ease_factor, interval, next_review_date, review_count, correct_count, last_reviewed_at, status";

/// A SQLite-backed card and progress store.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn new(database_path: &str) -> Fallible<Self> {
        let conn = Connection::open(database_path)?;
        Self::from_connection(conn)
    }

    pub fn in_memory() -> Fallible<Self> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn)
    }

    fn from_connection(mut conn: Connection) -> Fallible<Self> {
        conn.set_db_config(DbConfig::SQLITE_DBCONFIG_ENABLE_FKEY, true)?;
        {
            let tx = conn.transaction()?;
            if !probe_schema_exists(&tx)? {
                log::debug!("Creating database schema.");
                tx.execute_batch(include_str!("schema.sql"))?;
                tx.commit()?;
            }
        }
        let conn = Arc::new(Mutex::new(conn));
        Ok(Self { conn })
    }

    /// Create a deck. Creating an existing deck does nothing.
    pub fn add_deck(&self, deck_id: DeckId) -> Fallible<()> {
        log::debug!("Adding deck {deck_id}.");
        let mut conn = self.acquire();
        let tx = conn.transaction()?;
        insert_deck(&tx, deck_id)?;
        tx.commit()?;
        Ok(())
    }

    /// Add a card to a deck, creating the deck if needed. If the card
    /// already exists, it is moved.
    pub fn add_card(&self, deck_id: DeckId, card_id: CardId) -> Fallible<()> {
        log::debug!("Adding card {card_id} to deck {deck_id}.");
        let mut conn = self.acquire();
        let tx = conn.transaction()?;
        insert_deck(&tx, deck_id)?;
        let sql = "insert into cards (card_id, deck_id) values (?, ?) on conflict (card_id) do update set deck_id = excluded.deck_id;";
        tx.execute(sql, (card_id, deck_id))?;
        tx.commit()?;
        Ok(())
    }

    fn acquire(&self) -> MutexGuard<'_, Connection> {
        // The connection holds no invariants a panicking holder could break.
        match self.conn.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl CardProvider for Database {
    fn deck_exists(&self, deck_id: DeckId) -> Fallible<bool> {
        let conn = self.acquire();
        let sql = "select count(*) from decks where deck_id = ?;";
        let count: i64 = conn.query_row(sql, [deck_id], |row| row.get(0))?;
        Ok(count > 0)
    }

    fn deck_cards(&self, deck_id: DeckId) -> Fallible<Vec<CardId>> {
        let conn = self.acquire();
        let mut stmt = conn.prepare("select card_id from cards where deck_id = ? order by card_id;")?;
        let mut rows = stmt.query([deck_id])?;
        let mut cards = Vec::new();
        while let Some(row) = rows.next()? {
            cards.push(row.get(0)?);
        }
        Ok(cards)
    }

    fn card_deck(&self, card_id: CardId) -> Fallible<Option<DeckId>> {
        let conn = self.acquire();
        let mut stmt = conn.prepare("select deck_id from cards where card_id = ?;")?;
        let mut rows = stmt.query([card_id])?;
        if let Some(row) = rows.next()? {
            Ok(Some(row.get(0)?))
        } else {
            Ok(None)
        }
    }
}

impl ProgressStore for Database {
    fn get_progress(&self, user_id: UserId, card_id: CardId) -> Fallible<Option<ProgressRecord>> {
        let conn = self.acquire();
        let sql = format!("select {PROGRESS_COLUMNS} from progress where user_id = ? and card_id = ?;");
        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query((user_id, card_id))?;
        if let Some(row) = rows.next()? {
            Ok(Some(read_progress(row)?))
        } else {
            Ok(None)
        }
    }

    fn progress_for(
        &self,
        user_id: UserId,
        card_ids: &[CardId],
    ) -> Fallible<HashMap<CardId, ProgressRecord>> {
        let mut progress = HashMap::new();
        if card_ids.is_empty() {
            return Ok(progress);
        }
        let placeholders = vec!["?"; card_ids.len()].join(", ");
        let sql = format!(
            "select {PROGRESS_COLUMNS} from progress where user_id = ? and card_id in ({placeholders});"
        );
        let params: Vec<i64> = std::iter::once(user_id.get())
            .chain(card_ids.iter().map(|c| c.get()))
            .collect();
        let conn = self.acquire();
        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(params))?;
        while let Some(row) = rows.next()? {
            let record = read_progress(row)?;
            progress.insert(record.card_id, record);
        }
        Ok(progress)
    }

    fn progress_for_user(&self, user_id: UserId) -> Fallible<Vec<ProgressRecord>> {
        let conn = self.acquire();
        let sql = format!("select {PROGRESS_COLUMNS} from progress where user_id = ? order by card_id;");
        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query([user_id])?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(read_progress(row)?);
        }
        Ok(records)
    }

    fn upsert_progress(&self, record: &ProgressRecord) -> Fallible<()> {
        log::debug!(
            "Saving progress for card {} and user {}.",
            record.card_id,
            record.user_id
        );
        let mut conn = self.acquire();
        let tx = conn.transaction()?;
        let sql = format!(
            "insert into progress ({PROGRESS_COLUMNS}) values (?, ?, ?, ?, ?, ?, ?, ?, ?) \
             on conflict (user_id, card_id) do update set \
             ease_factor = excluded.ease_factor, \
             interval = excluded.interval, \
             next_review_date = excluded.next_review_date, \
             review_count = excluded.review_count, \
             correct_count = excluded.correct_count, \
             last_reviewed_at = excluded.last_reviewed_at, \
             status = excluded.status;"
        );
        tx.execute(
            &sql,
            (
                record.user_id,
                record.card_id,
                record.ease_factor,
                record.interval,
                record.next_review_date,
                record.review_count,
                record.correct_count,
                record.last_reviewed_at,
                record.status,
            ),
        )?;
        tx.commit()?;
        Ok(())
    }
}

fn read_progress(row: &Row<'_>) -> Fallible<ProgressRecord> {
    Ok(ProgressRecord {
        user_id: row.get(0)?,
        card_id: row.get(1)?,
        ease_factor: row.get(2)?,
        interval: row.get(3)?,
        next_review_date: row.get(4)?,
        review_count: row.get(5)?,
        correct_count: row.get(6)?,
        last_reviewed_at: row.get(7)?,
        status: row.get(8)?,
    })
}

fn insert_deck(tx: &Transaction, deck_id: DeckId) -> Fallible<()> {
    let sql = "insert into decks (deck_id) values (?) on conflict (deck_id) do nothing;";
    tx.execute(sql, [deck_id])?;
    Ok(())
}

fn probe_schema_exists(tx: &Transaction) -> Fallible<bool> {
    let sql = "select count(*) from sqlite_master where type='table' AND name=?;";
    let count: i64 = tx.query_row(sql, ["cards"], |row| row.get(0))?;
    Ok(count > 0)
}
