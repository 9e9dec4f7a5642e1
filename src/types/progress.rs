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

use serde::Serialize;

use crate::types::ids::CardId;
use crate::types::ids::UserId;
use crate::types::status::Status;
use crate::types::timestamp::Timestamp;

/// A learner's scheduling state for a single card. There is at most one per
/// (user, card) pair, created the first time the user grades the card.
#[derive(Clone, PartialEq, Debug, Serialize)]
pub struct ProgressRecord {
    pub user_id: UserId,
    pub card_id: CardId,
    /// Interval growth multiplier. Never below 1.3.
    pub ease_factor: f64,
    /// Days until the next review. Zero means never scheduled.
    pub interval: u32,
    /// When the card becomes due.
    pub next_review_date: Timestamp,
    /// Number of grading events applied.
    pub review_count: u32,
    /// Number of grading events that passed.
    pub correct_count: u32,
    pub last_reviewed_at: Timestamp,
    pub status: Status,
}

/// What the scheduler knows about one card for one user.
#[derive(Clone, PartialEq, Debug)]
pub enum Progress {
    /// The user has never graded this card.
    Unseen,
    /// The user has graded this card at least once.
    Seen(ProgressRecord),
}

impl Progress {
    pub fn record(&self) -> Option<&ProgressRecord> {
        match self {
            Progress::Unseen => None,
            Progress::Seen(record) => Some(record),
        }
    }
}

impl Serialize for Progress {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.record().serialize(serializer)
    }
}

impl From<Option<ProgressRecord>> for Progress {
    fn from(value: Option<ProgressRecord>) -> Self {
        match value {
            Some(record) => Progress::Seen(record),
            None => Progress::Unseen,
        }
    }
}
