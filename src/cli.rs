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

use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;
use serde::Serialize;

use crate::config::Config;
use crate::config::DEFAULT_CONFIG_FILE;
use crate::db::Database;
use crate::error::Fallible;
use crate::select::Batch;
use crate::select::BatchEntry;
use crate::select::NO_CARDS_MESSAGE;
use crate::study::StudyService;
use crate::types::ids::CardId;
use crate::types::ids::DeckId;
use crate::types::ids::UserId;
use crate::types::timestamp::Timestamp;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the configuration file.
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create an empty deck.
    AddDeck {
        #[arg(long)]
        deck: i64,
    },
    /// Add a card to a deck.
    AddCard {
        #[arg(long)]
        deck: i64,
        #[arg(long)]
        card: i64,
    },
    /// Print the next cards to study.
    Next {
        #[arg(long)]
        user: i64,
        #[arg(long)]
        deck: i64,
        /// Maximum number of cards. Defaults to the configured batch size.
        #[arg(long, allow_negative_numbers = true)]
        limit: Option<i64>,
    },
    /// Grade a review of a card.
    Grade {
        #[arg(long)]
        user: i64,
        #[arg(long)]
        card: i64,
        /// From 1 (forgot) to 5 (perfect recall).
        #[arg(long, allow_negative_numbers = true)]
        performance: i64,
        /// Seconds spent on the review.
        #[arg(long)]
        time_spent: Option<u32>,
    },
    /// Print study statistics.
    Stats {
        #[arg(long)]
        user: i64,
        /// Only count cards in this deck.
        #[arg(long)]
        deck: Option<i64>,
        /// Days of history in the activity series.
        #[arg(long)]
        window_days: Option<u32>,
    },
}

pub fn entrypoint() -> Fallible<()> {
    let cli: Cli = Cli::parse();
    let config = Config::load(&cli.config)?;
    log::debug!("Opening database at {}.", config.database);
    let db = Database::new(&config.database)?;
    let service = StudyService::new(db, &config);
    let now = Timestamp::now();
    match cli.command {
        Command::AddDeck { deck } => {
            service.store().add_deck(DeckId::new(deck))?;
            println!("ok");
        }
        Command::AddCard { deck, card } => {
            service
                .store()
                .add_card(DeckId::new(deck), CardId::new(card))?;
            println!("ok");
        }
        Command::Next { user, deck, limit } => {
            let batch = service.next_cards(UserId::new(user), DeckId::new(deck), limit, now)?;
            print_json(&NextCards::from(&batch))?;
        }
        Command::Grade {
            user,
            card,
            performance,
            time_spent,
        } => {
            let outcome = service.grade_card(
                UserId::new(user),
                CardId::new(card),
                performance,
                time_spent,
                now,
            )?;
            print_json(&outcome)?;
        }
        Command::Stats {
            user,
            deck,
            window_days,
        } => {
            let stats =
                service.study_stats(UserId::new(user), deck.map(DeckId::new), window_days, now)?;
            print_json(&stats)?;
        }
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Fallible<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);
    Ok(())
}

#[derive(Serialize)]
struct NextCards<'a> {
    cards: &'a [BatchEntry],
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'static str>,
    due_count: usize,
    new_count: usize,
    learning_count: usize,
}

impl<'a> From<&'a Batch> for NextCards<'a> {
    fn from(batch: &'a Batch) -> Self {
        let counts = batch.counts();
        let message = match batch {
            Batch::EmptyDeck => Some(NO_CARDS_MESSAGE),
            Batch::Cards { .. } => None,
        };
        Self {
            cards: batch.entries(),
            message,
            due_count: counts.due,
            new_count: counts.new,
            learning_count: counts.learning,
        }
    }
}
