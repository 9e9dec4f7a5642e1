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

//! The spaced-repetition scheduler behind a flashcard study application.
//!
//! The core is three pure operations: [`sm2::advance`] updates a card's
//! schedule after a grading event, [`select::select_batch`] picks the next
//! cards to study, and [`stats::aggregate`] summarizes a learner's progress.
//! [`study::StudyService`] wires them to a store.

pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod select;
pub mod sm2;
pub mod stats;
pub mod store;
pub mod study;
pub mod types;
