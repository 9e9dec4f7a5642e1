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

use std::fs::read_to_string;
use std::path::Path;

use chrono::FixedOffset;
use chrono::Offset;
use chrono::Utc;
use serde::Deserialize;

use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::error::fail;
use crate::select::DEFAULT_LIMIT;
use crate::stats::DEFAULT_WINDOW_DAYS;

pub const DEFAULT_CONFIG_FILE: &str = "flashquiz.toml";

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    database: Option<String>,
    batch_limit: Option<usize>,
    window_days: Option<u32>,
    utc_offset: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// Path to the SQLite database.
    pub database: String,
    /// Batch size when the caller does not ask for one.
    pub batch_limit: usize,
    /// Days of history in the activity series.
    pub window_days: u32,
    /// The time zone in which calendar days are counted.
    pub utc_offset: FixedOffset,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: "flashquiz.db".to_string(),
            batch_limit: DEFAULT_LIMIT,
            window_days: DEFAULT_WINDOW_DAYS,
            utc_offset: Utc.fix(),
        }
    }
}

impl Config {
    /// Load the configuration file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Fallible<Self> {
        if !path.exists() {
            log::debug!("No configuration at {}, using defaults.", path.display());
            return Ok(Self::default());
        }
        let content = read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Fallible<Self> {
        let raw: RawConfig = toml::from_str(content)?;
        let defaults = Self::default();
        let batch_limit = match raw.batch_limit {
            Some(0) => return fail("batch_limit must be positive."),
            Some(limit) => limit,
            None => defaults.batch_limit,
        };
        let utc_offset = match raw.utc_offset {
            Some(offset) => parse_offset(&offset)?,
            None => defaults.utc_offset,
        };
        Ok(Self {
            database: raw.database.unwrap_or(defaults.database),
            batch_limit,
            window_days: raw.window_days.unwrap_or(defaults.window_days),
            utc_offset,
        })
    }
}

/// Parse an offset of the form `+HH:MM` or `-HH:MM`.
pub fn parse_offset(s: &str) -> Fallible<FixedOffset> {
    s.parse::<FixedOffset>()
        .map_err(|_| ErrorReport::new(format!("invalid UTC offset: {s}")))
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_missing_file() -> Fallible<()> {
        let dir = tempdir()?;
        let config = Config::load(&dir.path().join(DEFAULT_CONFIG_FILE))?;
        assert_eq!(config, Config::default());
        Ok(())
    }

    #[test]
    fn test_parse() -> Fallible<()> {
        let config = Config::parse(
            r#"
            database = "/var/lib/flashquiz/study.db"
            batch_limit = 50
            utc_offset = "-05:00"
            "#,
        )?;
        assert_eq!(config.database, "/var/lib/flashquiz/study.db");
        assert_eq!(config.batch_limit, 50);
        assert_eq!(config.window_days, DEFAULT_WINDOW_DAYS);
        assert_eq!(config.utc_offset, FixedOffset::west_opt(5 * 3600).unwrap());
        Ok(())
    }

    #[test]
    fn test_invalid() {
        assert!(Config::parse("batch_limit = 0").is_err());
        assert!(Config::parse("utc_offset = \"Mars/Olympus\"").is_err());
        assert!(Config::parse("colour = \"blue\"").is_err());
    }
}
