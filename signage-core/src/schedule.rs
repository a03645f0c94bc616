// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Schedule evaluation
//!
//! Picks the single layout to show at a given instant. Entries are scanned
//! in manifest order and the first window containing the instant wins;
//! overlapping windows are not merged or ranked. When nothing matches the
//! manifest's default layout plays.

use chrono::NaiveDateTime;
use thiserror::Error;
use tracing::warn;

use crate::config::SyncConfig;
use crate::types::{ActiveLayout, ScheduleEntry, ScheduleManifest};

/// Converts CMS wall-clock strings and selects the active layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleEvaluator {
    time_format: String,
    cms_tz_offset: i64,
}

impl ScheduleEvaluator {
    /// Creates an evaluator for times in `time_format`, `cms_tz_offset`
    /// seconds east of UTC.
    pub fn new(time_format: impl Into<String>, cms_tz_offset: i64) -> Self {
        ScheduleEvaluator {
            time_format: time_format.into(),
            cms_tz_offset,
        }
    }

    /// Evaluator using the config's time format and offset.
    pub fn from_config(config: &SyncConfig) -> Self {
        Self::new(config.time_format.clone(), config.cms_tz_offset)
    }

    /// Converts a CMS time string to epoch seconds.
    ///
    /// The string is read as CMS local time, taken as UTC and then shifted
    /// back by the CMS offset.
    pub fn to_epoch(&self, time: &str) -> Result<i64, ScheduleError> {
        let naive = NaiveDateTime::parse_from_str(time.trim(), &self.time_format).map_err(
            |source| ScheduleError::InvalidTime {
                value: time.to_string(),
                source,
            },
        )?;
        Ok(naive.and_utc().timestamp() - self.cms_tz_offset)
    }

    /// Validity window of an entry in epoch seconds.
    pub fn window(&self, entry: &ScheduleEntry) -> Result<(i64, i64), ScheduleError> {
        Ok((self.to_epoch(&entry.from_dt)?, self.to_epoch(&entry.to_dt)?))
    }

    /// Selects the layout active at `now` (epoch seconds).
    ///
    /// Entries with unparseable times are skipped.
    pub fn evaluate(&self, schedule: &ScheduleManifest, now: i64) -> ActiveLayout {
        for entry in &schedule.entries {
            let (from, to) = match self.window(entry) {
                Ok(window) => window,
                Err(e) => {
                    warn!(
                        layout_id = %entry.layout_id,
                        schedule_id = %entry.schedule_id,
                        error = %e,
                        "skipping schedule entry"
                    );
                    continue;
                }
            };

            if from <= now && now <= to {
                return ActiveLayout {
                    layout_id: entry.layout_id.clone(),
                    schedule_id: Some(entry.schedule_id.clone()),
                    window: (from, to),
                };
            }
        }

        ActiveLayout::default_layout(schedule.default_layout.clone())
    }
}

/// Errors from schedule time handling
#[derive(Debug, Error)]
pub enum ScheduleError {
    /// A time string doesn't match the configured format
    #[error("invalid schedule time {value:?}: {source}")]
    InvalidTime {
        /// The offending string
        value: String,
        /// Parser error
        source: chrono::ParseError,
    },
}
