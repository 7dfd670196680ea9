//! ISO weekday membership predicate.

use std::collections::HashSet;

use chrono::{DateTime, Datelike};
use chrono_tz::Tz;

use super::{int_entries, ConfigMap, RuleEvaluator};
use crate::error::Result;
use crate::subject::Subject;

/// Matches when the subject-local ISO weekday (1 = Monday .. 7 = Sunday) is
/// listed in `config.days`.
///
/// Non-numeric entries and values outside 1..=7 are dropped; duplicates
/// collapse; order is irrelevant. An empty effective set never matches.
#[derive(Debug, Clone, Copy, Default)]
pub struct WeekdaysEvaluator;

impl RuleEvaluator for WeekdaysEvaluator {
    fn matches(
        &self,
        config: &ConfigMap,
        moment: &DateTime<Tz>,
        _subject: &dyn Subject,
    ) -> Result<bool> {
        let days: HashSet<i64> = int_entries(config, "days")
            .into_iter()
            .filter(|d| (1..=7).contains(d))
            .collect();
        if days.is_empty() {
            return Ok(false);
        }
        let weekday = i64::from(moment.weekday().number_from_monday());
        Ok(days.contains(&weekday))
    }
}
