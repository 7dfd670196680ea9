//! Exact calendar date predicate for blackout-style overrides.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate};
use chrono_tz::Tz;
use serde_json::Value;

use super::{parse_iso_date, ConfigMap, RuleEvaluator};
use crate::error::Result;
use crate::subject::Subject;

/// Matches when the subject-local calendar date equals any `YYYY-MM-DD`
/// entry in `config.dates`. Time of day is ignored.
///
/// Non-strings, empty strings, and unparseable strings are dropped;
/// duplicates collapse.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlackoutDateEvaluator;

impl RuleEvaluator for BlackoutDateEvaluator {
    fn matches(
        &self,
        config: &ConfigMap,
        moment: &DateTime<Tz>,
        _subject: &dyn Subject,
    ) -> Result<bool> {
        let dates: HashSet<NaiveDate> = config
            .get("dates")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .filter(|s| !s.is_empty())
                    .filter_map(parse_iso_date)
                    .collect()
            })
            .unwrap_or_default();
        if dates.is_empty() {
            return Ok(false);
        }
        Ok(dates.contains(&moment.date_naive()))
    }
}
