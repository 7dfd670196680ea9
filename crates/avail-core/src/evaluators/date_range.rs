//! Absolute and yearly-recurring date range predicates.

use chrono::{DateTime, Datelike};
use chrono_tz::Tz;
use serde_json::Value;

use super::{parse_iso_date, ConfigMap, RuleEvaluator};
use crate::error::Result;
use crate::subject::Subject;

/// Matches when the subject-local calendar date lies inside the configured
/// range.
///
/// `config.kind` selects the semantics; anything other than `"yearly"`
/// (including a missing or non-string value) means `"absolute"`:
///
/// - **absolute**: `from`/`to` are `YYYY-MM-DD`. The range covers
///   `from` start-of-day through `to` end-of-day inclusive. Reversed bounds
///   are swapped.
/// - **yearly**: `from`/`to` are `MM-DD` and the year of the moment is
///   irrelevant. A `from` later in the year than `to` wraps across the year
///   end (e.g. `11-01` .. `02-28`).
#[derive(Debug, Clone, Copy, Default)]
pub struct DateRangeEvaluator;

impl RuleEvaluator for DateRangeEvaluator {
    fn matches(
        &self,
        config: &ConfigMap,
        moment: &DateTime<Tz>,
        _subject: &dyn Subject,
    ) -> Result<bool> {
        let kind = config.get("kind").and_then(Value::as_str).unwrap_or("");
        let matched = match kind {
            "yearly" => yearly_matches(config, moment),
            _ => absolute_matches(config, moment),
        };
        Ok(matched)
    }
}

fn bound_str<'a>(config: &'a ConfigMap, key: &str) -> Option<&'a str> {
    config.get(key).and_then(Value::as_str)
}

fn absolute_matches(config: &ConfigMap, moment: &DateTime<Tz>) -> bool {
    let Some(from) = bound_str(config, "from").and_then(parse_iso_date) else {
        return false;
    };
    let Some(to) = bound_str(config, "to").and_then(parse_iso_date) else {
        return false;
    };
    let (from, to) = if from <= to { (from, to) } else { (to, from) };

    // Comparing local calendar dates is exactly the inclusive
    // start-of-day .. end-of-day range.
    let date = moment.date_naive();
    from <= date && date <= to
}

fn yearly_matches(config: &ConfigMap, moment: &DateTime<Tz>) -> bool {
    let Some(from) = bound_str(config, "from").and_then(month_day_key) else {
        return false;
    };
    let Some(to) = bound_str(config, "to").and_then(month_day_key) else {
        return false;
    };

    // Encode month and day as month*100 + day, so Dec 31 = 1231 and
    // Jan 1 = 101, then compare on that line with wrap-around.
    let moment_key = moment.month() * 100 + moment.day();
    if from <= to {
        from <= moment_key && moment_key <= to
    } else {
        moment_key >= from || moment_key <= to
    }
}

/// Parse `MM-DD` into the `month*100 + day` encoding.
fn month_day_key(s: &str) -> Option<u32> {
    let (month, day) = s.split_once('-')?;
    let month: u32 = month.trim().parse().ok()?;
    let day: u32 = day.trim().parse().ok()?;
    Some(month * 100 + day)
}
