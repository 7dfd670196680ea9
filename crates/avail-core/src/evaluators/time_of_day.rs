//! Inclusive wall-clock window predicate, with overnight wrap.

use chrono::{DateTime, Timelike};
use chrono_tz::Tz;
use serde_json::Value;

use super::{ConfigMap, RuleEvaluator};
use crate::error::Result;
use crate::subject::Subject;

/// Matches when the subject-local time of day falls inside the window
/// `config.from` .. `config.to` (both `HH:MM` or `HH:MM:SS`, 24-hour).
///
/// Semantics on the second-of-day line:
/// - `from == to`: the whole day matches.
/// - `from < to`: inclusive on both ends.
/// - `from > to`: overnight wrap; matches at or after `from`, or at or
///   before `to`. The wrap endpoint is included, so a 22:00-06:00 window
///   matches 06:00:00 exactly.
///
/// Missing or invalid bounds never match.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeOfDayEvaluator;

impl RuleEvaluator for TimeOfDayEvaluator {
    fn matches(
        &self,
        config: &ConfigMap,
        moment: &DateTime<Tz>,
        _subject: &dyn Subject,
    ) -> Result<bool> {
        let Some(from) = bound_seconds(config, "from") else {
            return Ok(false);
        };
        let Some(to) = bound_seconds(config, "to") else {
            return Ok(false);
        };
        let now = moment.time().num_seconds_from_midnight();

        let matched = if from == to {
            true
        } else if from < to {
            from <= now && now <= to
        } else {
            now >= from || now <= to
        };
        Ok(matched)
    }
}

fn bound_seconds(config: &ConfigMap, key: &str) -> Option<u32> {
    config
        .get(key)
        .and_then(Value::as_str)
        .and_then(parse_second_of_day)
}

/// Parse `HH:MM` or `HH:MM:SS` into a second-of-day, validating
/// `hour <= 23`, `minute <= 59`, `second <= 59`.
fn parse_second_of_day(s: &str) -> Option<u32> {
    let parts: Vec<&str> = s.split(':').collect();
    let (hour, minute, second) = match parts.as_slice() {
        [h, m] => (h.trim(), m.trim(), "0"),
        [h, m, sec] => (h.trim(), m.trim(), sec.trim()),
        _ => return None,
    };
    let hour: u32 = hour.parse().ok()?;
    let minute: u32 = minute.parse().ok()?;
    let second: u32 = second.parse().ok()?;
    if hour > 23 || minute > 59 || second > 59 {
        return None;
    }
    Some(hour * 3600 + minute * 60 + second)
}
