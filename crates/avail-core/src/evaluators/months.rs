//! Month-of-year membership predicate.

use std::collections::HashSet;

use chrono::{DateTime, Datelike};
use chrono_tz::Tz;

use super::{int_entries, ConfigMap, RuleEvaluator};
use crate::error::Result;
use crate::subject::Subject;

/// Matches when the subject-local month (1 = January .. 12 = December) is
/// listed in `config.months`.
///
/// Non-numeric entries are dropped. Out-of-range values are kept but can
/// never equal a real month, so they simply never match. An empty set never
/// matches.
#[derive(Debug, Clone, Copy, Default)]
pub struct MonthsOfYearEvaluator;

impl RuleEvaluator for MonthsOfYearEvaluator {
    fn matches(
        &self,
        config: &ConfigMap,
        moment: &DateTime<Tz>,
        _subject: &dyn Subject,
    ) -> Result<bool> {
        let months: HashSet<i64> = int_entries(config, "months").into_iter().collect();
        if months.is_empty() {
            return Ok(false);
        }
        Ok(months.contains(&i64::from(moment.month())))
    }
}
