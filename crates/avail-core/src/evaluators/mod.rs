//! Temporal predicate evaluators.
//!
//! Each evaluator answers one question about a subject-local moment:
//!
//! - [`weekdays`] -- ISO weekday membership
//! - [`months`] -- month-of-year membership
//! - [`blackout`] -- exact calendar date membership
//! - [`time_of_day`] -- inclusive wall-clock window, with overnight wrap
//! - [`date_range`] -- absolute or yearly-recurring date range
//! - [`recurrence`] -- pragmatic point-in-time RRULE subset
//! - [`inventory_gate`] -- threshold gate over an external inventory resolver
//!
//! Evaluators are total with respect to malformed config: missing keys,
//! wrong types, unparseable strings, and out-of-range numbers all yield
//! `Ok(false)`, never an error. A rule that cannot be evaluated must not
//! flip the running effect or break the pipeline. The single exception is
//! `inventory_gate`, whose resolver failures are host-owned and propagate.

pub mod blackout;
pub mod date_range;
pub mod inventory_gate;
pub mod months;
pub mod recurrence;
pub mod time_of_day;
pub mod weekdays;

use chrono::{DateTime, NaiveDate};
use chrono_tz::Tz;
use serde_json::Value;

use crate::error::Result;
use crate::subject::Subject;

pub use blackout::BlackoutDateEvaluator;
pub use date_range::DateRangeEvaluator;
pub use inventory_gate::InventoryGateEvaluator;
pub use months::MonthsOfYearEvaluator;
pub use recurrence::RRuleEvaluator;
pub use time_of_day::TimeOfDayEvaluator;
pub use weekdays::WeekdaysEvaluator;

/// Normalized rule config: string keys to arbitrary JSON values.
pub type ConfigMap = serde_json::Map<String, Value>;

/// A rule predicate.
///
/// `moment` is already in subject-local time; implementations must not
/// mutate it or the subject. Returns are a pure function of the inputs,
/// except for evaluators that report `is_pure() == false`.
pub trait RuleEvaluator: Send + Sync + std::fmt::Debug {
    fn matches(
        &self,
        config: &ConfigMap,
        moment: &DateTime<Tz>,
        subject: &dyn Subject,
    ) -> Result<bool>;

    /// Evaluators that consult external state override this to `false`.
    fn is_pure(&self) -> bool {
        true
    }
}

/// Interpret a JSON value as an integer: native integers, floats with an
/// integral value, and numeric strings all count. Everything else is `None`.
pub(crate) fn value_as_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// Pull `config[key]` as a sequence and keep the entries interpretable as
/// integers, dropping everything else.
pub(crate) fn int_entries(config: &ConfigMap, key: &str) -> Vec<i64> {
    config
        .get(key)
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(value_as_int).collect())
        .unwrap_or_default()
}

/// Strict `YYYY-MM-DD` calendar date parse.
pub(crate) fn parse_iso_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}
