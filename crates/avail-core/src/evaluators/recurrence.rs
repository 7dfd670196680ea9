//! Pragmatic point-in-time recurrence predicate.
//!
//! Implements a deliberately small subset of RFC 5545 RRULE semantics that
//! answers "does this moment fall on the recurrence" directly, instead of
//! expanding instances. Supported keys: `FREQ`, `INTERVAL`, `DTSTART`,
//! `UNTIL`, `BYMONTH`, `BYMONTHDAY`, `BYDAY`, `BYHOUR`, `BYMINUTE`,
//! `BYSECOND`. `BYWEEKNO` and `BYYEARDAY` are recognized but not enforced;
//! their presence only satisfies the yearly anchor-day requirement.

use std::collections::HashMap;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use serde_json::Value;

use super::{ConfigMap, RuleEvaluator};
use crate::error::Result;
use crate::subject::Subject;

/// Matches when the subject-local moment falls on the recurrence described
/// by `config.rrule` (semicolon-delimited `KEY=VALUE` pairs).
///
/// The optional `config.tz` overrides the evaluation zone for this predicate
/// only; the instant is preserved, only the wall clock changes. A missing or
/// malformed rule string, an unknown `FREQ`, an unparseable date-time, or an
/// out-of-domain `BY*` entry all yield a non-match.
#[derive(Debug, Clone, Copy, Default)]
pub struct RRuleEvaluator;

impl RuleEvaluator for RRuleEvaluator {
    fn matches(
        &self,
        config: &ConfigMap,
        moment: &DateTime<Tz>,
        _subject: &dyn Subject,
    ) -> Result<bool> {
        let Some(text) = config.get("rrule").and_then(Value::as_str) else {
            return Ok(false);
        };
        let local = match config.get("tz").and_then(Value::as_str) {
            Some(name) => match name.parse::<Tz>() {
                Ok(tz) => moment.with_timezone(&tz),
                Err(_) => return Ok(false),
            },
            None => *moment,
        };
        Ok(rule_matches(text, &local))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Freq {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

/// One `BYDAY` entry: an ISO weekday (1 = Monday .. 7 = Sunday) with an
/// optional nonzero ordinal (`2MO` = second Monday, `-1FR` = last Friday).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ByDay {
    ordinal: Option<i32>,
    weekday: u32,
}

#[derive(Debug)]
struct ParsedRule {
    freq: Freq,
    interval: i64,
    dtstart: Option<DateTime<Tz>>,
    until: Option<DateTime<Tz>>,
    by_month: Option<Vec<u32>>,
    by_month_day: Option<Vec<i32>>,
    by_day: Option<Vec<ByDay>>,
    by_hour: Option<Vec<u32>>,
    by_minute: Option<Vec<u32>>,
    by_second: Option<Vec<u32>>,
    has_week_no: bool,
    has_year_day: bool,
}

fn rule_matches(text: &str, moment: &DateTime<Tz>) -> bool {
    let Some(rule) = ParsedRule::parse(text, moment.timezone()) else {
        return false;
    };

    // UNTIL is an inclusive upper bound on the instant.
    if let Some(until) = rule.until {
        if *moment > until {
            return false;
        }
    }

    // An interval above 1 needs an anchor: the moment must be at or after
    // DTSTART and a whole multiple of the frequency unit away from it.
    if rule.interval > 1 {
        let Some(dtstart) = rule.dtstart else {
            return false;
        };
        if *moment < dtstart {
            return false;
        }
        if !interval_aligned(rule.freq, rule.interval, &dtstart, moment) {
            return false;
        }
    }

    if let Some(months) = &rule.by_month {
        if !months.contains(&moment.month()) {
            return false;
        }
    }
    if let Some(month_days) = &rule.by_month_day {
        if !month_days.iter().any(|d| month_day_matches(*d, moment)) {
            return false;
        }
    }
    if let Some(by_days) = &rule.by_day {
        if !by_days.iter().any(|bd| byday_matches(bd, rule.freq, moment)) {
            return false;
        }
    }
    if let Some(hours) = &rule.by_hour {
        if !hours.contains(&moment.hour()) {
            return false;
        }
    }
    if let Some(minutes) = &rule.by_minute {
        if !minutes.contains(&moment.minute()) {
            return false;
        }
    }
    if let Some(seconds) = &rule.by_second {
        if !seconds.contains(&moment.second()) {
            return false;
        }
    }

    // Frequency-specific closing check. DAILY and WEEKLY pass outright;
    // MONTHLY and YEARLY without a BY* day constraint must land on the
    // DTSTART anchor day.
    match rule.freq {
        Freq::Daily | Freq::Weekly => true,
        Freq::Monthly => {
            if rule.by_month_day.is_some() || rule.by_day.is_some() {
                true
            } else {
                match rule.dtstart {
                    Some(dtstart) => moment.day() == dtstart.day(),
                    None => false,
                }
            }
        }
        Freq::Yearly => {
            if rule.by_month.is_some()
                || rule.by_day.is_some()
                || rule.has_week_no
                || rule.has_year_day
            {
                true
            } else {
                match rule.dtstart {
                    Some(dtstart) => {
                        moment.month() == dtstart.month() && moment.day() == dtstart.day()
                    }
                    None => false,
                }
            }
        }
    }
}

impl ParsedRule {
    /// Parse a semicolon-delimited `KEY=VALUE` rule string. Pairs lacking
    /// `=` or with empty keys are ignored; keys are case-insensitive;
    /// unknown keys are ignored. Returns `None` on any malformed supported
    /// value, which the caller reports as a non-match.
    fn parse(text: &str, tz: Tz) -> Option<Self> {
        let mut pairs: HashMap<String, &str> = HashMap::new();
        for part in text.split(';') {
            let Some((key, value)) = part.split_once('=') else {
                continue;
            };
            let key = key.trim().to_ascii_uppercase();
            if key.is_empty() {
                continue;
            }
            pairs.insert(key, value.trim());
        }

        let freq = match pairs.get("FREQ").map(|v| v.to_ascii_uppercase()).as_deref() {
            Some("DAILY") => Freq::Daily,
            Some("WEEKLY") => Freq::Weekly,
            Some("MONTHLY") => Freq::Monthly,
            Some("YEARLY") => Freq::Yearly,
            _ => return None,
        };

        let interval = match pairs.get("INTERVAL") {
            Some(raw) => {
                let n: i64 = raw.parse().ok()?;
                if n < 1 {
                    return None;
                }
                n
            }
            None => 1,
        };

        let dtstart = match pairs.get("DTSTART") {
            Some(&raw) => Some(parse_datetime(raw, tz)?),
            None => None,
        };
        let until = match pairs.get("UNTIL") {
            Some(&raw) => Some(parse_datetime(raw, tz)?),
            None => None,
        };

        let by_month = entry_list(pairs.get("BYMONTH"), |s| {
            s.parse::<u32>().ok().filter(|n| (1..=12).contains(n))
        })?;
        let by_month_day = entry_list(pairs.get("BYMONTHDAY"), |s| {
            s.parse::<i32>()
                .ok()
                .filter(|n| (1..=31).contains(n) || (-31..=-1).contains(n))
        })?;
        let by_day = entry_list(pairs.get("BYDAY"), parse_byday_entry)?;
        let by_hour = entry_list(pairs.get("BYHOUR"), |s| {
            s.parse::<u32>().ok().filter(|n| *n <= 23)
        })?;
        let by_minute = entry_list(pairs.get("BYMINUTE"), |s| {
            s.parse::<u32>().ok().filter(|n| *n <= 59)
        })?;
        let by_second = entry_list(pairs.get("BYSECOND"), |s| {
            s.parse::<u32>().ok().filter(|n| *n <= 59)
        })?;

        Some(ParsedRule {
            freq,
            interval,
            dtstart,
            until,
            by_month,
            by_month_day,
            by_day,
            by_hour,
            by_minute,
            by_second,
            has_week_no: pairs.contains_key("BYWEEKNO"),
            has_year_day: pairs.contains_key("BYYEARDAY"),
        })
    }
}

/// Comma-separated value list for a `BY*` key. Absent key means no
/// constraint (`Some(None)`); any entry the parser rejects poisons the whole
/// rule (`None`).
fn entry_list<T>(
    raw: Option<&&str>,
    parse_entry: impl Fn(&str) -> Option<T>,
) -> Option<Option<Vec<T>>> {
    match raw {
        None => Some(None),
        Some(value) => {
            let mut entries = Vec::new();
            for part in value.split(',') {
                entries.push(parse_entry(part.trim())?);
            }
            Some(Some(entries))
        }
    }
}

fn parse_byday_entry(s: &str) -> Option<ByDay> {
    let s = s.trim().to_ascii_uppercase();
    if !s.is_ascii() {
        return None;
    }
    let split_at = s.len().checked_sub(2)?;
    let (ordinal_part, day_part) = s.split_at(split_at);
    let weekday = match day_part {
        "MO" => 1,
        "TU" => 2,
        "WE" => 3,
        "TH" => 4,
        "FR" => 5,
        "SA" => 6,
        "SU" => 7,
        _ => return None,
    };
    let ordinal = if ordinal_part.is_empty() {
        None
    } else {
        let n: i32 = ordinal_part.parse().ok()?;
        if n == 0 {
            return None;
        }
        Some(n)
    };
    Some(ByDay { ordinal, weekday })
}

/// Parse a `DTSTART`/`UNTIL` date-time, trying in order:
/// `YYYYMMDDTHHMMSSZ` (UTC), `YYYYMMDDTHHMMSS` (local), `YYYYMMDD` (local
/// start of day), RFC 3339 with offset, `YYYY-MM-DDTHH:MM:SS` (local),
/// `YYYY-MM-DD` (local start of day), then a lenient pass over common human
/// layouts. Local readings that fall in a DST gap count as unparseable.
fn parse_datetime(s: &str, tz: Tz) -> Option<DateTime<Tz>> {
    let s = s.trim();

    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y%m%dT%H%M%SZ") {
        return Some(Utc.from_utc_datetime(&naive).with_timezone(&tz));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y%m%dT%H%M%S") {
        return tz.from_local_datetime(&naive).earliest();
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y%m%d") {
        return local_start_of_day(date, tz);
    }
    if let Ok(fixed) = DateTime::parse_from_rfc3339(s) {
        return Some(fixed.with_timezone(&tz));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return tz.from_local_datetime(&naive).earliest();
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return local_start_of_day(date, tz);
    }
    lenient_datetime(s, tz)
}

/// Permissive fallback for date-times that slipped past the canonical
/// layouts: space-separated clocks, slashed dates, spelled-out months.
fn lenient_datetime(s: &str, tz: Tz) -> Option<DateTime<Tz>> {
    const CLOCK_LAYOUTS: &[&str] = &[
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y/%m/%d %H:%M:%S",
        "%Y/%m/%d %H:%M",
    ];
    const DATE_LAYOUTS: &[&str] = &[
        "%Y/%m/%d",
        "%d %b %Y",
        "%d %B %Y",
        "%b %d, %Y",
        "%B %d, %Y",
    ];

    for layout in CLOCK_LAYOUTS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, layout) {
            return tz.from_local_datetime(&naive).earliest();
        }
    }
    for layout in DATE_LAYOUTS {
        if let Ok(date) = NaiveDate::parse_from_str(s, layout) {
            return local_start_of_day(date, tz);
        }
    }
    None
}

fn local_start_of_day(date: NaiveDate, tz: Tz) -> Option<DateTime<Tz>> {
    tz.from_local_datetime(&date.and_hms_opt(0, 0, 0)?).earliest()
}

/// Whole-multiple-of-interval test between DTSTART and the moment, in the
/// frequency's unit: days, week starts, whole months, or years.
fn interval_aligned(freq: Freq, interval: i64, dtstart: &DateTime<Tz>, moment: &DateTime<Tz>) -> bool {
    match freq {
        Freq::Daily => {
            let days = moment
                .date_naive()
                .signed_duration_since(dtstart.date_naive())
                .num_days();
            days % interval == 0
        }
        Freq::Weekly => {
            let weeks = week_start(moment.date_naive())
                .signed_duration_since(week_start(dtstart.date_naive()))
                .num_days()
                / 7;
            weeks % interval == 0
        }
        Freq::Monthly => {
            let months = (i64::from(moment.year()) - i64::from(dtstart.year())) * 12
                + (i64::from(moment.month()) - i64::from(dtstart.month()));
            months % interval == 0
        }
        Freq::Yearly => {
            let years = i64::from(moment.year()) - i64::from(dtstart.year());
            years % interval == 0
        }
    }
}

/// Monday of the ISO week containing `date`.
fn week_start(date: NaiveDate) -> NaiveDate {
    let offset = i64::from(date.weekday().number_from_monday()) - 1;
    date - chrono::Duration::days(offset)
}

fn month_day_matches(entry: i32, moment: &DateTime<Tz>) -> bool {
    let day = moment.day() as i32;
    if entry > 0 {
        day == entry
    } else {
        // Negative entries count back from the end of the month: -1 is the
        // last day, -2 the day before, and so on.
        let last = days_in_month(moment.year(), moment.month()) as i32;
        day == last + entry + 1
    }
}

fn byday_matches(entry: &ByDay, freq: Freq, moment: &DateTime<Tz>) -> bool {
    if moment.weekday().number_from_monday() != entry.weekday {
        return false;
    }
    let Some(ordinal) = entry.ordinal else {
        return true;
    };
    match freq {
        // Ordinals only make sense against a containing period.
        Freq::Daily | Freq::Weekly => true,
        Freq::Monthly => {
            if ordinal > 0 {
                nth_in_period(moment.day()) == ordinal
            } else {
                let remaining = days_in_month(moment.year(), moment.month()) - moment.day();
                nth_from_end(remaining) == -ordinal
            }
        }
        Freq::Yearly => {
            if ordinal > 0 {
                nth_in_period(moment.ordinal()) == ordinal
            } else {
                let remaining = days_in_year(moment.year()) - moment.ordinal();
                nth_from_end(remaining) == -ordinal
            }
        }
    }
}

/// Which occurrence of its weekday a 1-based day index is, counting from
/// the start of the period.
fn nth_in_period(day: u32) -> i32 {
    ((day - 1) / 7 + 1) as i32
}

/// Which occurrence of its weekday a day is, counting from the end of the
/// period, given the number of days remaining after it.
fn nth_from_end(remaining: u32) -> i32 {
    (remaining / 7 + 1) as i32
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|d| d.pred_opt())
        .map(|d| d.day())
        .unwrap_or(31)
}

fn days_in_year(year: i32) -> u32 {
    NaiveDate::from_ymd_opt(year, 12, 31)
        .map(|d| d.ordinal())
        .unwrap_or(365)
}
