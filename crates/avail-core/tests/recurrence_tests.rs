//! Recurrence predicate vectors.
//!
//! The rrule evaluator answers point-in-time membership for a pragmatic
//! subset of RFC 5545: FREQ, INTERVAL (anchored at DTSTART), UNTIL
//! (inclusive), BYMONTH, BYMONTHDAY, BYDAY (with ordinals), BYHOUR,
//! BYMINUTE, BYSECOND. These vectors pin down the subset's semantics,
//! the date-time parse chain, and totality on malformed input.

use avail_core::evaluators::{RRuleEvaluator, RuleEvaluator};
use avail_core::{ConfigMap, SubjectProfile};
use chrono::{DateTime, TimeZone};
use chrono_tz::Tz;
use serde_json::{json, Value};

// ── Helpers ─────────────────────────────────────────────────────────────────

fn cfg(value: Value) -> ConfigMap {
    value.as_object().expect("config fixture must be an object").clone()
}

fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Tz> {
    Tz::UTC.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
}

fn rule_matches(rrule: &str, at: DateTime<Tz>) -> bool {
    RRuleEvaluator
        .matches(&cfg(json!({ "rrule": rrule })), &at, &SubjectProfile::new("Listing"))
        .unwrap()
}

// ── FREQ ────────────────────────────────────────────────────────────────────

#[test]
fn daily_with_no_constraints_always_matches() {
    for day in [1, 2, 15, 28] {
        assert!(rule_matches("FREQ=DAILY", utc(2025, 6, day, 9, 30, 0)));
    }
    assert!(rule_matches("FREQ=DAILY", utc(1999, 1, 1, 0, 0, 0)));
}

#[test]
fn weekly_with_no_constraints_always_matches() {
    // Weekday filtering is BYDAY's job; bare WEEKLY passes everything.
    assert!(rule_matches("FREQ=WEEKLY", utc(2025, 6, 4, 12, 0, 0)));
    assert!(rule_matches("FREQ=WEEKLY", utc(2025, 6, 7, 12, 0, 0)));
}

#[test]
fn missing_or_unknown_freq_never_matches() {
    let at = utc(2025, 6, 4, 12, 0, 0);
    assert!(!rule_matches("", at));
    assert!(!rule_matches("INTERVAL=1", at));
    assert!(!rule_matches("FREQ=HOURLY", at));
    assert!(!rule_matches("FREQ=SECONDLY", at));
    assert!(!rule_matches("FREQ=sometimes", at));
}

#[test]
fn keys_are_case_insensitive() {
    let at = utc(2025, 6, 4, 12, 0, 0);
    assert!(rule_matches("freq=DAILY", at));
    assert!(rule_matches("Freq=daily", at));
}

#[test]
fn malformed_and_unknown_pairs_are_ignored() {
    let at = utc(2025, 6, 4, 12, 0, 0);
    // Bare fragments, empty keys, and unknown keys do not poison the rule.
    assert!(rule_matches("FREQ=DAILY;;FOO;=BAR", at));
    assert!(rule_matches("FREQ=DAILY;BYSETPOS=1;WKST=MO", at));
}

#[test]
fn missing_or_non_string_rrule_config_never_matches() {
    let eval = RRuleEvaluator;
    let subject = SubjectProfile::new("Listing");
    let at = utc(2025, 6, 4, 12, 0, 0);
    assert!(!eval.matches(&cfg(json!({})), &at, &subject).unwrap());
    assert!(!eval
        .matches(&cfg(json!({ "rrule": 42 })), &at, &subject)
        .unwrap());
}

// ── UNTIL ───────────────────────────────────────────────────────────────────

#[test]
fn until_is_an_inclusive_bound() {
    let rule = "FREQ=DAILY;UNTIL=20250630T120000Z";
    assert!(rule_matches(rule, utc(2025, 6, 30, 12, 0, 0)));
    assert!(!rule_matches(rule, utc(2025, 6, 30, 12, 0, 1)));
    assert!(rule_matches(rule, utc(2025, 6, 1, 0, 0, 0)));
}

#[test]
fn until_accepts_the_whole_parse_chain() {
    let inside = utc(2025, 6, 15, 12, 0, 0);
    let outside = utc(2025, 7, 15, 12, 0, 0);
    for until in [
        "20250630T235959Z",
        "20250630T235959",
        "20250701",
        "2025-06-30T23:59:59+00:00",
        "2025-06-30T23:59:59",
        "2025-07-01",
    ] {
        let rule = format!("FREQ=DAILY;UNTIL={until}");
        assert!(rule_matches(&rule, inside), "UNTIL={until} should admit June");
        assert!(!rule_matches(&rule, outside), "UNTIL={until} should exclude mid-July");
    }
}

#[test]
fn until_falls_back_to_lenient_layouts() {
    let inside = utc(2025, 6, 15, 12, 0, 0);
    for until in ["2025/07/01", "30 Jun 2025", "June 30, 2025"] {
        let rule = format!("FREQ=DAILY;UNTIL={until}");
        assert!(rule_matches(&rule, inside), "UNTIL={until} should parse leniently");
    }
}

#[test]
fn unparseable_until_never_matches() {
    assert!(!rule_matches(
        "FREQ=DAILY;UNTIL=whenever",
        utc(2025, 6, 15, 12, 0, 0)
    ));
}

// ── INTERVAL ────────────────────────────────────────────────────────────────

#[test]
fn daily_interval_two_matches_every_other_day() {
    let rule = "FREQ=DAILY;INTERVAL=2;DTSTART=2025-06-01";
    assert!(rule_matches(rule, utc(2025, 6, 1, 8, 0, 0)));
    assert!(!rule_matches(rule, utc(2025, 6, 2, 8, 0, 0)));
    assert!(rule_matches(rule, utc(2025, 6, 3, 8, 0, 0)));
    assert!(rule_matches(rule, utc(2025, 6, 29, 23, 0, 0)));
}

#[test]
fn interval_above_one_requires_dtstart() {
    assert!(!rule_matches("FREQ=DAILY;INTERVAL=2", utc(2025, 6, 1, 8, 0, 0)));
}

#[test]
fn moments_before_dtstart_never_match_with_interval() {
    let rule = "FREQ=DAILY;INTERVAL=2;DTSTART=2025-06-01";
    assert!(!rule_matches(rule, utc(2025, 5, 30, 8, 0, 0)));
}

#[test]
fn interval_one_needs_no_anchor() {
    assert!(rule_matches("FREQ=DAILY;INTERVAL=1", utc(2025, 6, 4, 8, 0, 0)));
}

#[test]
fn invalid_interval_never_matches() {
    let at = utc(2025, 6, 4, 8, 0, 0);
    assert!(!rule_matches("FREQ=DAILY;INTERVAL=0", at));
    assert!(!rule_matches("FREQ=DAILY;INTERVAL=-2", at));
    assert!(!rule_matches("FREQ=DAILY;INTERVAL=two", at));
}

#[test]
fn biweekly_tue_thu_alternating_weeks() {
    // Anchored on Tue 2026-01-06. Week of Jan 5 and week of Jan 19 match;
    // the weeks between do not.
    let rule = "FREQ=WEEKLY;INTERVAL=2;BYDAY=TU,TH;DTSTART=20260106T100000";
    assert!(rule_matches(rule, utc(2026, 1, 6, 10, 0, 0)));
    assert!(rule_matches(rule, utc(2026, 1, 8, 10, 0, 0)));
    assert!(!rule_matches(rule, utc(2026, 1, 13, 10, 0, 0)));
    assert!(!rule_matches(rule, utc(2026, 1, 15, 10, 0, 0)));
    assert!(rule_matches(rule, utc(2026, 1, 20, 10, 0, 0)));
    assert!(rule_matches(rule, utc(2026, 1, 22, 10, 0, 0)));
    // Right weekday, wrong week parity.
    assert!(!rule_matches(rule, utc(2026, 1, 27, 10, 0, 0)));
}

#[test]
fn monthly_interval_two_counts_whole_months() {
    let rule = "FREQ=MONTHLY;INTERVAL=2;DTSTART=20250115T000000";
    assert!(rule_matches(rule, utc(2025, 1, 15, 12, 0, 0)));
    assert!(!rule_matches(rule, utc(2025, 2, 15, 12, 0, 0)));
    assert!(rule_matches(rule, utc(2025, 3, 15, 12, 0, 0)));
    assert!(rule_matches(rule, utc(2025, 11, 15, 12, 0, 0)));
    // Aligned month but wrong day of month fails the anchor-day check.
    assert!(!rule_matches(rule, utc(2025, 3, 16, 12, 0, 0)));
}

#[test]
fn yearly_interval_two_counts_years() {
    let rule = "FREQ=YEARLY;INTERVAL=2;DTSTART=20240601T000000";
    assert!(rule_matches(rule, utc(2024, 6, 1, 12, 0, 0)));
    assert!(!rule_matches(rule, utc(2025, 6, 1, 12, 0, 0)));
    assert!(rule_matches(rule, utc(2026, 6, 1, 12, 0, 0)));
}

// ── BYMONTH / BYMONTHDAY ────────────────────────────────────────────────────

#[test]
fn bymonth_filters_months() {
    let rule = "FREQ=YEARLY;BYMONTH=6,7,8";
    assert!(rule_matches(rule, utc(2025, 7, 10, 12, 0, 0)));
    assert!(!rule_matches(rule, utc(2025, 9, 10, 12, 0, 0)));
}

#[test]
fn out_of_domain_bymonth_poisons_the_rule() {
    let at = utc(2025, 6, 10, 12, 0, 0);
    assert!(!rule_matches("FREQ=YEARLY;BYMONTH=13", at));
    assert!(!rule_matches("FREQ=YEARLY;BYMONTH=6,0", at));
    assert!(!rule_matches("FREQ=YEARLY;BYMONTH=June", at));
}

#[test]
fn bymonthday_positive_entries() {
    let rule = "FREQ=MONTHLY;BYMONTHDAY=1,15";
    assert!(rule_matches(rule, utc(2025, 6, 1, 12, 0, 0)));
    assert!(rule_matches(rule, utc(2025, 6, 15, 12, 0, 0)));
    assert!(!rule_matches(rule, utc(2025, 6, 14, 12, 0, 0)));
}

#[test]
fn bymonthday_negative_counts_from_month_end() {
    let rule = "FREQ=MONTHLY;BYMONTHDAY=-1";
    assert!(rule_matches(rule, utc(2025, 1, 31, 12, 0, 0)));
    assert!(rule_matches(rule, utc(2025, 2, 28, 12, 0, 0)));
    assert!(rule_matches(rule, utc(2024, 2, 29, 12, 0, 0))); // leap year
    assert!(!rule_matches(rule, utc(2024, 2, 28, 12, 0, 0)));
    assert!(rule_matches(rule, utc(2025, 4, 30, 12, 0, 0)));
}

#[test]
fn bymonthday_zero_is_invalid() {
    assert!(!rule_matches("FREQ=MONTHLY;BYMONTHDAY=0", utc(2025, 6, 15, 12, 0, 0)));
    assert!(!rule_matches("FREQ=MONTHLY;BYMONTHDAY=32", utc(2025, 6, 15, 12, 0, 0)));
}

// ── BYDAY ───────────────────────────────────────────────────────────────────

#[test]
fn byday_plain_weekdays() {
    let rule = "FREQ=WEEKLY;BYDAY=MO,WE,FR";
    assert!(rule_matches(rule, utc(2025, 6, 2, 12, 0, 0))); // Monday
    assert!(rule_matches(rule, utc(2025, 6, 4, 12, 0, 0))); // Wednesday
    assert!(!rule_matches(rule, utc(2025, 6, 3, 12, 0, 0))); // Tuesday
}

#[test]
fn byday_ordinal_is_ignored_for_weekly() {
    // Ordinals have no containing period for DAILY/WEEKLY; the weekday
    // still filters.
    let rule = "FREQ=WEEKLY;BYDAY=2MO";
    assert!(rule_matches(rule, utc(2025, 6, 2, 12, 0, 0)));
    assert!(rule_matches(rule, utc(2025, 6, 9, 12, 0, 0)));
    assert!(!rule_matches(rule, utc(2025, 6, 3, 12, 0, 0)));
}

#[test]
fn monthly_second_monday() {
    let rule = "FREQ=MONTHLY;BYDAY=2MO";
    assert!(rule_matches(rule, utc(2025, 1, 13, 12, 0, 0)));
    assert!(!rule_matches(rule, utc(2025, 1, 6, 12, 0, 0)));
    assert!(!rule_matches(rule, utc(2025, 1, 20, 12, 0, 0)));
    assert!(rule_matches(rule, utc(2025, 2, 10, 12, 0, 0)));
}

#[test]
fn monthly_last_friday() {
    let rule = "FREQ=MONTHLY;BYDAY=-1FR";
    assert!(rule_matches(rule, utc(2025, 6, 27, 12, 0, 0)));
    assert!(!rule_matches(rule, utc(2025, 6, 20, 12, 0, 0)));
    assert!(rule_matches(rule, utc(2025, 8, 29, 12, 0, 0)));
}

#[test]
fn yearly_ordinal_byday_counts_within_the_year() {
    // Second Monday of the year.
    let rule = "FREQ=YEARLY;BYDAY=2MO";
    assert!(rule_matches(rule, utc(2025, 1, 13, 12, 0, 0)));
    assert!(!rule_matches(rule, utc(2025, 1, 6, 12, 0, 0)));
    assert!(!rule_matches(rule, utc(2025, 2, 10, 12, 0, 0)));

    // Last Monday of the year.
    let rule = "FREQ=YEARLY;BYDAY=-1MO";
    assert!(rule_matches(rule, utc(2025, 12, 29, 12, 0, 0)));
    assert!(!rule_matches(rule, utc(2025, 12, 22, 12, 0, 0)));
}

#[test]
fn invalid_byday_entries_poison_the_rule() {
    let at = utc(2025, 6, 2, 12, 0, 0);
    assert!(!rule_matches("FREQ=WEEKLY;BYDAY=MONDAY", at));
    assert!(!rule_matches("FREQ=WEEKLY;BYDAY=0MO", at));
    assert!(!rule_matches("FREQ=WEEKLY;BYDAY=MO,XX", at));
}

// ── BYHOUR / BYMINUTE / BYSECOND ────────────────────────────────────────────

#[test]
fn clock_field_filters() {
    let rule = "FREQ=DAILY;BYHOUR=9,17";
    assert!(rule_matches(rule, utc(2025, 6, 4, 9, 45, 0)));
    assert!(rule_matches(rule, utc(2025, 6, 4, 17, 0, 0)));
    assert!(!rule_matches(rule, utc(2025, 6, 4, 10, 0, 0)));

    let rule = "FREQ=DAILY;BYHOUR=9;BYMINUTE=0,30;BYSECOND=0";
    assert!(rule_matches(rule, utc(2025, 6, 4, 9, 30, 0)));
    assert!(!rule_matches(rule, utc(2025, 6, 4, 9, 30, 5)));
    assert!(!rule_matches(rule, utc(2025, 6, 4, 9, 15, 0)));
}

#[test]
fn out_of_domain_clock_fields_poison_the_rule() {
    let at = utc(2025, 6, 4, 9, 0, 0);
    assert!(!rule_matches("FREQ=DAILY;BYHOUR=24", at));
    assert!(!rule_matches("FREQ=DAILY;BYMINUTE=60", at));
    assert!(!rule_matches("FREQ=DAILY;BYSECOND=61", at));
}

// ── Anchor-day closing checks ───────────────────────────────────────────────

#[test]
fn monthly_without_day_constraint_anchors_on_dtstart() {
    let rule = "FREQ=MONTHLY;DTSTART=20250110T000000";
    assert!(rule_matches(rule, utc(2025, 3, 10, 12, 0, 0)));
    assert!(!rule_matches(rule, utc(2025, 3, 11, 12, 0, 0)));
}

#[test]
fn monthly_without_day_constraint_and_no_dtstart_never_matches() {
    assert!(!rule_matches("FREQ=MONTHLY", utc(2025, 3, 10, 12, 0, 0)));
}

#[test]
fn yearly_without_constraints_anchors_on_dtstart_month_and_day() {
    let rule = "FREQ=YEARLY;DTSTART=20240601T000000";
    assert!(rule_matches(rule, utc(2026, 6, 1, 12, 0, 0)));
    assert!(!rule_matches(rule, utc(2026, 6, 2, 12, 0, 0)));
    assert!(!rule_matches(rule, utc(2026, 7, 1, 12, 0, 0)));
}

#[test]
fn yearly_without_constraints_and_no_dtstart_never_matches() {
    assert!(!rule_matches("FREQ=YEARLY", utc(2025, 6, 1, 12, 0, 0)));
}

#[test]
fn byweekno_and_byyearday_are_recognized_but_not_enforced() {
    // Their presence satisfies the yearly anchor requirement; the values
    // themselves are never checked.
    assert!(rule_matches("FREQ=YEARLY;BYWEEKNO=1", utc(2025, 8, 20, 12, 0, 0)));
    assert!(rule_matches("FREQ=YEARLY;BYYEARDAY=200", utc(2025, 1, 2, 12, 0, 0)));
}

// ── Zone override ───────────────────────────────────────────────────────────

#[test]
fn tz_override_shifts_the_wall_clock() {
    let eval = RRuleEvaluator;
    let subject = SubjectProfile::new("Listing");
    // 13:00 UTC on 2025-06-04 is 09:00 in New York (EDT).
    let at = utc(2025, 6, 4, 13, 0, 0);

    let with_tz = cfg(json!({ "rrule": "FREQ=DAILY;BYHOUR=9", "tz": "America/New_York" }));
    assert!(eval.matches(&with_tz, &at, &subject).unwrap());

    let without_tz = cfg(json!({ "rrule": "FREQ=DAILY;BYHOUR=9" }));
    assert!(!eval.matches(&without_tz, &at, &subject).unwrap());
}

#[test]
fn invalid_tz_override_never_matches() {
    let eval = RRuleEvaluator;
    let subject = SubjectProfile::new("Listing");
    let config = cfg(json!({ "rrule": "FREQ=DAILY", "tz": "Not/AZone" }));
    assert!(!eval
        .matches(&config, &utc(2025, 6, 4, 12, 0, 0), &subject)
        .unwrap());
}
