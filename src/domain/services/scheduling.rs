use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Weekday};
use chrono_tz::Tz;

use crate::domain::models::availability::{AvailabilityRule, RULE_DATE, RULE_WEEKLY};
use crate::domain::models::booking::{Booking, STATUS_CANCELLED};
use crate::domain::models::cleaner::Cleaner;

/// How a business hands out jobs: offer to everyone who is free, or only to
/// the top-rated subset of the roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentPolicy {
    AllAvailable,
    HighRated,
}

impl AssignmentPolicy {
    /// Unknown values fall back to AllAvailable, matching the column default.
    pub fn parse(value: &str) -> Self {
        match value {
            "high_rated" => AssignmentPolicy::HighRated,
            _ => AssignmentPolicy::AllAvailable,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AssignmentPolicy::AllAvailable => "all_available",
            AssignmentPolicy::HighRated => "high_rated",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

pub fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Resolve the working window for one cleaner on a calendar date.
///
/// A DATE rule for that exact date takes precedence over the WEEKLY rule for
/// the weekday; an off-day rule, a missing rule, or a rule without a window
/// all resolve to None. All times are business-local wall clock.
pub fn resolve_window(rules: &[AvailabilityRule], cleaner_id: &str, date: NaiveDate) -> Option<TimeWindow> {
    let exception = rules.iter().find(|r| {
        r.cleaner_id == cleaner_id && r.rule_type == RULE_DATE && r.specific_date == Some(date)
    });

    if let Some(rule) = exception {
        if rule.off_day {
            return None;
        }
        return match (rule.start_time, rule.end_time) {
            (Some(start), Some(end)) => Some(TimeWindow { start, end }),
            _ => None,
        };
    }

    let name = weekday_name(date.weekday());
    let weekly = rules.iter().find(|r| {
        r.cleaner_id == cleaner_id && r.rule_type == RULE_WEEKLY && r.weekday.as_deref() == Some(name)
    })?;

    if weekly.off_day {
        return None;
    }
    match (weekly.start_time, weekly.end_time) {
        (Some(start), Some(end)) => Some(TimeWindow { start, end }),
        _ => None,
    }
}

/// True iff an active booking assigned to this cleaner covers the instant.
///
/// Bookings are stored in UTC and viewed through `tz` before comparison. The
/// interval is half-open: a booking ending exactly at `time` does not
/// conflict, so back-to-back jobs remain schedulable.
pub fn has_conflict(bookings: &[Booking], cleaner_id: &str, date: NaiveDate, time: NaiveTime, tz: Tz) -> bool {
    bookings.iter().any(|b| {
        if b.status == STATUS_CANCELLED || b.cleaner_id.as_deref() != Some(cleaner_id) {
            return false;
        }
        let start = b.start_time.with_timezone(&tz);
        let end = b.end_time.with_timezone(&tz);
        start.date_naive() == date && start.time() <= time && time < end.time()
    })
}

/// Every cleaner from the pool that is free at the given local instant.
///
/// The window check is inclusive on both ends (`start <= t <= end`), unlike
/// the half-open conflict check. The asymmetry is deliberate: a cleaner whose
/// window ends at 17:00 can still take a job starting at 17:00, and a job
/// ending at 11:00 does not block an 11:00 start.
pub fn available_cleaners(
    cleaners: &[Cleaner],
    rules: &[AvailabilityRule],
    bookings: &[Booking],
    date: NaiveDate,
    time: NaiveTime,
    tz: Tz,
) -> Vec<Cleaner> {
    let mut available = Vec::new();
    for cleaner in cleaners {
        let Some(window) = resolve_window(rules, &cleaner.id, date) else {
            continue;
        };
        if time < window.start || time > window.end {
            continue;
        }
        if has_conflict(bookings, &cleaner.id, date, time, tz) {
            continue;
        }
        available.push(cleaner.clone());
    }
    available
}

/// Narrow a roster to the effective candidate pool: active cleaners only,
/// the top-rated subset under the high-rated policy (ties kept), minus any
/// explicit exclusions. An empty roster yields an empty pool rather than a
/// max-over-empty panic.
pub fn select_pool(cleaners: Vec<Cleaner>, policy: AssignmentPolicy, exclude: &[String]) -> Vec<Cleaner> {
    let mut pool: Vec<Cleaner> = cleaners.into_iter().filter(|c| c.is_active).collect();

    if policy == AssignmentPolicy::HighRated
        && let Some(max_rating) = pool.iter().map(|c| c.rating).max() {
        pool.retain(|c| c.rating == max_rating);
    }

    pool.retain(|c| !exclude.contains(&c.id));
    pool
}

/// Deterministic best pick over an availability result: highest rating wins,
/// ties broken by lowest cleaner id. Empty input yields None.
pub fn pick_best(available: &[Cleaner]) -> Option<&Cleaner> {
    available
        .iter()
        .min_by(|a, b| b.rating.cmp(&a.rating).then_with(|| a.id.cmp(&b.id)))
}

#[derive(Debug, Clone, Copy)]
pub struct AlternateSearch {
    pub max_results: usize,
    pub hours_start: u32,
    pub hours_end: u32,
    pub max_attempts: usize,
}

impl Default for AlternateSearch {
    fn default() -> Self {
        Self {
            max_results: 3,
            hours_start: 9,
            hours_end: 17,
            max_attempts: 24,
        }
    }
}

/// Walk forward in whole-hour probes looking for instants where at least one
/// cleaner is free.
///
/// The first probe is the hour after `from`; each probe is clamped into the
/// business-hours window (a probe past the closing hour jumps to the next
/// day's opening hour, which also skips the exhausted remainder of that day).
/// The walk stops after `max_results` hits or `max_attempts` probes, so an
/// empty result means "nothing within the search horizon", not "never
/// available". Output is chronological, business-local wall clock.
pub fn find_alternate_slots(
    cleaners: &[Cleaner],
    rules: &[AvailabilityRule],
    bookings: &[Booking],
    tz: Tz,
    from: NaiveDateTime,
    search: AlternateSearch,
) -> Vec<NaiveDateTime> {
    let mut alternates = Vec::new();
    if search.hours_start >= search.hours_end {
        return alternates;
    }

    let floor = from.date().and_hms_opt(from.hour(), 0, 0).unwrap();
    let mut probe = floor + Duration::hours(1);
    let mut attempts = 0;

    while alternates.len() < search.max_results && attempts < search.max_attempts {
        probe = clamp_into_hours(probe, search.hours_start, search.hours_end);

        if !available_cleaners(cleaners, rules, bookings, probe.date(), probe.time(), tz).is_empty() {
            alternates.push(probe);
        }

        probe += Duration::hours(1);
        attempts += 1;
    }

    alternates
}

fn clamp_into_hours(probe: NaiveDateTime, hours_start: u32, hours_end: u32) -> NaiveDateTime {
    if probe.hour() < hours_start {
        probe.date().and_hms_opt(hours_start, 0, 0).unwrap()
    } else if probe.hour() >= hours_end {
        (probe.date() + Duration::days(1)).and_hms_opt(hours_start, 0, 0).unwrap()
    } else {
        probe
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn cleaner(id: &str, rating: i32, active: bool) -> Cleaner {
        Cleaner {
            id: id.to_string(),
            business_id: "biz".to_string(),
            name: format!("Cleaner {}", id),
            email: format!("{}@example.com", id),
            phone: None,
            rating,
            is_active: active,
            created_at: Utc::now(),
        }
    }

    fn weekly(cleaner_id: &str, weekday: &str, start: &str, end: &str) -> AvailabilityRule {
        AvailabilityRule::weekly(
            cleaner_id.to_string(),
            weekday.to_string(),
            Some(t(start)),
            Some(t(end)),
            false,
        )
    }

    fn day_off(cleaner_id: &str, date: NaiveDate) -> AvailabilityRule {
        AvailabilityRule::exception(cleaner_id.to_string(), date, None, None, true)
    }

    fn booked(cleaner_id: &str, start_utc: &str, end_utc: &str) -> Booking {
        Booking {
            id: uuid::Uuid::new_v4().to_string(),
            business_id: "biz".to_string(),
            cleaner_id: Some(cleaner_id.to_string()),
            customer_name: "C".to_string(),
            customer_email: "c@example.com".to_string(),
            customer_phone: None,
            address: None,
            start_time: NaiveDateTime::parse_from_str(start_utc, "%Y-%m-%d %H:%M").unwrap().and_utc(),
            end_time: NaiveDateTime::parse_from_str(end_utc, "%Y-%m-%d %H:%M").unwrap().and_utc(),
            status: "CONFIRMED".to_string(),
            reference: "REF".to_string(),
            completed_at: None,
            cancelled_at: None,
            created_at: Utc::now(),
        }
    }

    // 2025-06-02 is a Monday.
    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 2).unwrap()
    }

    fn t(hhmm: &str) -> NaiveTime {
        NaiveTime::parse_from_str(hhmm, "%H:%M").unwrap()
    }

    #[test]
    fn date_exception_off_day_beats_weekly_window() {
        let rules = vec![
            weekly("a", "Monday", "09:00", "17:00"),
            day_off("a", monday()),
        ];
        assert_eq!(resolve_window(&rules, "a", monday()), None);
    }

    #[test]
    fn date_exception_window_replaces_weekly_window() {
        let mut rules = vec![weekly("a", "Monday", "09:00", "17:00")];
        rules.push(AvailabilityRule::exception(
            "a".to_string(),
            monday(),
            Some(t("13:00")),
            Some(t("15:00")),
            false,
        ));

        let window = resolve_window(&rules, "a", monday()).unwrap();
        assert_eq!(window.start, t("13:00"));
        assert_eq!(window.end, t("15:00"));
    }

    #[test]
    fn falls_back_to_weekly_rule_without_exception() {
        let rules = vec![weekly("a", "Monday", "09:00", "17:00")];
        let window = resolve_window(&rules, "a", monday()).unwrap();
        assert_eq!(window.start, t("09:00"));

        // Tuesday has no rule at all.
        let tuesday = monday() + Duration::days(1);
        assert_eq!(resolve_window(&rules, "a", tuesday), None);
    }

    #[test]
    fn weekly_off_day_suppresses_window() {
        let rules = vec![AvailabilityRule::weekly(
            "a".to_string(),
            "Monday".to_string(),
            Some(t("09:00")),
            Some(t("17:00")),
            true,
        )];
        assert_eq!(resolve_window(&rules, "a", monday()), None);
    }

    #[test]
    fn conflict_is_exclusive_on_end_boundary() {
        let bookings = vec![booked("a", "2025-06-02 10:00", "2025-06-02 11:00")];
        let tz = chrono_tz::UTC;

        assert!(has_conflict(&bookings, "a", monday(), t("10:00"), tz));
        assert!(has_conflict(&bookings, "a", monday(), t("10:59"), tz));
        assert!(!has_conflict(&bookings, "a", monday(), t("11:00"), tz));
    }

    #[test]
    fn cancelled_bookings_do_not_conflict() {
        let mut booking = booked("a", "2025-06-02 10:00", "2025-06-02 11:00");
        booking.status = "CANCELLED".to_string();
        assert!(!has_conflict(&[booking], "a", monday(), t("10:30"), chrono_tz::UTC));
    }

    #[test]
    fn window_check_is_inclusive_on_both_ends() {
        let cleaners = vec![cleaner("a", 3, true)];
        let rules = vec![weekly("a", "Monday", "09:00", "17:00")];
        let tz = chrono_tz::UTC;

        assert_eq!(available_cleaners(&cleaners, &rules, &[], monday(), t("09:00"), tz).len(), 1);
        assert_eq!(available_cleaners(&cleaners, &rules, &[], monday(), t("17:00"), tz).len(), 1);
        assert!(available_cleaners(&cleaners, &rules, &[], monday(), t("08:59"), tz).is_empty());
        assert!(available_cleaners(&cleaners, &rules, &[], monday(), t("17:01"), tz).is_empty());
    }

    #[test]
    fn booking_conflicts_respect_business_timezone() {
        // 15:00-17:00 UTC is 10:00-12:00 in Chicago (CDT, June).
        let tz: Tz = "America/Chicago".parse().unwrap();
        let cleaners = vec![cleaner("a", 3, true)];
        let rules = vec![weekly("a", "Monday", "09:00", "17:00")];
        let bookings = vec![booked("a", "2025-06-02 15:00", "2025-06-02 17:00")];

        assert!(available_cleaners(&cleaners, &rules, &bookings, monday(), t("10:30"), tz).is_empty());
        assert_eq!(available_cleaners(&cleaners, &rules, &bookings, monday(), t("12:00"), tz).len(), 1);
    }

    #[test]
    fn high_rated_pool_keeps_all_max_rating_ties() {
        let roster = vec![
            cleaner("a", 3, true),
            cleaner("b", 5, true),
            cleaner("c", 5, true),
            cleaner("d", 4, true),
        ];

        let pool = select_pool(roster, AssignmentPolicy::HighRated, &[]);
        let mut ids: Vec<&str> = pool.iter().map(|c| c.id.as_str()).collect();
        ids.sort();
        assert_eq!(ids, vec!["b", "c"]);
    }

    #[test]
    fn empty_roster_yields_empty_pool_without_panicking() {
        assert!(select_pool(vec![], AssignmentPolicy::HighRated, &[]).is_empty());
    }

    #[test]
    fn pool_drops_inactive_and_excluded_cleaners() {
        let roster = vec![
            cleaner("a", 5, false),
            cleaner("b", 4, true),
            cleaner("c", 4, true),
        ];

        let pool = select_pool(roster, AssignmentPolicy::AllAvailable, &["c".to_string()]);
        assert_eq!(pool.len(), 1);
        assert_eq!(pool[0].id, "b");
    }

    #[test]
    fn pick_best_is_deterministic_under_rating_ties() {
        let available = vec![cleaner("a", 4, true), cleaner("c", 5, true), cleaner("b", 5, true)];

        for _ in 0..10 {
            let best = pick_best(&available).unwrap();
            assert_eq!(best.id, "b");
        }
        assert!(pick_best(&[]).is_none());
    }

    #[test]
    fn alternates_stay_within_business_hours_and_result_cap() {
        let cleaners = vec![cleaner("a", 3, true)];
        let rules = vec![
            weekly("a", "Monday", "09:00", "17:00"),
            weekly("a", "Tuesday", "09:00", "17:00"),
        ];

        let from = monday().and_hms_opt(10, 0, 0).unwrap();
        let slots = find_alternate_slots(&cleaners, &rules, &[], chrono_tz::UTC, from, AlternateSearch::default());

        assert_eq!(slots.len(), 3);
        for slot in &slots {
            assert!(slot.hour() >= 9 && slot.hour() < 17);
        }
        assert_eq!(slots[0], monday().and_hms_opt(11, 0, 0).unwrap());
        assert!(slots.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn fully_booked_day_rolls_search_to_next_day() {
        let cleaners = vec![cleaner("a", 3, true)];
        let rules = vec![
            weekly("a", "Monday", "09:00", "17:00"),
            weekly("a", "Tuesday", "09:00", "17:00"),
        ];
        // One booking covering the whole Monday window.
        let bookings = vec![booked("a", "2025-06-02 09:00", "2025-06-02 18:00")];

        let from = monday().and_hms_opt(10, 0, 0).unwrap();
        let slots = find_alternate_slots(&cleaners, &rules, &bookings, chrono_tz::UTC, from, AlternateSearch::default());

        assert!(!slots.is_empty());
        let tuesday = monday() + Duration::days(1);
        assert!(slots.iter().all(|s| s.date() >= tuesday));
        assert_eq!(slots[0], tuesday.and_hms_opt(9, 0, 0).unwrap());
    }

    #[test]
    fn exhausted_probe_budget_returns_empty_not_error() {
        let cleaners = vec![cleaner("a", 3, true)];
        // No rules at all: nobody is ever available.
        let from = monday().and_hms_opt(10, 0, 0).unwrap();
        let slots = find_alternate_slots(&cleaners, &[], &[], chrono_tz::UTC, from, AlternateSearch::default());
        assert!(slots.is_empty());
    }

    #[test]
    fn assignment_policy_parse_defaults_to_all_available() {
        assert_eq!(AssignmentPolicy::parse("high_rated"), AssignmentPolicy::HighRated);
        assert_eq!(AssignmentPolicy::parse("all_available"), AssignmentPolicy::AllAvailable);
        assert_eq!(AssignmentPolicy::parse("something_else"), AssignmentPolicy::AllAvailable);
    }
}
