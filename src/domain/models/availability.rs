use serde::{Deserialize, Serialize};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

pub const RULE_WEEKLY: &str = "WEEKLY";
pub const RULE_DATE: &str = "DATE";

/// One availability record for a cleaner. A WEEKLY rule is keyed by weekday
/// name ("Monday".."Sunday"); a DATE rule is keyed by a calendar date and
/// overrides the weekly rule for that exact date. An off-day rule suppresses
/// availability regardless of any window.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct AvailabilityRule {
    pub id: String,
    pub cleaner_id: String,
    pub rule_type: String,
    pub weekday: Option<String>,
    pub specific_date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub off_day: bool,
    pub created_at: DateTime<Utc>,
}

impl AvailabilityRule {
    pub fn weekly(cleaner_id: String, weekday: String, start_time: Option<NaiveTime>, end_time: Option<NaiveTime>, off_day: bool) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            cleaner_id,
            rule_type: RULE_WEEKLY.to_string(),
            weekday: Some(weekday),
            specific_date: None,
            start_time,
            end_time,
            off_day,
            created_at: Utc::now(),
        }
    }

    pub fn exception(cleaner_id: String, date: NaiveDate, start_time: Option<NaiveTime>, end_time: Option<NaiveTime>, off_day: bool) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            cleaner_id,
            rule_type: RULE_DATE.to_string(),
            weekday: None,
            specific_date: Some(date),
            start_time,
            end_time,
            off_day,
            created_at: Utc::now(),
        }
    }
}
