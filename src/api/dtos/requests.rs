use chrono::NaiveDate;
use serde::Deserialize;

#[derive(Deserialize)]
pub struct CreateBusinessRequest {
    pub name: String,
    pub slug: String,
    pub timezone: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateBusinessRequest {
    pub name: Option<String>,
    pub timezone: Option<String>,
    pub assignment_policy: Option<String>,
    pub hours_start: Option<i32>,
    pub hours_end: Option<i32>,
}

#[derive(Deserialize)]
pub struct CreateCleanerRequest {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub rating: Option<i32>,
}

#[derive(Deserialize)]
pub struct UpdateCleanerRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub rating: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Deserialize)]
pub struct WeekdayRuleRequest {
    pub weekday: String,
    pub start: Option<String>,
    pub end: Option<String>,
    #[serde(default)]
    pub off_day: bool,
}

#[derive(Deserialize)]
pub struct WeeklyScheduleRequest {
    pub days: Vec<WeekdayRuleRequest>,
}

#[derive(Deserialize)]
pub struct ExceptionRequest {
    pub date: NaiveDate,
    pub start: Option<String>,
    pub end: Option<String>,
    #[serde(default)]
    pub off_day: bool,
}

#[derive(Deserialize)]
pub struct CheckAvailabilityRequest {
    pub datetime: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateBookingRequest {
    pub date: String,
    pub time: String,
    pub duration_min: Option<i32>,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
}
