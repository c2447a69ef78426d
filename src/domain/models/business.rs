use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use rand::{distributions::Alphanumeric, Rng};

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Business {
    pub id: String,
    pub name: String,
    pub slug: String,
    /// IANA timezone name, e.g. "America/Chicago". All availability windows
    /// are interpreted in this frame.
    pub timezone: String,
    pub assignment_policy: String,
    pub hours_start: i32,
    pub hours_end: i32,
    #[serde(skip_serializing)]
    pub api_secret: String,
    pub created_at: DateTime<Utc>,
}

impl Business {
    pub fn new(name: String, slug: String, timezone: String) -> Self {
        let api_secret: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(48)
            .map(char::from)
            .collect();

        Self {
            id: Uuid::new_v4().to_string(),
            name,
            slug,
            timezone,
            assignment_policy: "all_available".to_string(),
            hours_start: 9,
            hours_end: 17,
            api_secret,
            created_at: Utc::now(),
        }
    }
}
