use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Cleaner {
    pub id: String,
    pub business_id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub rating: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Cleaner {
    pub fn new(business_id: String, name: String, email: String, phone: Option<String>, rating: i32) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            business_id,
            name,
            email,
            phone,
            rating,
            is_active: true,
            created_at: Utc::now(),
        }
    }
}
