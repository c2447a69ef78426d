use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

pub const OFFER_PENDING: &str = "PENDING";
pub const OFFER_ACCEPTED: &str = "ACCEPTED";
pub const OFFER_REJECTED: &str = "REJECTED";

/// A pending proposal of one booking to one cleaner. At most one offer exists
/// per (booking, cleaner) pair; PENDING moves to ACCEPTED or REJECTED and
/// both are terminal.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct JobOffer {
    pub id: String,
    pub booking_id: String,
    pub cleaner_id: String,
    pub status: String,
    pub assignment_type: String,
    pub created_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
}

impl JobOffer {
    pub fn new(booking_id: String, cleaner_id: String, assignment_type: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            booking_id,
            cleaner_id,
            status: OFFER_PENDING.to_string(),
            assignment_type,
            created_at: Utc::now(),
            responded_at: None,
        }
    }
}
