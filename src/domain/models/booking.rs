use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use rand::{distributions::Alphanumeric, Rng};

pub const STATUS_CONFIRMED: &str = "CONFIRMED";
pub const STATUS_CANCELLED: &str = "CANCELLED";
pub const STATUS_COMPLETED: &str = "COMPLETED";

/// Times are stored in UTC; the wall-clock view a customer or cleaner sees is
/// derived through the owning business's timezone.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Booking {
    pub id: String,
    pub business_id: String,
    pub cleaner_id: Option<String>,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: Option<String>,
    pub address: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: String,
    pub reference: String,
    pub completed_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

pub struct NewBookingParams {
    pub business_id: String,
    pub start: DateTime<Utc>,
    pub duration_min: i32,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
}

impl Booking {
    pub fn new(params: NewBookingParams) -> Self {
        let end_time = params.start + chrono::Duration::minutes(params.duration_min as i64);

        let reference: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(10)
            .map(char::from)
            .collect();

        Self {
            id: Uuid::new_v4().to_string(),
            business_id: params.business_id,
            cleaner_id: None,
            customer_name: params.name,
            customer_email: params.email,
            customer_phone: params.phone,
            address: params.address,
            start_time: params.start,
            end_time,
            status: STATUS_CONFIRMED.to_string(),
            reference,
            completed_at: None,
            cancelled_at: None,
            created_at: Utc::now(),
        }
    }
}
