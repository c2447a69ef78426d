use crate::domain::models::{
    business::Business, cleaner::Cleaner, availability::AvailabilityRule,
    booking::Booking, offer::JobOffer, job::Job, notify_log::NotifyLog,
};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

#[async_trait]
pub trait BusinessRepository: Send + Sync {
    async fn create(&self, business: &Business) -> Result<Business, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Business>, AppError>;
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Business>, AppError>;
    async fn update(&self, business: &Business) -> Result<Business, AppError>;
}

#[async_trait]
pub trait CleanerRepository: Send + Sync {
    async fn create(&self, cleaner: &Cleaner) -> Result<Cleaner, AppError>;
    async fn find_by_id(&self, business_id: &str, id: &str) -> Result<Option<Cleaner>, AppError>;
    async fn list_by_business(&self, business_id: &str) -> Result<Vec<Cleaner>, AppError>;
    async fn update(&self, cleaner: &Cleaner) -> Result<Cleaner, AppError>;
    async fn delete(&self, business_id: &str, id: &str) -> Result<(), AppError>;
}

#[async_trait]
pub trait AvailabilityRepository: Send + Sync {
    async fn upsert(&self, rule: &AvailabilityRule) -> Result<AvailabilityRule, AppError>;
    async fn list_by_cleaner(&self, cleaner_id: &str) -> Result<Vec<AvailabilityRule>, AppError>;
    async fn list_for_business(&self, business_id: &str) -> Result<Vec<AvailabilityRule>, AppError>;
    async fn delete_exception(&self, cleaner_id: &str, date: NaiveDate) -> Result<(), AppError>;
}

#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn create(&self, booking: &Booking) -> Result<Booking, AppError>;
    async fn find_by_id(&self, business_id: &str, id: &str) -> Result<Option<Booking>, AppError>;
    async fn list_by_business(&self, business_id: &str) -> Result<Vec<Booking>, AppError>;
    /// Active (non-cancelled) bookings for any cleaner of the business that
    /// overlap the given UTC range. Feeds the conflict checker.
    async fn list_active_by_range(&self, business_id: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<Booking>, AppError>;
    /// Write the chosen cleaner onto a booking. Re-validates inside the same
    /// transaction that no overlapping active booking is already assigned to
    /// that cleaner; a concurrent winner surfaces as Conflict.
    async fn assign_cleaner(&self, booking: &Booking, cleaner_id: &str) -> Result<Booking, AppError>;
    /// Cancel a booking and void its pending offers in one transaction.
    async fn cancel(&self, business_id: &str, id: &str) -> Result<Booking, AppError>;
    async fn complete(&self, business_id: &str, id: &str) -> Result<Booking, AppError>;
}

#[async_trait]
pub trait OfferRepository: Send + Sync {
    /// Insert a new PENDING offer. The unique (booking_id, cleaner_id) index
    /// turns a concurrent duplicate into OfferAlreadyExists.
    async fn create(&self, offer: &JobOffer) -> Result<JobOffer, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<JobOffer>, AppError>;
    async fn list_by_booking(&self, booking_id: &str) -> Result<Vec<JobOffer>, AppError>;
    async fn list_pending_by_cleaner(&self, cleaner_id: &str) -> Result<Vec<JobOffer>, AppError>;
    /// Accept a PENDING offer and assign its cleaner to the booking in one
    /// transaction, re-checking that the booking is still unassigned and the
    /// cleaner still conflict-free.
    async fn accept(&self, id: &str) -> Result<JobOffer, AppError>;
    async fn reject(&self, id: &str) -> Result<JobOffer, AppError>;
    async fn list_rejected_cleaner_ids(&self, booking_id: &str) -> Result<Vec<String>, AppError>;
}

#[async_trait]
pub trait JobRepository: Send + Sync {
    async fn create(&self, job: &Job) -> Result<Job, AppError>;
    async fn find_pending(&self, limit: i32) -> Result<Vec<Job>, AppError>;
    async fn update_status(&self, id: &str, status: &str, error_message: Option<String>) -> Result<(), AppError>;
    async fn log_notification(&self, log: &NotifyLog) -> Result<(), AppError>;
    async fn has_notification_been_sent(&self, recipient: &str, context_hash: &str) -> Result<bool, AppError>;
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<(), AppError>;
}
