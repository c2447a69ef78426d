use crate::domain::{models::booking::Booking, ports::BookingRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::SqlitePool;
use chrono::{DateTime, Utc};

pub struct SqliteBookingRepo {
    pool: SqlitePool,
}

impl SqliteBookingRepo {
    pub fn new(pool: SqlitePool) -> Self { Self { pool } }
}

#[async_trait]
impl BookingRepository for SqliteBookingRepo {
    async fn create(&self, booking: &Booking) -> Result<Booking, AppError> {
        sqlx::query_as::<_, Booking>(
            "INSERT INTO bookings (id, business_id, cleaner_id, customer_name, customer_email, customer_phone, address, start_time, end_time, status, reference, completed_at, cancelled_at, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING *"
        )
            .bind(&booking.id).bind(&booking.business_id).bind(&booking.cleaner_id)
            .bind(&booking.customer_name).bind(&booking.customer_email).bind(&booking.customer_phone)
            .bind(&booking.address).bind(booking.start_time).bind(booking.end_time)
            .bind(&booking.status).bind(&booking.reference)
            .bind(booking.completed_at).bind(booking.cancelled_at).bind(booking.created_at)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }

    async fn find_by_id(&self, business_id: &str, id: &str) -> Result<Option<Booking>, AppError> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE business_id = ? AND id = ?")
            .bind(business_id).bind(id).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_by_business(&self, business_id: &str) -> Result<Vec<Booking>, AppError> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE business_id = ? ORDER BY start_time ASC")
            .bind(business_id).fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_active_by_range(&self, business_id: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<Booking>, AppError> {
        sqlx::query_as::<_, Booking>(
            "SELECT * FROM bookings WHERE business_id = ? AND start_time < ? AND end_time > ? AND status != 'CANCELLED'"
        )
            .bind(business_id).bind(end).bind(start)
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn assign_cleaner(&self, booking: &Booking, cleaner_id: &str) -> Result<Booking, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        // Re-validate inside the transaction so two concurrent assignments
        // cannot hand the same cleaner overlapping jobs.
        let conflicts: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM bookings
             WHERE cleaner_id = ? AND id != ? AND status != 'CANCELLED'
             AND start_time < ? AND end_time > ?"
        )
            .bind(cleaner_id).bind(&booking.id)
            .bind(booking.end_time).bind(booking.start_time)
            .fetch_one(&mut *tx).await.map_err(AppError::Database)?;

        if conflicts > 0 {
            return Err(AppError::Conflict("Cleaner already has an overlapping booking".into()));
        }

        let updated = sqlx::query_as::<_, Booking>(
            "UPDATE bookings SET cleaner_id = ? WHERE id = ? AND business_id = ? RETURNING *"
        )
            .bind(cleaner_id).bind(&booking.id).bind(&booking.business_id)
            .fetch_one(&mut *tx).await.map_err(AppError::Database)?;

        tx.commit().await.map_err(AppError::Database)?;
        Ok(updated)
    }

    async fn cancel(&self, business_id: &str, id: &str) -> Result<Booking, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let cancelled = sqlx::query_as::<_, Booking>(
            "UPDATE bookings SET status = 'CANCELLED', cancelled_at = ?
             WHERE id = ? AND business_id = ? AND status != 'CANCELLED'
             RETURNING *"
        )
            .bind(Utc::now()).bind(id).bind(business_id)
            .fetch_optional(&mut *tx).await.map_err(AppError::Database)?
            .ok_or(AppError::NotFound("Booking not found or already cancelled".into()))?;

        sqlx::query(
            "UPDATE job_offers SET status = 'WITHDRAWN', responded_at = ? WHERE booking_id = ? AND status = 'PENDING'"
        )
            .bind(Utc::now()).bind(id)
            .execute(&mut *tx).await.map_err(AppError::Database)?;

        tx.commit().await.map_err(AppError::Database)?;
        Ok(cancelled)
    }

    async fn complete(&self, business_id: &str, id: &str) -> Result<Booking, AppError> {
        sqlx::query_as::<_, Booking>(
            "UPDATE bookings SET status = 'COMPLETED', completed_at = ?
             WHERE id = ? AND business_id = ? AND status = 'CONFIRMED'
             RETURNING *"
        )
            .bind(Utc::now()).bind(id).bind(business_id)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)?
            .ok_or(AppError::NotFound("Booking not found or not open".into()))
    }
}
