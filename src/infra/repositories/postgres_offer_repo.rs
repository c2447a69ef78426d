use crate::domain::{models::offer::{JobOffer, OFFER_PENDING}, ports::OfferRepository};
use crate::domain::models::booking::STATUS_CONFIRMED;
use crate::domain::models::booking::Booking;
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::PgPool;
use chrono::Utc;

pub struct PostgresOfferRepo {
    pool: PgPool,
}

impl PostgresOfferRepo {
    pub fn new(pool: PgPool) -> Self { Self { pool } }
}

#[async_trait]
impl OfferRepository for PostgresOfferRepo {
    async fn create(&self, offer: &JobOffer) -> Result<JobOffer, AppError> {
        sqlx::query_as::<_, JobOffer>(
            "INSERT INTO job_offers (id, booking_id, cleaner_id, status, assignment_type, created_at, responded_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING *"
        )
            .bind(&offer.id).bind(&offer.booking_id).bind(&offer.cleaner_id)
            .bind(&offer.status).bind(&offer.assignment_type)
            .bind(offer.created_at).bind(offer.responded_at)
            .fetch_one(&self.pool).await
            .map_err(|e| {
                if AppError::is_unique_violation(&e) {
                    AppError::OfferAlreadyExists {
                        booking_id: offer.booking_id.clone(),
                        cleaner_id: offer.cleaner_id.clone(),
                    }
                } else {
                    AppError::Database(e)
                }
            })
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<JobOffer>, AppError> {
        sqlx::query_as::<_, JobOffer>("SELECT * FROM job_offers WHERE id = $1")
            .bind(id).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_by_booking(&self, booking_id: &str) -> Result<Vec<JobOffer>, AppError> {
        sqlx::query_as::<_, JobOffer>("SELECT * FROM job_offers WHERE booking_id = $1 ORDER BY created_at ASC")
            .bind(booking_id).fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_pending_by_cleaner(&self, cleaner_id: &str) -> Result<Vec<JobOffer>, AppError> {
        sqlx::query_as::<_, JobOffer>(
            "SELECT * FROM job_offers WHERE cleaner_id = $1 AND status = 'PENDING' ORDER BY created_at ASC"
        )
            .bind(cleaner_id).fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn accept(&self, id: &str) -> Result<JobOffer, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let offer = sqlx::query_as::<_, JobOffer>("SELECT * FROM job_offers WHERE id = $1 FOR UPDATE")
            .bind(id).fetch_optional(&mut *tx).await.map_err(AppError::Database)?
            .ok_or(AppError::NotFound("Offer not found".into()))?;

        if offer.status != OFFER_PENDING {
            return Err(AppError::Conflict("Offer is no longer pending".into()));
        }

        let booking = sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = $1 FOR UPDATE")
            .bind(&offer.booking_id).fetch_optional(&mut *tx).await.map_err(AppError::Database)?
            .ok_or(AppError::NotFound("Booking not found".into()))?;

        if booking.status != STATUS_CONFIRMED {
            return Err(AppError::Conflict("Booking is no longer open".into()));
        }
        if booking.cleaner_id.is_some() {
            return Err(AppError::Conflict("Booking already has a cleaner".into()));
        }

        // The accepting cleaner may have picked up other work since the
        // broadcast; re-check for overlap before the write.
        let conflicts: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM bookings
             WHERE cleaner_id = $1 AND status != 'CANCELLED'
             AND start_time < $2 AND end_time > $3"
        )
            .bind(&offer.cleaner_id)
            .bind(booking.end_time).bind(booking.start_time)
            .fetch_one(&mut *tx).await.map_err(AppError::Database)?;

        if conflicts > 0 {
            return Err(AppError::Conflict("Cleaner already has an overlapping booking".into()));
        }

        sqlx::query("UPDATE bookings SET cleaner_id = $1 WHERE id = $2")
            .bind(&offer.cleaner_id).bind(&booking.id)
            .execute(&mut *tx).await.map_err(AppError::Database)?;

        let accepted = sqlx::query_as::<_, JobOffer>(
            "UPDATE job_offers SET status = 'ACCEPTED', responded_at = $1 WHERE id = $2 RETURNING *"
        )
            .bind(Utc::now()).bind(id)
            .fetch_one(&mut *tx).await.map_err(AppError::Database)?;

        tx.commit().await.map_err(AppError::Database)?;
        Ok(accepted)
    }

    async fn reject(&self, id: &str) -> Result<JobOffer, AppError> {
        let offer = sqlx::query_as::<_, JobOffer>("SELECT * FROM job_offers WHERE id = $1")
            .bind(id).fetch_optional(&self.pool).await.map_err(AppError::Database)?
            .ok_or(AppError::NotFound("Offer not found".into()))?;

        if offer.status != OFFER_PENDING {
            return Err(AppError::Conflict("Offer is no longer pending".into()));
        }

        sqlx::query_as::<_, JobOffer>(
            "UPDATE job_offers SET status = 'REJECTED', responded_at = $1 WHERE id = $2 AND status = 'PENDING' RETURNING *"
        )
            .bind(Utc::now()).bind(id)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)?
            .ok_or(AppError::Conflict("Offer is no longer pending".into()))
    }

    async fn list_rejected_cleaner_ids(&self, booking_id: &str) -> Result<Vec<String>, AppError> {
        sqlx::query_scalar::<_, String>(
            "SELECT cleaner_id FROM job_offers WHERE booking_id = $1 AND status = 'REJECTED'"
        )
            .bind(booking_id).fetch_all(&self.pool).await.map_err(AppError::Database)
    }
}
