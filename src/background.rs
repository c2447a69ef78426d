use std::sync::Arc;
use std::time::Duration;
use chrono::Utc;
use chrono_tz::Tz;
use sha2::{Digest, Sha256};
use tokio::time::sleep;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::domain::models::job::JOB_OFFER_NOTIFY;
use crate::domain::models::notify_log::NotifyLog;
use crate::domain::models::offer::OFFER_PENDING;
use crate::error::AppError;
use crate::state::AppState;

pub async fn start_background_worker(state: Arc<AppState>) {
    info!("Starting background job worker...");

    loop {
        match state.job_repo.find_pending(10).await {
            Ok(jobs) => {
                for job in jobs {
                    let job_id = job.id.clone();
                    let job_type = job.job_type.clone();
                    let business_id = job.payload.business_id.clone();

                    let span = info_span!(
                        "background_job",
                        job_id = %job_id,
                        job_type = %job_type,
                        business_id = %business_id
                    );

                    let state = state.clone();

                    async move {
                        info!("Processing job: {}", job_type);
                        match process_job(&state, &job).await {
                            Ok(_) => {
                                info!("Job completed successfully");
                                if let Err(e) = state.job_repo.update_status(&job.id, "COMPLETED", None).await {
                                    error!("Failed to mark job as completed: {:?}", e);
                                }
                            },
                            Err(e) => {
                                let err_msg = format!("{}", e);
                                error!("Job failed with error: {}", err_msg);
                                if let Err(up_err) = state.job_repo.update_status(&job.id, "FAILED", Some(err_msg)).await {
                                    error!("Failed to mark job as failed: {:?}", up_err);
                                }
                            }
                        }
                    }
                        .instrument(span)
                        .await;
                }
            }
            Err(e) => error!("Failed to fetch pending jobs: {:?}", e),
        }
        sleep(Duration::from_secs(5)).await;
    }
}

async fn process_job(
    state: &Arc<AppState>,
    job: &crate::domain::models::job::Job,
) -> Result<(), AppError> {
    if job.job_type != JOB_OFFER_NOTIFY {
        warn!("Unknown job type {}, skipping", job.job_type);
        return Ok(());
    }

    let offer_id = &job.payload.offer_id;
    let business_id = &job.payload.business_id;

    let business = state.business_repo.find_by_id(business_id).await?
        .ok_or(AppError::NotFound(format!("Business {} not found", business_id)))?;

    let offer = state.offer_repo.find_by_id(offer_id).await?
        .ok_or(AppError::NotFound(format!("Offer {} not found", offer_id)))?;

    // The offer may have been accepted or withdrawn between broadcast and
    // delivery; a stale notification helps nobody.
    if offer.status != OFFER_PENDING {
        info!("Offer {} is {}, skipping notification", offer.id, offer.status);
        return Ok(());
    }

    let booking = state.booking_repo.find_by_id(business_id, &offer.booking_id).await?
        .ok_or(AppError::NotFound(format!("Booking {} not found", offer.booking_id)))?;

    let cleaner = state.cleaner_repo.find_by_id(business_id, &offer.cleaner_id).await?
        .ok_or(AppError::NotFound(format!("Cleaner {} not found", offer.cleaner_id)))?;

    let tz: Tz = business.timezone.parse().unwrap_or(chrono_tz::UTC);
    let local_start = booking.start_time.with_timezone(&tz);
    let local_end = booking.end_time.with_timezone(&tz);

    let subject = format!("New job offer: {}", local_start.format("%Y-%m-%d %H:%M"));
    let mut body = format!(
        "Hi {},\n\nA new cleaning job is available:\n\nDate: {}\nTime: {} - {} ({})\nCustomer: {}\n",
        cleaner.name,
        local_start.format("%Y-%m-%d"),
        local_start.format("%H:%M"),
        local_end.format("%H:%M"),
        business.timezone,
        booking.customer_name,
    );
    if let Some(address) = &booking.address {
        body.push_str(&format!("Address: {}\n", address));
    }
    body.push_str("\nOpen your dashboard to accept or decline this offer.\n");

    let mut hasher = Sha256::new();
    hasher.update(offer.id.as_bytes());
    hasher.update(cleaner.email.as_bytes());
    hasher.update(booking.start_time.to_rfc3339().as_bytes());
    let hash = hex::encode(hasher.finalize());

    if state.job_repo.has_notification_been_sent(&cleaner.email, &hash).await? {
        info!("Notification skipped (idempotency) for offer {}. Recipient: {}", offer.id, cleaner.email);
        let log = NotifyLog {
            id: Uuid::new_v4().to_string(),
            job_id: job.id.clone(),
            recipient: cleaner.email.clone(),
            context_hash: hash,
            sent_at: Utc::now(),
            status: "SKIPPED_DUPLICATE".to_string(),
        };
        state.job_repo.log_notification(&log).await?;
        return Ok(());
    }

    info!("Sending offer notification to {}", cleaner.email);
    state.notifier.send(&cleaner.email, &subject, &body).await?;

    let log = NotifyLog {
        id: Uuid::new_v4().to_string(),
        job_id: job.id.clone(),
        recipient: cleaner.email.clone(),
        context_hash: hash,
        sent_at: Utc::now(),
        status: "SENT".to_string(),
    };
    state.job_repo.log_notification(&log).await?;

    Ok(())
}
