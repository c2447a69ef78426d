use std::sync::Arc;
use chrono::{Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use tracing::{info, warn};

use crate::domain::models::business::Business;
use crate::domain::models::booking::Booking;
use crate::domain::models::cleaner::Cleaner;
use crate::domain::models::availability::AvailabilityRule;
use crate::domain::models::job::{Job, JOB_OFFER_NOTIFY};
use crate::domain::models::offer::JobOffer;
use crate::domain::ports::{
    AvailabilityRepository, BookingRepository, CleanerRepository, JobRepository, OfferRepository,
};
use crate::domain::services::scheduling::{
    self, AlternateSearch, AssignmentPolicy,
};
use crate::error::AppError;

/// Orchestrates the scheduling core against the persistence ports: loads the
/// roster/rules/bookings a decision needs, then either offers the job to the
/// policy pool or assigns the single best cleaner.
pub struct DispatchService {
    cleaner_repo: Arc<dyn CleanerRepository>,
    availability_repo: Arc<dyn AvailabilityRepository>,
    booking_repo: Arc<dyn BookingRepository>,
    offer_repo: Arc<dyn OfferRepository>,
    job_repo: Arc<dyn JobRepository>,
}

/// Roster, rules and active bookings loaded for one decision.
pub struct RosterSnapshot {
    pub cleaners: Vec<Cleaner>,
    pub rules: Vec<AvailabilityRule>,
    pub bookings: Vec<Booking>,
}

pub struct SlotCheck {
    pub available: bool,
    pub alternates: Vec<NaiveDateTime>,
}

pub fn business_tz(business: &Business) -> Tz {
    business.timezone.parse().unwrap_or(chrono_tz::UTC)
}

impl DispatchService {
    pub fn new(
        cleaner_repo: Arc<dyn CleanerRepository>,
        availability_repo: Arc<dyn AvailabilityRepository>,
        booking_repo: Arc<dyn BookingRepository>,
        offer_repo: Arc<dyn OfferRepository>,
        job_repo: Arc<dyn JobRepository>,
    ) -> Self {
        Self {
            cleaner_repo,
            availability_repo,
            booking_repo,
            offer_repo,
            job_repo,
        }
    }

    /// Load everything the core needs to judge instants inside the given
    /// local date range (inclusive). Bookings are fetched over the matching
    /// UTC span so cross-midnight conversions stay inside the net.
    async fn snapshot(&self, business: &Business, from: NaiveDate, to: NaiveDate) -> Result<RosterSnapshot, AppError> {
        let tz = business_tz(business);

        let day_start = tz
            .from_local_datetime(&from.and_hms_opt(0, 0, 0).unwrap())
            .earliest()
            .ok_or_else(|| AppError::InvalidTimeInput(format!("Cannot resolve start of {} in {}", from, business.timezone)))?
            .with_timezone(&Utc);
        let day_end = tz
            .from_local_datetime(&to.and_hms_opt(23, 59, 59).unwrap())
            .latest()
            .ok_or_else(|| AppError::InvalidTimeInput(format!("Cannot resolve end of {} in {}", to, business.timezone)))?
            .with_timezone(&Utc);

        let cleaners = self.cleaner_repo.list_by_business(&business.id).await?;
        let rules = self.availability_repo.list_for_business(&business.id).await?;
        let bookings = self.booking_repo.list_active_by_range(&business.id, day_start, day_end).await?;

        Ok(RosterSnapshot { cleaners, rules, bookings })
    }

    fn effective_pool(&self, business: &Business, snapshot: &RosterSnapshot, exclude: &[String], policy_override: Option<AssignmentPolicy>) -> Vec<Cleaner> {
        let policy = policy_override.unwrap_or_else(|| AssignmentPolicy::parse(&business.assignment_policy));
        scheduling::select_pool(snapshot.cleaners.clone(), policy, exclude)
    }

    /// Who is free at the given local instant, after pool policy and
    /// exclusions. Empty means "nobody", never an error.
    pub async fn available_at(
        &self,
        business: &Business,
        local: NaiveDateTime,
        exclude: &[String],
        policy_override: Option<AssignmentPolicy>,
    ) -> Result<Vec<Cleaner>, AppError> {
        let snapshot = self.snapshot(business, local.date(), local.date()).await?;
        let pool = self.effective_pool(business, &snapshot, exclude, policy_override);

        Ok(scheduling::available_cleaners(
            &pool,
            &snapshot.rules,
            &snapshot.bookings,
            local.date(),
            local.time(),
            business_tz(business),
        ))
    }

    /// The availability probe behind the public check endpoint: is anyone
    /// free at this instant, and if not, which nearby instants would work.
    pub async fn check_slot(&self, business: &Business, local: NaiveDateTime) -> Result<SlotCheck, AppError> {
        // The alternate walk can cross several days; one snapshot covers the
        // whole probe horizon.
        let horizon_days = 7;
        let snapshot = self
            .snapshot(business, local.date(), local.date() + Duration::days(horizon_days))
            .await?;
        let pool = self.effective_pool(business, &snapshot, &[], Some(AssignmentPolicy::AllAvailable));
        let tz = business_tz(business);

        let available = !scheduling::available_cleaners(
            &pool,
            &snapshot.rules,
            &snapshot.bookings,
            local.date(),
            local.time(),
            tz,
        )
        .is_empty();

        if available {
            return Ok(SlotCheck { available: true, alternates: Vec::new() });
        }

        let search = AlternateSearch {
            hours_start: business.hours_start.max(0) as u32,
            hours_end: business.hours_end.max(0) as u32,
            ..AlternateSearch::default()
        };
        let alternates = scheduling::find_alternate_slots(
            &pool,
            &snapshot.rules,
            &snapshot.bookings,
            tz,
            local,
            search,
        );

        Ok(SlotCheck { available: false, alternates })
    }

    /// Offer the booking to every available cleaner in the policy pool.
    ///
    /// Re-broadcast is idempotent: a (booking, cleaner) pair that already has
    /// an offer is skipped, whether it was found up front or lost a race to a
    /// concurrent broadcast. Returns the number of offers newly created.
    pub async fn broadcast(&self, business: &Business, booking: &Booking, exclude: &[String]) -> Result<usize, AppError> {
        let policy = AssignmentPolicy::parse(&business.assignment_policy);
        let tz = business_tz(business);
        let local = booking.start_time.with_timezone(&tz).naive_local();

        let snapshot = self.snapshot(business, local.date(), local.date()).await?;
        let pool = self.effective_pool(business, &snapshot, exclude, None);
        let available = scheduling::available_cleaners(
            &pool,
            &snapshot.rules,
            &snapshot.bookings,
            local.date(),
            local.time(),
            tz,
        );

        if available.is_empty() {
            info!("broadcast: no available cleaners for booking {}", booking.id);
            return Ok(0);
        }

        let existing = self.offer_repo.list_by_booking(&booking.id).await?;

        let mut created = 0;
        for cleaner in &available {
            if existing.iter().any(|o| o.cleaner_id == cleaner.id) {
                continue;
            }

            let offer = JobOffer::new(booking.id.clone(), cleaner.id.clone(), policy.as_str().to_string());
            match self.offer_repo.create(&offer).await {
                Ok(saved) => {
                    created += 1;
                    let job = Job::new(JOB_OFFER_NOTIFY, saved.id.clone(), business.id.clone(), Utc::now());
                    self.job_repo.create(&job).await?;
                }
                Err(AppError::OfferAlreadyExists { .. }) => {
                    // A concurrent broadcast got there first; counts as offered.
                    warn!("broadcast: offer already exists for booking {} cleaner {}", booking.id, cleaner.id);
                }
                Err(e) => return Err(e),
            }
        }

        info!("broadcast: created {} offers for booking {}", created, booking.id);
        Ok(created)
    }

    /// Direct-assignment flow: pick the single best available cleaner and
    /// write them onto the booking. The repository re-validates the conflict
    /// inside the assignment transaction, so a concurrent double-book
    /// surfaces as Conflict rather than a silent overlap.
    pub async fn assign_best(&self, business: &Business, booking: &Booking, exclude: &[String]) -> Result<Option<Cleaner>, AppError> {
        let tz = business_tz(business);
        let local = booking.start_time.with_timezone(&tz).naive_local();
        let available = self.available_at(business, local, exclude, None).await?;

        let Some(best) = scheduling::pick_best(&available) else {
            return Ok(None);
        };

        self.booking_repo.assign_cleaner(booking, &best.id).await?;
        info!("assign_best: booking {} assigned to cleaner {}", booking.id, best.id);
        Ok(Some(best.clone()))
    }
}
