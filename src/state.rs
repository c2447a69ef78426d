use std::sync::Arc;
use crate::domain::ports::{
    BusinessRepository, CleanerRepository, AvailabilityRepository,
    BookingRepository, OfferRepository, JobRepository, Notifier,
};
use crate::domain::services::dispatch::DispatchService;
use crate::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub business_repo: Arc<dyn BusinessRepository>,
    pub cleaner_repo: Arc<dyn CleanerRepository>,
    pub availability_repo: Arc<dyn AvailabilityRepository>,
    pub booking_repo: Arc<dyn BookingRepository>,
    pub offer_repo: Arc<dyn OfferRepository>,
    pub job_repo: Arc<dyn JobRepository>,
    pub notifier: Arc<dyn Notifier>,
    pub dispatch: Arc<DispatchService>,
}
