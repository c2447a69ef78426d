pub mod sqlite_business_repo;
pub mod sqlite_cleaner_repo;
pub mod sqlite_availability_repo;
pub mod sqlite_booking_repo;
pub mod sqlite_offer_repo;
pub mod sqlite_job_repo;
pub mod postgres_business_repo;
pub mod postgres_cleaner_repo;
pub mod postgres_availability_repo;
pub mod postgres_booking_repo;
pub mod postgres_offer_repo;
pub mod postgres_job_repo;
