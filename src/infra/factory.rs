use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use sqlx::{postgres::{PgPoolOptions, PgConnectOptions}, sqlite::{SqlitePoolOptions, SqliteJournalMode, SqliteConnectOptions}};
use sqlx::{PgPool, SqlitePool, ConnectOptions};
use tracing::info;
use tracing::log::LevelFilter;

use crate::config::Config;
use crate::state::AppState;
use crate::domain::services::dispatch::DispatchService;
use crate::infra::notify::http_notify_service::HttpNotifyService;
use crate::infra::repositories::{
    postgres_business_repo::PostgresBusinessRepo, postgres_cleaner_repo::PostgresCleanerRepo,
    postgres_availability_repo::PostgresAvailabilityRepo, postgres_booking_repo::PostgresBookingRepo,
    postgres_offer_repo::PostgresOfferRepo, postgres_job_repo::PostgresJobRepo,
    sqlite_business_repo::SqliteBusinessRepo, sqlite_cleaner_repo::SqliteCleanerRepo,
    sqlite_availability_repo::SqliteAvailabilityRepo, sqlite_booking_repo::SqliteBookingRepo,
    sqlite_offer_repo::SqliteOfferRepo, sqlite_job_repo::SqliteJobRepo,
};

pub async fn bootstrap_state(config: &Config) -> AppState {
    let database_url = &config.database_url;
    let notifier = Arc::new(HttpNotifyService::new(
        config.notify_service_url.clone(),
        config.notify_service_token.clone(),
    ));

    if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
        info!("Initializing PostgreSQL connection...");

        let mut opts: PgConnectOptions = database_url.parse().expect("Invalid Postgres URL");
        opts = opts.log_statements(LevelFilter::Debug)
            .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect_with(opts)
            .await
            .expect("Failed to connect to Postgres");

        run_postgres_migrations(&pool).await;

        let business_repo = Arc::new(PostgresBusinessRepo::new(pool.clone()));
        let cleaner_repo = Arc::new(PostgresCleanerRepo::new(pool.clone()));
        let availability_repo = Arc::new(PostgresAvailabilityRepo::new(pool.clone()));
        let booking_repo = Arc::new(PostgresBookingRepo::new(pool.clone()));
        let offer_repo = Arc::new(PostgresOfferRepo::new(pool.clone()));
        let job_repo = Arc::new(PostgresJobRepo::new(pool.clone()));

        let dispatch = Arc::new(DispatchService::new(
            cleaner_repo.clone(),
            availability_repo.clone(),
            booking_repo.clone(),
            offer_repo.clone(),
            job_repo.clone(),
        ));

        AppState {
            config: config.clone(),
            business_repo,
            cleaner_repo,
            availability_repo,
            booking_repo,
            offer_repo,
            job_repo,
            notifier,
            dispatch,
        }
    } else {
        info!("Initializing SQLite connection with WAL Mode...");

        let opts = SqliteConnectOptions::from_str(database_url)
            .expect("Invalid SQLite connection string")
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5))
            .log_statements(LevelFilter::Debug)
            .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(opts)
            .await
            .expect("Failed to connect to SQLite");

        run_sqlite_migrations(&pool).await;

        let business_repo = Arc::new(SqliteBusinessRepo::new(pool.clone()));
        let cleaner_repo = Arc::new(SqliteCleanerRepo::new(pool.clone()));
        let availability_repo = Arc::new(SqliteAvailabilityRepo::new(pool.clone()));
        let booking_repo = Arc::new(SqliteBookingRepo::new(pool.clone()));
        let offer_repo = Arc::new(SqliteOfferRepo::new(pool.clone()));
        let job_repo = Arc::new(SqliteJobRepo::new(pool.clone()));

        let dispatch = Arc::new(DispatchService::new(
            cleaner_repo.clone(),
            availability_repo.clone(),
            booking_repo.clone(),
            offer_repo.clone(),
            job_repo.clone(),
        ));

        AppState {
            config: config.clone(),
            business_repo,
            cleaner_repo,
            availability_repo,
            booking_repo,
            offer_repo,
            job_repo,
            notifier,
            dispatch,
        }
    }
}

async fn run_postgres_migrations(pool: &PgPool) {
    sqlx::migrate!("./migrations/postgres")
        .run(pool)
        .await
        .expect("Failed to run Postgres migrations");
}

async fn run_sqlite_migrations(pool: &SqlitePool) {
    sqlx::migrate!("./migrations/sqlite")
        .run(pool)
        .await
        .expect("Failed to run SQLite migrations");
}
