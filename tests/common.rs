use dispatch_backend::{
    api::router::create_router,
    state::AppState,
    config::Config,
    domain::ports::Notifier,
    domain::services::dispatch::DispatchService,
    infra::repositories::{
        sqlite_business_repo::SqliteBusinessRepo,
        sqlite_cleaner_repo::SqliteCleanerRepo,
        sqlite_availability_repo::SqliteAvailabilityRepo,
        sqlite_booking_repo::SqliteBookingRepo,
        sqlite_offer_repo::SqliteOfferRepo,
        sqlite_job_repo::SqliteJobRepo,
    },
    background::start_background_worker,
    error::AppError,
};
use sqlx::{sqlite::{SqliteConnectOptions, SqlitePoolOptions}, Pool, Sqlite};
use std::sync::Arc;
use uuid::Uuid;
use axum::{
    body::Body,
    http::{header, Request},
    Router,
};
use std::str::FromStr;
use async_trait::async_trait;
use tower::ServiceExt;
use serde_json::Value;

pub struct MockNotifier;

#[async_trait]
impl Notifier for MockNotifier {
    async fn send(&self, _recipient: &str, _subject: &str, _body: &str) -> Result<(), AppError> {
        Ok(())
    }
}

#[allow(dead_code)]
pub struct TestApp {
    pub router: Router,
    pub pool: Pool<Sqlite>,
    pub db_filename: String,
    pub state: Arc<AppState>,
}

impl TestApp {
    pub async fn new() -> Self {
        let db_filename = format!("test_{}.db", Uuid::new_v4());
        let db_url = format!("sqlite://{}?mode=rwc", db_filename);

        let connection_options = SqliteConnectOptions::from_str(&db_url)
            .unwrap()
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .connect_with(connection_options)
            .await
            .expect("Failed to connect to test db");

        sqlx::migrate!("./migrations/sqlite")
            .run(&pool)
            .await
            .expect("Failed to migrate test db");

        let config = Config {
            database_url: db_url.clone(),
            port: 0,
            notify_service_url: "http://localhost".to_string(),
            notify_service_token: "token".to_string(),
        };

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

        let state = Arc::new(AppState {
            config,
            business_repo,
            cleaner_repo,
            availability_repo,
            booking_repo,
            offer_repo,
            job_repo,
            notifier: Arc::new(MockNotifier),
            dispatch,
        });

        let worker_state = state.clone();
        tokio::spawn(async move {
            start_background_worker(worker_state).await;
        });

        let router = create_router(state.clone());

        Self {
            router,
            pool,
            db_filename,
            state,
        }
    }

    /// Creates a business and returns (business_id, api_secret).
    pub async fn create_business(&self, slug: &str, timezone: &str) -> (String, String) {
        let payload = serde_json::json!({
            "name": format!("Biz {}", slug),
            "slug": slug,
            "timezone": timezone
        });

        let response = self.router.clone().oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/businesses")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap()
        ).await.unwrap();

        if !response.status().is_success() {
            panic!("Business creation failed in test helper: status {}", response.status());
        }

        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body_json: Value = serde_json::from_slice(&body_bytes).unwrap();

        (
            body_json["business_id"].as_str().expect("No business_id in body").to_string(),
            body_json["api_secret"].as_str().expect("No api_secret in body").to_string(),
        )
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.db_filename);
    }
}
