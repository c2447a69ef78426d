use crate::domain::{models::business::Business, ports::BusinessRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::PgPool;

pub struct PostgresBusinessRepo {
    pool: PgPool,
}

impl PostgresBusinessRepo {
    pub fn new(pool: PgPool) -> Self { Self { pool } }
}

#[async_trait]
impl BusinessRepository for PostgresBusinessRepo {
    async fn create(&self, business: &Business) -> Result<Business, AppError> {
        sqlx::query_as::<_, Business>(
            "INSERT INTO businesses (id, name, slug, timezone, assignment_policy, hours_start, hours_end, api_secret, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING *"
        )
            .bind(&business.id).bind(&business.name).bind(&business.slug).bind(&business.timezone)
            .bind(&business.assignment_policy).bind(business.hours_start).bind(business.hours_end)
            .bind(&business.api_secret).bind(business.created_at)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Business>, AppError> {
        sqlx::query_as::<_, Business>("SELECT * FROM businesses WHERE id = $1")
            .bind(id).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Business>, AppError> {
        sqlx::query_as::<_, Business>("SELECT * FROM businesses WHERE slug = $1")
            .bind(slug).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn update(&self, business: &Business) -> Result<Business, AppError> {
        sqlx::query_as::<_, Business>(
            "UPDATE businesses SET name=$1, timezone=$2, assignment_policy=$3, hours_start=$4, hours_end=$5
             WHERE id=$6
             RETURNING *"
        )
            .bind(&business.name).bind(&business.timezone).bind(&business.assignment_policy)
            .bind(business.hours_start).bind(business.hours_end).bind(&business.id)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }
}
