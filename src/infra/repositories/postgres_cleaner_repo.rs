use crate::domain::{models::cleaner::Cleaner, ports::CleanerRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::PgPool;

pub struct PostgresCleanerRepo {
    pool: PgPool,
}

impl PostgresCleanerRepo {
    pub fn new(pool: PgPool) -> Self { Self { pool } }
}

#[async_trait]
impl CleanerRepository for PostgresCleanerRepo {
    async fn create(&self, cleaner: &Cleaner) -> Result<Cleaner, AppError> {
        sqlx::query_as::<_, Cleaner>(
            "INSERT INTO cleaners (id, business_id, name, email, phone, rating, is_active, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING *"
        )
            .bind(&cleaner.id).bind(&cleaner.business_id).bind(&cleaner.name).bind(&cleaner.email)
            .bind(&cleaner.phone).bind(cleaner.rating).bind(cleaner.is_active).bind(cleaner.created_at)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }

    async fn find_by_id(&self, business_id: &str, id: &str) -> Result<Option<Cleaner>, AppError> {
        sqlx::query_as::<_, Cleaner>("SELECT * FROM cleaners WHERE business_id = $1 AND id = $2")
            .bind(business_id).bind(id).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_by_business(&self, business_id: &str) -> Result<Vec<Cleaner>, AppError> {
        sqlx::query_as::<_, Cleaner>("SELECT * FROM cleaners WHERE business_id = $1 ORDER BY name ASC")
            .bind(business_id).fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn update(&self, cleaner: &Cleaner) -> Result<Cleaner, AppError> {
        sqlx::query_as::<_, Cleaner>(
            "UPDATE cleaners SET name=$1, email=$2, phone=$3, rating=$4, is_active=$5
             WHERE id=$6 AND business_id=$7
             RETURNING *"
        )
            .bind(&cleaner.name).bind(&cleaner.email).bind(&cleaner.phone)
            .bind(cleaner.rating).bind(cleaner.is_active)
            .bind(&cleaner.id).bind(&cleaner.business_id)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }

    async fn delete(&self, business_id: &str, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM cleaners WHERE id = $1 AND business_id = $2")
            .bind(id).bind(business_id).execute(&self.pool).await.map_err(AppError::Database)?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Cleaner not found".into()));
        }
        Ok(())
    }
}
