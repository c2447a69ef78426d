use crate::domain::{models::cleaner::Cleaner, ports::CleanerRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::SqlitePool;

pub struct SqliteCleanerRepo {
    pool: SqlitePool,
}

impl SqliteCleanerRepo {
    pub fn new(pool: SqlitePool) -> Self { Self { pool } }
}

#[async_trait]
impl CleanerRepository for SqliteCleanerRepo {
    async fn create(&self, cleaner: &Cleaner) -> Result<Cleaner, AppError> {
        sqlx::query_as::<_, Cleaner>(
            "INSERT INTO cleaners (id, business_id, name, email, phone, rating, is_active, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING *"
        )
            .bind(&cleaner.id).bind(&cleaner.business_id).bind(&cleaner.name).bind(&cleaner.email)
            .bind(&cleaner.phone).bind(cleaner.rating).bind(cleaner.is_active).bind(cleaner.created_at)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }

    async fn find_by_id(&self, business_id: &str, id: &str) -> Result<Option<Cleaner>, AppError> {
        sqlx::query_as::<_, Cleaner>("SELECT * FROM cleaners WHERE business_id = ? AND id = ?")
            .bind(business_id).bind(id).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_by_business(&self, business_id: &str) -> Result<Vec<Cleaner>, AppError> {
        sqlx::query_as::<_, Cleaner>("SELECT * FROM cleaners WHERE business_id = ? ORDER BY name ASC")
            .bind(business_id).fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn update(&self, cleaner: &Cleaner) -> Result<Cleaner, AppError> {
        sqlx::query_as::<_, Cleaner>(
            "UPDATE cleaners SET name=?, email=?, phone=?, rating=?, is_active=?
             WHERE id=? AND business_id=?
             RETURNING *"
        )
            .bind(&cleaner.name).bind(&cleaner.email).bind(&cleaner.phone)
            .bind(cleaner.rating).bind(cleaner.is_active)
            .bind(&cleaner.id).bind(&cleaner.business_id)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }

    async fn delete(&self, business_id: &str, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM cleaners WHERE id = ? AND business_id = ?")
            .bind(id).bind(business_id).execute(&self.pool).await.map_err(AppError::Database)?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Cleaner not found".into()));
        }
        Ok(())
    }
}
