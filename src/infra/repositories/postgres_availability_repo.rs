use crate::domain::{models::availability::{AvailabilityRule, RULE_WEEKLY}, ports::AvailabilityRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::PgPool;
use chrono::NaiveDate;

pub struct PostgresAvailabilityRepo {
    pool: PgPool,
}

impl PostgresAvailabilityRepo {
    pub fn new(pool: PgPool) -> Self { Self { pool } }
}

#[async_trait]
impl AvailabilityRepository for PostgresAvailabilityRepo {
    async fn upsert(&self, rule: &AvailabilityRule) -> Result<AvailabilityRule, AppError> {
        let query = if rule.rule_type == RULE_WEEKLY {
            r#"INSERT INTO availability_rules (id, cleaner_id, rule_type, weekday, specific_date, start_time, end_time, off_day, created_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
               ON CONFLICT(cleaner_id, weekday) WHERE rule_type = 'WEEKLY' DO UPDATE SET
               start_time=excluded.start_time,
               end_time=excluded.end_time,
               off_day=excluded.off_day
               RETURNING *"#
        } else {
            r#"INSERT INTO availability_rules (id, cleaner_id, rule_type, weekday, specific_date, start_time, end_time, off_day, created_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
               ON CONFLICT(cleaner_id, specific_date) WHERE rule_type = 'DATE' DO UPDATE SET
               start_time=excluded.start_time,
               end_time=excluded.end_time,
               off_day=excluded.off_day
               RETURNING *"#
        };

        sqlx::query_as::<_, AvailabilityRule>(query)
            .bind(&rule.id).bind(&rule.cleaner_id).bind(&rule.rule_type)
            .bind(&rule.weekday).bind(rule.specific_date)
            .bind(rule.start_time).bind(rule.end_time)
            .bind(rule.off_day).bind(rule.created_at)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_by_cleaner(&self, cleaner_id: &str) -> Result<Vec<AvailabilityRule>, AppError> {
        sqlx::query_as::<_, AvailabilityRule>(
            "SELECT * FROM availability_rules WHERE cleaner_id = $1 ORDER BY rule_type, weekday, specific_date"
        )
            .bind(cleaner_id).fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_for_business(&self, business_id: &str) -> Result<Vec<AvailabilityRule>, AppError> {
        sqlx::query_as::<_, AvailabilityRule>(
            "SELECT ar.* FROM availability_rules ar
             JOIN cleaners c ON c.id = ar.cleaner_id
             WHERE c.business_id = $1"
        )
            .bind(business_id).fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn delete_exception(&self, cleaner_id: &str, date: NaiveDate) -> Result<(), AppError> {
        let result = sqlx::query(
            "DELETE FROM availability_rules WHERE cleaner_id = $1 AND specific_date = $2 AND rule_type = 'DATE'"
        )
            .bind(cleaner_id).bind(date).execute(&self.pool).await.map_err(AppError::Database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Availability exception not found".into()));
        }
        Ok(())
    }
}
