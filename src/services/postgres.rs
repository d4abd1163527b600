use serde::{Deserialize, Serialize};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when interacting with PostgreSQL
#[derive(Debug, Error)]
pub enum PostgresError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Which engine produced an evaluation run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "eval_source", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EvalSource {
    Rules,
    Agent,
}

/// One recorded evaluation run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationRun {
    pub id: uuid::Uuid,
    pub user_id: String,
    pub source: EvalSource,
    pub eligible_count: i32,
    pub maybe_count: i32,
    pub not_eligible_count: i32,
    pub total_programs: i32,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// PostgreSQL client for the evaluation audit trail
///
/// This client maintains a database separate from Supabase specifically
/// for recording every qualification and scoring run, so bucket counts
/// can be compared over time and across rule revisions.
pub struct PostgresClient {
    pool: PgPool,
}

impl PostgresClient {
    /// Create a new PostgreSQL client from a connection string
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, PostgresError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(5))
            .idle_timeout(Duration::from_secs(600))
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        // Run migrations on startup
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Create a new PostgreSQL client from settings
    pub async fn from_settings(
        url: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
    ) -> Result<Self, PostgresError> {
        tracing::info!("Connecting to PostgreSQL");

        Self::new(
            url,
            max_connections.unwrap_or(10),
            min_connections.unwrap_or(1),
        )
        .await
    }

    /// Record one evaluation run and return its id
    pub async fn record_run(
        &self,
        user_id: &str,
        source: EvalSource,
        eligible: usize,
        maybe: usize,
        not_eligible: usize,
    ) -> Result<uuid::Uuid, PostgresError> {
        let id = uuid::Uuid::new_v4();
        let total = (eligible + maybe + not_eligible) as i32;

        let query = r#"
            INSERT INTO evaluation_runs
                (id, user_id, source, eligible_count, maybe_count, not_eligible_count, total_programs, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, NOW())
        "#;

        sqlx::query(query)
            .bind(id)
            .bind(user_id)
            .bind(source)
            .bind(eligible as i32)
            .bind(maybe as i32)
            .bind(not_eligible as i32)
            .bind(total)
            .execute(&self.pool)
            .await?;

        tracing::debug!(
            "Recorded {:?} run for {}: {}/{}/{} of {}",
            source,
            user_id,
            eligible,
            maybe,
            not_eligible,
            total
        );

        Ok(id)
    }

    /// Most recent run for a user, if any
    pub async fn latest_run(&self, user_id: &str) -> Result<Option<EvaluationRun>, PostgresError> {
        let query = r#"
            SELECT id, user_id, source, eligible_count, maybe_count, not_eligible_count, total_programs, created_at
            FROM evaluation_runs
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT 1
        "#;

        let row = sqlx::query(query)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|row| EvaluationRun {
            id: row.get("id"),
            user_id: row.get("user_id"),
            source: row.get("source"),
            eligible_count: row.get("eligible_count"),
            maybe_count: row.get("maybe_count"),
            not_eligible_count: row.get("not_eligible_count"),
            total_programs: row.get("total_programs"),
            created_at: row.get("created_at"),
        }))
    }

    /// Run history with pagination, newest first
    pub async fn run_history(
        &self,
        user_id: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<EvaluationRun>, PostgresError> {
        let query = r#"
            SELECT id, user_id, source, eligible_count, maybe_count, not_eligible_count, total_programs, created_at
            FROM evaluation_runs
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
        "#;

        let rows = sqlx::query(query)
            .bind(user_id)
            .bind(limit as i64)
            .bind(offset as i64)
            .fetch_all(&self.pool)
            .await?;

        let runs = rows
            .iter()
            .map(|row| EvaluationRun {
                id: row.get("id"),
                user_id: row.get("user_id"),
                source: row.get("source"),
                eligible_count: row.get("eligible_count"),
                maybe_count: row.get("maybe_count"),
                not_eligible_count: row.get("not_eligible_count"),
                total_programs: row.get("total_programs"),
                created_at: row.get("created_at"),
            })
            .collect();

        Ok(runs)
    }

    /// Clear all recorded runs for a user
    pub async fn clear_runs(&self, user_id: &str) -> Result<u64, PostgresError> {
        let query = r#"
            DELETE FROM evaluation_runs
            WHERE user_id = $1
        "#;

        let result = sqlx::query(query).bind(user_id).execute(&self.pool).await?;

        tracing::info!(
            "Cleared {} evaluation runs for user {}",
            result.rows_affected(),
            user_id
        );

        Ok(result.rows_affected())
    }

    /// Aggregate run statistics for a user
    pub async fn run_stats(&self, user_id: &str) -> Result<RunStats, PostgresError> {
        let query = r#"
            SELECT
                COUNT(*) as total_runs,
                COUNT(*) FILTER (WHERE source = 'rules') as rules_runs,
                COUNT(*) FILTER (WHERE source = 'agent') as agent_runs,
                MAX(created_at) as last_run_at
            FROM evaluation_runs
            WHERE user_id = $1
        "#;

        let row = sqlx::query(query).bind(user_id).fetch_one(&self.pool).await?;

        Ok(RunStats {
            user_id: user_id.to_string(),
            total_runs: row.get("total_runs"),
            rules_runs: row.get("rules_runs"),
            agent_runs: row.get("agent_runs"),
            last_run_at: row.get("last_run_at"),
        })
    }

    /// Health check for the database connection
    pub async fn health_check(&self) -> Result<bool, PostgresError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}

/// Statistics about a user's evaluation runs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunStats {
    pub user_id: String,
    pub total_runs: i64,
    pub rules_runs: i64,
    pub agent_runs: i64,
    pub last_run_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eval_source_serializes_lowercase() {
        let json = serde_json::to_string(&EvalSource::Rules).unwrap();
        assert_eq!(json, "\"rules\"");
        let json = serde_json::to_string(&EvalSource::Agent).unwrap();
        assert_eq!(json, "\"agent\"");
    }
}
