use async_trait::async_trait;
use chrono::{DateTime, Utc};
use runbridge_core::{RunName, RunStatus};
use sqlx::{Row, postgres::PgPool, postgres::PgRow};
use std::path::PathBuf;
use std::str::FromStr;

use super::{Result, Run, RunError, RunRepository};

/// PostgreSQL implementation of RunRepository
pub struct PostgresRunRepository {
    pool: PgPool,
}

impl PostgresRunRepository {
    /// Create a new PostgresRunRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const RUN_COLUMNS: &str = "name, display_name, description, tags, status, flow, data, \
                           column_mapping, properties, start_time, end_time, created_at, \
                           outputs, token_usage, error";

fn to_json<T: serde::Serialize>(value: &T, what: &str) -> Result<serde_json::Value> {
    serde_json::to_value(value)
        .map_err(|e| RunError::SerializationError(format!("Failed to serialize {what}: {e}")))
}

fn from_json<T: serde::de::DeserializeOwned>(value: serde_json::Value, what: &str) -> Result<T> {
    serde_json::from_value(value)
        .map_err(|e| RunError::SerializationError(format!("Failed to deserialize {what}: {e}")))
}

fn run_from_row(row: &PgRow) -> Result<Run> {
    let status_str: String = row.get("status");
    let status = RunStatus::from_str(&status_str)
        .map_err(|_| RunError::Validation(format!("invalid status: {status_str}")))?;

    let start_time: Option<DateTime<Utc>> = row.get("start_time");
    let end_time: Option<DateTime<Utc>> = row.get("end_time");
    let created_at: DateTime<Utc> = row.get("created_at");
    let data: Option<String> = row.get("data");

    Ok(Run {
        name: RunName::from_string(row.get::<String, _>("name")),
        display_name: row.get("display_name"),
        description: row.get("description"),
        tags: from_json(row.get("tags"), "tags")?,
        status,
        flow: from_json(row.get("flow"), "flow")?,
        data: data.map(PathBuf::from),
        column_mapping: from_json(row.get("column_mapping"), "column_mapping")?,
        properties: from_json(row.get("properties"), "properties")?,
        start_time,
        end_time,
        created_at,
        outputs: from_json(row.get("outputs"), "outputs")?,
        token_usage: from_json(row.get("token_usage"), "token_usage")?,
        error: row.get("error"),
    })
}

#[async_trait]
impl RunRepository for PostgresRunRepository {
    async fn create(&self, run: Run) -> Result<Run> {
        let query = format!(
            "INSERT INTO runs ({RUN_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)"
        );

        sqlx::query(&query)
            .bind(run.name.as_str())
            .bind(&run.display_name)
            .bind(&run.description)
            .bind(to_json(&run.tags, "tags")?)
            .bind(run.status.to_string())
            .bind(to_json(&run.flow, "flow")?)
            .bind(run.data.as_ref().map(|p| p.to_string_lossy().to_string()))
            .bind(to_json(&run.column_mapping, "column_mapping")?)
            .bind(to_json(&run.properties, "properties")?)
            .bind(run.start_time)
            .bind(run.end_time)
            .bind(run.created_at)
            .bind(to_json(&run.outputs, "outputs")?)
            .bind(to_json(&run.token_usage, "token_usage")?)
            .bind(&run.error)
            .execute(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                    RunError::AlreadyExists(run.name.to_string())
                }
                _ => RunError::DatabaseError(e.to_string()),
            })?;

        Ok(run)
    }

    async fn get(&self, name: &RunName) -> Result<Option<Run>> {
        let query = format!("SELECT {RUN_COLUMNS} FROM runs WHERE name = $1");

        let row = sqlx::query(&query)
            .bind(name.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RunError::DatabaseError(e.to_string()))?;

        row.as_ref().map(run_from_row).transpose()
    }

    async fn list(&self) -> Result<Vec<Run>> {
        let query = format!("SELECT {RUN_COLUMNS} FROM runs ORDER BY created_at DESC");

        let rows = sqlx::query(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RunError::DatabaseError(e.to_string()))?;

        rows.iter().map(run_from_row).collect()
    }

    async fn update(&self, run: Run) -> Result<Run> {
        let existing = self
            .get(&run.name)
            .await?
            .ok_or_else(|| RunError::NotFound(run.name.to_string()))?;

        if existing.status != run.status && !existing.status.can_transition_to(run.status) {
            return Err(RunError::Validation(format!(
                "invalid status transition: {} -> {}",
                existing.status, run.status
            )));
        }

        let result = sqlx::query(
            "UPDATE runs \
             SET display_name = $2, description = $3, tags = $4, status = $5, \
                 properties = $6, start_time = $7, end_time = $8, outputs = $9, \
                 token_usage = $10, error = $11 \
             WHERE name = $1",
        )
        .bind(run.name.as_str())
        .bind(&run.display_name)
        .bind(&run.description)
        .bind(to_json(&run.tags, "tags")?)
        .bind(run.status.to_string())
        .bind(to_json(&run.properties, "properties")?)
        .bind(run.start_time)
        .bind(run.end_time)
        .bind(to_json(&run.outputs, "outputs")?)
        .bind(to_json(&run.token_usage, "token_usage")?)
        .bind(&run.error)
        .execute(&self.pool)
        .await
        .map_err(|e| RunError::DatabaseError(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RunError::NotFound(run.name.to_string()));
        }

        Ok(run)
    }

    async fn delete(&self, name: &RunName) -> Result<()> {
        let result = sqlx::query("DELETE FROM runs WHERE name = $1")
            .bind(name.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| RunError::DatabaseError(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RunError::NotFound(name.to_string()));
        }

        Ok(())
    }
}
