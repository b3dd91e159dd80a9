//! Call record repository implementation
//!
//! Provides PostgreSQL-backed storage for call legs with lookups keyed by
//! the external `call_id` that correlates the two legs of one call.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tarifador_core::{
    models::{CallRecord, CallType},
    traits::CallRecordStore,
    AppError, AppResult,
};
use tracing::{debug, error, instrument, warn};
use uuid::Uuid;

use super::stored_number;

/// PostgreSQL implementation of CallRecordStore
pub struct PgCallRecordStore {
    pool: PgPool,
}

impl PgCallRecordStore {
    /// Create a new call record store
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const CALL_RECORD_SELECT_COLUMNS: &str = r#"
    id, call_id, call_type, timestamp,
    source, destination, phone_bill_id
"#;

#[async_trait]
impl CallRecordStore for PgCallRecordStore {
    #[instrument(skip(self, record))]
    async fn save(&self, record: &CallRecord) -> AppResult<CallRecord> {
        debug!("Saving {} leg for call {}", record.call_type, record.call_id);

        let query = format!(
            r#"
            INSERT INTO call_records (
                id, call_id, call_type, timestamp,
                source, destination
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            CALL_RECORD_SELECT_COLUMNS
        );

        let row = sqlx::query_as::<sqlx::Postgres, CallRecordRow>(&query)
            .bind(record.id)
            .bind(record.call_id)
            .bind(record.call_type.as_str())
            .bind(record.timestamp)
            .bind(record.source.as_ref().map(|n| n.as_str()))
            .bind(record.destination.as_ref().map(|n| n.as_str()))
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error saving call record: {}", e);
                AppError::Database(format!("Failed to save call record: {}", e))
            })?;

        row.try_into()
    }

    #[instrument(skip(self))]
    async fn exists(&self, call_id: i64, call_type: CallType) -> AppResult<bool> {
        let result: (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM call_records WHERE call_id = $1 AND call_type = $2)",
        )
        .bind(call_id)
        .bind(call_type.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error checking call record existence: {}", e);
            AppError::Database(format!("Failed to check call record: {}", e))
        })?;

        Ok(result.0)
    }

    #[instrument(skip(self))]
    async fn start_exists(&self, call_id: i64) -> AppResult<bool> {
        let result: (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM call_records WHERE call_id = $1 AND call_type = 'start')",
        )
        .bind(call_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error checking start leg existence: {}", e);
            AppError::Database(format!("Failed to check start leg: {}", e))
        })?;

        Ok(result.0)
    }

    #[instrument(skip(self, record))]
    async fn update(&self, record: &CallRecord) -> AppResult<CallRecord> {
        debug!(
            "Updating {} leg for call {}",
            record.call_type, record.call_id
        );

        let query = format!(
            r#"
            UPDATE call_records
            SET timestamp = $3,
                source = $4,
                destination = $5,
                updated_at = NOW()
            WHERE call_id = $1 AND call_type = $2
            RETURNING {}
            "#,
            CALL_RECORD_SELECT_COLUMNS
        );

        let row = sqlx::query_as::<sqlx::Postgres, CallRecordRow>(&query)
            .bind(record.call_id)
            .bind(record.call_type.as_str())
            .bind(record.timestamp)
            .bind(record.source.as_ref().map(|n| n.as_str()))
            .bind(record.destination.as_ref().map(|n| n.as_str()))
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                error!(
                    "Database error updating call record {}: {}",
                    record.call_id, e
                );
                AppError::Database(format!("Failed to update call record: {}", e))
            })?;

        row.try_into()
    }

    #[instrument(skip(self))]
    async fn get_pair(
        &self,
        call_id: i64,
    ) -> AppResult<(Option<CallRecord>, Option<CallRecord>)> {
        debug!("Fetching both legs for call {}", call_id);

        let query = format!(
            "SELECT {} FROM call_records WHERE call_id = $1",
            CALL_RECORD_SELECT_COLUMNS
        );

        let rows = sqlx::query_as::<sqlx::Postgres, CallRecordRow>(&query)
            .bind(call_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error fetching call pair {}: {}", call_id, e);
                AppError::Database(format!("Failed to fetch call pair: {}", e))
            })?;

        let mut start = None;
        let mut end = None;
        for row in rows {
            let record: CallRecord = row.try_into()?;
            match record.call_type {
                CallType::Start => start = Some(record),
                CallType::End => end = Some(record),
            }
        }

        Ok((start, end))
    }

    #[instrument(skip(self))]
    async fn link_to_bill(
        &self,
        start_id: Uuid,
        end_id: Uuid,
        bill_id: Uuid,
    ) -> AppResult<()> {
        debug!("Linking legs {} and {} to bill {}", start_id, end_id, bill_id);

        let result = sqlx::query(
            r#"
            UPDATE call_records
            SET phone_bill_id = $3,
                updated_at = NOW()
            WHERE id = $1 OR id = $2
            "#,
        )
        .bind(start_id)
        .bind(end_id)
        .bind(bill_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error linking legs to bill {}: {}", bill_id, e);
            AppError::Database(format!("Failed to link call records to bill: {}", e))
        })?;

        if result.rows_affected() != 2 {
            warn!(
                "Expected to link 2 legs to bill {}, updated {}",
                bill_id,
                result.rows_affected()
            );
        }

        Ok(())
    }
}

/// Helper struct for mapping database rows to the domain model
#[derive(Debug, sqlx::FromRow)]
struct CallRecordRow {
    id: Uuid,
    call_id: i64,
    call_type: String,
    timestamp: DateTime<Utc>,
    source: Option<String>,
    destination: Option<String>,
    phone_bill_id: Option<Uuid>,
}

impl TryFrom<CallRecordRow> for CallRecord {
    type Error = AppError;

    fn try_from(row: CallRecordRow) -> Result<Self, Self::Error> {
        let call_type = CallType::parse(&row.call_type).ok_or_else(|| {
            AppError::Database(format!("Unknown call type stored: {}", row.call_type))
        })?;

        let source = row.source.as_deref().map(stored_number).transpose()?;
        let destination = row.destination.as_deref().map(stored_number).transpose()?;

        Ok(Self {
            id: row.id,
            call_id: row.call_id,
            call_type,
            timestamp: row.timestamp,
            source,
            destination,
            phone_bill_id: row.phone_bill_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_conversion() {
        let row = CallRecordRow {
            id: Uuid::new_v4(),
            call_id: 70,
            call_type: "start".to_string(),
            timestamp: Utc::now(),
            source: Some("99988526423".to_string()),
            destination: Some("9933468278".to_string()),
            phone_bill_id: None,
        };

        let record: CallRecord = row.try_into().unwrap();
        assert_eq!(record.call_id, 70);
        assert_eq!(record.call_type, CallType::Start);
        assert_eq!(record.source.unwrap().as_str(), "99988526423");
    }

    #[test]
    fn test_row_conversion_rejects_unknown_type() {
        let row = CallRecordRow {
            id: Uuid::new_v4(),
            call_id: 70,
            call_type: "ring".to_string(),
            timestamp: Utc::now(),
            source: None,
            destination: None,
            phone_bill_id: None,
        };

        let err = CallRecord::try_from(row).unwrap_err();
        assert!(matches!(err, AppError::Database(_)));
    }

    #[test]
    fn test_row_conversion_rejects_corrupt_number() {
        let row = CallRecordRow {
            id: Uuid::new_v4(),
            call_id: 70,
            call_type: "start".to_string(),
            timestamp: Utc::now(),
            source: Some("not-a-number".to_string()),
            destination: Some("9933468278".to_string()),
            phone_bill_id: None,
        };

        let err = CallRecord::try_from(row).unwrap_err();
        assert!(matches!(err, AppError::Database(_)));
    }
}
