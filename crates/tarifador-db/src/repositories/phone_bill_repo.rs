//! Phone bill repository implementation
//!
//! Provides PostgreSQL-backed storage for bills and their itemized call
//! lines. A bill and its lines are always written together in one
//! transaction so a reader never observes a total without its lines.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tarifador_core::{
    models::{BilledCall, PhoneBill, ReferencePeriod},
    traits::PhoneBillStore,
    AppError, AppResult,
};
use tracing::{debug, error, instrument};
use uuid::Uuid;

use super::stored_number;

/// PostgreSQL implementation of PhoneBillStore
pub struct PgPhoneBillStore {
    pool: PgPool,
}

impl PgPhoneBillStore {
    /// Create a new phone bill store
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Fetch the itemized lines for a bill, in stored display order
    async fn fetch_lines(&self, bill_id: Uuid) -> AppResult<Vec<BilledCall>> {
        let query = format!(
            "SELECT {} FROM billed_calls WHERE phone_bill_id = $1 ORDER BY position",
            BILLED_CALL_SELECT_COLUMNS
        );

        let rows = sqlx::query_as::<sqlx::Postgres, BilledCallRow>(&query)
            .bind(bill_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error fetching billed calls for {}: {}", bill_id, e);
                AppError::Database(format!("Failed to fetch billed calls: {}", e))
            })?;

        rows.into_iter().map(TryInto::try_into).collect()
    }
}

const PHONE_BILL_SELECT_COLUMNS: &str = r#"
    id, phone_number, reference_period, total_amount
"#;

const BILLED_CALL_SELECT_COLUMNS: &str = r#"
    call_id, destination, start_date, start_time, duration, price
"#;

#[async_trait]
impl PhoneBillStore for PgPhoneBillStore {
    #[instrument(skip(self))]
    async fn get(
        &self,
        phone_number: &str,
        period: &ReferencePeriod,
    ) -> AppResult<Option<PhoneBill>> {
        debug!("Fetching bill for {} in {}", phone_number, period);

        let query = format!(
            "SELECT {} FROM phone_bills WHERE phone_number = $1 AND reference_period = $2",
            PHONE_BILL_SELECT_COLUMNS
        );

        let row = sqlx::query_as::<sqlx::Postgres, PhoneBillRow>(&query)
            .bind(phone_number)
            .bind(period.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error fetching bill: {}", e);
                AppError::Database(format!("Failed to fetch phone bill: {}", e))
            })?;

        match row {
            Some(row) => {
                let calls = self.fetch_lines(row.id).await?;
                Ok(Some(row.into_bill(calls)?))
            }
            None => Ok(None),
        }
    }

    #[instrument(skip(self))]
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<PhoneBill>> {
        debug!("Fetching bill {}", id);

        let query = format!(
            "SELECT {} FROM phone_bills WHERE id = $1",
            PHONE_BILL_SELECT_COLUMNS
        );

        let row = sqlx::query_as::<sqlx::Postgres, PhoneBillRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error fetching bill {}: {}", id, e);
                AppError::Database(format!("Failed to fetch phone bill: {}", e))
            })?;

        match row {
            Some(row) => {
                let calls = self.fetch_lines(row.id).await?;
                Ok(Some(row.into_bill(calls)?))
            }
            None => Ok(None),
        }
    }

    #[instrument(skip(self))]
    async fn exists_for(
        &self,
        period: &ReferencePeriod,
        phone_number: &str,
    ) -> AppResult<bool> {
        let result: (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM phone_bills WHERE phone_number = $1 AND reference_period = $2)",
        )
        .bind(phone_number)
        .bind(period.to_string())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error checking bill existence: {}", e);
            AppError::Database(format!("Failed to check phone bill: {}", e))
        })?;

        Ok(result.0)
    }

    #[instrument(skip(self, bill))]
    async fn save(&self, bill: &PhoneBill) -> AppResult<PhoneBill> {
        debug!(
            "Saving bill {} for {} in {} with {} calls",
            bill.id,
            bill.phone_number,
            bill.reference_period,
            bill.calls.len()
        );

        let mut tx = self.pool.begin().await.map_err(|e| {
            error!("Failed to start transaction: {}", e);
            AppError::Transaction(format!("Failed to start transaction: {}", e))
        })?;

        sqlx::query(
            r#"
            INSERT INTO phone_bills (id, phone_number, reference_period, total_amount)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(bill.id)
        .bind(bill.phone_number.as_str())
        .bind(bill.reference_period.to_string())
        .bind(bill.total_amount)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            error!("Database error saving phone bill: {}", e);
            AppError::Database(format!("Failed to save phone bill: {}", e))
        })?;

        insert_lines(&mut tx, bill).await?;

        tx.commit().await.map_err(|e| {
            error!("Failed to commit transaction: {}", e);
            AppError::Transaction(format!("Failed to commit transaction: {}", e))
        })?;

        Ok(bill.clone())
    }

    #[instrument(skip(self, bill))]
    async fn update(&self, bill: &PhoneBill) -> AppResult<PhoneBill> {
        debug!(
            "Updating bill {} with {} calls, total {}",
            bill.id,
            bill.calls.len(),
            bill.total_amount
        );

        let mut tx = self.pool.begin().await.map_err(|e| {
            error!("Failed to start transaction: {}", e);
            AppError::Transaction(format!("Failed to start transaction: {}", e))
        })?;

        sqlx::query(
            r#"
            UPDATE phone_bills
            SET total_amount = $2,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(bill.id)
        .bind(bill.total_amount)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            error!("Database error updating phone bill {}: {}", bill.id, e);
            AppError::Database(format!("Failed to update phone bill: {}", e))
        })?;

        // Lines are rewritten wholesale so positions stay contiguous
        sqlx::query("DELETE FROM billed_calls WHERE phone_bill_id = $1")
            .bind(bill.id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                error!("Database error clearing billed calls: {}", e);
                AppError::Database(format!("Failed to clear billed calls: {}", e))
            })?;

        insert_lines(&mut tx, bill).await?;

        tx.commit().await.map_err(|e| {
            error!("Failed to commit transaction: {}", e);
            AppError::Transaction(format!("Failed to commit transaction: {}", e))
        })?;

        Ok(bill.clone())
    }
}

/// Insert every line of a bill, numbering positions from zero
async fn insert_lines(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    bill: &PhoneBill,
) -> AppResult<()> {
    for (position, call) in bill.calls.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO billed_calls (
                phone_bill_id, call_id, destination,
                start_date, start_time, duration, price, position
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(bill.id)
        .bind(call.call_id)
        .bind(call.destination.as_str())
        .bind(call.start_date)
        .bind(call.start_time)
        .bind(&call.duration)
        .bind(call.price)
        .bind(position as i32)
        .execute(&mut **tx)
        .await
        .map_err(|e| {
            error!("Database error inserting billed call: {}", e);
            AppError::Database(format!("Failed to insert billed call: {}", e))
        })?;
    }

    Ok(())
}

/// Helper struct for mapping bill header rows to the domain model
#[derive(Debug, sqlx::FromRow)]
struct PhoneBillRow {
    id: Uuid,
    phone_number: String,
    reference_period: String,
    total_amount: Decimal,
}

impl PhoneBillRow {
    fn into_bill(self, calls: Vec<BilledCall>) -> AppResult<PhoneBill> {
        let phone_number = stored_number(&self.phone_number)?;
        let reference_period = ReferencePeriod::parse(&self.reference_period).map_err(|_| {
            AppError::Database(format!(
                "Stored reference period '{}' is not canonical",
                self.reference_period
            ))
        })?;

        Ok(PhoneBill {
            id: self.id,
            phone_number,
            reference_period,
            calls,
            total_amount: self.total_amount,
        })
    }
}

/// Helper struct for mapping bill line rows to the domain model
#[derive(Debug, sqlx::FromRow)]
struct BilledCallRow {
    call_id: i64,
    destination: String,
    start_date: NaiveDate,
    start_time: NaiveTime,
    duration: String,
    price: Decimal,
}

impl TryFrom<BilledCallRow> for BilledCall {
    type Error = AppError;

    fn try_from(row: BilledCallRow) -> Result<Self, Self::Error> {
        Ok(Self {
            call_id: row.call_id,
            destination: stored_number(&row.destination)?,
            start_date: row.start_date,
            start_time: row.start_time,
            duration: row.duration,
            price: row.price,
        })
    }
}
