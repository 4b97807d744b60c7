//! Loan service layer - lifecycle orchestration and persistence
//!
//! Owns the `loans` table (one flat row per loan, columns derived from the
//! field-descriptor table) and sequences the core checks for each
//! operation: validation on create, guard plus re-validation on update.
//! The caller is responsible for at most one concurrent update per loan
//! reaching persistence; the row read here is the one the write overwrites.

use serde_json::{Map, Number, Value};
use sqlx::{postgres::PgRow, PgPool, Row};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::auth::ActingUser;
use crate::clock::Clock;
use crate::schema::{self, ddl, FieldKind};

use super::model::{LoanError, LoanRecord};

/// Failure of a service operation.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("loan {0} not found")]
    NotFound(Uuid),

    #[error(transparent)]
    Loan(#[from] LoanError),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// A persisted loan: row id plus attribute set.
#[derive(Debug, Clone, serde::Serialize)]
pub struct StoredLoan {
    pub id: Uuid,
    #[serde(flatten)]
    pub record: LoanRecord,
}

/// Loan service for managing the loan lifecycle.
#[derive(Clone)]
pub struct LoanService {
    db_pool: PgPool,
    clock: Arc<dyn Clock>,
}

impl LoanService {
    /// Create a new loan service instance.
    pub fn new(db_pool: PgPool, clock: Arc<dyn Clock>) -> Self {
        Self { db_pool, clock }
    }

    /// Provision the loans table from the field-descriptor table.
    pub async fn ensure_schema(&self) -> Result<(), ServiceError> {
        sqlx::query(&ddl::create_table_sql())
            .execute(&self.db_pool)
            .await?;
        Ok(())
    }

    /// Create a loan from a raw attribute hash.
    pub async fn create(
        &self,
        raw: Map<String, Value>,
        acting_user: &dyn ActingUser,
    ) -> Result<StoredLoan, ServiceError> {
        let record = LoanRecord::create(raw, acting_user, self.clock.as_ref())
            .map_err(LoanError::from)?;
        let id = Uuid::new_v4();
        self.insert(id, &record).await?;
        tracing::info!(loan_id = %id, user = acting_user.id(), "Loan created");
        Ok(StoredLoan { id, record })
    }

    /// Apply a guarded state update to a stored loan.
    pub async fn update(
        &self,
        id: Uuid,
        changes: Map<String, Value>,
        acting_user: &dyn ActingUser,
    ) -> Result<StoredLoan, ServiceError> {
        let current = self.get(id).await?;
        let updated = current
            .record
            .apply_update(changes, acting_user, self.clock.as_ref())?;
        self.store(id, &updated).await?;
        tracing::info!(loan_id = %id, user = acting_user.id(), "Loan updated");
        Ok(StoredLoan { id, record: updated })
    }

    /// Get a loan by id.
    pub async fn get(&self, id: Uuid) -> Result<StoredLoan, ServiceError> {
        let sql = format!(
            "SELECT id, {} FROM {} WHERE id = $1",
            column_list(),
            ddl::TABLE_NAME
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.db_pool)
            .await?
            .ok_or(ServiceError::NotFound(id))?;
        Ok(row_to_loan(&row)?)
    }

    /// List all loans, oldest first.
    pub async fn list(&self) -> Result<Vec<StoredLoan>, ServiceError> {
        let sql = format!(
            "SELECT id, {} FROM {} ORDER BY \"date_created\"",
            column_list(),
            ddl::TABLE_NAME
        );
        let rows = sqlx::query(&sql).fetch_all(&self.db_pool).await?;
        let mut loans = Vec::with_capacity(rows.len());
        for row in &rows {
            loans.push(row_to_loan(row)?);
        }
        Ok(loans)
    }

    async fn insert(&self, id: Uuid, record: &LoanRecord) -> Result<(), ServiceError> {
        let placeholders: Vec<String> = (2..schema::LOAN_FIELDS.len() + 2)
            .map(|i| format!("${i}"))
            .collect();
        let sql = format!(
            "INSERT INTO {} (id, {}) VALUES ($1, {})",
            ddl::TABLE_NAME,
            column_list(),
            placeholders.join(", ")
        );
        let mut query = sqlx::query(&sql).bind(id);
        for desc in schema::LOAN_FIELDS {
            query = match desc.kind {
                FieldKind::Integer { .. } => query.bind(integer_column(record, desc.name)),
                _ => query.bind(text_column(record, desc.name)),
            };
        }
        query.execute(&self.db_pool).await?;
        Ok(())
    }

    async fn store(&self, id: Uuid, record: &LoanRecord) -> Result<(), ServiceError> {
        let assignments: Vec<String> = schema::LOAN_FIELDS
            .iter()
            .enumerate()
            .map(|(i, desc)| format!("\"{}\" = ${}", desc.name, i + 2))
            .collect();
        let sql = format!(
            "UPDATE {} SET {} WHERE id = $1",
            ddl::TABLE_NAME,
            assignments.join(", ")
        );
        let mut query = sqlx::query(&sql).bind(id);
        for desc in schema::LOAN_FIELDS {
            query = match desc.kind {
                FieldKind::Integer { .. } => query.bind(integer_column(record, desc.name)),
                _ => query.bind(text_column(record, desc.name)),
            };
        }
        let result = query.execute(&self.db_pool).await?;
        if result.rows_affected() == 0 {
            return Err(ServiceError::NotFound(id));
        }
        Ok(())
    }
}

fn column_list() -> String {
    schema::LOAN_FIELDS
        .iter()
        .map(|d| format!("\"{}\"", d.name))
        .collect::<Vec<_>>()
        .join(", ")
}

fn integer_column(record: &LoanRecord, name: &str) -> Option<i64> {
    record.get(name).and_then(Value::as_i64)
}

/// Text, date, timestamp and decimal columns are all stored as strings;
/// normalized decimal numbers are rendered back out.
fn text_column(record: &LoanRecord, name: &str) -> Option<String> {
    match record.get(name)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn row_to_loan(row: &PgRow) -> Result<StoredLoan, sqlx::Error> {
    let id: Uuid = row.try_get("id")?;
    let mut map = Map::new();
    for desc in schema::LOAN_FIELDS {
        let value = match desc.kind {
            FieldKind::Integer { .. } => row
                .try_get::<Option<i64>, _>(desc.name)?
                .map(Value::from),
            FieldKind::Decimal { .. } => row
                .try_get::<Option<String>, _>(desc.name)?
                .and_then(|s| s.parse::<f64>().ok())
                .and_then(Number::from_f64)
                .map(Value::Number),
            FieldKind::Text | FieldKind::Date | FieldKind::DateTime => row
                .try_get::<Option<String>, _>(desc.name)?
                .map(Value::String),
        };
        if let Some(value) = value {
            map.insert(desc.name.to_string(), value);
        }
    }
    Ok(StoredLoan {
        id,
        record: LoanRecord::from_map(map),
    })
}
