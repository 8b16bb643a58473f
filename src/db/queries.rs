use chrono::{DateTime, Utc};
use sqlx::{PgPool, Result};
use uuid::Uuid;

use crate::db::models::{AuditEntry, Transaction};

/// Outcome of a conditional insert. A lost race is an ordinary value here,
/// not an error: the caller gets the winning row either way.
#[derive(Debug)]
pub enum InsertOutcome {
    Inserted(Transaction),
    AlreadyExists(Transaction),
}

// --- Transaction Queries ---

/// Inserts a PAYMENT row unless one with the same idempotency key exists.
/// The unique index on `idempotency_key` is the guard; two racing identical
/// submissions serialize inside Postgres and the loser re-reads the winner.
pub async fn insert_payment_if_absent(pool: &PgPool, tx: &Transaction) -> Result<InsertOutcome> {
    let inserted = sqlx::query_as::<_, Transaction>(
        r#"
        INSERT INTO transactions (
            id, type, merchant_id, reference, amount, fee, net_amount,
            occurred_at, created_at, original_transaction_id, idempotency_key
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        ON CONFLICT (idempotency_key) DO NOTHING
        RETURNING *
        "#,
    )
    .bind(tx.id)
    .bind(&tx.kind)
    .bind(&tx.merchant_id)
    .bind(&tx.reference)
    .bind(&tx.amount)
    .bind(&tx.fee)
    .bind(&tx.net_amount)
    .bind(tx.occurred_at)
    .bind(tx.created_at)
    .bind(tx.original_transaction_id)
    .bind(&tx.idempotency_key)
    .fetch_optional(pool)
    .await?;

    match inserted {
        Some(row) => Ok(InsertOutcome::Inserted(row)),
        None => {
            let existing = sqlx::query_as::<_, Transaction>(
                "SELECT * FROM transactions WHERE idempotency_key = $1",
            )
            .bind(&tx.idempotency_key)
            .fetch_one(pool)
            .await?;

            Ok(InsertOutcome::AlreadyExists(existing))
        }
    }
}

/// Inserts a REVERSAL row unless the original is already reversed. The
/// unique index on `original_transaction_id` makes concurrent reversals of
/// the same payment resolve to a single row.
pub async fn insert_reversal_if_absent(pool: &PgPool, tx: &Transaction) -> Result<InsertOutcome> {
    let inserted = sqlx::query_as::<_, Transaction>(
        r#"
        INSERT INTO transactions (
            id, type, merchant_id, reference, amount, fee, net_amount,
            occurred_at, created_at, original_transaction_id, idempotency_key
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        ON CONFLICT (original_transaction_id) DO NOTHING
        RETURNING *
        "#,
    )
    .bind(tx.id)
    .bind(&tx.kind)
    .bind(&tx.merchant_id)
    .bind(&tx.reference)
    .bind(&tx.amount)
    .bind(&tx.fee)
    .bind(&tx.net_amount)
    .bind(tx.occurred_at)
    .bind(tx.created_at)
    .bind(tx.original_transaction_id)
    .bind(&tx.idempotency_key)
    .fetch_optional(pool)
    .await?;

    match inserted {
        Some(row) => Ok(InsertOutcome::Inserted(row)),
        None => {
            let existing = sqlx::query_as::<_, Transaction>(
                "SELECT * FROM transactions WHERE original_transaction_id = $1 AND type = 'REVERSAL'",
            )
            .bind(tx.original_transaction_id)
            .fetch_one(pool)
            .await?;

            Ok(InsertOutcome::AlreadyExists(existing))
        }
    }
}

pub async fn get_transaction(pool: &PgPool, id: Uuid) -> Result<Option<Transaction>> {
    sqlx::query_as::<_, Transaction>("SELECT * FROM transactions WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// The REVERSAL referencing `original_id`, if one exists.
pub async fn find_reversal_of(pool: &PgPool, original_id: Uuid) -> Result<Option<Transaction>> {
    sqlx::query_as::<_, Transaction>(
        "SELECT * FROM transactions WHERE original_transaction_id = $1 AND type = 'REVERSAL'",
    )
    .bind(original_id)
    .fetch_optional(pool)
    .await
}

/// REVERSAL rows linked to any of the given payment ids. Used by the read
/// path so a payment's derived status never depends on whether its reversal
/// landed inside the same page or filter window.
pub async fn reversals_for(pool: &PgPool, original_ids: &[Uuid]) -> Result<Vec<Transaction>> {
    sqlx::query_as::<_, Transaction>(
        "SELECT * FROM transactions WHERE type = 'REVERSAL' AND original_transaction_id = ANY($1)",
    )
    .bind(original_ids)
    .fetch_all(pool)
    .await
}

#[derive(Debug, Default, Clone)]
pub struct TransactionFilter {
    pub merchant_id: Option<String>,
    pub reference: Option<String>,
    pub occurred_from: Option<DateTime<Utc>>,
    pub occurred_to: Option<DateTime<Utc>>,
}

/// Filter value enum for dynamic parameter handling
enum FilterValue {
    Text(String),
    Timestamp(DateTime<Utc>),
}

fn build_filter_conditions(filter: &TransactionFilter) -> (String, Vec<FilterValue>) {
    let mut conditions = Vec::new();
    let mut params = Vec::new();

    if let Some(ref merchant_id) = filter.merchant_id {
        params.push(FilterValue::Text(merchant_id.clone()));
        conditions.push(format!("merchant_id = ${}", params.len()));
    }

    if let Some(ref reference) = filter.reference {
        params.push(FilterValue::Text(reference.clone()));
        conditions.push(format!("reference = ${}", params.len()));
    }

    if let Some(from) = filter.occurred_from {
        params.push(FilterValue::Timestamp(from));
        conditions.push(format!("occurred_at >= ${}", params.len()));
    }

    if let Some(to) = filter.occurred_to {
        params.push(FilterValue::Timestamp(to));
        conditions.push(format!("occurred_at <= ${}", params.len()));
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    (where_clause, params)
}

/// Filtered search ordered by `occurred_at DESC, id DESC`; the id tie-break
/// keeps page boundaries stable when business timestamps collide. Passing
/// `limit: None` returns the full result set (export path).
pub async fn search_transactions(
    pool: &PgPool,
    filter: &TransactionFilter,
    limit: Option<i64>,
    offset: i64,
) -> Result<(i64, Vec<Transaction>)> {
    let (where_clause, params) = build_filter_conditions(filter);

    let count_sql = format!("SELECT COUNT(*) FROM transactions {}", where_clause);
    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    for param in &params {
        count_query = match param {
            FilterValue::Text(s) => count_query.bind(s.clone()),
            FilterValue::Timestamp(ts) => count_query.bind(*ts),
        };
    }
    let total = count_query.fetch_one(pool).await?;

    let mut sql = format!(
        "SELECT * FROM transactions {} ORDER BY occurred_at DESC, id DESC",
        where_clause
    );
    if let Some(limit) = limit {
        sql = format!("{} LIMIT {} OFFSET {}", sql, limit, offset);
    }

    let mut query = sqlx::query_as::<_, Transaction>(&sql);
    for param in &params {
        query = match param {
            FilterValue::Text(s) => query.bind(s.clone()),
            FilterValue::Timestamp(ts) => query.bind(*ts),
        };
    }
    let rows = query.fetch_all(pool).await?;

    Ok((total, rows))
}

// --- Audit Log Queries ---

pub async fn insert_audit_entry(pool: &PgPool, entry: &AuditEntry) -> Result<AuditEntry> {
    sqlx::query_as::<_, AuditEntry>(
        r#"
        INSERT INTO audit_log (id, actor, action, entity_type, entity_id, details, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(entry.id)
    .bind(&entry.actor)
    .bind(&entry.action)
    .bind(&entry.entity_type)
    .bind(entry.entity_id)
    .bind(&entry.details)
    .bind(entry.created_at)
    .fetch_one(pool)
    .await
}

pub async fn list_audit_entries(
    pool: &PgPool,
    limit: i64,
    offset: i64,
) -> Result<(i64, Vec<AuditEntry>)> {
    let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM audit_log")
        .fetch_one(pool)
        .await?;

    let entries = sqlx::query_as::<_, AuditEntry>(
        "SELECT * FROM audit_log ORDER BY created_at DESC, id DESC LIMIT $1 OFFSET $2",
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok((total, entries))
}
