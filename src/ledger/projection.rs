use std::collections::HashMap;

use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::models::Transaction;
use crate::db::queries;

/// Read-time classification of a ledger row. Never persisted; always
/// recomputed from the rows themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionStatus {
    Completed,
    Reversed,
    Reversal,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Completed => "COMPLETED",
            TransactionStatus::Reversed => "REVERSED",
            TransactionStatus::Reversal => "REVERSAL",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectedTransaction {
    #[serde(flatten)]
    pub transaction: Transaction,
    pub status: TransactionStatus,
    pub reversal_id: Option<Uuid>,
}

/// Map of original payment id to the reversal row that cancels it.
#[derive(Debug, Default)]
pub struct ReversalIndex(HashMap<Uuid, Uuid>);

impl ReversalIndex {
    pub fn scan<'a, I>(rows: I) -> Self
    where
        I: IntoIterator<Item = &'a Transaction>,
    {
        let mut map = HashMap::new();
        for row in rows {
            if row.is_reversal() {
                if let Some(original) = row.original_transaction_id {
                    map.insert(original, row.id);
                }
            }
        }
        Self(map)
    }

    pub fn reversal_of(&self, id: Uuid) -> Option<Uuid> {
        self.0.get(&id).copied()
    }
}

/// Derives per-row status lazily, preserving the input ordering. Calling it
/// again restarts from the first row.
pub fn project<'a>(
    rows: &'a [Transaction],
    index: &'a ReversalIndex,
) -> impl Iterator<Item = ProjectedTransaction> + 'a {
    rows.iter().map(move |row| {
        if row.is_reversal() {
            ProjectedTransaction {
                transaction: row.clone(),
                status: TransactionStatus::Reversal,
                reversal_id: None,
            }
        } else {
            match index.reversal_of(row.id) {
                Some(reversal_id) => ProjectedTransaction {
                    transaction: row.clone(),
                    status: TransactionStatus::Reversed,
                    reversal_id: Some(reversal_id),
                },
                None => ProjectedTransaction {
                    transaction: row.clone(),
                    status: TransactionStatus::Completed,
                    reversal_id: None,
                },
            }
        }
    })
}

/// Query-path entry point: supplements the batch with the reversals linked
/// to its payments before projecting, so a payment reads as REVERSED even
/// when the reversal row fell outside the page or filter window.
pub async fn project_rows(
    pool: &PgPool,
    rows: Vec<Transaction>,
) -> Result<Vec<ProjectedTransaction>, sqlx::Error> {
    let payment_ids: Vec<Uuid> = rows
        .iter()
        .filter(|row| row.is_payment())
        .map(|row| row.id)
        .collect();

    let linked = if payment_ids.is_empty() {
        Vec::new()
    } else {
        queries::reversals_for(pool, &payment_ids).await?
    };

    let index = ReversalIndex::scan(rows.iter().chain(linked.iter()));
    Ok(project(&rows, &index).collect())
}

/// Offset-paginated result envelope shared by the query surfaces.
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub page: i64,
    pub page_size: i64,
    pub total: i64,
    pub total_pages: i64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl<T> Page<T> {
    pub fn new(data: Vec<T>, page: i64, page_size: i64, total: i64) -> Self {
        let total_pages = if total == 0 {
            0
        } else {
            (total + page_size - 1) / page_size
        };

        Self {
            data,
            page,
            page_size,
            total,
            total_pages,
            has_next: page < total_pages,
            has_prev: page > 1 && total > 0,
        }
    }
}
