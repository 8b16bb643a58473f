use serde::Deserialize;
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::models::Transaction;
use crate::db::queries::{self, InsertOutcome};
use crate::error::AppError;
use crate::ledger::{WriteOutcome, audit, default_actor};
use crate::validation::ValidationError;

#[derive(Debug, Deserialize)]
pub struct ReversalRequest {
    #[serde(default)]
    pub transaction_id: String,
    #[serde(default = "default_actor")]
    pub actor: String,
}

/// Cancels a payment by appending its negated mirror row. At most one
/// reversal ever exists per payment; repeating the call returns the existing
/// reversal. Reversals themselves cannot be reversed.
pub async fn reverse_payment(
    pool: &PgPool,
    request: &ReversalRequest,
) -> Result<WriteOutcome, AppError> {
    let raw = request.transaction_id.trim();
    if raw.is_empty() {
        return Err(ValidationError::new("transaction_id", "is required").into());
    }
    let id = Uuid::parse_str(raw)
        .map_err(|_| ValidationError::new("transaction_id", "must be a valid UUID"))?;

    let original = queries::get_transaction(pool, id)
        .await?
        .filter(Transaction::is_payment)
        .ok_or_else(|| AppError::NotFound("Payment not found".to_string()))?;

    if let Some(existing) = queries::find_reversal_of(pool, original.id).await? {
        return Ok(WriteOutcome {
            transaction: existing,
            duplicate: true,
        });
    }

    let reversal = Transaction::reversal_of(&original);
    match queries::insert_reversal_if_absent(pool, &reversal).await? {
        InsertOutcome::Inserted(stored) => {
            audit::record_best_effort(
                pool,
                &request.actor,
                audit::ACTION_PAYMENT_REVERSED,
                audit::ENTITY_TRANSACTION,
                stored.id,
                json!({
                    "original_transaction_id": original.id,
                    "merchant_id": original.merchant_id,
                    "reference": original.reference,
                }),
            )
            .await;

            Ok(WriteOutcome {
                transaction: stored,
                duplicate: false,
            })
        }
        // A concurrent caller won the insert; hand back its row.
        InsertOutcome::AlreadyExists(stored) => Ok(WriteOutcome {
            transaction: stored,
            duplicate: true,
        }),
    }
}
