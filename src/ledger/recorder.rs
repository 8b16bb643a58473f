use chrono::Utc;
use serde::Deserialize;
use serde_json::{Value, json};
use sqlx::PgPool;

use crate::db::models::Transaction;
use crate::db::queries::{self, InsertOutcome};
use crate::error::AppError;
use crate::ledger::{WriteOutcome, audit, default_actor, idempotency, money};
use crate::validation;

#[derive(Debug, Deserialize)]
pub struct PaymentRequest {
    #[serde(default)]
    pub merchant_id: String,
    #[serde(default)]
    pub reference: String,
    #[serde(default)]
    pub amount: Value,
    #[serde(default)]
    pub fee: Value,
    #[serde(default)]
    pub occurred_at: String,
    #[serde(default = "default_actor")]
    pub actor: String,
}

/// Records a payment at most once per idempotency key. A duplicate
/// submission returns the originally stored row untouched, with an audit
/// trace of the ignored attempt.
pub async fn record_payment(
    pool: &PgPool,
    request: &PaymentRequest,
) -> Result<WriteOutcome, AppError> {
    let merchant_id = validation::require_text("merchant_id", &request.merchant_id)?;
    let reference = validation::require_text("reference", &request.reference)?;
    let amount = validation::parse_amount(&request.amount)?;
    let fee = validation::parse_fee(&request.fee, &amount)?;
    let occurred_at = validation::parse_occurred_at(&request.occurred_at, Utc::now())?;

    // Normalize before the key is derived so storage and digest agree.
    let amount = money::round2(&amount);
    let fee = money::round2(&fee);
    let net_amount = money::round2(&(&amount - &fee));
    let idempotency_key = idempotency::derive_key(&merchant_id, &reference, &amount, occurred_at);

    let row = Transaction::payment(
        merchant_id,
        reference,
        amount,
        fee,
        net_amount,
        occurred_at,
        idempotency_key,
    );

    match queries::insert_payment_if_absent(pool, &row).await? {
        InsertOutcome::Inserted(stored) => {
            audit::record_best_effort(
                pool,
                &request.actor,
                audit::ACTION_PAYMENT_CREATED,
                audit::ENTITY_TRANSACTION,
                stored.id,
                json!({
                    "merchant_id": stored.merchant_id,
                    "reference": stored.reference,
                    "amount": stored.amount.to_string(),
                    "fee": stored.fee.to_string(),
                    "net_amount": stored.net_amount.to_string(),
                    "occurred_at": stored.occurred_at.to_rfc3339(),
                }),
            )
            .await;

            Ok(WriteOutcome {
                transaction: stored,
                duplicate: false,
            })
        }
        InsertOutcome::AlreadyExists(stored) => {
            audit::record_best_effort(
                pool,
                &request.actor,
                audit::ACTION_PAYMENT_DUPLICATE_IGNORED,
                audit::ENTITY_TRANSACTION,
                stored.id,
                json!({
                    "merchant_id": stored.merchant_id,
                    "reference": stored.reference,
                    "attempted_amount": row.amount.to_string(),
                }),
            )
            .await;

            Ok(WriteOutcome {
                transaction: stored,
                duplicate: true,
            })
        }
    }
}
